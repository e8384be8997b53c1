// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deterministic Resource Naming and Tagging
//!
//! Two naming policies coexist (see [`NamingPolicy`]):
//!
//! - **Suffix**: `<prefix>-<kind>[-<extra>]-<suffix>`. Stable for as long as
//!   the environment suffix is unchanged; configuration changes update the
//!   live resource in place.
//! - **VersionedHash**: `<prefix>-<kind>-<version>-<hash>`. The hash is
//!   taken over the configuration that defines the resource, so any change
//!   produces a new name and the orchestrator replaces the resource.
//!
//! Names longer than [`MAX_NAME_LENGTH`] keep everything after the claim
//! prefix and shorten the prefix instead, inserting a short hash of the
//! full name so distinct claims stay distinct.
//!
//! Every taggable resource carries the core tags `Name`, `Environment`,
//! `Project` and `Component`; caller tags are merged on top and win on key
//! collision.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::domain::resource_kind::{NamingPolicy, ResourceKind};
use crate::domain::spec::CompositeInputSpec;
use crate::errors::{CompositionError, CompositionResult};

/// Longest name accepted by every provider kind we emit
pub const MAX_NAME_LENGTH: usize = 63;

/// Produces names and tag sets for one compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namer {
    prefix: String,
    suffix: String,
    project: String,
    hash_length: usize,
    extra_tags: BTreeMap<String, String>,
}

impl Namer {
    pub fn new(spec: &CompositeInputSpec, config: &EngineConfig) -> Self {
        Self {
            prefix: spec.claim_name.clone(),
            suffix: spec.environment_suffix.clone(),
            project: config.project_tag.clone(),
            hash_length: config.name_hash_length,
            extra_tags: spec.extra_tags.clone(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Suffix-policy name
    ///
    /// ```rust
    /// use cim_vectordb_composition::composition::naming::Namer;
    /// use cim_vectordb_composition::config::EngineConfig;
    /// use cim_vectordb_composition::domain::{CompositeInputSpec, ResourceKind};
    ///
    /// let spec = CompositeInputSpec::from_raw(&serde_json::json!({ "region": "us-west-2" })).unwrap();
    /// let namer = Namer::new(&spec, &EngineConfig::default());
    /// assert_eq!(namer.name(ResourceKind::Vpc, None), "vectordb-vpc-dev");
    /// assert_eq!(namer.name(ResourceKind::Subnet, Some("database-0")), "vectordb-subnet-database-0-dev");
    /// ```
    pub fn name(&self, kind: ResourceKind, extra: Option<&str>) -> String {
        let tail = match extra {
            Some(extra) => format!("-{}-{}-{}", kind.name_token(), extra, self.suffix),
            None => format!("-{}-{}", kind.name_token(), self.suffix),
        };
        fit(&self.prefix, &tail)
    }

    /// Version+hash name
    ///
    /// `content` is serialized to JSON (object keys sorted) and hashed with
    /// SHA-256; the first `hash_length` hex characters are kept. Callers
    /// include the environment suffix in `content` so that environments
    /// sharing a configuration still get distinct names.
    pub fn versioned_name<T: Serialize>(
        &self,
        kind: ResourceKind,
        version_token: &str,
        content: &T,
    ) -> CompositionResult<String> {
        if kind.naming_policy() != NamingPolicy::VersionedHash {
            return Err(CompositionError::NamingPolicy {
                kind: kind.to_string(),
                policy: "version+hash".to_string(),
            });
        }

        let canonical = serde_json::to_value(content)?;
        let digest = Sha256::digest(serde_json::to_vec(&canonical)?);
        let hash = format!("{digest:x}");

        let tail = format!(
            "-{}-{}-{}",
            kind.name_token(),
            version_token,
            &hash[..self.hash_length.min(hash.len())]
        );
        Ok(fit(&self.prefix, &tail))
    }

    /// Core tags merged with caller tags
    pub fn tags(&self, kind: ResourceKind, name: &str) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::from([
            ("Name".to_string(), name.to_string()),
            ("Environment".to_string(), self.suffix.clone()),
            ("Project".to_string(), self.project.clone()),
            ("Component".to_string(), kind.component().to_string()),
        ]);
        tags.extend(
            self.extra_tags
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        tags
    }
}

/// Hex characters of the full-name hash used when a prefix is shortened
const SHORTENED_HASH_LENGTH: usize = 8;

/// Join `prefix` and `tail`, shortening only the prefix when over the cap
///
/// The shortened form is `<prefix[..n]>-<hash><tail>`, the hash taken over
/// the unshortened name. `tail` is never cut, so kind, tier, zone and
/// suffix always survive.
fn fit(prefix: &str, tail: &str) -> String {
    let full = format!("{prefix}{tail}");
    if full.len() <= MAX_NAME_LENGTH {
        return full;
    }

    let digest = format!("{:x}", Sha256::digest(full.as_bytes()));
    let hash = &digest[..SHORTENED_HASH_LENGTH];
    let keep = MAX_NAME_LENGTH
        .saturating_sub(tail.len() + hash.len() + 1)
        .min(prefix.len());
    let head = prefix[..keep].trim_end_matches('-');

    if head.is_empty() {
        format!("{hash}{tail}")
    } else {
        format!("{head}-{hash}{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn namer(raw: serde_json::Value) -> Namer {
        let spec = CompositeInputSpec::from_raw(&raw).unwrap();
        Namer::new(&spec, &EngineConfig::default())
    }

    #[test]
    fn test_suffix_names() {
        let namer = namer(json!({ "region": "us-west-2", "claimName": "test-claim" }));
        assert_eq!(namer.name(ResourceKind::Vpc, None), "test-claim-vpc-dev");
        assert_eq!(namer.name(ResourceKind::InternetGateway, None), "test-claim-igw-dev");
        assert_eq!(
            namer.name(ResourceKind::RouteTable, Some("public")),
            "test-claim-route-table-public-dev"
        );
    }

    #[test]
    fn test_versioned_name_tracks_content() {
        let namer = namer(json!({ "region": "us-west-2" }));
        let a = namer
            .versioned_name(ResourceKind::ParameterGroup, "pg16", &json!({ "family": "aurora-postgresql16" }))
            .unwrap();
        let b = namer
            .versioned_name(ResourceKind::ParameterGroup, "pg16", &json!({ "family": "aurora-postgresql16" }))
            .unwrap();
        let c = namer
            .versioned_name(ResourceKind::ParameterGroup, "pg16", &json!({ "family": "aurora-postgresql15" }))
            .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("vectordb-instance-params-pg16-"));
        assert_eq!(a.len(), "vectordb-instance-params-pg16-".len() + 10);
    }

    #[test]
    fn test_versioned_name_rejects_suffix_kinds() {
        let namer = namer(json!({ "region": "us-west-2" }));
        let err = namer
            .versioned_name(ResourceKind::Vpc, "v1", &json!({}))
            .unwrap_err();
        assert!(matches!(err, CompositionError::NamingPolicy { .. }));
        assert!(err.is_internal());
    }

    #[test]
    fn test_long_versioned_name_keeps_hash() {
        let namer = namer(json!({ "region": "us-west-2", "claimName": "p".repeat(30) }));
        let name = namer
            .versioned_name(ResourceKind::ClusterParameterGroup, "pg16", &json!({ "family": "f" }))
            .unwrap();
        assert!(name.len() <= MAX_NAME_LENGTH);
        assert!(name.contains("-cluster-params-pg16-"));
    }

    #[test]
    fn test_short_names_are_untouched() {
        assert_eq!(fit("vectordb", "-vpc-dev"), "vectordb-vpc-dev");
    }

    #[test]
    fn test_long_names_keep_tail() {
        let namer = namer(json!({
            "region": "us-west-2",
            "claimName": "a".repeat(30),
            "environmentSuffix": "prod",
        }));
        let names: Vec<String> = (0..3)
            .map(|i| {
                namer.name(
                    ResourceKind::RouteTableAssociation,
                    Some(&format!("private-{i}")),
                )
            })
            .collect();

        for (i, name) in names.iter().enumerate() {
            assert!(name.len() <= MAX_NAME_LENGTH, "{name}");
            assert!(name.ends_with(&format!("-private-{i}-prod")), "{name}");
        }
        assert_ne!(names[0], names[1]);
        assert_ne!(names[1], names[2]);
    }

    #[test]
    fn test_shortened_prefix_is_hashed() {
        let long = "b".repeat(60);
        let name = fit(&long, "-subnet-public-0-dev");
        assert_eq!(name.len(), MAX_NAME_LENGTH);
        assert!(name.starts_with(&format!("{}-", "b".repeat(34))));
        assert!(name.ends_with("-subnet-public-0-dev"));
        assert_ne!(fit(&long, "-subnet-public-0-dev"), fit(&"b".repeat(59), "-subnet-public-0-dev"));
    }

    #[test]
    fn test_suffix_survives_for_longest_suffix() {
        let suffix = "s".repeat(20);
        let a = namer(json!({ "region": "us-west-2", "claimName": "c".repeat(30), "environmentSuffix": suffix }));
        let b = namer(json!({
            "region": "us-west-2",
            "claimName": "c".repeat(30),
            "environmentSuffix": format!("{}t", "s".repeat(19)),
        }));
        let name_a = a.name(ResourceKind::RouteTableAssociation, Some("database-2"));
        let name_b = b.name(ResourceKind::RouteTableAssociation, Some("database-2"));

        // longest tail a valid claim produces, plus hash and one prefix character
        let longest_tail = "-route-assoc-database-0-".len() + 20;
        assert!(longest_tail + SHORTENED_HASH_LENGTH + 2 <= MAX_NAME_LENGTH);
        assert!(name_a.ends_with(&format!("-database-2-{}", "s".repeat(20))));
        assert_ne!(name_a, name_b);
    }

    #[test]
    fn test_caller_tags_win() {
        let namer = namer(json!({
            "region": "us-west-2",
            "tags": { "Project": "search", "Team": "ml" },
        }));
        let tags = namer.tags(ResourceKind::Subnet, "vectordb-subnet-public-0-dev");

        assert_eq!(tags["Project"], "search");
        assert_eq!(tags["Team"], "ml");
        assert_eq!(tags["Environment"], "dev");
        assert_eq!(tags["Component"], "network");
        assert_eq!(tags["Name"], "vectordb-subnet-public-0-dev");
    }
}
