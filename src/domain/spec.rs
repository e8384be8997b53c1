// Copyright (c) 2025 - Cowboy AI, Inc.
//! Composite Input and Claim Validator
//!
//! A composite claim arrives as a loosely typed map (JSON or YAML decoded
//! into [`serde_json::Value`]). [`CompositeInputSpec::from_raw`] reads every
//! known field, applies defaults, and checks the invariants in
//! [`crate::domain::invariants`]. Downstream stages only ever see a fully
//! populated, validated spec.
//!
//! Field names follow the claim's camelCase spelling; a few legacy aliases
//! (`location`, `envSuffix`, `backupRetentionPeriod`) are accepted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::invariants;
use crate::domain::network::Ipv4Cidr;
use crate::domain::windows::{BackupWindow, MaintenanceWindow};
use crate::errors::{CompositionError, CompositionResult};

/// Subnet classification by intended reachability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetTier {
    /// Routed to the internet gateway
    Public,
    /// No internet route
    Private,
    /// Hosts the database subnet group
    Database,
}

impl SubnetTier {
    /// Every tier in allocation order
    pub const ALL: [SubnetTier; 3] = [Self::Public, Self::Private, Self::Database];

    /// Position in the allocation order
    pub fn ordinal(&self) -> usize {
        match self {
            Self::Public => 0,
            Self::Private => 1,
            Self::Database => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Database => "database",
        }
    }
}

impl fmt::Display for SubnetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubnetTier {
    type Err = CompositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "database" => Ok(Self::Database),
            other => Err(CompositionError::validation(
                "subnetTiers",
                format!("unknown tier {other}"),
            )),
        }
    }
}

/// Validated composite input
///
/// Construct through [`CompositeInputSpec::from_raw`]; the engine re-checks
/// [`CompositeInputSpec::validate`] before building so a hand-modified spec
/// cannot slip past the invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeInputSpec {
    pub region: String,
    pub environment_suffix: String,
    /// Naming prefix for every resource
    pub claim_name: String,
    /// Explicit cluster identifier; derived from the prefix and suffix when absent
    pub cluster_name: Option<String>,
    pub vpc_cidr: Ipv4Cidr,
    pub az_count: usize,
    pub subnet_tiers: Vec<SubnetTier>,
    /// Sources allowed through the database ingress rule
    pub allowed_cidrs: Vec<Ipv4Cidr>,
    pub engine_version: String,
    pub min_capacity: f64,
    pub max_capacity: f64,
    pub master_username: String,
    pub database_name: String,
    pub backup_retention_days: u32,
    pub backup_window: BackupWindow,
    pub maintenance_window: MaintenanceWindow,
    pub deletion_protection: bool,
    pub generate_password: bool,
    /// Previously generated password replayed by the orchestrator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_password: Option<String>,
    pub instance_count: u32,
    pub instance_class: String,
    pub publicly_accessible: bool,
    pub extra_tags: BTreeMap<String, String>,
    pub namespace: String,
    pub provider_config_ref: String,
}

impl CompositeInputSpec {
    pub const DEFAULT_ENVIRONMENT_SUFFIX: &'static str = "dev";
    pub const DEFAULT_CLAIM_NAME: &'static str = "vectordb";
    pub const DEFAULT_VPC_CIDR: &'static str = "10.10.0.0/16";
    pub const DEFAULT_AZ_COUNT: usize = 3;
    pub const DEFAULT_ENGINE_VERSION: &'static str = "16.1";
    pub const DEFAULT_MIN_CAPACITY: f64 = 0.5;
    pub const DEFAULT_MAX_CAPACITY: f64 = 16.0;
    pub const DEFAULT_MASTER_USERNAME: &'static str = "postgres";
    pub const DEFAULT_DATABASE_NAME: &'static str = "vectordb";
    pub const DEFAULT_RETENTION_DAYS: u32 = 7;
    pub const DEFAULT_BACKUP_WINDOW: &'static str = "03:00-04:00";
    pub const DEFAULT_MAINTENANCE_WINDOW: &'static str = "sun:04:00-sun:05:00";
    pub const DEFAULT_INSTANCE_COUNT: u32 = 2;
    pub const DEFAULT_INSTANCE_CLASS: &'static str = "db.serverless";

    /// Parse, default and validate a raw claim map
    ///
    /// # Errors
    /// - `Validation` naming the first offending field
    /// - `CidrExhaustion` when the VPC block is too small for the layout
    pub fn from_raw(raw: &Value) -> CompositionResult<Self> {
        let map = raw
            .as_object()
            .ok_or_else(|| CompositionError::validation("spec", "expected an object"))?;
        let fields = RawFields { map };

        let region = fields
            .string(&["region", "location"])?
            .ok_or_else(|| CompositionError::validation("region", "is required"))?;

        let vpc_cidr = match fields.string(&["vpcCidr"])? {
            Some(cidr) => parse_cidr("vpcCidr", &cidr)?,
            None => parse_cidr("vpcCidr", Self::DEFAULT_VPC_CIDR)?,
        };

        let subnet_tiers = match fields.string_list(&["subnetTiers"])? {
            Some(names) => names
                .iter()
                .map(|n| n.parse())
                .collect::<CompositionResult<Vec<SubnetTier>>>()?,
            None => SubnetTier::ALL.to_vec(),
        };

        let allowed_cidrs = match fields.string_list(&["allowedCidrs"])? {
            Some(cidrs) => cidrs
                .iter()
                .map(|c| parse_cidr("allowedCidrs", c))
                .collect::<CompositionResult<Vec<_>>>()?,
            None => vec![vpc_cidr],
        };

        let backup_window = fields
            .string(&["backupWindow"])?
            .unwrap_or_else(|| Self::DEFAULT_BACKUP_WINDOW.to_string());
        let backup_window = BackupWindow::new(&backup_window)
            .map_err(|e| CompositionError::validation("backupWindow", e.to_string()))?;

        let maintenance_window = fields
            .string(&["maintenanceWindow"])?
            .unwrap_or_else(|| Self::DEFAULT_MAINTENANCE_WINDOW.to_string());
        let maintenance_window = MaintenanceWindow::new(&maintenance_window)
            .map_err(|e| CompositionError::validation("maintenanceWindow", e.to_string()))?;

        let spec = Self {
            region,
            environment_suffix: fields
                .string(&["environmentSuffix", "envSuffix"])?
                .unwrap_or_else(|| Self::DEFAULT_ENVIRONMENT_SUFFIX.to_string()),
            claim_name: fields
                .string(&["claimName"])?
                .unwrap_or_else(|| Self::DEFAULT_CLAIM_NAME.to_string()),
            cluster_name: fields.string(&["clusterName"])?,
            vpc_cidr,
            az_count: fields
                .unsigned(&["azCount"])?
                .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
                .unwrap_or(Self::DEFAULT_AZ_COUNT),
            subnet_tiers,
            allowed_cidrs,
            engine_version: fields
                .string(&["engineVersion"])?
                .unwrap_or_else(|| Self::DEFAULT_ENGINE_VERSION.to_string()),
            min_capacity: fields
                .number(&["minCapacity"])?
                .unwrap_or(Self::DEFAULT_MIN_CAPACITY),
            max_capacity: fields
                .number(&["maxCapacity"])?
                .unwrap_or(Self::DEFAULT_MAX_CAPACITY),
            master_username: fields
                .string(&["masterUsername"])?
                .unwrap_or_else(|| Self::DEFAULT_MASTER_USERNAME.to_string()),
            database_name: fields
                .string(&["databaseName"])?
                .unwrap_or_else(|| Self::DEFAULT_DATABASE_NAME.to_string()),
            backup_retention_days: fields
                .unsigned(&["backupRetentionDays", "backupRetentionPeriod"])?
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
                .unwrap_or(Self::DEFAULT_RETENTION_DAYS),
            backup_window,
            maintenance_window,
            deletion_protection: fields.boolean(&["deletionProtection"])?.unwrap_or(false),
            generate_password: fields.boolean(&["generatePassword"])?.unwrap_or(true),
            master_password: fields.string(&["masterPassword"])?,
            instance_count: fields
                .unsigned(&["instanceCount"])?
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
                .unwrap_or(Self::DEFAULT_INSTANCE_COUNT),
            instance_class: fields
                .string(&["instanceClass"])?
                .unwrap_or_else(|| Self::DEFAULT_INSTANCE_CLASS.to_string()),
            publicly_accessible: fields.boolean(&["publiclyAccessible"])?.unwrap_or(true),
            extra_tags: fields.string_map(&["tags", "extraTags"])?.unwrap_or_default(),
            namespace: fields
                .string(&["namespace"])?
                .unwrap_or_else(|| "default".to_string()),
            provider_config_ref: fields
                .string(&["providerConfigRef"])?
                .unwrap_or_else(|| "default".to_string()),
        };

        spec.validate()?;
        Ok(spec)
    }

    /// Check every invariant of a populated spec
    pub fn validate(&self) -> CompositionResult<()> {
        if self.region.trim().is_empty() {
            return Err(CompositionError::validation("region", "cannot be empty"));
        }
        invariants::validate_dns_label("environmentSuffix", &self.environment_suffix, 20)?;
        invariants::validate_dns_label("claimName", &self.claim_name, 30)?;
        if let Some(cluster_name) = &self.cluster_name {
            invariants::validate_dns_label("clusterName", cluster_name, 63)?;
        }
        invariants::validate_az_count(self.az_count)?;
        invariants::validate_capacity_range(self.min_capacity, self.max_capacity)?;
        invariants::validate_retention_days(self.backup_retention_days)?;
        invariants::validate_engine_version(&self.engine_version)?;
        invariants::validate_master_username(&self.master_username)?;
        invariants::validate_instance_count(self.instance_count)?;
        invariants::validate_windows(&self.backup_window, &self.maintenance_window)?;

        if self.database_name.is_empty()
            || !self.database_name.starts_with(|c: char| c.is_ascii_alphabetic())
            || !self
                .database_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(CompositionError::validation(
                "databaseName",
                format!("must be alphanumeric and start with a letter: {}", self.database_name),
            ));
        }

        if !self.instance_class.starts_with("db.") {
            return Err(CompositionError::validation(
                "instanceClass",
                format!("expected a db.* instance class, got {}", self.instance_class),
            ));
        }

        if let Some(password) = &self.master_password {
            invariants::validate_master_password(password)?;
        }

        self.validate_tiers()?;

        if self.allowed_cidrs.is_empty() {
            return Err(CompositionError::validation(
                "allowedCidrs",
                "at least one source block is required",
            ));
        }

        for key in self.extra_tags.keys() {
            if key.is_empty() || key.len() > 128 || key.starts_with("aws:") {
                return Err(CompositionError::validation(
                    "tags",
                    format!("invalid tag key {key:?}"),
                ));
            }
        }

        invariants::validate_vpc_block(&self.vpc_cidr, self.az_count, &self.subnet_tiers)
    }

    fn validate_tiers(&self) -> CompositionResult<()> {
        for (i, tier) in self.subnet_tiers.iter().enumerate() {
            if self.subnet_tiers[..i].contains(tier) {
                return Err(CompositionError::validation(
                    "subnetTiers",
                    format!("duplicate tier {tier}"),
                ));
            }
        }
        if !self.subnet_tiers.contains(&SubnetTier::Database) {
            return Err(CompositionError::validation(
                "subnetTiers",
                "the database tier is required",
            ));
        }
        Ok(())
    }

    /// PostgreSQL major version of the engine
    pub fn engine_major_version(&self) -> u32 {
        invariants::validate_engine_version(&self.engine_version).unwrap_or_default()
    }

    /// Parameter group family for the engine (`aurora-postgresql16`)
    pub fn parameter_group_family(&self) -> String {
        format!("aurora-postgresql{}", self.engine_major_version())
    }

    /// Whether the tier is part of the requested layout
    pub fn has_tier(&self, tier: SubnetTier) -> bool {
        self.subnet_tiers.contains(&tier)
    }
}

fn parse_cidr(field: &str, cidr: &str) -> CompositionResult<Ipv4Cidr> {
    Ipv4Cidr::new(cidr).map_err(|e| CompositionError::validation(field, e.to_string()))
}

/// Typed field access over a raw claim map
///
/// Every accessor takes the field name followed by accepted aliases. The
/// first present, non-null entry wins. A value of the wrong JSON type is a
/// validation error naming the canonical field.
struct RawFields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> RawFields<'a> {
    fn lookup(&self, names: &[&'static str]) -> Option<&'a Value> {
        names
            .iter()
            .filter_map(|name| self.map.get(*name))
            .find(|value| !value.is_null())
    }

    fn wrong_type(names: &[&'static str], expected: &str) -> CompositionError {
        CompositionError::validation(names[0], format!("expected {expected}"))
    }

    fn string(&self, names: &[&'static str]) -> CompositionResult<Option<String>> {
        match self.lookup(names) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(_) => Err(Self::wrong_type(names, "a string")),
        }
    }

    fn unsigned(&self, names: &[&'static str]) -> CompositionResult<Option<u64>> {
        match self.lookup(names) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| Self::wrong_type(names, "a non-negative integer")),
        }
    }

    fn number(&self, names: &[&'static str]) -> CompositionResult<Option<f64>> {
        match self.lookup(names) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| Self::wrong_type(names, "a number")),
        }
    }

    fn boolean(&self, names: &[&'static str]) -> CompositionResult<Option<bool>> {
        match self.lookup(names) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| Self::wrong_type(names, "a boolean")),
        }
    }

    fn string_list(&self, names: &[&'static str]) -> CompositionResult<Option<Vec<String>>> {
        match self.lookup(names) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(|s| s.trim().to_string())
                        .ok_or_else(|| Self::wrong_type(names, "a list of strings"))
                })
                .collect::<CompositionResult<Vec<_>>>()
                .map(Some),
            Some(_) => Err(Self::wrong_type(names, "a list of strings")),
        }
    }

    fn string_map(
        &self,
        names: &[&'static str],
    ) -> CompositionResult<Option<BTreeMap<String, String>>> {
        match self.lookup(names) {
            None => Ok(None),
            Some(Value::Object(entries)) => entries
                .iter()
                .map(|(k, v)| {
                    v.as_str()
                        .map(|s| (k.clone(), s.to_string()))
                        .ok_or_else(|| Self::wrong_type(names, "a map of strings"))
                })
                .collect::<CompositionResult<BTreeMap<_, _>>>()
                .map(Some),
            Some(_) => Err(Self::wrong_type(names, "a map of strings")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_applied() {
        let spec = CompositeInputSpec::from_raw(&json!({ "region": "us-west-2" })).unwrap();

        assert_eq!(spec.region, "us-west-2");
        assert_eq!(spec.environment_suffix, "dev");
        assert_eq!(spec.claim_name, "vectordb");
        assert_eq!(spec.vpc_cidr.to_string(), "10.10.0.0/16");
        assert_eq!(spec.az_count, 3);
        assert_eq!(spec.subnet_tiers, SubnetTier::ALL);
        assert_eq!(spec.allowed_cidrs, vec![spec.vpc_cidr]);
        assert_eq!(spec.engine_version, "16.1");
        assert_eq!(spec.min_capacity, 0.5);
        assert_eq!(spec.max_capacity, 16.0);
        assert_eq!(spec.master_username, "postgres");
        assert_eq!(spec.backup_retention_days, 7);
        assert_eq!(spec.backup_window.to_string(), "03:00-04:00");
        assert_eq!(spec.maintenance_window.to_string(), "sun:04:00-sun:05:00");
        assert!(!spec.deletion_protection);
        assert!(spec.generate_password);
        assert_eq!(spec.master_password, None);
        assert_eq!(spec.instance_count, 2);
        assert_eq!(spec.instance_class, "db.serverless");
        assert!(spec.publicly_accessible);
        assert_eq!(spec.parameter_group_family(), "aurora-postgresql16");
    }

    #[test]
    fn test_legacy_aliases() {
        let spec = CompositeInputSpec::from_raw(&json!({
            "location": "eu-west-2",
            "envSuffix": "test",
            "backupRetentionPeriod": 14,
        }))
        .unwrap();

        assert_eq!(spec.region, "eu-west-2");
        assert_eq!(spec.environment_suffix, "test");
        assert_eq!(spec.backup_retention_days, 14);
    }

    #[test]
    fn test_region_required() {
        let err = CompositeInputSpec::from_raw(&json!({ "azCount": 2 })).unwrap_err();
        assert_eq!(err.field(), Some("region"));
    }

    #[test]
    fn test_not_an_object() {
        let err = CompositeInputSpec::from_raw(&json!(["region"])).unwrap_err();
        assert_eq!(err.field(), Some("spec"));
    }

    #[test]
    fn test_wrong_type_names_field() {
        let err = CompositeInputSpec::from_raw(&json!({
            "region": "us-west-2",
            "azCount": "two",
        }))
        .unwrap_err();
        assert_eq!(err.field(), Some("azCount"));
    }

    #[test]
    fn test_database_tier_required() {
        let err = CompositeInputSpec::from_raw(&json!({
            "region": "us-west-2",
            "subnetTiers": ["public", "private"],
        }))
        .unwrap_err();
        assert_eq!(err.field(), Some("subnetTiers"));
    }

    #[test]
    fn test_duplicate_tier_rejected() {
        let err = CompositeInputSpec::from_raw(&json!({
            "region": "us-west-2",
            "subnetTiers": ["database", "database"],
        }))
        .unwrap_err();
        assert_eq!(err.field(), Some("subnetTiers"));
    }

    #[test]
    fn test_vpc_cidr_normalized() {
        let spec = CompositeInputSpec::from_raw(&json!({
            "region": "us-west-2",
            "vpcCidr": "10.20.5.9/16",
        }))
        .unwrap();
        assert_eq!(spec.vpc_cidr.to_string(), "10.20.0.0/16");
    }

    #[test]
    fn test_validate_catches_modified_spec() {
        let mut spec = CompositeInputSpec::from_raw(&json!({ "region": "us-west-2" })).unwrap();
        spec.min_capacity = 64.0;
        assert_eq!(spec.validate().unwrap_err().field(), Some("minCapacity"));
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("public".parse::<SubnetTier>().unwrap(), SubnetTier::Public);
        assert!("dmz".parse::<SubnetTier>().is_err());
    }
}
