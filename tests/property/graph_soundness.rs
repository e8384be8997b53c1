// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Resource Graph Soundness
//!
//! For any valid claim the compiled graph must list every dependency before
//! its dependent, its dependency sets must equal its references, and
//! compiling again with the replayed password must reproduce the output.
//! Claim names and suffixes run up to their accepted lengths, so every
//! resource name must also stay within the provider cap and be unique.

use cim_vectordb_composition::composition::naming::MAX_NAME_LENGTH;
use cim_vectordb_composition::composition::StaticPasswordGenerator;
use cim_vectordb_composition::domain::region;
use cim_vectordb_composition::CompositionEngine;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Valid claims across every supported region and optional feature
fn claim() -> impl Strategy<Value = Value> {
    let regions: Vec<&'static str> = region::supported_regions().collect();
    (
        prop::sample::select(regions),
        1usize..=3,
        (any::<bool>(), any::<bool>()),
        1u32..=5,
        any::<bool>(),
        any::<bool>(),
        "[a-z]([a-z0-9-]{0,18}[a-z0-9])?",
        "[a-z]([a-z0-9-]{0,28}[a-z0-9])?",
        prop::option::of("[a-z]([a-z0-9-]{0,61}[a-z0-9])?"),
    )
        .prop_map(
            |(
                region,
                az_count,
                (public, private),
                instances,
                generate,
                exposed,
                suffix,
                claim_name,
                cluster_name,
            )| {
                let zones = region::resolve(region).unwrap().len();
                let mut tiers = Vec::new();
                if public {
                    tiers.push("public");
                }
                if private {
                    tiers.push("private");
                }
                tiers.push("database");

                let mut claim = json!({
                    "region": region,
                    "azCount": az_count.min(zones),
                    "subnetTiers": tiers,
                    "instanceCount": instances,
                    "generatePassword": generate,
                    "publiclyAccessible": exposed,
                    "environmentSuffix": suffix,
                    "claimName": claim_name,
                });
                if let Some(cluster_name) = cluster_name {
                    claim["clusterName"] = json!(cluster_name);
                }
                claim
            },
        )
}

fn engine() -> CompositionEngine {
    CompositionEngine::default()
        .with_password_generator(StaticPasswordGenerator::new("Generated#Pass1234"))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: every dependency precedes its dependent
    #[test]
    fn prop_dependencies_precede_dependents(claim in claim()) {
        let composition = engine().compile(&claim).unwrap();
        let graph = &composition.graph;
        let position: HashMap<&str, usize> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id().as_str(), i))
            .collect();

        for (index, node) in graph.nodes().iter().enumerate() {
            for dep in node.depends_on() {
                prop_assert!(position[dep.as_str()] < index, "{} before {}", node.id(), dep);
            }
        }

        let order: Vec<_> = graph.topological_order().unwrap();
        let emitted: Vec<_> = graph.nodes().iter().map(|n| n.id().clone()).collect();
        prop_assert_eq!(order, emitted);
    }

    /// Property: every valid claim compiles to capped, unique names
    #[test]
    fn prop_names_capped_and_unique(claim in claim()) {
        let composition = engine().compile(&claim);
        prop_assert!(composition.is_ok(), "{:?}", composition.as_ref().err());

        let composition = composition.unwrap();
        let mut seen = BTreeSet::new();
        for node in composition.graph.nodes() {
            prop_assert!(node.name().len() <= MAX_NAME_LENGTH, "{}", node.name());
            prop_assert!(seen.insert(node.name().to_string()), "duplicate {}", node.name());
        }
    }

    /// Property: dependency sets equal the referenced nodes
    #[test]
    fn prop_dependencies_equal_references(claim in claim()) {
        let composition = engine().compile(&claim).unwrap();
        let graph = &composition.graph;

        for node in graph.nodes() {
            let referenced: BTreeSet<String> = node
                .referenced_names()
                .iter()
                .map(|name| graph.find_by_name(name).unwrap().id().to_string())
                .collect();
            let declared: BTreeSet<String> =
                node.depends_on().iter().map(|id| id.to_string()).collect();
            prop_assert_eq!(referenced, declared);
        }
    }

    /// Property: replaying the password reproduces the serialized output
    #[test]
    fn prop_replay_is_idempotent(claim in claim()) {
        let first = engine().compile(&claim).unwrap();

        let mut replayed = claim.clone();
        if let Some(password) = &first.secret.master_password {
            replayed["masterPassword"] = json!(password);
        }
        let second = CompositionEngine::default().compile(&replayed).unwrap();

        prop_assert_eq!(first.to_json(), second.to_json());
    }

    /// Property: a password secret exists exactly when a password is known
    #[test]
    fn prop_secret_node_matches_bundle(claim in claim()) {
        let composition = engine().compile(&claim).unwrap();
        let has_secret_node = composition
            .graph
            .first_of_kind(cim_vectordb_composition::ResourceKind::Secret)
            .is_some();

        prop_assert_eq!(has_secret_node, composition.secret.master_password.is_some());
        prop_assert_eq!(has_secret_node, claim["generatePassword"] == json!(true));
    }
}
