// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Serverless Capacity Bounds
//!
//! Valid bounds reach the cluster unchanged with `min ≤ max`; inverted
//! bounds are rejected before any resource is planned.

use cim_vectordb_composition::composition::StaticPasswordGenerator;
use cim_vectordb_composition::{CompositionEngine, CompositionError};
use proptest::prelude::*;
use serde_json::json;

fn engine() -> CompositionEngine {
    CompositionEngine::default()
        .with_password_generator(StaticPasswordGenerator::new("Generated#Pass1234"))
}

/// Capacities on the 0.5 ACU grid between 0.5 and 256
fn acu() -> impl Strategy<Value = f64> {
    (1u32..=512).prop_map(|halves| f64::from(halves) / 2.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: compiled clusters carry the claimed bounds and min ≤ max
    #[test]
    fn prop_valid_bounds_pass_through(a in acu(), b in acu()) {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        let composition = engine()
            .compile(&json!({ "region": "us-east-2", "minCapacity": min, "maxCapacity": max }))
            .unwrap();

        let cluster = composition.graph.get("cluster").unwrap();
        let scaling = &cluster.properties()["serverlessv2ScalingConfiguration"][0];
        let emitted_min = scaling["minCapacity"].as_f64().unwrap();
        let emitted_max = scaling["maxCapacity"].as_f64().unwrap();

        prop_assert_eq!(emitted_min, min);
        prop_assert_eq!(emitted_max, max);
        prop_assert!(emitted_min <= emitted_max);
    }

    /// Property: inverted bounds fail validation on minCapacity
    #[test]
    fn prop_inverted_bounds_rejected(a in acu(), b in acu()) {
        prop_assume!(a != b);
        let (min, max) = if a > b { (a, b) } else { (b, a) };
        let err = engine()
            .compile(&json!({ "region": "us-east-2", "minCapacity": min, "maxCapacity": max }))
            .unwrap_err();

        let is_validation = matches!(err, CompositionError::Validation { .. });
        prop_assert!(is_validation);
        prop_assert_eq!(err.field(), Some("minCapacity"));
    }

    /// Property: capacities off the 0.5 ACU grid are rejected
    #[test]
    fn prop_off_grid_capacity_rejected(
        halves in 1u32..=511,
        offset in prop::sample::select(vec![0.1, 0.25, 0.3]),
    ) {
        let min = f64::from(halves) / 2.0 + offset;
        let err = engine()
            .compile(&json!({ "region": "us-east-2", "minCapacity": min, "maxCapacity": 256 }))
            .unwrap_err();

        prop_assert_eq!(err.field(), Some("minCapacity"));
    }
}
