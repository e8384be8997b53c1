// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-vectordb-composition
//!
//! Provides deterministic claims and engines for the integration suites.
//!
//! # Design Principles
//! - No randomness: the engine always uses a fixed password generator
//! - Claims are built from one base with per-test overrides
#![allow(dead_code)]

use cim_vectordb_composition::composition::StaticPasswordGenerator;
use cim_vectordb_composition::CompositionEngine;
use serde_json::{json, Value};

/// Password returned by the fixture generator
pub const GENERATED_PASSWORD: &str = "Generated#Pass1234";

/// Password the orchestrator replays from a previous run
pub const REPLAYED_PASSWORD: &str = "Replayed#Pass5678";

/// Engine whose generated passwords are fixed
pub fn engine() -> CompositionEngine {
    CompositionEngine::default().with_password_generator(StaticPasswordGenerator::new(GENERATED_PASSWORD))
}

/// Minimal valid claim
pub fn base_claim() -> Value {
    json!({
        "region": "us-west-2",
        "environmentSuffix": "test",
    })
}

/// Base claim with `overrides` merged on top
pub fn claim_with(overrides: Value) -> Value {
    let mut claim = base_claim();
    if let (Some(target), Value::Object(entries)) = (claim.as_object_mut(), overrides) {
        target.extend(entries);
    }
    claim
}
