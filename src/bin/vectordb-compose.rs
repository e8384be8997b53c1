// Copyright (c) 2025 - Cowboy AI, Inc.
//! Vector database composer
//!
//! Reads a composite claim (YAML or JSON) on stdin and prints the compiled
//! composition as JSON on stdout. A full claim object with a top-level
//! `spec` is accepted as well as the bare spec.
//!
//! Run with: cat claim.yaml | cargo run --bin vectordb-compose
//!
//! Engine settings come from `VECTORDB_*` environment variables; logs go to
//! stderr and honour `RUST_LOG`.

use anyhow::{Context, Result};
use cim_vectordb_composition::{CompositionEngine, EngineConfig};
use std::io::Read;
use tracing::{error, info};

fn read_claim() -> Result<serde_json::Value> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read claim from stdin")?;

    // YAML is a superset of JSON, one parser covers both
    let mut claim: serde_json::Value =
        serde_yaml::from_str(&input).context("Claim is neither valid YAML nor JSON")?;

    if let Some(spec) = claim.get_mut("spec").map(serde_json::Value::take) {
        claim = spec;
    }
    Ok(claim)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = EngineConfig::from_env().context("Invalid engine configuration")?;
    let engine = CompositionEngine::new(config)?;
    let claim = read_claim()?;

    let composition = match engine.compile(&claim) {
        Ok(composition) => composition,
        Err(e) => {
            error!(error = %e, "Composition failed");
            return Err(e.into());
        }
    };

    info!(
        resources = composition.graph.len(),
        cluster = %composition.secret.cluster_id,
        "Composition ready"
    );

    let output = serde_json::to_string_pretty(&composition.to_json())
        .context("Failed to render composition")?;
    println!("{output}");
    Ok(())
}
