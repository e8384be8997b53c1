// Copyright (c) 2025 - Cowboy AI, Inc.
//! Composition Engine
//!
//! Runs the full pipeline for one claim:
//!
//! ```text
//! raw claim ─ validate ─ resolve zones ─ allocate CIDRs ─ name ─ build graph ─ compose secret
//! ```
//!
//! Every stage is pure. The only input that is not a function of the claim
//! is a freshly generated master password, and that is produced only when
//! the claim carries no replayed one. Compiling the same claim with the
//! same replayed password always yields identical output.

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::{info, instrument};

use crate::composition::builder;
use crate::composition::cidr::{self, CidrPlan};
use crate::composition::graph::ResourceGraph;
use crate::composition::manifest::ManifestRenderer;
use crate::composition::naming::Namer;
use crate::composition::password::{PasswordGenerator, RandomPasswordGenerator};
use crate::composition::secret::{self, SecretBundle};
use crate::config::EngineConfig;
use crate::domain::region::{self, AvailabilityZoneSet};
use crate::domain::spec::CompositeInputSpec;
use crate::errors::CompositionResult;

/// Compiles composite claims into resource graphs
pub struct CompositionEngine {
    config: EngineConfig,
    passwords: Box<dyn PasswordGenerator>,
}

impl fmt::Debug for CompositionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositionEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for CompositionEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            passwords: Box::new(RandomPasswordGenerator::new()),
        }
    }
}

impl CompositionEngine {
    /// Create an engine with a validated configuration
    pub fn new(config: EngineConfig) -> CompositionResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            passwords: Box::new(RandomPasswordGenerator::new()),
        })
    }

    /// Replace the password source
    pub fn with_password_generator(mut self, generator: impl PasswordGenerator + 'static) -> Self {
        self.passwords = Box::new(generator);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate a raw claim and compile it
    pub fn compile(&self, raw: &Value) -> CompositionResult<Composition> {
        let spec = CompositeInputSpec::from_raw(raw)?;
        self.compile_spec(&spec)
    }

    /// Compile an already parsed claim
    ///
    /// The claim is re-validated first.
    #[instrument(skip(self, spec), fields(region = %spec.region, suffix = %spec.environment_suffix))]
    pub fn compile_spec(&self, spec: &CompositeInputSpec) -> CompositionResult<Composition> {
        spec.validate()?;

        let zones = region::resolve(&spec.region)?.select(spec.az_count)?;
        let plan = cidr::allocate(&spec.vpc_cidr, spec.az_count, &spec.subnet_tiers)?;
        let namer = Namer::new(spec, &self.config);

        let password = match (&spec.master_password, spec.generate_password) {
            (Some(replayed), _) => Some(replayed.clone()),
            (None, true) => {
                info!("Generated master password");
                Some(self.passwords.generate(self.config.password_length))
            }
            (None, false) => None,
        };

        let graph = builder::build(spec, &zones, &plan, &namer, &self.config, password.as_deref())?;
        let secret = secret::compose(&graph)?;

        info!(
            zones = zones.len(),
            subnets = plan.len(),
            resources = graph.len(),
            "Compiled composite"
        );

        Ok(Composition {
            spec: spec.clone(),
            zones,
            plan,
            graph,
            secret,
            renderer: ManifestRenderer::new(spec, &self.config),
        })
    }
}

/// Output of one compilation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub spec: CompositeInputSpec,
    pub zones: AvailabilityZoneSet,
    pub plan: CidrPlan,
    pub graph: ResourceGraph,
    pub secret: SecretBundle,
    #[serde(skip)]
    renderer: ManifestRenderer,
}

impl Composition {
    /// Resource manifests in apply order
    pub fn manifests(&self) -> Vec<Value> {
        self.renderer.render_graph(&self.graph)
    }

    /// Connection bundle as a base64 `Secret` manifest
    pub fn secret_manifest(&self) -> Value {
        self.renderer.render_bundle(&self.secret)
    }

    /// Document handed to the orchestrator
    ///
    /// The connection bundle appears only as its base64 `Secret` manifest.
    pub fn to_json(&self) -> Value {
        json!({
            "zones": self.zones.zones(),
            "subnets": self.plan.allocations(),
            "resources": self.manifests(),
            "secret": self.secret_manifest(),
        })
    }
}
