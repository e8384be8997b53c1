//! Composition engine for serverless vector databases
//!
//! Compiles a small declarative claim (region, capacity bounds, naming
//! suffix, backup and maintenance windows, protection flags) into an
//! ordered, internally consistent graph of cloud resource descriptors plus
//! the connection secret a client needs.
//!
//! ```rust
//! use cim_vectordb_composition::CompositionEngine;
//!
//! let engine = CompositionEngine::default();
//! let composition = engine
//!     .compile(&serde_json::json!({ "region": "eu-central-2", "azCount": 2 }))
//!     .unwrap();
//!
//! assert_eq!(composition.zones.zones(), ["eu-central-2a", "eu-central-2b"]);
//! assert!(composition.secret.master_password.is_some());
//! ```
//!
//! The engine makes no cloud calls. Applying the graph, persisting the
//! secret and replaying the generated password belong to the orchestrator.

pub mod composition;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;

// Re-export commonly used types
pub use composition::{ResourceGraph, ResourceNode, SecretBundle};
pub use config::EngineConfig;
pub use domain::{CompositeInputSpec, ResourceKind, SubnetTier};
pub use engine::{Composition, CompositionEngine};
pub use errors::{CompositionError, CompositionResult};
