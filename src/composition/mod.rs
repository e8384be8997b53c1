// Copyright (c) 2025 - Cowboy AI, Inc.
//! Composition pipeline stages
//!
//! Each stage is a pure function of the previous stage's output:
//!
//! 1. [`cidr`] - carve tier subnets out of the VPC block
//! 2. [`naming`] - deterministic names and tags
//! 3. [`builder`] - ordered resource graph
//! 4. [`secret`] - connection secret bundle
//!
//! [`graph`] holds the node and graph types shared by the later stages,
//! [`password`] the generator seam and [`manifest`] the output rendering.

pub mod builder;
pub mod cidr;
pub mod graph;
pub mod manifest;
pub mod naming;
pub mod password;
pub mod secret;

pub use cidr::{CidrPlan, SubnetAllocation};
pub use graph::{NodeId, ResourceGraph, ResourceNode};
pub use manifest::ManifestRenderer;
pub use naming::Namer;
pub use password::{PasswordGenerator, RandomPasswordGenerator, StaticPasswordGenerator};
pub use secret::SecretBundle;
