// Copyright (c) 2025 - Cowboy AI, Inc.
//! Composition Domain Models
//!
//! Value objects and validation rules for the composite claim a caller
//! submits, plus the static data the engine plans against.
//!
//! # Value Objects with Invariants
//!
//! - [`Ipv4Cidr`] - IPv4 network block, host bits masked
//! - [`BackupWindow`] / [`MaintenanceWindow`] - provider window syntax
//! - [`ResourceKind`] - taxonomy of emitted resource descriptors
//! - [`CompositeInputSpec`] - the validated claim
//!
//! # Static Data
//!
//! - [`region`] - region to availability zone table

pub mod invariants;
pub mod network;
pub mod region;
pub mod resource_kind;
pub mod spec;
pub mod windows;

pub use network::{Ipv4Cidr, NetworkError};
pub use region::{resolve as resolve_region, AvailabilityZoneSet};
pub use resource_kind::{Component, NamingPolicy, ResourceKind};
pub use spec::{CompositeInputSpec, SubnetTier};
pub use windows::{BackupWindow, MaintenanceWindow, WindowError};
