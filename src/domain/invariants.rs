// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Composite Invariants
//!
//! This module contains the business rules a composite claim must satisfy
//! before any resource is planned. All functions are pure (no side effects)
//! and fail with a [`CompositionError::Validation`] naming the offending
//! claim field.
//!
//! # Invariant Categories
//!
//! 1. **Structural Invariants**: names, identifiers, formats
//! 2. **Range Invariants**: capacity, retention, counts
//! 3. **Cross-field Invariants**: `minCapacity ≤ maxCapacity`, window overlap,
//!    network block large enough for the requested zones

use crate::composition::cidr;
use crate::domain::network::Ipv4Cidr;
use crate::domain::spec::SubnetTier;
use crate::domain::windows::{BackupWindow, MaintenanceWindow};
use crate::errors::{CompositionError, CompositionResult};

/// Smallest VPC prefix the provider accepts
pub const MIN_VPC_PREFIX: u8 = 16;
/// Largest VPC prefix the provider accepts
pub const MAX_VPC_PREFIX: u8 = 28;
/// Upper bound of the serverless v2 scaling range, in ACUs
pub const MAX_ACU: f64 = 256.0;
/// Supported availability zone counts
pub const AZ_COUNT_RANGE: std::ops::RangeInclusive<usize> = 1..=3;
/// Allowed automated backup retention, in days
pub const RETENTION_RANGE: std::ops::RangeInclusive<u32> = 1..=35;
/// Allowed cluster member count
pub const INSTANCE_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=15;

fn invalid(field: &str, reason: impl Into<String>) -> CompositionError {
    CompositionError::validation(field, reason)
}

/// Validate a lowercase DNS label used inside resource names
///
/// # Rules
/// - 1 to `max_len` characters
/// - lowercase ASCII letters, digits and hyphens
/// - must start with a letter and not end with a hyphen
pub fn validate_dns_label(field: &str, value: &str, max_len: usize) -> CompositionResult<()> {
    if value.is_empty() {
        return Err(invalid(field, "cannot be empty"));
    }
    if value.len() > max_len {
        return Err(invalid(
            field,
            format!("exceeds {max_len} characters: {value}"),
        ));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(invalid(field, format!("invalid character {c:?} in {value}")));
    }
    if !value.starts_with(|c: char| c.is_ascii_lowercase()) || value.ends_with('-') {
        return Err(invalid(
            field,
            format!("must start with a letter and not end with a hyphen: {value}"),
        ));
    }
    Ok(())
}

/// Validate one end of the serverless scaling range
///
/// # Rules
/// - strictly positive
/// - at most [`MAX_ACU`]
/// - a multiple of 0.5 ACU
pub fn validate_capacity(field: &str, acu: f64) -> CompositionResult<()> {
    if !acu.is_finite() || acu <= 0.0 {
        return Err(invalid(field, format!("must be greater than 0, got {acu}")));
    }
    if acu > MAX_ACU {
        return Err(invalid(field, format!("must be at most {MAX_ACU}, got {acu}")));
    }
    if (acu * 2.0).fract() != 0.0 {
        return Err(invalid(
            field,
            format!("must be a multiple of 0.5 ACU, got {acu}"),
        ));
    }
    Ok(())
}

/// Validate the scaling range as a whole
pub fn validate_capacity_range(min_capacity: f64, max_capacity: f64) -> CompositionResult<()> {
    validate_capacity("minCapacity", min_capacity)?;
    validate_capacity("maxCapacity", max_capacity)?;
    if min_capacity > max_capacity {
        return Err(invalid(
            "minCapacity",
            format!("{min_capacity} exceeds maxCapacity {max_capacity}"),
        ));
    }
    Ok(())
}

pub fn validate_az_count(az_count: usize) -> CompositionResult<()> {
    if !AZ_COUNT_RANGE.contains(&az_count) {
        return Err(invalid(
            "azCount",
            format!(
                "must be between {} and {}, got {az_count}",
                AZ_COUNT_RANGE.start(),
                AZ_COUNT_RANGE.end()
            ),
        ));
    }
    Ok(())
}

pub fn validate_retention_days(days: u32) -> CompositionResult<()> {
    if !RETENTION_RANGE.contains(&days) {
        return Err(invalid(
            "backupRetentionDays",
            format!(
                "must be between {} and {} days, got {days}",
                RETENTION_RANGE.start(),
                RETENTION_RANGE.end()
            ),
        ));
    }
    Ok(())
}

pub fn validate_instance_count(count: u32) -> CompositionResult<()> {
    if !INSTANCE_COUNT_RANGE.contains(&count) {
        return Err(invalid(
            "instanceCount",
            format!(
                "must be between {} and {}, got {count}",
                INSTANCE_COUNT_RANGE.start(),
                INSTANCE_COUNT_RANGE.end()
            ),
        ));
    }
    Ok(())
}

/// Validate the VPC block against the provider's size limits and the
/// tier layout requested
///
/// # Errors
/// - `Validation` when the prefix is outside /16../28
/// - `CidrExhaustion` when the block cannot hold the tier subnets
pub fn validate_vpc_block(
    vpc_cidr: &Ipv4Cidr,
    az_count: usize,
    tiers: &[SubnetTier],
) -> CompositionResult<()> {
    let prefix = vpc_cidr.prefix_length();
    if !(MIN_VPC_PREFIX..=MAX_VPC_PREFIX).contains(&prefix) {
        return Err(invalid(
            "vpcCidr",
            format!("prefix /{prefix} outside /{MIN_VPC_PREFIX}../{MAX_VPC_PREFIX}"),
        ));
    }
    cidr::ensure_capacity(vpc_cidr, az_count, tiers)
}

/// Validate the engine version and return its major version
///
/// Accepts `major.minor` with numeric components (`16.1`).
pub fn validate_engine_version(version: &str) -> CompositionResult<u32> {
    let parse = || -> Option<u32> {
        let (major, minor) = version.split_once('.')?;
        if minor.is_empty() || !minor.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        major.parse().ok()
    };

    match parse() {
        Some(major) if major >= 11 => Ok(major),
        _ => Err(invalid(
            "engineVersion",
            format!("expected a PostgreSQL major.minor version of 11 or later, got {version}"),
        )),
    }
}

/// Validate the master username
///
/// # Rules
/// - 1 to 63 characters
/// - starts with a letter, then letters, digits or underscores
/// - not a name reserved by the provider
pub fn validate_master_username(username: &str) -> CompositionResult<()> {
    const RESERVED: &[&str] = &["rdsadmin", "rdsrepladmin"];

    if username.is_empty() || username.len() > 63 {
        return Err(invalid("masterUsername", "must be 1 to 63 characters"));
    }
    if !username.starts_with(|c: char| c.is_ascii_alphabetic())
        || !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(invalid(
            "masterUsername",
            format!("must start with a letter and contain only letters, digits or underscores: {username}"),
        ));
    }
    if RESERVED.contains(&username.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "masterUsername",
            format!("{username} is reserved"),
        ));
    }
    Ok(())
}

/// Validate a replayed master password
///
/// # Rules
/// - 8 to 128 printable ASCII characters
/// - none of `/`, `"`, `@` or space
pub fn validate_master_password(password: &str) -> CompositionResult<()> {
    if password.len() < 8 || password.len() > 128 {
        return Err(invalid("masterPassword", "must be 8 to 128 characters"));
    }
    if password
        .chars()
        .any(|c| !c.is_ascii_graphic() || matches!(c, '/' | '"' | '@'))
    {
        return Err(invalid(
            "masterPassword",
            "must be printable ASCII without '/', '\"', '@' or spaces",
        ));
    }
    Ok(())
}

/// Validate that the weekly maintenance window never meets the daily
/// backup window
pub fn validate_windows(
    backup: &BackupWindow,
    maintenance: &MaintenanceWindow,
) -> CompositionResult<()> {
    if maintenance.overlaps(backup) {
        return Err(invalid(
            "maintenanceWindow",
            format!("{maintenance} overlaps backupWindow {backup}"),
        ));
    }
    Ok(())
}
