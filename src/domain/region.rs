// Copyright (c) 2025 - Cowboy AI, Inc.
//! Region to Availability Zone Resolution
//!
//! The supported regions and their zone suffixes are shipped with the crate
//! as a static table. Planning never queries the cloud, so identical input
//! always resolves to identical zones.
//!
//! Adding a region is a data change to [`REGION_ZONES`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::errors::{CompositionError, CompositionResult};

/// Known zone suffixes per region
///
/// Order matters: zone index `i` in a plan maps to the `i`-th suffix.
pub const REGION_ZONES: &[(&str, &[char])] = &[
    ("af-south-1", &['a', 'b', 'c']),
    ("ap-southeast-2", &['a', 'b', 'c']),
    ("ca-central-1", &['a', 'b', 'd']),
    ("eu-central-1", &['a', 'b', 'c']),
    ("eu-central-2", &['a', 'b']),
    ("eu-west-2", &['a', 'b', 'c']),
    ("us-east-1", &['a', 'b', 'c', 'd', 'e', 'f']),
    ("us-east-2", &['a', 'b', 'c']),
    ("us-west-2", &['a', 'b', 'c', 'd']),
];

fn region_table() -> &'static BTreeMap<&'static str, &'static [char]> {
    static TABLE: OnceLock<BTreeMap<&'static str, &'static [char]>> = OnceLock::new();
    TABLE.get_or_init(|| REGION_ZONES.iter().copied().collect())
}

/// Resolve a region identifier to its ordered zone set
///
/// # Errors
/// [`CompositionError::UnsupportedRegion`] when the region is not in the table.
pub fn resolve(region: &str) -> CompositionResult<AvailabilityZoneSet> {
    let suffixes = region_table()
        .get(region)
        .ok_or_else(|| CompositionError::UnsupportedRegion(region.to_string()))?;

    Ok(AvailabilityZoneSet {
        region: region.to_string(),
        zones: suffixes.iter().map(|s| format!("{region}{s}")).collect(),
    })
}

/// Whether the region has an entry in the static table
pub fn is_supported(region: &str) -> bool {
    region_table().contains_key(region)
}

/// All supported region identifiers, sorted
pub fn supported_regions() -> impl Iterator<Item = &'static str> {
    region_table().keys().copied()
}

/// Ordered availability zones of one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityZoneSet {
    region: String,
    zones: Vec<String>,
}

impl AvailabilityZoneSet {
    /// Region identifier
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Full zone names (`eu-central-2a`, ...)
    pub fn zones(&self) -> &[String] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Keep the first `az_count` zones
    ///
    /// # Errors
    /// Validation error on `azCount` when the region has fewer zones.
    pub fn select(&self, az_count: usize) -> CompositionResult<AvailabilityZoneSet> {
        if az_count > self.zones.len() {
            return Err(CompositionError::validation(
                "azCount",
                format!(
                    "region {} only has {} availability zones, {} requested",
                    self.region,
                    self.zones.len(),
                    az_count
                ),
            ));
        }

        Ok(Self {
            region: self.region.clone(),
            zones: self.zones[..az_count].to_vec(),
        })
    }
}

impl fmt::Display for AvailabilityZoneSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.zones.join(","))
    }
}
