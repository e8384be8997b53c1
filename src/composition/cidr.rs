// Copyright (c) 2025 - Cowboy AI, Inc.
//! CIDR Allocator
//!
//! Carves tier subnets out of the VPC block. Every subnet is a /24 and each
//! tier owns a fixed run of [`TIER_STRIDE`] consecutive blocks, one per
//! possible availability zone:
//!
//! ```text
//! block index:  0  1  2 | 3  4  5 | 6  7  8
//! tier:         public  | private | database
//! zone:         a  b  c | a  b  c | a  b  c
//! ```
//!
//! A zone index therefore maps to the same block whatever `azCount` is and
//! whichever tiers are requested. Growing from two to three zones only adds
//! blocks; it never moves a live subnet. The offsets are part of the deployed
//! state and must not change.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::network::Ipv4Cidr;
use crate::domain::spec::SubnetTier;
use crate::errors::{CompositionError, CompositionResult};

/// Prefix length of every tier subnet
pub const SUBNET_PREFIX: u8 = 24;

/// Blocks reserved per tier (the maximum zone count)
pub const TIER_STRIDE: usize = 3;

/// First block index of a tier
pub fn tier_offset(tier: SubnetTier) -> usize {
    tier.ordinal() * TIER_STRIDE
}

/// Number of /24 blocks the layout needs: one past the highest index used
fn required_blocks(az_count: usize, tiers: &[SubnetTier]) -> usize {
    tiers
        .iter()
        .map(|tier| tier_offset(*tier) + az_count)
        .max()
        .unwrap_or(0)
}

/// Check that `vpc_cidr` can hold every requested tier for `az_count` zones
///
/// # Errors
/// [`CompositionError::CidrExhaustion`] when the highest block index falls
/// outside the VPC block.
pub fn ensure_capacity(
    vpc_cidr: &Ipv4Cidr,
    az_count: usize,
    tiers: &[SubnetTier],
) -> CompositionResult<()> {
    let required = required_blocks(az_count, tiers);
    let available = vpc_cidr.subnet_count(SUBNET_PREFIX);

    if required as u64 > available {
        return Err(CompositionError::CidrExhaustion {
            vpc_cidr: vpc_cidr.to_string(),
            required: u32::try_from(required).unwrap_or(u32::MAX),
            available: u32::try_from(available).unwrap_or(u32::MAX),
        });
    }
    Ok(())
}

/// One allocated subnet block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetAllocation {
    pub tier: SubnetTier,
    pub zone_index: usize,
    pub cidr: Ipv4Cidr,
}

/// Tier and zone to subnet block mapping
///
/// Allocations are ordered by tier (public, private, database) then zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CidrPlan {
    vpc_cidr: Ipv4Cidr,
    allocations: Vec<SubnetAllocation>,
}

impl CidrPlan {
    pub fn vpc_cidr(&self) -> &Ipv4Cidr {
        &self.vpc_cidr
    }

    pub fn allocations(&self) -> &[SubnetAllocation] {
        &self.allocations
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Block of one tier in one zone
    pub fn get(&self, tier: SubnetTier, zone_index: usize) -> Option<&Ipv4Cidr> {
        self.allocations
            .iter()
            .find(|a| a.tier == tier && a.zone_index == zone_index)
            .map(|a| &a.cidr)
    }

    /// Blocks of one tier, in zone order
    pub fn tier_blocks(&self, tier: SubnetTier) -> Vec<&Ipv4Cidr> {
        self.allocations
            .iter()
            .filter(|a| a.tier == tier)
            .map(|a| &a.cidr)
            .collect()
    }

    /// Tiers present in the plan, in allocation order
    pub fn tiers(&self) -> Vec<SubnetTier> {
        let mut tiers: Vec<SubnetTier> = self.allocations.iter().map(|a| a.tier).collect();
        tiers.dedup();
        tiers
    }

    /// Whether no two blocks share an address
    pub fn is_disjoint(&self) -> bool {
        self.allocations.iter().enumerate().all(|(i, a)| {
            self.allocations[i + 1..]
                .iter()
                .all(|b| !a.cidr.overlaps(&b.cidr))
        })
    }

    /// Whether every block lies inside the VPC block
    pub fn is_contained(&self) -> bool {
        self.allocations
            .iter()
            .all(|a| self.vpc_cidr.contains(&a.cidr))
    }
}

/// Allocate /24 blocks for each requested tier in `az_count` zones
///
/// Tiers are allocated in their fixed order regardless of the order given;
/// duplicates are ignored.
///
/// # Errors
/// [`CompositionError::CidrExhaustion`] when the VPC block is too small.
pub fn allocate(
    vpc_cidr: &Ipv4Cidr,
    az_count: usize,
    tiers: &[SubnetTier],
) -> CompositionResult<CidrPlan> {
    ensure_capacity(vpc_cidr, az_count, tiers)?;

    let mut allocations = Vec::with_capacity(tiers.len() * az_count);
    for tier in SubnetTier::ALL.into_iter().filter(|t| tiers.contains(t)) {
        let offset = tier_offset(tier);
        for zone_index in 0..az_count {
            let index = (offset + zone_index) as u64;
            let cidr = vpc_cidr.nth_subnet(SUBNET_PREFIX, index).ok_or_else(|| {
                CompositionError::CidrExhaustion {
                    vpc_cidr: vpc_cidr.to_string(),
                    required: u32::try_from(index + 1).unwrap_or(u32::MAX),
                    available: u32::try_from(vpc_cidr.subnet_count(SUBNET_PREFIX))
                        .unwrap_or(u32::MAX),
                }
            })?;

            debug!(tier = %tier, zone_index, cidr = %cidr, "Allocated subnet block");
            allocations.push(SubnetAllocation {
                tier,
                zone_index,
                cidr,
            });
        }
    }

    Ok(CidrPlan {
        vpc_cidr: *vpc_cidr,
        allocations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vpc(cidr: &str) -> Ipv4Cidr {
        Ipv4Cidr::new(cidr).unwrap()
    }

    #[test]
    fn test_database_blocks_two_zones() {
        let plan = allocate(&vpc("10.10.0.0/16"), 2, &[SubnetTier::Database]).unwrap();
        let blocks: Vec<String> = plan
            .tier_blocks(SubnetTier::Database)
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(blocks, ["10.10.6.0/24", "10.10.7.0/24"]);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_database_blocks_three_zones() {
        let plan = allocate(&vpc("10.10.0.0/16"), 3, &[SubnetTier::Database]).unwrap();
        let blocks: Vec<String> = plan
            .tier_blocks(SubnetTier::Database)
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(blocks, ["10.10.6.0/24", "10.10.7.0/24", "10.10.8.0/24"]);
    }

    #[test]
    fn test_full_layout() {
        let plan = allocate(&vpc("192.168.0.0/16"), 3, &SubnetTier::ALL).unwrap();
        assert_eq!(plan.len(), 9);
        assert_eq!(
            plan.get(SubnetTier::Public, 0).unwrap().to_string(),
            "192.168.0.0/24"
        );
        assert_eq!(
            plan.get(SubnetTier::Private, 1).unwrap().to_string(),
            "192.168.4.0/24"
        );
        assert_eq!(
            plan.get(SubnetTier::Database, 2).unwrap().to_string(),
            "192.168.8.0/24"
        );
        assert!(plan.is_disjoint());
        assert!(plan.is_contained());
    }

    #[test]
    fn test_tier_order_is_fixed() {
        let plan = allocate(
            &vpc("10.10.0.0/16"),
            1,
            &[SubnetTier::Database, SubnetTier::Public],
        )
        .unwrap();
        assert_eq!(plan.tiers(), [SubnetTier::Public, SubnetTier::Database]);
    }

    #[test]
    fn test_growing_zones_keeps_blocks() {
        let two = allocate(&vpc("10.10.0.0/16"), 2, &SubnetTier::ALL).unwrap();
        let three = allocate(&vpc("10.10.0.0/16"), 3, &SubnetTier::ALL).unwrap();
        for allocation in two.allocations() {
            assert_eq!(
                three.get(allocation.tier, allocation.zone_index),
                Some(&allocation.cidr)
            );
        }
    }

    #[test]
    fn test_exhaustion() {
        let err = allocate(&vpc("10.10.0.0/22"), 1, &SubnetTier::ALL).unwrap_err();
        assert_eq!(
            err,
            CompositionError::CidrExhaustion {
                vpc_cidr: "10.10.0.0/22".to_string(),
                required: 7,
                available: 4,
            }
        );

        assert!(allocate(&vpc("10.10.0.0/21"), 2, &SubnetTier::ALL).is_ok());
        assert!(allocate(&vpc("10.10.0.0/21"), 3, &SubnetTier::ALL).is_err());
        assert!(allocate(&vpc("10.10.0.0/25"), 1, &[SubnetTier::Public]).is_err());
    }
}
