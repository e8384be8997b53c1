// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the CIDR Allocator
//!
//! For any VPC block large enough for the layout, the allocated subnets
//! must be pairwise disjoint, contained in the VPC block, and placed at
//! the fixed tier offsets.

use cim_vectordb_composition::composition::cidr::{self, SUBNET_PREFIX};
use cim_vectordb_composition::domain::{Ipv4Cidr, SubnetTier};
use cim_vectordb_composition::CompositionError;
use proptest::prelude::*;
use std::net::Ipv4Addr;

// ============================================================================
// Property Test Strategies
// ============================================================================

/// VPC blocks from /16 to /20, always room for nine /24s
fn roomy_vpc() -> impl Strategy<Value = Ipv4Cidr> {
    (any::<u32>(), 16u8..=20).prop_map(|(address, prefix)| {
        Ipv4Cidr::from_parts(Ipv4Addr::from(address), prefix).unwrap()
    })
}

/// Any VPC block the validator accepts
fn any_vpc() -> impl Strategy<Value = Ipv4Cidr> {
    (any::<u32>(), 16u8..=28).prop_map(|(address, prefix)| {
        Ipv4Cidr::from_parts(Ipv4Addr::from(address), prefix).unwrap()
    })
}

/// Tier subsets that always include the database tier
fn tiers() -> impl Strategy<Value = Vec<SubnetTier>> {
    (any::<bool>(), any::<bool>()).prop_map(|(public, private)| {
        let mut tiers = Vec::new();
        if public {
            tiers.push(SubnetTier::Public);
        }
        if private {
            tiers.push(SubnetTier::Private);
        }
        tiers.push(SubnetTier::Database);
        tiers
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: the full layout yields 3 × azCount disjoint, contained blocks
    #[test]
    fn prop_full_layout_disjoint_and_contained(vpc in roomy_vpc(), az_count in 1usize..=3) {
        let plan = cidr::allocate(&vpc, az_count, &SubnetTier::ALL).unwrap();

        prop_assert_eq!(plan.len(), 3 * az_count);
        prop_assert!(plan.is_disjoint(), "blocks must not overlap");
        prop_assert!(plan.is_contained(), "blocks must lie inside the VPC");
        for allocation in plan.allocations() {
            prop_assert_eq!(allocation.cidr.prefix_length(), SUBNET_PREFIX);
        }
    }

    /// Property: a zone's block does not depend on which tiers are requested
    #[test]
    fn prop_offsets_stable_across_tier_subsets(
        vpc in roomy_vpc(),
        az_count in 1usize..=3,
        subset in tiers(),
    ) {
        let full = cidr::allocate(&vpc, az_count, &SubnetTier::ALL).unwrap();
        let partial = cidr::allocate(&vpc, az_count, &subset).unwrap();

        for allocation in partial.allocations() {
            prop_assert_eq!(
                Some(&allocation.cidr),
                full.get(allocation.tier, allocation.zone_index)
            );
        }
    }

    /// Property: growing the zone count never moves an existing block
    #[test]
    fn prop_adding_zones_keeps_blocks(vpc in roomy_vpc(), az_count in 1usize..=2) {
        let smaller = cidr::allocate(&vpc, az_count, &SubnetTier::ALL).unwrap();
        let larger = cidr::allocate(&vpc, az_count + 1, &SubnetTier::ALL).unwrap();

        for allocation in smaller.allocations() {
            prop_assert_eq!(
                Some(&allocation.cidr),
                larger.get(allocation.tier, allocation.zone_index)
            );
        }
    }

    /// Property: allocation succeeds exactly when the capacity check passes
    #[test]
    fn prop_exhaustion_matches_capacity_check(
        vpc in any_vpc(),
        az_count in 1usize..=3,
        subset in tiers(),
    ) {
        match (cidr::ensure_capacity(&vpc, az_count, &subset), cidr::allocate(&vpc, az_count, &subset)) {
            (Ok(()), Ok(plan)) => {
                prop_assert!(plan.is_disjoint());
                prop_assert!(plan.is_contained());
            }
            (Err(a), Err(b)) => {
                prop_assert_eq!(&a, &b);
                let is_exhaustion = matches!(a, CompositionError::CidrExhaustion { .. });
                prop_assert!(is_exhaustion);
            }
            (check, allocation) => {
                prop_assert!(false, "capacity check {:?} disagrees with allocation {:?}", check, allocation);
            }
        }
    }
}
