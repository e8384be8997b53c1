// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4)")]
    InvalidPrefixLength(u8),
}

/// IPv4 network block in CIDR notation
///
/// Represents a network address plus prefix length.
/// Invariants:
/// - Prefix length 0-32
/// - Host bits are always zero (`10.10.3.7/16` normalizes to `10.10.0.0/16`)
///
/// # Examples
///
/// ```rust
/// use cim_vectordb_composition::domain::Ipv4Cidr;
///
/// let block = Ipv4Cidr::new("10.10.0.0/16").unwrap();
/// assert_eq!(block.prefix_length(), 16);
/// assert_eq!(block.nth_subnet(24, 6).unwrap().to_string(), "10.10.6.0/24");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix_length: u8,
}

impl Ipv4Cidr {
    /// Create a block from CIDR notation
    ///
    /// # Invariants
    /// - Valid IPv4 address and an explicit prefix
    /// - Prefix 0-32
    /// - Host bits are masked off
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref().trim();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix, masking host bits
    pub fn from_parts(address: Ipv4Addr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        let network = Ipv4Addr::from(u32::from(address) & Self::mask(prefix_length));
        Ok(Self {
            network,
            prefix_length,
        })
    }

    fn mask(prefix_length: u8) -> u32 {
        if prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_length))
        }
    }

    /// Network address
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Number of addresses covered by the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_length))
    }

    fn first(&self) -> u64 {
        u64::from(u32::from(self.network))
    }

    fn last(&self) -> u64 {
        self.first() + self.size() - 1
    }

    /// Whether `other` lies entirely inside this block
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.first() >= self.first() && other.last() <= self.last()
    }

    /// Whether the two blocks share at least one address
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.first() <= other.last() && other.first() <= self.last()
    }

    /// How many subnets of `new_prefix` fit in this block
    ///
    /// Returns 0 when `new_prefix` is shorter than the block's own prefix.
    pub fn subnet_count(&self, new_prefix: u8) -> u64 {
        if new_prefix < self.prefix_length || new_prefix > 32 {
            return 0;
        }
        1u64 << (new_prefix - self.prefix_length)
    }

    /// The `index`-th subnet of size `new_prefix`, counting from the network address
    pub fn nth_subnet(&self, new_prefix: u8, index: u64) -> Option<Ipv4Cidr> {
        if index >= self.subnet_count(new_prefix) {
            return None;
        }
        let step = 1u64 << (32 - u32::from(new_prefix));
        let start = self.first() + index * step;
        let address = Ipv4Addr::from(u32::try_from(start).ok()?);
        Some(Self {
            network: address,
            prefix_length: new_prefix,
        })
    }

    /// Get as CIDR notation string
    pub fn as_cidr(&self) -> String {
        format!("{}/{}", self.network, self.prefix_length)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cidr())
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ipv4Cidr> for String {
    fn from(value: Ipv4Cidr) -> Self {
        value.as_cidr()
    }
}
