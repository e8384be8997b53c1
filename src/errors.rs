// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for composition operations

use thiserror::Error;

/// Errors that can occur while compiling a composite into a resource graph
///
/// Every variant is a pure function of the input: retrying the same call
/// with the same input reproduces the same error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompositionError {
    /// Bad or missing input field
    #[error("Invalid field `{field}`: {reason}")]
    Validation { field: String, reason: String },

    /// Region absent from the static availability zone table
    #[error("Unsupported region: {0}")]
    UnsupportedRegion(String),

    /// Requested zone/tier layout does not fit the base block
    #[error("CIDR block {vpc_cidr} cannot hold {required} /24 subnets (room for {available})")]
    CidrExhaustion {
        vpc_cidr: String,
        required: u32,
        available: u32,
    },

    /// Internal invariant violation in a built graph
    #[error("Incomplete resource graph: {0}")]
    IncompleteGraph(String),

    /// A naming call used a policy the resource kind does not follow
    #[error("{kind} does not use {policy} naming")]
    NamingPolicy { kind: String, policy: String },

    /// Engine configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error while rendering output documents
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CompositionError {
    /// Create a validation error for a named input field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an incomplete graph error
    pub fn incomplete(msg: impl Into<String>) -> Self {
        Self::IncompleteGraph(msg.into())
    }

    /// Name of the offending input field, if this is a validation error
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Whether the error signals a bug in the engine rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::IncompleteGraph(_) | Self::NamingPolicy { .. } | Self::Serialization(_)
        )
    }
}

/// Result type for composition operations
pub type CompositionResult<T> = Result<T, CompositionError>;

impl From<serde_json::Error> for CompositionError {
    fn from(err: serde_json::Error) -> Self {
        CompositionError::Serialization(err.to_string())
    }
}
