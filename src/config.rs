// Copyright (c) 2025 - Cowboy AI, Inc.
//! Engine-wide configuration
//!
//! Settings that are not part of a composite claim but shape every graph
//! the engine builds. Defaults match the deployed compositions; each value
//! can be overridden through a `VECTORDB_*` environment variable.

use std::str::FromStr;

use crate::errors::{CompositionError, CompositionResult};

/// Configuration for the composition engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Database port opened by the ingress rule and published in the secret
    pub db_port: u16,
    /// Enhanced monitoring interval in seconds (0 disables monitoring)
    pub monitoring_interval: u32,
    /// Performance Insights retention in days
    pub performance_insights_retention: u32,
    /// Length of generated master passwords
    pub password_length: usize,
    /// Value of the `Project` tag on every resource
    pub project_tag: String,
    /// Managed policy attached to the monitoring role
    pub monitoring_policy_arn: String,
    /// Libraries preloaded through the parameter groups
    pub preload_libraries: String,
    /// Hex characters of the content hash kept in versioned names
    pub name_hash_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_port: 5432,
            monitoring_interval: 60,
            performance_insights_retention: 7,
            password_length: 32,
            project_tag: "vectordb".to_string(),
            monitoring_policy_arn:
                "arn:aws:iam::aws:policy/service-role/AmazonRDSEnhancedMonitoringRole".to_string(),
            preload_libraries: "vector".to_string(),
            name_hash_length: 10,
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> CompositionResult<T> {
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| {
            CompositionError::Configuration(format!("{key} has an invalid value: {value}"))
        }),
        Err(_) => Ok(default),
    }
}

impl EngineConfig {
    /// Shortest password that can contain every required character class
    pub const MIN_PASSWORD_LENGTH: usize = 16;

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> CompositionResult<Self> {
        let defaults = Self::default();

        let config = Self {
            db_port: env_parse("VECTORDB_DB_PORT", defaults.db_port)?,
            monitoring_interval: env_parse(
                "VECTORDB_MONITORING_INTERVAL",
                defaults.monitoring_interval,
            )?,
            performance_insights_retention: env_parse(
                "VECTORDB_PERFORMANCE_INSIGHTS_RETENTION",
                defaults.performance_insights_retention,
            )?,
            password_length: env_parse("VECTORDB_PASSWORD_LENGTH", defaults.password_length)?,
            project_tag: std::env::var("VECTORDB_PROJECT_TAG").unwrap_or(defaults.project_tag),
            monitoring_policy_arn: std::env::var("VECTORDB_MONITORING_POLICY_ARN")
                .unwrap_or(defaults.monitoring_policy_arn),
            preload_libraries: std::env::var("VECTORDB_PRELOAD_LIBRARIES")
                .unwrap_or(defaults.preload_libraries),
            name_hash_length: defaults.name_hash_length,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> CompositionResult<()> {
        if self.db_port == 0 {
            return Err(CompositionError::Configuration(
                "database port must be non-zero".to_string(),
            ));
        }
        if !matches!(self.monitoring_interval, 0 | 1 | 5 | 10 | 15 | 30 | 60) {
            return Err(CompositionError::Configuration(format!(
                "monitoring interval {} is not one of 0, 1, 5, 10, 15, 30, 60",
                self.monitoring_interval
            )));
        }
        if self.password_length < Self::MIN_PASSWORD_LENGTH || self.password_length > 128 {
            return Err(CompositionError::Configuration(format!(
                "password length {} must be between {} and 128",
                self.password_length,
                Self::MIN_PASSWORD_LENGTH
            )));
        }
        if self.project_tag.is_empty() {
            return Err(CompositionError::Configuration(
                "project tag cannot be empty".to_string(),
            ));
        }
        if !(4..=64).contains(&self.name_hash_length) {
            return Err(CompositionError::Configuration(format!(
                "name hash length {} must be between 4 and 64",
                self.name_hash_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.db_port, 5432);
        assert_eq!(config.monitoring_interval, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_short_passwords() {
        let config = EngineConfig {
            password_length: 8,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CompositionError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_monitoring_interval() {
        let config = EngineConfig {
            monitoring_interval: 45,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
