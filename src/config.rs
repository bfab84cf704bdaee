//! # Provisioner Configuration
//!
//! Deploy-time configuration, validated at construction.
//!
//! The account id is a required input checked before any resource is
//! declared: a missing or malformed account would otherwise surface only as
//! a cryptic reference-resolution failure during provisioning. Region codes
//! are checked against the fixed CIDR table for the same reason.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;
use crate::network::{self, PRIMARY_REGION, SECONDARY_REGION};

/// Default database created on the primary cluster
fn default_database_name() -> String {
    "auroraglobaldb".to_string()
}

/// Default identifier for the global database identity
fn default_global_cluster_identifier() -> String {
    "aurora-global-cluster".to_string()
}

fn default_primary_region() -> String {
    PRIMARY_REGION.to_string()
}

fn default_secondary_region() -> String {
    SECONDARY_REGION.to_string()
}

/// How the credentials secret is encrypted and replicated
///
/// An explicit mode rather than an optional key input, so the behavioral
/// branch is visible in configuration and testable.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SecretReplicationMode {
    /// Encrypt with the primary key and replicate into the secondary region
    #[default]
    EncryptedReplicated,
    /// No encryption key, no cross-region replica
    UnencryptedLocal,
}

/// Configuration for one provisioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionerConfig {
    /// Account every stack targets, exactly 12 digits
    pub account: String,
    /// Region hosting the writable cluster
    #[serde(default = "default_primary_region")]
    pub primary_region: String,
    /// Region hosting the replica cluster
    #[serde(default = "default_secondary_region")]
    pub secondary_region: String,
    /// Database created on the primary cluster
    #[serde(default = "default_database_name")]
    pub database_name: String,
    /// Single source of truth for the global identity's identifier
    #[serde(default = "default_global_cluster_identifier")]
    pub global_cluster_identifier: String,
    /// Secret encryption and replication behavior
    #[serde(default)]
    pub secret_replication: SecretReplicationMode,
}

impl ProvisionerConfig {
    /// Build a configuration with defaults for everything but the account
    ///
    /// # Errors
    ///
    /// Fails fast with a configuration error when the account id is not
    /// exactly 12 digits.
    pub fn new(account: &str) -> Result<Self, ProvisionError> {
        let config = Self {
            account: account.trim().to_string(),
            primary_region: default_primary_region(),
            secondary_region: default_secondary_region(),
            database_name: default_database_name(),
            global_cluster_identifier: default_global_cluster_identifier(),
            secret_replication: SecretReplicationMode::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every field
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found; validation runs before
    /// any resource is declared.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        validate_account_id(&self.account)?;

        network::vpc_cidr_for_region(&self.primary_region)?;
        network::vpc_cidr_for_region(&self.secondary_region)?;

        if self.primary_region == self.secondary_region {
            return Err(ProvisionError::DuplicateRegions {
                region: self.primary_region.clone(),
            });
        }

        validate_cluster_identifier(&self.global_cluster_identifier, "globalClusterIdentifier")?;
        validate_database_name(&self.database_name)?;

        Ok(())
    }
}

/// Validate an account id as exactly 12 ASCII digits
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidAccountId`] naming the rejected value.
pub fn validate_account_id(account: &str) -> Result<(), ProvisionError> {
    let trimmed = account.trim();

    let account_regex = Regex::new(r"^\d{12}$").map_err(|_| ProvisionError::InvalidAccountId {
        account: trimmed.to_string(),
    })?;

    if !account_regex.is_match(trimmed) {
        return Err(ProvisionError::InvalidAccountId {
            account: trimmed.to_string(),
        });
    }

    Ok(())
}

/// Validate a cluster identifier
///
/// Format: starts with a letter; lowercase alphanumeric and hyphens; no
/// trailing hyphen or consecutive hyphens; 1-63 characters.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidIdentifier`] naming the field and value.
pub fn validate_cluster_identifier(
    identifier: &str,
    field: &'static str,
) -> Result<(), ProvisionError> {
    let trimmed = identifier.trim();

    if trimmed.is_empty() {
        return Err(ProvisionError::InvalidIdentifier {
            field,
            identifier: trimmed.to_string(),
            reason: "cannot be empty".to_string(),
        });
    }

    if trimmed.len() > 63 {
        return Err(ProvisionError::InvalidIdentifier {
            field,
            identifier: trimmed.to_string(),
            reason: format!("exceeds maximum length of 63 characters (got {})", trimmed.len()),
        });
    }

    let identifier_regex = Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").map_err(|_| {
        ProvisionError::InvalidIdentifier {
            field,
            identifier: trimmed.to_string(),
            reason: "identifier pattern failed to compile".to_string(),
        }
    })?;

    if !identifier_regex.is_match(trimmed) {
        return Err(ProvisionError::InvalidIdentifier {
            field,
            identifier: trimmed.to_string(),
            reason: "must start with a letter and contain only lowercase alphanumerics \
                     and single hyphens, with no trailing hyphen"
                .to_string(),
        });
    }

    Ok(())
}

/// Validate the default database name
///
/// Format: starts with a letter; alphanumeric; 1-63 characters.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidIdentifier`] naming the field and value.
pub fn validate_database_name(name: &str) -> Result<(), ProvisionError> {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.len() > 63 {
        return Err(ProvisionError::InvalidIdentifier {
            field: "databaseName",
            identifier: trimmed.to_string(),
            reason: "must be 1-63 characters".to_string(),
        });
    }

    let starts_with_letter = trimmed.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ProvisionError::InvalidIdentifier {
            field: "databaseName",
            identifier: trimmed.to_string(),
            reason: "must start with a letter and contain only alphanumerics".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProvisionerConfig::new("123456789012").unwrap();

        assert_eq!(config.primary_region, "us-east-1");
        assert_eq!(config.secondary_region, "us-west-2");
        assert_eq!(config.database_name, "auroraglobaldb");
        assert_eq!(config.global_cluster_identifier, "aurora-global-cluster");
        assert_eq!(
            config.secret_replication,
            SecretReplicationMode::EncryptedReplicated
        );
    }

    #[test]
    fn test_account_id_valid() {
        let valid = vec!["123456789012", "000000000000", " 123456789012 "];

        for account in valid {
            assert!(
                validate_account_id(account).is_ok(),
                "account '{account}' should be valid"
            );
        }
    }

    #[test]
    fn test_account_id_invalid() {
        let invalid = vec![
            "",              // Empty
            "12345678901",   // Too short
            "1234567890123", // Too long
            "12345678901a",  // Letter
            "123 45678901",  // Inner space
            "-23456789012",  // Sign
        ];

        for account in invalid {
            let err = validate_account_id(account).unwrap_err();
            assert!(
                matches!(err, ProvisionError::InvalidAccountId { .. }),
                "account '{account}' should be invalid"
            );
        }
    }

    #[test]
    fn test_unsupported_region_rejected_at_construction() {
        let mut config = ProvisionerConfig::new("123456789012").unwrap();
        config.secondary_region = "eu-west-1".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("eu-west-1"));
    }

    #[test]
    fn test_duplicate_regions_rejected() {
        let mut config = ProvisionerConfig::new("123456789012").unwrap();
        config.secondary_region = config.primary_region.clone();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ProvisionError::DuplicateRegions { .. }));
    }

    #[test]
    fn test_cluster_identifier_valid() {
        let valid = vec!["aurora-global-cluster", "a", "db1", "my-db-2"];

        for identifier in valid {
            assert!(
                validate_cluster_identifier(identifier, "test").is_ok(),
                "identifier '{identifier}' should be valid"
            );
        }
    }

    #[test]
    fn test_cluster_identifier_invalid() {
        let too_long = "a".repeat(64);
        let invalid = vec![
            "",            // Empty
            "1db",         // Starts with digit
            "-db",         // Starts with hyphen
            "db-",         // Trailing hyphen
            "db--cluster", // Consecutive hyphens
            "DB",          // Uppercase
            "db_cluster",  // Underscore
            too_long.as_str(),
        ];

        for identifier in invalid {
            assert!(
                validate_cluster_identifier(identifier, "test").is_err(),
                "identifier '{identifier}' should be invalid"
            );
        }
    }

    #[test]
    fn test_replication_mode_deserializes_kebab_case() {
        let mode: SecretReplicationMode =
            serde_json::from_str("\"unencrypted-local\"").unwrap();
        assert_eq!(mode, SecretReplicationMode::UnencryptedLocal);
    }
}
