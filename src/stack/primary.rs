//! # Primary Region Stack
//!
//! The writable side of the topology: network, credentials secret, primary
//! cluster, and the global database identity seeded from it.
//!
//! The secret's replica block references the *secondary* region's key. That
//! key belongs to a sibling stack with no data-flow edge into this one, so
//! the reference is resolved through the registry as a canonical alias ARN
//! rather than a structural token. The primary's own key, by contrast, has a
//! real edge and uses the structural token.

use tracing::{debug, info, warn};

use crate::config::{ProvisionerConfig, SecretReplicationMode};
use crate::error::ProvisionError;
use crate::keys::KeyRegistry;
use crate::plan::{
    BackupPolicy, CredentialsSecretSpec, DatabaseClusterSpec, DeletionPolicy, GlobalDatabaseSpec,
    PasswordGeneration, Resource, ResourceSpec, SecretReplica, ServerlessScaling, Stack,
    StackOutput,
};
use crate::stack::{
    add_regional_network, AURORA_ENGINE, AURORA_ENGINE_VERSION, BACKUP_RETENTION_DAYS,
    DATABASE_USERNAME, PASSWORD_EXCLUDE_CHARACTERS, PASSWORD_LENGTH, PREFERRED_BACKUP_WINDOW,
    PRIMARY_CLUSTER_IDENTIFIER, SECURITY_GROUP_LOGICAL_ID, SERVERLESS_MAX_CAPACITY,
    SERVERLESS_MIN_CAPACITY, SUBNET_GROUP_LOGICAL_ID,
};

const VPC_LOGICAL_ID: &str = "PrimaryVpc";
const SECRET_LOGICAL_ID: &str = "DatabaseSecret";
const CLUSTER_LOGICAL_ID: &str = "AuroraCluster";
const GLOBAL_LOGICAL_ID: &str = "GlobalCluster";

/// The synthesized primary stack and the values it feeds downstream
#[derive(Debug, Clone)]
pub struct PrimaryStack {
    /// The deployable unit
    pub stack: Stack,
    /// Identifier of the global database identity, consumed by the
    /// secondary stack
    pub global_cluster_identifier: String,
}

impl PrimaryStack {
    /// Synthesize the primary region stack
    ///
    /// Strict sequence: network, secondary-key resolution, secret, cluster,
    /// global identity. Each step's output feeds the next.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported region or, in encrypted-replicated mode, when
    /// either region's key is missing from the registry.
    pub fn synthesize(
        config: &ProvisionerConfig,
        keys: &KeyRegistry,
    ) -> Result<Self, ProvisionError> {
        let name = "aurora-global-primary".to_string();
        let mut stack = Stack::new(
            &name,
            &config.primary_region,
            &config.account,
            &format!(
                "Primary region stack for the Aurora global database ({})",
                config.primary_region
            ),
        );

        add_regional_network(
            &mut stack,
            VPC_LOGICAL_ID,
            "Security group for the Aurora global database",
            "Subnet group for the primary Aurora cluster",
        )?;

        let (encryption_key, replica) = match config.secret_replication {
            SecretReplicationMode::EncryptedReplicated => {
                let primary_key = keys.resolve(&config.primary_region)?;
                let secondary_key = keys.resolve(&config.secondary_region)?;
                info!(
                    region = %config.secondary_region,
                    reference = %secondary_key.canonical,
                    "resolved sibling region key by canonical alias"
                );
                (
                    Some(primary_key.key_arn.clone()),
                    Some(SecretReplica {
                        region: config.secondary_region.clone(),
                        encryption_key: secondary_key.canonical.alias_arn(),
                    }),
                )
            }
            SecretReplicationMode::UnencryptedLocal => {
                warn!("cross-region secret replication disabled: unencrypted-local mode");
                (None, None)
            }
        };

        stack.add_resource(Resource {
            logical_id: SECRET_LOGICAL_ID.to_string(),
            spec: ResourceSpec::CredentialsSecret(CredentialsSecretSpec {
                description: "Aurora global database credentials".to_string(),
                generate: PasswordGeneration {
                    username: DATABASE_USERNAME.to_string(),
                    password_length: PASSWORD_LENGTH,
                    exclude_characters: PASSWORD_EXCLUDE_CHARACTERS.to_string(),
                    include_space: false,
                },
                encryption_key,
                replica,
            }),
            depends_on: Vec::new(),
            deletion_policy: DeletionPolicy::Delete,
        });

        stack.add_resource(Resource {
            logical_id: CLUSTER_LOGICAL_ID.to_string(),
            spec: ResourceSpec::DatabaseCluster(DatabaseClusterSpec {
                cluster_identifier: PRIMARY_CLUSTER_IDENTIFIER.to_string(),
                engine: AURORA_ENGINE.to_string(),
                engine_version: AURORA_ENGINE_VERSION.to_string(),
                default_database_name: config.database_name.clone(),
                credentials_secret: SECRET_LOGICAL_ID.to_string(),
                vpc: VPC_LOGICAL_ID.to_string(),
                subnet_group: SUBNET_GROUP_LOGICAL_ID.to_string(),
                security_groups: vec![SECURITY_GROUP_LOGICAL_ID.to_string()],
                serverless: ServerlessScaling {
                    min_capacity: SERVERLESS_MIN_CAPACITY,
                    max_capacity: SERVERLESS_MAX_CAPACITY,
                },
                backup: BackupPolicy {
                    retention_days: BACKUP_RETENTION_DAYS,
                    preferred_window: PREFERRED_BACKUP_WINDOW.to_string(),
                },
                storage_encrypted: true,
                // Teardown stays possible; the retain policy still guards
                // against destroy-on-stack-delete
                deletion_protection: false,
                enable_data_api: false,
            }),
            depends_on: vec![
                SECRET_LOGICAL_ID.to_string(),
                SUBNET_GROUP_LOGICAL_ID.to_string(),
                SECURITY_GROUP_LOGICAL_ID.to_string(),
            ],
            deletion_policy: DeletionPolicy::Retain,
        });

        // The identity is seeded from the cluster, so the cluster must be
        // addressable by the time this declaration is materialized
        stack.add_resource(Resource {
            logical_id: GLOBAL_LOGICAL_ID.to_string(),
            spec: ResourceSpec::GlobalDatabase(GlobalDatabaseSpec {
                global_cluster_identifier: config.global_cluster_identifier.clone(),
                source_cluster: CLUSTER_LOGICAL_ID.to_string(),
                deletion_protection: false,
            }),
            depends_on: vec![CLUSTER_LOGICAL_ID.to_string()],
            deletion_policy: DeletionPolicy::Delete,
        });

        stack.add_output(StackOutput {
            name: "VpcId".to_string(),
            value: stack.attr(VPC_LOGICAL_ID, "VpcId"),
            description: "Primary VPC id".to_string(),
            export_name: None,
        });
        stack.add_output(StackOutput {
            name: "ClusterEndpoint".to_string(),
            value: stack.attr(CLUSTER_LOGICAL_ID, "Endpoint"),
            description: "Aurora cluster endpoint".to_string(),
            export_name: None,
        });
        stack.add_output(StackOutput {
            name: "ClusterArn".to_string(),
            value: stack.attr(CLUSTER_LOGICAL_ID, "Arn"),
            description: "Aurora cluster ARN".to_string(),
            export_name: Some("PrimaryClusterArn".to_string()),
        });
        stack.add_output(StackOutput {
            name: "SecretArn".to_string(),
            value: stack.attr(SECRET_LOGICAL_ID, "Arn"),
            description: "Database secret ARN".to_string(),
            export_name: Some("PrimarySecretArn".to_string()),
        });
        stack.add_output(StackOutput {
            name: "GlobalClusterArn".to_string(),
            value: stack.attr(GLOBAL_LOGICAL_ID, "Arn"),
            description: "Aurora global database ARN".to_string(),
            export_name: Some("GlobalClusterArn".to_string()),
        });

        debug!(stack = %name, "synthesized primary region stack");

        Ok(Self {
            stack,
            global_cluster_identifier: config.global_cluster_identifier.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::RegionKeyStack;

    fn registry_for(config: &ProvisionerConfig) -> KeyRegistry {
        let mut registry = KeyRegistry::new();
        for region in [&config.primary_region, &config.secondary_region] {
            let keys = RegionKeyStack::synthesize(region, &config.account).unwrap();
            registry.register(keys.entry);
        }
        registry
    }

    fn secret_spec(stack: &Stack) -> CredentialsSecretSpec {
        match &stack.resource(SECRET_LOGICAL_ID).unwrap().spec {
            ResourceSpec::CredentialsSecret(spec) => spec.clone(),
            other => panic!("expected credentials secret, got {other:?}"),
        }
    }

    #[test]
    fn test_encrypted_replicated_secret_targets_sibling_key() {
        let config = ProvisionerConfig::new("123456789012").unwrap();
        let primary = PrimaryStack::synthesize(&config, &registry_for(&config)).unwrap();

        let secret = secret_spec(&primary.stack);
        let replica = secret.replica.unwrap();
        assert_eq!(replica.region, "us-west-2");
        assert_eq!(
            replica.encryption_key,
            "arn:aws:kms:us-west-2:123456789012:alias/aurora-global-secrets"
        );
        assert_eq!(
            secret.encryption_key.unwrap(),
            "${aurora-global-keys-us-east-1/SecretsEncryptionKey.Arn}"
        );
    }

    #[test]
    fn test_unencrypted_local_secret_has_no_replica() {
        let mut config = ProvisionerConfig::new("123456789012").unwrap();
        config.secret_replication = SecretReplicationMode::UnencryptedLocal;

        let primary = PrimaryStack::synthesize(&config, &KeyRegistry::new()).unwrap();

        let secret = secret_spec(&primary.stack);
        assert!(secret.encryption_key.is_none());
        assert!(secret.replica.is_none());
    }

    #[test]
    fn test_password_policy() {
        let config = ProvisionerConfig::new("123456789012").unwrap();
        let primary = PrimaryStack::synthesize(&config, &registry_for(&config)).unwrap();

        let secret = secret_spec(&primary.stack);
        assert_eq!(secret.generate.username, "postgres");
        assert_eq!(secret.generate.password_length, 32);
        assert_eq!(secret.generate.exclude_characters, "\"@/\\");
        assert!(!secret.generate.include_space);
    }

    #[test]
    fn test_global_identity_follows_cluster() {
        let config = ProvisionerConfig::new("123456789012").unwrap();
        let primary = PrimaryStack::synthesize(&config, &registry_for(&config)).unwrap();

        let cluster_position = primary
            .stack
            .resources
            .iter()
            .position(|r| r.logical_id == CLUSTER_LOGICAL_ID)
            .unwrap();
        let global_position = primary
            .stack
            .resources
            .iter()
            .position(|r| r.logical_id == GLOBAL_LOGICAL_ID)
            .unwrap();

        assert!(cluster_position < global_position);
        let global = primary.stack.resource(GLOBAL_LOGICAL_ID).unwrap();
        assert_eq!(global.depends_on, vec![CLUSTER_LOGICAL_ID.to_string()]);
    }

    #[test]
    fn test_missing_registry_entry_fails_in_encrypted_mode() {
        let config = ProvisionerConfig::new("123456789012").unwrap();

        let err = PrimaryStack::synthesize(&config, &KeyRegistry::new()).unwrap_err();
        assert!(matches!(err, ProvisionError::MissingRegionKey { .. }));
    }

    #[test]
    fn test_cluster_is_retained_but_deletable() {
        let config = ProvisionerConfig::new("123456789012").unwrap();
        let primary = PrimaryStack::synthesize(&config, &registry_for(&config)).unwrap();

        let cluster = primary.stack.resource(CLUSTER_LOGICAL_ID).unwrap();
        assert_eq!(cluster.deletion_policy, DeletionPolicy::Retain);
        match &cluster.spec {
            ResourceSpec::DatabaseCluster(spec) => {
                assert!(!spec.deletion_protection);
                assert!(spec.storage_encrypted);
                assert_eq!(spec.serverless.min_capacity, 0.0);
                assert_eq!(spec.serverless.max_capacity, 1.0);
                assert_eq!(spec.backup.retention_days, 7);
            }
            other => panic!("expected database cluster, got {other:?}"),
        }
    }
}
