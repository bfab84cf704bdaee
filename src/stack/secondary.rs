//! # Secondary Region Stack
//!
//! The read/promotable side: network, a replica cluster joined to the global
//! identity, and one serverless instance.
//!
//! Both inputs arrive as explicit parameters in declaration order: the global
//! identifier from the primary's synthesis output, and the region key entry
//! from the registry. No alias trick is needed here.

use tracing::debug;

use crate::config::ProvisionerConfig;
use crate::error::ProvisionError;
use crate::keys::RegionKeyEntry;
use crate::plan::{
    DatabaseInstanceSpec, DeletionPolicy, ReplicaClusterSpec, Resource, ResourceSpec,
    ServerlessScaling, Stack, StackOutput,
};
use crate::stack::{
    add_regional_network, AURORA_ENGINE, AURORA_ENGINE_VERSION, BACKUP_RETENTION_DAYS,
    REPLICA_CLUSTER_IDENTIFIER, SECURITY_GROUP_LOGICAL_ID, SERVERLESS_MAX_CAPACITY,
    SERVERLESS_MIN_CAPACITY, SUBNET_GROUP_LOGICAL_ID,
};

const VPC_LOGICAL_ID: &str = "SecondaryVpc";
const CLUSTER_LOGICAL_ID: &str = "ReplicaCluster";
const INSTANCE_LOGICAL_ID: &str = "ReplicaInstance";

/// The synthesized secondary stack
#[derive(Debug, Clone)]
pub struct SecondaryStack {
    /// The deployable unit
    pub stack: Stack,
}

impl SecondaryStack {
    /// Synthesize the secondary region stack
    ///
    /// `global_cluster_identifier` must be the identifier the primary's
    /// global identity was declared with; it is threaded here rather than
    /// duplicated so the two sides cannot diverge.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnsupportedRegion`] for a region outside
    /// the fixed supported set.
    pub fn synthesize(
        config: &ProvisionerConfig,
        global_cluster_identifier: &str,
        key: &RegionKeyEntry,
    ) -> Result<Self, ProvisionError> {
        let name = "aurora-global-secondary".to_string();
        let mut stack = Stack::new(
            &name,
            &config.secondary_region,
            &config.account,
            &format!(
                "Secondary region stack for the Aurora global database ({})",
                config.secondary_region
            ),
        );

        add_regional_network(
            &mut stack,
            VPC_LOGICAL_ID,
            "Security group for the Aurora replica cluster",
            "Subnet group for the Aurora replica cluster",
        )?;

        stack.add_resource(Resource {
            logical_id: CLUSTER_LOGICAL_ID.to_string(),
            spec: ResourceSpec::ReplicaCluster(ReplicaClusterSpec {
                cluster_identifier: REPLICA_CLUSTER_IDENTIFIER.to_string(),
                engine: AURORA_ENGINE.to_string(),
                engine_version: AURORA_ENGINE_VERSION.to_string(),
                global_cluster_identifier: global_cluster_identifier.to_string(),
                subnet_group: SUBNET_GROUP_LOGICAL_ID.to_string(),
                security_groups: vec![SECURITY_GROUP_LOGICAL_ID.to_string()],
                serverless: ServerlessScaling {
                    min_capacity: SERVERLESS_MIN_CAPACITY,
                    max_capacity: SERVERLESS_MAX_CAPACITY,
                },
                backup_retention_days: BACKUP_RETENTION_DAYS,
                cloudwatch_logs_exports: vec!["postgresql".to_string()],
                enable_global_write_forwarding: true,
                storage_encrypted: true,
                kms_key: key.key_arn.clone(),
            }),
            depends_on: vec![
                SUBNET_GROUP_LOGICAL_ID.to_string(),
                SECURITY_GROUP_LOGICAL_ID.to_string(),
            ],
            deletion_policy: DeletionPolicy::Delete,
        });

        stack.add_resource(Resource {
            logical_id: INSTANCE_LOGICAL_ID.to_string(),
            spec: ResourceSpec::DatabaseInstance(DatabaseInstanceSpec {
                engine: AURORA_ENGINE.to_string(),
                instance_class: "db.serverless".to_string(),
                cluster: CLUSTER_LOGICAL_ID.to_string(),
                publicly_accessible: false,
            }),
            depends_on: vec![CLUSTER_LOGICAL_ID.to_string()],
            deletion_policy: DeletionPolicy::Delete,
        });

        stack.add_output(StackOutput {
            name: "VpcId".to_string(),
            value: stack.attr(VPC_LOGICAL_ID, "VpcId"),
            description: "Secondary VPC id".to_string(),
            export_name: None,
        });
        stack.add_output(StackOutput {
            name: "ClusterIdentifier".to_string(),
            value: stack.attr(CLUSTER_LOGICAL_ID, "ClusterIdentifier"),
            description: "Aurora replica cluster identifier".to_string(),
            export_name: None,
        });

        debug!(stack = %name, "synthesized secondary region stack");

        Ok(Self { stack })
    }
}
