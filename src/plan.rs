//! # Deployment Plan Model
//!
//! Typed model of the synthesized deployment plan: stacks, the resources
//! they declare, and the outputs they export.
//!
//! The plan is a build-time artifact. Resources are declared in dependency
//! order and carry explicit `depends_on` edges; the external execution
//! engine is responsible for materializing them. [`DeploymentPlan::validate`]
//! enforces the invariants that make the two-region topology safe to hand
//! over: declaration-order dependencies, a single global database identity
//! seeded from an existing cluster, identifier agreement between primary and
//! replica, and disjoint address space across regions.

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;

/// Token referencing an attribute of a resource in a stack
///
/// Deterministic for identical inputs; resolved by the execution engine at
/// provisioning time.
#[must_use]
pub fn attr_ref(stack: &str, logical_id: &str, attribute: &str) -> String {
    format!("${{{stack}/{logical_id}.{attribute}}}")
}

/// What happens to a resource when its stack is deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeletionPolicy {
    /// Destroyed with the stack
    #[default]
    Delete,
    /// Left in place when the stack is deleted
    Retain,
}

/// Subnet placement tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubnetTier {
    /// Internet-routable subnets
    Public,
    /// Private subnets with NAT egress
    PrivateWithEgress,
}

/// Encryption key declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionKeySpec {
    /// Human-readable purpose
    pub description: String,
    /// Automatic annual rotation
    pub enable_key_rotation: bool,
}

/// Stable alias attached to an encryption key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyAliasSpec {
    /// Full alias name, including the `alias/` prefix
    pub alias_name: String,
    /// Logical id of the key the alias targets
    pub target_key: String,
}

/// Per-region virtual network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcSpec {
    /// Address block, fixed per region
    pub cidr: Ipv4Network,
    /// Availability zones to spread subnets over
    pub max_azs: u8,
    /// NAT gateways for private-subnet egress
    pub nat_gateways: u8,
    /// Prefix length for each public subnet
    pub public_subnet_prefix: u8,
    /// Prefix length for each private subnet
    pub private_subnet_prefix: u8,
    /// Resolve instance hostnames inside the VPC
    pub enable_dns_hostnames: bool,
    /// Enable the VPC DNS resolver
    pub enable_dns_support: bool,
}

/// Security boundary for the database cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupSpec {
    /// Human-readable purpose
    pub description: String,
    /// Logical id of the owning VPC
    pub vpc: String,
    /// Permit all outbound traffic
    pub allow_all_outbound: bool,
}

/// Subnet group the cluster is placed into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetGroupSpec {
    /// Human-readable purpose
    pub description: String,
    /// Logical id of the owning VPC
    pub vpc: String,
    /// Which subnet tier the group selects
    pub subnet_tier: SubnetTier,
}

/// Password generation policy for the credentials secret
///
/// The secret's value is generated by the platform at provisioning time;
/// the plan only declares the policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordGeneration {
    /// Fixed login name stored alongside the generated password
    pub username: String,
    /// Generated password length
    pub password_length: u8,
    /// Characters excluded from generation, unsafe for the consuming protocol
    pub exclude_characters: String,
    /// Whether whitespace may appear in the password
    pub include_space: bool,
}

/// Cross-region replica of the credentials secret
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretReplica {
    /// Region the read-only copy is replicated into
    pub region: String,
    /// Canonical alias reference to that region's key
    pub encryption_key: String,
}

/// Generated database credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsSecretSpec {
    /// Human-readable purpose
    pub description: String,
    /// Password generation policy
    pub generate: PasswordGeneration,
    /// Key encrypting the secret in its home region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,
    /// Cross-region replica configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica: Option<SecretReplica>,
}

/// Serverless capacity bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerlessScaling {
    /// Lower capacity bound, in capacity units
    pub min_capacity: f64,
    /// Upper capacity bound, in capacity units
    pub max_capacity: f64,
}

/// Automated backup policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPolicy {
    /// Days backups are kept
    pub retention_days: u16,
    /// Daily window backups are taken in
    pub preferred_window: String,
}

/// The writable primary database cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseClusterSpec {
    /// Cluster identifier
    pub cluster_identifier: String,
    /// Database engine
    pub engine: String,
    /// Engine version, matched exactly by the replica
    pub engine_version: String,
    /// Database created on first boot
    pub default_database_name: String,
    /// Logical id of the credentials secret
    pub credentials_secret: String,
    /// Logical id of the owning VPC
    pub vpc: String,
    /// Logical id of the subnet group
    pub subnet_group: String,
    /// Logical ids of attached security groups
    pub security_groups: Vec<String>,
    /// Serverless capacity bounds
    pub serverless: ServerlessScaling,
    /// Automated backups
    pub backup: BackupPolicy,
    /// Encrypt storage at rest
    pub storage_encrypted: bool,
    /// Refuse deletion while set
    pub deletion_protection: bool,
    /// HTTP query endpoint
    pub enable_data_api: bool,
}

/// The cross-region logical grouping uniting primary and replica clusters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDatabaseSpec {
    /// Identifier the replica must reference verbatim
    pub global_cluster_identifier: String,
    /// Logical id of the cluster the identity is seeded from
    pub source_cluster: String,
    /// Refuse deletion while set
    pub deletion_protection: bool,
}

/// The secondary region's cluster, joined to the global identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaClusterSpec {
    /// Cluster identifier
    pub cluster_identifier: String,
    /// Database engine, matching the primary exactly
    pub engine: String,
    /// Engine version, matching the primary exactly
    pub engine_version: String,
    /// Identifier of the global identity this cluster joins
    pub global_cluster_identifier: String,
    /// Logical id of the subnet group
    pub subnet_group: String,
    /// Logical ids of attached security groups
    pub security_groups: Vec<String>,
    /// Serverless capacity bounds
    pub serverless: ServerlessScaling,
    /// Days backups are kept
    pub backup_retention_days: u16,
    /// Log streams exported to the platform log service
    pub cloudwatch_logs_exports: Vec<String>,
    /// Forward writes to the primary cluster transparently
    pub enable_global_write_forwarding: bool,
    /// Encrypt storage at rest
    pub storage_encrypted: bool,
    /// Key reference encrypting cluster storage
    pub kms_key: String,
}

/// Compute instance attached to a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInstanceSpec {
    /// Database engine
    pub engine: String,
    /// Instance class
    pub instance_class: String,
    /// Logical id of the cluster the instance serves
    pub cluster: String,
    /// Expose the instance to the internet
    pub publicly_accessible: bool,
}

/// Typed resource declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResourceSpec {
    /// Region-scoped encryption key
    EncryptionKey(EncryptionKeySpec),
    /// Stable key alias
    KeyAlias(KeyAliasSpec),
    /// Per-region virtual network
    Vpc(VpcSpec),
    /// Security boundary
    SecurityGroup(SecurityGroupSpec),
    /// Subnet group
    SubnetGroup(SubnetGroupSpec),
    /// Generated credentials secret
    CredentialsSecret(CredentialsSecretSpec),
    /// Writable primary cluster
    DatabaseCluster(DatabaseClusterSpec),
    /// Global database identity
    GlobalDatabase(GlobalDatabaseSpec),
    /// Secondary replica cluster
    ReplicaCluster(ReplicaClusterSpec),
    /// Serverless compute instance
    DatabaseInstance(DatabaseInstanceSpec),
}

/// A resource declared by a stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Stack-unique logical id
    pub logical_id: String,
    /// Typed declaration
    pub spec: ResourceSpec,
    /// Logical ids that must exist before this resource
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Behavior on stack deletion
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// Named value a stack exports for operators and sibling stacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackOutput {
    /// Output name, stable across synths
    pub name: String,
    /// Literal value or attribute token
    pub value: String,
    /// Human-readable purpose
    pub description: String,
    /// Name the value is exported under for cross-stack consumption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
}

/// One deployable unit targeting a single region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    /// Plan-unique stack name
    pub name: String,
    /// Target region
    pub region: String,
    /// Target account
    pub account: String,
    /// Human-readable purpose
    pub description: String,
    /// Resources in declaration order
    pub resources: Vec<Resource>,
    /// Exported outputs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<StackOutput>,
}

impl Stack {
    /// Create an empty stack
    #[must_use]
    pub fn new(name: &str, region: &str, account: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
            account: account.to_string(),
            description: description.to_string(),
            resources: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Declare a resource
    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// Export an output
    pub fn add_output(&mut self, output: StackOutput) {
        self.outputs.push(output);
    }

    /// Find a resource by logical id
    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.logical_id == logical_id)
    }

    /// Attribute token for a resource in this stack
    #[must_use]
    pub fn attr(&self, logical_id: &str, attribute: &str) -> String {
        attr_ref(&self.name, logical_id, attribute)
    }

    /// Check declaration-order invariants within this stack
    ///
    /// Every `depends_on` target must be declared earlier, and logical ids
    /// must be unique.
    fn validate(&self) -> Result<(), ProvisionError> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.resources.len());

        for resource in &self.resources {
            if seen.contains(&resource.logical_id.as_str()) {
                return Err(ProvisionError::DuplicateLogicalId {
                    stack: self.name.clone(),
                    logical_id: resource.logical_id.clone(),
                });
            }

            for dependency in &resource.depends_on {
                if !seen.contains(&dependency.as_str()) {
                    return Err(ProvisionError::UnresolvedDependency {
                        stack: self.name.clone(),
                        resource: resource.logical_id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }

            seen.push(&resource.logical_id);
        }

        Ok(())
    }
}

/// The complete synthesized deployment plan
///
/// The plan itself is the top-level composition unit; together with its
/// stacks it forms the deployable units of one provisioning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPlan {
    /// Application the plan provisions
    pub app: String,
    /// Account every stack targets
    pub account: String,
    /// Stacks in deployment order
    pub stacks: Vec<Stack>,
}

impl DeploymentPlan {
    /// Find a stack by name
    #[must_use]
    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name == name)
    }

    /// Deployable units: every stack plus the top-level composition
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.stacks.len() + 1
    }

    /// The global cluster identifier declared by the plan's global identity
    #[must_use]
    pub fn global_cluster_identifier(&self) -> Option<&str> {
        self.stacks
            .iter()
            .flat_map(|s| &s.resources)
            .find_map(|r| match &r.spec {
                ResourceSpec::GlobalDatabase(spec) => {
                    Some(spec.global_cluster_identifier.as_str())
                }
                _ => None,
            })
    }

    /// Validate the whole plan
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant; a plan that fails any check
    /// must not be handed to the execution engine.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        self.validate_ordering()?;
        self.validate_global_identity()?;
        self.validate_network()?;
        Ok(())
    }

    /// Per-stack declaration-order and uniqueness checks
    ///
    /// # Errors
    ///
    /// See [`DeploymentPlan::validate`].
    pub fn validate_ordering(&self) -> Result<(), ProvisionError> {
        for stack in &self.stacks {
            stack.validate()?;
        }
        Ok(())
    }

    /// Global identity invariants
    ///
    /// Exactly one global database identity exists, it is declared strictly
    /// after the cluster it is seeded from, and every replica cluster
    /// references its identifier verbatim.
    ///
    /// # Errors
    ///
    /// See [`DeploymentPlan::validate`].
    pub fn validate_global_identity(&self) -> Result<(), ProvisionError> {
        let mut identities = Vec::new();

        for stack in &self.stacks {
            for (index, resource) in stack.resources.iter().enumerate() {
                if let ResourceSpec::GlobalDatabase(spec) = &resource.spec {
                    identities.push((stack, index, resource, spec));
                }
            }
        }

        if identities.len() != 1 {
            return Err(ProvisionError::GlobalIdentityCount {
                count: identities.len(),
            });
        }

        let (stack, index, resource, spec) = identities.remove(0);

        let source_position = stack
            .resources
            .iter()
            .position(|r| {
                r.logical_id == spec.source_cluster
                    && matches!(r.spec, ResourceSpec::DatabaseCluster(_))
            });

        match source_position {
            Some(position) if position < index => {}
            _ => {
                return Err(ProvisionError::GlobalIdentityOrdering {
                    identity: resource.logical_id.clone(),
                    source_cluster: spec.source_cluster.clone(),
                });
            }
        }

        for stack in &self.stacks {
            for resource in &stack.resources {
                if let ResourceSpec::ReplicaCluster(replica) = &resource.spec {
                    if replica.global_cluster_identifier != spec.global_cluster_identifier {
                        return Err(ProvisionError::GlobalIdentifierMismatch {
                            resource: resource.logical_id.clone(),
                            expected: spec.global_cluster_identifier.clone(),
                            found: replica.global_cluster_identifier.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Cross-region address-space invariant
    ///
    /// VPC CIDR blocks must be pairwise disjoint across all stacks.
    ///
    /// # Errors
    ///
    /// See [`DeploymentPlan::validate`].
    pub fn validate_network(&self) -> Result<(), ProvisionError> {
        let mut allocations: Vec<(&str, Ipv4Network)> = Vec::new();

        for stack in &self.stacks {
            for resource in &stack.resources {
                if let ResourceSpec::Vpc(vpc) = &resource.spec {
                    allocations.push((&stack.name, vpc.cidr));
                }
            }
        }

        for (i, (first_stack, first_cidr)) in allocations.iter().enumerate() {
            for (second_stack, second_cidr) in &allocations[i + 1..] {
                if first_cidr.overlaps(*second_cidr) {
                    return Err(ProvisionError::OverlappingCidrs {
                        first_stack: (*first_stack).to_string(),
                        first_cidr: first_cidr.to_string(),
                        second_stack: (*second_stack).to_string(),
                        second_cidr: second_cidr.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Render the plan as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::RenderJson`] on serialization failure.
    pub fn to_json(&self) -> Result<String, ProvisionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the plan as YAML
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::RenderYaml`] on serialization failure.
    pub fn to_yaml(&self) -> Result<String, ProvisionError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_stack(name: &str) -> Stack {
        Stack::new(name, "us-east-1", "123456789012", "test stack")
    }

    fn key_resource(logical_id: &str) -> Resource {
        Resource {
            logical_id: logical_id.to_string(),
            spec: ResourceSpec::EncryptionKey(EncryptionKeySpec {
                description: "test key".to_string(),
                enable_key_rotation: true,
            }),
            depends_on: Vec::new(),
            deletion_policy: DeletionPolicy::Retain,
        }
    }

    #[test]
    fn test_attr_ref_format() {
        assert_eq!(
            attr_ref("aurora-global-primary", "AuroraCluster", "Arn"),
            "${aurora-global-primary/AuroraCluster.Arn}"
        );
    }

    #[test]
    fn test_dependency_must_be_declared_earlier() {
        let mut stack = empty_stack("test");
        stack.add_resource(Resource {
            logical_id: "Alias".to_string(),
            spec: ResourceSpec::KeyAlias(KeyAliasSpec {
                alias_name: "alias/test".to_string(),
                target_key: "Key".to_string(),
            }),
            depends_on: vec!["Key".to_string()],
            deletion_policy: DeletionPolicy::Delete,
        });
        stack.add_resource(key_resource("Key"));

        let plan = DeploymentPlan {
            app: "test".to_string(),
            account: "123456789012".to_string(),
            stacks: vec![stack],
        };

        let err = plan.validate_ordering().unwrap_err();
        assert!(matches!(err, ProvisionError::UnresolvedDependency { .. }));
    }

    #[test]
    fn test_duplicate_logical_ids_rejected() {
        let mut stack = empty_stack("test");
        stack.add_resource(key_resource("Key"));
        stack.add_resource(key_resource("Key"));

        let plan = DeploymentPlan {
            app: "test".to_string(),
            account: "123456789012".to_string(),
            stacks: vec![stack],
        };

        let err = plan.validate_ordering().unwrap_err();
        assert!(matches!(err, ProvisionError::DuplicateLogicalId { .. }));
    }

    #[test]
    fn test_plan_without_global_identity_rejected() {
        let mut stack = empty_stack("test");
        stack.add_resource(key_resource("Key"));

        let plan = DeploymentPlan {
            app: "test".to_string(),
            account: "123456789012".to_string(),
            stacks: vec![stack],
        };

        let err = plan.validate_global_identity().unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::GlobalIdentityCount { count: 0 }
        ));
    }
}
