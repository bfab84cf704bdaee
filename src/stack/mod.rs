//! # Stack Builders
//!
//! Builders for the per-region deployable units: key stacks, the primary
//! region stack, and the secondary region stack.
//!
//! Engine and capacity settings live here as shared constants so the replica
//! cannot drift from the primary.

use crate::error::ProvisionError;
use crate::network;
use crate::plan::{
    DeletionPolicy, Resource, ResourceSpec, SecurityGroupSpec, Stack, SubnetGroupSpec, SubnetTier,
    VpcSpec,
};

mod keys;
mod primary;
mod secondary;

pub use keys::RegionKeyStack;
pub use primary::PrimaryStack;
pub use secondary::SecondaryStack;

/// Database engine used by both clusters
pub const AURORA_ENGINE: &str = "aurora-postgresql";

/// Engine version, matched exactly between primary and replica
pub const AURORA_ENGINE_VERSION: &str = "17.5";

/// Serverless capacity lower bound, in capacity units
pub const SERVERLESS_MIN_CAPACITY: f64 = 0.0;

/// Serverless capacity upper bound, in capacity units
pub const SERVERLESS_MAX_CAPACITY: f64 = 1.0;

/// Days automated backups are kept
pub const BACKUP_RETENTION_DAYS: u16 = 7;

/// Daily window automated backups are taken in
pub const PREFERRED_BACKUP_WINDOW: &str = "03:00-04:00";

/// Fixed login name stored in the credentials secret
pub const DATABASE_USERNAME: &str = "postgres";

/// Generated password length
pub const PASSWORD_LENGTH: u8 = 32;

/// Characters excluded from password generation, unsafe in connection strings
pub const PASSWORD_EXCLUDE_CHARACTERS: &str = "\"@/\\";

/// Identifier of the writable primary cluster
pub const PRIMARY_CLUSTER_IDENTIFIER: &str = "aurora-global-primary-cluster";

/// Identifier of the secondary replica cluster
pub const REPLICA_CLUSTER_IDENTIFIER: &str = "aurora-global-replica-cluster";

/// Availability zones each VPC spreads subnets over
pub const NETWORK_MAX_AZS: u8 = 2;

/// NAT gateways per VPC
pub const NETWORK_NAT_GATEWAYS: u8 = 1;

/// Prefix length of each public and private subnet
pub const SUBNET_PREFIX: u8 = 24;

/// Logical id of the security group in both region stacks
pub(crate) const SECURITY_GROUP_LOGICAL_ID: &str = "AuroraSecurityGroup";

/// Logical id of the subnet group in both region stacks
pub(crate) const SUBNET_GROUP_LOGICAL_ID: &str = "SubnetGroup";

/// Declare the regional network trio: VPC, security group, subnet group
///
/// The CIDR comes from the fixed per-region table; clusters are placed into
/// the private tier.
pub(crate) fn add_regional_network(
    stack: &mut Stack,
    vpc_logical_id: &str,
    security_group_description: &str,
    subnet_group_description: &str,
) -> Result<(), ProvisionError> {
    let cidr = network::vpc_cidr_for_region(&stack.region)?;

    stack.add_resource(Resource {
        logical_id: vpc_logical_id.to_string(),
        spec: ResourceSpec::Vpc(VpcSpec {
            cidr,
            max_azs: NETWORK_MAX_AZS,
            nat_gateways: NETWORK_NAT_GATEWAYS,
            public_subnet_prefix: SUBNET_PREFIX,
            private_subnet_prefix: SUBNET_PREFIX,
            enable_dns_hostnames: true,
            enable_dns_support: true,
        }),
        depends_on: Vec::new(),
        deletion_policy: DeletionPolicy::Delete,
    });

    stack.add_resource(Resource {
        logical_id: SECURITY_GROUP_LOGICAL_ID.to_string(),
        spec: ResourceSpec::SecurityGroup(SecurityGroupSpec {
            description: security_group_description.to_string(),
            vpc: vpc_logical_id.to_string(),
            allow_all_outbound: true,
        }),
        depends_on: vec![vpc_logical_id.to_string()],
        deletion_policy: DeletionPolicy::Delete,
    });

    stack.add_resource(Resource {
        logical_id: SUBNET_GROUP_LOGICAL_ID.to_string(),
        spec: ResourceSpec::SubnetGroup(SubnetGroupSpec {
            description: subnet_group_description.to_string(),
            vpc: vpc_logical_id.to_string(),
            subnet_tier: SubnetTier::PrivateWithEgress,
        }),
        depends_on: vec![vpc_logical_id.to_string()],
        deletion_policy: DeletionPolicy::Delete,
    });

    Ok(())
}
