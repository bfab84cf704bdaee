//! # Provisioning Errors
//!
//! Failure taxonomy for plan construction and validation.
//!
//! Configuration errors (unsupported region, malformed account id) are raised
//! synchronously before any resource is declared. Plan validation errors are
//! raised by [`crate::plan::DeploymentPlan::validate`] and abort the whole
//! run; there is no partial-success mode.

use thiserror::Error;

/// Errors raised while constructing or validating a deployment plan
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Region code outside the fixed supported set
    #[error("unsupported region '{region}': only us-east-1 and us-west-2 are supported")]
    UnsupportedRegion {
        /// The rejected region code
        region: String,
    },

    /// Account id that is not exactly 12 ASCII digits
    #[error("invalid account id '{account}': expected exactly 12 digits")]
    InvalidAccountId {
        /// The rejected account id
        account: String,
    },

    /// Primary and secondary regions resolved to the same code
    #[error("primary and secondary regions must differ, got '{region}' for both")]
    DuplicateRegions {
        /// The region configured on both sides
        region: String,
    },

    /// Identifier that violates cluster naming rules
    #[error("invalid identifier '{identifier}' for {field}: {reason}")]
    InvalidIdentifier {
        /// Field the identifier was supplied for
        field: &'static str,
        /// The rejected identifier
        identifier: String,
        /// Why it was rejected
        reason: String,
    },

    /// Registry lookup for a region that published no key
    #[error("no encryption key registered for region '{region}'")]
    MissingRegionKey {
        /// Region the lookup was performed for
        region: String,
    },

    /// A resource names a dependency not declared earlier in its stack
    #[error(
        "stack '{stack}': resource '{resource}' depends on '{dependency}', \
         which is not declared earlier in the stack"
    )]
    UnresolvedDependency {
        /// Stack containing the resource
        stack: String,
        /// Resource with the dangling dependency
        resource: String,
        /// The dependency that could not be resolved
        dependency: String,
    },

    /// Two resources in one stack share a logical id
    #[error("stack '{stack}': duplicate logical id '{logical_id}'")]
    DuplicateLogicalId {
        /// Stack containing the duplicates
        stack: String,
        /// The repeated logical id
        logical_id: String,
    },

    /// Plan does not declare exactly one global database identity
    #[error("plan must declare exactly one global database identity, found {count}")]
    GlobalIdentityCount {
        /// Number of global database identities found
        count: usize,
    },

    /// Global database identity declared before its source cluster
    #[error(
        "global database identity '{identity}' must be declared after its \
         source cluster '{source_cluster}'"
    )]
    GlobalIdentityOrdering {
        /// Logical id of the global identity
        identity: String,
        /// Logical id of the source cluster it references
        source_cluster: String,
    },

    /// Replica cluster referencing a different global identifier
    #[error(
        "replica cluster '{resource}' references global identifier '{found}', \
         expected '{expected}'"
    )]
    GlobalIdentifierMismatch {
        /// Logical id of the replica cluster
        resource: String,
        /// Identifier declared by the global identity
        expected: String,
        /// Identifier the replica references
        found: String,
    },

    /// Two stacks declare overlapping VPC address blocks
    #[error(
        "vpc cidr {first_cidr} in stack '{first_stack}' overlaps \
         {second_cidr} in stack '{second_stack}'"
    )]
    OverlappingCidrs {
        /// First stack in declaration order
        first_stack: String,
        /// Its CIDR block
        first_cidr: String,
        /// Second stack in declaration order
        second_stack: String,
        /// Its CIDR block
        second_cidr: String,
    },

    /// CIDR table entry failed to parse
    #[error("invalid cidr block '{cidr}'")]
    InvalidCidr {
        /// The unparsable block
        cidr: String,
        /// Parser failure
        #[source]
        source: ipnetwork::IpNetworkError,
    },

    /// Plan could not be rendered as JSON
    #[error("failed to render plan as JSON")]
    RenderJson(#[from] serde_json::Error),

    /// Plan could not be rendered as YAML
    #[error("failed to render plan as YAML")]
    RenderYaml(#[from] serde_yaml::Error),
}
