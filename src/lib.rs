//! # Aurora Global Provisioner
//!
//! Synthesizes and validates the deployment plan for a two-region encrypted
//! Aurora global database topology.
//!
//! ## Overview
//!
//! One provisioning run composes four stacks under a single plan:
//!
//! 1. **Region key stacks** (one per region) - standalone encryption keys
//!    under a fixed, deterministic alias; retained on teardown
//! 2. **Primary region stack** - network, replicated credentials secret,
//!    writable serverless cluster, and the global database identity seeded
//!    from it
//! 3. **Secondary region stack** - network plus a replica cluster and
//!    instance joined to the global identity, with write forwarding enabled
//!
//! The interesting problem is cross-region reference resolution: the primary
//! region's secret must replicate into the secondary region's key, but no
//! data-flow edge exists between sibling regions. The key stacks therefore
//! publish a registry of deterministic canonical alias references
//! ([`keys::CanonicalKeyRef`]), and the primary stack resolves the sibling
//! key by lookup instead of by object handle.
//!
//! The crate builds and checks the plan; materializing resources is the
//! execution engine's job and out of scope here.

pub mod config;
pub mod error;
pub mod keys;
pub mod network;
pub mod plan;
pub mod stack;
pub mod synth;

pub use config::{ProvisionerConfig, SecretReplicationMode};
pub use error::ProvisionError;
pub use keys::{CanonicalKeyRef, KeyRegistry, RegionKeyEntry};
pub use plan::{DeploymentPlan, Resource, ResourceSpec, Stack};
pub use synth::synthesize;
