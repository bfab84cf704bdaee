//! # Top-Level Synthesis
//!
//! Composes the four stacks into one validated deployment plan.
//!
//! ## Phases
//!
//! 1. **Region keys** - the two key stacks have no dependency on each other
//!    and may be materialized in either order; each publishes its key into
//!    the registry.
//! 2. **Primary region** - consumes the registry (its own key structurally,
//!    the sibling key by canonical alias) and emits the global identifier.
//! 3. **Secondary region** - consumes the global identifier and its own
//!    region's key entry.
//!
//! The plan is validated before it is returned; an invalid plan is never
//! handed to the execution engine.

use tracing::info;

use crate::config::ProvisionerConfig;
use crate::error::ProvisionError;
use crate::keys::KeyRegistry;
use crate::plan::DeploymentPlan;
use crate::stack::{PrimaryStack, RegionKeyStack, SecondaryStack};

/// Name of the top-level composition
pub const APP_NAME: &str = "aurora-global-database";

/// Synthesize the complete deployment plan
///
/// # Errors
///
/// Fails fast on configuration errors (account id, region codes) before any
/// resource is declared, and on any plan invariant violated during
/// composition.
pub fn synthesize(config: &ProvisionerConfig) -> Result<DeploymentPlan, ProvisionError> {
    config.validate()?;

    info!(
        account = %config.account,
        primary = %config.primary_region,
        secondary = %config.secondary_region,
        "synthesizing deployment plan"
    );

    let mut registry = KeyRegistry::new();
    let mut stacks = Vec::with_capacity(4);

    for region in [&config.primary_region, &config.secondary_region] {
        let keys = RegionKeyStack::synthesize(region, &config.account)?;
        registry.register(keys.entry);
        stacks.push(keys.stack);
    }

    let primary = PrimaryStack::synthesize(config, &registry)?;

    let secondary_key = registry.resolve(&config.secondary_region)?.clone();
    let secondary = SecondaryStack::synthesize(
        config,
        &primary.global_cluster_identifier,
        &secondary_key,
    )?;

    stacks.push(primary.stack);
    stacks.push(secondary.stack);

    let plan = DeploymentPlan {
        app: APP_NAME.to_string(),
        account: config.account.clone(),
        stacks,
    };

    plan.validate()?;

    info!(units = plan.unit_count(), "deployment plan validated");

    Ok(plan)
}
