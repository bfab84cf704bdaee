//! # Encryption Key References
//!
//! Canonical alias references and the per-region key registry.
//!
//! Each region key stack publishes exactly one key under the fixed alias
//! [`SECRETS_KEY_ALIAS`]. Because the alias is deterministic, a stack in one
//! region can reference a *sibling* region's key without a structural graph
//! edge: it composes the alias ARN from region, account, and the fixed alias,
//! and lets the platform resolve it at provisioning time. Consumers go
//! through [`KeyRegistry::resolve`] so the dependency is a lookup, never an
//! assumption about declaration order.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;

/// Fixed alias every region key is published under
pub const SECRETS_KEY_ALIAS: &str = "aurora-global-secrets";

/// A deterministic, human-composed reference to a region's encryption key
///
/// Resolvable by the platform to a live key without an object handle. The
/// composed string is identical across repeated invocations for identical
/// inputs, which is what makes cross-region resolution safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalKeyRef {
    /// Region the key lives in
    pub region: String,
    /// Account that owns the key
    pub account: String,
    /// Alias name, without the `alias/` prefix
    pub alias: String,
}

impl CanonicalKeyRef {
    /// Compose the reference for a region's secrets key
    #[must_use]
    pub fn for_region(region: &str, account: &str) -> Self {
        Self {
            region: region.to_string(),
            account: account.to_string(),
            alias: SECRETS_KEY_ALIAS.to_string(),
        }
    }

    /// The canonical alias ARN
    ///
    /// The platform accepts alias ARNs wherever key ARNs are expected, so
    /// this string stands in for the key itself.
    #[must_use]
    pub fn alias_arn(&self) -> String {
        format!(
            "arn:aws:kms:{}:{}:alias/{}",
            self.region, self.account, self.alias
        )
    }
}

impl fmt::Display for CanonicalKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.alias_arn())
    }
}

/// A region key published by a phase-1 key stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionKeyEntry {
    /// Region the key was created in
    pub region: String,
    /// Stack that owns the key resource
    pub stack: String,
    /// Structural attribute token for the key's ARN
    ///
    /// Valid only for consumers with a real data-flow edge to the owning
    /// stack; cross-region consumers use [`RegionKeyEntry::canonical`].
    pub key_arn: String,
    /// Deterministic alias reference for cross-region consumers
    pub canonical: CanonicalKeyRef,
}

/// Registry of region keys, published in phase 1 and consumed by lookup
///
/// Replaces the implicit "key stacks are declared first" ordering assumption
/// with an explicit region-to-key mapping.
#[derive(Debug, Default, Clone)]
pub struct KeyRegistry {
    entries: HashMap<String, RegionKeyEntry>,
}

impl KeyRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a region's key entry
    ///
    /// A second entry for the same region replaces the first; one key per
    /// region is an invariant of the key stacks, not of the registry.
    pub fn register(&mut self, entry: RegionKeyEntry) {
        tracing::debug!(region = %entry.region, stack = %entry.stack, "registered region key");
        self.entries.insert(entry.region.clone(), entry);
    }

    /// Look up the key entry for a region
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::MissingRegionKey`] when no key stack has
    /// published an entry for the region.
    pub fn resolve(&self, region: &str) -> Result<&RegionKeyEntry, ProvisionError> {
        self.entries
            .get(region)
            .ok_or_else(|| ProvisionError::MissingRegionKey {
                region: region.to_string(),
            })
    }

    /// Number of regions with a published key
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no keys have been published
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
