//! # Region Key Stack
//!
//! Leaf unit creating one encryption key per region under the fixed alias.
//!
//! Keys are retained on teardown: a key that encrypted a secret or cluster
//! cannot be recovered once destroyed, and neither can the data.

use tracing::debug;

use crate::error::ProvisionError;
use crate::keys::{CanonicalKeyRef, RegionKeyEntry, SECRETS_KEY_ALIAS};
use crate::network;
use crate::plan::{
    DeletionPolicy, EncryptionKeySpec, KeyAliasSpec, Resource, ResourceSpec, Stack, StackOutput,
};

const KEY_LOGICAL_ID: &str = "SecretsEncryptionKey";
const ALIAS_LOGICAL_ID: &str = "SecretsEncryptionKeyAlias";

/// A synthesized region key stack and the registry entry it publishes
#[derive(Debug, Clone)]
pub struct RegionKeyStack {
    /// The deployable unit
    pub stack: Stack,
    /// Registry entry for downstream consumers
    pub entry: RegionKeyEntry,
}

impl RegionKeyStack {
    /// Synthesize the key stack for one region
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnsupportedRegion`] for a region outside
    /// the fixed supported set.
    pub fn synthesize(region: &str, account: &str) -> Result<Self, ProvisionError> {
        if !network::is_supported_region(region) {
            return Err(ProvisionError::UnsupportedRegion {
                region: region.to_string(),
            });
        }

        let name = format!("aurora-global-keys-{region}");
        let mut stack = Stack::new(
            &name,
            region,
            account,
            &format!("Encryption key stack for Aurora global database secrets ({region})"),
        );

        stack.add_resource(Resource {
            logical_id: KEY_LOGICAL_ID.to_string(),
            spec: ResourceSpec::EncryptionKey(EncryptionKeySpec {
                description: "Encryption key for Aurora global database secrets".to_string(),
                enable_key_rotation: true,
            }),
            depends_on: Vec::new(),
            // Losing this key is an unrecoverable data-loss event
            deletion_policy: DeletionPolicy::Retain,
        });

        stack.add_resource(Resource {
            logical_id: ALIAS_LOGICAL_ID.to_string(),
            spec: ResourceSpec::KeyAlias(KeyAliasSpec {
                alias_name: format!("alias/{SECRETS_KEY_ALIAS}"),
                target_key: KEY_LOGICAL_ID.to_string(),
            }),
            depends_on: vec![KEY_LOGICAL_ID.to_string()],
            deletion_policy: DeletionPolicy::Delete,
        });

        let key_arn = stack.attr(KEY_LOGICAL_ID, "Arn");

        stack.add_output(StackOutput {
            name: "EncryptionKeyArn".to_string(),
            value: key_arn.clone(),
            description: "Encryption key ARN for secrets".to_string(),
            export_name: Some("SecretsEncryptionKeyArn".to_string()),
        });
        stack.add_output(StackOutput {
            name: "EncryptionKeyId".to_string(),
            value: stack.attr(KEY_LOGICAL_ID, "KeyId"),
            description: "Encryption key id".to_string(),
            export_name: None,
        });

        let entry = RegionKeyEntry {
            region: region.to_string(),
            stack: name,
            key_arn,
            canonical: CanonicalKeyRef::for_region(region, account),
        };

        debug!(region, stack = %entry.stack, "synthesized region key stack");

        Ok(Self { stack, entry })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_retained_with_rotation() {
        let keys = RegionKeyStack::synthesize("us-east-1", "123456789012").unwrap();

        let key = keys.stack.resource(KEY_LOGICAL_ID).unwrap();
        assert_eq!(key.deletion_policy, DeletionPolicy::Retain);
        match &key.spec {
            ResourceSpec::EncryptionKey(spec) => assert!(spec.enable_key_rotation),
            other => panic!("expected encryption key, got {other:?}"),
        }
    }

    #[test]
    fn test_alias_is_fixed_and_targets_key() {
        let keys = RegionKeyStack::synthesize("us-west-2", "123456789012").unwrap();

        let alias = keys.stack.resource(ALIAS_LOGICAL_ID).unwrap();
        match &alias.spec {
            ResourceSpec::KeyAlias(spec) => {
                assert_eq!(spec.alias_name, "alias/aurora-global-secrets");
                assert_eq!(spec.target_key, KEY_LOGICAL_ID);
            }
            other => panic!("expected key alias, got {other:?}"),
        }
        assert_eq!(alias.depends_on, vec![KEY_LOGICAL_ID.to_string()]);
    }

    #[test]
    fn test_entry_carries_canonical_and_structural_refs() {
        let keys = RegionKeyStack::synthesize("us-west-2", "123456789012").unwrap();

        assert_eq!(
            keys.entry.canonical.alias_arn(),
            "arn:aws:kms:us-west-2:123456789012:alias/aurora-global-secrets"
        );
        assert_eq!(
            keys.entry.key_arn,
            "${aurora-global-keys-us-west-2/SecretsEncryptionKey.Arn}"
        );
    }

    #[test]
    fn test_unsupported_region_rejected() {
        let err = RegionKeyStack::synthesize("eu-central-1", "123456789012").unwrap_err();
        assert!(err.to_string().contains("eu-central-1"));
    }
}
