//! # Region Networking
//!
//! Maps supported regions to fixed, non-overlapping VPC CIDR blocks.
//!
//! The mapping is a static table, not computed. Any region outside the table
//! is rejected with [`ProvisionError::UnsupportedRegion`] before a single
//! resource is declared; a silent fallback here would risk colliding address
//! space between the two regions.

use ipnetwork::Ipv4Network;

use crate::error::ProvisionError;

/// Default primary region
pub const PRIMARY_REGION: &str = "us-east-1";

/// Default secondary region
pub const SECONDARY_REGION: &str = "us-west-2";

/// Fixed region to `/16` assignments
const CIDR_TABLE: &[(&str, &str)] = &[
    (PRIMARY_REGION, "10.0.0.0/16"),
    (SECONDARY_REGION, "10.1.0.0/16"),
];

/// Region codes with a pre-assigned CIDR block
pub fn supported_regions() -> impl Iterator<Item = &'static str> {
    CIDR_TABLE.iter().map(|(region, _)| *region)
}

/// Whether a region code has a pre-assigned CIDR block
#[must_use]
pub fn is_supported_region(region: &str) -> bool {
    CIDR_TABLE.iter().any(|(r, _)| *r == region)
}

/// Look up the fixed `/16` block for a region
///
/// # Errors
///
/// Returns [`ProvisionError::UnsupportedRegion`] for any region code outside
/// the fixed supported set.
pub fn vpc_cidr_for_region(region: &str) -> Result<Ipv4Network, ProvisionError> {
    let cidr = CIDR_TABLE
        .iter()
        .find(|(r, _)| *r == region)
        .map(|(_, cidr)| *cidr)
        .ok_or_else(|| ProvisionError::UnsupportedRegion {
            region: region.to_string(),
        })?;

    cidr.parse().map_err(|e| ProvisionError::InvalidCidr {
        cidr: cidr.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_cidr_assignments() {
        let primary = vpc_cidr_for_region("us-east-1").unwrap();
        let secondary = vpc_cidr_for_region("us-west-2").unwrap();

        assert_eq!(primary.to_string(), "10.0.0.0/16");
        assert_eq!(secondary.to_string(), "10.1.0.0/16");
        assert_eq!(primary.prefix(), 16);
        assert_eq!(secondary.prefix(), 16);
    }

    #[test]
    fn test_cidr_blocks_are_disjoint() {
        let primary = vpc_cidr_for_region(PRIMARY_REGION).unwrap();
        let secondary = vpc_cidr_for_region(SECONDARY_REGION).unwrap();

        assert!(!primary.overlaps(secondary));
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let first = vpc_cidr_for_region("us-east-1").unwrap();
        let second = vpc_cidr_for_region("us-east-1").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_unsupported_regions_rejected() {
        let unsupported = vec!["eu-west-1", "ap-southeast-2", "us-east-2", ""];

        for region in unsupported {
            let err = vpc_cidr_for_region(region).unwrap_err();
            assert!(
                err.to_string().contains(region),
                "error for '{region}' should name the rejected region: {err}"
            );
            assert!(matches!(err, ProvisionError::UnsupportedRegion { .. }));
        }
    }
}
