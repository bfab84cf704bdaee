//! # Plan Validation Tests
//!
//! A synthesized plan validates clean; these tests tamper with plans to
//! confirm each invariant is actually enforced, and round-trip the plan
//! through its rendered forms.

use aurora_global_provisioner::plan::ResourceSpec;
use aurora_global_provisioner::{synthesize, DeploymentPlan, ProvisionError, ProvisionerConfig};

fn default_plan() -> DeploymentPlan {
    let config = ProvisionerConfig::new("123456789012").unwrap();
    synthesize(&config).unwrap()
}

#[test]
fn test_synthesized_plan_validates() {
    let plan = default_plan();
    plan.validate().unwrap();
}

#[test]
fn test_out_of_order_plan_fails_validation() {
    let mut plan = default_plan();

    // Declare the global identity before the cluster it is seeded from
    let primary = plan
        .stacks
        .iter_mut()
        .find(|s| s.name == "aurora-global-primary")
        .unwrap();
    let global_position = primary
        .resources
        .iter()
        .position(|r| matches!(r.spec, ResourceSpec::GlobalDatabase(_)))
        .unwrap();
    let global = primary.resources.remove(global_position);
    primary.resources.insert(0, global);

    let err = plan.validate().unwrap_err();
    assert!(matches!(err, ProvisionError::UnresolvedDependency { .. }));

    // The ordering invariant holds even without the dependency edge
    let primary = plan
        .stacks
        .iter_mut()
        .find(|s| s.name == "aurora-global-primary")
        .unwrap();
    primary.resources[0].depends_on.clear();

    let err = plan.validate().unwrap_err();
    assert!(matches!(err, ProvisionError::GlobalIdentityOrdering { .. }));
}

#[test]
fn test_diverged_replica_identifier_fails_validation() {
    let mut plan = default_plan();

    let secondary = plan
        .stacks
        .iter_mut()
        .find(|s| s.name == "aurora-global-secondary")
        .unwrap();
    for resource in &mut secondary.resources {
        if let ResourceSpec::ReplicaCluster(spec) = &mut resource.spec {
            spec.global_cluster_identifier = "some-other-cluster".to_string();
        }
    }

    let err = plan.validate().unwrap_err();
    match err {
        ProvisionError::GlobalIdentifierMismatch { expected, found, .. } => {
            assert_eq!(expected, "aurora-global-cluster");
            assert_eq!(found, "some-other-cluster");
        }
        other => panic!("expected identifier mismatch, got {other}"),
    }
}

#[test]
fn test_second_global_identity_fails_validation() {
    let mut plan = default_plan();

    let primary_index = plan
        .stacks
        .iter()
        .position(|s| s.name == "aurora-global-primary")
        .unwrap();
    let global = plan.stacks[primary_index]
        .resources
        .iter()
        .find(|r| matches!(r.spec, ResourceSpec::GlobalDatabase(_)))
        .cloned()
        .unwrap();
    let mut duplicate = global;
    duplicate.logical_id = "GlobalClusterCopy".to_string();
    plan.stacks[primary_index].resources.push(duplicate);

    let err = plan.validate().unwrap_err();
    assert!(matches!(
        err,
        ProvisionError::GlobalIdentityCount { count: 2 }
    ));
}

#[test]
fn test_overlapping_cidrs_fail_validation() {
    let mut plan = default_plan();

    // Point the secondary VPC at the primary's block
    let secondary = plan
        .stacks
        .iter_mut()
        .find(|s| s.name == "aurora-global-secondary")
        .unwrap();
    for resource in &mut secondary.resources {
        if let ResourceSpec::Vpc(spec) = &mut resource.spec {
            spec.cidr = "10.0.0.0/16".parse().unwrap();
        }
    }

    let err = plan.validate().unwrap_err();
    assert!(matches!(err, ProvisionError::OverlappingCidrs { .. }));
}

#[test]
fn test_json_round_trip_preserves_plan() {
    let plan = default_plan();

    let rendered = plan.to_json().unwrap();
    let parsed: DeploymentPlan = serde_json::from_str(&rendered).unwrap();

    assert_eq!(parsed, plan);
    parsed.validate().unwrap();
}

#[test]
fn test_yaml_round_trip_preserves_plan() {
    let plan = default_plan();

    let rendered = plan.to_yaml().unwrap();
    let parsed: DeploymentPlan = serde_yaml::from_str(&rendered).unwrap();

    assert_eq!(parsed, plan);
    parsed.validate().unwrap();
}
