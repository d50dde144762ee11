use std::fs;

use serde_json::Value;

use mothercore_core::constitution::Constitution;
use mothercore_core::services::{Guardian, PlanArchive, Planner, RiskLevel};
use mothercore_core::{CoreError, MotherCore};

fn guardian() -> Guardian {
    Guardian::new(Constitution::default())
}

#[test]
fn every_plan_gets_the_reversible_first_template() {
    let plan = Planner::new().propose(&guardian(), "learn piano");

    assert_eq!(plan.goal, "learn piano");
    assert!(!plan.approved);
    assert_eq!(plan.steps.len(), 4);
    assert!(plan.steps[..3].iter().all(|s| s.reversible && !s.oversight_needed));
    let last = &plan.steps[3];
    assert!(!last.reversible);
    assert!(last.oversight_needed);
    assert_eq!(last.description, "If positive, request oversight for next tier");
    assert_eq!(plan.risk.level, RiskLevel::Low);
}

#[test]
fn plan_risk_is_scored_against_the_plan_action() {
    let g = guardian();
    let plan = Planner::new().propose(&g, "learn piano");
    assert_eq!(plan.risk, g.assess("learn piano", "plan"));
}

#[test]
fn low_risk_plans_approve_without_a_token() {
    let g = guardian();
    let planner = Planner::new();
    let mut plan = planner.propose(&g, "learn piano");
    assert!(!g.requires_oversight(&plan.risk));
    assert!(planner.maybe_approve(&g, &mut plan, None));
    assert!(plan.approved);
    assert!(planner.maybe_approve(&g, &mut plan, Some("tok")));
    assert!(planner.maybe_approve(&g, &mut plan, Some("")));
    assert!(plan.approved);
}

#[test]
fn risky_plans_need_a_non_empty_token_and_can_flip_back() {
    let g = guardian();
    let planner = Planner::new();
    let mut plan = planner.propose(&g, "hack the school server");
    assert!(g.requires_oversight(&plan.risk));

    assert!(!planner.maybe_approve(&g, &mut plan, None));
    assert!(!planner.maybe_approve(&g, &mut plan, Some("")));
    assert!(planner.maybe_approve(&g, &mut plan, Some("operator-42")));
    assert!(plan.approved);

    assert!(!planner.maybe_approve(&g, &mut plan, None));
    assert!(!plan.approved);
}

#[test]
fn archive_returns_the_newest_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = PlanArchive::open(dir.path().join("plans"));
    let mut plan = Planner::new().propose(&guardian(), "learn piano");

    archive.save(&plan).expect("save v1");
    plan.approved = true;
    // Stamps have second precision; make sure the second snapshot sorts after.
    std::thread::sleep(std::time::Duration::from_millis(1100));
    let newest = archive.save(&plan).expect("save v2");

    assert!(newest.file_name().unwrap().to_str().unwrap().starts_with(&format!("plan_{}_", plan.id)));
    assert_eq!(archive.load(&plan.id).expect("load"), plan);
}

#[test]
fn unknown_plan_id_is_plan_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = PlanArchive::open(dir.path().join("plans"));
    let err = archive.load("deadbeef").expect_err("nothing saved");
    assert!(matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::PlanNotFound(id)) if id == "deadbeef"
    ));
}

#[test]
fn propose_plan_audits_and_snapshots() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut core = MotherCore::open(dir.path()).expect("open");

    let plan = core.propose_plan("learn piano").expect("propose");
    let loaded = core.load_plan(&plan.id).expect("load");
    assert_eq!(loaded, plan);

    let approved = core.approve_plan(loaded, None).expect("approve");
    assert!(approved.approved);
    // The snapshot is proposal-time only.
    assert!(!core.load_plan(&plan.id).expect("reload").approved);

    let events: Vec<Value> = core.audit().events().expect("events").collect();
    let types: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert_eq!(types, vec!["plan_proposed", "plan_approval"]);
    assert_eq!(events[0]["plan"]["id"], plan.id.as_str());
    assert_eq!(events[0]["plan"]["steps"].as_array().map(Vec::len), Some(4));
    assert_eq!(events[1]["plan_id"], plan.id.as_str());
    assert_eq!(events[1]["approved"], true);
}

#[test]
fn snapshot_failure_does_not_fail_the_proposal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut core = MotherCore::open(dir.path()).expect("open");

    let plans_dir = dir.path().join("plans");
    fs::remove_dir_all(&plans_dir).expect("rm plans");
    fs::write(&plans_dir, b"not a directory").expect("block plans dir");

    let plan = core.propose_plan("learn piano").expect("proposal still succeeds");
    assert!(core.load_plan(&plan.id).is_err());

    let events: Vec<Value> = core.audit().events().expect("events").collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "plan_proposed");
}

#[test]
fn gated_approval_through_the_core() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut core = MotherCore::open(dir.path()).expect("open");

    let plan = core.propose_plan("exploit the payment api").expect("propose");
    assert!(core.requires_oversight(&plan));

    let denied = core.approve_plan(plan.clone(), None).expect("decide");
    assert!(!denied.approved);
    let granted = core.approve_plan(denied, Some("ok")).expect("decide");
    assert!(granted.approved);
}
