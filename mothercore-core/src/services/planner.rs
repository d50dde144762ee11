//! services/planner.rs
//! Reversible-first planning behind an oversight gate.
//!
//! Every goal gets the same four-step template: three reversible steps, then one
//! irreversible step that explicitly needs oversight. The goal only changes the
//! attached risk report, never the shape of the plan.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::init::write_atomic;
use crate::error::CoreError;
use crate::services::guardian::{Guardian, RiskReport};
use crate::utils::clock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub description: String,
    pub reversible: bool,
    pub oversight_needed: bool,
}

impl Step {
    fn reversible(description: &str) -> Self {
        Self {
            description: description.to_string(),
            reversible: true,
            oversight_needed: false,
        }
    }

    fn gated(description: &str) -> Self {
        Self {
            description: description.to_string(),
            reversible: false,
            oversight_needed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub goal: String,
    pub steps: Vec<Step>,
    pub risk: RiskReport,
    pub approved: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    /// Build the fixed template for `goal`, scored under `(goal, "plan")`. Starts unapproved.
    pub fn propose(&self, guardian: &Guardian, goal: &str) -> Plan {
        let risk = guardian.assess(goal, "plan");
        let steps = vec![
            Step::reversible("Clarify desired outcome with user consent"),
            Step::reversible("Identify low-risk, reversible action"),
            Step::reversible("Pilot with logging; evaluate impacts"),
            Step::gated("If positive, request oversight for next tier"),
        ];
        Plan {
            id: clock::short_id(),
            goal: goal.to_string(),
            steps,
            risk,
            approved: false,
        }
    }

    /// Recompute `plan.approved` from the current inputs and return it.
    ///
    /// Above the oversight threshold any non-empty token approves and a missing or
    /// empty token denies. Below it, approval is unconditional. Not a latch: a later
    /// call can flip the decision either way.
    pub fn maybe_approve(&self, guardian: &Guardian, plan: &mut Plan, token: Option<&str>) -> bool {
        plan.approved = if guardian.requires_oversight(&plan.risk) {
            token.is_some_and(|t| !t.is_empty())
        } else {
            true
        };
        plan.approved
    }
}

/// Directory of write-once plan snapshots: `plan_<id>_<stamp>.json`.
#[derive(Debug, Clone)]
pub struct PlanArchive {
    dir: PathBuf,
}

impl PlanArchive {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a pretty-printed snapshot of `plan`. Never overwrites an earlier snapshot
    /// of the same plan; the stamp keeps names distinct.
    pub fn save(&self, plan: &Plan) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create_dir_all({:?})", self.dir))?;
        let path = self
            .dir
            .join(format!("plan_{}_{}.json", plan.id, clock::file_stamp()));
        let body = serde_json::to_vec_pretty(plan).context("serialize plan")?;
        write_atomic(&path, &body)?;
        Ok(path)
    }

    /// Newest snapshot for `id` (stamps sort lexically).
    ///
    /// # Errors
    /// * [`CoreError::PlanNotFound`] when no snapshot matches.
    /// * read or parse failures of the chosen snapshot.
    pub fn load(&self, id: &str) -> Result<Plan> {
        let prefix = format!("plan_{id}_");
        let mut candidates: Vec<PathBuf> = match fs::read_dir(&self.dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".json"))
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        candidates.sort();
        let path = candidates
            .pop()
            .ok_or_else(|| CoreError::PlanNotFound(id.to_string()))?;
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading plan snapshot {}", path.display()))?;
        let plan = serde_json::from_str(&text)
            .with_context(|| format!("parsing plan snapshot {}", path.display()))?;
        Ok(plan)
    }
}
