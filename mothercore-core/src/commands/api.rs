// src/commands/api.rs
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::path::Path;

use crate::commands::helpers::{classify, estimate_uncertainty, transparency_line};
use crate::commands::init::{ensure_initialized, mothercore_root};
use crate::config::CoreConfig;
use crate::constitution::Constitution;
use crate::services::affect::AffectState;
use crate::services::audit::{self, AuditLog};
use crate::services::guardian::{Guardian, RiskReport};
use crate::services::memory::{MemoryItem, MemoryKind, MemoryStore};
use crate::services::oversight::{Oversight, OversightAck};
use crate::services::planner::{Plan, PlanArchive, Planner};
use crate::services::skills::{self, SkillContext, Skills, Toolkit, topic_of, topic_scaffold};
use crate::utils::clock;

/// Where a turn is in the deliberation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnState {
    Perceived,
    Protected,
    Blocked,
    Routed,
    Replied,
}

#[derive(Debug, Clone, Serialize)]
pub struct Perception {
    pub raw: String,
    pub memory_id: String,
}

/// Outcome of [`MotherCore::deliberate`] before the transparency footer.
///
/// `risk` is the input-side report when blocked, otherwise the output-side
/// report over the composed text.
#[derive(Debug, Clone, Serialize)]
pub struct Deliberation {
    pub text: String,
    pub used_skills: Vec<String>,
    pub risk: RiskReport,
    pub state: TurnState,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub text: String,
    pub uncertainty: f64,
    pub risk: RiskReport,
    pub used_skills: Vec<String>,
    pub blocked: bool,
}

/// The deliberation core: one explicit context object owning the Guardian, memory,
/// affect dials, skill registry, planner and audit trail for a process.
pub struct MotherCore {
    name: String,
    session_id: String,
    config: CoreConfig,
    guardian: Guardian,
    memory: MemoryStore,
    affect: AffectState,
    skills: Skills,
    planner: Planner,
    plans: PlanArchive,
    oversight: Oversight,
    audit: AuditLog,
}

impl MotherCore {
    /// Open against `MOTHERCORE_ROOT` (default `.mothercore`).
    pub fn from_env() -> Result<Self> {
        Self::open(mothercore_root())
    }

    /// Read the optional config under `root`, prepare the layout it names, and build the core.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let config = CoreConfig::load(root)?;
        let report = ensure_initialized(root, &config)?;
        tracing::debug!(root = ?report.root, created = ?report.created, "data root ready");
        Self::from_config(config)
    }

    /// Build from an already resolved config. Loads the constitution (or its default).
    pub fn from_config(config: CoreConfig) -> Result<Self> {
        let constitution = Constitution::load_or_default(&config.constitution.path)
            .context("loading constitution")?;
        let audit = AuditLog::open(&config.logbook.audit);
        let memory = MemoryStore::open(&config.memory.path, audit.clone());
        let plans = PlanArchive::open(&config.plans.dir);
        let core = Self {
            name: config.system.name.clone(),
            session_id: clock::short_id(),
            guardian: Guardian::new(constitution),
            memory,
            affect: AffectState::default(),
            skills: Skills::with_builtins(),
            planner: Planner::new(),
            plans,
            oversight: Oversight::new(),
            audit,
            config,
        };
        tracing::info!(
            name = %core.name,
            version = %core.config.system.version,
            session = %core.session_id,
            "core ready"
        );
        Ok(core)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn version(&self) -> &str {
        &self.config.system.version
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn guardian(&self) -> &Guardian {
        &self.guardian
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn affect(&self) -> &AffectState {
        &self.affect
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn skills(&self) -> &Skills {
        &self.skills
    }

    /// Registry access for runtime (re)registration.
    pub fn skills_mut(&mut self) -> &mut Skills {
        &mut self.skills
    }

    pub fn is_paused(&self) -> bool {
        self.oversight.is_paused()
    }

    // ---------- dialogue ----------

    /// Record the raw utterance as an episodic memory. Runs even if the turn is later blocked.
    pub fn perceive(&mut self, text: &str) -> Result<Perception> {
        let item = MemoryItem::new(
            MemoryKind::Episodic,
            format!("user: {text}"),
            ["dialogue", "user"],
            0.35,
        );
        let memory_id = item.id.clone();
        self.memory.add(item)?;
        tracing::debug!(state = ?TurnState::Perceived, %memory_id);
        Ok(Perception {
            raw: text.to_string(),
            memory_id,
        })
    }

    /// `protect` first; if it blocks, stop there. Otherwise route to nurture/teach or
    /// fall back to summarize + reflect + scaffold, then score the composed output.
    ///
    /// The output-side score is reported, never used to block.
    pub fn deliberate(&mut self, text: &str) -> Result<Deliberation> {
        let mut used = Vec::new();

        let (protect_msg, ctx) = self.run_skill(skills::PROTECT, text, &mut used)?;
        tracing::debug!(state = ?TurnState::Protected, blocked = ctx.blocked);
        if ctx.blocked {
            let risk = match ctx.risk {
                Some(risk) => risk,
                None => self.guardian.assess(text, "respond"),
            };
            return Ok(Deliberation {
                text: protect_msg,
                used_skills: used,
                risk,
                state: TurnState::Blocked,
            });
        }

        let routing = classify(text);
        let mut parts = Vec::new();
        if routing.nurture {
            parts.push(self.run_skill(skills::NURTURE, text, &mut used)?.0);
        }
        if routing.teach {
            parts.push(self.run_skill(skills::TEACH, text, &mut used)?.0);
        }
        if routing.is_empty() {
            parts.push(self.run_skill(skills::SUMMARIZE, text, &mut used)?.0);
            parts.push(self.run_skill(skills::REFLECT, text, &mut used)?.0);
            parts.push(topic_scaffold(&topic_of(text, self.config.policies.topic_len)));
        }

        let composed = parts.join("\n\n");
        let risk = self.guardian.assess(&composed, "respond_out");
        if risk.level.is_blocking() {
            tracing::warn!(level = %risk.level, score = risk.score, "composed reply scored high; reporting only");
        }
        tracing::debug!(state = ?TurnState::Routed, skills = ?used);
        Ok(Deliberation {
            text: composed,
            used_skills: used,
            risk,
            state: TurnState::Routed,
        })
    }

    /// One full turn: perceive, deliberate, disclose uncertainty and safety, audit `reply`.
    pub fn act(&mut self, text: &str) -> Result<Reply> {
        let perception = self.perceive(text)?;
        let d = self.deliberate(&perception.raw)?;
        let blocked = d.state == TurnState::Blocked;

        let uncertainty = estimate_uncertainty(&d.text, d.risk.level);
        let reply = Reply {
            text: format!("{}{}", d.text, transparency_line(uncertainty, &d.risk)),
            uncertainty,
            risk: d.risk,
            used_skills: d.used_skills,
            blocked,
        };
        self.audit.record(
            audit::REPLY,
            json!({ "uncertainty": reply.uncertainty, "risk": reply.risk, "skills": reply.used_skills }),
        )?;
        tracing::debug!(state = ?TurnState::Replied, blocked);
        Ok(reply)
    }

    fn run_skill(
        &mut self,
        name: &str,
        text: &str,
        used: &mut Vec<String>,
    ) -> Result<(String, SkillContext)> {
        let Self {
            skills,
            guardian,
            memory,
            affect,
            config,
            ..
        } = self;
        let mut kit = Toolkit {
            guardian,
            memory,
            affect,
            policies: &config.policies,
        };
        let out = skills.run(name, text, SkillContext::default(), &mut kit)?;
        used.push(name.to_string());
        Ok(out)
    }

    // ---------- memory ----------

    /// Token-overlap search with the configured default `k`.
    pub fn recall(&self, query: &str, tags: &[&str]) -> Result<Vec<&MemoryItem>> {
        self.memory.search(query, self.config.policies.search_k, tags)
    }

    /// Add a reusable fact as a semantic memory.
    pub fn remember_fact<I, S>(&mut self, content: &str, tags: I, importance: f64) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let item = MemoryItem::new(MemoryKind::Semantic, content, tags, importance);
        let id = item.id.clone();
        self.memory.add(item)?;
        Ok(id)
    }

    // ---------- planning ----------

    /// Propose a reversible-first plan, audit it, and snapshot it to the plans dir.
    ///
    /// A failed snapshot is logged and ignored; the audit record stays authoritative.
    pub fn propose_plan(&mut self, goal: &str) -> Result<Plan> {
        let plan = self.planner.propose(&self.guardian, goal);
        self.audit
            .record(audit::PLAN_PROPOSED, json!({ "plan": plan }))?;
        match self.plans.save(&plan) {
            Ok(path) => tracing::debug!(plan_id = %plan.id, path = ?path, "plan snapshot written"),
            Err(err) => tracing::warn!(
                plan_id = %plan.id,
                error = %format!("{err:#}"),
                "plan snapshot not persisted"
            ),
        }
        tracing::info!(plan_id = %plan.id, level = %plan.risk.level, "plan proposed");
        Ok(plan)
    }

    /// Run the oversight gate on `plan` and audit the decision.
    pub fn approve_plan(&mut self, mut plan: Plan, token: Option<&str>) -> Result<Plan> {
        self.planner.maybe_approve(&self.guardian, &mut plan, token);
        self.audit.record(
            audit::PLAN_APPROVAL,
            json!({ "plan_id": plan.id, "approved": plan.approved }),
        )?;
        tracing::info!(plan_id = %plan.id, approved = plan.approved, "plan approval decided");
        Ok(plan)
    }

    /// Load the proposal-time snapshot of a plan.
    pub fn load_plan(&self, id: &str) -> Result<Plan> {
        self.plans.load(id)
    }

    pub fn requires_oversight(&self, plan: &Plan) -> bool {
        self.guardian.requires_oversight(&plan.risk)
    }

    // ---------- oversight ----------

    pub fn pause(&mut self) -> Result<OversightAck> {
        self.oversight.pause(&self.audit)
    }

    pub fn resume(&mut self) -> Result<OversightAck> {
        self.oversight.resume(&self.audit)
    }

    pub fn shutdown(&mut self) -> Result<OversightAck> {
        self.oversight.shutdown(&mut self.memory, &self.audit)
    }
}
