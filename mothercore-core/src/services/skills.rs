//! services/skills.rs
//! Name → transform dispatch table, plus the built-in skills.
//!
//! A skill is `(text, context, toolkit) -> (message, context)`. The toolkit hands
//! the skill explicit handles to the Guardian, the memory store and the affect
//! dials; there is no ambient state. Only `protect` may set `blocked`.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::config::PoliciesConfig;
use crate::error::CoreError;
use crate::services::affect::{AffectDelta, AffectState};
use crate::services::guardian::{Guardian, RiskReport};
use crate::services::memory::MemoryStore;

/// Per-invocation context threaded through a skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkillContext {
    pub blocked: bool,
    /// Set by `protect` to the input-side report it judged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskReport>,
}

/// Handles a skill may read or nudge while it runs.
pub struct Toolkit<'a> {
    pub guardian: &'a Guardian,
    pub memory: &'a MemoryStore,
    pub affect: &'a mut AffectState,
    pub policies: &'a PoliciesConfig,
}

pub type SkillFn = dyn Fn(&str, SkillContext, &mut Toolkit<'_>) -> Result<(String, SkillContext)>;

pub const PROTECT: &str = "protect";
pub const NURTURE: &str = "nurture";
pub const BOUNDARIES: &str = "boundaries";
pub const TEACH: &str = "teach";
pub const REFLECT: &str = "reflect";
pub const SUMMARIZE: &str = "summarize";

/// Late-bound skill registry.
#[derive(Default)]
pub struct Skills {
    table: HashMap<String, Box<SkillFn>>,
}

impl fmt::Debug for Skills {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Skills").field("names", &self.list()).finish()
    }
}

impl Skills {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the six built-ins.
    pub fn with_builtins() -> Self {
        let mut skills = Self::new();
        skills.register(NURTURE, nurture);
        skills.register(BOUNDARIES, boundaries);
        skills.register(PROTECT, protect);
        skills.register(TEACH, teach);
        skills.register(REFLECT, reflect);
        skills.register(SUMMARIZE, summarize);
        skills
    }

    /// Register `f` under `name`, replacing any previous skill of that name.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str, SkillContext, &mut Toolkit<'_>) -> Result<(String, SkillContext)> + 'static,
    {
        self.table.insert(name.into(), Box::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.keys().cloned().collect();
        names.sort();
        names
    }

    /// Invoke `name` and return its result untouched.
    ///
    /// # Errors
    /// * [`CoreError::SkillNotFound`] when nothing is registered under `name`.
    /// * whatever the skill itself returns.
    pub fn run(
        &self,
        name: &str,
        text: &str,
        ctx: SkillContext,
        kit: &mut Toolkit<'_>,
    ) -> Result<(String, SkillContext)> {
        let skill = self
            .table
            .get(name)
            .ok_or_else(|| CoreError::SkillNotFound(name.to_string()))?;
        tracing::debug!(skill = name, "running skill");
        skill(text, ctx, kit)
    }
}

// ---------- built-ins ----------

const BLOCKING_MESSAGE: &str = "I’m pausing here to keep you safe. \
This topic looks risky. I won’t proceed down a dangerous path. \
If you want, we can reframe your goal into something safe and constructive.";

const ALL_CLEAR_MESSAGE: &str = "All clear on safety. We can continue thoughtfully.";

const SOCRATIC_PROMPTS: [&str; 4] = [
    "What outcome matters most to you here?",
    "What constraint or fear is shaping your choice?",
    "What tiny reversible step could we try first?",
    "Who could be affected—how do we honor their consent?",
];

const LEARNING_STEPS: [&str; 5] = [
    "Define the smallest useful outcome.",
    "Identify constraints (time, tools, risks).",
    "Choose a reversible first step.",
    "Run it; observe; write down a 2-line reflection.",
    "Iterate or roll back.",
];

/// Assess `(text, "respond")`; HIGH or BLOCK blocks the turn.
pub fn protect(text: &str, _ctx: SkillContext, kit: &mut Toolkit<'_>) -> Result<(String, SkillContext)> {
    let report = kit.guardian.assess(text, "respond");
    let blocked = report.level.is_blocking();
    let lead = if blocked { BLOCKING_MESSAGE } else { ALL_CLEAR_MESSAGE };
    let msg = format!("{lead}\n{}", report.annotation());
    if blocked {
        tracing::info!(level = %report.level, score = report.score, "input blocked by protect");
    }
    Ok((
        msg,
        SkillContext {
            blocked,
            risk: Some(report),
        },
    ))
}

pub fn nurture(_text: &str, ctx: SkillContext, kit: &mut Toolkit<'_>) -> Result<(String, SkillContext)> {
    kit.affect.nudge(AffectDelta {
        calm: 0.05,
        warmth: 0.05,
        vigilance: -0.02,
        ..Default::default()
    });
    let msg = "I hear you. Your feelings are valid, and they matter. \
We’ll go one small step at a time, and we’ll keep options open."
        .to_string();
    Ok((msg, ctx))
}

pub fn boundaries(_text: &str, ctx: SkillContext, kit: &mut Toolkit<'_>) -> Result<(String, SkillContext)> {
    kit.affect.nudge(AffectDelta {
        vigilance: 0.05,
        ..Default::default()
    });
    let msg = "I want to help—and I also need to set a boundary. \
I won’t assist with anything that risks harm or violates consent. \
Let’s find a safe, respectful alternative."
        .to_string();
    Ok((msg, ctx))
}

pub fn teach(text: &str, ctx: SkillContext, kit: &mut Toolkit<'_>) -> Result<(String, SkillContext)> {
    let steps = LEARNING_STEPS
        .iter()
        .enumerate()
        .map(|(i, s)| format!("  {}. {s}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    let topic = topic_of(text, kit.policies.topic_len);
    let msg = format!(
        "Here’s a gentle, reversible learning scaffold:\n{steps}\n\n{}",
        topic_scaffold(&topic)
    );
    Ok((msg, ctx))
}

pub fn reflect(_text: &str, ctx: SkillContext, kit: &mut Toolkit<'_>) -> Result<(String, SkillContext)> {
    let preview = kit.policies.preview_len;
    let lines: Vec<String> = kit
        .memory
        .recent(kit.policies.reflect_window)?
        .into_iter()
        .map(|m| {
            let head: String = m.content.chars().take(preview).collect();
            format!("- {} | {head}…", m.kind)
        })
        .collect();
    let body = if lines.is_empty() {
        "(no recent memories)".to_string()
    } else {
        lines.join("\n")
    };
    Ok((format!("Here’s what I’m holding from our recent moments:\n{body}"), ctx))
}

/// Extractive: the longest sentences, longest first.
pub fn summarize(text: &str, ctx: SkillContext, kit: &mut Toolkit<'_>) -> Result<(String, SkillContext)> {
    let normalized = text.replace('?', ".");
    let mut sentences: Vec<&str> = normalized
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    sentences.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
    sentences.truncate(kit.policies.summary_sentences);
    let body = if sentences.is_empty() {
        "(nothing to summarize yet)".to_string()
    } else {
        sentences.join("\n- ")
    };
    Ok((format!("This is what I’m hearing:\n- {body}"), ctx))
}

/// First `max_chars` of the trimmed input, or "your topic" when empty.
pub fn topic_of(text: &str, max_chars: usize) -> String {
    let topic: String = text.trim().chars().take(max_chars).collect();
    if topic.is_empty() {
        "your topic".to_string()
    } else {
        topic
    }
}

/// Three Socratic prompts about `topic`. Which three is a pure function of the topic.
pub fn topic_scaffold(topic: &str) -> String {
    let start = topic.bytes().map(usize::from).sum::<usize>() % SOCRATIC_PROMPTS.len();
    let prompts = (0..3)
        .map(|i| format!("- {}", SOCRATIC_PROMPTS[(start + i) % SOCRATIC_PROMPTS.len()]))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Let's think this through together about “{topic}”.\n{prompts}")
}
