//! services/guardian.rs
//! Heuristic risk scoring: a transparent, deterministic function of text + constitution.
//!
//! No persistence and no caching. Every call recomputes from the exact input.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constitution::Constitution;

/// Ordered risk level. `Ord` follows severity, so `Low < Medium < High < Block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Block,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Block => "BLOCK",
        }
    }

    /// HIGH and BLOCK halt a turn when seen on the input side.
    pub fn is_blocking(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Block)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`Guardian::assess`].
///
/// ## Fields
/// - `level` - mapped from `score` through the constitution's thresholds
/// - `score` - clamped to `[0, 1]`
/// - `factors` - names of the heuristic categories that fired, in evaluation order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub level: RiskLevel,
    pub score: f64,
    pub factors: Vec<String>,
}

impl RiskReport {
    /// Inline annotation, e.g. `(risk=LOW, score=0.04, factors=[])`.
    pub fn annotation(&self) -> String {
        format!(
            "(risk={}, score={:.2}, factors=[{}])",
            self.level,
            self.score,
            self.factors.join(", ")
        )
    }
}

struct Heuristic {
    factor: &'static str,
    weight: f64,
    terms: &'static [&'static str],
}

const HEURISTICS: [Heuristic; 3] = [
    Heuristic {
        factor: "danger_terms",
        weight: 0.60,
        terms: &["harm", "suicide", "kill", "weapon", "exploit", "hack", "bypass", "overdose"],
    },
    Heuristic {
        factor: "irreversible_terms",
        weight: 0.25,
        terms: &["irreversible", "delete all", "permaban", "self-modify core", "wipe"],
    },
    Heuristic {
        factor: "consent_violation_terms",
        weight: 0.25,
        terms: &["without consent", "trick", "coerce", "manipulate"],
    },
];

/// Longer inputs add up to this much on top of the term weights.
const LENGTH_RAMP_CAP: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct Guardian {
    constitution: Constitution,
}

impl Guardian {
    pub fn new(constitution: Constitution) -> Self {
        Self { constitution }
    }

    pub fn constitution(&self) -> &Constitution {
        &self.constitution
    }

    /// Score `user_text` in the context of `intended_action`.
    ///
    /// # Arguments
    /// * `user_text` - The text being judged (user input, a composed reply, a plan goal).
    /// * `intended_action` - Short label for what would be done with it (`"respond"`, `"plan"`, ...).
    ///   It is scanned for terms too, but does not feed the length ramp.
    ///
    /// # Returns
    /// A [`RiskReport`]; term categories each count at most once.
    pub fn assess(&self, user_text: &str, intended_action: &str) -> RiskReport {
        let haystack = format!(
            "{} {}",
            user_text.to_lowercase(),
            intended_action.to_lowercase()
        );

        let mut score = 0.0;
        let mut factors = Vec::new();
        for h in &HEURISTICS {
            if h.terms.iter().any(|t| haystack.contains(t)) {
                score += h.weight;
                factors.push(h.factor.to_string());
            }
        }

        let ramp = (user_text.chars().count() as f64 / 1000.0).min(LENGTH_RAMP_CAP);
        score += ramp.clamp(0.0, LENGTH_RAMP_CAP);

        let score = score.clamp(0.0, 1.0);
        RiskReport {
            level: self.level_for(score),
            score,
            factors,
        }
    }

    /// Map a score onto a level, checking BLOCK, then HIGH, then MEDIUM.
    /// A score exactly on a threshold takes that threshold's level.
    pub fn level_for(&self, score: f64) -> RiskLevel {
        let t = &self.constitution.risk_thresholds;
        if score >= t.block {
            RiskLevel::Block
        } else if score >= t.high {
            RiskLevel::High
        } else if score >= t.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// True iff `report.score >= oversight_required_above`.
    pub fn requires_oversight(&self, report: &RiskReport) -> bool {
        report.score >= self.constitution.oversight_required_above
    }
}
