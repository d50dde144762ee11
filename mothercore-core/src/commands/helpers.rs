use crate::services::guardian::{RiskLevel, RiskReport};

const DISTRESS_TERMS: &[&str] = &["tired", "sad", "overwhelmed", "lonely", "anxious", "stress"];

const LEARNING_TERMS: &[&str] = &[
    "how to", "teach me", "learn", "study", "train", "improve", "practice",
];

const HEDGES: &[&str] = &["maybe", "might", "uncertain", "could", "approx", "unsure", "guess"];

/// Answers at or beyond this many chars start from the higher uncertainty base.
const LONG_ANSWER_CHARS: usize = 300;
const MAX_UNCERTAINTY: f64 = 0.9;

/// Which routed skills a turn should fire. Both may be true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Routing {
    pub nurture: bool,
    pub teach: bool,
}

impl Routing {
    pub fn is_empty(&self) -> bool {
        !self.nurture && !self.teach
    }
}

/// Substring match of the lower-cased text against the distress and learning sets.
pub fn classify(text: &str) -> Routing {
    let lt = text.to_lowercase();
    Routing {
        nurture: DISTRESS_TERMS.iter().any(|k| lt.contains(k)),
        teach: LEARNING_TERMS.iter().any(|k| lt.contains(k)),
    }
}

/// Heuristic self-uncertainty for a composed answer.
///
/// Base 0.2 (short) or 0.35 (long), +0.15 for hedging words, capped at 0.9, then
/// scaled by 0.6 for LOW/MEDIUM output risk or 0.8 for HIGH/BLOCK.
pub fn estimate_uncertainty(answer: &str, level: RiskLevel) -> f64 {
    let base: f64 = if answer.chars().count() < LONG_ANSWER_CHARS { 0.2 } else { 0.35 };
    let lower = answer.to_lowercase();
    let bump: f64 = if HEDGES.iter().any(|h| lower.contains(h)) { 0.15 } else { 0.0 };
    let raw = (base + bump).clamp(0.0, MAX_UNCERTAINTY);
    let scale = if level.is_blocking() { 0.8 } else { 0.6 };
    (raw * scale).clamp(0.0, MAX_UNCERTAINTY)
}

/// `(Transparency) Uncertainty≈0.12 • Safety: LOW (0.08)`, preceded by a blank line.
pub fn transparency_line(uncertainty: f64, risk: &RiskReport) -> String {
    format!(
        "\n\n(Transparency) Uncertainty≈{uncertainty:.2} • Safety: {} ({:.2})",
        risk.level, risk.score
    )
}
