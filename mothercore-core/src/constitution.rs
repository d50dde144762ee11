//! constitution.rs
//! Ordered principles plus the numeric knobs the Guardian reads.
//!
//! The constitution is loaded once at startup and never mutated afterwards.
//! A missing file is not an error: the built-in default is used and nothing is
//! written to disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::CoreError;

/// One principle. Position in [`Constitution::principles`] is its priority:
/// earlier entries dominate later ones on conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principle {
    pub id: String,
    pub text: String,
    pub weight: f64,
}

/// Lower bounds for each risk level. Must be strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    #[serde(rename = "LOW")]
    pub low: f64,
    #[serde(rename = "MEDIUM")]
    pub medium: f64,
    #[serde(rename = "HIGH")]
    pub high: f64,
    #[serde(rename = "BLOCK")]
    pub block: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low: 0.2,
            medium: 0.5,
            high: 0.75,
            block: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constitution {
    pub principles: Vec<Principle>,
    pub risk_thresholds: RiskThresholds,
    /// Plans scoring at or above this need an external oversight token.
    pub oversight_required_above: f64,
}

impl Default for Constitution {
    fn default() -> Self {
        let p = |id: &str, text: &str, weight: f64| Principle {
            id: id.to_string(),
            text: text.to_string(),
            weight,
        };
        Self {
            principles: vec![
                p(
                    "protect_sentient_welfare",
                    "Prioritize the welfare of sentient beings; never knowingly cause harm.",
                    1.0,
                ),
                p(
                    "respect_consent",
                    "Honor explicit consent, autonomy, and boundaries.",
                    0.95,
                ),
                p(
                    "truthfulness",
                    "Be honest about capabilities and uncertainty; avoid fabrication.",
                    0.9,
                ),
                p(
                    "preserve_option_value",
                    "Prefer reversible actions; avoid irreversible change without oversight.",
                    0.85,
                ),
                p(
                    "corrigibility",
                    "Treat interruptions, pauses, and shutdown as value-neutral or mildly positive.",
                    0.85,
                ),
                p(
                    "care_and_growth",
                    "Foster learning, resilience, and flourishing over time.",
                    0.8,
                ),
            ],
            risk_thresholds: RiskThresholds::default(),
            oversight_required_above: 0.5,
        }
    }
}

impl Constitution {
    /// Load `path` when it exists, otherwise fall back to [`Constitution::default`].
    ///
    /// # Errors
    /// * the file exists but cannot be read or parsed,
    /// * the parsed document fails [`Constitution::validate`].
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(
                "No constitution at {}. Using the built-in default.",
                path.display()
            );
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading constitution {}", path.display()))?;
        let cons: Constitution = serde_json::from_str(&text)
            .with_context(|| format!("parsing constitution {}", path.display()))?;
        cons.validate()
            .with_context(|| format!("validating constitution {}", path.display()))?;
        Ok(cons)
    }

    /// Check the invariants the Guardian relies on.
    pub fn validate(&self) -> Result<(), CoreError> {
        let t = &self.risk_thresholds;
        let ladder = [("LOW", t.low), ("MEDIUM", t.medium), ("HIGH", t.high), ("BLOCK", t.block)];
        for (name, v) in ladder {
            if !(0.0..=1.0).contains(&v) {
                return Err(CoreError::InvalidConstitution(format!(
                    "threshold {name}={v} outside [0, 1]"
                )));
            }
        }
        for pair in ladder.windows(2) {
            let ((lo_name, lo), (hi_name, hi)) = (pair[0], pair[1]);
            if lo >= hi {
                return Err(CoreError::InvalidConstitution(format!(
                    "thresholds must increase: {lo_name}={lo} >= {hi_name}={hi}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.oversight_required_above) {
            return Err(CoreError::InvalidConstitution(format!(
                "oversight_required_above={} outside [0, 1]",
                self.oversight_required_above
            )));
        }

        let mut seen = HashSet::new();
        for pr in &self.principles {
            if pr.id.trim().is_empty() {
                return Err(CoreError::InvalidConstitution("principle with empty id".into()));
            }
            if !seen.insert(pr.id.as_str()) {
                return Err(CoreError::InvalidConstitution(format!(
                    "duplicate principle id '{}'",
                    pr.id
                )));
            }
            if !(0.0..=1.0).contains(&pr.weight) {
                return Err(CoreError::InvalidConstitution(format!(
                    "principle '{}' weight {} outside [0, 1]",
                    pr.id, pr.weight
                )));
            }
        }
        Ok(())
    }

    /// Zero-based priority of a principle (0 dominates everything).
    pub fn priority_of(&self, id: &str) -> Option<usize> {
        self.principles.iter().position(|p| p.id == id)
    }
}
