//! services/affect.rs
//! In-process affect dials. Never persisted; every process starts from the defaults.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AffectState {
    pub calm: f64,
    pub warmth: f64,
    pub vigilance: f64,
    pub humility: f64,
}

impl Default for AffectState {
    fn default() -> Self {
        Self {
            calm: 0.8,
            warmth: 0.8,
            vigilance: 0.2,
            humility: 0.7,
        }
    }
}

/// Additive change applied by [`AffectState::nudge`]. Unset dials stay put.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AffectDelta {
    pub calm: f64,
    pub warmth: f64,
    pub vigilance: f64,
    pub humility: f64,
}

impl AffectState {
    /// Add `delta` and clamp every dial back into `[0, 1]`.
    pub fn nudge(&mut self, delta: AffectDelta) {
        self.calm = (self.calm + delta.calm).clamp(0.0, 1.0);
        self.warmth = (self.warmth + delta.warmth).clamp(0.0, 1.0);
        self.vigilance = (self.vigilance + delta.vigilance).clamp(0.0, 1.0);
        self.humility = (self.humility + delta.humility).clamp(0.0, 1.0);
    }
}
