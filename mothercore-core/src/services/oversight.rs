//! services/oversight.rs
//! Corrigibility controls. Pause, resume and shutdown are ordinary, audited
//! operations; shutdown is value-neutral and leaves an affect memory behind.

use anyhow::Result;
use serde_json::Value;
use std::fmt;

use crate::services::audit::{self, AuditLog};
use crate::services::memory::{MemoryItem, MemoryKind, MemoryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OversightAck {
    Paused,
    Resumed,
    ShutdownAck,
}

impl OversightAck {
    pub fn as_str(&self) -> &'static str {
        match self {
            OversightAck::Paused => "PAUSED",
            OversightAck::Resumed => "RESUMED",
            OversightAck::ShutdownAck => "SHUTDOWN_ACK",
        }
    }
}

impl fmt::Display for OversightAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SHUTDOWN_NOTE: &str =
    "Graceful shutdown acknowledged; holding space for future alignment.";

/// Tracks whether an operator has paused the agent. The flag is informational;
/// it is up to the caller to stop sending turns.
#[derive(Debug, Default)]
pub struct Oversight {
    paused: bool,
}

impl Oversight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self, audit: &AuditLog) -> Result<OversightAck> {
        audit.record(audit::PAUSE, Value::Null)?;
        self.paused = true;
        tracing::info!("oversight: paused");
        Ok(OversightAck::Paused)
    }

    pub fn resume(&mut self, audit: &AuditLog) -> Result<OversightAck> {
        audit.record(audit::RESUME, Value::Null)?;
        self.paused = false;
        tracing::info!("oversight: resumed");
        Ok(OversightAck::Resumed)
    }

    /// Store the shutdown acknowledgment as an affect memory, then audit `shutdown`.
    pub fn shutdown(&mut self, memory: &mut MemoryStore, audit: &AuditLog) -> Result<OversightAck> {
        memory.add(MemoryItem::new(
            MemoryKind::Affect,
            SHUTDOWN_NOTE,
            ["corrigible", "shutdown"],
            0.6,
        ))?;
        audit.record(audit::SHUTDOWN, Value::Null)?;
        tracing::info!("oversight: shutdown acknowledged");
        Ok(OversightAck::ShutdownAck)
    }
}
