//! services/audit.rs
//! Audit trail: one JSONL record per significant event.
//!
//! Every record carries `ts` (UTC, second precision, `Z` suffix) and `type`.
//! Anything else is event-specific and schema-free.

use anyhow::{Result, bail};
use serde_json::{Map, Value};
use std::path::Path;

use crate::utils::clock;
use crate::utils::logbook::{RecordStore, Records};

pub const MEMORY_ADD: &str = "memory_add";
pub const PAUSE: &str = "pause";
pub const RESUME: &str = "resume";
pub const SHUTDOWN: &str = "shutdown";
pub const REPLY: &str = "reply";
pub const PLAN_PROPOSED: &str = "plan_proposed";
pub const PLAN_APPROVAL: &str = "plan_approval";

/// Append-only audit log. Cheap to clone; clones share the backing file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    store: RecordStore,
}

impl AuditLog {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            store: RecordStore::open(path.as_ref()),
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Append `{ts, type, ..details}`.
    ///
    /// # Arguments
    /// * `event` - value of the `type` field (see the constants in this module).
    /// * `details` - a JSON object merged after `ts`/`type`, or `Value::Null` for none.
    ///
    /// # Errors
    /// * `details` is neither an object nor null, or it tries to override `ts`/`type`.
    /// * the append itself fails.
    pub fn record(&self, event: &str, details: Value) -> Result<()> {
        let mut entry = Map::new();
        entry.insert("ts".into(), Value::String(clock::now_iso()));
        entry.insert("type".into(), Value::String(event.to_string()));
        match details {
            Value::Null => {}
            Value::Object(fields) => {
                for (k, v) in fields {
                    if k == "ts" || k == "type" {
                        bail!("audit details may not override '{k}'");
                    }
                    entry.insert(k, v);
                }
            }
            other => bail!("audit details must be a JSON object, got {other}"),
        }
        self.store.append(&Value::Object(entry))?;
        tracing::debug!(event, "audit record appended");
        Ok(())
    }

    /// Replay every well-formed audit record in append order.
    pub fn events(&self) -> Result<Records<Value>> {
        self.store.iter()
    }
}
