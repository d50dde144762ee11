// src/services/memory.rs
//! Append-only memory store.
//!
//! - Durable side: one [`RecordStore`] (JSONL), written only by [`MemoryStore::add`].
//! - Read side: an in-memory cache filled once, on first access, from the file.
//!   The cell moves uninitialized → loaded exactly once and is never reset.
//! - Items are immutable: no update, no delete.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

use crate::services::audit::{self, AuditLog};
use crate::utils::clock;
use crate::utils::logbook::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Episodic,
    Semantic,
    Affect,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Episodic => "episodic",
            MemoryKind::Semantic => "semantic",
            MemoryKind::Affect => "affect",
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: String,
    pub kind: MemoryKind,
    pub content: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub importance: f64,
    #[serde(with = "clock::iso_seconds")]
    pub created_at: DateTime<Utc>,
}

impl MemoryItem {
    /// Fresh item stamped now, with a new short id. `importance` is clamped to `[0, 1]`;
    /// NaN becomes 0.
    pub fn new<I, S>(kind: MemoryKind, content: impl Into<String>, tags: I, importance: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: clock::short_id(),
            kind,
            content: content.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            importance: if importance.is_nan() { 0.0 } else { importance.clamp(0.0, 1.0) },
            created_at: clock::now(),
        }
    }

    fn is_well_formed(&self) -> bool {
        !self.id.is_empty() && (0.0..=1.0).contains(&self.importance)
    }
}

/// Memory items over an append-only file, with a lazily loaded cache.
pub struct MemoryStore {
    store: RecordStore,
    audit: AuditLog,
    cache: OnceCell<Vec<MemoryItem>>,
}

impl MemoryStore {
    /// Bind to the JSONL file at `path`. Loading is deferred to the first read or add.
    pub fn open(path: impl AsRef<Path>, audit: AuditLog) -> Self {
        Self {
            store: RecordStore::open(path.as_ref()),
            audit,
            cache: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    fn items(&self) -> Result<&Vec<MemoryItem>> {
        self.cache.get_or_try_init(|| self.load())
    }

    fn load(&self) -> Result<Vec<MemoryItem>> {
        let mut items = Vec::new();
        let mut skipped = 0usize;
        for item in self.store.iter::<MemoryItem>()? {
            if item.is_well_formed() {
                items.push(item);
            } else {
                skipped += 1;
            }
        }
        tracing::debug!(
            path = ?self.store.path(),
            loaded = items.len(),
            skipped,
            "memory cache loaded"
        );
        Ok(items)
    }

    /// Persist `item`, then cache it, then audit `{type: memory_add, id, kind, tags}`.
    ///
    /// Once this returns `Ok`, a fresh store on the same file will see the item.
    ///
    /// # Errors
    /// * the item has an empty id or an importance outside `[0, 1]` (NaN included);
    ///   such an item would not survive a reload, so nothing is written.
    /// * the append or the audit record fails.
    pub fn add(&mut self, item: MemoryItem) -> Result<()> {
        if !item.is_well_formed() {
            bail!(
                "refusing malformed memory item (id={:?}, importance={})",
                item.id,
                item.importance
            );
        }
        self.items()?;
        self.store.append(&item)?;
        let details = json!({ "id": item.id, "kind": item.kind, "tags": item.tags });
        if let Some(cache) = self.cache.get_mut() {
            cache.push(item);
        }
        self.audit.record(audit::MEMORY_ADD, details)?;
        Ok(())
    }

    /// Token-overlap retrieval.
    ///
    /// # Arguments
    /// * `query` - Free text; lower-cased and whitespace-split into a token set.
    /// * `k` - Maximum number of hits.
    /// * `tags` - Required tags; an item must carry all of them. Empty means no filter.
    ///
    /// # Returns
    /// Up to `k` items by `overlap / (1 + |query tokens|) + importance * 0.5`, highest first.
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &str, k: usize, tags: &[&str]) -> Result<Vec<&MemoryItem>> {
        let q = tokens(query);
        let mut scored: Vec<(f64, &MemoryItem)> = self
            .items()?
            .iter()
            .filter(|m| tags.iter().all(|t| m.tags.contains(*t)))
            .map(|m| {
                let overlap = q.intersection(&tokens(&m.content)).count();
                let score = overlap as f64 / (1.0 + q.len() as f64) + m.importance * 0.5;
                (score, m)
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored.into_iter().take(k).map(|(_, m)| m).collect())
    }

    /// The `k` newest items by `created_at`; equal stamps keep insertion order.
    pub fn recent(&self, k: usize) -> Result<Vec<&MemoryItem>> {
        let mut items: Vec<&MemoryItem> = self.items()?.iter().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(k);
        Ok(items)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.items()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.items()?.is_empty())
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
