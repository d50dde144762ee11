// mothercore-core/src/commands/init.rs

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::CoreConfig;

#[derive(Debug, Clone)]
pub struct InitReport {
    pub root: PathBuf,
    pub created: Vec<String>,
    pub existed: Vec<String>,
}

/// Resolve the data root. Allow override via MOTHERCORE_ROOT (tests/venvs).
pub fn mothercore_root() -> PathBuf {
    std::env::var_os("MOTHERCORE_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".mothercore"))
}

/// Ensure the data root and the configured plans dir exist (idempotent). Safe to call often.
///
/// Only directories are created here. Log files appear on first append, and the
/// constitution is never written: an absent file means "use the built-in default".
pub fn ensure_initialized(root: &Path, config: &CoreConfig) -> Result<InitReport> {
    let mut created = Vec::new();
    let mut existed = Vec::new();

    ensure_dir(root, root, &mut created, &mut existed)?;
    ensure_dir(root, &config.plans.dir, &mut created, &mut existed)?;

    Ok(InitReport {
        root: root.to_path_buf(),
        created,
        existed,
    })
}

/// Labels are relative to `root` when possible (`"."` for the root itself).
fn ensure_dir(
    root: &Path,
    p: &Path,
    created: &mut Vec<String>,
    existed: &mut Vec<String>,
) -> Result<()> {
    let label = match p.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.display().to_string(),
        Err(_) => p.display().to_string(),
    };
    if p.exists() {
        existed.push(label);
        return Ok(());
    }
    fs::create_dir_all(p).with_context(|| format!("create_dir_all({:?})", p))?;
    created.push(label);
    Ok(())
}

/// Write `bytes` to a sibling temp file, then rename over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create_dir_all({:?})", parent))?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut f = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)
            .with_context(|| format!("open temp file {:?}", tmp))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("rename {:?} -> {:?}", tmp, path))?;
    Ok(())
}
