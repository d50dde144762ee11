// src/utils/logbook.rs
//! Append-only JSONL record store.
//!
//! - One JSON object per line; `append` never rewrites or reorders earlier lines.
//! - Every append is a single write followed by a data sync.
//! - `iter` replays lazily in append order and silently skips lines that do not
//!   deserialize (a torn trailing write must not hide the valid prefix).
//!
//! There is no locking. Two writers appending to the same file at once is unsafe;
//! callers that go multi-threaded must funnel appends through one owner.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Split, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Durable, append-only log of JSON records backed by a single file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Bind a store to `path`. Nothing touches the disk until the first append.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `record` and append it as one line.
    ///
    /// Creates the parent directory and the file on first use.
    pub fn append<T: Serialize + ?Sized>(&self, record: &T) -> Result<()> {
        let mut line = serde_json::to_string(record).context("serialize record")?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create_dir_all({:?})", parent))?;
            }
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {:?} for append", self.path))?;
        f.write_all(line.as_bytes())
            .with_context(|| format!("append to {:?}", self.path))?;
        f.sync_data()
            .with_context(|| format!("sync {:?}", self.path))?;
        Ok(())
    }

    /// Lazily replay every well-formed record in append order.
    ///
    /// A missing file replays as empty. Only failing to open an existing file is an error.
    pub fn iter<T: DeserializeOwned>(&self) -> Result<Records<T>> {
        let lines = match File::open(&self.path) {
            Ok(f) => Some(BufReader::new(f).split(b'\n')),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e).with_context(|| format!("open {:?}", self.path)),
        };
        Ok(Records {
            path: self.path.clone(),
            lines,
            line_no: 0,
            _marker: PhantomData,
        })
    }
}

/// Iterator returned by [`RecordStore::iter`].
pub struct Records<T> {
    path: PathBuf,
    lines: Option<Split<BufReader<File>>>,
    line_no: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Iterator for Records<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            let next = self.lines.as_mut()?.next()?;
            self.line_no += 1;
            let bytes = match next {
                Ok(bytes) => bytes,
                Err(err) => {
                    // A read error is not a malformed record; stop instead of spinning on it.
                    tracing::warn!(path = ?self.path, line = self.line_no, %err, "record replay stopped");
                    self.lines = None;
                    return None;
                }
            };
            if bytes.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<T>(&bytes) {
                Ok(record) => return Some(record),
                Err(err) => {
                    tracing::debug!(path = ?self.path, line = self.line_no, %err, "skipping malformed record");
                }
            }
        }
    }
}
