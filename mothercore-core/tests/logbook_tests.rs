use std::fs::{self, OpenOptions};
use std::io::Write;

use serde::{Deserialize, Serialize};

use mothercore_core::utils::RecordStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    n: u32,
    label: String,
    weight: f64,
    tags: Vec<String>,
}

fn entry(n: u32, label: &str) -> Entry {
    Entry {
        n,
        label: label.to_string(),
        weight: n as f64 / 10.0,
        tags: vec![format!("t{n}")],
    }
}

#[test]
fn missing_file_replays_as_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = RecordStore::open(dir.path().join("nothing_here.jsonl"));
    let all: Vec<Entry> = store.iter().expect("iter").collect();
    assert!(all.is_empty());
}

#[test]
fn appended_records_replay_in_order_with_exact_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = RecordStore::open(dir.path().join("log.jsonl"));
    let written = vec![entry(1, "first"), entry(2, "second, ünïcode"), entry(3, "third")];
    for e in &written {
        store.append(e).expect("append");
    }

    let replayed: Vec<Entry> = store.iter().expect("iter").collect();
    assert_eq!(replayed, written);
}

#[test]
fn append_creates_missing_parent_dirs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("deeper").join("log.jsonl");
    let store = RecordStore::open(&path);
    store.append(&entry(7, "x")).expect("append");
    assert!(path.exists());
}

#[test]
fn earlier_lines_are_never_rewritten() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("log.jsonl");
    let store = RecordStore::open(&path);

    store.append(&entry(1, "a")).expect("append 1");
    let before = fs::read_to_string(&path).expect("read");
    store.append(&entry(2, "b")).expect("append 2");
    let after = fs::read_to_string(&path).expect("read");

    assert!(after.starts_with(&before), "prefix must be preserved byte-for-byte");
    assert_eq!(after.lines().count(), 2);
}

#[test]
fn malformed_blank_and_torn_lines_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("log.jsonl");
    let store = RecordStore::open(&path);

    store.append(&entry(1, "ok-1")).expect("append");
    {
        let mut f = OpenOptions::new().append(true).open(&path).expect("open");
        f.write_all(b"this is not json\n").unwrap();
        f.write_all(b"\n   \n").unwrap();
        f.write_all(b"{\"n\": \"wrong type\", \"label\": 1}\n").unwrap();
        f.write_all(&[0xff, 0xfe, b'\n']).unwrap();
    }
    store.append(&entry(2, "ok-2")).expect("append");
    {
        // Simulate a crash mid-append: no closing brace, no newline.
        let mut f = OpenOptions::new().append(true).open(&path).expect("open");
        f.write_all(b"{\"n\": 3, \"lab").unwrap();
    }

    let replayed: Vec<Entry> = store.iter().expect("iter").collect();
    assert_eq!(replayed, vec![entry(1, "ok-1"), entry(2, "ok-2")]);
}

#[test]
fn replay_is_lazy_and_restartable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = RecordStore::open(dir.path().join("log.jsonl"));
    for n in 0..5 {
        store.append(&entry(n, "e")).expect("append");
    }

    let first_two: Vec<Entry> = store.iter().expect("iter").take(2).collect();
    assert_eq!(first_two.len(), 2);
    assert_eq!(first_two[1].n, 1);

    let again: Vec<Entry> = store.iter().expect("iter").collect();
    assert_eq!(again.len(), 5);
}
