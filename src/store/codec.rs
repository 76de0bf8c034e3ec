//! Store codec - Read/write the JSON Lines data file
//!
//! The data file holds one JSON object per entry: `{"key": ..., "value": ...}`.
//! Blank lines are skipped on read. Writes land in a sibling temporary file
//! that is renamed onto the target, so a crash mid-write leaves the previous
//! file intact and a concurrent reader never observes a half-written file.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::errors::{Result, StoreError};

/// A single key-value entry as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
}

/// Read all entries from the data file at `path`
///
/// Fails with [`StoreError::Corrupt`] on the first line that does not decode
/// as an entry, and with [`StoreError::Io`] on filesystem-level failures.
pub fn read_entries<K, V>(path: &Path) -> Result<Vec<Entry<K, V>>>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
{
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| StoreError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line)
            .map_err(|e| StoreError::corrupt(path, idx + 1, e))?;
        entries.push(entry);
    }

    Ok(entries)
}

/// Write `entries` to the data file at `path`, replacing previous content
///
/// Content goes to `<file>.tmp` next to the target first; the rename onto
/// `path` is what makes the replacement atomic from a reader's point of view.
pub fn write_entries<'a, K, V, I>(path: &Path, entries: I) -> Result<()>
where
    K: Serialize + 'a,
    V: Serialize + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;

    for (key, value) in entries {
        let json = serde_json::to_string(&Entry { key, value })
            .map_err(|e| StoreError::io(&tmp, e.into()))?;
        writeln!(file, "{}", json).map_err(|e| StoreError::io(&tmp, e))?;
    }

    drop(file);
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;

    Ok(())
}

/// Sibling temporary file for `path` (`store.jsonl` -> `store.jsonl.tmp`)
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("store"));
    name.push(".tmp");
    path.with_file_name(name)
}
