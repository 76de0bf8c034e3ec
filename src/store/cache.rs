//! The Cache type - an in-memory mapping with whole-file persistence

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::{Result, StoreError};
use crate::store::codec;

/// Data file name used by [`Cache::open_default`]
pub const DEFAULT_STORE_FILE: &str = "datastore.jsonl";

/// An in-memory key-value mapping backed by a single data file
///
/// Opening a cache reads the whole file at `path` into memory; [`Cache::flush`]
/// writes the whole mapping back. With autosync on, every mutation flushes
/// before returning, so the file always reflects the mapping.
///
/// All I/O is blocking and there is no internal locking: a cache instance is
/// single-owner, and two processes flushing to the same path race
/// last-writer-wins.
#[derive(Debug)]
pub struct Cache<K, V> {
    path: PathBuf,
    autosync: bool,
    data: HashMap<K, V>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    /// Open a cache backed by `path`, with autosync off
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        Self::open_with(path, false)
    }

    /// Open a cache backed by `path`
    ///
    /// A missing or zero-length file yields an empty cache; a non-empty file
    /// that does not decode fails with [`StoreError::Corrupt`] and no cache
    /// is returned.
    pub fn open_with<P: Into<PathBuf>>(path: P, autosync: bool) -> Result<Self> {
        let mut cache = Self {
            path: path.into(),
            autosync,
            data: HashMap::new(),
        };
        cache.load()?;
        Ok(cache)
    }

    /// Open a cache backed by [`DEFAULT_STORE_FILE`] in the current directory
    pub fn open_default() -> Result<Self> {
        Self::open(DEFAULT_STORE_FILE)
    }

    /// Look up the value stored for `key`
    ///
    /// Fails with [`StoreError::KeyNotFound`] when the key is absent.
    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.get(key).ok_or(StoreError::KeyNotFound)
    }

    /// Insert or overwrite the entry for `key`
    ///
    /// With autosync on, the store is flushed as part of this call.
    pub fn set(&mut self, key: K, value: V) -> Result<()> {
        self.data.insert(key, value);
        if self.autosync {
            self.flush()?;
        }
        Ok(())
    }

    /// Remove the entry for `key`
    ///
    /// Removing an absent key fails with [`StoreError::KeyNotFound`] rather
    /// than silently doing nothing. With autosync on, the store is flushed
    /// afterward.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.remove(key).ok_or(StoreError::KeyNotFound)?;
        if self.autosync {
            self.flush()?;
        }
        Ok(())
    }

    /// Number of entries in the store
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.data.iter()
    }

    /// The data file backing this cache
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether mutations flush automatically
    pub fn autosync(&self) -> bool {
        self.autosync
    }

    /// Turn autosync on or off
    pub fn set_autosync(&mut self, autosync: bool) {
        self.autosync = autosync;
    }

    /// Replace the in-memory mapping with the data file's content
    ///
    /// A missing or zero-length file leaves the cache empty; that is the
    /// "start empty" case, not an error. A non-empty file that does not
    /// decode fails with [`StoreError::Corrupt`], filesystem failures with
    /// [`StoreError::Io`].
    pub fn load(&mut self) -> Result<()> {
        self.data.clear();

        let meta = match fs::metadata(&self.path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        if meta.is_file() && meta.len() == 0 {
            return Ok(());
        }

        for entry in codec::read_entries(&self.path)? {
            self.data.insert(entry.key, entry.value);
        }

        Ok(())
    }

    /// Write the entire mapping to the data file
    ///
    /// The previous file content is replaced atomically (temp file plus
    /// rename), so a crash mid-flush leaves the old file readable.
    pub fn flush(&self) -> Result<()> {
        codec::write_entries(&self.path, self.data.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    fn open_at(path: &Path) -> Cache<String, Value> {
        Cache::open(path).unwrap()
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let temp = tempdir().unwrap();
        let cache = open_at(&temp.path().join("absent.jsonl"));
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_file_starts_empty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("empty.jsonl");
        fs::write(&path, "").unwrap();

        let cache = open_at(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_after_set() {
        let temp = tempdir().unwrap();
        let mut cache = open_at(&temp.path().join("t.jsonl"));

        cache.set("greeting".to_string(), json!("hello")).unwrap();
        assert_eq!(cache.get("greeting").unwrap(), &json!("hello"));
    }

    #[test]
    fn test_set_overwrites() {
        let temp = tempdir().unwrap();
        let mut cache = open_at(&temp.path().join("t.jsonl"));

        cache.set("k".to_string(), json!(1)).unwrap();
        cache.set("k".to_string(), json!(2)).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k").unwrap(), &json!(2));
    }

    #[test]
    fn test_get_unknown_key_fails() {
        let temp = tempdir().unwrap();
        let cache = open_at(&temp.path().join("t.jsonl"));
        assert!(matches!(
            cache.get("nothing"),
            Err(StoreError::KeyNotFound)
        ));
    }

    #[test]
    fn test_remove_unknown_key_fails() {
        let temp = tempdir().unwrap();
        let mut cache = open_at(&temp.path().join("t.jsonl"));
        assert!(matches!(
            cache.remove("nothing"),
            Err(StoreError::KeyNotFound)
        ));
    }

    #[test]
    fn test_removed_key_is_gone() {
        let temp = tempdir().unwrap();
        let mut cache = open_at(&temp.path().join("t.jsonl"));

        cache.set("k".to_string(), json!(1)).unwrap();
        cache.remove("k").unwrap();
        assert!(matches!(cache.get("k"), Err(StoreError::KeyNotFound)));
        assert!(matches!(cache.remove("k"), Err(StoreError::KeyNotFound)));
    }

    #[test]
    fn test_session_scenario() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("t.dat");

        let mut cache = open_at(&path);
        cache.set("a".to_string(), json!(1)).unwrap();
        cache.set("b".to_string(), json!("x")).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a").unwrap(), &json!(1));

        cache.remove("a").unwrap();
        assert!(matches!(cache.get("a"), Err(StoreError::KeyNotFound)));
        assert_eq!(cache.len(), 1);
        cache.flush().unwrap();

        let reopened = open_at(&path);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("b").unwrap(), &json!("x"));
    }

    #[test]
    fn test_flush_roundtrip() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("t.jsonl");

        let mut cache = open_at(&path);
        cache.set("num".to_string(), json!(42)).unwrap();
        cache.set("text".to_string(), json!("hello")).unwrap();
        cache
            .set("obj".to_string(), json!({"a": [1, 2, 3]}))
            .unwrap();
        cache.flush().unwrap();

        let reopened = open_at(&path);
        assert_eq!(reopened.len(), 3);
        assert_eq!(reopened.get("num").unwrap(), &json!(42));
        assert_eq!(reopened.get("text").unwrap(), &json!("hello"));
        assert_eq!(reopened.get("obj").unwrap(), &json!({"a": [1, 2, 3]}));
    }

    #[test]
    fn test_typed_keys_and_values() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("typed.jsonl");

        let mut cache: Cache<u32, String> = Cache::open(&path).unwrap();
        cache.set(7, "seven".to_string()).unwrap();
        cache.flush().unwrap();

        let reopened: Cache<u32, String> = Cache::open(&path).unwrap();
        assert_eq!(reopened.get(&7).unwrap(), "seven");
    }

    #[test]
    fn test_autosync_persists_without_flush() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("t2.dat");

        let mut cache: Cache<String, Value> = Cache::open_with(&path, true).unwrap();
        cache.set("k".to_string(), json!("v")).unwrap();

        // no explicit flush: the file must already hold the entry
        let reopened = open_at(&path);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("k").unwrap(), &json!("v"));
    }

    #[test]
    fn test_autosync_remove_persists() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("t.jsonl");

        let mut cache: Cache<String, Value> = Cache::open_with(&path, true).unwrap();
        cache.set("k".to_string(), json!("v")).unwrap();
        cache.remove("k").unwrap();

        let reopened = open_at(&path);
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_autosync_toggle() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("t.jsonl");

        let mut cache = open_at(&path);
        assert!(!cache.autosync());
        cache.set("k".to_string(), json!(1)).unwrap();
        assert!(!path.exists());

        cache.set_autosync(true);
        cache.set("j".to_string(), json!(2)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_fails_open() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("garbage.jsonl");
        fs::write(&path, "not a serialized mapping").unwrap();

        let err = Cache::<String, Value>::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_path_is_directory_fails_open() {
        let temp = tempdir().unwrap();

        let err = Cache::<String, Value>::open(temp.path()).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_flush_to_unwritable_path_fails() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("missing-dir").join("t.jsonl");

        let mut cache: Cache<String, Value> = Cache::open(&path).unwrap();
        cache.set("k".to_string(), json!(1)).unwrap();
        let err = cache.flush().unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_load_discards_in_memory_state() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("t.jsonl");

        let mut cache = open_at(&path);
        cache.set("kept".to_string(), json!(1)).unwrap();
        cache.flush().unwrap();

        cache.set("unflushed".to_string(), json!(2)).unwrap();
        cache.load().unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("kept").is_ok());
        assert!(matches!(
            cache.get("unflushed"),
            Err(StoreError::KeyNotFound)
        ));
    }
}
