//! kvstash - a small file-backed key-value store
//!
//! kvstash keeps a mapping in memory, loads it from a single data file when
//! opened, and writes it back in full on [`Cache::flush`] (or on every
//! mutation when autosync is on). The data file is JSON Lines: one
//! `{"key": ..., "value": ...}` object per entry.
//!
//! The library carries the whole contract; the `kvstash` binary is a thin
//! CLI over it for shell use.

pub mod cli;
pub mod errors;
pub mod store;

pub use errors::{Result, StoreError};
pub use store::{Cache, DEFAULT_STORE_FILE};
