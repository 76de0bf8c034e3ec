//! Store module - The persistent key-value mapping
//!
//! Provides:
//! - The [`Cache`] type (in-memory mapping, whole-file persistence)
//! - The JSON Lines codec for the data file

pub mod cache;
pub mod codec;

pub use cache::{Cache, DEFAULT_STORE_FILE};
