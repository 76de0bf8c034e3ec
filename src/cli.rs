//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::store::{Cache, DEFAULT_STORE_FILE};

/// kvstash - a file-backed key-value store for the command line.
#[derive(Parser, Debug)]
#[command(name = "kvstash")]
#[command(
    author,
    version,
    about,
    long_about = r#"kvstash keeps a JSON Lines data file that maps keys to JSON values.

Each invocation opens the data file, applies one operation, and persists
any mutation before exiting. VALUE arguments are parsed as JSON when
possible and stored as plain strings otherwise.

Examples:
    kvstash set greeting '"hello"'
    kvstash set retries 3
    kvstash get retries
    kvstash del greeting
    kvstash len
    kvstash dump
"#
)]
pub struct Cli {
    /// Data file for all operations.
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_STORE_FILE,
        value_name = "FILE",
        long_help = "Data file for all operations (defaults to datastore.jsonl in the\n\
current directory). A missing file means an empty store; the file is\n\
created on the first mutation."
    )]
    pub store: PathBuf,

    /// Pretty-print JSON output with indentation.
    #[arg(
        long,
        global = true,
        long_help = "Pretty-print JSON output with indentation for human readability.\n\n\
Has no effect on len."
    )]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the value stored for KEY.
    #[command(
        long_about = "Print the value stored for KEY as JSON.\n\n\
Fails with \"key not found\" when the key is absent."
    )]
    Get {
        /// Key to look up.
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Store VALUE under KEY.
    #[command(
        long_about = "Store VALUE under KEY, overwriting any previous value.\n\n\
VALUE is parsed as JSON (numbers, booleans, arrays, objects, quoted\n\
strings); anything that does not parse is stored as a plain string.\n\n\
The data file is rewritten before the command returns."
    )]
    Set {
        /// Key to store under.
        #[arg(value_name = "KEY")]
        key: String,

        /// Value to store (JSON or plain string).
        #[arg(value_name = "VALUE")]
        value: String,
    },

    /// Remove KEY from the store.
    #[command(
        long_about = "Remove KEY from the store.\n\n\
Fails with \"key not found\" when the key is absent. The data file is\n\
rewritten before the command returns."
    )]
    Del {
        /// Key to remove.
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Print the number of entries in the store.
    Len,

    /// Print every entry, one JSON object per line, sorted by key.
    #[command(
        long_about = "Print every entry as a {\"key\": ..., \"value\": ...} JSON object,\n\
one per line, sorted by key for stable output."
    )]
    Dump,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Get { key } => run_get(&cli.store, &key, cli.pretty),
        Commands::Set { key, value } => run_set(&cli.store, key, &value),
        Commands::Del { key } => run_del(&cli.store, &key),
        Commands::Len => run_len(&cli.store),
        Commands::Dump => run_dump(&cli.store, cli.pretty),
    }
}

/// Open the store; mutating commands pass autosync so the file is
/// rewritten as part of the mutating call itself.
fn open_store(path: &Path, autosync: bool) -> Result<Cache<String, Value>> {
    Cache::open_with(path, autosync).with_context(|| format!("failed to open store {:?}", path))
}

fn run_get(store: &Path, key: &str, pretty: bool) -> Result<()> {
    let cache = open_store(store, false)?;
    let value = cache.get(key)?;
    println!("{}", render_value(value, pretty)?);
    Ok(())
}

fn run_set(store: &Path, key: String, value: &str) -> Result<()> {
    let mut cache = open_store(store, true)?;
    cache.set(key, parse_value(value))?;
    Ok(())
}

fn run_del(store: &Path, key: &str) -> Result<()> {
    let mut cache = open_store(store, true)?;
    cache.remove(key)?;
    Ok(())
}

fn run_len(store: &Path) -> Result<()> {
    let cache = open_store(store, false)?;
    println!("{}", cache.len());
    Ok(())
}

fn run_dump(store: &Path, pretty: bool) -> Result<()> {
    let cache = open_store(store, false)?;

    // Sorted for stability; the file itself is in map iteration order
    let mut entries: Vec<(&String, &Value)> = cache.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (key, value) in entries {
        let line = serde_json::json!({ "key": key, "value": value });
        println!("{}", render_value(&line, pretty)?);
    }

    Ok(())
}

/// Parse VALUE as JSON, falling back to a plain string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn render_value(value: &Value, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}
