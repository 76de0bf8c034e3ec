//! kvstash - a file-backed key-value store for the command line
//!
//! kvstash provides:
//! - get/set/del on a single JSON Lines data file
//! - len and dump for inspection
//! - JSON output, one object per line where a command emits entries

use anyhow::Result;
use clap::Parser;

use kvstash::cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
