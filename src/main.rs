//! # RISE Processor Entry Point
//!
//! Command-line front end over [`rise_processor`]. Each subcommand builds one
//! job, runs it, and prints the run summary plus the files written.
//!
//! ```bash
//! rise-processor contact-actions actions.csv --output-dir exports
//! rise-processor pipeline-instances pipeline.xlsx --people people.xlsx
//! rise-processor run --spec nightly.json --no-open
//! ```
//!
//! Set `RUST_LOG=info` to see per-stage progress.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Allow println! in main binary

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    env_logger::init();

    let cli = cli::Cli::parse();
    cli::run(cli)
}
