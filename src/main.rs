//! openapi-from-go - command-line tool for generating OpenAPI documents from Go structs.
//!
//! # Usage
//!
//! Generate a document:
//! ```bash
//! openapi-from-go --config api.yml --go-file models.go -o openapi.json
//! ```
//!
//! Re-validate a config every time it is saved:
//! ```bash
//! openapi-from-go --watcher api.yml
//! ```
//!
//! Enable verbose logging with `-v`, or set `RUST_LOG`.

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_go::cli;

fn main() -> Result<()> {
    // Parse once up front so the verbose flag can configure the logger
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("openapi-from-go starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("Done");

    Ok(())
}
