//! patch-sieve command-line driver.
//! Runs the library against on-disk fragment/table dumps and prints JSON.
//!
//! | Command | Output |
//! |---------|--------|
//! | `patch-sieve patches <dir> <id>` | classified records, newest first |
//! | `patch-sieve report <dir> <id>` | every record with its exclusion label + counts |
//! | `patch-sieve match <name>` | ranked owner candidates |
//! | `patch-sieve items <dir> <owner>` | one owner's cosmetic items |
//! | `patch-sieve stats <dir>` | cosmetic catalog statistics |

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use patch_sieve::config::AppConfig;
use patch_sieve::service::PatchService;
use patch_sieve::source::{DirectorySource, StaticSource};

#[derive(Parser, Debug)]
#[command(name = "patch-sieve")]
#[command(about = "Filter champion patch notes and attribute cosmetic items")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Gameplay-significant records of one page
    Patches { dir: PathBuf, id: String },
    /// Inclusion status and exclusion label of every record of one page
    Report { dir: PathBuf, id: String },
    /// Rank catalog entities as owners of an item name
    Match { name: String },
    /// Cosmetic items attributed to one owner
    Items { dir: PathBuf, owner: String },
    /// Cosmetic catalog statistics
    Stats {
        dir: PathBuf,
        /// Count classic/original default items too
        #[arg(long)]
        include_defaults: bool,
    },
}

/// Logs go to stderr so stdout stays machine-readable.
/// `RUST_LOG` wins; `PATCH_SIEVE_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("patch_sieve=info,warn"));
    let json = std::env::var("PATCH_SIEVE_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{out}");
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let service = |dir: &PathBuf| PatchService::from_config(Arc::new(DirectorySource::new(dir)), &config);

    match cli.command {
        Command::Patches { dir, id } => print_json(&service(&dir)?.patches(&id)?),
        Command::Report { dir, id } => print_json(&service(&dir)?.classification_report(&id)?),
        Command::Match { name } => {
            let svc = PatchService::from_config(Arc::new(StaticSource::new()), &config)?;
            print_json(&svc.match_item(&name))
        }
        Command::Items { dir, owner } => print_json(&service(&dir)?.items_for(&owner)?),
        Command::Stats {
            dir,
            include_defaults,
        } => print_json(&service(&dir)?.catalog_stats(include_defaults)?),
    }
}

fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "patch-sieve failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
