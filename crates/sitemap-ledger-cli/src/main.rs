//! `sitemap-ledger` command-line entry point.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sitemap_ledger::config::DEFAULT_CONFIG_PATH;
use sitemap_ledger::LedgerError;
use tracing_subscriber::EnvFilter;

use crate::cli::output::{self, Styled};

#[derive(Parser)]
#[command(
    name = "sitemap-ledger",
    version,
    about = "Harvest sitemap URLs into a first-seen ledger and per-date CSV exports"
)]
struct Cli {
    /// Configuration file.
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print machine-readable JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Only print errors.
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Emit log events as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every configured sitemap, update the master and the date files.
    Run,
    /// Fetch and flatten one sitemap and print its entries. Writes nothing.
    Fetch {
        /// Sitemap or sitemap index URL.
        url: String,
        /// Maximum number of child sitemaps to read from an index.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,
    },
    /// Regenerate the per-date files from the existing master record.
    Partition,
}

fn init_tracing(quiet: bool, json: bool) {
    let default = if quiet {
        "sitemap_ledger=warn"
    } else {
        "sitemap_ledger=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    output::set_mode(cli.json, cli.quiet);
    init_tracing(cli.quiet, cli.log_json);

    let result = match cli.command {
        Command::Run => cli::run_cmd::run(&cli.config).await,
        Command::Fetch { url, limit } => {
            cli::fetch_cmd::run(&cli.config, &url, limit.map(|l| l as usize)).await
        }
        Command::Partition => cli::partition_cmd::run(&cli.config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            let code = e.downcast_ref::<LedgerError>().map_or(1, LedgerError::exit_code);
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "error": e.downcast_ref::<LedgerError>().map_or("other", LedgerError::kind),
                    "message": format!("{e:#}"),
                }));
            } else {
                let s = Styled::new();
                eprintln!("  {} {e:#}", s.fail_sym());
            }
            ExitCode::from(code)
        }
    }
}
