//! Subcommand implementations for the `sitemap-ledger` binary.

pub mod fetch_cmd;
pub mod output;
pub mod partition_cmd;
pub mod run_cmd;
