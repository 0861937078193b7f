//! `sitemap-ledger partition`: rebuild the per-date files from the master.

use std::path::Path;

use anyhow::{bail, Context, Result};
use sitemap_ledger::partition;
use sitemap_ledger::Config;

use crate::cli::output::{self, Styled};

pub fn run(config_path: &Path) -> Result<u8> {
    let config = Config::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let master = config.master_path();
    if !master.exists() {
        bail!(
            "no master record at {}; run `sitemap-ledger run` first",
            master.display()
        );
    }

    let summary = partition::partition(&master, config.partition_dir())?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "master": master.display().to_string(),
            "output_dir": config.partition_dir().display().to_string(),
            "files": summary.files,
            "urls": summary.urls,
        }));
    } else if !output::is_quiet() {
        let s = Styled::new();
        eprintln!(
            "  {} Wrote {} date file(s) ({} URLs) to {}",
            s.ok_sym(),
            summary.files,
            summary.urls,
            config.partition_dir().display()
        );
    }
    Ok(0)
}
