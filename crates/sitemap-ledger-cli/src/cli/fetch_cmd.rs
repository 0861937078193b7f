//! `sitemap-ledger fetch <url>`: dry run of the fetch and date stages.

use std::path::Path;

use anyhow::Result;
use sitemap_ledger::config::HttpConfig;
use sitemap_ledger::date::NormalizedEntry;
use sitemap_ledger::fetch::HttpTransport;
use sitemap_ledger::sitemap::SitemapFetcher;
use sitemap_ledger::Config;
use tracing::debug;

use crate::cli::output::{self, Styled};

/// Fetch one sitemap and print its normalised entries.
///
/// Only the `[http]` table of the config file is read, and only when the
/// file exists; the rest of the run configuration is not validated.
pub async fn run(config_path: &Path, url: &str, limit: Option<usize>) -> Result<u8> {
    let http = if config_path.exists() {
        Config::load_http(config_path)?
    } else {
        debug!(path = %config_path.display(), "no config file, using default HTTP settings");
        HttpConfig::default()
    };
    let transport = HttpTransport::new(&http)?;

    let entries = SitemapFetcher::new(&transport).fetch(url, limit).await?;
    let rows = entries
        .into_iter()
        .map(|entry| {
            let raw = entry.raw_date.clone();
            NormalizedEntry::from_entry(entry).map(|n| (n, raw))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if output::is_json() {
        let items: Vec<_> = rows
            .iter()
            .map(|(n, raw)| {
                serde_json::json!({
                    "url": n.url,
                    "lastmod": raw,
                    "date": n.isoformat(),
                })
            })
            .collect();
        output::print_json(&serde_json::json!({
            "sitemap": url,
            "count": items.len(),
            "entries": items,
        }));
        return Ok(0);
    }

    for (n, _) in &rows {
        println!("{}\t{}", n.isoformat(), n.url);
    }
    if !output::is_quiet() {
        let s = Styled::new();
        eprintln!();
        eprintln!("  {} {} entries from {url}", s.ok_sym(), rows.len());
    }
    Ok(0)
}
