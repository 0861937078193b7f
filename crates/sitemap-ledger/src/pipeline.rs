//! Per-sitemap driver: fetch → normalise → merge → partition.
//!
//! Configured sitemaps are processed one at a time, in order. A failure in
//! any stage aborts that sitemap before the master or partitions are touched,
//! is logged, and the run moves on to the next sitemap.

use std::time::Instant;

use serde::Serialize;
use tracing::{error, info};

use crate::config::Config;
use crate::date::NormalizedEntry;
use crate::error::{LedgerError, Result};
use crate::fetch::Transport;
use crate::master::{MasterRecord, MergeSummary};
use crate::partition::{self, PartitionSummary};
use crate::sitemap::SitemapFetcher;

/// What one successful sitemap run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SitemapStats {
    /// Entries produced by the fetch stage (before deduplication).
    pub fetched: usize,
    pub merge: MergeSummary,
    pub partition: PartitionSummary,
    pub duration_ms: u64,
}

/// Outcome of one configured sitemap.
#[derive(Debug)]
pub struct SitemapOutcome {
    pub sitemap_url: String,
    pub result: Result<SitemapStats>,
}

/// Outcomes of a whole run, in configuration order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<SitemapOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// 0 when every sitemap succeeded, otherwise the exit code of the first
    /// failure (see [`LedgerError::exit_code`]).
    pub fn exit_code(&self) -> u8 {
        self.outcomes
            .iter()
            .find_map(|o| o.result.as_ref().err())
            .map_or(0, LedgerError::exit_code)
    }
}

/// Runs the pipeline for the sitemaps of a [`Config`].
pub struct Pipeline<T: Transport> {
    config: Config,
    transport: T,
}

impl<T: Transport> Pipeline<T> {
    pub fn new(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process every configured sitemap, isolating failures per sitemap.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();
        for url in &self.config.sitemap_urls {
            let url = url.as_str();
            let result = self.process_sitemap(url).await;
            if let Err(e) = &result {
                error!(sitemap = url, kind = e.kind(), "sitemap processing failed: {e}");
            }
            report.outcomes.push(SitemapOutcome {
                sitemap_url: url.to_string(),
                result,
            });
        }
        report
    }

    /// Run all stages for one top-level sitemap.
    ///
    /// Every entry is normalised before the master is opened, so a single bad
    /// `lastmod` leaves the master and partitions untouched.
    pub async fn process_sitemap(&self, url: &str) -> Result<SitemapStats> {
        let start = Instant::now();
        info!(sitemap = url, "starting sitemap processing");

        let entries = SitemapFetcher::new(&self.transport)
            .fetch(url, self.config.sitemap_limit)
            .await?;
        let fetched = entries.len();
        info!(sitemap = url, entries = fetched, "sitemap fetched, updating master record");

        let normalized = entries
            .into_iter()
            .map(NormalizedEntry::from_entry)
            .collect::<Result<Vec<_>>>()?;

        let master_path = self.config.master_path();
        let merge = MasterRecord::merge(
            normalized.iter().map(|e| (e.url.clone(), e.isoformat())),
            &master_path,
        )?;
        info!(
            sitemap = url,
            added = merge.added,
            ignored = merge.ignored,
            "master record updated, generating date partitions"
        );

        let partition = partition::partition(&master_path, self.config.partition_dir())?;
        info!(sitemap = url, files = partition.files, "date partitions generated");

        Ok(SitemapStats {
            fetched,
            merge,
            partition,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
