//! `sitemap-ledger run`: the full pipeline over every configured sitemap.

use std::path::Path;

use anyhow::{Context, Result};
use sitemap_ledger::fetch::HttpTransport;
use sitemap_ledger::pipeline::SitemapOutcome;
use sitemap_ledger::{Config, Pipeline, RunReport};

use crate::cli::output::{self, Styled};

/// Run the pipeline and return the process exit code.
pub async fn run(config_path: &Path) -> Result<u8> {
    let config = Config::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let transport = HttpTransport::new(&config.http)?;
    let pipeline = Pipeline::new(config, transport);

    if !output::is_json() && !output::is_quiet() {
        let s = Styled::new();
        output::print_header(&s);
        eprintln!(
            "  Processing {} sitemap(s) into {}",
            pipeline.config().sitemap_urls.len(),
            pipeline.config().output_dir.display()
        );
        eprintln!();
    }

    let report = pipeline.run().await;

    if output::is_json() {
        output::print_json(&report_json(&report));
    } else {
        print_report(&Styled::new(), &report);
    }

    Ok(report.exit_code())
}

fn print_report(s: &Styled, report: &RunReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(stats) if !output::is_quiet() => {
                eprintln!(
                    "  {} {}  {} fetched, {} new, {} date file(s)  {}",
                    s.ok_sym(),
                    outcome.sitemap_url,
                    stats.fetched,
                    s.green(&stats.merge.added.to_string()),
                    stats.partition.files,
                    s.dim(&output::format_duration_ms(stats.duration_ms))
                );
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("  {} {}  {}", s.fail_sym(), outcome.sitemap_url, s.red(&e.to_string()));
            }
        }
    }

    if !output::is_quiet() {
        eprintln!();
        eprintln!(
            "  {}: {} succeeded, {} failed",
            s.bold("Done"),
            report.succeeded(),
            report.failed()
        );
    }
}

fn outcome_json(outcome: &SitemapOutcome) -> serde_json::Value {
    match &outcome.result {
        Ok(stats) => serde_json::json!({
            "sitemap": outcome.sitemap_url,
            "status": "ok",
            "stats": stats,
        }),
        Err(e) => serde_json::json!({
            "sitemap": outcome.sitemap_url,
            "status": "error",
            "error": e.kind(),
            "message": e.to_string(),
            "exit_code": e.exit_code(),
        }),
    }
}

fn report_json(report: &RunReport) -> serde_json::Value {
    serde_json::json!({
        "succeeded": report.succeeded(),
        "failed": report.failed(),
        "exit_code": report.exit_code(),
        "sitemaps": report.outcomes.iter().map(outcome_json).collect::<Vec<_>>(),
    })
}
