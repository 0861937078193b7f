//! Per-date exports of the master record.
//!
//! Every run regenerates one single-column CSV per date found in the master,
//! named `sitemap_urls_<YYYY-MM-DD>.csv`, holding that date's URLs in
//! ascending order. Files for dates no longer in the master are left alone.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::date::is_iso_date;
use crate::error::{LedgerError, Result};

/// File name prefix of the per-date exports.
pub const PARTITION_PREFIX: &str = "sitemap_urls_";

/// Counts reported by [`partition`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    /// Number of per-date files written.
    pub files: usize,
    /// Distinct (date, url) memberships written across all files.
    pub urls: usize,
}

/// File name for the export of `date` (an ISO `YYYY-MM-DD` string).
pub fn partition_file_name(date: &str) -> String {
    format!("{PARTITION_PREFIX}{date}.csv")
}

/// Full path of the export of `date` inside `output_dir`.
pub fn partition_path(output_dir: &Path, date: &str) -> PathBuf {
    output_dir.join(partition_file_name(date))
}

/// Read the master file and group its URLs by date.
///
/// Unlike [`crate::master::MasterRecord::load`], this stage is strict: a row
/// that is not exactly `url,date`, or whose date is not `YYYY-MM-DD`, fails
/// with [`LedgerError::MasterFormat`] before anything is written.
pub fn group_by_date(master_path: &Path) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(master_path)?;

    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let format_err = |reason: String| LedgerError::MasterFormat {
            path: master_path.to_path_buf(),
            line,
            reason,
        };

        if row.len() != 2 {
            return Err(format_err(format!("expected 2 fields, found {}", row.len())));
        }
        let (url, date) = (&row[0], &row[1]);
        if !is_iso_date(date) {
            return Err(format_err(format!("invalid date {date:?}")));
        }

        groups
            .entry(date.to_string())
            .or_default()
            .insert(url.to_string());
    }
    Ok(groups)
}

/// Regenerate every per-date export in `output_dir` from the master file.
pub fn partition(master_path: &Path, output_dir: &Path) -> Result<PartitionSummary> {
    let groups = group_by_date(master_path)?;
    let mut summary = PartitionSummary::default();

    for (date, urls) in &groups {
        let path = partition_path(output_dir, date);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        for url in urls {
            writer.write_record([url])?;
        }
        writer.flush()?;

        debug!(date = %date, urls = urls.len(), path = %path.display(), "wrote partition");
        summary.files += 1;
        summary.urls += urls.len();
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_file_name_pattern() {
        assert_eq!(partition_file_name("2024-01-31"), "sitemap_urls_2024-01-31.csv");
    }

    #[test]
    fn test_partition_groups_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.csv");
        std::fs::write(
            &master,
            "https://c,2024-01-01\nhttps://a,2024-01-02\nhttps://b,2024-01-01\nhttps://a2,2024-01-01\n",
        )
        .unwrap();

        let summary = partition(&master, dir.path()).unwrap();
        assert_eq!(summary, PartitionSummary { files: 2, urls: 4 });

        assert_eq!(
            lines(&partition_path(dir.path(), "2024-01-01")),
            vec!["https://a2", "https://b", "https://c"]
        );
        assert_eq!(lines(&partition_path(dir.path(), "2024-01-02")), vec!["https://a"]);
    }

    #[test]
    fn test_duplicate_rows_collapse() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.csv");
        std::fs::write(&master, "https://a,2024-01-01\nhttps://a,2024-01-01\n").unwrap();

        let summary = partition(&master, dir.path()).unwrap();
        assert_eq!(summary.urls, 1);
        assert_eq!(lines(&partition_path(dir.path(), "2024-01-01")), vec!["https://a"]);
    }

    #[test]
    fn test_existing_partition_overwritten_and_stale_kept() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.csv");
        let current = partition_path(dir.path(), "2024-01-01");
        let stale = partition_path(dir.path(), "2019-12-31");
        std::fs::write(&current, "https://old\n").unwrap();
        std::fs::write(&stale, "https://ancient\n").unwrap();
        std::fs::write(&master, "https://new,2024-01-01\n").unwrap();

        partition(&master, dir.path()).unwrap();

        assert_eq!(lines(&current), vec!["https://new"]);
        assert_eq!(lines(&stale), vec!["https://ancient"]);
    }

    #[test]
    fn test_bad_field_count_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.csv");
        std::fs::write(&master, "https://a,2024-01-01\nhttps://b,2024-01-01,x\n").unwrap();

        match partition(&master, dir.path()) {
            Err(LedgerError::MasterFormat { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected master format error, got {other:?}"),
        }
        assert!(!partition_path(dir.path(), "2024-01-01").exists());
    }

    #[test]
    fn test_bad_date_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.csv");
        std::fs::write(&master, "https://a,../../etc\n").unwrap();

        assert!(matches!(
            partition(&master, dir.path()),
            Err(LedgerError::MasterFormat { .. })
        ));
    }

    #[test]
    fn test_missing_master_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = partition(&dir.path().join("absent.csv"), dir.path());
        assert!(matches!(result, Err(LedgerError::Csv(_))));
    }
}
