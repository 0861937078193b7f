//! Master record: the durable URL → first-seen-date ledger.
//!
//! Stored as a headerless two-column CSV (`url,date`). The file is read whole
//! at the start of a merge and rewritten whole at the end. There is no
//! locking; a single writer is assumed.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::date::is_iso_date;
use crate::error::Result;

/// Insertion-ordered mapping from URL to ISO date.
#[derive(Debug, Clone, Default)]
pub struct MasterRecord {
    rows: Vec<(String, String)>,
    index: HashMap<String, usize>,
    skipped_rows: usize,
}

/// Counts reported by [`MasterRecord::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Entries present before the merge.
    pub existing: usize,
    /// New URLs inserted.
    pub added: usize,
    /// Incoming entries dropped because the URL was already known.
    pub ignored: usize,
    /// Rows of the old file that were not `url,date` pairs.
    pub skipped_rows: usize,
}

impl MasterRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the master file. A missing file yields an empty record.
    ///
    /// Rows that are not a `url,YYYY-MM-DD` pair are skipped; they are not
    /// kept and will not be written back by [`MasterRecord::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let mut record = Self::new();
        if !path.exists() {
            return Ok(record);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        for row in reader.records() {
            let row = row?;
            if row.len() != 2 || !is_iso_date(&row[1]) {
                record.skipped_rows += 1;
                continue;
            }
            record.insert_if_absent(&row[0], &row[1]);
        }

        if record.skipped_rows > 0 {
            debug!(
                path = %path.display(),
                skipped = record.skipped_rows,
                "skipped malformed master rows"
            );
        }
        Ok(record)
    }

    /// Insert `url` with `date` unless the URL is already recorded.
    /// Returns whether the entry was added.
    pub fn insert_if_absent(&mut self, url: &str, date: &str) -> bool {
        if self.index.contains_key(url) {
            return false;
        }
        self.index.insert(url.to_string(), self.rows.len());
        self.rows.push((url.to_string(), date.to_string()));
        true
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.index.get(url).map(|&i| self.rows[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows skipped by the last [`MasterRecord::load`].
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// `(url, date)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rows.iter().map(|(u, d)| (u.as_str(), d.as_str()))
    }

    /// Rewrite the whole master file from this record.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        for (url, date) in &self.rows {
            writer.write_record([url, date])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Fold `entries` into the master file at `path`.
    ///
    /// First write wins: a URL already in the file, or seen earlier in
    /// `entries`, keeps its date.
    pub fn merge<I>(entries: I, path: &Path) -> Result<MergeSummary>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut record = Self::load(path)?;
        let mut summary = MergeSummary {
            existing: record.len(),
            skipped_rows: record.skipped_rows,
            ..MergeSummary::default()
        };

        for (url, date) in entries {
            if record.insert_if_absent(&url, &date) {
                summary.added += 1;
            } else {
                summary.ignored += 1;
            }
        }

        record.save(path)?;
        debug!(
            path = %path.display(),
            added = summary.added,
            ignored = summary.ignored,
            total = record.len(),
            "master record updated"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(u, d)| (u.to_string(), d.to_string()))
            .collect()
    }

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_merge_into_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.csv");

        let summary = MasterRecord::merge(
            pairs(&[("https://a", "2024-01-01"), ("https://b", "2024-01-02")]),
            &path,
        )
        .unwrap();

        assert_eq!(summary.existing, 0);
        assert_eq!(summary.added, 2);
        assert_eq!(lines(&path), vec!["https://a,2024-01-01", "https://b,2024-01-02"]);
    }

    #[test]
    fn test_existing_date_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.csv");
        std::fs::write(&path, "https://a,2024-01-01\n").unwrap();

        let summary =
            MasterRecord::merge(pairs(&[("https://a", "2025-06-30")]), &path).unwrap();

        assert_eq!(summary.added, 0);
        assert_eq!(summary.ignored, 1);
        let record = MasterRecord::load(&path).unwrap();
        assert_eq!(record.get("https://a"), Some("2024-01-01"));
    }

    #[test]
    fn test_duplicates_within_one_merge_keep_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.csv");

        MasterRecord::merge(
            pairs(&[
                ("https://a", "2024-01-01"),
                ("https://a", "2024-03-03"),
                ("https://b", "2024-01-02"),
            ]),
            &path,
        )
        .unwrap();

        assert_eq!(lines(&path), vec!["https://a,2024-01-01", "https://b,2024-01-02"]);
    }

    #[test]
    fn test_insertion_order_existing_then_new() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.csv");
        std::fs::write(&path, "https://z,2024-01-01\nhttps://m,2024-01-05\n").unwrap();

        MasterRecord::merge(
            pairs(&[("https://b", "2024-02-01"), ("https://a", "2024-02-02")]),
            &path,
        )
        .unwrap();

        assert_eq!(
            lines(&path),
            vec![
                "https://z,2024-01-01",
                "https://m,2024-01-05",
                "https://b,2024-02-01",
                "https://a,2024-02-02",
            ]
        );
    }

    #[test]
    fn test_malformed_rows_skipped_and_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.csv");
        std::fs::write(
            &path,
            "https://a,2024-01-01\nhttps://bad,2024-01-01,extra\nlonely\nhttps://b,2024-01-02\n",
        )
        .unwrap();

        let record = MasterRecord::load(&path).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.skipped_rows(), 2);
        assert_eq!(record.get("https://bad"), None);

        let summary = MasterRecord::merge(Vec::<(String, String)>::new(), &path).unwrap();
        assert_eq!(summary.skipped_rows, 2);
        assert_eq!(lines(&path), vec!["https://a,2024-01-01", "https://b,2024-01-02"]);
    }

    #[test]
    fn test_rows_with_bad_dates_skipped_and_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.csv");
        std::fs::write(
            &path,
            "https://a,2024-01-01\nhttps://b,yesterday\nhttps://c,2024-13-01\n",
        )
        .unwrap();

        let summary =
            MasterRecord::merge(pairs(&[("https://b", "2024-02-02")]), &path).unwrap();

        assert_eq!(summary.skipped_rows, 2);
        assert_eq!(summary.added, 1);
        assert_eq!(lines(&path), vec!["https://a,2024-01-01", "https://b,2024-02-02"]);
        // What the master keeps, the partition stage accepts.
        crate::partition::partition(&path, dir.path()).unwrap();
    }

    #[test]
    fn test_urls_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.csv");

        MasterRecord::merge(pairs(&[("https://a/x,y", "2024-01-01")]), &path).unwrap();

        assert_eq!(lines(&path), vec!["\"https://a/x,y\",2024-01-01"]);
        let record = MasterRecord::load(&path).unwrap();
        assert_eq!(record.get("https://a/x,y"), Some("2024-01-01"));
    }
}
