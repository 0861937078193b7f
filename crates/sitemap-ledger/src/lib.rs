//! Sitemap ledger: harvest sitemap URLs, remember when each URL was first
//! seen, and publish the ledger as one URL list per date.
//!
//! The pipeline runs in three stages for every configured sitemap:
//!
//! 1. [`sitemap::SitemapFetcher`] fetches the document and flattens sitemap
//!    indexes into `(url, lastmod)` pairs.
//! 2. [`date::parse_date`] normalises each `lastmod` to a calendar date and
//!    [`master::MasterRecord::merge`] folds the pairs into the master file
//!    (first date seen for a URL wins).
//! 3. [`partition::partition`] regenerates one CSV per date from the master.
//!
//! [`pipeline::Pipeline`] drives the stages and isolates failures per
//! top-level sitemap.

pub mod config;
pub mod date;
pub mod error;
pub mod fetch;
pub mod master;
pub mod partition;
pub mod pipeline;
pub mod sitemap;

pub use config::Config;
pub use error::{LedgerError, Result};
pub use pipeline::{Pipeline, RunReport};
