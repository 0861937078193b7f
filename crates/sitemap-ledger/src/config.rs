//! Run configuration, loaded from a TOML file.
//!
//! The configuration is an explicit value: it is built once at startup and
//! handed to [`crate::Pipeline`], never read from global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{LedgerError, Result};
use crate::partition::PARTITION_PREFIX;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "sitemap-ledger.toml";

/// Default name of the master record file inside `output_dir`.
pub const DEFAULT_MASTER_FILENAME: &str = "master_sitemap.csv";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Sitemaps (or sitemap indexes) to process, in order.
    pub sitemap_urls: Vec<Url>,
    /// Existing, writable directory receiving the master and per-date files.
    pub output_dir: PathBuf,
    /// Maximum number of child sitemaps processed per sitemap index.
    #[serde(default)]
    pub sitemap_limit: Option<usize>,
    /// Master record file name, relative to `output_dir`.
    #[serde(default = "default_master_filename")]
    pub master_filename: String,
    #[serde(default)]
    pub http: HttpConfig,
}

/// HTTP transport settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_master_filename() -> String {
    DEFAULT_MASTER_FILENAME.to_string()
}

fn default_user_agent() -> String {
    format!("sitemap-ledger/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Read only the `[http]` table of a configuration file.
    ///
    /// Nothing else in the file is validated, so commands that never touch
    /// `output_dir` can share the run configuration.
    pub fn load_http(path: &Path) -> Result<HttpConfig> {
        #[derive(Deserialize)]
        struct HttpOnly {
            #[serde(default)]
            http: HttpConfig,
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let table: HttpOnly =
            toml::from_str(&text).map_err(|e| LedgerError::Config(e.to_string()))?;
        Ok(table.http)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        for url in &self.sitemap_urls {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(LedgerError::Config(format!(
                    "sitemap URL must be http or https: {url}"
                )));
            }
        }

        if !self.output_dir.is_dir() {
            return Err(LedgerError::Config(format!(
                "output_dir is not an existing directory: {}",
                self.output_dir.display()
            )));
        }

        if self.sitemap_limit == Some(0) {
            return Err(LedgerError::Config(
                "sitemap_limit must be at least 1 when set".to_string(),
            ));
        }

        let name = self.master_filename.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(LedgerError::Config(format!(
                "master_filename must be a plain file name: {name:?}"
            )));
        }
        // The partition stage would overwrite a master named like its exports.
        if name.starts_with(PARTITION_PREFIX) {
            return Err(LedgerError::Config(format!(
                "master_filename must not start with {PARTITION_PREFIX:?}: {name:?}"
            )));
        }

        Ok(())
    }

    /// Full path of the master record file.
    pub fn master_path(&self) -> PathBuf {
        self.output_dir.join(&self.master_filename)
    }

    /// Directory receiving the per-date partition files.
    pub fn partition_dir(&self) -> &Path {
        &self.output_dir
    }
}
