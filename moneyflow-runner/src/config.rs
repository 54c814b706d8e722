//! Pipeline configuration loaded from TOML.
//!
//! Every section is optional; missing values fall back to the defaults of the
//! daily batch job (3 read attempts 5 s apart, 3 publish attempts 10 s apart,
//! 14-row MFI window, 5-row average volume, top 20 picks, 1 h snapshot TTL).

use moneyflow_core::data::RetryPolicy;
use moneyflow_core::indicators::IndicatorConfig;
use moneyflow_core::publish::is_http_location;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What to do when the source listing stopped early.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialPolicy {
    #[default]
    Proceed,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Root directory of the document collections.
    pub dir: PathBuf,
    /// Collection (sub-directory) holding the daily exports. Empty = `dir`.
    pub collection: String,
    /// File-name suffix of tabular documents.
    pub pattern: String,
    pub page_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            collection: String::new(),
            pattern: ".csv".into(),
            page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorConfig {
    /// Sector reference table (`Stock Code`, `Sector`).
    pub path: Option<PathBuf>,
}

/// Retry section. Unset fields take the stage default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub delay_secs: Option<u64>,
}

impl RetryConfig {
    pub fn policy(&self, default: RetryPolicy) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts.unwrap_or(default.max_attempts),
            self.delay_secs
                .map(Duration::from_secs)
                .unwrap_or(default.delay),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub path: Option<PathBuf>,
    pub url: Option<String>,
}

/// Where the artifact is written (and read back from).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishTarget {
    File(PathBuf),
    Http(String),
}

impl PublishTarget {
    /// Interpret a CLI location: URLs go over HTTP, anything else is a path.
    pub fn parse(location: &str) -> Self {
        if is_http_location(location) {
            PublishTarget::Http(location.trim().to_string())
        } else {
            PublishTarget::File(PathBuf::from(location))
        }
    }
}

impl std::fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishTarget::File(p) => write!(f, "{}", p.display()),
            PublishTarget::Http(u) => f.write_str(u),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSection {
    #[serde(flatten)]
    pub engine: IndicatorConfig,
    pub top_n: usize,
}

impl Default for IndicatorSection {
    fn default() -> Self {
        Self {
            engine: IndicatorConfig::default(),
            top_n: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub ttl_secs: u64,
    /// Read location for viewers; defaults to the publish target.
    pub location: Option<String>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            location: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub sector: SectorConfig,
    pub read_retry: RetryConfig,
    pub publish: PublishConfig,
    pub publish_retry: RetryConfig,
    pub indicators: IndicatorSection,
    pub snapshot: SnapshotConfig,
    pub on_partial_enumeration: PartialPolicy,
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn read_policy(&self) -> RetryPolicy {
        self.read_retry.policy(RetryPolicy::sheet_read())
    }

    pub fn publish_policy(&self) -> RetryPolicy {
        self.publish_retry.policy(RetryPolicy::publish())
    }

    /// Resolved publish destination. A URL wins over a path when both are set.
    pub fn publish_target(&self) -> Option<PublishTarget> {
        match (&self.publish.url, &self.publish.path) {
            (Some(url), _) => Some(PublishTarget::Http(url.clone())),
            (None, Some(path)) => Some(PublishTarget::File(path.clone())),
            (None, None) => None,
        }
    }

    /// Read location for the snapshot cache.
    pub fn snapshot_target(&self) -> Option<PublishTarget> {
        match &self.snapshot.location {
            Some(loc) => Some(PublishTarget::parse(loc)),
            None => self.publish_target(),
        }
    }

    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot.ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, retry) in [("read_retry", &self.read_retry), ("publish_retry", &self.publish_retry)] {
            if retry.max_attempts == Some(0) {
                return Err(ConfigError::Invalid(format!("{name}.max_attempts must be >= 1")));
            }
        }
        let ind = &self.indicators;
        if ind.engine.mfi_window == 0 || ind.engine.avg_volume_window == 0 {
            return Err(ConfigError::Invalid("indicator windows must be >= 1".into()));
        }
        if ind.engine.avg_volume_min_periods > ind.engine.avg_volume_window {
            return Err(ConfigError::Invalid(format!(
                "avg_volume_min_periods ({}) exceeds avg_volume_window ({})",
                ind.engine.avg_volume_min_periods, ind.engine.avg_volume_window
            )));
        }
        if ind.top_n == 0 {
            return Err(ConfigError::Invalid("indicators.top_n must be >= 1".into()));
        }
        if self.source.page_size == 0 {
            return Err(ConfigError::Invalid("source.page_size must be >= 1".into()));
        }
        if self.publish_target().is_none() {
            return Err(ConfigError::Invalid(
                "no publish target: set publish.path or publish.url".into(),
            ));
        }
        Ok(())
    }
}
