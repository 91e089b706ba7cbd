//! Configuration types for flow-run-export

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Report layout limits (cell length, column sizing)
///
/// Used as a nested sub-config within [`ExportConfig`] and passed on its own to
/// [`assemble_report`](crate::report::assemble_report).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Maximum characters stored in a single cell (default: 32767, the XLSX limit)
    #[serde(default = "default_max_cell_length")]
    pub max_cell_length: usize,

    /// Upper bound for a computed column width, in characters (default: 50)
    #[serde(default = "default_column_width_cap")]
    pub column_width_cap: usize,

    /// Extra characters added to every computed column width (default: 2)
    #[serde(default = "default_column_padding")]
    pub column_padding: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_cell_length: default_max_cell_length(),
            column_width_cap: default_column_width_cap(),
            column_padding: default_column_padding(),
        }
    }
}

/// Export pipeline configuration
///
/// The report layout fields are flattened, so the serialized form is a single
/// flat object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Maximum step-content fetches in flight at once (default: 5)
    #[serde(default = "default_content_concurrency")]
    pub content_concurrency: usize,

    /// Maximum step-list fetches in flight at once (default: 32)
    #[serde(default = "default_run_concurrency")]
    pub run_concurrency: usize,

    /// Buffered progress events per subscriber before it starts lagging (default: 64)
    #[serde(default = "default_progress_capacity")]
    pub progress_capacity: usize,

    /// What to do when the artifact's file name already exists on disk
    #[serde(default)]
    pub file_collision: FileCollisionAction,

    /// Report layout limits
    #[serde(flatten)]
    pub report: ReportConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            content_concurrency: default_content_concurrency(),
            run_concurrency: default_run_concurrency(),
            progress_capacity: default_progress_capacity(),
            file_collision: FileCollisionAction::default(),
            report: ReportConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Check that every limit is usable
    pub fn validate(&self) -> Result<()> {
        if self.content_concurrency == 0 {
            return Err(config_error(
                "content_concurrency must be at least 1",
                "content_concurrency",
            ));
        }
        if self.run_concurrency == 0 {
            return Err(config_error(
                "run_concurrency must be at least 1",
                "run_concurrency",
            ));
        }
        if self.progress_capacity == 0 {
            return Err(config_error(
                "progress_capacity must be at least 1",
                "progress_capacity",
            ));
        }
        let marker_len = crate::aggregator::TRUNCATION_MARKER.chars().count();
        if self.report.max_cell_length <= marker_len {
            return Err(config_error(
                format!("max_cell_length must be greater than {marker_len}"),
                "max_cell_length",
            ));
        }
        Ok(())
    }
}

/// File collision handling strategy for saved artifacts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
    /// Refuse to write, keep existing
    Skip,
}

/// Connection settings for [`HttpFetchGateway`](crate::gateway::HttpFetchGateway)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Management API root (default: "https://api.flow.microsoft.com")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// `api-version` query parameter (default: "2016-11-01")
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Environment the flow lives in
    pub environment_id: String,

    /// Flow whose runs are exported
    pub flow_id: String,

    /// Bearer token for the management API, obtained by the caller
    pub access_token: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Number of runs requested by `fetch_runs` (default: 10)
    #[serde(default = "default_runs_page_size")]
    pub runs_page_size: u32,

    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl GatewayConfig {
    /// Create a config with default endpoint, timeout and retry settings
    pub fn new(
        environment_id: impl Into<String>,
        flow_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            api_base: default_api_base(),
            api_version: default_api_version(),
            environment_id: environment_id.into(),
            flow_id: flow_id.into(),
            access_token: access_token.into(),
            timeout: default_request_timeout(),
            runs_page_size: default_runs_page_size(),
            retry: RetryConfig::default(),
        }
    }

    /// Check that identifiers and the endpoint are usable
    pub fn validate(&self) -> Result<()> {
        if self.environment_id.trim().is_empty() {
            return Err(config_error("environment_id is required", "environment_id"));
        }
        if self.flow_id.trim().is_empty() {
            return Err(config_error("flow_id is required", "flow_id"));
        }
        if self.access_token.trim().is_empty() {
            return Err(config_error("access_token is required", "access_token"));
        }
        if let Err(e) = url::Url::parse(&self.api_base) {
            return Err(config_error(
                format!("api_base is not a valid URL: {e}"),
                "api_base",
            ));
        }
        self.retry.validate()
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Check that the backoff schedule can be computed
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(config_error(
                format!(
                    "backoff_multiplier must be a finite number of at least 1.0, got {}",
                    self.backoff_multiplier
                ),
                "retry.backoff_multiplier",
            ));
        }
        if self.max_delay < self.initial_delay {
            return Err(config_error(
                "max_delay must not be shorter than initial_delay",
                "retry.max_delay",
            ));
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>, key: &str) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.to_string()),
    }
}

fn default_max_cell_length() -> usize {
    32767
}

fn default_column_width_cap() -> usize {
    50
}

fn default_column_padding() -> usize {
    2
}

fn default_content_concurrency() -> usize {
    5
}

fn default_run_concurrency() -> usize {
    32
}

fn default_progress_capacity() -> usize {
    64
}

fn default_api_base() -> String {
    "https://api.flow.microsoft.com".to_string()
}

fn default_api_version() -> String {
    "2016-11-01".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_runs_page_size() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
