//! Configuration for the Kibble-Zurek dashboard back-end.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with KZ_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Complete configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for `*schedule.csv` files.
    #[serde(default = "default_schedules_dir")]
    pub schedules_dir: PathBuf,

    /// Directory holding `emb_<sampler>.json` files.
    #[serde(default = "default_embeddings_dir")]
    pub embeddings_dir: PathBuf,

    /// Register the local classical sampler.
    #[serde(default = "default_true")]
    pub use_classical: bool,

    /// Display name of the classical sampler.
    #[serde(default = "default_classical_name")]
    pub classical_name: String,

    /// Cloud solver access
    #[serde(default)]
    pub cloud: CloudConfig,

    /// Coupling strength whose dynamics zero-noise runs reproduce.
    #[serde(default = "default_j_baseline")]
    pub j_baseline: f64,

    /// Reads per job.
    #[serde(default = "default_num_reads")]
    pub num_reads: u32,

    /// Hard cap on one embedding search, in seconds.
    #[serde(default = "default_embedding_timeout")]
    pub embedding_timeout_secs: u64,

    /// Poll-timer intervals
    #[serde(default)]
    pub polling: PollingConfig,

    /// Anneal-time slider ranges
    #[serde(default)]
    pub anneal_time_ns: AnnealTimeRange,

    /// Points on the theoretical curve.
    #[serde(default = "default_theory_points")]
    pub theory_points: usize,
}

/// Cloud solver settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Base URL of the solver API; no cloud sampler without it.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// API token (set via KZ_API_TOKEN)
    #[serde(default)]
    pub token: Option<String>,

    /// Solvers must cover this fast-anneal range, in microseconds.
    #[serde(default = "default_fast_anneal_range")]
    pub fast_anneal_range_us: (f64, f64),

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("fast_anneal_range_us", &self.fast_anneal_range_us)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Poll-timer intervals in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// First tick after a submit click.
    #[serde(default = "default_submit_ms")]
    pub submit_ms: u64,
    /// While an embedding is searched or cached.
    #[serde(default = "default_embedding_ms")]
    pub embedding_ms: u64,
    /// While no status is visible for the job yet.
    #[serde(default = "default_waiting_ms")]
    pub waiting_ms: u64,
    /// Once the job reports a status.
    #[serde(default = "default_status_ms")]
    pub status_ms: u64,
    /// After the job reached a terminal state.
    #[serde(default = "default_done_ms")]
    pub done_ms: u64,
}

/// Anneal-time ranges in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnealTimeRange {
    /// Shortest anneal time.
    #[serde(default = "default_min_ns")]
    pub min: f64,
    /// Longest anneal time for Kibble-Zurek runs.
    #[serde(default = "default_max_kz_ns")]
    pub max_kz: f64,
    /// Longest anneal time for zero-noise runs.
    #[serde(default = "default_max_zne_ns")]
    pub max_zne: f64,
}

// Default value functions
fn default_schedules_dir() -> PathBuf {
    PathBuf::from("./data/schedules")
}

fn default_embeddings_dir() -> PathBuf {
    PathBuf::from("./data/embeddings")
}

fn default_true() -> bool {
    true
}

fn default_classical_name() -> String {
    "Diffusion [Classical]".to_string()
}

fn default_j_baseline() -> f64 {
    -1.8
}

fn default_num_reads() -> u32 {
    100
}

fn default_embedding_timeout() -> u64 {
    60
}

fn default_fast_anneal_range() -> (f64, f64) {
    (0.005, 0.1)
}

fn default_request_timeout() -> u64 {
    30
}

fn default_submit_ms() -> u64 {
    500
}

fn default_embedding_ms() -> u64 {
    200
}

fn default_waiting_ms() -> u64 {
    200
}

fn default_status_ms() -> u64 {
    1000
}

fn default_done_ms() -> u64 {
    100
}

fn default_min_ns() -> f64 {
    2.0
}

fn default_max_kz_ns() -> f64 {
    350.0
}

fn default_max_zne_ns() -> f64 {
    1500.0
}

fn default_theory_points() -> usize {
    100
}

impl Default for Config {
    fn default() -> Self {
        Config {
            schedules_dir: default_schedules_dir(),
            embeddings_dir: default_embeddings_dir(),
            use_classical: true,
            classical_name: default_classical_name(),
            cloud: CloudConfig::default(),
            j_baseline: default_j_baseline(),
            num_reads: default_num_reads(),
            embedding_timeout_secs: default_embedding_timeout(),
            polling: PollingConfig::default(),
            anneal_time_ns: AnnealTimeRange::default(),
            theory_points: default_theory_points(),
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        CloudConfig {
            endpoint: None,
            token: None,
            fast_anneal_range_us: default_fast_anneal_range(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            submit_ms: default_submit_ms(),
            embedding_ms: default_embedding_ms(),
            waiting_ms: default_waiting_ms(),
            status_ms: default_status_ms(),
            done_ms: default_done_ms(),
        }
    }
}

impl Default for AnnealTimeRange {
    fn default() -> Self {
        AnnealTimeRange {
            min: default_min_ns(),
            max_kz: default_max_kz_ns(),
            max_zne: default_max_zne_ns(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        let config = config.merge_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `KZ_*` overrides looked up through `var`.
    ///
    /// Only variables that are set override the current values; values
    /// that fail to parse are ignored.
    pub fn merge_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = var("KZ_SCHEDULES_DIR") {
            self.schedules_dir = PathBuf::from(v);
        }
        if let Some(v) = var("KZ_EMBEDDINGS_DIR") {
            self.embeddings_dir = PathBuf::from(v);
        }
        if let Some(v) = var("KZ_USE_CLASSICAL") {
            if let Ok(val) = v.parse() {
                self.use_classical = val;
            }
        }

        // Cloud
        if let Some(v) = var("KZ_API_ENDPOINT") {
            self.cloud.endpoint = Some(v);
        }
        if let Some(v) = var("KZ_API_TOKEN") {
            self.cloud.token = Some(v);
        }

        // Experiment
        if let Some(v) = var("KZ_J_BASELINE") {
            if let Ok(val) = v.parse() {
                self.j_baseline = val;
            }
        }
        if let Some(v) = var("KZ_NUM_READS") {
            if let Ok(val) = v.parse() {
                self.num_reads = val;
            }
        }
        if let Some(v) = var("KZ_EMBEDDING_TIMEOUT") {
            if let Ok(val) = v.parse() {
                self.embedding_timeout_secs = val;
            }
        }

        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classical_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "classical_name must not be empty".to_string(),
            ));
        }

        if !(self.j_baseline.is_finite() && self.j_baseline != 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "j_baseline must be finite and non-zero, got {}",
                self.j_baseline
            )));
        }

        if self.num_reads == 0 {
            return Err(ConfigError::ValidationError(
                "num_reads must be greater than 0".to_string(),
            ));
        }

        if self.embedding_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "embedding_timeout_secs must be greater than 0".to_string(),
            ));
        }

        let range = &self.anneal_time_ns;
        if !(range.min > 0.0 && range.min < range.max_kz && range.min < range.max_zne) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid anneal-time range: min {} ns, max {} / {} ns",
                range.min, range.max_kz, range.max_zne
            )));
        }

        let (lo, hi) = self.cloud.fast_anneal_range_us;
        if !(lo > 0.0 && lo <= hi) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid fast-anneal range: [{lo}, {hi}] us"
            )));
        }

        if let Some(ref token) = self.cloud.token {
            if token.is_empty() {
                return Err(ConfigError::ValidationError(
                    "token must not be empty; omit the field to disable the cloud sampler"
                        .to_string(),
                ));
            }
        }

        if self.theory_points < 2 {
            return Err(ConfigError::ValidationError(
                "theory_points must be at least 2".to_string(),
            ));
        }

        Ok(())
    }

    /// Embedding search timeout.
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding_timeout_secs)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
