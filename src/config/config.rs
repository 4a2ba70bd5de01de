// src/config/config.rs
use crate::types::SizingProfile;
use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the miner
///
/// Every section and field has a default, so an empty file is a valid
/// configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ethash size table ("mainnet" or "dev")
    #[serde(default)]
    pub sizing: SizingProfile,

    /// Dataset storage settings
    #[serde(default)]
    pub dag: DagConfig,

    /// Search loop settings
    #[serde(default)]
    pub miner: MinerConfig,

    /// Verification settings
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Statistics reporting settings
    #[serde(default)]
    pub stats: StatsConfig,
}

/// Where and how the dataset is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagConfig {
    /// Dataset file path (default: `<temp dir>/dag`)
    #[serde(default = "default_dag_path")]
    pub path: PathBuf,

    /// Write freshly computed datasets to `path`
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Spot-check a loaded dataset against light hashes before trusting it
    #[serde(default)]
    pub verify_on_load: bool,

    /// Number of probe nonces for `verify_on_load`
    #[serde(default = "default_load_probes")]
    pub load_probes: u64,
}

/// Search loop tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Skip the sleep between hash attempts
    #[serde(default = "default_true")]
    pub turbo: bool,

    /// Sleep between attempts when turbo is off, in microseconds
    #[serde(default = "default_throttle_micros")]
    pub throttle_micros: u64,

    /// Fixed seed for the start-nonce generator (default: wall clock)
    #[serde(default)]
    pub nonce_seed: Option<u64>,
}

/// Verification policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Reject blocks whose mix digest differs from the light-derived one,
    /// when the oracle can derive it
    #[serde(default = "default_true")]
    pub strict_mix_digest: bool,
}

/// Statistics reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Seconds between stats log lines
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_dag_path() -> PathBuf {
    std::env::temp_dir().join("dag")
}

fn default_true() -> bool {
    true
}

fn default_load_probes() -> u64 {
    4
}

fn default_throttle_micros() -> u64 {
    20
}

fn default_report_interval() -> u64 {
    60
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            path: default_dag_path(),
            persist: true,
            verify_on_load: false,
            load_probes: default_load_probes(),
        }
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            turbo: true,
            throttle_micros: default_throttle_micros(),
            nonce_seed: None,
        }
    }
}

impl MinerConfig {
    /// Sleep applied between attempts when turbo is off
    pub fn throttle(&self) -> Duration {
        Duration::from_micros(self.throttle_micros)
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            strict_mix_digest: true,
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
        }
    }
}

impl StatsConfig {
    /// Interval between stats log lines
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs.max(1))
    }
}

impl Config {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(MinerError)` - If file couldn't be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(toml::from_str(&config_str)?)
    }

    /// Generates a commented configuration template string
    pub fn generate_template() -> String {
        let mut template = String::new();
        template.push_str("# Ethash Miner Configuration\n\n");
        template.push_str("# Size table: mainnet (1 GiB DAG) or dev (kilobytes)\n");
        template.push_str("sizing = \"mainnet\"\n\n");

        template.push_str("[dag]\n");
        template.push_str(&format!("path = {:?}\n", default_dag_path().display().to_string()));
        template.push_str("# Write computed DAGs to disk for reuse across restarts\n");
        template.push_str("persist = true\n");
        template.push_str("# Check a loaded DAG against light hashes before trusting it\n");
        template.push_str("verify_on_load = false\n");
        template.push_str("load_probes = 4\n\n");

        template.push_str("[miner]\n");
        template.push_str("# Disable to sleep throttle_micros between hashes\n");
        template.push_str("turbo = true\n");
        template.push_str("throttle_micros = 20\n");
        template.push_str("# Fixed start-nonce seed (default: wall clock)\n");
        template.push_str("# nonce_seed = 42\n\n");

        template.push_str("[verifier]\n");
        template.push_str("strict_mix_digest = true\n\n");

        template.push_str("[stats]\n");
        template.push_str("report_interval_secs = 60\n");

        template
    }
}
