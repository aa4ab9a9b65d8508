use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::system::SamplingConfig;
use crate::system::smoothing::{CensusConfig, SmoothingConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub smoothing: SmoothingSection,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub refresh_rate_ms: u64,
    pub display_refresh_ms: u64,
    pub disk_path: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            refresh_rate_ms: 1000,
            display_refresh_ms: 2000,
            disk_path: PathBuf::from("/"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SmoothingSection {
    pub large_swing_threshold: f64,
    pub large_swing_weight: f64,
    pub small_drift_threshold: f64,
    pub small_drift_weight: f64,
    pub census_window: u32,
    pub census_threshold: u32,
    pub census_weight: f64,
}

impl Default for SmoothingSection {
    fn default() -> Self {
        let cpu = SmoothingConfig::default();
        let census = CensusConfig::default();
        SmoothingSection {
            large_swing_threshold: cpu.large_swing_threshold,
            large_swing_weight: cpu.large_swing_weight,
            small_drift_threshold: cpu.small_drift_threshold,
            small_drift_weight: cpu.small_drift_weight,
            census_window: census.window,
            census_threshold: census.threshold,
            census_weight: census.weight,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "warn".to_string(),
            json: false,
        }
    }
}

impl Config {
    pub fn refresh_rate(&self) -> Duration {
        Duration::from_millis(self.general.refresh_rate_ms.max(1))
    }

    pub fn sampling_config(&self) -> SamplingConfig {
        let s = &self.smoothing;
        let cpu = SmoothingConfig::default();
        let census = CensusConfig::default();
        SamplingConfig {
            display_refresh: Duration::from_millis(self.general.display_refresh_ms),
            smoothing: SmoothingConfig {
                large_swing_threshold: finite_or(s.large_swing_threshold, cpu.large_swing_threshold),
                large_swing_weight: weight_or(s.large_swing_weight, cpu.large_swing_weight),
                small_drift_threshold: finite_or(s.small_drift_threshold, cpu.small_drift_threshold),
                small_drift_weight: weight_or(s.small_drift_weight, cpu.small_drift_weight),
            },
            census: CensusConfig {
                window: s.census_window.max(1),
                threshold: s.census_threshold,
                weight: weight_or(s.census_weight, census.weight),
            },
            disk_path: self.general.disk_path.clone(),
        }
    }
}

// TOML accepts nan and inf; neither survives a clamp.
fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() { value } else { default }
}

fn weight_or(value: f64, default: f64) -> f64 {
    finite_or(value, default).clamp(0.0, 1.0)
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sysgauge").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}
