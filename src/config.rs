use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::detect::DEFAULT_ENDPOINT;

const DEFAULT_INTERVAL_MS: u64 = 500;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.76;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SOURCE: &str = "stub://camera";

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    endpoint: Option<String>,
    interval_ms: Option<u64>,
    confidence_threshold: Option<f32>,
    timeout_ms: Option<u64>,
    source: Option<String>,
}

/// Runtime configuration for the detection loop and daemon.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Inference service URL.
    pub endpoint: String,
    /// Sampling period, measured tick-to-tick.
    pub interval: Duration,
    /// Detections below this confidence are discarded.
    pub confidence_threshold: f32,
    /// Upper bound on one detection round trip.
    pub request_timeout: Duration,
    /// Video source spec for the daemon: `stub://...` or a local image path.
    pub source: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl DetectionConfig {
    /// Load configuration: file named by `WASTEWATCH_CONFIG` (if set), then
    /// environment overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("WASTEWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DetectionConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            endpoint: file.endpoint.unwrap_or(defaults.endpoint),
            interval: file
                .interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
            request_timeout: file
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            source: file.source.unwrap_or(defaults.source),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(endpoint) = std::env::var("WASTEWATCH_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(interval) = std::env::var("WASTEWATCH_INTERVAL_MS") {
            let ms: u64 = interval
                .parse()
                .map_err(|_| anyhow!("WASTEWATCH_INTERVAL_MS must be an integer millisecond count"))?;
            self.interval = Duration::from_millis(ms);
        }
        if let Ok(threshold) = std::env::var("WASTEWATCH_CONFIDENCE") {
            let value: f32 = threshold
                .parse()
                .map_err(|_| anyhow!("WASTEWATCH_CONFIDENCE must be a float"))?;
            self.confidence_threshold = value;
        }
        if let Ok(timeout) = std::env::var("WASTEWATCH_TIMEOUT_MS") {
            let ms: u64 = timeout
                .parse()
                .map_err(|_| anyhow!("WASTEWATCH_TIMEOUT_MS must be an integer millisecond count"))?;
            self.request_timeout = Duration::from_millis(ms);
        }
        if let Ok(source) = std::env::var("WASTEWATCH_SOURCE") {
            if !source.trim().is_empty() {
                self.source = source;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(anyhow!("endpoint must not be empty"));
        }
        if self.interval.is_zero() {
            return Err(anyhow!("interval must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(anyhow!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<DetectionConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
