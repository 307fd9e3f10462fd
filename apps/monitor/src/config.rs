use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use model::VehicleProfile;

/// Runtime configuration for the monitor binary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub vehicle: VehicleProfile,
    /// Recorded stream replayed as the input source.
    pub stream_path: PathBuf,
    /// Delay between replayed samples, in milliseconds.
    pub replay_interval_ms: u64,
    pub risk_log_path: PathBuf,
    pub alert_recipients: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            vehicle: VehicleProfile::default(),
            stream_path: "stream.csv".into(),
            replay_interval_ms: 1000,
            risk_log_path: "logic_result.csv".into(),
            alert_recipients: Vec::new(),
        }
    }
}

impl MonitorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg = serde_json::from_str(&raw)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn replay_interval(&self) -> Duration {
        Duration::from_millis(self.replay_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "replay_interval_ms": 250 }}"#).unwrap();
        file.flush().unwrap();

        let cfg = MonitorConfig::load(file.path()).unwrap();
        assert_eq!(cfg.replay_interval(), Duration::from_millis(250));
        assert_eq!(cfg.vehicle, VehicleProfile::default());
        assert_eq!(cfg.risk_log_path, PathBuf::from("logic_result.csv"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        file.flush().unwrap();
        assert!(MonitorConfig::load(file.path()).is_err());
    }
}
