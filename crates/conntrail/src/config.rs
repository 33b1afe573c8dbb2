use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub combine: CombineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineConfig {
    pub enabled: bool,
    pub threshold_secs: i64,
}

impl ConvertConfig {
    /// Load configuration from file or environment variables.
    /// Priority: environment variables > config file > defaults.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("CONNTRAIL_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/conntrail/config.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            Self::from_env()
        };

        // Environment variables override file config
        if let Ok(threshold) = std::env::var("CONNTRAIL_COMBINE_THRESHOLD") {
            if let Ok(secs) = threshold.parse() {
                config.combine.threshold_secs = secs;
            }
        }
        if let Ok(enabled) = std::env::var("CONNTRAIL_COMBINE_ENABLED") {
            if let Ok(on) = enabled.parse() {
                config.combine.enabled = on;
            }
        }

        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: ConvertConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            combine: CombineConfig {
                enabled: std::env::var("CONNTRAIL_COMBINE_ENABLED")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
                threshold_secs: std::env::var("CONNTRAIL_COMBINE_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            },
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.combine.threshold_secs < 0 {
            return Err("combine.threshold_secs must be >= 0".to_string());
        }
        Ok(())
    }

    /// Effective merge threshold: 0 when combining is disabled.
    pub fn effective_threshold(&self) -> i64 {
        if self.combine.enabled {
            self.combine.threshold_secs
        } else {
            0
        }
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            combine: CombineConfig::default(),
        }
    }
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_secs: 60,
        }
    }
}
