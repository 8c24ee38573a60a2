//! `smkt.toml` configuration
//!
//! ```toml
//! [clearing]
//! strict = false
//! parallel = true
//!
//! [limits.p]
//! min_bid = 0.0
//! max_offer = 500.0
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section is optional. Command-line flags win over the file, and limits
//! given in a submission file win over `[limits]`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use smkt_clear::{ClearingConfig, PriceLimits};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmktConfig {
    #[serde(default)]
    pub clearing: ClearingConfig,
    /// Default withholding limits
    #[serde(default)]
    pub limits: PriceLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl SmktConfig {
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .parse()
            .with_context(|| format!("invalid log level '{}' in config", self.logging.level))
    }
}

/// Load configuration from `path`, or defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<SmktConfig> {
    let Some(path) = path else {
        return Ok(SmktConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file: {}", path.display()))?;
    let config: SmktConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing config file: {}", path.display()))?;
    Ok(config)
}
