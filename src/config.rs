use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::points::{ScoringConfig, Style};
use crate::submission::ReplayMode;

/// Names the TOML file to load at startup
pub const CONFIG_PATH_VAR: &str = "TIMETRIAL_CONFIG";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const BIND_ADDRESS_VAR: &str = "BIND_ADDRESS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read config: {0}")]
    Io(String),

    #[error("Could not parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `memory`, `sqlite:<path>` or `postgres://...`
    pub database_url: String,
    pub bind_address: String,
    pub scoring: ScoringConfig,
    pub replay: ReplayMode,
    pub recompute: RecomputeConfig,
    pub events: EventConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "memory".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            scoring: ScoringConfig::default(),
            replay: ReplayMode::default(),
            recompute: RecomputeConfig::default(),
            events: EventConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecomputeConfig {
    /// Styles whose records are replayed into point totals
    pub styles: Vec<u16>,
}

impl Default for RecomputeConfig {
    fn default() -> Self {
        Self {
            styles: Style::all_ids(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub channel_capacity: usize,
    pub handler_timeout_ms: u64,
    pub max_retries: u32,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
            handler_timeout_ms: 5000,
            max_retries: 3,
        }
    }
}

impl EventConfig {
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(self.handler_timeout_ms)
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Defaults, then the file named by `TIMETRIAL_CONFIG`, then env overrides; validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => {
                info!(path = %path, "Loading config file");
                Self::load(path)?
            }
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(DATABASE_URL_VAR).filter(|v| !v.is_empty()) {
            self.database_url = url;
        }
        if let Some(address) = lookup(BIND_ADDRESS_VAR).filter(|v| !v.is_empty()) {
            self.bind_address = address;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;

        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid("database_url must be set".to_string()));
        }
        if self.events.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "events.channel_capacity must be positive".to_string(),
            ));
        }
        if let Some(style) = self
            .recompute
            .styles
            .iter()
            .find(|style| Style::from_id(**style).is_none())
        {
            return Err(ConfigError::Invalid(format!(
                "recompute.styles contains unknown style {}",
                style
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.recompute.styles.len(), 13);
        assert_eq!(config.events.handler_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            database_url = "sqlite:times.db"
            replay = "only_route_record"

            [scoring]
            baseline = 10.0
            max_completions = 0

            [[scoring.style_multipliers]]
            style = 2
            multiplier = 2.0

            [recompute]
            styles = [0, 2]
            "#,
        )
        .unwrap();

        assert_eq!(config.database_url, "sqlite:times.db");
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.replay, ReplayMode::OnlyRouteRecord);
        assert_eq!(config.scoring.baseline, 10.0);
        assert_eq!(config.scoring.completion_cap(), None);
        assert_eq!(config.scoring.style_multiplier(2), 2.0);
        assert_eq!(config.scoring.top10_fractions.len(), 10);
        assert_eq!(config.recompute.styles, vec![0, 2]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (DATABASE_URL_VAR, "postgres://localhost/timer"),
            (BIND_ADDRESS_VAR, ""),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();

        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_url, "postgres://localhost/timer");
        assert_eq!(config.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let config = AppConfig::from_toml_str("[recompute]\nstyles = [0, 42]").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = AppConfig::from_toml_str("[scoring]\nbaseline = -1.0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        assert!(matches!(
            AppConfig::from_toml_str("database_url = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        assert!(matches!(
            AppConfig::load("/nonexistent/timetrial.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
