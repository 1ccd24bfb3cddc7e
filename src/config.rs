use std::path::PathBuf;
use thiserror::Error;

use crate::ports::DEFAULT_PORT;
use crate::scoring::ScoringConfig;
use crate::week::IsoWeek;

pub const DEFAULT_WEEK: &str = "2024-W30";
pub const DEFAULT_PREDICTIONS_DIR: &str = "public/predictions";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got `{value}`")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub predictions_dir: PathBuf,
    pub ports_file: Option<PathBuf>,
    pub default_week: String,
    pub default_port: String,
    pub scoring: ScoringConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            predictions_dir: PathBuf::from(DEFAULT_PREDICTIONS_DIR),
            ports_file: None,
            default_week: DEFAULT_WEEK.to_string(),
            default_port: DEFAULT_PORT.to_string(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from a key lookup (secrets, then environment,
    /// in production). Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(dir) = get("PREDICTIONS_DIR") {
            config.predictions_dir = PathBuf::from(dir);
        }
        config.ports_file = get("PORTS_FILE").map(PathBuf::from);
        if let Some(week) = get("DEFAULT_WEEK") {
            if week.parse::<IsoWeek>().is_err() {
                return Err(ConfigError::Invalid {
                    key: "DEFAULT_WEEK",
                    expected: "an ISO week like 2024-W30",
                    value: week,
                });
            }
            config.default_week = week;
        }
        if let Some(port) = get("DEFAULT_PORT") {
            config.default_port = port;
        }

        if let Some(raw) = get("DEFAULT_DECAY") {
            config.scoring.default_decay = raw
                .parse::<f64>()
                .ok()
                .filter(|lam| lam.is_finite() && *lam >= 0.0)
                .ok_or(ConfigError::Invalid {
                    key: "DEFAULT_DECAY",
                    expected: "a non-negative number",
                    value: raw.clone(),
                })?;
        }

        if let Some(raw) = get("TOP_K") {
            config.scoring.top_k = raw
                .parse::<usize>()
                .ok()
                .filter(|k| *k > 0)
                .ok_or(ConfigError::Invalid {
                    key: "TOP_K",
                    expected: "a positive integer",
                    value: raw.clone(),
                })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.predictions_dir, PathBuf::from("public/predictions"));
        assert_eq!(config.ports_file, None);
        assert_eq!(config.default_week, "2024-W30");
        assert_eq!(config.default_port, "Callao");
        assert_eq!(config.scoring.default_decay, 0.02);
        assert_eq!(config.scoring.top_k, 10);
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PREDICTIONS_DIR", "/srv/predictions"),
            ("PORTS_FILE", "ports.csv"),
            ("DEFAULT_WEEK", "2024-W28"),
            ("DEFAULT_PORT", "Paita"),
            ("DEFAULT_DECAY", "0.01"),
            ("TOP_K", "5"),
        ]))
        .unwrap();

        assert_eq!(config.predictions_dir, PathBuf::from("/srv/predictions"));
        assert_eq!(config.ports_file, Some(PathBuf::from("ports.csv")));
        assert_eq!(config.default_week, "2024-W28");
        assert_eq!(config.default_port, "Paita");
        assert_eq!(config.scoring.default_decay, 0.01);
        assert_eq!(config.scoring.top_k, 5);
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("DEFAULT_PORT", "  "), ("PORTS_FILE", "")])).unwrap();
        assert_eq!(config.default_port, "Callao");
        assert_eq!(config.ports_file, None);
    }

    #[test]
    fn rejects_malformed_numbers() {
        let err = AppConfig::from_lookup(lookup(&[("DEFAULT_DECAY", "-0.5")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "DEFAULT_DECAY",
                expected: "a non-negative number",
                value: "-0.5".to_string(),
            }
        );

        assert!(AppConfig::from_lookup(lookup(&[("DEFAULT_WEEK", "week 30")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("TOP_K", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("TOP_K", "ten")])).is_err());
    }
}
