//! Environment-driven settings.
//!
//! Every variable is prefixed `CARDIORISK_`. Unset variables take defaults;
//! set-but-invalid variables are a startup error.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::rules::{
    DEFAULT_HIGH_THRESHOLD, DEFAULT_MAX_RECOMMENDATIONS, DEFAULT_MEDIUM_THRESHOLD,
};
use crate::domain::{NumericPolicy, RiskPolicy, RiskThresholds};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
const DEFAULT_LOG_FILE: &str = "logs/cardiorisk.log";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid risk thresholds: {0}")]
    Thresholds(#[from] crate::domain::TierError),
}

impl ConfigError {
    pub(crate) fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Allowed CORS origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Stdout,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub mode: LogMode,
    pub file: PathBuf,
}

/// Server settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub model_dir: PathBuf,
    /// Fail startup if the model cannot be loaded
    pub require_model: bool,
    pub cors_origins: CorsOrigins,
    pub policy: RiskPolicy,
    pub log: LogSettings,
}

fn parse_bool(var: &'static str, v: &str) -> Result<bool, ConfigError> {
    match v.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Ok(false),
        other => Err(ConfigError::invalid(var, other, "expected true/false")),
    }
}

fn parse_with<T, E: ToString>(
    var: &'static str,
    v: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<T, ConfigError> {
    parse(v.trim()).map_err(|e| ConfigError::invalid(var, v, e))
}

fn parse_cors(v: &str) -> CorsOrigins {
    if v.trim() == "*" {
        return CorsOrigins::Any;
    }
    CorsOrigins::List(
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
    )
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `ConfigError` if a set variable cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = parse_with(
            "CARDIORISK_BIND_ADDR",
            &lookup("CARDIORISK_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            str::parse::<SocketAddr>,
        )?;

        let model_dir = lookup("CARDIORISK_MODEL_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR), PathBuf::from);

        let require_model = lookup("CARDIORISK_REQUIRE_MODEL")
            .map(|v| parse_bool("CARDIORISK_REQUIRE_MODEL", &v))
            .transpose()?
            .unwrap_or(true);

        let cors_origins = parse_cors(
            &lookup("CARDIORISK_CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
        );

        let medium = lookup("CARDIORISK_MEDIUM_THRESHOLD")
            .map(|v| parse_with("CARDIORISK_MEDIUM_THRESHOLD", &v, str::parse::<f64>))
            .transpose()?
            .unwrap_or(DEFAULT_MEDIUM_THRESHOLD);
        let high = lookup("CARDIORISK_HIGH_THRESHOLD")
            .map(|v| parse_with("CARDIORISK_HIGH_THRESHOLD", &v, str::parse::<f64>))
            .transpose()?
            .unwrap_or(DEFAULT_HIGH_THRESHOLD);

        let max_recommendations = lookup("CARDIORISK_MAX_RECOMMENDATIONS")
            .map(|v| parse_with("CARDIORISK_MAX_RECOMMENDATIONS", &v, str::parse::<usize>))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_RECOMMENDATIONS);

        let numeric_policy = lookup("CARDIORISK_NUMERIC_POLICY")
            .map(|v| parse_with("CARDIORISK_NUMERIC_POLICY", &v, str::parse::<NumericPolicy>))
            .transpose()?
            .unwrap_or_default();

        let mode = match lookup("CARDIORISK_LOG_MODE").as_deref().map(str::trim) {
            None | Some("stdout") => LogMode::Stdout,
            Some("file") => LogMode::File,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "CARDIORISK_LOG_MODE",
                    other,
                    "expected stdout or file",
                ))
            }
        };
        let file = lookup("CARDIORISK_LOG_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from);

        Ok(Self {
            bind_addr,
            model_dir,
            require_model,
            cors_origins,
            policy: RiskPolicy {
                thresholds: RiskThresholds::new(medium, high)?,
                max_recommendations,
                numeric_policy,
            },
            log: LogSettings { mode, file },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).expect("defaults are valid");
        assert_eq!(s.bind_addr.port(), 8000);
        assert_eq!(s.model_dir, PathBuf::from("models"));
        assert!(s.require_model);
        assert_eq!(
            s.cors_origins,
            CorsOrigins::List(vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string()
            ])
        );
        assert_eq!(s.policy.max_recommendations, 8);
        assert_eq!(s.policy.numeric_policy, NumericPolicy::Reject);
        assert_eq!(s.log.mode, LogMode::Stdout);
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            ("CARDIORISK_BIND_ADDR", "127.0.0.1:9000"),
            ("CARDIORISK_REQUIRE_MODEL", "false"),
            ("CARDIORISK_CORS_ORIGINS", "*"),
            ("CARDIORISK_MEDIUM_THRESHOLD", "0.3"),
            ("CARDIORISK_HIGH_THRESHOLD", "0.7"),
            ("CARDIORISK_MAX_RECOMMENDATIONS", "5"),
            ("CARDIORISK_NUMERIC_POLICY", "zero"),
            ("CARDIORISK_LOG_MODE", "file"),
        ])
        .expect("valid overrides");
        assert_eq!(s.bind_addr.port(), 9000);
        assert!(!s.require_model);
        assert_eq!(s.cors_origins, CorsOrigins::Any);
        assert!((s.policy.thresholds.high() - 0.7).abs() < f64::EPSILON);
        assert_eq!(s.policy.max_recommendations, 5);
        assert_eq!(s.policy.numeric_policy, NumericPolicy::CoerceToZero);
        assert_eq!(s.log.mode, LogMode::File);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            settings(&[("CARDIORISK_REQUIRE_MODEL", "maybe")]),
            Err(ConfigError::Invalid { var: "CARDIORISK_REQUIRE_MODEL", .. })
        ));
        assert!(settings(&[("CARDIORISK_BIND_ADDR", "nowhere")]).is_err());
        assert!(settings(&[("CARDIORISK_MAX_RECOMMENDATIONS", "-1")]).is_err());
        assert!(settings(&[("CARDIORISK_LOG_MODE", "syslog")]).is_err());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        assert!(matches!(
            settings(&[
                ("CARDIORISK_MEDIUM_THRESHOLD", "0.6"),
                ("CARDIORISK_HIGH_THRESHOLD", "0.4"),
            ]),
            Err(ConfigError::Thresholds(_))
        ));
    }
}
