// Runtime configuration, read from the environment with sensible defaults.

use crate::catalog::Catalog;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_UPLOAD_URL: &str = "https://api.echo3D.com/upload";
pub const DEFAULT_RESULTS_PATH: &str = "upload_results.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be 'abort' or 'skip', got '{value}'")]
    InvalidPolicy { var: &'static str, value: String },

    #[error("{var} must be a boolean (true/false), got '{value}'")]
    InvalidFlag { var: &'static str, value: String },
}

/// What to do when a row fails to build or validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Validate every row before sending anything; stop at the first bad row.
    #[default]
    AbortOnFirstError,
    /// Leave bad rows out of the batch and upload the rest.
    SkipAndContinue,
}

impl FromStr for ErrorPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" | "abort-on-first-error" => Ok(ErrorPolicy::AbortOnFirstError),
            "skip" | "skip-and-continue" => Ok(ErrorPolicy::SkipAndContinue),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub upload_url: String,
    pub results_path: PathBuf,
    pub policy: ErrorPolicy,
    pub strict_coordinates: bool,
    pub catalog: Catalog,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            results_path: PathBuf::from(DEFAULT_RESULTS_PATH),
            policy: ErrorPolicy::default(),
            strict_coordinates: false,
            catalog: Catalog::default(),
        }
    }
}

impl Config {
    /// Read `HOLO_UPLOAD_URL`, `HOLO_RESULTS_PATH`, `HOLO_ERROR_POLICY` and
    /// `HOLO_STRICT_COORDINATES`; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env` but with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(url) = lookup("HOLO_UPLOAD_URL") {
            config.upload_url = url;
        }
        if let Some(path) = lookup("HOLO_RESULTS_PATH") {
            config.results_path = PathBuf::from(path);
        }
        if let Some(value) = lookup("HOLO_ERROR_POLICY") {
            config.policy = value.parse().map_err(|_| ConfigError::InvalidPolicy {
                var: "HOLO_ERROR_POLICY",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("HOLO_STRICT_COORDINATES") {
            config.strict_coordinates = parse_flag(&value).ok_or_else(|| ConfigError::InvalidFlag {
                var: "HOLO_STRICT_COORDINATES",
                value: value.clone(),
            })?;
        }
        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = from_map(&[]).unwrap();
        assert_eq!(c.upload_url, DEFAULT_UPLOAD_URL);
        assert_eq!(c.results_path, PathBuf::from(DEFAULT_RESULTS_PATH));
        assert_eq!(c.policy, ErrorPolicy::AbortOnFirstError);
        assert!(!c.strict_coordinates);
    }

    #[test]
    fn reads_overrides() {
        let c = from_map(&[
            ("HOLO_UPLOAD_URL", "http://localhost:9000/upload"),
            ("HOLO_RESULTS_PATH", "/tmp/out.json"),
            ("HOLO_ERROR_POLICY", "Skip"),
            ("HOLO_STRICT_COORDINATES", "yes"),
        ])
        .unwrap();
        assert_eq!(c.upload_url, "http://localhost:9000/upload");
        assert_eq!(c.results_path, PathBuf::from("/tmp/out.json"));
        assert_eq!(c.policy, ErrorPolicy::SkipAndContinue);
        assert!(c.strict_coordinates);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            from_map(&[("HOLO_ERROR_POLICY", "retry")]),
            Err(ConfigError::InvalidPolicy { .. })
        ));
        assert!(matches!(
            from_map(&[("HOLO_STRICT_COORDINATES", "maybe")]),
            Err(ConfigError::InvalidFlag { .. })
        ));
    }
}
