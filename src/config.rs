//! Environment-driven configuration.
//!
//! `.env` is loaded through dotenvy; every value has a default so a bare
//! `certificate-issuer batch --event 3` works against a local backend.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::certificate::{IssuerProfile, TypstConverter};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_TYPST_BIN: &str = "typst";
const DEFAULT_TYPST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONCURRENCY: usize = 1;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub typst_bin: PathBuf,
    pub typst_timeout: Duration,
    /// Root for per-certificate render directories; system temp dir if unset.
    pub render_dir: Option<PathBuf>,
    pub concurrency: usize,
    pub issuer: IssuerProfile,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            typst_bin: PathBuf::from(DEFAULT_TYPST_BIN),
            typst_timeout: Duration::from_secs(DEFAULT_TYPST_TIMEOUT_SECS),
            render_dir: None,
            concurrency: DEFAULT_CONCURRENCY,
            issuer: IssuerProfile::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys take the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();
        let issuer_defaults = defaults.issuer;

        let typst_timeout = match get("TYPST_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_positive("TYPST_TIMEOUT_SECS", &value)?),
            None => defaults.typst_timeout,
        };
        let concurrency = match get("BATCH_CONCURRENCY") {
            Some(value) => parse_positive("BATCH_CONCURRENCY", &value)?,
            None => defaults.concurrency,
        };

        Ok(Self {
            api_url: get("CERTIFICATE_API_URL").unwrap_or(defaults.api_url),
            typst_bin: get("TYPST_BIN").map(PathBuf::from).unwrap_or(defaults.typst_bin),
            typst_timeout,
            render_dir: get("RENDER_DIR").map(PathBuf::from),
            concurrency,
            issuer: IssuerProfile {
                municipality: get("ISSUER_MUNICIPALITY").unwrap_or(issuer_defaults.municipality),
                department: get("ISSUER_DEPARTMENT").unwrap_or(issuer_defaults.department),
                cnpj: get("ISSUER_CNPJ").unwrap_or(issuer_defaults.cnpj),
                offered_by: get("ISSUER_OFFERED_BY").unwrap_or(issuer_defaults.offered_by),
                signatory_name: get("ISSUER_SIGNATORY_NAME")
                    .unwrap_or(issuer_defaults.signatory_name),
                signatory_title: get("ISSUER_SIGNATORY_TITLE")
                    .unwrap_or(issuer_defaults.signatory_title),
                outline_title: issuer_defaults.outline_title,
            },
        })
    }

    pub fn converter(&self) -> TypstConverter {
        let converter = TypstConverter::new(&self.typst_bin).with_timeout(self.typst_timeout);
        match &self.render_dir {
            Some(dir) => converter.with_work_root(dir),
            None => converter,
        }
    }
}

fn parse_positive<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        }),
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api_url, "http://localhost:5000/api");
        assert_eq!(config.issuer.municipality, "MUNICÍPIO DE CORONEL VIVIDA");
    }

    #[test]
    fn test_values_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("CERTIFICATE_API_URL", "https://certificados.example/api"),
            ("TYPST_BIN", "/opt/typst/bin/typst"),
            ("TYPST_TIMEOUT_SECS", "15"),
            ("RENDER_DIR", "/var/tmp/certificados"),
            ("BATCH_CONCURRENCY", "4"),
            ("ISSUER_SIGNATORY_NAME", "Maria Pereira"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://certificados.example/api");
        assert_eq!(config.typst_bin, PathBuf::from("/opt/typst/bin/typst"));
        assert_eq!(config.typst_timeout, Duration::from_secs(15));
        assert_eq!(config.render_dir, Some(PathBuf::from("/var/tmp/certificados")));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.issuer.signatory_name, "Maria Pereira");
        assert_eq!(config.issuer.cnpj, "76.995.455/0001-56");
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[("TYPST_BIN", "  ")])).unwrap();
        assert_eq!(config.typst_bin, PathBuf::from("typst"));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("BATCH_CONCURRENCY", "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                var: "BATCH_CONCURRENCY",
                value: "0".to_string()
            }
        );
        assert!(AppConfig::from_lookup(lookup(&[("TYPST_TIMEOUT_SECS", "soon")])).is_err());
    }
}
