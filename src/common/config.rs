//! Configuration file handling
//!
//! Precedence for the target base URL: `--base-url` flag, then the
//! `POSTS_E2E_BASE_URL` environment variable, then the config file, then
//! the built-in default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};
use crate::fixture::PasswordConstraints;

/// Environment variable overriding the target base URL
pub const BASE_URL_ENV: &str = "POSTS_E2E_BASE_URL";

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// The API under test
    #[serde(default)]
    pub target: TargetConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Fixture generation settings
    #[serde(default)]
    pub fixture: FixtureConfig,
}

/// The API under test
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TargetConfig {
    /// Base URL every scenario path is joined to
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Timeouts {
    /// Per-request transport timeout
    #[serde(default = "default_request")]
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request(),
        }
    }
}

fn default_request() -> u64 {
    30
}

/// Fixture generation settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FixtureConfig {
    #[serde(default = "default_password_length")]
    pub password_length: usize,

    #[serde(default = "default_password_prefix")]
    pub password_prefix: String,

    #[serde(default = "default_require_uppercase")]
    pub require_uppercase: bool,

    /// Domain used for generated user emails
    #[serde(default = "default_email_domain")]
    pub email_domain: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            password_length: default_password_length(),
            password_prefix: default_password_prefix(),
            require_uppercase: default_require_uppercase(),
            email_domain: default_email_domain(),
        }
    }
}

fn default_password_length() -> usize {
    20
}
fn default_password_prefix() -> String {
    "Hello ".to_string()
}
fn default_require_uppercase() -> bool {
    true
}
fn default_email_domain() -> String {
    "example.com".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Load the effective configuration for a run
    ///
    /// `path` replaces the default config file; `base_url` wins over both
    /// the file and the environment.
    pub fn resolve(path: Option<&Path>, base_url: Option<String>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_overrides(std::env::var(BASE_URL_ENV).ok(), base_url);
        config.validate()?;
        Ok(config)
    }

    /// Apply environment and command-line overrides, lowest first
    pub fn apply_overrides(&mut self, env_base_url: Option<String>, flag_base_url: Option<String>) {
        if let Some(url) = env_base_url.filter(|u| !u.trim().is_empty()) {
            self.target.base_url = url;
        }
        if let Some(url) = flag_base_url {
            self.target.base_url = url;
        }
    }

    /// Reject values that cannot drive a run
    pub fn validate(&self) -> Result<()> {
        if self.timeouts.request_secs == 0 {
            return Err(Error::Config(
                "timeouts.request_secs must be greater than zero".to_string(),
            ));
        }
        let base = self.target.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::invalid_url(
                base,
                "expected an http:// or https:// URL",
            ));
        }
        Ok(())
    }

    /// Per-request transport timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.request_secs)
    }

    /// Password rules for generated users
    pub fn password_constraints(&self) -> PasswordConstraints {
        PasswordConstraints {
            length: self.fixture.password_length,
            require_uppercase: self.fixture.require_uppercase,
            literal_prefix: self.fixture.password_prefix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.target.base_url, "http://localhost:3000");
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.fixture.password_length, 20);
        assert_eq!(config.fixture.password_prefix, "Hello ");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[target]
base_url = "http://api.internal:8080"
"#,
        )
        .unwrap();
        assert_eq!(config.target.base_url, "http://api.internal:8080");
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.fixture.require_uppercase);
    }

    #[test]
    fn test_flag_beats_environment() {
        let mut config = Config::default();
        config.apply_overrides(
            Some("http://from-env:1".to_string()),
            Some("http://from-flag:2".to_string()),
        );
        assert_eq!(config.target.base_url, "http://from-flag:2");

        let mut config = Config::default();
        config.apply_overrides(Some("http://from-env:1".to_string()), None);
        assert_eq!(config.target.base_url, "http://from-env:1");
    }

    #[test]
    fn test_blank_environment_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(Some("  ".to_string()), None);
        assert_eq!(config.target.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.timeouts.request_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.target.base_url = "localhost:3000".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidUrl { .. })));
    }

    #[test]
    fn test_password_constraints_follow_fixture_section() {
        let mut config = Config::default();
        config.fixture.password_length = 12;
        config.fixture.password_prefix = "Qa-".to_string();
        let constraints = config.password_constraints();
        assert_eq!(constraints.length, 12);
        assert_eq!(constraints.literal_prefix, "Qa-");
        assert!(constraints.require_uppercase);
    }
}
