//! Client configuration
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. `mlops-codex.toml` in the platform config directory (optional)
//! 3. An explicit file (required when given)
//! 4. `MLOPS_CODEX_*` environment variables

use crate::error::{Result, SdkError};
use config::{Config, Environment, File};
use directories::ProjectDirs;
use mlops_codex_core::application::poller::constants::DEFAULT_POLL_INTERVAL;
use mlops_codex_core::application::DEFAULT_TOKEN_TTL;
use mlops_codex_core::domain::Credentials;
use mlops_codex_infra_http::DEFAULT_REQUEST_TIMEOUT;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://neomaril.datarisk.net/api";
pub const CONFIG_FILE_NAME: &str = "mlops-codex.toml";
pub const ENV_PREFIX: &str = "MLOPS_CODEX";

#[derive(Debug, Deserialize)]
struct RawConfig {
    base_url: String,
    request_timeout_secs: u64,
    poll_interval_secs: u64,
    token_ttl_secs: u64,
    login: Option<String>,
    password: Option<String>,
    tenant: Option<String>,
}

/// Resolved client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub token_ttl: Duration,
    /// Present only when login, password and tenant are all configured
    pub credentials: Option<Credentials>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            token_ttl: DEFAULT_TOKEN_TTL,
            credentials: None,
        }
    }
}

impl ClientConfig {
    /// Defaults for `base_url`, everything else at its default
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load from the user config file, `explicit` and the environment
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_sources(
            user_config_file(),
            explicit,
            Environment::with_prefix(ENV_PREFIX),
        )
    }

    pub(crate) fn from_sources(
        user_file: Option<PathBuf>,
        explicit: Option<&Path>,
        environment: Environment,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("request_timeout_secs", secs(DEFAULT_REQUEST_TIMEOUT))?
            .set_default("poll_interval_secs", secs(DEFAULT_POLL_INTERVAL))?
            .set_default("token_ttl_secs", secs(DEFAULT_TOKEN_TTL))?;

        if let Some(path) = user_file {
            builder = builder.add_source(File::from(path).required(false));
        }
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(environment.try_parsing(true));

        let raw: RawConfig = builder.build()?.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let base_url = raw.base_url.trim().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        if raw.request_timeout_secs == 0 {
            return Err(SdkError::Config(config::ConfigError::Message(
                "request_timeout_secs must be greater than zero".to_string(),
            )));
        }

        let credentials = match (raw.login, raw.password, raw.tenant) {
            (Some(login), Some(password), Some(tenant)) => {
                Some(Credentials::new(login, password, tenant))
            }
            _ => None,
        };

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
            poll_interval: Duration::from_secs(raw.poll_interval_secs),
            token_ttl: Duration::from_secs(raw.token_ttl_secs),
            credentials,
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// `<config dir>/mlops-codex.toml`, when the platform has a config directory
pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("net", "datarisk", "mlops-codex")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn secs(duration: Duration) -> i64 {
    duration.as_secs() as i64
}

fn validate_base_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| SdkError::InvalidUrl(format!("{url} (expected http:// or https://)")))?;
    if rest.is_empty() || rest.starts_with('/') {
        return Err(SdkError::InvalidUrl(format!("{url} (missing host)")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    fn write_file(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{body}").unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_sources(None, None, env(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.token_ttl, Duration::from_secs(10_800));
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "base_url = \"https://file.example/api/\"\npoll_interval_secs = 5\n",
        );

        let config = ClientConfig::from_sources(
            None,
            Some(&path),
            env(&[("MLOPS_CODEX_POLL_INTERVAL_SECS", "1")]),
        )
        .unwrap();
        assert_eq!(config.base_url, "https://file.example/api");
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_credentials_need_all_three_parts() {
        let partial = ClientConfig::from_sources(
            None,
            None,
            env(&[("MLOPS_CODEX_LOGIN", "ds@acme.io"), ("MLOPS_CODEX_TENANT", "acme")]),
        )
        .unwrap();
        assert!(partial.credentials.is_none());

        let full = ClientConfig::from_sources(
            None,
            None,
            env(&[
                ("MLOPS_CODEX_LOGIN", "ds@acme.io"),
                ("MLOPS_CODEX_PASSWORD", "hunter2"),
                ("MLOPS_CODEX_TENANT", "acme"),
            ]),
        )
        .unwrap();
        let credentials = full.credentials.unwrap();
        assert_eq!(credentials.login(), "ds@acme.io");
        assert_eq!(credentials.tenant(), "acme");
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ClientConfig::from_sources(None, Some(&missing), env(&[])).unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn test_missing_user_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            ClientConfig::from_sources(Some(dir.path().join("absent.toml")), None, env(&[]))
                .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_invalid_values() {
        let err = ClientConfig::from_sources(
            None,
            None,
            env(&[("MLOPS_CODEX_BASE_URL", "neomaril.datarisk.net")]),
        )
        .unwrap_err();
        assert!(matches!(err, SdkError::InvalidUrl(_)));

        let err = ClientConfig::from_sources(
            None,
            None,
            env(&[("MLOPS_CODEX_REQUEST_TIMEOUT_SECS", "0")]),
        )
        .unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }
}
