//! Configuration loading.
//!
//! Configuration comes from a TOML file (explicit path, or the default
//! location under the user's config directory) and is then overridden by
//! environment variables. A missing default file means defaults.

use std::{
    fmt, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use dma_query::QueryOptions;
use dma_transport::http::{Credentials, TransportOptions};
use serde::Deserialize;
use thiserror::Error;

/// Agent base URL.
pub const ENV_URL: &str = "DMA_URL";
/// Agent user name.
pub const ENV_USERNAME: &str = "DMA_USERNAME";
/// Agent password.
pub const ENV_PASSWORD: &str = "DMA_PASSWORD";
/// Listen address.
pub const ENV_LISTEN: &str = "DMA_LISTEN";

const APP_DIR: &str = "dma-datasource";
const CONFIG_FILE: &str = "config.toml";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration at {path}:{line}:{column}: {message}")]
    ParseError {
        path: PathBuf,
        /// One-based, 0 if unknown.
        line: usize,
        /// One-based, 0 if unknown.
        column: usize,
        message: String,
    },

    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub server: ServerConfig,
    pub query: QueryOptions,
}

/// Connection to the DataMiner Agent.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL, e.g. `https://dma.example.com`.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Accept self-signed certificates.
    pub accept_invalid_certs: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: None,
            password: None,
            timeout_secs: 30,
            accept_invalid_certs: false,
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

/// Inbound HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub listen: String,
    /// Allow cross-origin requests from any origin.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".to_string(),
            cors: false,
        }
    }
}

impl Config {
    /// Apply environment overrides.
    ///
    /// `lookup` resolves a variable name; pass `|k| std::env::var(k).ok()`
    /// for the process environment. Empty values are ignored.
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(url) = get(ENV_URL) {
            self.agent.url = url;
        }
        if let Some(username) = get(ENV_USERNAME) {
            self.agent.username = Some(username);
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.agent.password = Some(password);
        }
        if let Some(listen) = get(ENV_LISTEN) {
            self.server.listen = listen;
        }
        self
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the agent URL is missing or the
    /// listen address does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.url.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "agent.url is not set (use the config file or {ENV_URL})"
            )));
        }
        if self.query.page_size == 0 {
            return Err(ConfigError::Invalid("query.page_size must be positive".into()));
        }
        self.listen_addr().map(|_| ())
    }

    /// Parsed listen address.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if `server.listen` is not a socket address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .listen
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server.listen {:?}: {e}", self.server.listen)))
    }

    /// Options for the outbound HTTP transport.
    #[must_use]
    pub fn transport_options(&self) -> TransportOptions {
        let credentials = self.agent.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: self.agent.password.clone().unwrap_or_default(),
        });
        TransportOptions {
            timeout: Duration::from_secs(self.agent.timeout_secs),
            accept_invalid_certs: self.agent.accept_invalid_certs,
            credentials,
        }
    }
}

/// Default configuration file location.
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Stateless configuration loader.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `path` when given, otherwise from the default location.
    ///
    /// # Errors
    /// Returns error if an explicit file is missing, or a file cannot be
    /// read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    /// Returns `ConfigError::NotFound` if the file does not exist, or
    /// `ConfigError::ReadError` for other I/O failures.
    pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::parse_toml(&content, path)
    }

    /// Load from the default location, or defaults if there is no file.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load_default() -> Result<Config, ConfigError> {
        match default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            path => {
                tracing::debug!(?path, "no config file, using defaults");
                Ok(Config::default())
            }
        }
    }

    /// Parse TOML, reporting the line and column of errors.
    ///
    /// # Errors
    /// Returns [`ConfigError::ParseError`] if the content is not a valid configuration.
    pub fn parse_toml(content: &str, path: &Path) -> Result<Config, ConfigError> {
        toml::from_str(content).map_err(|e| {
            let (line, column) = e.span().map_or((0, 0), |span| {
                let before = &content[..span.start];
                let line = before.matches('\n').count() + 1;
                let line_start = before.rfind('\n').map_or(0, |p| p + 1);
                (line, span.start - line_start + 1)
            });
            ConfigError::ParseError {
                path: path.to_path_buf(),
                line,
                column,
                message: e.message().to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse(content: &str) -> Result<Config, ConfigError> {
        ConfigLoader::parse_toml(content, Path::new("test.toml"))
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
[agent]
url = "https://dma.example.com"
username = "grafana"
password = "secret"
timeout_secs = 10
accept_invalid_certs = true

[server]
listen = "0.0.0.0:8080"
cors = true

[query]
page_size = 500
default_max_points = 1000
timeout_secs = 60
timezone = "Europe/Brussels"
"#,
        )
        .unwrap();

        assert_eq!(config.agent.url, "https://dma.example.com");
        assert_eq!(config.agent.timeout_secs, 10);
        assert!(config.server.cors);
        assert_eq!(config.query.page_size, 500);
        assert_eq!(config.query.timezone.as_deref(), Some("Europe/Brussels"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_is_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.query, QueryOptions::default());
        assert_eq!(config.server.listen, "127.0.0.1:3000");
    }

    #[test]
    fn test_parse_error_position() {
        let err = parse("[agent]\nurl = \"https://dma\"\ntimeout_secs = = 10\n").unwrap_err();
        match err {
            ConfigError::ParseError { line, column, .. } => {
                assert_eq!(line, 3);
                assert!(column > 1);
            }
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().with_env_overrides(env(&[
            (ENV_URL, "https://override"),
            (ENV_USERNAME, "ops"),
            (ENV_PASSWORD, "pw"),
            (ENV_LISTEN, "127.0.0.1:9000"),
        ]));

        assert_eq!(config.agent.url, "https://override");
        assert_eq!(config.agent.username.as_deref(), Some("ops"));
        assert_eq!(config.agent.password.as_deref(), Some("pw"));
        assert_eq!(config.listen_addr().unwrap().port(), 9000);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let base = parse("[agent]\nurl = \"https://file\"\n").unwrap();
        let config = base.with_env_overrides(env(&[(ENV_URL, "")]));
        assert_eq!(config.agent.url, "https://file");
    }

    #[test]
    fn test_validate() {
        assert!(matches!(Config::default().validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.agent.url = "https://dma".into();
        config.server.listen = "not an address".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_transport_options() {
        let config = parse("[agent]\nurl = \"https://dma\"\nusername = \"u\"\n").unwrap();
        let options = config.transport_options();
        let credentials = options.credentials.unwrap();
        assert_eq!(credentials.username, "u");
        assert_eq!(credentials.password, "");
        assert_eq!(options.timeout, Duration::from_secs(30));

        assert!(Config::default().transport_options().credentials.is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config::default().with_env_overrides(env(&[(ENV_PASSWORD, "hunter2")]));
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
