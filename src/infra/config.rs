use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::core::error::ConfigError;

pub const DEFAULT_TWITTER_BASE_URL: &str = "https://api.twitter.com";
pub const DEFAULT_MEMORY_LOL_BASE_URL: &str = "https://api.memory.lol";
pub const DEFAULT_SERPER_BASE_URL: &str = "https://google.serper.dev";

const DEFAULT_CONFIG_PATH: &str = "twitter-mcp.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Server,
    Stdio,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Server => f.write_str("server"),
            Mode::Stdio => f.write_str("stdio"),
        }
    }
}

impl Mode {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw {
            "server" => Ok(Mode::Server),
            "stdio" => Ok(Mode::Stdio),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

pub struct Config {
    pub mode: Mode,
    pub port: u16,
}

impl Config {
    /// Lenient: an unknown MODE falls back to server, a bad PORT to 8080.
    /// `validate` reports those instead.
    pub fn from_env() -> Self {
        let mode = std::env::var("MODE")
            .ok()
            .and_then(|m| Mode::parse(&m).ok())
            .unwrap_or(Mode::Server);
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.trim().parse::<u16>().ok())
            .unwrap_or(8080);

        Self { mode, port }
    }

    pub fn validate() -> Result<Self, ConfigError> {
        let mode = match std::env::var("MODE") {
            Ok(raw) => Mode::parse(&raw)?,
            Err(_) => Mode::Server,
        };
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            Err(_) => 8080,
        };
        if mode == Mode::Server && port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        Ok(Self { mode, port })
    }
}

/// Per-upstream HTTP settings, read from the `[twitter]`, `[memory_lol]` and
/// `[serper]` tables of the TOML config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolConfig {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
}

impl ToolConfig {
    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(10_000))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.unwrap_or(3_000))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub twitter: ToolConfig,
    #[serde(default)]
    pub memory_lol: ToolConfig,
    #[serde(default)]
    pub serper: ToolConfig,
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Reads `TWITTER_MCP_CONFIG` (or `twitter-mcp.toml` when present), then
    /// applies the `*_BASE_URL` environment overrides.
    pub fn from_env_and_toml() -> Self {
        let explicit = std::env::var("TWITTER_MCP_CONFIG").ok();
        let path = explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let mut cfg = match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path, error = %e, "ignoring unparseable config file");
                Self::default()
            }),
            Err(e) => {
                if explicit.is_some() {
                    tracing::warn!(path, error = %e, "config file not readable");
                }
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        cfg
    }

    pub fn apply_env_overrides(&mut self) {
        let pairs = [
            ("TWITTER_API_BASE_URL", &mut self.twitter),
            ("MEMORY_LOL_BASE_URL", &mut self.memory_lol),
            ("SERPER_BASE_URL", &mut self.serper),
        ];
        for (var, tool) in pairs {
            if let Ok(base) = std::env::var(var) {
                if !base.trim().is_empty() {
                    tool.base_url = Some(base);
                }
            }
        }
    }
}

/// OAuth 1.0a user-context credentials plus the optional app bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    pub bearer_token: Option<String>,
}

impl fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TwitterCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        fn var(name: &'static str, missing: &mut Vec<&'static str>) -> String {
            match std::env::var(name) {
                Ok(v) if !v.trim().is_empty() => v,
                _ => {
                    missing.push(name);
                    String::new()
                }
            }
        }

        let mut missing = Vec::new();
        let consumer_key = var("X_api_key", &mut missing);
        let consumer_secret = var("X_api_key_sec", &mut missing);
        let access_token = var("X_access_token", &mut missing);
        let access_token_secret = var("X_access_token_sec", &mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnv(missing));
        }

        let bearer_token = std::env::var("X_bearer_token")
            .ok()
            .filter(|b| !b.trim().is_empty());

        Ok(Self {
            consumer_key,
            consumer_secret,
            access_token,
            access_token_secret,
            bearer_token,
        })
    }
}

pub fn serper_key_from_env() -> Option<String> {
    std::env::var("serper_api").ok().filter(|k| !k.trim().is_empty())
}
