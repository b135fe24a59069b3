//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `voicehub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.
//!
//! The log filter is taken from `VOICEHUB_LOG` first, then `RUST_LOG`, then
//! `logging.filter` in the file.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use voicehub_app::grammar_worker::GrammarWorkerConfig;
use voicehub_domain::grammar::GrammarOptions;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Grammar regeneration settings.
    pub grammar: GrammarConfig,
    /// Dispatch settings.
    pub dispatch: DispatchConfig,
    /// Startup import.
    pub import: ImportConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Grammar worker configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Quiet period after the last registry change before regenerating.
    pub debounce_ms: u64,
    /// Step between the emitted percent values.
    pub percent_step: u32,
    /// Step between the emitted temperature values, on the 1 to 100 scale.
    pub temperature_step: u32,
}

/// Dispatch configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Upper bound for a single backend call.
    pub timeout_ms: u64,
}

/// Import run once at startup.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// JSON file holding a list of raw device descriptors.
    pub seed_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `voicehub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("voicehub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("VOICEHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("VOICEHUB_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("VOICEHUB_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("VOICEHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(filter) = log_filter_override(
            std::env::var("VOICEHUB_LOG").ok(),
            std::env::var("RUST_LOG").ok(),
        ) {
            self.logging.filter = filter;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.grammar.percent_step == 0 || self.grammar.percent_step > 100 {
            return Err(ConfigError::Validation(
                "grammar.percent_step must be within 1..=100".to_string(),
            ));
        }
        if self.grammar.temperature_step == 0 || self.grammar.temperature_step > 100 {
            return Err(ConfigError::Validation(
                "grammar.temperature_step must be within 1..=100".to_string(),
            ));
        }
        if self.dispatch.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "dispatch.timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Settings handed to the grammar worker.
    #[must_use]
    pub fn grammar_worker(&self) -> GrammarWorkerConfig {
        GrammarWorkerConfig {
            debounce: Duration::from_millis(self.grammar.debounce_ms),
            options: GrammarOptions {
                percent_step: self.grammar.percent_step,
                temperature_step: self.grammar.temperature_step,
            },
        }
    }

    #[must_use]
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch.timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:voicehub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "voicehubd=info,voicehub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for GrammarConfig {
    fn default() -> Self {
        let options = GrammarOptions::default();
        Self {
            debounce_ms: 500,
            percent_step: options.percent_step,
            temperature_step: options.temperature_step,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { timeout_ms: 5_000 }
    }
}

/// `VOICEHUB_LOG` wins over `RUST_LOG`; `None` keeps the file value.
fn log_filter_override(voicehub_log: Option<String>, rust_log: Option<String>) -> Option<String> {
    voicehub_log.or(rust_log)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
