//! Configuration system for the habit client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/habit/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use habit_proto::dates::DISPLAY_DATE_FORMAT;

use crate::cli::Command;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    ui: UiFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    diagnostic_host: Option<String>,
    expected_path_prefix: Option<String>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    date_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Task API connection settings (used by `HttpTaskApi`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Base URL endpoint paths are appended to.
    pub base_url: String,
    /// Whole-request timeout; `None` leaves the transport default.
    pub request_timeout: Option<Duration>,
    /// `host[:port]` of the backend, for the missing-prefix diagnostic.
    pub diagnostic_host: String,
    /// Path prefix every backend request is expected to contain.
    pub expected_path_prefix: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            request_timeout: None,
            diagnostic_host: "localhost:8080".to_string(),
            expected_path_prefix: "/api/".to_string(),
        }
    }
}

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API connection settings.
    pub api: ApiSettings,
    /// Date display format string (chrono).
    pub date_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            date_format: DISPLAY_DATE_FORMAT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// CLI args and env vars are parsed via `clap`. If `--config` is given
    /// and the file does not exist, returns an error. If no `--config` is
    /// given, the default path (`~/.config/habit/config.toml`) is tried
    /// and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and env vars alone, as if no
    /// config file existed.
    ///
    /// Used when the default config file is unreadable, so CLI and env
    /// overrides still apply.
    #[must_use]
    pub fn from_cli(cli: &CliArgs) -> Self {
        Self::resolve(cli, &ConfigFile::default())
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            api: ApiSettings {
                base_url: cli
                    .api_url
                    .clone()
                    .or_else(|| file.api.base_url.clone())
                    .unwrap_or(defaults.api.base_url),
                request_timeout: cli
                    .timeout_secs
                    .or(file.api.request_timeout_secs)
                    .map(Duration::from_secs)
                    .or(defaults.api.request_timeout),
                diagnostic_host: file
                    .api
                    .diagnostic_host
                    .clone()
                    .unwrap_or(defaults.api.diagnostic_host),
                expected_path_prefix: file
                    .api
                    .expected_path_prefix
                    .clone()
                    .unwrap_or(defaults.api.expected_path_prefix),
            },
            date_format: cli
                .date_format
                .clone()
                .or_else(|| file.ui.date_format.clone())
                .unwrap_or(defaults.date_format),
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Track daily habits against the task API")]
pub struct CliArgs {
    /// Base URL of the task API (e.g. `http://localhost:8080/api`).
    #[arg(long, global = true, env = "HABIT_API_URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds (default: none).
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Path to config file (default: `~/.config/habit/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Date display format (chrono format string).
    #[arg(long, global = true)]
    pub date_format: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info", env = "HABIT_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/habit.log`).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// What to do; lists tasks when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("habit").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
