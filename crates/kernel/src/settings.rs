use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "LOCALREADS_ENV";
const CONFIG_DIR_ENV: &str = "LOCALREADS_CONFIG_DIR";
const ENV_PREFIX: &str = "LOCALREADS";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub library: LibrarySettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub isbn: IsbnSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// and `LOCALREADS_*` variables (`__` separates nested keys).
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .context("unable to resolve current directory")?,
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    pub fn load_from(config_dir: &std::path::Path, environment: &str) -> anyhow::Result<Self> {
        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = match environment {
            "local" => Environment::Local,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(anyhow!(
                    "unsupported environment '{}'; expected local/staging/production",
                    other
                ));
            }
        };

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8000
    }

    fn default_request_timeout_ms() -> u64 {
        // scans of large folders run inside a request
        120_000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_url")]
    pub url: String,
    #[serde(default = "DatabaseSettings::default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn default_url() -> String {
        "sqlite:localreads.db".to_string()
    }

    fn default_max_connections() -> u32 {
        5
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            max_connections: Self::default_max_connections(),
        }
    }
}

/// Where books, extracted covers, and CLI view state live on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct LibrarySettings {
    #[serde(default = "LibrarySettings::default_books_dir")]
    pub books_dir: PathBuf,
    #[serde(default = "LibrarySettings::default_covers_dir")]
    pub covers_dir: PathBuf,
    #[serde(default = "LibrarySettings::default_state_file")]
    pub state_file: PathBuf,
    /// TrueType font for generated covers; a system font is looked up when unset.
    #[serde(default)]
    pub cover_font: Option<PathBuf>,
}

impl LibrarySettings {
    fn default_books_dir() -> PathBuf {
        PathBuf::from("books")
    }

    fn default_covers_dir() -> PathBuf {
        PathBuf::from("covers")
    }

    fn default_state_file() -> PathBuf {
        PathBuf::from(".localreads-selection")
    }
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            books_dir: Self::default_books_dir(),
            covers_dir: Self::default_covers_dir(),
            state_file: Self::default_state_file(),
            cover_font: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Upstream metadata source for ISBN lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct IsbnSettings {
    #[serde(default = "IsbnSettings::default_base_url")]
    pub base_url: String,
    #[serde(default = "IsbnSettings::default_covers_url")]
    pub covers_url: String,
    #[serde(default = "IsbnSettings::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl IsbnSettings {
    fn default_base_url() -> String {
        "https://openlibrary.org".to_string()
    }

    fn default_covers_url() -> String {
        "https://covers.openlibrary.org".to_string()
    }

    fn default_timeout_secs() -> u64 {
        10
    }
}

impl Default for IsbnSettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            covers_url: Self::default_covers_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}
