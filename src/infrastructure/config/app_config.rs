//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use crate::infrastructure::artwork::DEFAULT_DISK_CACHE_BYTES;
use crate::infrastructure::image::{DisplayMetrics, LoaderConfig};

pub(crate) const APP_NAME: &str = "artloader";
pub(crate) const APP_QUALIFIER: &str = "org";
pub(crate) const APP_ORGANIZATION: &str = "artloader";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from `config.toml` and overridden by
/// command-line flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Loader tuning.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Screen size used to size large artwork.
    #[serde(default)]
    pub display: DisplayMetrics,

    /// Where artwork comes from.
    #[serde(default)]
    pub source: SourceConfig,
}

/// Artwork source configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Media server base URL.
    pub server_url: Option<String>,
    /// Server account name.
    pub username: String,
    /// Server account password.
    pub password: String,
    /// Client name reported to the server.
    pub client_name: String,
    /// Directory for persisted large artwork. Defaults to the cache dir.
    pub cache_dir: Option<PathBuf>,
    /// Byte budget for persisted artwork.
    pub disk_cache_bytes: u64,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Local directory of `<id>.<ext>` files, used instead of a server.
    pub directory: Option<PathBuf>,
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_name", &self.client_name)
            .field("cache_dir", &self.cache_dir)
            .field("disk_cache_bytes", &self.disk_cache_bytes)
            .field("timeout_secs", &self.timeout_secs)
            .field("directory", &self.directory)
            .finish()
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            username: String::new(),
            password: String::new(),
            client_name: APP_NAME.to_string(),
            cache_dir: None,
            disk_cache_bytes: DEFAULT_DISK_CACHE_BYTES,
            timeout_secs: 30,
            directory: None,
        }
    }
}

impl SourceConfig {
    /// HTTP request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Directory for persisted artwork, falling back to the platform cache dir.
    #[must_use]
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

impl AppConfig {
    /// Applies command-line overrides.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(dir) = &args.source_dir {
            self.source.directory = Some(dir.clone());
            self.source.server_url = None;
        }
        if let Some(url) = &args.server_url {
            self.source.server_url = Some(url.clone());
            self.source.directory = None;
        }
        if let Some(username) = &args.username {
            self.source.username.clone_from(username);
        }
        if let Some(password) = &args.password {
            self.source.password.clone_from(password);
        }
        if let Some(workers) = args.workers {
            self.loader.worker_count = workers;
        }
        if let Some(width) = args.display_width {
            self.display.width_px = width;
        }
        if let Some(height) = args.display_height {
            self.display.height_px = height;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("artloader.log"))
    }

    /// Returns the log path in effect.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

fn default_cache_dir() -> PathBuf {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME).map_or_else(
        || std::env::temp_dir().join(APP_NAME).join("artwork"),
        |dirs| dirs.cache_dir().join("artwork"),
    )
}
