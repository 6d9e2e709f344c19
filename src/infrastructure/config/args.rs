use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "artloader",
    version,
    about = "Loads album artwork through the asynchronous artwork pipeline",
    long_about = None
)]
pub struct CliArgs {
    /// Content ids to load.
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Read artwork from `<DIR>/<id>.{png,jpg,jpeg,webp}`.
    #[arg(long, value_name = "DIR", conflicts_with = "server_url")]
    pub source_dir: Option<PathBuf>,

    /// Media server base URL.
    #[arg(long, value_name = "URL")]
    pub server_url: Option<String>,

    /// Media server account name.
    #[arg(long)]
    pub username: Option<String>,

    /// Media server password.
    #[arg(long, env = "ARTLOADER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Number of loader workers.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Screen width used to size large artwork.
    #[arg(long, value_name = "PX")]
    pub display_width: Option<u32>,

    /// Screen height used to size large artwork.
    #[arg(long, value_name = "PX")]
    pub display_height: Option<u32>,

    /// Request large, reflected artwork.
    #[arg(long)]
    pub large: bool,

    /// Crossfade into loaded artwork.
    #[arg(long)]
    pub crossfade: bool,

    /// Directory the loaded artwork is written to as PNG.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,

    /// Seconds to wait for every request to resolve.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,
}
