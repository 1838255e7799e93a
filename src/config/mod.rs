pub mod cli;
pub mod toml_config;

pub use cli::LocalStorage;
pub use toml_config::{MapConfig, MapSettings};

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "quake-map")]
#[command(about = "Render a web map of recent earthquakes and tectonic plate boundaries")]
pub struct CliConfig {
    /// Path to a TOML map configuration; built-in defaults are used when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long)]
    pub earthquake_feed: Option<String>,

    #[arg(long)]
    pub plates_feed: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    /// Write a single zip archive instead of loose files
    #[arg(long)]
    pub bundle: bool,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Log process CPU and memory after each phase")]
    pub monitor: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    /// Print the resolved configuration and legend without fetching anything
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn load_map_config(&self) -> crate::utils::error::Result<MapConfig> {
        let mut config = match &self.config {
            Some(path) => MapConfig::from_file(path)?,
            None => MapConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Command line flags win over file values.
    pub fn apply_overrides(&self, config: &mut MapConfig) {
        if let Some(url) = &self.earthquake_feed {
            config.feeds.earthquakes = url.clone();
        }
        if let Some(url) = &self.plates_feed {
            config.feeds.tectonic_plates = url.clone();
        }
        if let Some(path) = &self.output_path {
            config.output.path = path.clone();
        }
        if let Some(timeout) = self.timeout_seconds {
            config.feeds.timeout_seconds = timeout;
        }
        if self.bundle {
            config.output.bundle = true;
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }
    }
}
