use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use greeter_engine::{SiteProfile, Timings, DEFAULT_API_BASE_URL};
use log::LevelFilter;
use run_logging::LogDestination;
use serde::Deserialize;

use crate::cli::Cli;

const DEFAULT_CONFIG_FILE: &str = "greeter.ron";
const DEFAULT_STATE_DIR: &str = "./.greeter";

/// Settings as written in the RON config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    api_base_url: Option<String>,
    state_dir: Option<PathBuf>,
    log_destination: Option<String>,
    log_level: Option<String>,
    profile: Option<PathBuf>,
    timings: Option<Timings>,
}

#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    pub api_base_url: String,
    pub state_dir: PathBuf,
    pub log_destination: LogDestination,
    pub log_level: LevelFilter,
    pub profile: SiteProfile,
    pub timings: Timings,
}

impl AppConfig {
    /// Defaults, then the config file, then environment and flags (already
    /// merged by clap).
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match cli.config.as_deref() {
            Some(path) => read_file_config(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                read_file_config(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => FileConfig::default(),
        };
        Self::resolve(file, cli)
    }

    fn resolve(file: FileConfig, cli: &Cli) -> Result<Self> {
        let destination = cli
            .log
            .clone()
            .or(file.log_destination)
            .map(|raw| LogDestination::from_str(&raw))
            .transpose()
            .context("invalid log destination")?
            .unwrap_or_default();

        let log_level = match cli.log_level.clone().or(file.log_level) {
            Some(raw) => LevelFilter::from_str(raw.trim())
                .map_err(|_| anyhow!("invalid log level {raw:?}"))?,
            None => LevelFilter::Info,
        };

        let profile = match cli.profile.clone().or(file.profile) {
            Some(path) => SiteProfile::load(&path)
                .with_context(|| format!("loading locator profile {}", path.display()))?,
            None => SiteProfile::default(),
        };

        Ok(Self {
            api_base_url: cli
                .api_url
                .clone()
                .or(file.api_base_url)
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            state_dir: cli
                .state_dir
                .clone()
                .or(file.state_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
            log_destination: destination,
            log_level,
            profile,
            timings: file.timings.unwrap_or_default(),
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    ron::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
}
