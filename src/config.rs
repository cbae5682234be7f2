use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::migrate::order::TraversalOrder;

pub const DEFAULT_TRELLO_URL: &str = "https://api.trello.com/1";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub trello: Option<TrelloConfig>,
    pub planka: Option<PlankaConfig>,
    #[serde(default)]
    pub migration: MigrationConfig,
}

#[derive(Debug, Deserialize)]
pub struct TrelloConfig {
    pub api_key: String,
    pub token: String,
    #[serde(default = "default_trello_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct PlankaConfig {
    /// API root, e.g. `https://planka.example.com/api`
    pub url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub add_date_to_filename: bool,
    pub timezone: String,
    pub request_delay_ms: u64,
    pub scratch_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    /// Replay order of fetched siblings; `reverse` suits Planka's top insert.
    pub order: TraversalOrder,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            add_date_to_filename: true,
            timezone: "Europe/Moscow".into(),
            request_delay_ms: 250,
            scratch_dir: std::env::temp_dir(),
            log_file: None,
            order: TraversalOrder::Reverse,
        }
    }
}

impl MigrationConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown timezone '{}': {e}", self.timezone))
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| data_dir().join("log.txt"))
    }
}

impl AppConfig {
    /// Both services must be configured before a run can start.
    pub fn require_services(&self, path: &Path) -> Result<(&TrelloConfig, &PlankaConfig)> {
        let Some(trello) = &self.trello else {
            bail!("Missing [trello] section in {}", path.display());
        };
        let Some(planka) = &self.planka else {
            bail!("Missing [planka] section in {}", path.display());
        };
        Ok((trello, planka))
    }
}

fn default_trello_url() -> String {
    DEFAULT_TRELLO_URL.to_string()
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".planka-migrate")
}

pub fn config_path() -> PathBuf {
    std::env::var_os("PLANKA_MIGRATE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir().join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        bail!(
            "Config file not found at {}. Create it with [trello] and [planka] sections",
            path.display()
        );
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents)?;
    config.migration.timezone()?;
    Ok(config)
}
