use anyhow::{Context, Result};
use catholic_calendar_core::FeedConfig;
use catholic_calendar_core::config::{
    DEFAULT_DOMAIN, DEFAULT_NAME, DEFAULT_PRODID, DEFAULT_TIMEZONE, normalize_optional,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_CALENDAR: &str = "general";
pub const DEFAULT_METHOD: &str = "PUBLISH";
pub const DEFAULT_REFRESH_INTERVAL: &str = "P1D";
pub const DEFAULT_PUBLISHED_TTL: &str = "P1D";

/// Optional defaults read from ~/.config/catholic-calendar/config.toml
///
/// Every key mirrors a command line flag. Flags win over the file, the file
/// wins over built-in defaults. Set `method`, `refresh_interval` or
/// `published_ttl` to "" or "none" to leave the property out of the feed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: Option<String>,
    pub calendar: Option<String>,
    pub include_optional: Option<bool>,
    pub romcal_script: Option<String>,

    pub name: Option<String>,
    pub prodid: Option<String>,
    pub domain: Option<String>,
    pub timezone: Option<String>,
    pub method: Option<String>,
    pub refresh_interval: Option<String>,
    pub published_ttl: Option<String>,
}

/// Feed options as given on the command line.
#[derive(Debug, Default, Clone)]
pub struct FeedOverrides {
    pub name: Option<String>,
    pub prodid: Option<String>,
    pub domain: Option<String>,
    pub timezone: Option<String>,
    pub method: Option<String>,
    pub refresh_interval: Option<String>,
    pub published_ttl: Option<String>,
}

impl Config {
    /// Merge command line overrides with this file and the defaults.
    pub fn feed_config(&self, overrides: FeedOverrides) -> FeedConfig {
        let pick = |flag: Option<String>, file: &Option<String>, default: &str| {
            flag.or_else(|| file.clone())
                .unwrap_or_else(|| default.to_string())
        };
        let optional = |flag: Option<String>, file: &Option<String>, default: &str| {
            normalize_optional(Some(pick(flag, file, default).as_str()))
        };

        FeedConfig {
            name: pick(overrides.name, &self.name, DEFAULT_NAME),
            prodid: pick(overrides.prodid, &self.prodid, DEFAULT_PRODID),
            domain: pick(overrides.domain, &self.domain, DEFAULT_DOMAIN),
            timezone: pick(overrides.timezone, &self.timezone, DEFAULT_TIMEZONE),
            method: optional(overrides.method, &self.method, DEFAULT_METHOD),
            refresh_interval: optional(
                overrides.refresh_interval,
                &self.refresh_interval,
                DEFAULT_REFRESH_INTERVAL,
            ),
            published_ttl: optional(
                overrides.published_ttl,
                &self.published_ttl,
                DEFAULT_PUBLISHED_TTL,
            ),
        }
    }
}

/// Get the config file path (~/.config/catholic-calendar/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("catholic-calendar");
    Ok(config_dir.join("config.toml"))
}

/// Load the config file.
///
/// An explicitly given path must exist. The default location is optional
/// and yields an empty config when absent.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => match config_path() {
            Ok(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Expand ~ in paths to the home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
