//! Configuration management for staywatch.
//!
//! Configuration is read from `~/.config/staywatch/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::planner::PlannerConfig;
use crate::scraper::ScraperConfig;

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub planner: PlannerConfig,
    pub store: StoreConfig,
}

/// Where prices, rooms and run summaries are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file; defaults to `<data_dir>/staywatch/staywatch.db`
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_config_path()?)
    }

    /// Load configuration from `path`, creating a commented default there if missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/staywatch/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("staywatch").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    pub fn default_config_content() -> String {
        r##"# staywatch configuration
#
# Every key is optional; missing keys use the values shown here.

[scraper]
# Run the browser without a visible window
headless = true

# Page load timeout (milliseconds)
navigation_timeout_ms = 30000

# How long to wait for the price or the unavailable-dates notice (milliseconds).
# Values between 2000 and 10000 work well.
resolve_timeout_ms = 2000

# Selector polling interval while waiting (milliseconds)
poll_interval_ms = 100

# Listings visited at once, each in its own browser context.
# 1 visits them one by one on a single page.
concurrency = 7

# Referrer sent with every page load
referrer = "https://www.airbnb.com.br/"

# Keep the booking sidebar markup of pages that did not resolve cleanly
capture_snapshots = true

[scraper.selectors]
label = "h1"
host_name = "[data-section-id=\"HOST_OVERVIEW_DEFAULT\"] h2"
price = "[data-section-id=\"BOOK_IT_SIDEBAR\"] span._1y74zjx"
fee = "[data-section-id=\"BOOK_IT_SIDEBAR\"] section ._1k4xcdh"
special_offer = "[data-section-id=\"BOOK_IT_SIDEBAR\"] ._1qs94rc"
unavailable_dates = "[data-testid=\"bookit-sidebar-availability-error\"]"
sidebar = "[data-section-id=\"BOOK_IT_SIDEBAR\"]"
host_prefix = "Anfitriã(o):"

[planner]
# Listing URL prefix; the room id is appended
base_url = "https://www.airbnb.com.br/rooms"

# Nights per quoted stay
nights = 3
guests = 1
adults = 1

[store]
# SQLite database file (default: <data dir>/staywatch/staywatch.db)
# db_path = "/var/lib/staywatch/staywatch.db"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
