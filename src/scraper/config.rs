use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of concurrent browsing contexts per batch
pub const DEFAULT_CONCURRENCY: usize = 7;

/// Configuration for the listing scraper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Page navigation timeout in milliseconds (default: 30000)
    pub navigation_timeout_ms: u64,

    /// How long to wait for either the price or the unavailable-dates
    /// indicator, in milliseconds (default: 2000)
    pub resolve_timeout_ms: u64,

    /// Interval between selector polls while waiting, in milliseconds (default: 100)
    pub poll_interval_ms: u64,

    /// Tasks per batch; 1 selects sequential mode on a single reused page (default: 7)
    pub concurrency: usize,

    /// Referrer sent with every navigation
    pub referrer: String,

    /// User agent string to use
    pub user_agent: Option<String>,

    /// Capture booking sidebar markup when a task does not resolve cleanly
    pub capture_snapshots: bool,

    /// CSS selectors for the listing page
    pub selectors: SelectorConfig,
}

/// CSS selectors read from a rendered listing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub label: String,
    pub host_name: String,
    pub price: String,
    pub fee: String,
    pub special_offer: String,
    pub unavailable_dates: String,
    /// Booking sidebar captured as the diagnostic snapshot
    pub sidebar: String,
    /// Prefix stripped from the host name text
    pub host_prefix: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout_ms: 30_000,
            resolve_timeout_ms: 2000,
            poll_interval_ms: 100,
            concurrency: DEFAULT_CONCURRENCY,
            referrer: "https://www.airbnb.com.br/".to_string(),
            user_agent: Some(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            capture_snapshots: true,
            selectors: SelectorConfig::default(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            label: "h1".to_string(),
            host_name: "[data-section-id=\"HOST_OVERVIEW_DEFAULT\"] h2".to_string(),
            price: "[data-section-id=\"BOOK_IT_SIDEBAR\"] span._1y74zjx".to_string(),
            fee: "[data-section-id=\"BOOK_IT_SIDEBAR\"] section ._1k4xcdh".to_string(),
            special_offer: "[data-section-id=\"BOOK_IT_SIDEBAR\"] ._1qs94rc".to_string(),
            unavailable_dates: "[data-testid=\"bookit-sidebar-availability-error\"]".to_string(),
            sidebar: "[data-section-id=\"BOOK_IT_SIDEBAR\"]".to_string(),
            host_prefix: "Anfitriã(o):".to_string(),
        }
    }
}

impl ScraperConfig {
    /// Get the navigation timeout as a Duration
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Get the price/unavailable resolution timeout as a Duration
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    /// Get the selector poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Same config with a different concurrency, clamped to at least 1
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Create a config that waits longer for slow listing pages
    pub fn patient() -> Self {
        Self {
            resolve_timeout_ms: 10_000,
            poll_interval_ms: 250,
            concurrency: 3,
            ..Default::default()
        }
    }
}
