//! Browser-driven price scraping.
//!
//! # Architecture
//!
//! ```text
//! ScrapeTask[] → Orchestrator → Scheduler (batches of C) → PriceExtractor → ScrapeOutcome[]
//!                     │
//!                     └── owns one BrowserSession for the whole run
//! ```
//!
//! The browser is reached only through the [`Launcher`], [`BrowserSession`]
//! and [`PageHandle`] traits. [`ChromeLauncher`] is the chromiumoxide
//! implementation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use staywatch::scraper::{ChromeLauncher, Orchestrator, ScraperConfig};
//!
//! let config = ScraperConfig::default().with_concurrency(7);
//! let launcher = ChromeLauncher::new(config.clone());
//! let outcomes = Orchestrator::new(config).run(&launcher, tasks).await?;
//! ```

mod chrome;
mod config;
mod extractor;
#[cfg(test)]
pub(crate) mod fixture;
mod orchestrator;
mod scheduler;

pub use chrome::{ChromeLauncher, ChromePage, ChromeSession};
pub use config::{ScraperConfig, SelectorConfig, DEFAULT_CONCURRENCY};
pub use extractor::PriceExtractor;
pub use orchestrator::Orchestrator;
pub use scheduler::{ScheduleMode, Scheduler};

use async_trait::async_trait;

use crate::app::Result;

/// A rendered page the extraction state machine can drive.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Load `url` with the given referrer and wait for the document.
    ///
    /// No timeout is applied here; callers bound the call themselves.
    async fn navigate(&self, url: &str, referrer: &str) -> Result<()>;

    /// Whether at least one element matches `selector` right now.
    async fn has_element(&self, selector: &str) -> Result<bool>;

    /// Rendered text of the first element matching `selector`.
    async fn text(&self, selector: &str) -> Result<Option<String>>;

    /// Inner markup of the first element matching `selector`.
    async fn inner_html(&self, selector: &str) -> Result<Option<String>>;
}

/// How a page is opened on the shared browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Fresh browsing context with its own cookies and storage.
    Isolated,
    /// Page in the browser's default context.
    Shared,
}

/// One running browser process, shared by every task of a run.
#[async_trait]
pub trait BrowserSession: Send + Sync + Sized {
    type Page: PageHandle;

    async fn open_page(&self, mode: PageMode) -> Result<Self::Page>;

    /// Close the page and dispose of its browsing context, if any.
    async fn release_page(&self, page: Self::Page) -> Result<()>;

    /// Terminate the browser process.
    async fn shutdown(self) -> Result<()>;
}

/// Starts a [`BrowserSession`] for a run.
#[async_trait]
pub trait Launcher: Send + Sync {
    type Session: BrowserSession;

    async fn launch(&self) -> Result<Self::Session>;
}
