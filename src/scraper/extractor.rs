use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::outcome::{MISSING_TEXT, UNKNOWN_HOST, UNKNOWN_LABEL};
use crate::domain::{ScrapeOutcome, ScrapeStatus, ScrapeTask};
use crate::normalizer::parse_currency;
use crate::scraper::{PageHandle, ScraperConfig};

const DATES_NOT_AVAILABLE: &str = "Dates not available";

/// What the page settled into after the price/unavailable race.
#[derive(Debug, PartialEq, Eq)]
enum Resolution {
    Price,
    Unavailable(String),
    Timeout,
}

/// Per-task extraction state machine: navigate, resolve, extract.
///
/// Never fails: every path ends in a [`ScrapeOutcome`] whose status is one
/// of the four terminal statuses.
#[derive(Debug, Clone)]
pub struct PriceExtractor {
    config: ScraperConfig,
}

impl PriceExtractor {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    /// Run one task against a page that is open but not yet navigated.
    pub async fn run<P: PageHandle>(&self, page: &P, task: &ScrapeTask) -> ScrapeOutcome {
        let mut outcome = ScrapeOutcome::new(task, ScrapeStatus::Timeout);

        if let Err(message) = self.navigate(page, task).await {
            warn!(room_id = %task.room_id, url = %task.url, "Navigation failed: {}", message);
            outcome.status = ScrapeStatus::NavigationFailed { message };
            outcome.diagnostic_snapshot = self.capture_snapshot(page).await;
            return outcome;
        }

        let selectors = &self.config.selectors;
        outcome.label = self
            .read_field(page, &selectors.label, "Label", &mut outcome.diagnostics)
            .await
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        outcome.host_name = self
            .read_field(page, &selectors.host_name, "Host", &mut outcome.diagnostics)
            .await
            .map(|host| self.strip_host_prefix(&host))
            .unwrap_or_else(|| UNKNOWN_HOST.to_string());

        outcome.status = match self.resolve(page).await {
            Resolution::Unavailable(message) => ScrapeStatus::Unavailable { message },
            Resolution::Timeout => ScrapeStatus::Timeout,
            Resolution::Price => self.extract(page, &mut outcome).await,
        };

        if outcome.is_success() {
            info!(
                room_id = %task.room_id,
                date_range = %task.date_range,
                price = %outcome.price_text,
                "Price resolved"
            );
        } else {
            warn!(
                room_id = %task.room_id,
                date_range = %task.date_range,
                url = %task.url,
                "{}",
                outcome.status.describe()
            );
        }

        if !outcome.is_success() || !outcome.diagnostics.is_empty() {
            outcome.diagnostic_snapshot = self.capture_snapshot(page).await;
        }

        outcome
    }

    async fn navigate<P: PageHandle>(&self, page: &P, task: &ScrapeTask) -> Result<(), String> {
        let limit = self.config.navigation_timeout();
        match timeout(limit, page.navigate(task.url.as_str(), &self.config.referrer)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("Navigation timed out after {}ms", limit.as_millis())),
        }
    }

    /// Race the two indicators, then inspect both.
    ///
    /// The unavailable indicator is checked first, so it wins whenever both
    /// are present.
    async fn resolve<P: PageHandle>(&self, page: &P) -> Resolution {
        let selectors = &self.config.selectors;
        let settled = self.race_indicators(page).await;
        debug!(settled, "Price/unavailable race finished");

        if self.is_present(page, &selectors.unavailable_dates).await {
            let message = match self.bounded(page.text(&selectors.unavailable_dates)).await {
                Some(Ok(Some(text))) if !text.trim().is_empty() => text.trim().to_string(),
                _ => DATES_NOT_AVAILABLE.to_string(),
            };
            return Resolution::Unavailable(message);
        }

        if self.is_present(page, &selectors.price).await {
            Resolution::Price
        } else {
            Resolution::Timeout
        }
    }

    /// `true` once either indicator appears, `false` if both waits time out.
    async fn race_indicators<P: PageHandle>(&self, page: &P) -> bool {
        let selectors = &self.config.selectors;
        let within = self.config.resolve_timeout();
        let poll = self.config.poll_interval();

        let price = wait_for_selector(page, &selectors.price, within, poll);
        let unavailable = wait_for_selector(page, &selectors.unavailable_dates, within, poll);
        tokio::pin!(price, unavailable);

        tokio::select! {
            found = &mut price => found || unavailable.await,
            found = &mut unavailable => found || price.await,
        }
    }

    /// Read price, fee and special offer once the price indicator is present.
    async fn extract<P: PageHandle>(&self, page: &P, outcome: &mut ScrapeOutcome) -> ScrapeStatus {
        let selectors = &self.config.selectors;

        match self
            .read_field(page, &selectors.price, "Price", &mut outcome.diagnostics)
            .await
        {
            Some(text) if parse_currency(&text).is_some() => outcome.price_text = text,
            Some(text) => {
                outcome
                    .diagnostics
                    .push(format!("Unreadable price text: {}.", text));
                outcome.price_text = text;
                return ScrapeStatus::Timeout;
            }
            None => return ScrapeStatus::Timeout,
        }

        outcome.fee_text = self
            .read_field(page, &selectors.fee, "Fee", &mut outcome.diagnostics)
            .await
            .unwrap_or_else(|| MISSING_TEXT.to_string());

        if self.is_present(page, &selectors.special_offer).await {
            outcome.special_offer_text = self
                .read_field(
                    page,
                    &selectors.special_offer,
                    "Special offer",
                    &mut outcome.diagnostics,
                )
                .await;
        }

        ScrapeStatus::Success
    }

    /// Read a field's text; on any failure note it and return `None`.
    async fn read_field<P: PageHandle>(
        &self,
        page: &P,
        selector: &str,
        name: &str,
        diagnostics: &mut Vec<String>,
    ) -> Option<String> {
        match self.bounded(page.text(selector)).await {
            Some(Ok(Some(text))) if !text.trim().is_empty() => return Some(text.trim().to_string()),
            Some(Ok(_)) => {}
            Some(Err(e)) => debug!(selector, error = %e, "{} read failed", name),
            None => debug!(selector, "{} read timed out", name),
        }
        diagnostics.push(format!("{} not found.", name));
        None
    }

    async fn is_present<P: PageHandle>(&self, page: &P, selector: &str) -> bool {
        match self.bounded(page.has_element(selector)).await {
            Some(Ok(present)) => present,
            Some(Err(e)) => {
                debug!(selector, error = %e, "Element lookup failed");
                false
            }
            None => false,
        }
    }

    /// Best-effort sidebar markup; failures here never affect the status.
    async fn capture_snapshot<P: PageHandle>(&self, page: &P) -> Option<String> {
        if !self.config.capture_snapshots {
            return None;
        }
        match self.bounded(page.inner_html(&self.config.selectors.sidebar)).await {
            Some(Ok(html)) => html,
            Some(Err(e)) => {
                debug!(error = %e, "Snapshot capture failed");
                None
            }
            None => None,
        }
    }

    fn strip_host_prefix(&self, host: &str) -> String {
        host.replace(self.config.selectors.host_prefix.as_str(), "")
            .trim()
            .to_string()
    }

    /// Bound a single page read by the resolve timeout.
    async fn bounded<F: std::future::Future>(&self, fut: F) -> Option<F::Output> {
        timeout(self.config.resolve_timeout(), fut).await.ok()
    }
}

/// Poll until `selector` matches or `within` elapses.
async fn wait_for_selector<P: PageHandle>(
    page: &P,
    selector: &str,
    within: Duration,
    poll: Duration,
) -> bool {
    let wait = async {
        loop {
            match page.has_element(selector).await {
                Ok(true) => return,
                Ok(false) => {}
                Err(e) => debug!(selector, error = %e, "Selector poll failed"),
            }
            tokio::time::sleep(poll).await;
        }
    };
    timeout(within, wait).await.is_ok()
}
