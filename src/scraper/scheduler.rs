use std::panic::AssertUnwindSafe;

use futures::future::join_all;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::domain::{ScrapeOutcome, ScrapeTask};
use crate::scraper::{BrowserSession, PageHandle, PageMode, PriceExtractor, ScraperConfig};

/// How tasks are spread over browsing contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// One reused page in the default context, one task at a time.
    Sequential,
    /// Consecutive groups of this size, each task in its own isolated context.
    Batched(usize),
}

impl ScheduleMode {
    pub fn from_concurrency(concurrency: usize) -> Self {
        if concurrency <= 1 {
            ScheduleMode::Sequential
        } else {
            ScheduleMode::Batched(concurrency)
        }
    }
}

/// Bounded-concurrency task scheduler.
///
/// Produces exactly one outcome per input task. Batches run in input order;
/// a batch (including release of its contexts) finishes before the next one
/// starts, so at most `C` page sessions are open at any time.
pub struct Scheduler {
    extractor: PriceExtractor,
    mode: ScheduleMode,
}

impl Scheduler {
    pub fn new(config: ScraperConfig) -> Self {
        let mode = ScheduleMode::from_concurrency(config.concurrency);
        Self {
            extractor: PriceExtractor::new(config),
            mode,
        }
    }

    pub async fn run<S: BrowserSession>(&self, session: &S, tasks: &[ScrapeTask]) -> Vec<ScrapeOutcome> {
        match self.mode {
            ScheduleMode::Sequential => self.run_sequential(session, tasks).await,
            ScheduleMode::Batched(size) => self.run_batched(session, tasks, size).await,
        }
    }

    async fn run_batched<S: BrowserSession>(
        &self,
        session: &S,
        tasks: &[ScrapeTask],
        size: usize,
    ) -> Vec<ScrapeOutcome> {
        let batches = tasks.len().div_ceil(size);
        let mut outcomes = Vec::with_capacity(tasks.len());

        for (index, batch) in tasks.chunks(size).enumerate() {
            debug!(batch = index + 1, tasks = batch.len(), "Starting batch");
            let results = join_all(batch.iter().map(|task| self.run_isolated(session, task))).await;
            outcomes.extend(results);
            info!("Batch {}/{} complete ({} tasks)", index + 1, batches, batch.len());
        }

        outcomes
    }

    async fn run_isolated<S: BrowserSession>(&self, session: &S, task: &ScrapeTask) -> ScrapeOutcome {
        let page = match session.open_page(PageMode::Isolated).await {
            Ok(page) => page,
            Err(e) => {
                warn!(room_id = %task.room_id, "Failed to open browsing context: {}", e);
                return ScrapeOutcome::navigation_failed(
                    task,
                    format!("Failed to open browsing context: {}", e),
                );
            }
        };

        let outcome = self.run_guarded(&page, task).await;

        if let Err(e) = session.release_page(page).await {
            warn!(room_id = %task.room_id, "Failed to release browsing context: {}", e);
        }
        outcome
    }

    async fn run_sequential<S: BrowserSession>(
        &self,
        session: &S,
        tasks: &[ScrapeTask],
    ) -> Vec<ScrapeOutcome> {
        let page = match session.open_page(PageMode::Shared).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to open page: {}", e);
                let message = format!("Failed to open page: {}", e);
                return tasks
                    .iter()
                    .map(|task| ScrapeOutcome::navigation_failed(task, message.clone()))
                    .collect();
            }
        };

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            debug!(task = index + 1, of = tasks.len(), "Running task");
            outcomes.push(self.run_guarded(&page, task).await);
        }

        if let Err(e) = session.release_page(page).await {
            warn!("Failed to release page: {}", e);
        }
        outcomes
    }

    /// Run the extractor, turning a panic into a failed outcome so the page
    /// is still released and the task still accounted for.
    async fn run_guarded<P: PageHandle>(&self, page: &P, task: &ScrapeTask) -> ScrapeOutcome {
        AssertUnwindSafe(self.extractor.run(page, task))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!(room_id = %task.room_id, url = %task.url, "Extraction panicked");
                ScrapeOutcome::navigation_failed(task, "Extraction aborted unexpectedly")
            })
    }
}
