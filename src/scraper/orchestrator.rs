use std::panic::{resume_unwind, AssertUnwindSafe};

use futures::FutureExt;
use tracing::{info, warn};

use crate::app::Result;
use crate::domain::{ScrapeOutcome, ScrapeTask};
use crate::scraper::{BrowserSession, Launcher, Scheduler, ScraperConfig};

/// Owns the browser for one run.
///
/// Launches it once, feeds every task through the [`Scheduler`] and shuts it
/// down on every exit path. Only a launch failure is returned as an error.
pub struct Orchestrator {
    scheduler: Scheduler,
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(config: ScraperConfig) -> Self {
        let concurrency = config.concurrency.max(1);
        Self {
            scheduler: Scheduler::new(config),
            concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn run<L: Launcher>(&self, launcher: &L, tasks: &[ScrapeTask]) -> Result<Vec<ScrapeOutcome>> {
        info!(
            tasks = tasks.len(),
            concurrency = self.concurrency,
            "Starting scrape run"
        );

        let session = launcher.launch().await?;

        let outcomes = AssertUnwindSafe(self.scheduler.run(&session, tasks))
            .catch_unwind()
            .await;

        if let Err(e) = session.shutdown().await {
            warn!("Failed to shut down browser: {}", e);
        }

        match outcomes {
            Ok(outcomes) => {
                let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
                info!(
                    "Scrape run finished: {} succeeded, {} failed",
                    succeeded,
                    outcomes.len() - succeeded
                );
                Ok(outcomes)
            }
            Err(panic) => resume_unwind(panic),
        }
    }
}
