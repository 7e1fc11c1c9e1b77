use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ScrapeOutcome;

/// Aggregated view of one orchestrated run.
///
/// Built incrementally with [`RunSummary::record`] and closed with
/// [`RunSummary::finish`], whichever way the run ended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub room_ids: BTreeSet<String>,
    pub execution_time: Duration,
    pub successful_count: usize,
    pub failed_count: usize,
    /// Distinct rooms with at least one failed task, in first-failure order.
    pub failed_room_ids: Vec<String>,
    pub error_messages: Vec<String>,
    /// Booking sidebar markup captured from failed tasks.
    pub html_sidebar: Vec<String>,
}

impl RunSummary {
    pub fn new<I, S>(room_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            room_ids: room_ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &ScrapeOutcome) {
        self.room_ids.insert(outcome.room_id.clone());

        if outcome.is_success() {
            self.successful_count += 1;
            return;
        }

        self.failed_count += 1;
        if !self.failed_room_ids.contains(&outcome.room_id) {
            self.failed_room_ids.push(outcome.room_id.clone());
        }
        self.error_messages.push(outcome.error_message());
        if let Some(ref snapshot) = outcome.diagnostic_snapshot {
            self.html_sidebar.push(snapshot.clone());
        }
    }

    /// Record a failure that prevented the run from producing outcomes.
    pub fn record_fatal(&mut self, message: impl Into<String>) {
        self.error_messages.push(message.into());
    }

    pub fn finish(&mut self, elapsed: Duration) {
        self.execution_time = elapsed;
    }

    pub fn total(&self) -> usize {
        self.successful_count + self.failed_count
    }

    pub fn execution_time_display(&self) -> String {
        format!("{:.2} seconds", self.execution_time.as_secs_f64())
    }
}

/// A run summary as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    pub room_ids: Vec<String>,
    pub execution_time: String,
    pub successful_count: usize,
    pub failed_count: usize,
    pub failed_room_ids: Vec<String>,
    pub error_messages: Vec<String>,
    pub html_sidebar: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}
