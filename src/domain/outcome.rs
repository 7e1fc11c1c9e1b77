use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{DateRange, ScrapeTask};

pub const UNKNOWN_LABEL: &str = "Unknown Property";
pub const UNKNOWN_HOST: &str = "Unknown Host";
pub const MISSING_TEXT: &str = "N/A";

/// Terminal status of one scrape task.
///
/// `Unavailable`, `Timeout` and `NavigationFailed` are hard statuses; every
/// other path ends in `Success`, even when cosmetic fields were defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrapeStatus {
    Success,
    Unavailable { message: String },
    Timeout,
    NavigationFailed { message: String },
}

impl ScrapeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ScrapeStatus::Success)
    }

    pub fn describe(&self) -> String {
        match self {
            ScrapeStatus::Success => "Success".to_string(),
            ScrapeStatus::Unavailable { message } => format!("Unavailable: {}", message),
            ScrapeStatus::Timeout => "Timeout waiting for price".to_string(),
            ScrapeStatus::NavigationFailed { message } => format!("Navigation failed: {}", message),
        }
    }
}

/// Result of running one [`ScrapeTask`] through the extraction state machine.
///
/// The field set is fixed regardless of status or scheduling mode; fields
/// that could not be read hold their documented defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub room_id: String,
    pub url: Url,
    pub date_range: DateRange,
    pub label: String,
    pub host_name: String,
    pub price_text: String,
    pub fee_text: String,
    pub special_offer_text: Option<String>,
    pub status: ScrapeStatus,
    /// Soft field errors collected while reading the page.
    pub diagnostics: Vec<String>,
    /// Best-effort markup captured when resolution failed.
    pub diagnostic_snapshot: Option<String>,
}

impl ScrapeOutcome {
    pub fn new(task: &ScrapeTask, status: ScrapeStatus) -> Self {
        Self {
            room_id: task.room_id.clone(),
            url: task.url.clone(),
            date_range: task.date_range,
            label: UNKNOWN_LABEL.to_string(),
            host_name: UNKNOWN_HOST.to_string(),
            price_text: MISSING_TEXT.to_string(),
            fee_text: MISSING_TEXT.to_string(),
            special_offer_text: None,
            status,
            diagnostics: Vec::new(),
            diagnostic_snapshot: None,
        }
    }

    pub fn navigation_failed(task: &ScrapeTask, message: impl Into<String>) -> Self {
        Self::new(
            task,
            ScrapeStatus::NavigationFailed {
                message: message.into(),
            },
        )
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Status plus any soft diagnostics, for reports.
    pub fn error_message(&self) -> String {
        let mut message = format!(
            "Room {} ({}): {}",
            self.room_id,
            self.date_range,
            self.status.describe()
        );
        if !self.diagnostics.is_empty() {
            message.push_str(" [");
            message.push_str(&self.diagnostics.join(" "));
            message.push(']');
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> ScrapeTask {
        ScrapeTask::from_url(
            "https://www.airbnb.com.br/rooms/42?check_in=2025-05-21&check_out=2025-05-24",
        )
        .unwrap()
    }

    #[test]
    fn test_new_outcome_defaults() {
        let outcome = ScrapeOutcome::new(&task(), ScrapeStatus::Timeout);
        assert_eq!(outcome.room_id, "42");
        assert_eq!(outcome.label, UNKNOWN_LABEL);
        assert_eq!(outcome.host_name, UNKNOWN_HOST);
        assert_eq!(outcome.price_text, MISSING_TEXT);
        assert_eq!(outcome.fee_text, MISSING_TEXT);
        assert!(outcome.special_offer_text.is_none());
        assert!(outcome.diagnostic_snapshot.is_none());
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_error_message_includes_diagnostics() {
        let mut outcome = ScrapeOutcome::navigation_failed(&task(), "net::ERR_TIMED_OUT");
        outcome.diagnostics.push("Label not found.".into());
        let message = outcome.error_message();
        assert!(message.starts_with("Room 42 (2025-05-21 to 2025-05-24): Navigation failed"));
        assert!(message.contains("net::ERR_TIMED_OUT"));
        assert!(message.ends_with("[Label not found.]"));
    }

    #[test]
    fn test_status_serializes_tagged() {
        let status = ScrapeStatus::Unavailable {
            message: "Dates not available".into(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["kind"], "unavailable");
        assert_eq!(json["message"], "Dates not available");

        let json = serde_json::to_value(ScrapeStatus::Success).unwrap();
        assert_eq!(json["kind"], "success");
    }
}
