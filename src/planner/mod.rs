//! Expansion of room ids and a date window into scrape tasks.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::{Result, StaywatchError};
use crate::domain::{DateRange, ScrapeTask};

/// How listing URLs are built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Listing URL prefix; the room id is appended as the last path segment
    pub base_url: String,

    /// Length of each quoted stay (default: 3)
    pub nights: u32,

    pub guests: u32,
    pub adults: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.airbnb.com.br/rooms".to_string(),
            nights: 3,
            guests: 1,
            adults: 1,
        }
    }
}

/// One task per room and check-in day.
///
/// Check-in dates run from `start` for `days` consecutive days; every stay is
/// `config.nights` long. Tasks are ordered by room, then by check-in.
pub fn plan_tasks<S: AsRef<str>>(
    room_ids: &[S],
    start: NaiveDate,
    days: u32,
    config: &PlannerConfig,
) -> Result<Vec<ScrapeTask>> {
    let mut tasks = Vec::with_capacity(room_ids.len() * days as usize);

    for room_id in room_ids {
        let room_id = room_id.as_ref();
        for offset in 0..days {
            let check_in = add_days(start, offset)?;
            let check_out = add_days(check_in, config.nights)?;
            let date_range = DateRange::new(check_in, check_out)?;
            tasks.push(ScrapeTask::new(
                listing_url(config, room_id, &date_range)?,
                room_id,
                date_range,
            ));
        }
    }

    Ok(tasks)
}

fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days as u64))
        .ok_or_else(|| StaywatchError::InvalidDate(format!("{} + {} days is out of range", date, days)))
}

fn listing_url(config: &PlannerConfig, room_id: &str, range: &DateRange) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "{}/{}",
        config.base_url.trim_end_matches('/'),
        room_id
    ))?;

    url.query_pairs_mut()
        .append_pair("check_in", &range.check_in.to_string())
        .append_pair("guests", &config.guests.to_string())
        .append_pair("adults", &config.adults.to_string())
        .append_pair("check_out", &range.check_out.to_string());

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::parse_date;

    #[test]
    fn test_plan_rooms_times_days() {
        let start = parse_date("2025-05-21").unwrap();
        let tasks = plan_tasks(&["45592704", "1234"], start, 3, &PlannerConfig::default()).unwrap();

        assert_eq!(tasks.len(), 6);
        assert_eq!(
            tasks[0].url.as_str(),
            "https://www.airbnb.com.br/rooms/45592704?check_in=2025-05-21&guests=1&adults=1&check_out=2025-05-24"
        );
        assert_eq!(tasks[2].date_range.to_string(), "2025-05-23 to 2025-05-26");
        assert_eq!(tasks[3].room_id, "1234");
        assert_eq!(tasks[3].date_range.to_string(), "2025-05-21 to 2025-05-24");
    }

    #[test]
    fn test_planned_urls_parse_back() {
        let start = parse_date("2025-01-30").unwrap();
        let tasks = plan_tasks(&["77"], start, 4, &PlannerConfig::default()).unwrap();

        for task in &tasks {
            let parsed = ScrapeTask::from_url(task.url.as_str()).unwrap();
            assert_eq!(&parsed, task);
            assert_eq!(parsed.date_range.nights(), 3);
        }
        assert_eq!(tasks[3].date_range.to_string(), "2025-02-02 to 2025-02-05");
    }

    #[test]
    fn test_zero_days_or_no_rooms_yield_nothing() {
        let start = parse_date("2025-05-21").unwrap();
        let config = PlannerConfig::default();
        assert!(plan_tasks(&["1"], start, 0, &config).unwrap().is_empty());
        assert!(plan_tasks::<&str>(&[], start, 5, &config).unwrap().is_empty());
    }

    #[test]
    fn test_custom_base_url_and_stay_length() {
        let config = PlannerConfig {
            base_url: "https://example.com/listing/".into(),
            nights: 1,
            guests: 2,
            adults: 2,
        };
        let start = parse_date("2025-12-31").unwrap();
        let tasks = plan_tasks(&["9"], start, 1, &config).unwrap();

        assert_eq!(
            tasks[0].url.as_str(),
            "https://example.com/listing/9?check_in=2025-12-31&guests=2&adults=2&check_out=2026-01-01"
        );
    }
}
