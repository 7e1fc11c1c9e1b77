use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::{Result, StaywatchError};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Check-in/check-out window of a single quote.
///
/// The textual form `"2025-05-21 to 2025-05-24"` is the persisted key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl DateRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self> {
        if check_out < check_in {
            return Err(StaywatchError::InvalidDate(format!(
                "check-out {} is before check-in {}",
                check_out, check_in
            )));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Number of nights: check-in day counted, check-out day not.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.check_in.format(DATE_FORMAT),
            self.check_out.format(DATE_FORMAT)
        )
    }
}

impl FromStr for DateRange {
    type Err = StaywatchError;

    fn from_str(s: &str) -> Result<Self> {
        let (check_in, check_out) = s
            .split_once(" to ")
            .ok_or_else(|| StaywatchError::InvalidDate(format!("Malformed date range: {}", s)))?;
        Self::new(parse_date(check_in)?, parse_date(check_out)?)
    }
}

impl TryFrom<String> for DateRange {
    type Error = StaywatchError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DateRange> for String {
    fn from(range: DateRange) -> Self {
        range.to_string()
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| StaywatchError::InvalidDate(format!("{}: {}", s, e)))
}

/// One page visit: a listing URL for one date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeTask {
    pub url: Url,
    pub room_id: String,
    pub date_range: DateRange,
}

impl ScrapeTask {
    pub fn new(url: Url, room_id: impl Into<String>, date_range: DateRange) -> Self {
        Self {
            url,
            room_id: room_id.into(),
            date_range,
        }
    }

    /// Rebuild a task from a listing URL such as
    /// `https://www.airbnb.com.br/rooms/45592704?check_in=2025-05-21&check_out=2025-05-24`.
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)?;

        let room_id = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
            .ok_or_else(|| StaywatchError::InvalidRequest(format!("No room id in URL: {}", raw)))?;

        let query = |key: &str| {
            url.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
                .ok_or_else(|| StaywatchError::InvalidDate(format!("Missing {} in URL: {}", key, raw)))
        };
        let date_range = DateRange::new(parse_date(&query("check_in")?)?, parse_date(&query("check_out")?)?)?;

        Ok(Self {
            url,
            room_id,
            date_range,
        })
    }
}
