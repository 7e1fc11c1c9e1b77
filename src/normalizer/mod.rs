//! Conversion of extracted page text into numeric records.
//!
//! Prices are rendered in pt-BR format: a currency symbol prefix, `.` as the
//! thousands separator and `,` as the decimal separator (`R$ 1.234,56`).

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::domain::{NormalizedRecord, ScrapeOutcome, ScrapeStatus};

/// Texts that stand for "no value" in extracted fields.
const SENTINELS: &[&str] = &[
    "n/a",
    "error",
    "timeout",
    "unavailable",
    "dates not available",
];

#[derive(Clone, Debug, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Derive the storable record for an outcome.
    ///
    /// Successful outcomes carry parsed price, fee and total. Unavailable
    /// outcomes yield an all-null record so stale prices for those dates get
    /// overwritten. `Timeout` and `NavigationFailed` yield nothing.
    pub fn normalize(&self, outcome: &ScrapeOutcome) -> Option<NormalizedRecord> {
        let (price, fee) = match outcome.status {
            ScrapeStatus::Success => (
                parse_currency(&outcome.price_text),
                parse_currency(&outcome.fee_text),
            ),
            ScrapeStatus::Unavailable { .. } => (None, None),
            ScrapeStatus::Timeout | ScrapeStatus::NavigationFailed { .. } => return None,
        };

        Some(NormalizedRecord {
            room_id: outcome.room_id.clone(),
            date_range: outcome.date_range,
            price,
            fee,
            total: compute_total(price, fee, outcome.date_range.nights()),
        })
    }

    pub fn normalize_all<'a, I>(&self, outcomes: I) -> Vec<NormalizedRecord>
    where
        I: IntoIterator<Item = &'a ScrapeOutcome>,
    {
        outcomes
            .into_iter()
            .filter_map(|outcome| self.normalize(outcome))
            .collect()
    }
}

/// Parse locale-formatted currency text such as `"R$ 1.234,56"`.
///
/// Only the first numeric run is read, so trailing text like `" / noite"`
/// is ignored. Sentinels and text without digits map to `None`.
pub fn parse_currency(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() || SENTINELS.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }

    let start = trimmed.find(|c: char| c.is_ascii_digit())?;
    let number: String = trimmed[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let number = number.trim_end_matches(['.', ',']);

    if number.matches(',').count() > 1 {
        return None;
    }

    let canonical = number.replace('.', "").replace(',', ".");
    Decimal::from_str(&canonical).ok()
}

/// `price * nights + fee`, rounded to cents; `None` unless both are present
/// or when the result does not fit in a `Decimal`.
pub fn compute_total(price: Option<Decimal>, fee: Option<Decimal>, nights: i64) -> Option<Decimal> {
    let (price, fee) = (price?, fee?);
    let total = price.checked_mul(Decimal::from(nights))?.checked_add(fee)?;
    Some(total.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScrapeTask;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn outcome(status: ScrapeStatus, price: &str, fee: &str) -> ScrapeOutcome {
        let task = ScrapeTask::from_url(
            "https://www.airbnb.com.br/rooms/7?check_in=2025-05-21&check_out=2025-05-24",
        )
        .unwrap();
        let mut outcome = ScrapeOutcome::new(&task, status);
        outcome.price_text = price.into();
        outcome.fee_text = fee.into();
        outcome
    }

    #[test]
    fn test_parse_brl_with_thousands_and_cents() {
        assert_eq!(parse_currency("R$ 1.234,56"), Some(dec("1234.56")));
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(parse_currency("R$350"), Some(dec("350")));
        assert_eq!(parse_currency("R$\u{a0}1.234"), Some(dec("1234")));
        assert_eq!(parse_currency("R$ 89,90 noite"), Some(dec("89.90")));
        assert_eq!(parse_currency("R$ 1.050 / noite"), Some(dec("1050")));
        assert_eq!(parse_currency("  R$ 12.345.678,9 "), Some(dec("12345678.9")));
    }

    #[test]
    fn test_parse_sentinels_are_none() {
        assert_eq!(parse_currency("N/A"), None);
        assert_eq!(parse_currency("Error"), None);
        assert_eq!(parse_currency("Timeout"), None);
        assert_eq!(parse_currency("Dates not available"), None);
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("R$"), None);
        assert_eq!(parse_currency("1,2,3"), None);
    }

    #[test]
    fn test_total_requires_both_values() {
        assert_eq!(
            compute_total(Some(dec("100.00")), Some(dec("20.00")), 3),
            Some(dec("320.00"))
        );
        assert_eq!(compute_total(Some(dec("100.00")), None, 3), None);
        assert_eq!(compute_total(None, Some(dec("20.00")), 3), None);
    }

    #[test]
    fn test_total_overflow_is_none() {
        let huge = parse_currency("R$ 50.000.000.000.000.000.000.000.000.000").unwrap();
        assert_eq!(compute_total(Some(huge), Some(dec("20.00")), 3), None);
        assert_eq!(compute_total(Some(Decimal::MAX), Some(Decimal::MAX), 1), None);

        let record = Normalizer::new()
            .normalize(&outcome(
                ScrapeStatus::Success,
                "R$ 50.000.000.000.000.000.000.000.000.000",
                "R$ 20,00",
            ))
            .unwrap();
        assert_eq!(record.price, Some(huge));
        assert_eq!(record.total, None);
    }

    #[test]
    fn test_total_rounds_to_cents() {
        assert_eq!(
            compute_total(Some(dec("33.333")), Some(dec("0.004")), 3),
            Some(dec("100.00"))
        );
    }

    #[test]
    fn test_normalize_success() {
        let record = Normalizer::new()
            .normalize(&outcome(ScrapeStatus::Success, "R$ 100,00", "R$ 20,00"))
            .unwrap();
        assert_eq!(record.room_id, "7");
        assert_eq!(record.price, Some(dec("100")));
        assert_eq!(record.fee, Some(dec("20")));
        assert_eq!(record.total, Some(dec("320.00")));
    }

    #[test]
    fn test_normalize_success_without_fee() {
        let record = Normalizer::new()
            .normalize(&outcome(ScrapeStatus::Success, "R$ 100,00", "N/A"))
            .unwrap();
        assert_eq!(record.price, Some(dec("100")));
        assert_eq!(record.fee, None);
        assert_eq!(record.total, None);
    }

    #[test]
    fn test_normalize_unavailable_is_all_null() {
        let status = ScrapeStatus::Unavailable {
            message: "Dates not available".into(),
        };
        let record = Normalizer::new()
            .normalize(&outcome(status, "R$ 100,00", "R$ 20,00"))
            .unwrap();
        assert_eq!(record.price, None);
        assert_eq!(record.fee, None);
        assert_eq!(record.total, None);
    }

    #[test]
    fn test_normalize_skips_timeouts_and_navigation_failures() {
        let normalizer = Normalizer::new();
        assert!(normalizer
            .normalize(&outcome(ScrapeStatus::Timeout, "N/A", "N/A"))
            .is_none());
        let failed = ScrapeStatus::NavigationFailed {
            message: "net::ERR_NAME_NOT_RESOLVED".into(),
        };
        assert!(normalizer.normalize(&outcome(failed, "N/A", "N/A")).is_none());
    }
}
