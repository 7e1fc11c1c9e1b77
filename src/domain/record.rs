use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::DateRange;

/// Numeric, storable form of a scrape outcome.
///
/// Identity is `(room_id, date_range)`; stores upsert on that pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub room_id: String,
    pub date_range: DateRange,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub fee: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,
}
