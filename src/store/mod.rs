pub mod sqlite;

use crate::app::Result;
use crate::domain::{DateRange, NormalizedRecord, RunRecord, RunSummary};

pub use sqlite::SqliteStore;

/// Persistence sink for rooms, normalized prices and run summaries.
pub trait Store {
    // Room operations
    fn add_room(&self, room_id: &str) -> Result<bool>;
    fn remove_room(&self, room_id: &str) -> Result<bool>;
    fn room_ids(&self) -> Result<Vec<String>>;

    // Price operations, keyed by (date_range, room_id)
    fn upsert_price(&self, record: &NormalizedRecord) -> Result<()>;
    fn upsert_prices(&self, records: &[NormalizedRecord]) -> Result<usize>;
    fn get_price(&self, room_id: &str, date_range: &DateRange) -> Result<Option<NormalizedRecord>>;
    fn get_prices(&self, room_id: Option<&str>) -> Result<Vec<NormalizedRecord>>;

    // Run operations
    fn record_run(&self, summary: &RunSummary) -> Result<i64>;
    fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>>;
}
