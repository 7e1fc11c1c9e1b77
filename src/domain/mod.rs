pub mod outcome;
pub mod record;
pub mod summary;
pub mod task;

pub use outcome::{ScrapeOutcome, ScrapeStatus};
pub use record::NormalizedRecord;
pub use summary::{RunRecord, RunSummary};
pub use task::{DateRange, ScrapeTask};
