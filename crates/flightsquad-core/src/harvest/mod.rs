//! Knowledge harvesting: training records from verified transcripts.

pub mod error;
pub mod extract;
pub mod fakes;
pub mod harvester;
pub mod index;
pub mod log;
pub mod review;

pub use error::{HarvestError, HarvestResult};
pub use extract::{extract, Extraction};
pub use fakes::MemoryRecordLog;
pub use harvester::{ApprovalOutcome, KnowledgeHarvester};
pub use index::RecordIndex;
pub use log::{JsonlRecordLog, RecordLog};
pub use review::{review_records, ReviewSummary};
