//! In-memory record log for tests and dry runs.

use std::sync::Mutex;

use super::error::HarvestResult;
use super::log::RecordLog;
use crate::domain::TrainingRecord;

/// Record log backed by a `Vec`.
#[derive(Debug, Default)]
pub struct MemoryRecordLog {
    records: Mutex<Vec<TrainingRecord>>,
    rewrites: Mutex<usize>,
}

impl MemoryRecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the log with existing records.
    pub fn with_records(records: Vec<TrainingRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            rewrites: Mutex::new(0),
        }
    }

    /// Snapshot of the current records.
    pub fn snapshot(&self) -> Vec<TrainingRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of full rewrites performed.
    pub fn rewrite_count(&self) -> usize {
        *self.rewrites.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecordLog for MemoryRecordLog {
    fn append(&self, record: &TrainingRecord) -> HarvestResult<()> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }

    fn load(&self) -> HarvestResult<Vec<TrainingRecord>> {
        Ok(self.snapshot())
    }

    fn rewrite(&self, records: &[TrainingRecord]) -> HarvestResult<()> {
        *self.records.lock().unwrap_or_else(|e| e.into_inner()) = records.to_vec();
        *self.rewrites.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
