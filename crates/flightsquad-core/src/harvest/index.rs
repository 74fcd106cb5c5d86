//! Record selection for the approval pass.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::HarvestError;

/// Position of a record in the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordIndex {
    /// The most recently appended record (`-1`).
    #[default]
    Last,

    /// Zero-based position.
    At(usize),
}

impl RecordIndex {
    /// Resolve against a log of `len` records.
    pub fn resolve(self, len: usize) -> Option<usize> {
        match self {
            RecordIndex::Last => len.checked_sub(1),
            RecordIndex::At(i) if i < len => Some(i),
            RecordIndex::At(_) => None,
        }
    }
}

impl TryFrom<i64> for RecordIndex {
    type Error = HarvestError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(RecordIndex::Last),
            v if v >= 0 => usize::try_from(v)
                .map(RecordIndex::At)
                .map_err(|_| HarvestError::InvalidIndex(v)),
            v => Err(HarvestError::InvalidIndex(v)),
        }
    }
}

impl fmt::Display for RecordIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIndex::Last => f.write_str("-1"),
            RecordIndex::At(i) => write!(f, "{i}"),
        }
    }
}
