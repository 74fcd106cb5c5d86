//! Training record persisted by the knowledge harvester.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One harvested (instruction, critique, solution) example.
///
/// Serialized as a single JSON object per log line. Keys this type does not
/// know about are kept in `extra` so a rewrite never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub instruction: String,
    pub critique: String,
    pub solution: String,
    pub context: String,

    /// RFC 3339 creation time.
    pub timestamp: String,

    pub source: String,

    /// Always true when written by the harvester.
    pub verified: bool,

    /// Bounded excerpt of the inter-agent transcript.
    #[serde(rename = "agent_interactions")]
    pub raw_transcript_excerpt: String,

    /// Absent until a reviewer approves the record. A value already on the
    /// line, `false` included, is written back as read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_approved: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrainingRecord {
    pub fn is_approved(&self) -> bool {
        self.human_approved.unwrap_or(false)
    }

    /// Set `human_approved`. Returns `true` if the flag changed.
    ///
    /// Approval never reverts, so calling this on an approved record is a no-op.
    pub fn approve(&mut self) -> bool {
        if self.is_approved() {
            return false;
        }
        self.human_approved = Some(true);
        true
    }
}
