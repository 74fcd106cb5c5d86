//! Compliance violation types produced by the pattern scanner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the rule that flagged a line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    /// Blocking delay call (`delay()`, `delayMicroseconds()`).
    BlockingCall,

    /// Conditional loop with no timeout guard.
    UnboundedLoop,

    /// Heap allocation call.
    DynamicAlloc,

    /// Rule loaded from configuration.
    Custom(String),
}

impl RuleId {
    /// Stable string form used in reports.
    pub fn as_str(&self) -> &str {
        match self {
            RuleId::BlockingCall => "BLOCKING_CALL",
            RuleId::UnboundedLoop => "UNBOUNDED_LOOP",
            RuleId::DynamicAlloc => "DYNAMIC_ALLOC",
            RuleId::Custom(name) => name,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single flagged line in a candidate source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceViolation {
    /// 1-based line number.
    pub line_number: usize,

    /// Rule that fired.
    pub rule_id: RuleId,

    /// Rationale shown to the author.
    pub message: String,
}

impl ComplianceViolation {
    pub fn new(line_number: usize, rule_id: RuleId, message: impl Into<String>) -> Self {
        Self {
            line_number,
            rule_id,
            message: message.into(),
        }
    }
}

impl fmt::Display for ComplianceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}: [{}] {}",
            self.line_number, self.rule_id, self.message
        )
    }
}
