//! Turns passing transcripts into training records.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Map;

use super::error::{HarvestError, HarvestResult};
use super::extract::extract;
use super::index::RecordIndex;
use super::log::{JsonlRecordLog, RecordLog};
use crate::config::HarvestConfig;
use crate::domain::{TrainingRecord, VerificationVerdict};
use crate::metrics::METRICS;
use crate::obs;
use crate::reporting::truncate_chars;

/// Result of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalOutcome {
    /// Resolved zero-based position.
    pub index: usize,
    /// False when the record was already approved.
    pub changed: bool,
}

/// Owns the record log and writes training records to it.
pub struct KnowledgeHarvester {
    log: Arc<dyn RecordLog>,
    config: HarvestConfig,
}

impl KnowledgeHarvester {
    pub fn new(log: Arc<dyn RecordLog>, config: HarvestConfig) -> Self {
        Self { log, config }
    }

    /// Harvester over the JSON Lines file named in `config.log_path`.
    pub fn from_config(config: HarvestConfig) -> HarvestResult<Self> {
        let log = JsonlRecordLog::new(&config.log_path)?;
        Ok(Self::new(Arc::new(log), config))
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Build a record from a transcript without persisting it.
    pub fn build_record(&self, transcript: &str) -> TrainingRecord {
        let fields = extract(
            transcript,
            &self.config.default_instruction,
            self.config.solution_fallback_chars,
        );

        TrainingRecord {
            instruction: fields.instruction,
            critique: fields.critique,
            solution: fields.solution,
            context: self.config.context.clone(),
            timestamp: Utc::now().to_rfc3339(),
            source: self.config.source.clone(),
            verified: true,
            raw_transcript_excerpt: truncate_chars(
                transcript,
                self.config.transcript_excerpt_chars,
            )
            .to_string(),
            human_approved: None,
            extra: Map::new(),
        }
    }

    /// Extract and append one record, returning what was written.
    pub fn try_save_learning(&self, transcript: &str) -> HarvestResult<TrainingRecord> {
        let record = self.build_record(transcript);
        self.log.append(&record)?;
        METRICS.inc_records_harvested();
        obs::emit_record_harvested(&record.instruction);
        Ok(record)
    }

    /// Best-effort variant of [`try_save_learning`](Self::try_save_learning).
    ///
    /// Failures are logged and counted, never returned.
    pub fn save_learning(&self, transcript: &str) {
        if let Err(e) = self.try_save_learning(transcript) {
            METRICS.inc_harvest_failures();
            obs::emit_harvest_failed(&e);
        }
    }

    /// Save the transcript only if `verdict` passed. Returns whether a record
    /// was written.
    pub fn harvest_verified(&self, verdict: &VerificationVerdict, transcript: &str) -> bool {
        if !verdict.passed() {
            tracing::debug!(
                stage = %verdict.stage(),
                "skipping harvest for failed verification"
            );
            return false;
        }
        match self.try_save_learning(transcript) {
            Ok(_) => true,
            Err(e) => {
                METRICS.inc_harvest_failures();
                obs::emit_harvest_failed(&e);
                false
            }
        }
    }

    /// Set `human_approved` on one record and rewrite the log.
    ///
    /// The log is left untouched when the index is out of range or the record
    /// is already approved.
    pub fn try_mark_human_approved(&self, index: RecordIndex) -> HarvestResult<ApprovalOutcome> {
        let mut records = self.log.load()?;
        let len = records.len();
        let position = index
            .resolve(len)
            .ok_or(HarvestError::RecordNotFound { index, len })?;

        let changed = records[position].approve();
        if changed {
            self.log.rewrite(&records)?;
            METRICS.inc_records_approved();
        }
        obs::emit_record_approved(position, changed);

        Ok(ApprovalOutcome {
            index: position,
            changed,
        })
    }

    /// Best-effort variant of [`try_mark_human_approved`](Self::try_mark_human_approved).
    pub fn mark_human_approved(&self, index: RecordIndex) -> Option<ApprovalOutcome> {
        match self.try_mark_human_approved(index) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                obs::emit_approval_failed(&e);
                None
            }
        }
    }

    /// All records in log order.
    pub fn records(&self) -> HarvestResult<Vec<TrainingRecord>> {
        self.log.load()
    }

    /// Records still awaiting approval, with their positions.
    pub fn pending(&self) -> HarvestResult<Vec<(usize, TrainingRecord)>> {
        Ok(self
            .log
            .load()?
            .into_iter()
            .enumerate()
            .filter(|(_, r)| !r.is_approved())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComplianceViolation, RuleId};
    use crate::harvest::fakes::MemoryRecordLog;
    use uuid::Uuid;

    const TRANSCRIPT: &str = "Architect: Implement GPS rescue climb rate limit\n\
        Cynic: the first draft had a blocking wait in the scheduler loop\n\
        Tech Lead:\n```c\nvoid rescueClimb(void) { climbRate = 50; }\n```\n\
        Test Pilot: SITL PASS";

    fn harvester() -> (Arc<MemoryRecordLog>, KnowledgeHarvester) {
        let log = Arc::new(MemoryRecordLog::new());
        let h = KnowledgeHarvester::new(log.clone(), HarvestConfig::default());
        (log, h)
    }

    #[test]
    fn test_save_learning_appends_verified_record() {
        let (log, h) = harvester();
        h.save_learning(TRANSCRIPT);

        let records = log.snapshot();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.instruction, "Architect: Implement GPS rescue climb rate limit");
        assert!(r.critique.starts_with("Found blocking issue:"));
        assert_eq!(
            r.solution,
            "```c\nvoid rescueClimb(void) { climbRate = 50; }\n```"
        );
        assert!(r.verified);
        assert!(!r.is_approved());
        assert_eq!(r.context, HarvestConfig::default().context);
        assert!(chrono::DateTime::parse_from_rfc3339(&r.timestamp).is_ok());
    }

    #[test]
    fn test_transcript_excerpt_is_bounded() {
        let log = Arc::new(MemoryRecordLog::new());
        let config = HarvestConfig {
            transcript_excerpt_chars: 10,
            ..HarvestConfig::default()
        };
        let h = KnowledgeHarvester::new(log.clone(), config);
        let record = h.try_save_learning(&"z".repeat(50)).unwrap();
        assert_eq!(record.raw_transcript_excerpt, "z".repeat(10));
    }

    #[test]
    fn test_harvest_verified_refuses_failed_verdict() {
        let (log, h) = harvester();
        let verdict = VerificationVerdict::compliance_failed(
            Uuid::new_v4(),
            vec![ComplianceViolation::new(1, RuleId::BlockingCall, "delay")],
            1,
        );
        assert!(!h.harvest_verified(&verdict, TRANSCRIPT));
        assert!(log.snapshot().is_empty());

        let verdict =
            VerificationVerdict::all_passed(Uuid::new_v4(), "SITL PASS".to_string(), 1);
        assert!(h.harvest_verified(&verdict, TRANSCRIPT));
        assert_eq!(log.snapshot().len(), 1);
    }

    #[test]
    fn test_mark_last_record_approved() {
        let (log, h) = harvester();
        h.save_learning("Add first");
        h.save_learning("Add second");

        let outcome = h.try_mark_human_approved(RecordIndex::Last).unwrap();
        assert_eq!(outcome, ApprovalOutcome { index: 1, changed: true });

        let records = log.snapshot();
        assert!(!records[0].is_approved());
        assert!(records[1].is_approved());
        assert_eq!(log.rewrite_count(), 1);
    }

    #[test]
    fn test_approval_is_idempotent() {
        let (log, h) = harvester();
        h.save_learning("Fix OSD");
        h.try_mark_human_approved(RecordIndex::At(0)).unwrap();
        let again = h.try_mark_human_approved(RecordIndex::At(0)).unwrap();
        assert!(!again.changed);
        assert_eq!(log.rewrite_count(), 1);
        assert!(log.snapshot()[0].is_approved());
    }

    #[test]
    fn test_out_of_range_leaves_log_untouched() {
        let (log, h) = harvester();
        h.save_learning("Fix OSD");

        let err = h.try_mark_human_approved(RecordIndex::At(3)).unwrap_err();
        assert!(matches!(err, HarvestError::RecordNotFound { len: 1, .. }));
        assert_eq!(log.rewrite_count(), 0);
        assert!(h.mark_human_approved(RecordIndex::At(3)).is_none());
    }

    #[test]
    fn test_empty_log_has_no_last_record() {
        let (_, h) = harvester();
        assert!(matches!(
            h.try_mark_human_approved(RecordIndex::Last),
            Err(HarvestError::RecordNotFound { len: 0, .. })
        ));
    }

    #[test]
    fn test_pending_lists_unapproved_positions() {
        let (_, h) = harvester();
        h.save_learning("Add a");
        h.save_learning("Add b");
        h.save_learning("Add c");
        h.try_mark_human_approved(RecordIndex::At(1)).unwrap();

        let pending: Vec<usize> = h.pending().unwrap().into_iter().map(|(i, _)| i).collect();
        assert_eq!(pending, vec![0, 2]);
        assert_eq!(h.records().unwrap().len(), 3);
    }
}
