//! Human-readable rendering of verdicts and training records.

use crate::domain::{TrainingRecord, VerificationStage, VerificationVerdict};

/// Characters of the solution shown during review.
pub const REVIEW_SOLUTION_CHARS: usize = 500;

/// Characters of the agent transcript shown during review.
pub const REVIEW_INTERACTION_CHARS: usize = 300;

/// Leading `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let head = truncate_chars(text, max_chars);
    if head.len() < text.len() {
        format!("{head}...")
    } else {
        head.to_string()
    }
}

/// Render an itemized verdict report.
pub fn render_verdict(verdict: &VerificationVerdict) -> String {
    let mut out = String::new();
    let status = if verdict.passed() { "PASSED" } else { "FAILED" };
    out.push_str(&format!(
        "Verification {status} at stage {} (run {}, {}ms)\n",
        verdict.stage(),
        verdict.run_id(),
        verdict.duration_ms()
    ));

    match verdict.stage() {
        VerificationStage::Compliance => {
            out.push_str(&format!(
                "Compliance violations ({}):\n",
                verdict.violations().len()
            ));
            for v in verdict.violations() {
                out.push_str(&format!("  - {v}\n"));
            }
        }
        VerificationStage::Build => {
            if verdict.build_errors().is_empty() {
                out.push_str("Build failed with no recognized diagnostics. Log excerpt:\n");
                for line in verdict.build_log_excerpt().lines() {
                    out.push_str(&format!("  | {line}\n"));
                }
            } else {
                out.push_str(&format!("Build errors ({}):\n", verdict.build_errors().len()));
                for e in verdict.build_errors() {
                    out.push_str(&format!("  - {e}\n"));
                }
            }
        }
        VerificationStage::Simulation | VerificationStage::All => {
            if !verdict.simulation_summary().is_empty() {
                out.push_str(&format!("Simulation: {}\n", verdict.simulation_summary()));
            }
        }
    }
    out
}

/// Render one record for the human review pass.
pub fn render_record(index: usize, record: &TrainingRecord) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();
    out.push_str(&format!("\n{rule}\n"));
    out.push_str(&format!("Entry #{index}\n"));
    out.push_str(&format!("Timestamp: {}\n", record.timestamp));
    out.push_str(&format!("Human Approved: {}\n", record.is_approved()));
    out.push_str(&format!("{rule}\n"));

    out.push_str("\nINSTRUCTION:\n");
    out.push_str(&record.instruction);
    out.push_str("\n\nCRITIQUE:\n");
    out.push_str(&record.critique);
    out.push_str("\n\nSOLUTION:\n");
    out.push_str(&preview(&record.solution, REVIEW_SOLUTION_CHARS));
    out.push_str("\n\nAGENT INTERACTIONS (truncated):\n");
    out.push_str(&preview(
        &record.raw_transcript_excerpt,
        REVIEW_INTERACTION_CHARS,
    ));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuildError, BuildOutcome, ComplianceViolation, RuleId};
    use uuid::Uuid;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_compliance_report_lists_lines() {
        let verdict = VerificationVerdict::compliance_failed(
            Uuid::new_v4(),
            vec![
                ComplianceViolation::new(3, RuleId::BlockingCall, "no delay"),
                ComplianceViolation::new(9, RuleId::DynamicAlloc, "no malloc"),
            ],
            1,
        );
        let report = render_verdict(&verdict);
        assert!(report.contains("FAILED at stage COMPLIANCE"));
        assert!(report.contains("Line 3: [BLOCKING_CALL] no delay"));
        assert!(report.contains("Line 9: [DYNAMIC_ALLOC] no malloc"));
    }

    #[test]
    fn test_build_report_lists_locations() {
        let outcome = BuildOutcome::failed(
            vec![BuildError {
                file_path: "foo.c".to_string(),
                line: 12,
                column: 5,
                message: "missing semicolon".to_string(),
            }],
            String::new(),
            2,
            10,
        );
        let verdict = VerificationVerdict::build_failed(Uuid::new_v4(), outcome, 10);
        let report = render_verdict(&verdict);
        assert!(report.contains("foo.c:12:5: missing semicolon"));
    }

    #[test]
    fn test_unrecognized_build_report_shows_excerpt() {
        let outcome = BuildOutcome::failed(vec![], "make: *** No rule".to_string(), 2, 10);
        let verdict = VerificationVerdict::build_failed(Uuid::new_v4(), outcome, 10);
        let report = render_verdict(&verdict);
        assert!(report.contains("no recognized diagnostics"));
        assert!(report.contains("| make: *** No rule"));
    }

    #[test]
    fn test_render_record_truncates_long_fields() {
        let record = TrainingRecord {
            instruction: "Fix the OSD driver".to_string(),
            critique: "none".to_string(),
            solution: "x".repeat(600),
            context: String::new(),
            timestamp: "t".to_string(),
            source: "s".to_string(),
            verified: true,
            raw_transcript_excerpt: "y".repeat(301),
            human_approved: None,
            extra: Default::default(),
        };
        let rendered = render_record(4, &record);
        assert!(rendered.contains("Entry #4"));
        assert!(rendered.contains(&format!("{}...", "x".repeat(500))));
        assert!(!rendered.contains(&"x".repeat(501)));
        assert!(rendered.contains(&format!("{}...", "y".repeat(300))));
    }
}
