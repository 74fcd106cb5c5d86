//! Interactive human approval pass over the record log.

use std::io::{BufRead, Write};

use super::error::HarvestResult;
use super::harvester::KnowledgeHarvester;
use super::index::RecordIndex;
use crate::reporting::render_record;

/// Counts reported at the end of a review pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    /// Approved during this pass.
    pub newly_approved: usize,
}

/// Walk every record, prompting on `output` and reading answers from `input`.
///
/// `y` or `yes` (any case) approves; anything else, including end of input,
/// leaves the record pending.
pub fn review_records<R: BufRead, W: Write>(
    harvester: &KnowledgeHarvester,
    mut input: R,
    mut output: W,
) -> HarvestResult<ReviewSummary> {
    let records = harvester.records()?;
    if records.is_empty() {
        writeln!(output, "No entries to review.")?;
        return Ok(ReviewSummary::default());
    }

    let mut summary = ReviewSummary {
        total: records.len(),
        ..ReviewSummary::default()
    };

    for (i, record) in records.iter().enumerate() {
        write!(output, "{}", render_record(i, record))?;

        if record.is_approved() {
            writeln!(output, "Entry #{i} already approved, skipping.")?;
            summary.approved += 1;
            continue;
        }

        write!(output, "Approve entry #{i} for training? (y/n): ")?;
        output.flush()?;

        let mut answer = String::new();
        let read = input.read_line(&mut answer)?;
        let accepted = read > 0
            && matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");

        if accepted {
            let outcome = harvester.try_mark_human_approved(RecordIndex::At(i))?;
            if outcome.changed {
                summary.newly_approved += 1;
            }
            summary.approved += 1;
            writeln!(output, "Entry #{i} approved.")?;
        } else {
            summary.pending += 1;
            writeln!(output, "Entry #{i} left pending.")?;
        }
    }

    writeln!(
        output,
        "\nReview complete: {} total, {} approved, {} pending.",
        summary.total, summary.approved, summary.pending
    )?;
    Ok(summary)
}
