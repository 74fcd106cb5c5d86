//! Heuristic extraction of (instruction, critique, solution) from a transcript.
//!
//! These are best-effort text heuristics, not parsers. Known blind spots:
//! - instruction: any line with an action verb as a whole word wins,
//!   including chatter such as "I will add a comment". Inflected forms
//!   ("added", "fixes") do not count.
//! - critique: the window is character based and may cut mid-word.
//! - solution: a prose line starting with `int ` or `void ` is taken as code;
//!   an unterminated fence falls through to the line heuristic.

use crate::reporting::truncate_chars;

/// Verbs that mark an instruction line when they appear as a whole word.
pub const ACTION_VERBS: &[&str] = &["implement", "create", "add", "fix"];

/// Marker that flags an instruction line anywhere it appears.
pub const TASK_MARKER: &str = "task:";

/// Keywords that anchor the critique excerpt.
pub const RISK_KEYWORDS: &[&str] = &[
    "blocking",
    "race condition",
    "deadlock",
    "memory leak",
    "unsafe",
    "interrupt",
    "atomic",
    "scheduler",
    "hang",
];

/// Critique recorded when no risk keyword appears.
pub const NO_CRITIQUE: &str = "Code passed Cynic audit with no blocking violations";

/// Characters kept before a risk keyword.
pub const CRITIQUE_BEFORE_CHARS: usize = 100;

/// Characters kept from the start of a risk keyword onwards.
pub const CRITIQUE_AFTER_CHARS: usize = 200;

const FENCE: &str = "```";

/// Fields pulled out of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub instruction: String,
    pub critique: String,
    pub solution: String,
}

/// Run all three heuristics.
pub fn extract(transcript: &str, default_instruction: &str, fallback_chars: usize) -> Extraction {
    Extraction {
        instruction: extract_instruction(transcript)
            .unwrap_or_else(|| default_instruction.to_string()),
        critique: extract_critique(transcript),
        solution: extract_solution(transcript, fallback_chars),
    }
}

/// First line containing an action verb token, trimmed.
pub fn extract_instruction(transcript: &str) -> Option<String> {
    transcript
        .lines()
        .find(|line| is_instruction_line(line))
        .map(|line| line.trim().to_string())
}

fn is_instruction_line(line: &str) -> bool {
    find_ascii_ci(line, TASK_MARKER, 0).is_some()
        || ACTION_VERBS
            .iter()
            .any(|verb| find_word(line, verb).is_some())
}

/// Excerpt around the earliest risk keyword, or [`NO_CRITIQUE`].
pub fn extract_critique(transcript: &str) -> String {
    let earliest = RISK_KEYWORDS
        .iter()
        .filter_map(|kw| find_ascii_ci(transcript, kw, 0).map(|idx| (idx, *kw)))
        .min_by_key(|(idx, _)| *idx);

    match earliest {
        Some((idx, keyword)) => {
            let excerpt =
                char_window(transcript, idx, CRITIQUE_BEFORE_CHARS, CRITIQUE_AFTER_CHARS);
            format!("Found {keyword} issue: {}", excerpt.trim())
        }
        None => NO_CRITIQUE.to_string(),
    }
}

/// First fenced block, else a run of code-looking lines, else the tail.
pub fn extract_solution(transcript: &str, fallback_chars: usize) -> String {
    if let Some(block) = fenced_block(transcript) {
        return block.to_string();
    }
    if let Some(code) = code_line_run(transcript) {
        return code;
    }
    tail_chars(transcript, fallback_chars).trim().to_string()
}

/// Opening fence through closing fence, inclusive, trimmed.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find(FENCE)?;
    let body_start = start + FENCE.len();
    let close = text[body_start..].find(FENCE)?;
    let end = body_start + close + FENCE.len();
    Some(text[start..end].trim())
}

fn looks_like_code(line: &str) -> bool {
    line.trim_start().starts_with("//")
        || line.contains("#include")
        || find_word_start(line, "void ").is_some()
        || find_word_start(line, "int ").is_some()
}

fn is_indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

fn code_line_run(text: &str) -> Option<String> {
    let mut collected: Vec<&str> = Vec::new();

    for line in text.lines() {
        if looks_like_code(line) {
            collected.push(line);
        } else if collected.is_empty() || line.trim().is_empty() {
            continue;
        } else if is_indented(line) {
            collected.push(line);
        } else {
            break;
        }
    }

    if collected.is_empty() {
        None
    } else {
        Some(collected.join("\n"))
    }
}

/// Trailing `max_chars` characters of `text`.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((byte_idx, _)) => &text[byte_idx..],
        None => text,
    }
}

/// Slice spanning `before` chars ahead of `byte_idx` and `after` chars from it.
fn char_window(text: &str, byte_idx: usize, before: usize, after: usize) -> &str {
    let start = text[..byte_idx]
        .char_indices()
        .rev()
        .take(before)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(byte_idx);
    let end = byte_idx + truncate_chars(&text[byte_idx..], after).len();
    &text[start..end]
}

/// ASCII case-insensitive search for `needle` starting at byte `from`.
///
/// Needles are ASCII, so any match starts on a char boundary.
fn find_ascii_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.is_empty() || from > hay.len() || hay.len() - from < pat.len() {
        return None;
    }
    hay[from..]
        .windows(pat.len())
        .position(|w| w.eq_ignore_ascii_case(pat))
        .map(|pos| pos + from)
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Like [`find_ascii_ci`] but only where `needle` begins a word.
fn find_word_start(haystack: &str, needle: &str) -> Option<usize> {
    find_bounded(haystack, needle, false)
}

/// Like [`find_ascii_ci`] but only where `needle` is a whole word.
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    find_bounded(haystack, needle, true)
}

fn find_bounded(haystack: &str, needle: &str, whole_word: bool) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let mut from = 0;
    while let Some(idx) = find_ascii_ci(haystack, needle, from) {
        let starts = idx == 0 || !is_word_byte(bytes[idx - 1]);
        let ends = !whole_word
            || bytes
                .get(idx + needle.len())
                .map_or(true, |b| !is_word_byte(*b));
        if starts && ends {
            return Some(idx);
        }
        from = idx + 1;
    }
    None
}
