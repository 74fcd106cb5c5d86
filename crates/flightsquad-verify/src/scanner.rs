//! Line-local compliance scanner for flight-controller C sources.
//!
//! Best-effort heuristics. Every rule sees one line at a time, with no
//! awareness of comments, string literals or surrounding lines:
//! - a commented-out `delay(10);` is still flagged
//! - a loop whose `{` or timeout check sits on a later line is judged from
//!   the opener line alone

use flightsquad_core::{ComplianceViolation, CustomRuleConfig, Result, RuleId, SquadError};
use regex::Regex;
use std::path::Path;

const LOOP_MESSAGE: &str = "Potential infinite while-loop without a safety timeout.";
const TIMEOUT_TOKEN: &str = "timeout";

#[derive(Debug)]
enum Check {
    Pattern(Regex),
    UnboundedLoop,
}

#[derive(Debug)]
struct Rule {
    id: RuleId,
    check: Check,
    message: String,
}

/// Fixed rule table plus any configured extras.
#[derive(Debug)]
pub struct PatternScanner {
    rules: Vec<Rule>,
    loop_opener: Regex,
}

fn compile(rule: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| SquadError::InvalidPattern {
        rule: rule.to_string(),
        reason: e.to_string(),
    })
}

impl PatternScanner {
    /// Scanner with the built-in rules.
    pub fn new() -> Result<Self> {
        let rules = vec![
            Rule {
                id: RuleId::BlockingCall,
                check: Check::Pattern(compile("BLOCKING_CALL", r"\bdelay\s*\(")?),
                message: "Forbidden use of blocking delay(). Use the task scheduler.".to_string(),
            },
            Rule {
                id: RuleId::BlockingCall,
                check: Check::Pattern(compile("BLOCKING_CALL", r"\bdelayMicroseconds\s*\(")?),
                message: "Blocking micro-delay detected. Is this in a time-critical ISR?"
                    .to_string(),
            },
            Rule {
                id: RuleId::UnboundedLoop,
                check: Check::UnboundedLoop,
                message: LOOP_MESSAGE.to_string(),
            },
            Rule {
                id: RuleId::DynamicAlloc,
                check: Check::Pattern(compile(
                    "DYNAMIC_ALLOC",
                    r"\b(?:malloc|calloc|realloc)\s*\(",
                )?),
                message: "Dynamic memory allocation is forbidden. Use static arrays.".to_string(),
            },
        ];

        Ok(Self {
            rules,
            loop_opener: compile("UNBOUNDED_LOOP", r"\bwhile\s*\(")?,
        })
    }

    /// Append configured regex rules after the built-ins.
    pub fn with_custom_rules(mut self, extra: &[CustomRuleConfig]) -> Result<Self> {
        for rule in extra {
            self.rules.push(Rule {
                id: RuleId::Custom(rule.id.clone()),
                check: Check::Pattern(compile(&rule.id, &rule.pattern)?),
                message: rule.message.clone(),
            });
        }
        Ok(self)
    }

    /// Number of active rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Check every line against every rule.
    ///
    /// Violations come out in line order, then rule-table order within a line.
    pub fn scan(&self, text: &str) -> Vec<ComplianceViolation> {
        let mut violations = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            for rule in &self.rules {
                let hit = match &rule.check {
                    Check::Pattern(re) => re.is_match(line),
                    Check::UnboundedLoop => self.has_unbounded_loop(line),
                };
                if hit {
                    violations.push(ComplianceViolation::new(
                        idx + 1,
                        rule.id.clone(),
                        rule.message.clone(),
                    ));
                }
            }
        }
        violations
    }

    /// Read a file and scan it.
    pub fn scan_file(&self, path: impl AsRef<Path>) -> Result<Vec<ComplianceViolation>> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.scan(&text))
    }

    /// A `while (cond) {` opener where neither the condition nor the body
    /// text up to the first `}` on this line mentions a timeout.
    fn has_unbounded_loop(&self, line: &str) -> bool {
        for m in self.loop_opener.find_iter(line) {
            let open = m.end() - 1;
            let Some(close) = matching_paren(line, open) else {
                continue;
            };
            let condition = &line[open + 1..close];
            if condition.trim().is_empty() {
                continue;
            }
            let Some(body) = line[close + 1..].trim_start().strip_prefix('{') else {
                continue;
            };
            let body = body.split('}').next().unwrap_or_default();

            if !mentions_timeout(condition) && !mentions_timeout(body) {
                return true;
            }
        }
        false
    }
}

fn mentions_timeout(text: &str) -> bool {
    text.to_ascii_lowercase().contains(TIMEOUT_TOKEN)
}

/// Byte index of the `)` closing the `(` at `open`.
fn matching_paren(line: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in line.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> PatternScanner {
        PatternScanner::new().expect("built-in rules compile")
    }

    fn rules(text: &str) -> Vec<RuleId> {
        scanner().scan(text).into_iter().map(|v| v.rule_id).collect()
    }

    #[test]
    fn test_clean_file_has_no_violations() {
        let text = "#include \"platform.h\"\n\nvoid taskUpdate(timeUs_t now)\n{\n    schedulerIgnoreTaskExecTime();\n}\n";
        assert!(scanner().scan(text).is_empty());
    }

    #[test]
    fn test_delay_flagged_per_line() {
        let text = "int a;\ndelay(100);\nint b;\n  delay (5);\n";
        let violations = scanner().scan(text);
        let lines: Vec<usize> = violations.iter().map(|v| v.line_number).collect();
        assert_eq!(lines, vec![2, 4]);
        assert!(violations.iter().all(|v| v.rule_id == RuleId::BlockingCall));
        assert_eq!(
            violations[0].message,
            "Forbidden use of blocking delay(). Use the task scheduler."
        );
    }

    #[test]
    fn test_delay_microseconds_is_its_own_rule() {
        let violations = scanner().scan("delayMicroseconds(10);");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("micro-delay"));
    }

    #[test]
    fn test_identifiers_ending_in_delay_not_flagged() {
        assert!(rules("motorDelay(3);\nsetdelay(1);").is_empty());
    }

    #[test]
    fn test_unbounded_loop() {
        assert_eq!(rules("while (!gpsReady) {"), vec![RuleId::UnboundedLoop]);
        assert_eq!(
            rules("while (isBusy(spi)) { spin(); }"),
            vec![RuleId::UnboundedLoop]
        );
    }

    #[test]
    fn test_loop_with_timeout_is_allowed() {
        assert!(rules("while (micros() < timeoutAt) {").is_empty());
        assert!(rules("while (busy) { if (TIMEOUT_EXPIRED()) break; }").is_empty());
        assert!(rules("while (!ready && (cmp32(millis(), startMs) < SPI_TIMEOUT)) {").is_empty());
    }

    #[test]
    fn test_loop_without_brace_on_line_not_flagged() {
        assert!(rules("while (busy)").is_empty());
        assert!(rules("do { x++; } while (x < 10);").is_empty());
    }

    #[test]
    fn test_dynamic_alloc_variants() {
        let text = "p = malloc(16);\nq = calloc(4, 4);\nr = realloc(p, 32);";
        assert_eq!(rules(text), vec![RuleId::DynamicAlloc; 3]);
    }

    #[test]
    fn test_multiple_rules_on_one_line() {
        let violations = scanner().scan("while (1) { buf = malloc(4); delay(1); }");
        let ids: Vec<RuleId> = violations.iter().map(|v| v.rule_id.clone()).collect();
        assert_eq!(
            ids,
            vec![RuleId::BlockingCall, RuleId::UnboundedLoop, RuleId::DynamicAlloc]
        );
        assert!(violations.iter().all(|v| v.line_number == 1));
    }

    #[test]
    fn test_custom_rules() {
        let extra = vec![CustomRuleConfig {
            id: "NO_PRINTF".to_string(),
            pattern: r"\bprintf\s*\(".to_string(),
            message: "Use the CLI print helpers.".to_string(),
        }];
        let scanner = scanner().with_custom_rules(&extra).expect("compile");
        assert_eq!(scanner.rule_count(), 5);

        let violations = scanner.scan("printf(\"hi\");");
        assert_eq!(violations[0].rule_id, RuleId::Custom("NO_PRINTF".to_string()));
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let extra = vec![CustomRuleConfig {
            id: "BROKEN".to_string(),
            pattern: "(".to_string(),
            message: "x".to_string(),
        }];
        let err = scanner().with_custom_rules(&extra).unwrap_err();
        assert!(matches!(err, SquadError::InvalidPattern { ref rule, .. } if rule == "BROKEN"));
    }

    #[test]
    fn test_scan_file_missing() {
        let err = scanner().scan_file("/nonexistent/flightsquad/foo.c").unwrap_err();
        assert!(matches!(err, SquadError::Io(_)));
    }

    #[test]
    fn test_matching_paren() {
        assert_eq!(matching_paren("while (a(b)) {", 6), Some(11));
        assert_eq!(matching_paren("while (a(b) {", 6), None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use proptest::sample::Index;

        /// Characters that cannot spell any built-in rule's keyword.
        const SAFE_LINE: &str = "[abcABC0-9 ;=+(){}_]{0,40}";

        proptest! {
            /// Text built only from rule-free characters never yields a violation
            #[test]
            fn prop_rule_free_text_is_clean(
                lines in prop::collection::vec(SAFE_LINE, 0..30),
            ) {
                let text = lines.join("\n");
                prop_assert!(scanner().scan(&text).is_empty());
            }

            /// Every line with an inserted `delay(` call is reported at its own line number
            #[test]
            fn prop_every_delay_line_reported(
                lines in prop::collection::vec(
                    (SAFE_LINE, any::<Index>(), any::<bool>(), 0u32..5000),
                    1..30,
                ),
            ) {
                let mut expected = Vec::new();
                let text: Vec<String> = lines
                    .iter()
                    .enumerate()
                    .map(|(i, (base, at, insert, ms))| {
                        if !*insert {
                            return base.clone();
                        }
                        expected.push(i + 1);
                        let pos = at.index(base.len() + 1);
                        format!("{} delay({ms}); {}", &base[..pos], &base[pos..])
                    })
                    .collect();

                let reported: Vec<usize> = scanner()
                    .scan(&text.join("\n"))
                    .into_iter()
                    .filter(|v| v.rule_id == RuleId::BlockingCall)
                    .map(|v| v.line_number)
                    .collect();
                prop_assert_eq!(reported, expected);
            }
        }
    }
}
