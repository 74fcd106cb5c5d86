//! Codebase lookup tools handed to agents.
//!
//! Every tool returns plain text, errors included, since its output goes
//! straight back into a model prompt.

use flightsquad_core::{CommandRunner, CommandSpec, ToolsConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Runner label for codebase searches.
pub const SEARCH_LABEL: &str = "search";

/// Standing reminder appended by [`check_atomic_access`].
pub const ATOMIC_REVIEW_NOTE: &str = "Manual Review Required: Ensure all shared 'uint32_t' flags are wrapped in ATOMIC_BLOCK(NVIC_PRIO_MAX).";

/// Recursive grep over the firmware source tree.
pub struct CodebaseTools {
    runner: Arc<dyn CommandRunner>,
    config: ToolsConfig,
}

impl CodebaseTools {
    pub fn new(runner: Arc<dyn CommandRunner>, config: ToolsConfig) -> Self {
        Self { runner, config }
    }

    /// `grep -rn` for `query` under the source root, skipping `obj/`.
    ///
    /// Returns at most `max_search_results` lines of `path:line:text`.
    pub async fn search_codebase(&self, query: &str) -> String {
        let spec = CommandSpec {
            label: SEARCH_LABEL.to_string(),
            program: "grep".to_string(),
            args: vec![
                "-rn".to_string(),
                "--exclude-dir=obj".to_string(),
                "--".to_string(),
                query.to_string(),
                self.config.src_root.to_string_lossy().to_string(),
            ],
            work_dir: None,
            timeout_secs: 0,
            run_for_secs: 0,
        };

        let stdout = match self.runner.run(&spec).await {
            Ok(out) => out.stdout,
            Err(e) => {
                warn!(query = %query, error = %e, "codebase search failed");
                String::new()
            }
        };

        if stdout.trim().is_empty() {
            return format!("No results found for '{query}'.");
        }

        stdout
            .lines()
            .take(self.config.max_search_results)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Whole file as text, or `Error reading file: <reason>`.
pub async fn read_file_content(path: impl AsRef<Path>) -> String {
    match tokio::fs::read_to_string(path.as_ref()).await {
        Ok(text) => text,
        Err(e) => format!("Error reading file: {e}"),
    }
}

/// Advisory check for shared state touched outside `ATOMIC_BLOCK`.
///
/// Proves nothing. File-scope `volatile` declarations are listed as the
/// variables to review, followed by [`ATOMIC_REVIEW_NOTE`].
pub async fn check_atomic_access(path: impl AsRef<Path>) -> String {
    let text = match tokio::fs::read_to_string(path.as_ref()).await {
        Ok(text) => text,
        Err(e) => return format!("Error reading file: {e}"),
    };

    let mut report: Vec<String> = text
        .lines()
        .enumerate()
        .filter(|(_, line)| is_shared_volatile(line))
        .map(|(i, line)| format!("Line {}: shared volatile declaration: {}", i + 1, line.trim()))
        .collect();
    report.push(ATOMIC_REVIEW_NOTE.to_string());
    report.join("\n")
}

/// Unindented declaration carrying the `volatile` qualifier.
fn is_shared_volatile(line: &str) -> bool {
    !line.starts_with(char::is_whitespace)
        && line.trim_end().ends_with(';')
        && line
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .any(|word| word == "volatile")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedRunner;
    use crate::runner::ProcessRunner;
    use std::path::PathBuf;

    fn tools(script: ScriptedRunner) -> (Arc<ScriptedRunner>, CodebaseTools) {
        let script = Arc::new(script);
        let config = ToolsConfig {
            src_root: PathBuf::from("/workspace/src"),
            max_search_results: 20,
        };
        (script.clone(), CodebaseTools::new(script, config))
    }

    #[tokio::test]
    async fn test_search_truncates_results() {
        let hits: String = (1..=30)
            .map(|i| format!("src/main/flight/gps_rescue.c:{i}:rescueState\n"))
            .collect();
        let (script, tools) = tools(ScriptedRunner::new().with_output(SEARCH_LABEL, 0, hits, ""));

        let result = tools.search_codebase("rescueState").await;
        assert_eq!(result.lines().count(), 20);
        assert!(result.ends_with("gps_rescue.c:20:rescueState"));

        let call = &script.calls()[0];
        assert_eq!(call.program, "grep");
        assert_eq!(
            call.args,
            vec!["-rn", "--exclude-dir=obj", "--", "rescueState", "/workspace/src"]
        );
    }

    #[tokio::test]
    async fn test_search_no_results() {
        let (_, tools) = tools(ScriptedRunner::new().with_output(SEARCH_LABEL, 1, "", ""));
        assert_eq!(
            tools.search_codebase("noSuchSymbol").await,
            "No results found for 'noSuchSymbol'."
        );
    }

    #[tokio::test]
    async fn test_search_real_grep() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("obj")).unwrap();
        std::fs::write(dir.path().join("osd.c"), "void osdInit(void);\n").unwrap();
        std::fs::write(dir.path().join("obj").join("osd.i"), "void osdInit(void);\n").unwrap();

        let tools = CodebaseTools::new(
            Arc::new(ProcessRunner),
            ToolsConfig {
                src_root: dir.path().to_path_buf(),
                max_search_results: 20,
            },
        );
        let result = tools.search_codebase("osdInit").await;
        assert_eq!(result.lines().count(), 1);
        assert!(result.contains("osd.c:1:"));
    }

    #[tokio::test]
    async fn test_read_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pid.c");
        std::fs::write(&path, "float pidGain;\n").unwrap();
        assert_eq!(read_file_content(&path).await, "float pidGain;\n");

        let missing = read_file_content(dir.path().join("nope.c")).await;
        assert!(missing.starts_with("Error reading file: "));
    }

    #[tokio::test]
    async fn test_atomic_access_lists_shared_volatiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rx.c");
        std::fs::write(
            &path,
            "static volatile uint32_t rxFrameFlags;\n\
             static uint32_t counter;\n\
             void rxIrq(void)\n{\n    volatile int local;\n    rxFrameFlags |= 1;\n}\n\
             volatile bool volatileFlag = false;\n",
        )
        .unwrap();

        let report = check_atomic_access(&path).await;
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Line 1: shared volatile declaration: static volatile uint32_t rxFrameFlags;",
                "Line 8: shared volatile declaration: volatile bool volatileFlag = false;",
                ATOMIC_REVIEW_NOTE,
            ]
        );
    }

    #[tokio::test]
    async fn test_atomic_access_reminder_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("osd.c");
        std::fs::write(&path, "static uint8_t osdRow;\n").unwrap();
        assert_eq!(check_atomic_access(&path).await, ATOMIC_REVIEW_NOTE);

        let missing = check_atomic_access(dir.path().join("nope.c")).await;
        assert!(missing.starts_with("Error reading file: "));
    }
}
