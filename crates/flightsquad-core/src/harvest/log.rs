//! Append-only training record log.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::error::{HarvestError, HarvestResult};
use crate::domain::TrainingRecord;

/// Storage for harvested records.
///
/// Writes are append-only; the approval pass replaces the whole record set.
/// Implementations assume a single writer.
pub trait RecordLog: Send + Sync {
    /// Append one record at the end of the log.
    fn append(&self, record: &TrainingRecord) -> HarvestResult<()>;

    /// Read every record in log order.
    fn load(&self) -> HarvestResult<Vec<TrainingRecord>>;

    /// Replace the full contents of the log.
    fn rewrite(&self, records: &[TrainingRecord]) -> HarvestResult<()>;
}

/// JSON Lines file, one record per line.
///
/// A missing file reads as an empty log. Rewrites go to a temp file in the
/// same directory and are renamed over the log, so a failed rewrite leaves
/// the previous contents intact.
#[derive(Debug, Clone)]
pub struct JsonlRecordLog {
    path: PathBuf,
}

impl JsonlRecordLog {
    /// Open a log at `path`, creating missing parent directories.
    pub fn new(path: impl AsRef<Path>) -> HarvestResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

impl RecordLog for JsonlRecordLog {
    fn append(&self, record: &TrainingRecord) -> HarvestResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn load(&self) -> HarvestResult<Vec<TrainingRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        raw.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|source| HarvestError::Parse {
                    line: i + 1,
                    source,
                })
            })
            .collect()
    }

    fn rewrite(&self, records: &[TrainingRecord]) -> HarvestResult<()> {
        let mut body = String::new();
        for record in records {
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }

        let mut tmp = NamedTempFile::new_in(self.parent_dir())?;
        tmp.write_all(body.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
