//! Persistence of the last processed session end
//!
//! The checkpoint is a single RFC 3339 timestamp in a small text file. It is
//! read once before a history run and overwritten once after a successful run.

use crate::clock::Timestamp;
use crate::error::{JuicesyncError, Result};
use crate::logging::{StructuredLogger, get_logger};
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeDelta, Utc};
use std::path::{Path, PathBuf};

/// Seconds from the epoch to 2010-01-01T00:00:00Z, well before any JuiceNet history
const FIRST_RUN_EPOCH_SECS: i64 = 1_262_304_000;

/// Checkpoint used when none has been stored yet
pub fn first_run_checkpoint() -> Timestamp {
    DateTime::UNIX_EPOCH + TimeDelta::seconds(FIRST_RUN_EPOCH_SECS)
}

/// Parse stored checkpoint text: RFC 3339, or a bare `YYYY-MM-DD` meaning midnight UTC
pub fn parse_checkpoint(text: &str) -> Result<Timestamp> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
}

/// Where a run reads and records its progress
pub trait CheckpointStore {
    fn load(&self) -> Result<Timestamp>;
    fn save(&self, checkpoint: Timestamp) -> Result<()>;
}

/// File-backed checkpoint
pub struct FileCheckpoint {
    path: PathBuf,
    logger: StructuredLogger,
}

impl FileCheckpoint {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            logger: get_logger("checkpoint"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for FileCheckpoint {
    /// Stored checkpoint, or [`first_run_checkpoint`] when the file does not exist
    fn load(&self) -> Result<Timestamp> {
        if !self.path.exists() {
            self.logger.info(&format!(
                "No checkpoint at {}, treating as first run",
                self.path.display()
            ));
            return Ok(first_run_checkpoint());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let checkpoint = parse_checkpoint(&contents).map_err(|e| {
            JuicesyncError::checkpoint(format!(
                "{} holds an unreadable timestamp {:?}: {}",
                self.path.display(),
                contents.trim(),
                e
            ))
        })?;
        self.logger
            .debug(&format!("Loaded checkpoint {}", checkpoint));
        Ok(checkpoint)
    }

    /// Replace the stored checkpoint; written to a sibling file first, then renamed
    fn save(&self, checkpoint: Timestamp) -> Result<()> {
        let text = checkpoint.to_rfc3339_opts(SecondsFormat::Secs, true);
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &text)?;
        std::fs::rename(&tmp, &self.path)?;
        self.logger.info(&format!("Updated checkpoint to {}", text));
        Ok(())
    }
}
