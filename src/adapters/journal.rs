//! JSONL Event Journal
//!
//! Appends one JSON object per line to a local file. Writes happen under
//! a blocking mutex; records are small and the file is line-buffered, so
//! holding the lock across the write is fine at pipeline throughput.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::journal::{EventJournal, JournalError, JournalRecord};

pub struct JsonlJournal {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlJournal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventJournal for JsonlJournal {
    async fn append(&self, record: &JournalRecord) -> Result<(), JournalError> {
        let line = serde_json::to_string(record)
            .map_err(|e| JournalError::Write(e.to_string()))?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| JournalError::Write("journal mutex poisoned".to_string()))?;
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RejectReason, TokenId};

    #[tokio::test]
    async fn test_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let journal = JsonlJournal::open(&path).unwrap();

        let token = TokenId::new("bsc", "0xabc");
        journal
            .append(&JournalRecord::filter_reject(
                token.clone(),
                "PEPE".to_string(),
                RejectReason::LiquidityBelowFloor,
            ))
            .await
            .unwrap();
        journal
            .append(&JournalRecord::filter_reject(
                token,
                "PEPE".to_string(),
                RejectReason::TooYoung,
            ))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("liquidity_below_floor"));
        assert!(lines[1].contains("too_young"));
    }

    #[tokio::test]
    async fn test_lines_round_trip_as_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let journal = JsonlJournal::open(&path).unwrap();

        journal
            .append(&JournalRecord::PaperTrade {
                strategy: "degen_sword".to_string(),
                symbol: "WIF".to_string(),
                event: "stop_loss".to_string(),
                realized_pnl_usd: -3.0,
                at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: JournalRecord = serde_json::from_str(contents.trim()).unwrap();
        assert!(matches!(parsed, JournalRecord::PaperTrade { .. }));
    }

    #[test]
    fn test_creates_missing_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/events.jsonl");
        let journal = JsonlJournal::open(&path).unwrap();
        assert!(journal.path().parent().unwrap().exists());
    }
}
