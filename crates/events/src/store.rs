//! JSONL store - append-only writer with daily file rotation

use crate::error::EventError;
use crate::event::EventRecord;
use crate::reader::jsonl_files;
use chrono::DateTime;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Records that carry a unix-seconds timestamp, used to pick the file
pub trait Timestamped {
    fn timestamp(&self) -> u64;
}

impl Timestamped for EventRecord {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Append-only JSONL store, one `YYYY-MM-DD.jsonl` file per day
pub struct EventStore<T> {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
    _record: PhantomData<fn(&T)>,
}

impl<T: Serialize + Timestamped> EventStore<T> {
    /// Create a new store at the given path
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, EventError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            current_file: None,
            current_date: None,
            _record: PhantomData,
        })
    }

    /// Append a record to the store
    pub fn append(&mut self, record: &T) -> Result<(), EventError> {
        let date = file_date(record.timestamp())?;

        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        if let Some(ref mut writer) = self.current_file {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }

        Ok(())
    }

    /// Rotate to a new file for the given date
    fn rotate_file(&mut self, date: &str) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        tracing::debug!(path = %file_path.display(), "Rotated JSONL file");

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }

    /// Files written so far, oldest first
    pub fn list_files(&self) -> Result<Vec<PathBuf>, EventError> {
        jsonl_files(&self.base_path)
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }
        self.current_file = None;
        self.current_date = None;
        Ok(())
    }
}

impl<T> Drop for EventStore<T> {
    fn drop(&mut self) {
        if let Some(ref mut writer) = self.current_file {
            let _ = writer.flush();
        }
    }
}

fn file_date(timestamp: u64) -> Result<String, EventError> {
    let secs = i64::try_from(timestamp).map_err(|_| EventError::InvalidTimestamp(timestamp))?;
    let datetime =
        DateTime::from_timestamp(secs, 0).ok_or(EventError::InvalidTimestamp(timestamp))?;
    Ok(datetime.format("%Y-%m-%d").to_string())
}
