//! JSONL reader - sequential reader for replay

use crate::error::EventError;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Sequential reader over every JSONL file of a store, in file order
pub struct EventReader<T> {
    files: Vec<PathBuf>,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> EventReader<T> {
    /// Reader over the `*.jsonl` files of `path`; a missing directory
    /// reads as empty
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        let files = if path.exists() { jsonl_files(path)? } else { Vec::new() };
        Ok(Self {
            files,
            _record: PhantomData,
        })
    }

    /// Read all records from all files in order
    pub fn read_all(&self) -> Result<Vec<T>, EventError> {
        let mut records = Vec::new();
        for file_path in &self.files {
            let reader = BufReader::new(File::open(file_path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let record = serde_json::from_str(&line).map_err(|e| {
                    EventError::InvalidFile(format!("{}:{}: {}", file_path.display(), line_no + 1, e))
                })?;
                records.push(record);
            }
        }
        Ok(records)
    }
}

/// `*.jsonl` files directly under `dir`, sorted by name (and so by date)
pub(crate) fn jsonl_files(dir: &Path) -> Result<Vec<PathBuf>, EventError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    files.retain(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "jsonl"));
    files.sort();
    Ok(files)
}
