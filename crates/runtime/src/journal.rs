//! Transaction journal - the durable source of truth
//!
//! Only committed transactions are written. Events are not persisted;
//! replay regenerates them with their original timestamps.

use crate::error::RuntimeError;
use crate::transaction::Transaction;
use gcdex_events::{EventReader, EventStore, Timestamped};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One journaled transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Starts at 1, no gaps
    pub sequence: u64,
    #[serde(flatten)]
    pub tx: Transaction,
}

impl Timestamped for JournalEntry {
    fn timestamp(&self) -> u64 {
        self.tx.timestamp
    }
}

/// Append-only JSONL journal with daily files
pub struct Journal {
    path: PathBuf,
    store: EventStore<JournalEntry>,
    last_sequence: u64,
}

impl Journal {
    /// Open (or create) the journal in `path`, returning every entry
    /// already written so the caller can replay them
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<JournalEntry>), RuntimeError> {
        let path = path.as_ref().to_path_buf();
        let entries = Self::read_all(&path)?;
        let last_sequence = entries.last().map(|e| e.sequence).unwrap_or(0);
        let store = EventStore::new(&path)?;

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened journal");

        Ok((
            Self {
                path,
                store,
                last_sequence,
            },
            entries,
        ))
    }

    /// Read every entry under `path` in order
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<JournalEntry>, RuntimeError> {
        Ok(EventReader::<JournalEntry>::from_directory(path)?.read_all()?)
    }

    /// Append a committed transaction
    pub fn append(&mut self, tx: &Transaction) -> Result<JournalEntry, RuntimeError> {
        let entry = JournalEntry {
            sequence: self.last_sequence + 1,
            tx: tx.clone(),
        };
        self.store.append(&entry)?;
        self.last_sequence = entry.sequence;
        Ok(entry)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
