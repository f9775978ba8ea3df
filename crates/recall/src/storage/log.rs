//! JSON-lines append log
//!
//! Each table or store of a run persists to its own file with one serialized
//! entry per line. Entries are flushed as they are appended so that a run can
//! be reopened after a process restart and replayed in insertion order.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{RecallError, Result};

/// Append-only log of serialized entries backed by a single file
#[derive(Debug)]
pub struct AppendLog<T> {
    path: PathBuf,
    writer: BufWriter<File>,
    _entry: PhantomData<fn(T)>,
}

impl<T> AppendLog<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open (or create) the log at `path`, returning the entries already in it
    pub fn open(path: &Path) -> Result<(Self, Vec<T>)> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RecallError::Storage(format!(
                    "Failed to create log directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let entries = if path.exists() {
            Self::replay(path)?
        } else {
            Vec::new()
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                RecallError::Storage(format!("Failed to open log {}: {e}", path.display()))
            })?;

        debug!("Opened log {} with {} entries", path.display(), entries.len());

        Ok((
            Self {
                path: path.to_path_buf(),
                writer: BufWriter::new(file),
                _entry: PhantomData,
            },
            entries,
        ))
    }

    fn replay(path: &Path) -> Result<Vec<T>> {
        let file = File::open(path).map_err(|e| {
            RecallError::Storage(format!("Failed to read log {}: {e}", path.display()))
        })?;

        let mut entries = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|e| {
                RecallError::Storage(format!(
                    "Corrupt entry at {}:{}: {e}",
                    path.display(),
                    line_no + 1
                ))
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Append one entry and flush it to disk
    pub fn append(&mut self, entry: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, entry)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
