//! Append-only memory table
//!
//! A `MemoryTable` holds the ordered log of (text, embedding) records for one
//! semantic category of a run (contexts, actions, advice) and answers exact,
//! similarity and temporal-neighbour queries over it.

use std::path::Path;

use tracing::debug;

use crate::error::{RecallError, Result};
use crate::memory::types::{MemoryRecord, RecordId, RunId};
use crate::storage::{AppendLog, log_path};

#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    run: RunId,
    /// Index equals sequence number: sequence numbers have no gaps
    records: Vec<MemoryRecord>,
    log: Option<AppendLog<MemoryRecord>>,
}

impl MemoryTable {
    /// Create a table that lives only as long as the process
    pub fn in_memory(run: RunId, name: &str) -> Self {
        Self {
            name: name.to_string(),
            run,
            records: Vec::new(),
            log: None,
        }
    }

    /// Open the persisted table `name` of `run` under `data_dir`, replaying
    /// any records already written during the run
    pub fn open(data_dir: &Path, run: RunId, name: &str) -> Result<Self> {
        let path = log_path(data_dir, run, name);
        let (log, records) = AppendLog::<MemoryRecord>::open(&path)?;

        for (expected_seq, record) in records.iter().enumerate() {
            if record.id != RecordId::new(run, expected_seq as u64) {
                return Err(RecallError::Storage(format!(
                    "Table '{name}' out of sequence: expected {}, found {}",
                    RecordId::new(run, expected_seq as u64),
                    record.id
                )));
            }
        }

        debug!("Replayed {} records into table '{}'", records.len(), name);

        Ok(Self {
            name: name.to_string(),
            run,
            records,
            log: Some(log),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    /// Append a record, assigning it the next sequence number.
    ///
    /// The record is persisted before it becomes visible; a failed write
    /// leaves the table unchanged and is returned to the caller.
    pub fn append(&mut self, text: &str, embedding: Option<Vec<f32>>) -> Result<RecordId> {
        let id = RecordId::new(self.run, self.records.len() as u64);
        let record = MemoryRecord {
            id,
            text: text.to_string(),
            embedding,
        };

        if let Some(log) = self.log.as_mut() {
            log.append(&record)?;
        }

        self.records.push(record);
        Ok(id)
    }

    fn record(&self, id: RecordId) -> Option<&MemoryRecord> {
        if id.run != self.run {
            return None;
        }
        self.records.get(usize::try_from(id.seq).ok()?)
    }

    pub fn get_text(&self, id: RecordId) -> Option<&str> {
        self.record(id).map(|r| r.text.as_str())
    }

    pub fn get_embedding(&self, id: RecordId) -> Option<&[f32]> {
        self.record(id).and_then(|r| r.embedding.as_deref())
    }

    pub fn last_id(&self) -> Option<RecordId> {
        self.records.last().map(|r| r.id)
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &MemoryRecord> {
        self.records.iter()
    }

    /// Ids of the `k` records most similar to `query`, best match first.
    ///
    /// The most recently appended record is the query's own and is never a
    /// candidate, so `k` is clamped to `count() - 1`. Ties on similarity go to
    /// the older record. Records without an embedding, or whose similarity
    /// is not finite (NaN components), are skipped.
    ///
    /// Fails with [`RecallError::Precondition`] when the table holds fewer
    /// than two records.
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<RecordId>> {
        if self.records.len() <= 1 {
            return Err(RecallError::Precondition(format!(
                "similarity search on '{}' needs at least 2 records, found {}",
                self.name,
                self.records.len()
            )));
        }

        let searchable = &self.records[..self.records.len() - 1];
        let k = k.min(searchable.len());

        let mut scored: Vec<(f32, RecordId)> = searchable
            .iter()
            .filter_map(|r| {
                r.embedding
                    .as_deref()
                    .map(|e| (cosine_similarity(query, e), r.id))
            })
            .filter(|(similarity, _)| similarity.is_finite())
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.seq.cmp(&b.1.seq)));
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, id)| id).collect())
    }

    /// Up to `distance` ids before `id`, nearest first
    pub fn backward_neighbors(&self, id: RecordId, distance: usize) -> Vec<RecordId> {
        if self.record(id).is_none() {
            return Vec::new();
        }
        (0..id.seq)
            .rev()
            .take(distance)
            .map(|seq| RecordId::new(self.run, seq))
            .collect()
    }

    /// Up to `distance` ids after `id`, nearest first
    pub fn forward_neighbors(&self, id: RecordId, distance: usize) -> Vec<RecordId> {
        if self.record(id).is_none() {
            return Vec::new();
        }
        (id.seq + 1..self.records.len() as u64)
            .take(distance)
            .map(|seq| RecordId::new(self.run, seq))
            .collect()
    }

    /// Trailing window counted from the last record, most recent first.
    ///
    /// Skips the `start_back` most recent records, then returns up to
    /// `num_back` records going further back.
    pub fn in_sequence_window(&self, num_back: usize, start_back: usize) -> Vec<RecordId> {
        let count = self.records.len();
        if start_back >= count {
            return Vec::new();
        }
        let newest = (count - 1 - start_back) as u64;
        (0..=newest)
            .rev()
            .take(num_back)
            .map(|seq| RecordId::new(self.run, seq))
            .collect()
    }
}

/// Cosine similarity in [-1, 1]; 0 for empty, mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
