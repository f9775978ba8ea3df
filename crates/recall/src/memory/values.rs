//! Typed side-value storage keyed by record identity
//!
//! A `ValueStore` attaches one value per [`RecordId`]: scores, references
//! between tables, advice sources, hint texts. Each store is declared for a
//! single [`ValueKind`] when it is created and rejects values of any other
//! kind; [`Value::Absent`] is accepted everywhere and means "not yet set".

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RecallError, Result};
use crate::memory::types::{RecordId, RunId, Value, ValueKind};
use crate::storage::{AppendLog, log_path};

/// One persisted line of a value store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub id: RecordId,
    pub value: Value,
}

#[derive(Debug)]
pub struct ValueStore {
    name: String,
    run: RunId,
    kind: ValueKind,
    values: BTreeMap<RecordId, Value>,
    /// Next slot for `add`, kept in lockstep with a companion table
    next_seq: u64,
    log: Option<AppendLog<ValueRecord>>,
}

impl ValueStore {
    pub fn in_memory(run: RunId, name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            run,
            kind,
            values: BTreeMap::new(),
            next_seq: 0,
            log: None,
        }
    }

    /// Open the persisted store `name` of `run`; later lines for an id
    /// supersede earlier ones
    pub fn open(data_dir: &Path, run: RunId, name: &str, kind: ValueKind) -> Result<Self> {
        let path = log_path(data_dir, run, name);
        let (log, entries) = AppendLog::<ValueRecord>::open(&path)?;

        let mut store = Self::in_memory(run, name, kind);
        for entry in entries {
            store.check_kind(&entry.value)?;
            store.remember(entry.id, entry.value);
        }
        store.log = Some(log);

        debug!("Replayed {} values into store '{}'", store.values.len(), name);
        Ok(store)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check_kind(&self, value: &Value) -> Result<()> {
        match value.kind() {
            None => Ok(()),
            Some(kind) if kind == self.kind => Ok(()),
            Some(_) => Err(RecallError::TypeMismatch {
                store: self.name.clone(),
                expected: self.kind.as_str(),
                found: value.kind_name(),
            }),
        }
    }

    fn remember(&mut self, id: RecordId, value: Value) {
        if id.run == self.run && id.seq >= self.next_seq {
            self.next_seq = id.seq + 1;
        }
        self.values.insert(id, value);
    }

    fn put(&mut self, id: RecordId, value: Value) -> Result<()> {
        self.check_kind(&value)?;
        if let Some(log) = self.log.as_mut() {
            log.append(&ValueRecord {
                id,
                value: value.clone(),
            })?;
        }
        self.remember(id, value);
        Ok(())
    }

    /// Append a value at the next sequence slot of this run, returning the id
    /// it was stored under
    pub fn add(&mut self, value: Value) -> Result<RecordId> {
        let id = RecordId::new(self.run, self.next_seq);
        self.put(id, value)?;
        Ok(id)
    }

    /// Append a value explicitly bound to `id` (typically a record of
    /// another table)
    pub fn add_at(&mut self, id: RecordId, value: Value) -> Result<()> {
        self.put(id, value)
    }

    /// Overwrite or create the value at `id`
    pub fn set_val(&mut self, id: RecordId, value: Value) -> Result<()> {
        self.put(id, value)
    }

    /// First-write-wins write: once the slot holds a concrete value it is
    /// only replaced when `force` is set. Returns whether the value was
    /// written.
    pub fn write(&mut self, id: RecordId, value: Value, force: bool) -> Result<bool> {
        self.check_kind(&value)?;
        if !force && !self.get_val(id).is_absent() {
            return Ok(false);
        }
        self.put(id, value)?;
        Ok(true)
    }

    /// Value at `id`, or [`Value::Absent`] when nothing was stored
    pub fn get_val(&self, id: RecordId) -> Value {
        self.values.get(&id).cloned().unwrap_or_default()
    }

    /// Non-absent entries ordered by id
    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &Value)> {
        self.values.iter().filter(|(_, v)| !v.is_absent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUN: RunId = RunId(1_700_000_000);

    fn id(seq: u64) -> RecordId {
        RecordId::new(RUN, seq)
    }

    #[test]
    fn test_unwritten_id_is_absent() {
        let store = ValueStore::in_memory(RUN, "action_scores", ValueKind::Float);
        assert!(store.get_val(id(0)).is_absent());
        assert!(store.get_val(RecordId::new(RunId(3), 99)).is_absent());
    }

    #[test]
    fn test_add_uses_lockstep_slots() {
        let mut store = ValueStore::in_memory(RUN, "action_scores", ValueKind::Float);
        assert_eq!(store.add(Value::Absent).unwrap(), id(0));
        assert_eq!(store.add(Value::Float(2.0)).unwrap(), id(1));
        store.add_at(id(5), Value::Float(1.0)).unwrap();
        assert_eq!(store.add(Value::Absent).unwrap(), id(6));
    }

    #[test]
    fn test_type_discipline() {
        let mut scores = ValueStore::in_memory(RUN, "advice_scores", ValueKind::Float);
        let err = scores.set_val(id(0), Value::from("high")).unwrap_err();
        assert!(matches!(err, RecallError::TypeMismatch { .. }));
        assert!(scores.get_val(id(0)).is_absent());

        let mut refs = ValueStore::in_memory(RUN, "advice_refs", ValueKind::Reference);
        assert!(refs.add_at(id(0), Value::Float(1.0)).is_err());
        refs.add_at(id(0), Value::Reference(id(3))).unwrap();
        assert_eq!(refs.get_val(id(0)).as_reference(), Some(id(3)));

        refs.set_val(id(1), Value::Absent).unwrap();
    }

    #[test]
    fn test_first_write_wins_unless_forced() {
        let mut store = ValueStore::in_memory(RUN, "action_scores", ValueKind::Float);
        store.add_at(id(0), Value::Absent).unwrap();

        assert!(store.write(id(0), Value::Float(1.0), false).unwrap());
        assert!(!store.write(id(0), Value::Float(2.0), false).unwrap());
        assert_eq!(store.get_val(id(0)), Value::Float(1.0));

        assert!(store.write(id(0), Value::Float(2.0), true).unwrap());
        assert_eq!(store.get_val(id(0)), Value::Float(2.0));
    }

    #[test]
    fn test_set_val_overwrites() {
        let mut store = ValueStore::in_memory(RUN, "helpful_hints", ValueKind::String);
        store.set_val(id(2), Value::from("one")).unwrap();
        store.set_val(id(2), Value::from("two")).unwrap();
        assert_eq!(store.get_val(id(2)).as_str(), Some("two"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_iter_skips_absent() {
        let mut store = ValueStore::in_memory(RUN, "action_scores", ValueKind::Float);
        store.add(Value::Absent).unwrap();
        store.add(Value::Float(3.0)).unwrap();
        let entries: Vec<_> = store.iter().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(*entries[0].0, id(1));
    }

    #[test]
    fn test_persisted_store_keeps_latest_value() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store =
                ValueStore::open(dir.path(), RUN, "action_scores", ValueKind::Float).unwrap();
            store.add_at(id(0), Value::Absent).unwrap();
            store.write(id(0), Value::Float(6.0), false).unwrap();
            store.add_at(id(1), Value::Absent).unwrap();
        }

        let mut store =
            ValueStore::open(dir.path(), RUN, "action_scores", ValueKind::Float).unwrap();
        assert_eq!(store.get_val(id(0)), Value::Float(6.0));
        assert!(store.get_val(id(1)).is_absent());
        assert_eq!(store.add(Value::Absent).unwrap(), id(2));
    }

    #[test]
    fn test_replay_rejects_foreign_kind() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store =
                ValueStore::open(dir.path(), RUN, "advice_source", ValueKind::String).unwrap();
            store.add_at(id(0), Value::from("user")).unwrap();
        }
        let err = ValueStore::open(dir.path(), RUN, "advice_source", ValueKind::Float).unwrap_err();
        assert!(matches!(err, RecallError::TypeMismatch { .. }));
    }
}
