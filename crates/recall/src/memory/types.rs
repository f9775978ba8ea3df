//! Identity and value types for the Recall memory
//!
//! Every record appended during a run is addressed by a [`RecordId`], the
//! pair of the run's epoch and a per-table sequence number. Side values
//! attached to records are carried by the [`Value`] sum type.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Epoch (seconds since UNIX epoch) marking when a run started.
///
/// All tables and stores of one run share a `RunId`, which partitions
/// identity spaces so that runs never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub i64);

impl RunId {
    /// A run id for a run starting now
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique, ordered identity of one appended record.
///
/// Ordering is by run first and then by sequence number, so within a run
/// the ordering matches insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId {
    pub run: RunId,
    pub seq: u64,
}

impl RecordId {
    pub fn new(run: RunId, seq: u64) -> Self {
        Self { run, seq }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.run, self.seq)
    }
}

/// A single text record held by a [`MemoryTable`](super::MemoryTable).
///
/// Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: RecordId,
    pub text: String,
    /// Only present for tables queried by similarity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// The kind a [`ValueStore`](super::ValueStore) is declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Integer,
    Float,
    String,
    Reference,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Reference => "reference",
        }
    }
}

/// A side value attached to a record.
///
/// `Absent` always means "not yet set" and is distinct from any zero value:
/// an action nobody has scored is `Absent`, never `Float(0.0)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Absent,
    Integer(i64),
    Float(f64),
    String(String),
    Reference(RecordId),
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// The kind of a concrete value; `None` for `Absent`
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Absent => None,
            Value::Integer(_) => Some(ValueKind::Integer),
            Value::Float(_) => Some(ValueKind::Float),
            Value::String(_) => Some(ValueKind::String),
            Value::Reference(_) => Some(ValueKind::Reference),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind().map(|k| k.as_str()).unwrap_or("absent")
    }

    /// Numeric view used for ranking; integers widen to floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<RecordId> {
        match self {
            Value::Reference(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<RecordId> for Value {
    fn from(v: RecordId) -> Self {
        Value::Reference(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "-"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Reference(id) => write!(f, "{id}"),
        }
    }
}
