//! Recall - Episodic memory for autonomous LLM agents
//!
//! Records every context/action/advice exchange of a run, lets operator
//! feedback scores flow back over recent actions, and retrieves the most
//! useful past exchange as a hint for the agent's next decision.

pub mod agent;
pub mod config;
pub mod embedding;
pub mod error;
pub mod feedback;
pub mod memory;
pub mod retrieval;
pub mod storage;
pub mod summarizer;
pub mod testing;

pub use agent::{CycleOutcome, EpisodicAgent};
pub use config::Config;
pub use error::{RecallError, Result};
pub use feedback::Feedback;
pub use memory::{MemorySession, RecordId, RunId, Value};
pub use retrieval::{Hint, HintPath, RetrievalPolicy};
