pub mod log;

use std::path::{Path, PathBuf};

use crate::memory::types::RunId;

pub use log::AppendLog;

/// Directory under the data dir holding one sub-directory per run
pub const RUNS_DIR: &str = "runs";

/// Directory holding every log of `run`
pub fn run_dir(data_dir: &Path, run: RunId) -> PathBuf {
    data_dir.join(RUNS_DIR).join(run.to_string())
}

/// Path of the log for one table or store of `run`
pub fn log_path(data_dir: &Path, run: RunId, category: &str) -> PathBuf {
    run_dir(data_dir, run).join(format!("{category}.jsonl"))
}
