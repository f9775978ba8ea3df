pub mod advise;
pub mod history;
pub mod runs;
pub mod score;
pub mod stats;

pub use advise::AdviseCommand;
pub use history::HistoryCommand;
pub use runs::RunsCommand;
pub use score::ScoreCommand;
pub use stats::StatsCommand;

use std::path::PathBuf;

use clap::Args;
use recall::Config;
use recall::memory::{MemorySession, RunId, ScoreOrchestrator};
use tracing::debug;

use crate::error::CliResult;
use crate::output::OutputFormat;

/// Settings shared by every subcommand
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub data_dir: PathBuf,
    pub config: Config,
    pub format: OutputFormat,
}

/// Selects a persisted run; the most recent one when omitted
#[derive(Args, Debug, Clone, Default)]
pub struct RunArg {
    #[clap(long, short, help = "Run id (defaults to the most recent run)")]
    pub run: Option<i64>,
}

impl CommandContext {
    pub fn runs(&self) -> CliResult<Vec<RunId>> {
        Ok(MemorySession::list_runs(&self.data_dir)?)
    }

    /// Open an existing run; never creates a new one
    pub fn open_run(&self, arg: &RunArg) -> CliResult<MemorySession> {
        let runs = self.runs()?;
        let runs_len = runs.len();
        let run = match arg.run {
            Some(run) => runs
                .into_iter()
                .find(|r| r.0 == run)
                .ok_or_else(|| format!("Run {run} not found in {}", self.data_dir.display()))?,
            None => runs
                .last()
                .copied()
                .ok_or_else(|| format!("No runs found in {}", self.data_dir.display()))?,
        };

        debug!("Selected run {} of {} under {}", run, runs_len, self.data_dir.display());
        let session = MemorySession::open(&self.data_dir, run)?
            .with_orchestrator(ScoreOrchestrator::new(&self.config.scoring));
        Ok(session)
    }
}
