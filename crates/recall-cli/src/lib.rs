pub mod commands;
pub mod error;
pub mod output;

pub use commands::{
    AdviseCommand, CommandContext, HistoryCommand, RunArg, RunsCommand, ScoreCommand,
    StatsCommand,
};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, format_run_start, truncate_string};
