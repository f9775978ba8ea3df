use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recall::Config;
use recall_cli::commands::{
    AdviseCommand, CommandContext, HistoryCommand, RunsCommand, ScoreCommand, StatsCommand,
};
use recall_cli::error::CliResult;
use recall_cli::output::OutputFormat;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recall-cli")]
#[command(about = "Recall CLI - inspect and annotate recorded agent runs")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(long, short = 'd', global = true, help = "Path to data directory")]
    pub data_dir: Option<PathBuf>,

    #[clap(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "List recorded runs")]
    Runs(RunsCommand),

    #[clap(about = "Show what happened some cycles back")]
    History(HistoryCommand),

    #[clap(about = "Score recent actions of a run")]
    Score(ScoreCommand),

    #[clap(about = "Store advice against the latest context of a run")]
    Advise(AdviseCommand),

    #[clap(about = "Show record counts for a run")]
    Stats(StatsCommand),
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let config = Config::load(cli.config.as_deref())?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.storage.data_dir.clone());

    let ctx = CommandContext {
        data_dir,
        config,
        format,
    };

    match &cli.command {
        Command::Runs(cmd) => cmd.execute(&ctx),
        Command::History(cmd) => cmd.execute(&ctx),
        Command::Score(cmd) => cmd.execute(&ctx),
        Command::Advise(cmd) => cmd.execute(&ctx),
        Command::Stats(cmd) => cmd.execute(&ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_score_parses() {
        let cli =
            Cli::try_parse_from(["recall-cli", "score", "--run", "7", "-5", "--last"]).unwrap();
        match cli.command {
            Command::Score(cmd) => {
                assert_eq!(cmd.score, -5);
                assert_eq!(cmd.run.run, Some(7));
                assert!(cmd.last);
                assert!(!cmd.force);
            }
            _ => panic!("expected score command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["recall-cli", "stats", "--json", "-d", "/tmp/recall"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/recall")));
    }
}
