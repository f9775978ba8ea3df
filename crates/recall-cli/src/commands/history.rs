use clap::Parser;

use crate::commands::{CommandContext, RunArg};
use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct HistoryCommand {
    #[clap(flatten)]
    pub run: RunArg,

    #[clap(long, short, default_value = "0", help = "Cycles back from the latest context")]
    pub back: usize,
}

impl HistoryCommand {
    pub fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        let session = ctx.open_run(&self.run)?;
        let entry = session.history(self.back).ok_or_else(|| {
            format!(
                "Run {} has no context {} cycle(s) back ({} recorded)",
                session.run(),
                self.back,
                session.contexts().count()
            )
        })?;

        match ctx.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entry)?),
            OutputFormat::Table => {
                println!("Run {} / context {}", session.run(), entry.context_id);
                println!("==============================\n");
                println!("{entry}");
            }
        }

        Ok(())
    }
}
