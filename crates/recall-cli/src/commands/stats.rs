use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::commands::{CommandContext, RunArg};
use crate::error::CliResult;
use crate::output::{OutputFormat, format_run_start};

#[derive(Parser)]
pub struct StatsCommand {
    #[clap(flatten)]
    pub run: RunArg,
}

impl StatsCommand {
    pub fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        let session = ctx.open_run(&self.run)?;
        let stats = session.stats();

        match ctx.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            OutputFormat::Table => {
                println!("Run {} (started {})", stats.run, format_run_start(stats.run));
                println!("======================\n");

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Table", "Records"]);

                table.add_row(["Contexts", &stats.contexts.to_string()]);
                table.add_row(["Actions", &stats.actions.to_string()]);
                table.add_row(["Scored actions", &stats.scored_actions.to_string()]);
                table.add_row(["Advice", &stats.advice.to_string()]);
                table.add_row(["Helpful hints", &stats.hints.to_string()]);

                println!("{table}");
            }
        }

        Ok(())
    }
}
