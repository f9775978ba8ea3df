use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use recall::memory::MemorySession;

use crate::commands::CommandContext;
use crate::error::CliResult;
use crate::output::{OutputFormat, format_run_start};

#[derive(Parser)]
pub struct RunsCommand {
    #[clap(long, short, default_value = "20", help = "Maximum number of runs to display")]
    pub limit: usize,
}

impl RunsCommand {
    pub fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        let runs = ctx.runs()?;
        let skip = runs.len().saturating_sub(self.limit);

        let mut stats = Vec::new();
        for run in runs.into_iter().skip(skip).rev() {
            stats.push(MemorySession::open(&ctx.data_dir, run)?.stats());
        }

        match ctx.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            OutputFormat::Table => {
                if stats.is_empty() {
                    println!("No runs found in {}", ctx.data_dir.display());
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header([
                        "Run", "Started", "Contexts", "Actions", "Scored", "Advice", "Hints",
                    ]);

                for s in &stats {
                    table.add_row([
                        s.run.to_string(),
                        format_run_start(s.run),
                        s.contexts.to_string(),
                        s.actions.to_string(),
                        s.scored_actions.to_string(),
                        s.advice.to_string(),
                        s.hints.to_string(),
                    ]);
                }

                println!("{table}");
                println!("\nShowing {} run(s)", stats.len());
            }
        }

        Ok(())
    }
}
