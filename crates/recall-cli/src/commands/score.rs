use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::commands::{CommandContext, RunArg};
use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct ScoreCommand {
    #[clap(flatten)]
    pub run: RunArg,

    #[clap(
        allow_hyphen_values = true,
        help = "Satisfaction score, clamped to the configured range"
    )]
    pub score: i64,

    #[clap(long, help = "Score only the last action")]
    pub last: bool,

    #[clap(long, help = "Overwrite actions that already carry a score")]
    pub force: bool,
}

impl ScoreCommand {
    pub fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        let scoring = &ctx.config.scoring;
        let score = self.score.clamp(scoring.min_score, scoring.max_score);
        let num_back = if self.last { 1 } else { scoring.feedback_window };

        let mut session = ctx.open_run(&self.run)?;
        let report = session.apply_scores(0, num_back, score as f64, self.force)?;

        match ctx.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "run": session.run(),
                    "score": score,
                    "scored": report
                        .actions
                        .iter()
                        .map(|(id, value)| serde_json::json!({ "id": id, "score": value }))
                        .collect::<Vec<_>>(),
                    "skipped": report.skipped,
                    "advice": report.advice,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                if report.actions.is_empty() && report.skipped.is_empty() {
                    println!("No actions in range; nothing scored");
                } else {
                    let mut table = Table::new();
                    table
                        .load_preset(UTF8_FULL_CONDENSED)
                        .set_content_arrangement(ContentArrangement::Dynamic)
                        .set_header(["Action", "Result"]);
                    for (id, value) in &report.actions {
                        table.add_row([id.to_string(), format!("{value:.2}")]);
                    }
                    for id in &report.skipped {
                        table.add_row([id.to_string(), "already scored".to_string()]);
                    }
                    println!("{table}");
                }
                if let Some(advice) = report.advice {
                    println!("Advice {advice} scored {score}");
                }
            }
        }

        Ok(())
    }
}
