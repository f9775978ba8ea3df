use clap::Parser;
use recall::memory::USER_ADVICE_SOURCE;

use crate::commands::{CommandContext, RunArg};
use crate::error::CliResult;
use crate::output::{OutputFormat, truncate_string};

#[derive(Parser)]
pub struct AdviseCommand {
    #[clap(flatten)]
    pub run: RunArg,

    #[clap(help = "Advice text for the agent")]
    pub text: String,
}

impl AdviseCommand {
    pub fn execute(&self, ctx: &CommandContext) -> CliResult<()> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err("Advice text cannot be empty".into());
        }

        let mut session = ctx.open_run(&self.run)?;
        let id = session.store_advice(text, USER_ADVICE_SOURCE)?;

        match ctx.format {
            OutputFormat::Json => {
                let output = serde_json::json!({ "id": id, "advice": text });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Stored advice {id}: {}", truncate_string(text, 60));
            }
        }

        Ok(())
    }
}
