//! Text-generation collaborator used to explain how two contexts differ
//!
//! The retrieval layer never fails because of this collaborator: every
//! error or empty reply collapses to `None` here, and the caller substitutes
//! a fixed phrase.

pub mod diff;
pub mod prompts;
pub mod provider;
pub mod remote;

pub use diff::{LineDiff, context_diff};
pub use provider::{DiffSummarizer, SummarizerError};
pub use remote::RemoteSummarizer;

use tracing::{debug, warn};

use crate::summarizer::prompts::{DIFF_SYSTEM_PROMPT, diff_user_prompt};

/// Ask `summarizer` to describe how `now` differs from `then`.
///
/// Returns `None` when the two texts have no differing lines, when the
/// collaborator fails, or when it replies with nothing.
pub async fn summarize_context_diff(
    summarizer: &dyn DiffSummarizer,
    now: &str,
    then: &str,
) -> Option<String> {
    let diff = context_diff(now, then);
    if diff.is_empty() {
        debug!("Contexts have no differing lines, skipping summarizer");
        return None;
    }

    let user_prompt = diff_user_prompt(&diff);
    match summarizer
        .summarize_diff(DIFF_SYSTEM_PROMPT, &user_prompt)
        .await
    {
        Ok(reply) if !reply.trim().is_empty() => Some(reply.trim().to_string()),
        Ok(_) => {
            warn!("Summarizer '{}' returned an empty reply", summarizer.name());
            None
        }
        Err(e) => {
            warn!("Summarizer '{}' failed: {}", summarizer.name(), e);
            None
        }
    }
}
