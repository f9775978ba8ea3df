//! Hint templates handed to the agent's next prompt

/// Used in place of a diff summary when none could be produced
pub const DIFF_FALLBACK: &str = "in a different context.";

const ADVICE_REMINDER: &str = "The following advice was given to me by my user in a different context.\n\
I should try and follow my user's advice but realize that it may have been given in a different context.\n\
I must make sure I use the response format specified above.";

const ACTION_REMINDER: &str = "I should consider making a similar response but adapt it to the task at hand.\n\
I must make sure I use the response format specified above.";

pub fn advice_hint(advice: &str) -> String {
    format!(
        "Here is an example of advice that my user sent to me in the past:\n{advice}\n\
{ADVICE_REMINDER}"
    )
}

/// Phrase describing where a past action succeeded
pub fn diff_phrase(summary: Option<&str>) -> String {
    match summary {
        Some(summary) => format!("in a context differing as follows: {summary}"),
        None => DIFF_FALLBACK.to_string(),
    }
}

pub fn action_hint(action: &str, diff_phrase: &str) -> String {
    format!(
        "Here is an example of a successful response that I made in the past:\n{action}\n\
This past response was successful {diff_phrase}\n{ACTION_REMINDER}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_phrase_fallback() {
        assert_eq!(diff_phrase(None), "in a different context.");
        assert_eq!(
            diff_phrase(Some("the step changed")),
            "in a context differing as follows: the step changed"
        );
    }

    #[test]
    fn test_hints_embed_their_payload() {
        let hint = advice_hint("check the file first");
        assert!(hint.contains("\ncheck the file first\n"));
        assert!(hint.contains("different context"));

        let hint = action_hint("{\"command\":\"read\"}", DIFF_FALLBACK);
        assert!(hint.contains("{\"command\":\"read\"}"));
        assert!(hint.contains("This past response was successful in a different context."));
    }
}
