//! Prompts for context diff summarization

use crate::summarizer::diff::LineDiff;

pub const DIFF_SYSTEM_PROMPT: &str = "Your task is to summarize in a few sentences the key differences \
between the current context and a previous context.";

/// User prompt listing the lines unique to each context
pub fn diff_user_prompt(diff: &LineDiff) -> String {
    let mut prompt = String::from("current context:\n");
    for line in &diff.now {
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push_str("previous context:\n");
    for line in &diff.then {
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_sections() {
        let diff = LineDiff {
            now: vec!["step: 3".to_string()],
            then: vec!["step: 1".to_string(), "done: no".to_string()],
        };
        assert_eq!(
            diff_user_prompt(&diff),
            "current context:\nstep: 3\nprevious context:\nstep: 1\ndone: no\n"
        );
    }
}
