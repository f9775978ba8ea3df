//! Human feedback commands
//!
//! Raw operator input is translated into one [`Feedback`] value:
//!
//! | input            | meaning                                   |
//! |------------------|-------------------------------------------|
//! | `/score N`       | score the recent window of actions        |
//! | `/score_1 N`     | score only the last action                |
//! | `/advice TEXT`   | store advice against the current context  |
//! | `/history [N]`   | show the cycle `N` steps back (default 0) |
//! | anything else    | free-form message for the agent           |
//!
//! Commands are case-insensitive and scores are clamped to [-10, 10].

use serde::Serialize;

pub const MIN_SCORE: i64 = -10;
pub const MAX_SCORE: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Feedback {
    Score(i64),
    ScoreLast(i64),
    Advice(String),
    History(usize),
    FreeForm(String),
}

impl Feedback {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let (command, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (trimmed, ""),
        };

        let parsed = match command.to_ascii_lowercase().as_str() {
            "/score" => parse_score(rest).map(Feedback::Score),
            "/score_1" => parse_score(rest).map(Feedback::ScoreLast),
            "/advice" if !rest.is_empty() => Some(Feedback::Advice(rest.to_string())),
            "/history" if rest.is_empty() => Some(Feedback::History(0)),
            "/history" => rest.parse().ok().map(Feedback::History),
            _ => None,
        };

        parsed.unwrap_or_else(|| Feedback::FreeForm(input.to_string()))
    }
}

/// Leading signed integer of `rest`, saturated then clamped
fn parse_score(rest: &str) -> Option<i64> {
    let token = rest.split_whitespace().next()?;
    let (negative, digits) = match token.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, token),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    let score = if negative { -magnitude } else { magnitude };
    Some(score.clamp(MIN_SCORE, MAX_SCORE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_commands() {
        assert_eq!(Feedback::parse("/score 7"), Feedback::Score(7));
        assert_eq!(Feedback::parse("/SCORE -3"), Feedback::Score(-3));
        assert_eq!(Feedback::parse("/score_1 4"), Feedback::ScoreLast(4));
        assert_eq!(Feedback::parse("  /Score_1   -2  "), Feedback::ScoreLast(-2));
    }

    #[test]
    fn test_scores_are_clamped() {
        assert_eq!(Feedback::parse("/score 42"), Feedback::Score(10));
        assert_eq!(Feedback::parse("/score -99"), Feedback::Score(-10));
        assert_eq!(
            Feedback::parse("/score 99999999999999999999999"),
            Feedback::Score(10)
        );
    }

    #[test]
    fn test_malformed_score_is_free_form() {
        assert_eq!(
            Feedback::parse("/score high"),
            Feedback::FreeForm("/score high".to_string())
        );
        assert_eq!(
            Feedback::parse("/score"),
            Feedback::FreeForm("/score".to_string())
        );
    }

    #[test]
    fn test_advice() {
        assert_eq!(
            Feedback::parse("/advice  check the logs first"),
            Feedback::Advice("check the logs first".to_string())
        );
        assert_eq!(
            Feedback::parse("/advice"),
            Feedback::FreeForm("/advice".to_string())
        );
    }

    #[test]
    fn test_history() {
        assert_eq!(Feedback::parse("/history"), Feedback::History(0));
        assert_eq!(Feedback::parse("/History 3"), Feedback::History(3));
        assert_eq!(
            Feedback::parse("/history back"),
            Feedback::FreeForm("/history back".to_string())
        );
    }

    #[test]
    fn test_free_form() {
        assert_eq!(
            Feedback::parse("please slow down"),
            Feedback::FreeForm("please slow down".to_string())
        );
        assert_eq!(
            Feedback::parse("/scores 3"),
            Feedback::FreeForm("/scores 3".to_string())
        );
    }
}
