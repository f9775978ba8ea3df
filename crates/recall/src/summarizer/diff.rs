//! Line diff between the current context and a past one

use similar::{ChangeTag, TextDiff};

/// Lines present on only one side of a two-way line diff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDiff {
    /// Lines only in the current context
    pub now: Vec<String>,
    /// Lines only in the past context
    pub then: Vec<String>,
}

impl LineDiff {
    pub fn is_empty(&self) -> bool {
        self.now.is_empty() && self.then.is_empty()
    }
}

/// Diff `now` against `then` line by line, keeping removed and inserted
/// lines and dropping everything the two share
pub fn context_diff(now: &str, then: &str) -> LineDiff {
    let diff = TextDiff::from_lines(now, then);
    let mut out = LineDiff::default();

    for change in diff.iter_all_changes() {
        let line = change.value().trim_end_matches(['\r', '\n']);
        match change.tag() {
            ChangeTag::Delete => out.now.push(line.to_string()),
            ChangeTag::Insert => out.then.push(line.to_string()),
            ChangeTag::Equal => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_have_empty_diff() {
        assert!(context_diff("a\nb\nc", "a\nb\nc").is_empty());
        assert!(context_diff("", "").is_empty());
    }

    #[test]
    fn test_only_changed_lines_are_kept() {
        let now = "goal: write report\nstep: 3\nfiles: a.txt\n";
        let then = "goal: write report\nstep: 1\nfiles: a.txt\n";
        let diff = context_diff(now, then);
        assert_eq!(diff.now, vec!["step: 3"]);
        assert_eq!(diff.then, vec!["step: 1"]);
    }

    #[test]
    fn test_one_sided_additions() {
        let diff = context_diff("a\nb\n", "a\nb\nextra\n");
        assert!(diff.now.is_empty());
        assert_eq!(diff.then, vec!["extra"]);
    }

    #[test]
    fn test_dash_prefixed_lines_survive() {
        let diff = context_diff("- item one\n", "+ item two\n");
        assert_eq!(diff.now, vec!["- item one"]);
        assert_eq!(diff.then, vec!["+ item two"]);
    }
}
