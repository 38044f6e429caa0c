use crate::error::{Result, StatError};
use crate::model::{Attribution, AuthorKey};
use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    stat_line: Regex,
    insertions: Regex,
    deletions: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        stat_line: Regex::new(r"^\s*\d+ files? changed").expect("static regex"),
        insertions: Regex::new(r"(\d+) insertions?\(\+\)").expect("static regex"),
        deletions: Regex::new(r"(\d+) deletions?\(-\)").expect("static regex"),
    })
}

/// Where the parser stands between two lines of `git log --shortstat` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseState {
    AwaitingAuthor,
    AttributingTo(AuthorKey),
    /// The previous line was a stat line for this author. git prints the
    /// next announcement right after it, so a blank line here is an empty
    /// announcement and drops the author.
    Attributed(AuthorKey),
}

impl ParseState {
    /// Consume one line. Stat lines emit an attribution for the current
    /// author; any other non-blank line becomes the current author.
    pub fn advance(self, line: &str, line_no: usize) -> Result<(Self, Option<Attribution>)> {
        if line.trim().is_empty() {
            let next = match self {
                ParseState::Attributed(_) => ParseState::AwaitingAuthor,
                other => other,
            };
            return Ok((next, None));
        }

        if !is_stat_line(line) {
            return match AuthorKey::new(line) {
                Some(author) => Ok((ParseState::AttributingTo(author), None)),
                None => Err(malformed(line_no, "blank author", line)),
            };
        }

        match self {
            ParseState::AwaitingAuthor => Err(malformed(line_no, "no preceding author", line)),
            ParseState::AttributingTo(current) | ParseState::Attributed(current) => {
                let insertions = count(&patterns().insertions, line, line_no)?;
                let deletions = count(&patterns().deletions, line, line_no)?;
                let attribution = Attribution::new(current.clone(), insertions, deletions);
                Ok((ParseState::Attributed(current), Some(attribution)))
            }
        }
    }
}

pub fn is_stat_line(line: &str) -> bool {
    patterns().stat_line.is_match(line)
}

/// Turn the raw output of one history scan into attribution tuples, in
/// input order.
pub fn parse_log(text: &str) -> Result<Vec<Attribution>> {
    let mut attributions = Vec::new();
    text.lines()
        .enumerate()
        .try_fold(ParseState::AwaitingAuthor, |state, (idx, line)| {
            let (next, emitted) = state.advance(line, idx + 1)?;
            attributions.extend(emitted);
            Ok::<_, StatError>(next)
        })?;
    Ok(attributions)
}

// Absent clause means zero.
fn count(pattern: &Regex, line: &str, line_no: usize) -> Result<u64> {
    match pattern.captures(line) {
        Some(caps) => caps[1]
            .parse()
            .map_err(|_| malformed(line_no, "count out of range", line)),
        None => Ok(0),
    }
}

fn malformed(line: usize, reason: &'static str, content: &str) -> StatError {
    StatError::MalformedStatLine {
        line,
        reason,
        content: content.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tuple(a: &Attribution) -> (&str, u64, u64) {
        (a.author.as_str(), a.changes.insertions, a.changes.deletions)
    }

    #[test]
    fn full_stat_line_yields_one_tuple() {
        let out = parse_log("alice@x\n\n 3 files changed, 12 insertions(+), 4 deletions(-)\n").unwrap();
        assert_eq!(out.iter().map(tuple).collect::<Vec<_>>(), vec![("alice@x", 12, 4)]);
    }

    #[test]
    fn missing_clauses_default_to_zero() {
        let only_ins = parse_log("a@x\n 1 file changed, 7 insertions(+)\n").unwrap();
        assert_eq!(tuple(&only_ins[0]), ("a@x", 7, 0));

        let only_del = parse_log("a@x\n 1 file changed, 2 deletions(-)\n").unwrap();
        assert_eq!(tuple(&only_del[0]), ("a@x", 0, 2));

        let neither = parse_log("a@x\n 1 file changed\n").unwrap();
        assert_eq!(tuple(&neither[0]), ("a@x", 0, 0));
    }

    #[test]
    fn attributes_to_most_recent_author() {
        let text = "alice@x\n 1 file changed, 3 insertions(+)\n 2 file changed, 1 insertion(+), 1 deletion(-)\nbob@x\n 1 file changed, 5 insertions(+)\n";
        let out = parse_log(text).unwrap();
        assert_eq!(
            out.iter().map(tuple).collect::<Vec<_>>(),
            vec![("alice@x", 3, 0), ("alice@x", 1, 1), ("bob@x", 5, 0)]
        );
    }

    #[test]
    fn author_without_stat_line_emits_nothing() {
        let out = parse_log("merge@x\n\nalice@x\n\n 1 file changed, 1 insertion(+)\n").unwrap();
        assert_eq!(out.iter().map(tuple).collect::<Vec<_>>(), vec![("alice@x", 1, 0)]);
    }

    #[test]
    fn stat_line_before_author_is_an_error() {
        let err = parse_log("\n 1 file changed, 3 insertions(+)\nalice@x\n").unwrap_err();
        match err {
            StatError::MalformedStatLine { line, content, .. } => {
                assert_eq!(line, 2);
                assert_eq!(content, "1 file changed, 3 insertions(+)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unrelated_integers_are_not_counted() {
        let out = parse_log("dev42@x\n 10 files changed, 3 insertions(+)\n").unwrap();
        assert_eq!(tuple(&out[0]), ("dev42@x", 3, 0));
    }

    #[test]
    fn author_line_mentioning_files_is_still_an_author() {
        let out = parse_log("files changed@x\n 1 file changed, 2 insertions(+)\n").unwrap();
        assert_eq!(tuple(&out[0]), ("files changed@x", 2, 0));
    }

    #[test]
    fn crlf_output_is_tolerated() {
        let out = parse_log("a@x\r\n\r\n 1 file changed, 1 insertion(+), 9 deletions(-)\r\n").unwrap();
        assert_eq!(tuple(&out[0]), ("a@x", 1, 9));
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_log("").unwrap().is_empty());
        assert!(parse_log("\n\n").unwrap().is_empty());
    }

    #[test]
    fn overflowing_count_is_malformed() {
        let err = parse_log("a@x\n 1 file changed, 99999999999999999999999 insertions(+)\n").unwrap_err();
        assert!(matches!(err, StatError::MalformedStatLine { reason: "count out of range", .. }));
    }

    #[test]
    fn state_machine_transitions() {
        let (state, out) = ParseState::AwaitingAuthor.advance("", 1).unwrap();
        assert_eq!(state, ParseState::AwaitingAuthor);
        assert!(out.is_none());

        let (state, out) = state.advance("bob@x", 2).unwrap();
        assert_eq!(state, ParseState::AttributingTo(AuthorKey::new("bob@x").unwrap()));
        assert!(out.is_none());

        let (state, out) = state.advance(" 1 file changed, 1 deletion(-)", 3).unwrap();
        assert_eq!(tuple(&out.unwrap()), ("bob@x", 0, 1));
        assert_eq!(state, ParseState::Attributed(AuthorKey::new("bob@x").unwrap()));

        let (state, out) = state.advance("", 4).unwrap();
        assert_eq!(state, ParseState::AwaitingAuthor);
        assert!(out.is_none());
    }

    #[test]
    fn empty_announcement_after_stat_line_is_not_absorbed() {
        let text = "a@x\n\n 1 file changed, 1 insertion(+)\n\n\n 1 file changed, 3 insertions(+)\n";
        let err = parse_log(text).unwrap_err();
        match err {
            StatError::MalformedStatLine { line, reason, .. } => {
                assert_eq!(line, 6);
                assert_eq!(reason, "no preceding author");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn consecutive_commits_by_named_authors() {
        let text = "a@x\n\n 1 file changed, 1 insertion(+)\nb@x\n\n 2 files changed, 4 deletions(-)\nmerge@x\nc@x\n\n 1 file changed, 2 insertions(+)\n";
        let out = parse_log(text).unwrap();
        assert_eq!(
            out.iter().map(tuple).collect::<Vec<_>>(),
            vec![("a@x", 1, 0), ("b@x", 0, 4), ("c@x", 2, 0)]
        );
    }
}
