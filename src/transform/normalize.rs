//! Join-key normalization
//!
//! Event logs and the song catalog spell the same artist and title with
//! stray whitespace, so both sides are normalized before comparison. The
//! same policy renders to SQL for the warehouse pipeline.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Whether letter case is significant when matching text keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseSensitivity {
    #[default]
    Sensitive,
    Insensitive,
}

/// How free-text join keys are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchPolicy {
    #[serde(default)]
    pub case: CaseSensitivity,
}

impl MatchPolicy {
    /// Trim-only matching
    pub const fn exact_case() -> Self {
        Self {
            case: CaseSensitivity::Sensitive,
        }
    }

    /// Trim and lower-case matching
    pub const fn ignore_case() -> Self {
        Self {
            case: CaseSensitivity::Insensitive,
        }
    }
}

/// Characters stripped from both ends of a key: space, then tab through
/// carriage return. Other Unicode whitespace (NBSP, ideographic space) is
/// kept, since DuckDB has no equivalent of `str::trim`.
pub const TRIMMED: [char; 6] = [' ', '\t', '\n', '\x0B', '\x0C', '\r'];

/// Strip `TRIMMED` from both ends
pub fn trim_key(text: &str) -> &str {
    text.trim_matches(&TRIMMED[..])
}

/// SQL expression that applies `trim_key` to a column
pub fn sql_trim(column: &str) -> String {
    let chars = TRIMMED
        .iter()
        .map(|c| format!("chr({})", u32::from(*c)))
        .collect::<Vec<_>>()
        .join(" || ");
    format!("trim({column}, {chars})")
}

/// Normalize a text key: trim surrounding whitespace, then fold case if the
/// policy ignores it.
pub fn normalize(text: &str, policy: MatchPolicy) -> Cow<'_, str> {
    let trimmed = trim_key(text);
    match policy.case {
        CaseSensitivity::Sensitive => Cow::Borrowed(trimmed),
        CaseSensitivity::Insensitive => Cow::Owned(trimmed.to_lowercase()),
    }
}

/// SQL expression that applies `normalize` to a column
pub fn sql_normalize(column: &str, policy: MatchPolicy) -> String {
    match policy.case {
        CaseSensitivity::Sensitive => sql_trim(column),
        CaseSensitivity::Insensitive => format!("lower({})", sql_trim(column)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("  Elena ", MatchPolicy::exact_case(), "Elena" ; "trims both ends")]
    #[test_case("Elena\t\n", MatchPolicy::exact_case(), "Elena" ; "trims tabs and newlines")]
    #[test_case("\x0BElena\x0C\r", MatchPolicy::exact_case(), "Elena" ; "trims vertical tab and form feed")]
    #[test_case("Elena\u{a0}", MatchPolicy::exact_case(), "Elena\u{a0}" ; "keeps no break space")]
    #[test_case("ELENA", MatchPolicy::exact_case(), "ELENA" ; "keeps case")]
    #[test_case(" ELENA ", MatchPolicy::ignore_case(), "elena" ; "folds case")]
    #[test_case("Des'ree", MatchPolicy::ignore_case(), "des'ree" ; "keeps punctuation")]
    #[test_case("   ", MatchPolicy::exact_case(), "" ; "blank becomes empty")]
    fn test_normalize(input: &str, policy: MatchPolicy, expected: &str) {
        assert_eq!(normalize(input, policy), expected);
    }

    #[test]
    fn test_inner_whitespace_is_significant() {
        let policy = MatchPolicy::default();
        assert_ne!(
            normalize("Setanta  matins", policy),
            normalize("Setanta matins", policy)
        );
    }

    #[test]
    fn test_sensitive_borrows() {
        assert!(matches!(
            normalize(" x ", MatchPolicy::exact_case()),
            Cow::Borrowed("x")
        ));
    }

    #[test]
    fn test_sql_normalize() {
        let trim = "trim(e.song, chr(32) || chr(9) || chr(10) || chr(11) || chr(12) || chr(13))";
        assert_eq!(sql_trim("e.song"), trim);
        assert_eq!(sql_normalize("e.song", MatchPolicy::exact_case()), trim);
        assert_eq!(
            sql_normalize("e.song", MatchPolicy::ignore_case()),
            format!("lower({trim})")
        );
    }

    #[test]
    fn test_sql_trim_covers_every_trimmed_char() {
        let sql = sql_trim("c");
        for c in TRIMMED {
            assert!(sql.contains(&format!("chr({})", u32::from(c))));
        }
    }
}
