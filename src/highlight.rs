//! Vim highlight patterns for matched results.
//!
//! Each result gets one pattern anchored to the whole line, so the editor can
//! highlight exactly the characters that matched. Patterns use very-nomagic
//! (`\V`) and match case (`\C`), which leaves backslash as the only character
//! that needs escaping in literal text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::utils::encoding::{ceil_char_boundary, floor_char_boundary};
use crate::utils::tokenizer::Span;

/// How much of a match the pattern highlights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HighlightMode {
    /// No highlighting, every pattern is empty
    #[serde(alias = "")]
    None,
    /// One span from the first to the last matched character
    Basic,
    /// Every contiguous run of matched characters on its own
    #[default]
    #[serde(alias = "detailed")]
    Full,
}

impl HighlightMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HighlightMode::None => "none",
            HighlightMode::Basic => "basic",
            HighlightMode::Full => "full",
        }
    }
}

impl fmt::Display for HighlightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HighlightMode {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(HighlightMode::None),
            "basic" => Ok(HighlightMode::Basic),
            "full" | "detailed" => Ok(HighlightMode::Full),
            other => Err(MatchError::UnknownMode {
                kind: "highlight mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Build the highlight pattern for one result.
///
/// `positions` are sorted byte offsets into `item`; offsets inside a
/// multi-byte character highlight the whole character. Returns an empty
/// string when there is nothing to highlight.
pub fn highlight_regex(mode: HighlightMode, item: &str, positions: &[usize], line_prefix: &str) -> String {
    if mode == HighlightMode::None {
        return String::new();
    }
    let runs = matched_runs(item, positions);
    let (Some(first), Some(last)) = (runs.first(), runs.last()) else {
        return String::new();
    };

    let mut pattern = String::with_capacity(item.len() * 2 + line_prefix.len() + 16);
    pattern.push_str(r"\V\C");

    match mode {
        HighlightMode::Basic => {
            pattern.push_str(r"\^");
            push_literal(&mut pattern, line_prefix);
            push_literal(&mut pattern, &item[..first.start]);
            pattern.push_str(r"\zs");
            push_literal(&mut pattern, &item[first.start..last.end]);
            pattern.push_str(r"\ze");
            push_literal(&mut pattern, &item[last.end..]);
            pattern.push_str(r"\$");
        }
        HighlightMode::Full => {
            for (i, run) in runs.iter().enumerate() {
                if i > 0 {
                    pattern.push_str(r"\|");
                }
                pattern.push_str(r"\%(\^");
                push_literal(&mut pattern, line_prefix);
                push_literal(&mut pattern, &item[..run.start]);
                pattern.push_str(r"\)\@<=");
                push_literal(&mut pattern, &item[run.start..run.end]);
                pattern.push_str(r"\%(");
                push_literal(&mut pattern, &item[run.end..]);
                pattern.push_str(r"\$\)\@=");
            }
        }
        HighlightMode::None => {}
    }
    pattern
}

/// Contiguous runs of matched characters, snapped to char boundaries
pub fn matched_runs(item: &str, positions: &[usize]) -> Vec<Span> {
    let mut runs: Vec<Span> = Vec::new();
    for &pos in positions {
        if pos >= item.len() {
            continue;
        }
        let start = floor_char_boundary(item, pos);
        let end = ceil_char_boundary(item, start + 1);
        match runs.last_mut() {
            Some(run) if start <= run.end => run.end = run.end.max(end),
            _ => runs.push(Span::new(start, end)),
        }
    }
    runs
}

fn push_literal(pattern: &mut String, text: &str) {
    for ch in text.chars() {
        if ch == '\\' {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let pattern = highlight_regex(HighlightMode::Basic, "src/foo.rs", &[4, 5, 6], "");
        assert_eq!(pattern, r"\V\C\^src/\zsfoo\ze.rs\$");
    }

    #[test]
    fn test_basic_spans_gaps() {
        let pattern = highlight_regex(HighlightMode::Basic, "src/foo.rs", &[0, 8], "");
        assert_eq!(pattern, r"\V\C\^\zssrc/foo.r\zes\$");
    }

    #[test]
    fn test_full() {
        let pattern = highlight_regex(HighlightMode::Full, "ab/cd", &[0, 3], "");
        assert_eq!(
            pattern,
            r"\V\C\%(\^\)\@<=a\%(b/cd\$\)\@=\|\%(\^ab/\)\@<=c\%(d\$\)\@="
        );
    }

    #[test]
    fn test_full_merges_adjacent() {
        let pattern = highlight_regex(HighlightMode::Full, "abc", &[0, 1], "");
        assert_eq!(pattern, r"\V\C\%(\^\)\@<=ab\%(c\$\)\@=");
    }

    #[test]
    fn test_line_prefix() {
        let pattern = highlight_regex(HighlightMode::Basic, "ab", &[1], "> ");
        assert_eq!(pattern, r"\V\C\^> a\zsb\ze\$");
    }

    #[test]
    fn test_backslashes_escaped() {
        let pattern = highlight_regex(HighlightMode::Basic, r"a\b", &[2], "");
        assert_eq!(pattern, r"\V\C\^a\\\zsb\ze\$");
    }

    #[test]
    fn test_multibyte_snapped() {
        // Offset 2 is inside 'é'
        let runs = matched_runs("aéb", &[2]);
        assert_eq!(runs, vec![Span::new(1, 3)]);
        let runs = matched_runs("aéb", &[1, 2, 3]);
        assert_eq!(runs, vec![Span::new(1, 4)]);
    }

    #[test]
    fn test_empty_positions_and_none_mode() {
        assert_eq!(highlight_regex(HighlightMode::Full, "abc", &[], ""), "");
        assert_eq!(highlight_regex(HighlightMode::None, "abc", &[0], ""), "");
        assert_eq!(highlight_regex(HighlightMode::Basic, "abc", &[7], ""), "");
    }

    #[test]
    fn test_mode_names() {
        assert_eq!("detailed".parse::<HighlightMode>().unwrap(), HighlightMode::Full);
        assert_eq!("".parse::<HighlightMode>().unwrap(), HighlightMode::None);
        assert!("loud".parse::<HighlightMode>().is_err());
        let mode: HighlightMode = serde_json::from_str("\"detailed\"").unwrap();
        assert_eq!(mode, HighlightMode::Full);
    }
}
