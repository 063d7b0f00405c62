use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::MatchError;
use crate::utils::encoding::{TextMode, Unit};
use crate::utils::tokenizer::Span;

/// Which part of each candidate line is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// The whole line
    #[default]
    #[serde(alias = "")]
    FullLine,
    /// Only the last path component
    FilenameOnly,
    /// Text before the first tab
    FirstNonTab,
    /// Text before the last tab
    UntilLastTab,
    /// Regex matching. Recognized so that callers get a clear error.
    Regex,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::FullLine => "full-line",
            MatchMode::FilenameOnly => "filename-only",
            MatchMode::FirstNonTab => "first-non-tab",
            MatchMode::UntilLastTab => "until-last-tab",
            MatchMode::Regex => "regex",
        }
    }

    /// Byte span of `line` that forms the match key
    pub fn match_key(self, line: &str) -> Span {
        let end = match self {
            MatchMode::FirstNonTab => memchr::memchr(b'\t', line.as_bytes()).unwrap_or(line.len()),
            MatchMode::UntilLastTab => memchr::memrchr(b'\t', line.as_bytes()).unwrap_or(line.len()),
            MatchMode::FullLine | MatchMode::FilenameOnly | MatchMode::Regex => line.len(),
        };
        Span::new(0, end)
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "full-line" => Ok(MatchMode::FullLine),
            "filename-only" => Ok(MatchMode::FilenameOnly),
            "first-non-tab" => Ok(MatchMode::FirstNonTab),
            "until-last-tab" => Ok(MatchMode::UntilLastTab),
            "regex" => Ok(MatchMode::Regex),
            other => Err(MatchError::UnknownMode {
                kind: "match mode",
                value: other.to_string(),
            }),
        }
    }
}

/// How the scorer treats the match key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// Plain string, no notion of path components
    Full,
    /// Path with component and filename awareness
    PathSegment,
    /// Only the filename component is matched
    FilenameOnly,
}

impl ScoringMode {
    pub fn is_path_aware(self) -> bool {
        !matches!(self, ScoringMode::Full)
    }
}

/// Inputs to query analysis
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub match_mode: MatchMode,
    pub ispath: bool,
    pub unicode: bool,
    pub smart_case: bool,
    /// Single character separating the positive text from excluded substrings.
    /// Empty disables exclusion.
    pub inverting_delimiter: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            ispath: false,
            unicode: false,
            smart_case: true,
            inverting_delimiter: String::new(),
        }
    }
}

/// Parsed query representation
#[derive(Debug, Clone)]
pub struct Query {
    /// Text to fuzzy match, as typed
    pub text: String,
    /// Substrings a candidate must not contain
    pub excluded: Vec<String>,
    pub match_mode: MatchMode,
    pub scoring_mode: ScoringMode,
    pub text_mode: TextMode,
    pub case_sensitive: bool,
    units: Vec<Unit>,
}

impl Query {
    /// Decoded positive text; `folded` is already case folded
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// True when the positive text is empty. An empty query still applies
    /// exclusions.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn is_path_aware(&self) -> bool {
        self.scoring_mode.is_path_aware()
    }
}

/// Parse a raw query string.
///
/// Only a `regex` match mode is rejected; a malformed delimiter degrades to
/// treating the whole input as positive text.
pub fn parse_query(raw: &str, options: &QueryOptions) -> Result<Query, MatchError> {
    let scoring_mode = match (options.match_mode, options.ispath) {
        (MatchMode::Regex, _) => return Err(MatchError::UnsupportedMode(MatchMode::Regex.to_string())),
        (MatchMode::FilenameOnly, _) => ScoringMode::FilenameOnly,
        (_, true) => ScoringMode::PathSegment,
        (_, false) => ScoringMode::Full,
    };

    let (text, excluded) = split_inverted(raw, &options.inverting_delimiter);
    let text_mode = TextMode::from_unicode_flag(options.unicode);
    let units = text_mode.decode(&text);
    let case_sensitive = options.smart_case && units.iter().any(|u| text_mode.is_uppercase(u.ch));

    Ok(Query {
        text,
        excluded,
        match_mode: options.match_mode,
        scoring_mode,
        text_mode,
        case_sensitive,
        units,
    })
}

fn split_inverted(raw: &str, delimiter: &str) -> (String, Vec<String>) {
    let mut chars = delimiter.chars();
    let delim = match (chars.next(), chars.next()) {
        (None, _) => return (raw.to_string(), Vec::new()),
        (Some(c), None) => c,
        (Some(_), Some(_)) => {
            warn!(delimiter, "query inverting delimiter must be a single character; ignoring it");
            return (raw.to_string(), Vec::new());
        }
    };

    let mut segments = raw.split(delim);
    let text = segments.next().unwrap_or_default().to_string();
    let excluded = segments
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (text, excluded)
}
