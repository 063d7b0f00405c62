//! Editor-facing entry points.
//!
//! [`ctrlp_match`] is the call an editor plugin makes: it never fails, and
//! reports errors in-band as a single `"ERROR: ..."` match so the picker can
//! show them. [`try_match`] is the same call with typed errors and full
//! [`RankedMatch`] results for callers that want scores and positions.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::MatchError;
use crate::highlight::{HighlightMode, highlight_regex};
use crate::query::executor::{DEFAULT_PARALLEL_THRESHOLD, MatchExecutor};
use crate::query::parser::{MatchMode, QueryOptions, parse_query};
use crate::query::scorer::{ScoreContext, ScoringWeights};
use crate::query::topk::RankedMatch;
use crate::utils::tokenizer::PathSyntax;

/// Version of [`MatchRequest`] this build understands
pub const REQUEST_VERSION: u32 = 1;

/// Prefix of the single match returned when a call fails
pub const ERROR_MARKER: &str = "ERROR: ";

/// Options for one matching call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchOptions {
    /// Maximum number of results, 0 for all
    pub limit: usize,
    pub mmode: MatchMode,
    /// Treat candidates as paths. Off scores them as plain strings.
    pub ispath: bool,
    /// Path of the file currently open, empty for none
    pub crfile: String,
    pub highlight_mode: HighlightMode,
    /// Allow the current file to appear in results
    pub match_crfile: bool,
    /// Worker thread cap, 0 for the hardware thread count
    pub max_threads: usize,
    /// Single character separating excluded substrings, empty to disable
    pub query_inverting_delimiter: String,
    /// Text the editor draws before each line, inserted into highlight patterns
    pub regex_line_prefix: String,
    /// Compare chars with Unicode case folding instead of bytes
    pub unicode: bool,
    /// Match case-sensitively when the query contains an uppercase character.
    /// On by default; off always folds case.
    pub smart_case: bool,
    /// Candidate count below which matching stays on the calling thread
    pub parallel_threshold: usize,
    pub weights: ScoringWeights,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            limit: 0,
            mmode: MatchMode::FullLine,
            ispath: false,
            crfile: String::new(),
            highlight_mode: HighlightMode::default(),
            match_crfile: false,
            max_threads: 0,
            query_inverting_delimiter: String::new(),
            regex_line_prefix: String::new(),
            unicode: false,
            smart_case: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            weights: ScoringWeights::default(),
        }
    }
}

impl MatchOptions {
    fn query_options(&self) -> QueryOptions {
        QueryOptions {
            match_mode: self.mmode,
            ispath: self.ispath,
            unicode: self.unicode,
            smart_case: self.smart_case,
            inverting_delimiter: self.query_inverting_delimiter.clone(),
        }
    }

    fn score_context(&self) -> ScoreContext<'_> {
        ScoreContext {
            current_file: (!self.crfile.is_empty()).then_some(self.crfile.as_str()),
            match_current_file: self.match_crfile,
            syntax: PathSyntax::native(),
        }
    }
}

fn default_version() -> u32 {
    REQUEST_VERSION
}

/// A complete matching call in serialized form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchRequest {
    #[serde(default = "default_version")]
    pub version: u32,
    pub items: Vec<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub options: MatchOptions,
}

/// Matched lines in rank order and one highlight pattern per line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matches: Vec<String>,
    pub regexes: Vec<String>,
}

impl MatchResponse {
    pub fn error(err: &MatchError) -> Self {
        Self {
            matches: vec![format!("{ERROR_MARKER}{err}")],
            regexes: Vec::new(),
        }
    }

    /// Whether this response reports a failure
    pub fn is_error(&self) -> bool {
        self.regexes.is_empty() && self.matches.len() == 1 && self.matches[0].starts_with(ERROR_MARKER)
    }
}

/// Rank `items` against `query`, returning scores and matched positions
pub fn try_match<S>(items: &[S], query: &str, options: &MatchOptions) -> Result<Vec<RankedMatch>, MatchError>
where
    S: AsRef<str> + Sync,
{
    options.weights.validate()?;
    let query = parse_query(query, &options.query_options())?;
    MatchExecutor::new(&query, &options.weights, options.score_context())
        .with_limit(options.limit)
        .with_max_threads(options.max_threads)
        .with_parallel_threshold(options.parallel_threshold)
        .execute(items)
}

/// Rank `items` against `query` and build highlight patterns.
///
/// Never fails and never panics: errors come back as a single
/// `"ERROR: <message>"` match with no patterns.
pub fn ctrlp_match<S>(items: &[S], query: &str, options: &MatchOptions) -> MatchResponse
where
    S: AsRef<str> + Sync,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        try_match(items, query, options).map(|ranked| build_response(items, &ranked, options))
    }));

    let err = match outcome {
        Ok(Ok(response)) => return response,
        Ok(Err(err)) => err,
        Err(payload) => MatchError::Internal(panic_message(payload.as_ref())),
    };
    if err.is_configuration() {
        warn!(error = %err, "match rejected");
    } else {
        error!(error = %err, "match failed");
    }
    MatchResponse::error(&err)
}

/// Turn ranked results into matched lines and patterns
pub fn build_response<S: AsRef<str>>(items: &[S], ranked: &[RankedMatch], options: &MatchOptions) -> MatchResponse {
    let mut response = MatchResponse {
        matches: Vec::with_capacity(ranked.len()),
        regexes: Vec::with_capacity(ranked.len()),
    };
    for result in ranked {
        let Some(item) = items.get(result.index) else {
            continue;
        };
        let item = item.as_ref();
        response.matches.push(item.to_string());
        response.regexes.push(highlight_regex(
            options.highlight_mode,
            item,
            &result.positions,
            &options.regex_line_prefix,
        ));
    }
    response
}

/// Decode and validate a serialized request
pub fn decode_request(bytes: &[u8]) -> Result<MatchRequest, MatchError> {
    let request: MatchRequest = serde_json::from_slice(bytes).map_err(MatchError::from_decode)?;
    if request.version != REQUEST_VERSION {
        return Err(MatchError::UnsupportedVersion {
            found: request.version,
            expected: REQUEST_VERSION,
        });
    }
    Ok(request)
}

/// Run a serialized request
pub fn handle_request(bytes: &[u8]) -> MatchResponse {
    match decode_request(bytes) {
        Ok(request) => ctrlp_match(&request.items, &request.query, &request.options),
        Err(err) => {
            warn!(error = %err, "rejected request");
            MatchResponse::error(&err)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "matcher panicked".to_string()
    }
}
