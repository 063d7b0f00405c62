//! # pathrank - Parallel Fuzzy Path Matcher
//!
//! pathrank ranks a list of candidate strings (usually file paths) against a
//! short fuzzy query, for editor file pickers that re-rank on every
//! keystroke.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`api`] - Editor-facing entry points and the versioned request format
//! - [`query`] - Query analysis, scoring, top-k collection and parallel execution
//! - [`highlight`] - Vim highlight patterns for matched results
//! - [`server`] - Length-prefixed JSON server over stdio
//! - [`output`] - Terminal formatting for the command-line tool
//! - [`utils`] - Path tokenization, text decoding, app data
//!
//! ## Quick Start
//!
//! ```
//! use pathrank::api::{ctrlp_match, MatchOptions};
//!
//! let items = ["src/matcher.cc", "src/str_util.cc", "README.md"];
//! let options = MatchOptions {
//!     ispath: true,
//!     ..Default::default()
//! };
//! let response = ctrlp_match(&items, "smc", &options);
//!
//! assert_eq!(response.matches[0], "src/matcher.cc");
//! assert_eq!(response.matches.len(), response.regexes.len());
//! ```
//!
//! ## Performance
//!
//! Candidates are split into contiguous ranges scanned by a per-call rayon
//! pool. Each worker keeps its own scoring scratch and a bounded top-k heap,
//! so nothing is shared or locked while scanning, and matched positions are
//! only materialized for results that can still make the final list.

pub mod api;
pub mod error;
pub mod highlight;
pub mod output;
pub mod query;
pub mod server;
pub mod utils;

pub use api::{MatchOptions, MatchRequest, MatchResponse, ctrlp_match, try_match};
pub use error::MatchError;
