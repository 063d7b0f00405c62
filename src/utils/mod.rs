//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`app_data`] - Command-line defaults in the platform data directory
//! - [`encoding`] - Decoding strings into matchable units (bytes or chars)
//! - [`tokenizer`] - Path components and character boundaries
//!
//! ## Key Functions
//!
//! ```
//! use pathrank::utils::{tokenize_path, PathSyntax};
//!
//! let path = "src/query/scorer.rs";
//! let tokens = tokenize_path(path, PathSyntax::UNIX);
//! assert_eq!(tokens.filename().map(|s| s.slice(path)), Some("scorer.rs"));
//! ```

pub mod app_data;
pub mod encoding;
pub mod tokenizer;

pub use app_data::*;
pub use encoding::*;
pub use tokenizer::*;
