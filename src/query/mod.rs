pub mod executor;
pub mod parser;
pub mod scorer;
pub mod topk;

pub use executor::{MatchExecutor, merge_ranked};
pub use parser::{MatchMode, Query, QueryOptions, ScoringMode, parse_query};
pub use scorer::{Candidate, MatchOutcome, Score, ScoreContext, Scorer, ScoringWeights};
pub use topk::{RankedMatch, TopKHeap};
