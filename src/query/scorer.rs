//! Fuzzy scoring of a single candidate
//!
//! A candidate matches when the query is a subsequence of its match key under
//! the active case fold. Among all alignments the scorer picks the one with
//! the highest additive score:
//! - a base score per matched character
//! - a bonus for consecutive matches
//! - boundary bonuses (path component start, word start, camelCase hump)
//! - a filename bonus in path-aware mode
//! - a bonus when the case matches exactly
//! - gap penalties (open + extend) between matches, plus a penalty when a gap
//!   crosses a path separator
//!
//! The alignment is found with a dynamic program bounded by greedy forward and
//! backward scans. The raw score is then scaled by how much of the key was left
//! unmatched, and the current-file adjustments are applied: a penalty for
//! directory distance and a bonus for leading filename words shared with the
//! current file.

use std::cell::OnceCell;

use memchr::memmem;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::query::parser::{MatchMode, Query, ScoringMode};
use crate::utils::encoding::{TextMode, Unit};
use crate::utils::tokenizer::{
    Boundary, CharClass, PathSyntax, PathTokens, Span, boundary, classify_char, directory_distance,
    tokenize_path,
};

/// Final candidate score. Higher is better.
pub type Score = i64;

/// Above this many DP cells a candidate is scored with the greedy alignment
pub const MAX_DP_CELLS: usize = 1 << 20;

const NEG: i32 = i32::MIN / 2;
const NO_PREV: u32 = u32::MAX;

/// Configurable weights for scoring factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringWeights {
    /// Score for each matched character
    pub match_base: i32,
    /// Bonus when a match directly follows the previous one
    pub consecutive_bonus: i32,
    /// Bonus for matching the first character of a path component
    pub component_start_bonus: i32,
    /// Bonus for matching the first character after punctuation
    pub word_start_bonus: i32,
    /// Bonus for matching an uppercase letter after a lowercase one
    pub camel_case_bonus: i32,
    /// Bonus for matches inside the filename (path-aware mode)
    pub filename_bonus: i32,
    /// Bonus when the query character has the same case as the candidate's
    pub exact_case_bonus: i32,
    /// Penalty for starting a gap between two matches
    pub gap_open_penalty: i32,
    /// Penalty for each further skipped character
    pub gap_extend_penalty: i32,
    /// Penalty for a gap that crosses a path separator
    pub component_gap_penalty: i32,
    /// Unmatched characters at which the length scaling halves a score
    pub length_scale: i64,
    /// Subtracted from the current file's score
    pub current_file_penalty: i64,
    /// Subtracted per directory step away from the current file
    pub proximity_penalty: i64,
    /// Directory steps beyond this count are not penalized further
    pub max_proximity_distance: usize,
    /// Added per leading filename word shared with the current file
    pub shared_word_bonus: i64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            match_base: 16,
            consecutive_bonus: 10,
            component_start_bonus: 16,
            word_start_bonus: 14,
            camel_case_bonus: 14,
            filename_bonus: 10,
            exact_case_bonus: 1,
            gap_open_penalty: 4,
            gap_extend_penalty: 1,
            component_gap_penalty: 4,
            length_scale: 128,
            current_file_penalty: 5000,
            proximity_penalty: 200,
            max_proximity_distance: 16,
            shared_word_bonus: 800,
        }
    }
}

/// Largest accepted per-character weight
const MAX_CHAR_WEIGHT: i32 = 1 << 12;
/// Largest accepted per-candidate adjustment
const MAX_ADJUSTMENT: i64 = 1 << 32;

impl ScoringWeights {
    /// Reject weights that are negative or large enough to overflow scoring
    pub fn validate(&self) -> Result<(), MatchError> {
        let per_char = [
            ("match_base", self.match_base),
            ("consecutive_bonus", self.consecutive_bonus),
            ("component_start_bonus", self.component_start_bonus),
            ("word_start_bonus", self.word_start_bonus),
            ("camel_case_bonus", self.camel_case_bonus),
            ("filename_bonus", self.filename_bonus),
            ("exact_case_bonus", self.exact_case_bonus),
            ("gap_open_penalty", self.gap_open_penalty),
            ("gap_extend_penalty", self.gap_extend_penalty),
            ("component_gap_penalty", self.component_gap_penalty),
        ];
        for (name, value) in per_char {
            check_range(name, i64::from(value), 0, i64::from(MAX_CHAR_WEIGHT))?;
        }

        check_range("length_scale", self.length_scale, 1, 1 << 20)?;
        check_range("current_file_penalty", self.current_file_penalty, 0, MAX_ADJUSTMENT)?;
        check_range("proximity_penalty", self.proximity_penalty, 0, MAX_ADJUSTMENT)?;
        check_range("shared_word_bonus", self.shared_word_bonus, 0, MAX_ADJUSTMENT)?;
        if self.max_proximity_distance > 1 << 16 {
            return Err(MatchError::InvalidRequest(format!(
                "weight max_proximity_distance must be at most {}, got {}",
                1 << 16,
                self.max_proximity_distance
            )));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: i64, min: i64, max: i64) -> Result<(), MatchError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(MatchError::InvalidRequest(format!(
            "weight {name} must be within {min}..={max}, got {value}"
        )))
    }
}

/// Per-call context shared by every candidate
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreContext<'a> {
    /// Path of the file open in the editor, if any
    pub current_file: Option<&'a str>,
    /// Whether the current file may appear in results at all
    pub match_current_file: bool,
    pub syntax: PathSyntax,
}

/// A candidate line, borrowed from the caller's list
#[derive(Debug)]
pub struct Candidate<'a> {
    pub index: usize,
    pub text: &'a str,
    key: Span,
    syntax: PathSyntax,
    tokens: OnceCell<PathTokens>,
}

impl<'a> Candidate<'a> {
    pub fn new(index: usize, text: &'a str, mode: MatchMode, syntax: PathSyntax) -> Self {
        Self {
            index,
            text,
            key: mode.match_key(text),
            syntax,
            tokens: OnceCell::new(),
        }
    }

    /// Byte span of the text that is matched against
    pub fn key_span(&self) -> Span {
        self.key
    }

    pub fn key(&self) -> &'a str {
        self.key.slice(self.text)
    }

    /// Path components of the match key, relative to the key start.
    /// Computed on first use.
    pub fn tokens(&self) -> &PathTokens {
        self.tokens.get_or_init(|| tokenize_path(self.key(), self.syntax))
    }
}

/// Score and matched byte offsets of a successful match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub score: Score,
    pub positions: Vec<usize>,
}

/// Scores candidates against one query.
///
/// Holds reusable scratch buffers, so one scorer is created per worker and
/// fed candidates one at a time.
pub struct Scorer<'q> {
    query: &'q Query,
    weights: &'q ScoringWeights,
    context: ScoreContext<'q>,
    excluded: Vec<memmem::Finder<'q>>,
    current_dirs: Vec<&'q str>,
    current_name: &'q str,
    current_word_ends: Vec<usize>,
    units: Vec<Unit>,
    bonus: Vec<i32>,
    separator: Vec<bool>,
    first: Vec<usize>,
    last: Vec<usize>,
    table: Vec<i32>,
    back: Vec<u32>,
    path: Vec<usize>,
}

impl<'q> Scorer<'q> {
    pub fn new(query: &'q Query, weights: &'q ScoringWeights, context: ScoreContext<'q>) -> Self {
        let excluded = query
            .excluded
            .iter()
            .map(|s| memmem::Finder::new(s.as_bytes()))
            .collect();

        let (current_dirs, current_name) = match context.current_file {
            Some(current) => {
                let tokens = tokenize_path(current, context.syntax);
                let dirs = tokens.directories().iter().map(|span| span.slice(current)).collect();
                let name = tokens.filename().map_or("", |span| span.slice(current));
                (dirs, name)
            }
            None => (Vec::new(), ""),
        };
        let current_word_ends = stem_word_ends(current_name, query.text_mode);

        Self {
            query,
            weights,
            context,
            excluded,
            current_dirs,
            current_name,
            current_word_ends,
            units: Vec::new(),
            bonus: Vec::new(),
            separator: Vec::new(),
            first: Vec::new(),
            last: Vec::new(),
            table: Vec::new(),
            back: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Score a candidate, or `None` if it does not match.
    ///
    /// The chosen alignment is kept until the next call so that
    /// [`Scorer::match_positions`] can materialize it on demand.
    pub fn score(&mut self, candidate: &Candidate<'_>) -> Option<Score> {
        self.path.clear();

        let text = candidate.text.as_bytes();
        if self.excluded.iter().any(|f| f.find(text).is_some()) {
            return None;
        }

        let is_current = self.context.current_file == Some(candidate.text);
        if is_current && !self.context.match_current_file {
            return None;
        }

        let mut score = if self.query.is_empty() {
            0
        } else {
            let window = self.window(candidate)?;
            self.prepare(candidate, window);
            let raw = self.align()?;

            let weights = self.weights;
            let unmatched = (self.units.len() - self.query.units().len()) as i64;
            let scale = weights.length_scale.max(1);
            let raw = i64::from(raw.max(1));
            (raw.saturating_mul(1000).saturating_mul(scale) / scale.saturating_add(unmatched))
                .saturating_sub(self.proximity_penalty(candidate))
                .saturating_add(self.shared_word_bonus(candidate))
        };

        if is_current {
            score = score.saturating_sub(self.weights.current_file_penalty);
        }
        Some(score)
    }

    /// Append the byte offsets matched by the last successful [`Scorer::score`]
    pub fn match_positions(&self, out: &mut Vec<usize>) {
        out.extend(self.path.iter().map(|&j| self.units[j].offset));
    }

    /// Score a candidate and materialize its positions
    pub fn evaluate(&mut self, candidate: &Candidate<'_>) -> Option<MatchOutcome> {
        let score = self.score(candidate)?;
        let mut positions = Vec::with_capacity(self.path.len());
        self.match_positions(&mut positions);
        Some(MatchOutcome { score, positions })
    }

    /// Part of the key that query characters may land on, relative to the key
    fn window(&self, candidate: &Candidate<'_>) -> Option<Span> {
        match self.query.scoring_mode {
            ScoringMode::FilenameOnly => candidate.tokens().filename(),
            ScoringMode::Full | ScoringMode::PathSegment => Some(Span::new(0, candidate.key_span().len())),
        }
    }

    /// Decode the window and compute the per-unit bonuses
    fn prepare(&mut self, candidate: &Candidate<'_>, window: Span) {
        let weights = self.weights;
        let mode = self.query.text_mode;
        let key = candidate.key();
        let key_start = candidate.key_span().start;
        let syntax = self
            .query
            .is_path_aware()
            .then_some(self.context.syntax);

        mode.decode_into(window.slice(key), key_start + window.start, &mut self.units);

        let filename = match self.query.scoring_mode {
            ScoringMode::PathSegment => candidate.tokens().filename().map(|s| s.shifted(key_start)),
            _ => None,
        };

        // A filename window always follows a separator
        let mut prev = window
            .start
            .checked_sub(1)
            .and_then(|i| key.as_bytes().get(i))
            .map(|&b| classify_char(b as char, mode, syntax));

        self.bonus.clear();
        self.separator.clear();
        for unit in &self.units {
            let class = classify_char(unit.ch, mode, syntax);
            self.separator.push(class == CharClass::Separator);
            let mut bonus = match boundary(prev, class) {
                Boundary::Component if syntax.is_some() => weights.component_start_bonus,
                Boundary::Component | Boundary::Word => weights.word_start_bonus,
                Boundary::CamelHump => weights.camel_case_bonus,
                Boundary::None => 0,
            };
            if filename.is_some_and(|f| f.contains(unit.offset)) {
                bonus += weights.filename_bonus;
            }
            self.bonus.push(bonus);
            prev = Some(class);
        }
    }

    /// Find the best alignment of the query in `self.units`.
    /// Leaves it in `self.path` and returns its raw score.
    fn align(&mut self) -> Option<i32> {
        let query = self.query.units();
        let case_sensitive = self.query.case_sensitive;
        let m = query.len();
        let n = self.units.len();
        if n < m {
            return None;
        }

        // Earliest feasible position of each query unit
        self.first.clear();
        let mut j = 0;
        for q in query {
            while j < n && !unit_matches(q, &self.units[j], case_sensitive) {
                j += 1;
            }
            if j == n {
                return None;
            }
            self.first.push(j);
            j += 1;
        }

        // Latest feasible position of each query unit
        self.last.clear();
        self.last.resize(m, 0);
        let mut end = n;
        for (i, q) in query.iter().enumerate().rev() {
            end = (0..end)
                .rev()
                .find(|&k| unit_matches(q, &self.units[k], case_sensitive))?;
            self.last[i] = end;
        }

        let width = self.last[m - 1] - self.first[0] + 1;
        if m.saturating_mul(width) > MAX_DP_CELLS {
            return Some(self.align_greedy());
        }
        Some(self.align_dp(width))
    }

    fn align_dp(&mut self, width: usize) -> i32 {
        let weights = self.weights;
        let query = self.query.units();
        let case_sensitive = self.query.case_sensitive;
        let m = query.len();
        let origin = self.first[0];
        let at = move |i: usize, j: usize| i * width + (j - origin);

        self.table.clear();
        self.table.resize(m * width, NEG);
        self.back.clear();
        self.back.resize(m * width, NO_PREV);

        for j in self.first[0]..=self.last[0] {
            let unit = &self.units[j];
            if unit_matches(&query[0], unit, case_sensitive) {
                self.table[at(0, j)] = match_score(weights, &query[0], unit, self.bonus[j]);
            }
        }

        for i in 1..m {
            let q = &query[i];
            // Best score of a match in row i-1 that leaves a gap before j
            let mut gap_best = NEG;
            let mut gap_from = NO_PREV;

            for j in self.first[i - 1] + 1..=self.last[i] {
                if j >= self.first[i - 1] + 2 {
                    let k = j - 2;
                    let opened = self.table[at(i - 1, k)];
                    let opened = if opened > NEG { opened.saturating_sub(weights.gap_open_penalty) } else { NEG };
                    let extended = if gap_best > NEG {
                        gap_best.saturating_sub(weights.gap_extend_penalty)
                    } else {
                        NEG
                    };
                    if opened > NEG && opened >= extended {
                        gap_best = opened;
                        gap_from = k as u32;
                    } else {
                        gap_best = extended;
                    }
                    // Every gap still open here skips the separator at j-1
                    if self.separator[j - 1] && gap_best > NEG {
                        gap_best = gap_best.saturating_sub(weights.component_gap_penalty);
                    }
                }

                if j < self.first[i] || !unit_matches(q, &self.units[j], case_sensitive) {
                    continue;
                }

                let diag = self.table[at(i - 1, j - 1)];
                let diag = if diag > NEG { diag.saturating_add(weights.consecutive_bonus) } else { NEG };
                let (best, from) = if diag >= gap_best {
                    (diag, (j - 1) as u32)
                } else {
                    (gap_best, gap_from)
                };
                if best <= NEG {
                    continue;
                }

                self.table[at(i, j)] = best.saturating_add(match_score(weights, q, &self.units[j], self.bonus[j]));
                self.back[at(i, j)] = from;
            }
        }

        let mut best = NEG;
        let mut end = self.first[m - 1];
        for j in self.first[m - 1]..=self.last[m - 1] {
            let value = self.table[at(m - 1, j)];
            if value > best {
                best = value;
                end = j;
            }
        }

        self.path.clear();
        self.path.resize(m, 0);
        let mut j = end;
        for i in (0..m).rev() {
            self.path[i] = j;
            if i > 0 {
                j = self.back[at(i, j)] as usize;
            }
        }
        best
    }

    /// Leftmost match end, then the tightest start reaching it
    fn align_greedy(&mut self) -> i32 {
        let query = self.query.units();
        let case_sensitive = self.query.case_sensitive;
        let m = query.len();

        self.path.clear();
        self.path.resize(m, 0);
        let mut end = self.first[m - 1] + 1;
        for i in (0..m).rev() {
            end = (0..end)
                .rev()
                .find(|&k| unit_matches(&query[i], &self.units[k], case_sensitive))
                .unwrap_or(self.first[i]);
            self.path[i] = end;
        }
        self.path_score()
    }

    /// Raw score of the alignment in `self.path`
    fn path_score(&self) -> i32 {
        let weights = self.weights;
        let query = self.query.units();
        let mut total = 0i32;
        for (i, &j) in self.path.iter().enumerate() {
            total = total.saturating_add(match_score(weights, &query[i], &self.units[j], self.bonus[j]));
            if i > 0 {
                let prev = self.path[i - 1];
                let gap = j - prev - 1;
                total = if gap == 0 {
                    total.saturating_add(weights.consecutive_bonus)
                } else {
                    let extend = i32::try_from(gap - 1).unwrap_or(i32::MAX);
                    let crossing = if self.separator[prev + 1..j].contains(&true) {
                        weights.component_gap_penalty
                    } else {
                        0
                    };
                    total
                        .saturating_sub(weights.gap_open_penalty)
                        .saturating_sub(extend.saturating_mul(weights.gap_extend_penalty))
                        .saturating_sub(crossing)
                };
            }
        }
        total
    }

    fn proximity_penalty(&self, candidate: &Candidate<'_>) -> Score {
        if self.context.current_file.is_none() || self.query.scoring_mode != ScoringMode::PathSegment {
            return 0;
        }
        let key = candidate.key();
        let distance = directory_distance(
            candidate.tokens().directories().iter().map(|s| s.slice(key)),
            self.current_dirs.iter().copied(),
        );
        (distance.min(self.weights.max_proximity_distance) as Score).saturating_mul(self.weights.proximity_penalty)
    }

    fn shared_word_bonus(&self, candidate: &Candidate<'_>) -> Score {
        if self.current_word_ends.is_empty() || self.query.scoring_mode != ScoringMode::PathSegment {
            return 0;
        }
        let name = candidate.tokens().filename().map_or("", |span| span.slice(candidate.key()));
        let shared = shared_leading_words(name, self.current_name, &self.current_word_ends, self.query.text_mode);
        (shared as Score).saturating_mul(self.weights.shared_word_bonus)
    }
}

/// End offsets of the words in a filename's stem (everything before the last
/// `.`). A word ends before punctuation and before an uppercase letter that
/// follows a lowercase one. A name without an extension has no stem words.
fn stem_word_ends(name: &str, mode: TextMode) -> Vec<usize> {
    let Some(dot) = name.rfind('.') else {
        return Vec::new();
    };
    let stem = &name[..dot];

    let mut ends = Vec::new();
    let mut prev: Option<char> = None;
    for (i, ch) in stem.char_indices() {
        if let Some(p) = prev {
            let breaks = !mode.is_alphanumeric(ch) || (!mode.is_uppercase(p) && mode.is_uppercase(ch));
            if mode.is_alphanumeric(p) && breaks {
                ends.push(i);
            }
        }
        prev = Some(ch);
    }
    if prev.is_some_and(|p| mode.is_alphanumeric(p)) {
        ends.push(stem.len());
    }
    ends
}

/// Number of leading stem words of `current` that `name` starts with.
///
/// The last shared word only counts when `name` does not continue it, so
/// `food.rs` shares nothing with `foo.rs` while `fooBar.rs` and `foo_test.rs`
/// share one word.
fn shared_leading_words(name: &str, current: &str, word_ends: &[usize], mode: TextMode) -> usize {
    let common = name
        .bytes()
        .zip(current.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    let mut shared = word_ends.iter().take_while(|&&end| end <= common).count();

    if shared > 0 && shared == word_ends.len() {
        let end = word_ends[shared - 1];
        let continues = name
            .get(end..)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|ch| mode.is_alphanumeric(ch) && !mode.is_uppercase(ch));
        if continues {
            shared -= 1;
        }
    }
    shared
}

#[inline]
fn unit_matches(q: &Unit, c: &Unit, case_sensitive: bool) -> bool {
    if case_sensitive { q.ch == c.ch } else { q.folded == c.folded }
}

#[inline]
fn match_score(weights: &ScoringWeights, q: &Unit, c: &Unit, bonus: i32) -> i32 {
    let case = if q.ch == c.ch { weights.exact_case_bonus } else { 0 };
    weights.match_base + bonus + case
}
