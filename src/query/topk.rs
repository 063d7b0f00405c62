//! Bounded top-k collection for one worker.
//!
//! Results live in a flat arena; the heap orders arena indices with the worst
//! result at the root. Once full, a better result overwrites the worst slot in
//! place, reusing its positions buffer, so a scan over millions of candidates
//! allocates at most `k` position vectors.

use std::cmp::Ordering;

use crate::query::scorer::Score;

/// A ranked result: the candidate's index in the caller's list, its score and
/// the matched byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedMatch {
    pub index: usize,
    pub score: Score,
    pub positions: Vec<usize>,
}

/// Rank order: higher score first, then lower candidate index
#[inline]
pub fn rank_order(a_score: Score, a_index: usize, b_score: Score, b_index: usize) -> Ordering {
    b_score.cmp(&a_score).then(a_index.cmp(&b_index))
}

/// Rank order of two results, best first
pub fn compare_ranked(a: &RankedMatch, b: &RankedMatch) -> Ordering {
    rank_order(a.score, a.index, b.score, b.index)
}

/// Top-k structure keeping the best results seen so far
#[derive(Debug)]
pub struct TopKHeap {
    slots: Vec<RankedMatch>,
    /// Arena indices, worst result at the root
    heap: Vec<usize>,
    /// `None` keeps every result
    capacity: Option<usize>,
}

impl TopKHeap {
    /// Create a heap keeping `limit` results, `0` meaning unbounded
    pub fn new(limit: usize) -> Self {
        Self::with_expected(limit, 0)
    }

    /// Like [`TopKHeap::new`], pre-sizing the arena for `expected` candidates
    pub fn with_expected(limit: usize, expected: usize) -> Self {
        let capacity = (limit > 0).then_some(limit);
        let reserve = match capacity {
            Some(k) => k.min(expected),
            None => 0,
        };
        Self {
            slots: Vec::with_capacity(reserve),
            heap: Vec::with_capacity(reserve),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|k| self.slots.len() >= k)
    }

    /// The worst result currently kept, once the heap is full
    pub fn threshold(&self) -> Option<(Score, usize)> {
        if !self.is_full() {
            return None;
        }
        self.heap.first().map(|&root| {
            let worst = &self.slots[root];
            (worst.score, worst.index)
        })
    }

    /// Whether a result would be kept
    #[inline]
    pub fn would_enter(&self, score: Score, index: usize) -> bool {
        match self.threshold() {
            Some((worst_score, worst_index)) => {
                rank_order(score, index, worst_score, worst_index) == Ordering::Less
            }
            None => true,
        }
    }

    /// Insert a result if it ranks among the best `k`.
    ///
    /// `fill` writes the matched positions into an empty buffer and is only
    /// called when the result is kept.
    pub fn insert_with<F>(&mut self, score: Score, index: usize, fill: F) -> bool
    where
        F: FnOnce(&mut Vec<usize>),
    {
        if !self.would_enter(score, index) {
            return false;
        }

        if self.is_full() {
            let root = self.heap[0];
            let slot = &mut self.slots[root];
            slot.score = score;
            slot.index = index;
            slot.positions.clear();
            fill(&mut slot.positions);
            self.sift_down(0);
        } else {
            let mut positions = Vec::new();
            fill(&mut positions);
            self.slots.push(RankedMatch {
                index,
                score,
                positions,
            });
            if self.capacity.is_some() {
                self.heap.push(self.slots.len() - 1);
                self.sift_up(self.heap.len() - 1);
            }
        }
        true
    }

    /// Kept results in no particular order
    pub fn into_vec(self) -> Vec<RankedMatch> {
        self.slots
    }

    /// True when arena slot `a` ranks below slot `b`
    #[inline]
    fn worse(&self, a: usize, b: usize) -> bool {
        let (a, b) = (&self.slots[a], &self.slots[b]);
        rank_order(a.score, a.index, b.score, b.index) == Ordering::Greater
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.worse(self.heap[pos], self.heap[parent]) {
                break;
            }
            self.heap.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut worst = pos;
            if left < len && self.worse(self.heap[left], self.heap[worst]) {
                worst = left;
            }
            if right < len && self.worse(self.heap[right], self.heap[worst]) {
                worst = right;
            }
            if worst == pos {
                break;
            }
            self.heap.swap(pos, worst);
            pos = worst;
        }
    }
}
