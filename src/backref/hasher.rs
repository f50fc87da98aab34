//! Match finders: the capability the parsers query for copy candidates.
//!
//! A [`MatchFinder`] indexes positions of the stream as they are
//! [`store`](MatchFinder::store)d and answers two kinds of query:
//!
//! 1. [`find_all_matches`](MatchFinder::find_all_matches), used by the
//!    optimal parser: every useful match at a position, with strictly
//!    increasing lengths, each at the shortest distance found for it.
//! 2. [`find_longest_match`](MatchFinder::find_longest_match), used by the
//!    greedy parser: the single best-scoring match, trying the distance cache
//!    before the index.
//!
//! The built-in [`HashChain`] hashes the four bytes at each position with a
//! multiplicative hash into a bucket head table and threads positions with
//! the same hash through a window-sized chain table.  [`Hashers`] maps the
//! integer algorithm identifiers onto finders and accepts custom ones.

use crate::config::{hasher_params, HasherParams};

use super::dist_cache::DistanceCache;
use super::types::{reset_scratch, BackrefError, RingBuffer};

/// Minimum greedy score a match must beat.
pub const MIN_SCORE: f64 = 4.0;

/// Estimated bits spent on each distance short code, relative to slot 0.
const DISTANCE_SHORT_CODE_BIT_COST: [f64; 16] = [
    -0.6, 0.95, 1.17, 1.27, 0.93, 0.93, 0.96, 0.96, 0.99, 0.99, 1.05, 1.05, 1.15, 1.15, 1.25,
    1.25,
];

#[inline]
fn log2_floor(v: usize) -> u32 {
    usize::BITS - 1 - v.leading_zeros()
}

/// Greedy score of a copy sent with a regular distance.
#[inline]
pub fn backward_reference_score(copy_length: usize, backward: usize) -> f64 {
    5.4 * copy_length as f64 - 1.2 * log2_floor(backward) as f64
}

/// Greedy score of a copy sent with distance short code `code`.
#[inline]
pub fn backward_reference_score_using_last_distance(copy_length: usize, code: usize) -> f64 {
    5.4 * copy_length as f64 - DISTANCE_SHORT_CODE_BIT_COST[code]
}

// ─────────────────────────────────────────────────────────────────────────────
// Match records
// ─────────────────────────────────────────────────────────────────────────────

/// One candidate copy: `length` bytes from `distance` back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackwardMatch {
    pub distance: u32,
    pub length: u32,
}

impl BackwardMatch {
    #[inline]
    pub fn new(distance: usize, length: usize) -> Self {
        BackwardMatch { distance: distance as u32, length: length as u32 }
    }
}

/// In/out record of a greedy lookup.
///
/// On input `len` is the length below which candidates are not even
/// compared and `score` is the score to beat; on success all four fields
/// describe the winner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LongestMatch {
    pub len: usize,
    pub len_code: usize,
    pub distance: usize,
    pub score: f64,
}

impl Default for LongestMatch {
    fn default() -> Self {
        LongestMatch { len: 0, len_code: 0, distance: 0, score: MIN_SCORE }
    }
}

/// Settings a finder is prepared with at the start of each parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinderParams {
    pub quality: i32,
    pub lgwin: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// MatchFinder
// ─────────────────────────────────────────────────────────────────────────────

/// The match-finding capability consumed by the parsers.
///
/// Positions are absolute stream offsets; bytes are read through the
/// caller's [`RingBuffer`].  A position is only stored or queried while its
/// first four bytes lie inside the stretch being parsed.
pub trait MatchFinder {
    /// Prepare for a parse starting at `position`.  Position 0 starts a new
    /// stream and forgets all history.
    fn init(&mut self, params: &FinderParams, position: usize) -> Result<(), BackrefError>;

    /// Index `ix`.
    fn store(&mut self, ring: &RingBuffer<'_>, ix: usize);

    /// Index every position in `[start, end)`.
    fn store_range(&mut self, ring: &RingBuffer<'_>, start: usize, end: usize) {
        for ix in start..end {
            self.store(ring, ix);
        }
    }

    /// Index the last positions of the previous parse, which could not be
    /// hashed until the bytes following them were part of a parse.
    fn stitch_to_previous_block(&mut self, ring: &RingBuffer<'_>, position: usize, num_bytes: usize) {
        if num_bytes >= 3 && position >= 3 {
            self.store(ring, position - 3);
            self.store(ring, position - 2);
            self.store(ring, position - 1);
        }
    }

    /// Append to `out` the matches at `cur_ix`, lengths strictly increasing.
    /// No match is longer than `max_length` or farther than `max_backward`.
    fn find_all_matches(
        &mut self,
        ring: &RingBuffer<'_>,
        cur_ix: usize,
        max_length: usize,
        max_backward: usize,
        out: &mut Vec<BackwardMatch>,
    );

    /// Look for a match at `cur_ix` scoring above `out.score`; on success
    /// overwrite `out` and return `true`.
    fn find_longest_match(
        &mut self,
        ring: &RingBuffer<'_>,
        dist_cache: &DistanceCache,
        cur_ix: usize,
        max_length: usize,
        max_backward: usize,
        out: &mut LongestMatch,
    ) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// HashChain
// ─────────────────────────────────────────────────────────────────────────────

/// Hash-chain finder over four-byte prefixes.
///
/// `head[h]` is the most recent position whose prefix hashes to `h`;
/// `chain[p & window_mask]` is the position stored before `p` under the same
/// hash.  Positions are kept as `u32` and compared by wrapping distance, so
/// only distances below 2^32 are meaningful (the window is far smaller).
#[derive(Debug, Clone)]
pub struct HashChain {
    params: HasherParams,
    quality: i32,
    head: Vec<u32>,
    chain: Vec<u32>,
    window_mask: usize,
    prepared: bool,
}

impl HashChain {
    pub fn new(params: HasherParams) -> Self {
        HashChain {
            params,
            quality: 0,
            head: Vec::new(),
            chain: Vec::new(),
            window_mask: 0,
            prepared: false,
        }
    }

    pub fn params(&self) -> HasherParams {
        self.params
    }

    /// Multiplicative hash of the four bytes at `pos`.
    #[inline(always)]
    fn hash(&self, ring: &RingBuffer<'_>, pos: usize) -> usize {
        (ring.read_u32(pos).wrapping_mul(2_654_435_761u32) >> (32 - self.params.bucket_bits))
            as usize
    }

    /// Longest distance the short backward scan covers before the chain walk.
    #[inline]
    fn short_match_max_backward(&self) -> usize {
        if self.quality >= 11 {
            64
        } else {
            16
        }
    }
}

impl MatchFinder for HashChain {
    fn init(&mut self, params: &FinderParams, position: usize) -> Result<(), BackrefError> {
        self.quality = params.quality;
        let window = 1usize << params.lgwin;
        if position == 0 || !self.prepared || self.chain.len() != window {
            reset_scratch(&mut self.head, 1usize << self.params.bucket_bits, 0)?;
            reset_scratch(&mut self.chain, window, 0)?;
            self.window_mask = window - 1;
            self.prepared = true;
        }
        Ok(())
    }

    #[inline]
    fn store(&mut self, ring: &RingBuffer<'_>, ix: usize) {
        let key = self.hash(ring, ix);
        let ix32 = ix as u32;
        // Storing a position twice would link it to itself.
        if self.head[key] == ix32 && ix != 0 {
            return;
        }
        self.chain[ix & self.window_mask] = self.head[key];
        self.head[key] = ix32;
    }

    fn find_all_matches(
        &mut self,
        ring: &RingBuffer<'_>,
        cur_ix: usize,
        max_length: usize,
        max_backward: usize,
        out: &mut Vec<BackwardMatch>,
    ) {
        debug_assert!(max_length >= 2);
        let mut best_len = 1usize;

        // Short distances first: catches the 2- and 3-byte copies a four-byte
        // hash cannot see.
        let stop = cur_ix.saturating_sub(self.short_match_max_backward());
        let mut prev_ix = cur_ix;
        while prev_ix > stop && best_len <= 2 {
            prev_ix -= 1;
            let backward = cur_ix - prev_ix;
            if backward > max_backward {
                break;
            }
            if ring.byte(cur_ix) != ring.byte(prev_ix)
                || ring.byte(cur_ix + 1) != ring.byte(prev_ix + 1)
            {
                continue;
            }
            let len = ring.match_len(prev_ix, cur_ix, max_length);
            if len > best_len {
                best_len = len;
                out.push(BackwardMatch::new(backward, len));
            }
        }

        let key = self.hash(ring, cur_ix);
        let mut cand = self.head[key];
        let mut last_backward = 0usize;
        for _ in 0..self.params.chain_depth {
            let backward = (cur_ix as u32).wrapping_sub(cand) as usize;
            if backward == 0 || backward <= last_backward || backward > max_backward {
                break;
            }
            if best_len >= max_length {
                break;
            }
            last_backward = backward;
            let prev_ix = cur_ix - backward;
            cand = self.chain[prev_ix & self.window_mask];
            if ring.byte(cur_ix + best_len) != ring.byte(prev_ix + best_len) {
                continue;
            }
            let len = ring.match_len(prev_ix, cur_ix, max_length);
            if len > best_len {
                best_len = len;
                out.push(BackwardMatch::new(backward, len));
            }
        }
    }

    fn find_longest_match(
        &mut self,
        ring: &RingBuffer<'_>,
        dist_cache: &DistanceCache,
        cur_ix: usize,
        max_length: usize,
        max_backward: usize,
        out: &mut LongestMatch,
    ) -> bool {
        let mut best_len = out.len;
        let mut best_score = out.score;
        let mut found = false;

        for code in 0..self.params.num_last_distances_to_check {
            let Some(backward) = dist_cache.candidate(code) else {
                continue;
            };
            if backward > max_backward {
                continue;
            }
            let prev_ix = cur_ix - backward;
            if best_len < max_length && ring.byte(cur_ix + best_len) != ring.byte(prev_ix + best_len)
            {
                continue;
            }
            let len = ring.match_len(prev_ix, cur_ix, max_length);
            if len >= 3 || (len == 2 && code < 2) {
                let score = backward_reference_score_using_last_distance(len, code);
                if best_score < score {
                    best_score = score;
                    best_len = len;
                    *out = LongestMatch { len, len_code: len, distance: backward, score };
                    found = true;
                }
            }
        }

        let key = self.hash(ring, cur_ix);
        let mut cand = self.head[key];
        let mut last_backward = 0usize;
        for _ in 0..self.params.chain_depth {
            let backward = (cur_ix as u32).wrapping_sub(cand) as usize;
            if backward == 0 || backward <= last_backward || backward > max_backward {
                break;
            }
            last_backward = backward;
            let prev_ix = cur_ix - backward;
            cand = self.chain[prev_ix & self.window_mask];
            if best_len < max_length && ring.byte(cur_ix + best_len) != ring.byte(prev_ix + best_len)
            {
                continue;
            }
            let len = ring.match_len(prev_ix, cur_ix, max_length);
            if len >= 4 {
                let score = backward_reference_score(len, backward);
                if best_score < score {
                    best_score = score;
                    best_len = len;
                    *out = LongestMatch { len, len_code: len, distance: backward, score };
                    found = true;
                }
            }
        }
        found
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hashers registry
// ─────────────────────────────────────────────────────────────────────────────

/// Match finders keyed by integer algorithm identifier.
///
/// Identifiers 1..=10 resolve to built-in [`HashChain`]s shaped by
/// [`hasher_params`], created on first use.  [`register`](Self::register)
/// installs (or replaces) a finder under any identifier.
#[derive(Default)]
pub struct Hashers {
    finders: Vec<(i32, Box<dyn MatchFinder>)>,
}

impl Hashers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hash_type: i32, finder: Box<dyn MatchFinder>) {
        match self.finders.iter_mut().find(|(t, _)| *t == hash_type) {
            Some(slot) => slot.1 = finder,
            None => self.finders.push((hash_type, finder)),
        }
    }

    /// The finder for `hash_type`.
    pub fn get(&mut self, hash_type: i32) -> Result<&mut dyn MatchFinder, BackrefError> {
        let idx = match self.finders.iter().position(|(t, _)| *t == hash_type) {
            Some(idx) => idx,
            None => {
                let params = hasher_params(hash_type).ok_or(BackrefError::UnknownHasher(hash_type))?;
                self.finders.push((hash_type, Box::new(HashChain::new(params))));
                self.finders.len() - 1
            }
        };
        Ok(self.finders[idx].1.as_mut())
    }
}
