//! The four-slot distance cache and the short distance codes built on it.
//!
//! Distance codes `0..16` are relative to the cache; any other distance `d`
//! is sent as code `d + 15`.  The update rule applied after each copy must
//! be exactly the one the decoder applies, otherwise every later short code
//! resolves to the wrong distance:
//!
//! - code 0 (repeat the last distance) leaves the cache untouched;
//! - any other code whose distance lies inside the window pushes that
//!   distance to the front and drops the oldest slot.  Slots 1..3 that hit
//!   are pushed the same way, so a slot may appear twice.

use super::types::NUM_DISTANCE_SHORT_CODES;

/// Cache slot each short code is relative to.
pub const DISTANCE_CACHE_INDEX: [usize; NUM_DISTANCE_SHORT_CODES] =
    [0, 1, 2, 3, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1];

/// Adjustment each short code applies to its slot.
pub const DISTANCE_CACHE_OFFSET: [i32; NUM_DISTANCE_SHORT_CODES] =
    [0, 0, 0, 0, -1, 1, -2, 2, -3, 3, -1, 1, -2, 2, -3, 3];

/// Smallest distance the greedy parser will send through short codes 4..15.
const SHORT_CODE_MIN_DISTANCE: [usize; NUM_DISTANCE_SHORT_CODES] =
    [0, 0, 0, 0, 6, 6, 11, 11, 11, 11, 11, 11, 12, 12, 12, 12];

/// Cache contents at the start of every stream.
pub const INITIAL_DISTANCES: [i32; 4] = [4, 11, 15, 16];

/// Ordered recent-distance list, most recent first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistanceCache([i32; 4]);

impl Default for DistanceCache {
    fn default() -> Self {
        DistanceCache(INITIAL_DISTANCES)
    }
}

impl DistanceCache {
    pub const fn new(slots: [i32; 4]) -> Self {
        DistanceCache(slots)
    }

    #[inline]
    pub fn slots(&self) -> [i32; 4] {
        self.0
    }

    /// Slot holding `distance`, if any.
    #[inline]
    pub fn lookup(&self, distance: usize) -> Option<usize> {
        self.0.iter().position(|&d| d > 0 && d as usize == distance)
    }

    /// Distance short code `code` stands for, or `None` when the adjusted
    /// slot is not a positive distance.
    #[inline]
    pub fn candidate(&self, code: usize) -> Option<usize> {
        let d = self.0[DISTANCE_CACHE_INDEX[code]] + DISTANCE_CACHE_OFFSET[code];
        (d > 0).then_some(d as usize)
    }

    /// Cheapest code for `distance` as chosen by the greedy parser.
    ///
    /// Exact slot hits always win; the adjusted codes 4..15 are only used
    /// above quality 3 and for distances of at least 6.
    pub fn distance_code(&self, distance: usize, max_distance: usize, quality: i32) -> usize {
        if distance <= max_distance {
            if let Some(slot) = self.lookup(distance) {
                return slot;
            }
            if quality > 3 && distance >= 6 {
                for code in 4..NUM_DISTANCE_SHORT_CODES {
                    if self.candidate(code) == Some(distance)
                        && distance >= SHORT_CODE_MIN_DISTANCE[code]
                    {
                        return code;
                    }
                }
            }
        }
        distance + NUM_DISTANCE_SHORT_CODES - 1
    }

    /// Decoder-side mapping from a distance code back to a distance.
    #[inline]
    pub fn resolve(&self, code: usize) -> Option<usize> {
        if code < NUM_DISTANCE_SHORT_CODES {
            self.candidate(code)
        } else {
            Some(code - (NUM_DISTANCE_SHORT_CODES - 1))
        }
    }

    /// Push `distance` to the front, dropping the oldest slot.
    #[inline]
    pub fn push(&mut self, distance: usize) {
        self.0 = [distance as i32, self.0[0], self.0[1], self.0[2]];
    }

    /// Apply the post-copy update for a copy of `distance` sent as `code`.
    #[inline]
    pub fn update(&mut self, distance: usize, code: usize, max_distance: usize) {
        if distance <= max_distance && code > 0 {
            self.push(distance);
        }
    }

    /// The cache as it will look after [`update`](Self::update).
    #[inline]
    pub fn after(&self, distance: usize, code: usize, max_distance: usize) -> Self {
        let mut next = *self;
        next.update(distance, code, max_distance);
        next
    }
}
