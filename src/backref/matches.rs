//! Match Candidate Provider: per-position copy edges for the optimal parser.
//!
//! Runs the match finder over every position of the window once, before any
//! parsing pass, and keeps the result as a count per position plus one
//! flattened match list.  Long matches are collapsed: when the longest match
//! at a position exceeds [`MAX_ZOPFLI_LEN`] only that match is kept and the
//! positions it covers get no candidates of their own.

use super::hasher::{BackwardMatch, MatchFinder};
use super::types::{reset_scratch, BackrefError, ParseWindow, HASH_TYPE_LENGTH, MAX_ZOPFLI_LEN};

/// Positions stored from the tail of a collapsed long match.
const LONG_MATCH_STORE_TAIL: usize = 64;

#[derive(Debug, Default)]
pub struct MatchCandidates {
    num_matches: Vec<u32>,
    matches: Vec<BackwardMatch>,
    found: Vec<BackwardMatch>,
}

impl MatchCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of candidates recorded at window offset `i`.
    #[inline]
    pub fn count(&self, i: usize) -> usize {
        self.num_matches[i] as usize
    }

    /// All candidates, position-major, lengths increasing within a position.
    #[inline]
    pub fn all(&self) -> &[BackwardMatch] {
        &self.matches
    }

    /// Collect candidates for every position of `window`.
    ///
    /// The finder must already be initialised (and stitched) for the window.
    /// Every indexed position is also stored into the finder.
    pub fn collect(
        &mut self,
        finder: &mut dyn MatchFinder,
        window: &ParseWindow<'_, '_>,
    ) -> Result<(), BackrefError> {
        let ring = window.ring;
        let position = window.position;
        let num_bytes = window.num_bytes;
        reset_scratch(&mut self.num_matches, num_bytes, 0)?;
        self.matches.clear();
        // Positions whose hash would read past the window are left for the
        // next window to stitch.
        let store_end = if num_bytes >= HASH_TYPE_LENGTH {
            position + num_bytes - HASH_TYPE_LENGTH + 1
        } else {
            position
        };

        let mut i = 0usize;
        while i + HASH_TYPE_LENGTH <= num_bytes {
            let pos = position + i;
            let max_distance = pos.min(window.max_backward_limit);
            let max_length = num_bytes - i;

            self.found.clear();
            finder.find_all_matches(ring, pos, max_length, max_distance, &mut self.found);
            finder.store(ring, pos);

            match self.found.last().copied() {
                Some(longest) if longest.length as usize > MAX_ZOPFLI_LEN => {
                    let len = longest.length as usize;
                    self.matches.try_reserve(1)?;
                    self.matches.push(longest);
                    self.num_matches[i] = 1;
                    let range_end = (pos + len).min(store_end);
                    let range_start = if pos + 1 + LONG_MATCH_STORE_TAIL <= range_end {
                        range_end - LONG_MATCH_STORE_TAIL
                    } else {
                        pos + 1
                    };
                    finder.store_range(ring, range_start, range_end);
                    i += len;
                }
                _ => {
                    self.matches.try_reserve(self.found.len())?;
                    self.matches.extend_from_slice(&self.found);
                    self.num_matches[i] = self.found.len() as u32;
                    i += 1;
                }
            }
        }
        Ok(())
    }
}
