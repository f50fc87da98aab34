//! Greedy parser with lazy matching, used below the optimal-parse qualities.
//!
//! At each position the finder's best-scoring match is taken, unless the
//! match starting one byte later scores clearly better, in which case the
//! current byte becomes a literal and the later match is considered instead
//! (at most [`MAX_DELAYED_REFERENCES`] times in a row).  Long stretches
//! without any match are assumed incompressible and are walked with a
//! growing stride, hashing only some of their positions.

use super::command::Command;
use super::hasher::{LongestMatch, MatchFinder, MIN_SCORE};
use super::types::{BackrefError, ParseWindow, HASH_TYPE_LENGTH};
use super::StreamState;

/// Score a deferred match must gain over the current one.
const COST_DIFF_LAZY: f64 = 7.0;

const MAX_DELAYED_REFERENCES: usize = 4;

/// Bytes without a match before the skip heuristic kicks in.
#[inline]
fn random_heuristics_window_size(quality: i32) -> usize {
    if quality < 9 {
        64
    } else {
        512
    }
}

/// Parse `window` greedily, appending commands.
///
/// The finder must already be initialised and stitched for this window.
/// The literal run left at the end is carried in `state.last_insert_len`,
/// or emitted as an insert-only command when the window `is_last`.
/// Returns the number of commands appended.
pub fn create_greedy_references(
    finder: &mut dyn MatchFinder,
    window: &ParseWindow<'_, '_>,
    quality: i32,
    state: &mut StreamState,
    commands: &mut Vec<Command>,
) -> Result<usize, BackrefError> {
    let ring = window.ring;
    let max_backward_limit = window.max_backward_limit;
    let before = commands.len();
    let mut insert_length = state.last_insert_len;
    let mut i = window.position;
    let i_end = window.end();

    let window_size = random_heuristics_window_size(quality);
    let mut apply_random_heuristics = i + window_size;

    while i + HASH_TYPE_LENGTH <= i_end {
        let mut max_length = i_end - i;
        let max_distance = i.min(max_backward_limit);
        let mut best = LongestMatch::default();
        let found =
            finder.find_longest_match(ring, &state.dist_cache, i, max_length, max_distance, &mut best);
        finder.store(ring, i);

        if found {
            // Look one byte ahead for something better.
            let mut delayed = 0usize;
            loop {
                max_length -= 1;
                if i + 1 + HASH_TYPE_LENGTH > i_end {
                    break;
                }
                let mut best_2 = LongestMatch {
                    len: if quality < 5 { (best.len - 1).min(max_length) } else { 0 },
                    len_code: 0,
                    distance: 0,
                    score: MIN_SCORE,
                };
                let max_distance = (i + 1).min(max_backward_limit);
                let found_2 = finder.find_longest_match(
                    ring,
                    &state.dist_cache,
                    i + 1,
                    max_length,
                    max_distance,
                    &mut best_2,
                );
                if found_2 && best_2.score >= best.score + COST_DIFF_LAZY {
                    i += 1;
                    insert_length += 1;
                    best = best_2;
                    finder.store(ring, i);
                    delayed += 1;
                    if delayed < MAX_DELAYED_REFERENCES {
                        continue;
                    }
                }
                break;
            }

            apply_random_heuristics = i + 2 * best.len + window_size;
            let max_distance = i.min(max_backward_limit);
            let distance_code = state.dist_cache.distance_code(best.distance, max_distance, quality);
            state.dist_cache.update(best.distance, distance_code, max_distance);
            commands.try_reserve(1)?;
            commands.push(Command::new(insert_length, best.len, best.len_code, distance_code));
            state.num_literals += insert_length;
            insert_length = 0;
            for j in 1..best.len {
                if i + j + HASH_TYPE_LENGTH <= i_end {
                    finder.store(ring, i + j);
                }
            }
            i += best.len;
        } else {
            insert_length += 1;
            i += 1;
            if i > apply_random_heuristics {
                if i > apply_random_heuristics + 4 * window_size {
                    // No copy for a long while: hash only every fourth byte.
                    let i_jump = (i + 16).min(i_end.saturating_sub(4));
                    while i < i_jump {
                        finder.store(ring, i);
                        insert_length += 4;
                        i += 4;
                    }
                } else {
                    let i_jump = (i + 8).min(i_end.saturating_sub(3));
                    while i < i_jump {
                        finder.store(ring, i);
                        insert_length += 2;
                        i += 2;
                    }
                }
            }
        }
    }

    insert_length += i_end - i;
    if window.is_last && insert_length > 0 {
        commands.try_reserve(1)?;
        commands.push(Command::insert_only(insert_length));
        state.num_literals += insert_length;
        state.last_insert_len = 0;
    } else {
        state.last_insert_len = insert_length;
    }
    let written = commands.len() - before;
    state.num_commands += written;
    Ok(written)
}
