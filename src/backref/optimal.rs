//! Optimal parser: minimum-cost path through the window.
//!
//! The window of `num_bytes` bytes is a DAG with one node per byte boundary.
//! Node `i` reaches `i + 1` through a literal edge and `i + len` through a
//! copy edge for every candidate copy starting at `i`.  Nodes are relaxed in
//! increasing order, so every node is final by the time it is expanded.
//!
//! A copy is always priced from the start of the literal run preceding it,
//! since its command carries that run as its insert length.  The candidate
//! run starts are drawn from a [`StartPosRing`]: only the last few pushed
//! starts are reconsidered at each position, which keeps the work per byte
//! bounded.
//!
//! Each node records how it was reached:
//!   - copy-reached: `length > 0`, `insert_length` literals precede the copy
//!     and the run they form begins at `i - length - insert_length`;
//!   - literal-reached: `length == 0` and `insert_length` is the length of
//!     the literal run ending here.
//!
//! Stepping back `length + insert_length` from any node therefore lands on
//! a run start, which is how the path is recovered.
//!
//! Corresponds to the following phases of one optimal pass:
//!   - [`zopfli_iterate`]                   relax all nodes, return terminal cost
//!   - [`compute_shortest_path_from_nodes`] backtrack the step lengths
//!   - [`create_commands`]                  emit commands, update stream state

use crate::config::START_RING_SLACK;

use super::command::Command;
use super::cost::CostModel;
use super::dist_cache::DistanceCache;
use super::matches::MatchCandidates;
use super::ring::StartPosRing;
use super::types::{
    reset_scratch, BackrefError, ParseWindow, HASH_TYPE_LENGTH, MAX_ZOPFLI_LEN,
    NUM_DISTANCE_SHORT_CODES,
};
use super::StreamState;

/// Run starts reconsidered per position.
const MAX_STARTS_PER_POSITION: usize = 5;

/// Run starts whose explicit-distance matches are also tried; older starts
/// only look for distance-cache copies.
const MAX_STARTS_WITH_MATCHES: usize = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Node
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    /// Copy length of the edge into this node; 0 for a literal edge.
    pub length: u32,
    pub length_code: u32,
    pub distance: u32,
    pub distance_code: u32,
    /// Literals preceding the copy, or the literal run ending here.
    pub insert_length: u32,
    /// Smallest cost found so far to reach this node.
    pub cost: f64,
    /// Distance cache as it stands after the edge into this node.
    pub cache: DistanceCache,
}

impl Node {
    pub const UNREACHED: Node = Node {
        length: 0,
        length_code: 0,
        distance: 0,
        distance_code: 0,
        insert_length: 0,
        cost: f64::INFINITY,
        cache: DistanceCache::new([0; 4]),
    };

    /// True for node 0 and copy-reached nodes: places a literal run can begin.
    #[inline]
    fn is_run_start(&self, i: usize) -> bool {
        i == 0 || self.length > 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Relaxation
// ─────────────────────────────────────────────────────────────────────────────

/// A copy edge out of the node being expanded.
struct CopyEdge<'c> {
    len: usize,
    distance: usize,
    distance_code: usize,
    /// Literals between the run start and the copy.
    insert_length: usize,
    max_distance: usize,
    /// Cache at the run start.
    cache: &'c DistanceCache,
    cost: f64,
}

/// Take `edge` from node `at` if it reaches `at + edge.len` more cheaply.
#[inline]
fn relax_copy(nodes: &mut [Node], at: usize, edge: &CopyEdge<'_>) {
    let target = &mut nodes[at + edge.len];
    if edge.cost < target.cost {
        *target = Node {
            length: edge.len as u32,
            length_code: edge.len as u32,
            distance: edge.distance as u32,
            distance_code: edge.distance_code as u32,
            insert_length: edge.insert_length as u32,
            cost: edge.cost,
            cache: edge.cache.after(edge.distance, edge.distance_code, edge.max_distance),
        };
    }
}

/// Shortest copy worth trying at `pos`: longer copies are skipped while the
/// node they would reach is already cheaper than the cheapest conceivable
/// copy from the most recent run start.
fn compute_minimum_copy_length(
    start0: usize,
    nodes: &[Node],
    model: &CostModel,
    num_bytes: usize,
    pos: usize,
) -> usize {
    let mut min_cost =
        nodes[start0].cost + model.literal_cost(start0, pos) + model.min_command_cost();
    let mut len = 2usize;
    let mut next_len_bucket = 4usize;
    let mut next_len_offset = 10usize;
    while pos + len <= num_bytes && nodes[pos + len].cost <= min_cost {
        // Every copy-length bucket costs at least one more extra bit.
        len += 1;
        if len == next_len_offset {
            min_cost += 1.0;
            next_len_offset += next_len_bucket;
            next_len_bucket *= 2;
        }
    }
    len
}

/// Relax every node of the window and return the cost of the terminal one.
///
/// `nodes` is resized to `num_bytes + 1`; node 0 starts from `dist_cache`.
pub fn zopfli_iterate(
    window: &ParseWindow<'_, '_>,
    dist_cache: &DistanceCache,
    candidates: &MatchCandidates,
    model: &CostModel,
    queue: &mut StartPosRing,
    nodes: &mut Vec<Node>,
) -> Result<f64, BackrefError> {
    let ring = window.ring;
    let num_bytes = window.num_bytes;
    reset_scratch(nodes, num_bytes + 1, Node::UNREACHED)?;
    nodes[0] = Node { cost: 0.0, cache: *dist_cache, ..Node::UNREACHED };
    queue.clear();

    let mut cur_match_pos = 0usize;
    let mut i = 0usize;
    while i < num_bytes {
        let node = nodes[i];
        debug_assert!(node.cost.is_finite());

        if node.is_run_start(i) {
            let costdiff = node.cost - model.literal_cost(0, i);
            let favorable = match queue.min_costdiff() {
                Some(best) => costdiff <= best + START_RING_SLACK,
                None => true,
            };
            if favorable {
                queue.push(i, costdiff);
            }
        }

        let lit_cost = node.cost + model.literal_cost(i, i + 1);
        if lit_cost < nodes[i + 1].cost {
            nodes[i + 1] = Node {
                insert_length: if node.length > 0 { 1 } else { node.insert_length + 1 },
                cost: lit_cost,
                cache: node.cache,
                ..Node::UNREACHED
            };
        }

        let num_here = candidates.count(i);
        let here = &candidates.all()[cur_match_pos..cur_match_pos + num_here];
        cur_match_pos += num_here;

        let latest_start = match queue.get(0) {
            Some(start) if i + HASH_TYPE_LENGTH <= num_bytes => start,
            _ => {
                i += 1;
                continue;
            }
        };

        let cur_ix = window.position + i;
        let max_distance = cur_ix.min(window.max_backward_limit);
        let max_length = num_bytes - i;
        let min_len = compute_minimum_copy_length(latest_start, nodes, model, num_bytes, i);

        for k in 0..MAX_STARTS_PER_POSITION {
            let Some(start) = queue.get(k) else {
                break;
            };
            let start_node = nodes[start];
            let base_cost = start_node.cost + model.literal_cost(start, i);
            let inslen = i - start;
            let cache = start_node.cache;

            // Copies the distance cache can express, cheapest codes first.
            let mut best_len = min_len - 1;
            for code in 0..NUM_DISTANCE_SHORT_CODES {
                if best_len >= max_length {
                    break;
                }
                let Some(backward) = cache.candidate(code) else {
                    continue;
                };
                if backward > max_distance {
                    continue;
                }
                let prev_ix = cur_ix - backward;
                if ring.byte(cur_ix + best_len) != ring.byte(prev_ix + best_len) {
                    continue;
                }
                let len = ring.match_len(prev_ix, cur_ix, max_length);
                for l in best_len + 1..=len {
                    let edge = CopyEdge {
                        len: l,
                        distance: backward,
                        distance_code: code,
                        insert_length: inslen,
                        max_distance,
                        cache: &cache,
                        cost: base_cost + model.command_cost(code, l, inslen),
                    };
                    relax_copy(nodes, i, &edge);
                }
                best_len = best_len.max(len);
            }

            if k >= MAX_STARTS_WITH_MATCHES {
                continue;
            }

            let mut len = min_len;
            for m in here {
                let dist = m.distance as usize;
                let max_len = m.length as usize;
                let dist_code = cache
                    .lookup(dist)
                    .unwrap_or(dist + NUM_DISTANCE_SHORT_CODES - 1);
                if len < max_len && max_len > MAX_ZOPFLI_LEN {
                    len = max_len;
                }
                while len <= max_len {
                    let edge = CopyEdge {
                        len,
                        distance: dist,
                        distance_code: dist_code,
                        insert_length: inslen,
                        max_distance,
                        cache: &cache,
                        cost: base_cost + model.command_cost(dist_code, len, inslen),
                    };
                    relax_copy(nodes, i, &edge);
                    len += 1;
                }
            }
        }

        // A single very long match is taken whole; the bytes it covers are
        // not expanded.
        if num_here == 1 && here[0].length as usize > MAX_ZOPFLI_LEN {
            let target = i + here[0].length as usize;
            if nodes[target].length > 0 {
                i = target;
                queue.clear();
                continue;
            }
        }
        i += 1;
    }
    Ok(nodes[num_bytes].cost)
}

// ─────────────────────────────────────────────────────────────────────────────
// Backtracking and emission
// ─────────────────────────────────────────────────────────────────────────────

/// Recover the chosen path as forward step lengths in `path`.
///
/// Each step spans one command (insert plus copy), except possibly the
/// last, which may be a bare literal run.
pub fn compute_shortest_path_from_nodes(
    num_bytes: usize,
    nodes: &[Node],
    backwards: &mut Vec<usize>,
    path: &mut Vec<usize>,
) -> Result<(), BackrefError> {
    backwards.clear();
    path.clear();
    let mut index = num_bytes;
    while index > 0 {
        let node = &nodes[index];
        let step = (node.length + node.insert_length) as usize;
        debug_assert!(step > 0 && step <= index);
        backwards.try_reserve(1)?;
        backwards.push(step);
        index -= step;
    }
    path.try_reserve(backwards.len())?;
    path.extend(backwards.iter().rev());
    Ok(())
}

/// Append the commands of `path` and advance the stream state.
///
/// The first command absorbs the literal run carried in
/// `state.last_insert_len`; the literal run after the last copy is carried
/// out again, or emitted as an insert-only command when the window
/// `is_last`.  Returns the number of commands appended.
pub fn create_commands(
    window: &ParseWindow<'_, '_>,
    path: &[usize],
    nodes: &[Node],
    state: &mut StreamState,
    commands: &mut Vec<Command>,
) -> Result<usize, BackrefError> {
    commands.try_reserve(path.len() + 1)?;
    let before = commands.len();
    let mut pos = 0usize;
    let mut carried = state.last_insert_len;
    for &step in path {
        let next = &nodes[pos + step];
        if next.length == 0 {
            // Trailing literal run.
            break;
        }
        let insert_length = next.insert_length as usize + carried;
        carried = 0;
        pos += next.insert_length as usize;

        let distance = next.distance as usize;
        let distance_code = next.distance_code as usize;
        let max_distance = (window.position + pos).min(window.max_backward_limit);
        commands.push(Command::new(
            insert_length,
            next.length as usize,
            next.length_code as usize,
            distance_code,
        ));
        state.dist_cache.update(distance, distance_code, max_distance);
        state.num_literals += insert_length;
        pos += next.length as usize;
    }

    let trailing = carried + (window.num_bytes - pos);
    if window.is_last && trailing > 0 {
        commands.push(Command::insert_only(trailing));
        state.num_literals += trailing;
        state.last_insert_len = 0;
    } else {
        state.last_insert_len = trailing;
    }

    let written = commands.len() - before;
    state.num_commands += written;
    Ok(written)
}
