//! `create_backward_references`: the engine's single entry point.
//!
//! One call hands the engine the next `num_bytes` bytes of a stream, at
//! absolute `position`, and appends the commands parsed so far.
//! Continuation state (distance cache, trailing literal run, unparsed tail,
//! counters) lives in a caller-owned [`StreamState`] threaded through every
//! call of the stream; scratch and cost state live in the
//! [`BackwardReferencesContext`].
//!
//! Parsing happens per segment: the stream is cut into stretches of
//! `2^LGSEGMENT` bytes aligned to multiples of that size, and each segment
//! is parsed as a whole once all of its bytes have arrived (or the stream
//! ends).  A non-final call therefore holds back the tail of an unfinished
//! segment in `state.unparsed_len`, and the commands produced do not depend
//! on how the caller splits the stream into calls.
//!
//! Quality selects the strategy:
//!   - below 10: greedy with lazy matching ([`super::greedy`]);
//!   - 10: one optimal pass;
//!   - 11: two optimal passes, the second priced from the first's commands.

use crate::config::{
    hash_type_for_quality, LGSEGMENT, LGWIN_DEFAULT, MIN_QUALITY_FOR_OPTIMAL,
    MIN_QUALITY_FOR_TWO_PASSES, QUALITY_DEFAULT,
};
use crate::displaylevel;

use super::command::Command;
use super::context::BackwardReferencesContext;
use super::dist_cache::DistanceCache;
use super::greedy::create_greedy_references;
use super::hasher::{FinderParams, Hashers, MatchFinder};
use super::optimal::{compute_shortest_path_from_nodes, create_commands, zopfli_iterate};
use super::types::{max_backward_limit, BackrefError, ParseWindow, RingBuffer};

/// Per-stream parse parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackrefParams {
    /// 0..=11; selects greedy (< 10) or optimal parsing.
    pub quality: i32,
    /// Window exponent; copies reach at most `2^lgwin - 16` bytes back.
    pub lgwin: u32,
    /// Match-finder identifier looked up in [`Hashers`].
    pub hash_type: i32,
}

impl BackrefParams {
    /// Parameters with the default match finder for `quality`.
    pub fn new(quality: i32, lgwin: u32) -> Self {
        BackrefParams { quality, lgwin, hash_type: hash_type_for_quality(quality) }
    }

    #[inline]
    pub fn is_optimal(&self) -> bool {
        self.quality >= MIN_QUALITY_FOR_OPTIMAL
    }
}

impl Default for BackrefParams {
    fn default() -> Self {
        Self::new(QUALITY_DEFAULT, LGWIN_DEFAULT)
    }
}

/// Continuation state carried between calls on one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamState {
    pub dist_cache: DistanceCache,
    /// Literals after the last copy, not yet part of any command.
    pub last_insert_len: usize,
    /// Bytes just before the next call's `position` that no parse has
    /// covered yet: the received part of an unfinished segment.
    pub unparsed_len: usize,
    /// Commands emitted so far.
    pub num_commands: usize,
    /// Literal bytes covered by the commands emitted so far.
    pub num_literals: usize,
}

/// The bytes handed to one call: `[position, position+num_bytes)` of the
/// stream, readable through `ring`.
#[derive(Clone, Copy)]
pub struct InputBlock<'r, 'a> {
    pub ring: &'r RingBuffer<'a>,
    pub position: usize,
    pub num_bytes: usize,
    /// No bytes follow this block on the stream.
    pub is_last: bool,
}

impl<'r, 'a> InputBlock<'r, 'a> {
    pub fn new(ring: &'r RingBuffer<'a>, position: usize, num_bytes: usize, is_last: bool) -> Self {
        InputBlock { ring, position, num_bytes, is_last }
    }
}

/// Feed `input` to the engine and append the commands of every segment it
/// completes.
///
/// `ring` must hold the unparsed tail carried in `state`, the new bytes,
/// and up to `2^lgwin` bytes of history before the tail.  When `is_last` is
/// false, bytes of an unfinished segment stay unparsed and the literal run
/// after the last copy stays in `state.last_insert_len`; when true,
/// everything is parsed and the trailing run is emitted as an insert-only
/// command.
pub fn create_backward_references(
    input: &InputBlock<'_, '_>,
    params: &BackrefParams,
    hashers: &mut Hashers,
    state: &mut StreamState,
    commands: &mut Vec<Command>,
    ctx: &mut BackwardReferencesContext,
) -> Result<(), BackrefError> {
    let before = state.num_commands;
    let end = input.position + input.num_bytes;
    let mut start = input.position.checked_sub(state.unparsed_len).ok_or(
        BackrefError::UnparsedBeforeStart {
            position: input.position,
            unparsed: state.unparsed_len,
        },
    )?;

    let segment_size = 1usize << LGSEGMENT;
    let limit = max_backward_limit(params.lgwin);
    while start < end {
        let boundary = (start / segment_size + 1) * segment_size;
        let seg_end = boundary.min(end);
        if seg_end < boundary && !input.is_last {
            break;
        }
        let window = ParseWindow {
            ring: input.ring,
            position: start,
            num_bytes: seg_end - start,
            is_last: input.is_last && seg_end == end,
            max_backward_limit: limit,
        };
        let finder = hashers.get(params.hash_type)?;
        parse_segment(&window, params, finder, state, commands, ctx)?;
        start = seg_end;
    }
    state.unparsed_len = end - start;

    // Nothing left to parse, but the carried run still needs a command.
    if input.is_last && state.last_insert_len > 0 {
        commands.try_reserve(1)?;
        commands.push(Command::insert_only(state.last_insert_len));
        state.num_literals += state.last_insert_len;
        state.num_commands += 1;
        state.last_insert_len = 0;
    }

    displaylevel!(
        4,
        "backref: q{} {} bytes at {} -> {} commands, {} literals pending, {} bytes unparsed\n",
        params.quality,
        input.num_bytes,
        input.position,
        state.num_commands - before,
        state.last_insert_len,
        state.unparsed_len
    );
    Ok(())
}

fn parse_segment(
    window: &ParseWindow<'_, '_>,
    params: &BackrefParams,
    finder: &mut dyn MatchFinder,
    state: &mut StreamState,
    commands: &mut Vec<Command>,
    ctx: &mut BackwardReferencesContext,
) -> Result<(), BackrefError> {
    let finder_params = FinderParams { quality: params.quality, lgwin: params.lgwin };
    finder.init(&finder_params, window.position)?;
    finder.stitch_to_previous_block(window.ring, window.position, window.num_bytes);

    if params.is_optimal() {
        ctx.candidates.collect(finder, window)?;
        create_optimal_references(window, params.quality, state, commands, ctx)
    } else {
        create_greedy_references(finder, window, params.quality, state, commands).map(|_| ())
    }
}

fn create_optimal_references(
    window: &ParseWindow<'_, '_>,
    quality: i32,
    state: &mut StreamState,
    commands: &mut Vec<Command>,
    ctx: &mut BackwardReferencesContext,
) -> Result<(), BackrefError> {
    let (ring, position, num_bytes) = (window.ring, window.position, window.num_bytes);
    let orig_state = *state;
    let orig_len = commands.len();
    // First literal of this segment's first command.
    let first_literal = position - orig_state.last_insert_len;
    let passes = if quality >= MIN_QUALITY_FOR_TWO_PASSES { 2 } else { 1 };

    for pass in 0..passes {
        if pass == 0 {
            if ctx.histograms.is_empty() {
                ctx.model.set_from_literal_costs(ring, position, num_bytes)?;
            } else {
                ctx.model.set_from_histograms(&ctx.histograms, ring, position, num_bytes)?;
            }
        } else {
            ctx.pass_histograms.clone_from(&ctx.histograms);
            ctx.pass_histograms.add_commands(ring, first_literal, &commands[orig_len..]);
            ctx.model.set_from_histograms(&ctx.pass_histograms, ring, position, num_bytes)?;
            *state = orig_state;
            commands.truncate(orig_len);
        }

        let cost = zopfli_iterate(
            window,
            &state.dist_cache,
            &ctx.candidates,
            &ctx.model,
            &mut ctx.queue,
            &mut ctx.nodes,
        )?;
        compute_shortest_path_from_nodes(num_bytes, &ctx.nodes, &mut ctx.backwards, &mut ctx.path)?;
        create_commands(window, &ctx.path, &ctx.nodes, state, commands)?;
        displaylevel!(4, "backref: pass {} cost {:.1} bits\n", pass, cost);
    }

    ctx.histograms.add_commands(ring, first_literal, &commands[orig_len..]);
    Ok(())
}
