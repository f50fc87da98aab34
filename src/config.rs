// config.rs: Compile-time configuration constants and the match-finder table.
//
// Defaults here can be overridden at runtime by the BACKREF_QUALITY,
// BACKREF_LGWIN and BACKREF_NBWORKERS environment variables, or by the
// matching command-line flags.

// Default parse quality (full two-pass optimal parse).
// Can be overridden by BACKREF_QUALITY or -q#.
pub const QUALITY_DEFAULT: i32 = 11;

pub const MIN_QUALITY: i32 = 0;
pub const MAX_QUALITY: i32 = 11;

// Qualities at or above this use the optimal parser; below it, greedy.
pub const MIN_QUALITY_FOR_OPTIMAL: i32 = 10;

// Qualities at or above this run a second optimal pass priced from the
// commands of the first.
pub const MIN_QUALITY_FOR_TWO_PASSES: i32 = 11;

// Default window exponent: copies reach back up to 2^22 - 16 bytes.
// Can be overridden by BACKREF_LGWIN or -w#.
pub const LGWIN_DEFAULT: u32 = 22;

pub const MIN_LGWIN: u32 = 10;
pub const MAX_LGWIN: u32 = 24;

// Default block exponent used by the CLI when feeding a file through the
// engine (one call per 2^lgblock bytes).
pub const LGBLOCK_DEFAULT: u32 = 16;

pub const MIN_LGBLOCK: u32 = 16;
pub const MAX_LGBLOCK: u32 = 24;

// The engine parses the stream in stretches of 2^LGSEGMENT bytes aligned to
// multiples of 2^LGSEGMENT.  A non-final call leaves an unfinished segment
// unparsed for the next call, so the parse never depends on where calls
// split the stream.
pub const LGSEGMENT: u32 = 16;

// Default number of worker threads; 0 = one per logical CPU.
// Can be overridden by BACKREF_NBWORKERS or -j#.
pub const NB_WORKERS_DEFAULT: usize = 0;

// Maximum number of worker threads selectable at runtime.
pub const NB_WORKERS_MAX: usize = 200;

// Start-position ring capacity exponent used by the optimal parser.
pub const START_RING_BITS: u32 = 3;

// A position only enters the start ring when its cost difference is within
// this many bits of the best one already held.
pub const START_RING_SLACK: f64 = 24.0;

// ─────────────────────────────────────────────────────────────────────────────
// Match-finder parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Shape of one hash-chain match finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherParams {
    /// log2 of the number of hash buckets.
    pub bucket_bits: u32,
    /// Chain entries examined per lookup.
    pub chain_depth: usize,
    /// Distance-cache short codes tried before walking the chain.
    pub num_last_distances_to_check: usize,
}

#[rustfmt::skip]
static HASHER_TABLE: [HasherParams; 10] = [
    HasherParams { bucket_bits: 16, chain_depth:   1, num_last_distances_to_check:  1 }, /* 1 */
    HasherParams { bucket_bits: 16, chain_depth:   2, num_last_distances_to_check:  1 }, /* 2 */
    HasherParams { bucket_bits: 16, chain_depth:   4, num_last_distances_to_check:  1 }, /* 3 */
    HasherParams { bucket_bits: 17, chain_depth:   4, num_last_distances_to_check:  1 }, /* 4 */
    HasherParams { bucket_bits: 14, chain_depth:  16, num_last_distances_to_check:  4 }, /* 5 */
    HasherParams { bucket_bits: 14, chain_depth:  32, num_last_distances_to_check:  4 }, /* 6 */
    HasherParams { bucket_bits: 15, chain_depth:  64, num_last_distances_to_check: 10 }, /* 7 */
    HasherParams { bucket_bits: 15, chain_depth: 128, num_last_distances_to_check: 10 }, /* 8 */
    HasherParams { bucket_bits: 15, chain_depth: 256, num_last_distances_to_check: 16 }, /* 9 */
    HasherParams { bucket_bits: 17, chain_depth: 128, num_last_distances_to_check: 16 }, /* 10 */
];

/// Parameters of the built-in finder registered under `hash_type`, or
/// `None` when no built-in finder has that identifier.
pub fn hasher_params(hash_type: i32) -> Option<HasherParams> {
    if (1..=HASHER_TABLE.len() as i32).contains(&hash_type) {
        Some(HASHER_TABLE[hash_type as usize - 1])
    } else {
        None
    }
}

/// Default match-finder identifier for a quality level.
pub fn hash_type_for_quality(quality: i32) -> i32 {
    quality.clamp(1, 10)
}
