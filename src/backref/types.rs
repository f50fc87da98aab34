//! Shared constants, the ring-buffer view, and the engine error type.
//!
//! Everything in here is consumed by more than one stage of the
//! backward-reference pipeline:
//!   - alphabet sizes for the three histograms (literal, command prefix,
//!     distance prefix)
//!   - window limits and the `2^lgwin - 16` maximum backward distance
//!   - [`RingBuffer`], the masked view over the caller's sliding window
//!   - [`ParseWindow`], the stretch of the stream one parser run covers
//!   - [`BackrefError`], the only failure the engine reports

use std::collections::TryReserveError;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Alphabet sizes
// ─────────────────────────────────────────────────────────────────────────────

/// Literal alphabet: one symbol per byte value.
pub const NUM_LITERAL_SYMBOLS: usize = 256;

/// Combined insert-and-copy length prefix alphabet.
pub const NUM_COMMAND_PREFIXES: usize = 704;

/// Distance prefix alphabet (16 short codes + long-distance buckets).
pub const NUM_DISTANCE_PREFIXES: usize = 520;

/// Number of distance codes that refer to the distance cache.
pub const NUM_DISTANCE_SHORT_CODES: usize = 16;

// ─────────────────────────────────────────────────────────────────────────────
// Window / parse limits
// ─────────────────────────────────────────────────────────────────────────────

pub use crate::config::{MAX_LGWIN, MIN_LGWIN};

/// Distances in the last 16 bytes of the window are reserved.
pub const WINDOW_GAP: usize = 16;

/// Bytes hashed per position by every match finder.  A position can only be
/// looked up once this many bytes starting at it are inside the window.
pub const HASH_TYPE_LENGTH: usize = 4;

/// Shortest copy the command alphabet can express.
pub const MIN_COPY_LENGTH: usize = 2;

/// Matches longer than this are taken whole by the optimal parser and the
/// positions they cover are not examined.
pub const MAX_ZOPFLI_LEN: usize = 325;

/// Largest distance a copy may use for the given window exponent.
#[inline]
pub fn max_backward_limit(lgwin: u32) -> usize {
    debug_assert!((MIN_LGWIN..=MAX_LGWIN).contains(&lgwin));
    (1usize << lgwin) - WINDOW_GAP
}

// ─────────────────────────────────────────────────────────────────────────────
// RingBuffer
// ─────────────────────────────────────────────────────────────────────────────

/// Read-only view of the caller's sliding window.
///
/// Positions are absolute stream offsets; the byte for position `p` lives at
/// `data[p & mask]`.  The caller guarantees that every position the engine is
/// asked about (the current window plus up to `2^lgwin` bytes of history)
/// maps to a valid, up-to-date slot.
#[derive(Clone, Copy, Debug)]
pub struct RingBuffer<'a> {
    data: &'a [u8],
    mask: usize,
}

impl<'a> RingBuffer<'a> {
    /// Wrap `data` with the wraparound `mask` (`capacity - 1`).
    pub fn new(data: &'a [u8], mask: usize) -> Self {
        debug_assert!(mask == usize::MAX || (mask + 1).is_power_of_two());
        Self { data, mask }
    }

    /// A view over a flat buffer holding the whole stream; no wraparound.
    pub fn flat(data: &'a [u8]) -> Self {
        Self { data, mask: usize::MAX }
    }

    #[inline]
    pub fn mask(&self) -> usize {
        self.mask
    }

    /// Byte at absolute position `pos`.
    #[inline(always)]
    pub fn byte(&self, pos: usize) -> u8 {
        self.data[pos & self.mask]
    }

    /// Little-endian 32-bit word starting at `pos`, read through the mask.
    #[inline(always)]
    pub fn read_u32(&self, pos: usize) -> u32 {
        u32::from_le_bytes([
            self.byte(pos),
            self.byte(pos + 1),
            self.byte(pos + 2),
            self.byte(pos + 3),
        ])
    }

    /// Length of the common run of `earlier..` and `later..`, capped at `limit`.
    #[inline]
    pub fn match_len(&self, earlier: usize, later: usize, limit: usize) -> usize {
        let mut len = 0;
        while len < limit && self.byte(earlier + len) == self.byte(later + len) {
            len += 1;
        }
        len
    }
}

/// Fixed inputs of one parse over `[position, position+num_bytes)`.
pub struct ParseWindow<'r, 'a> {
    pub ring: &'r RingBuffer<'a>,
    pub position: usize,
    pub num_bytes: usize,
    /// Nothing follows the window: the trailing literal run is flushed.
    pub is_last: bool,
    pub max_backward_limit: usize,
}

impl ParseWindow<'_, '_> {
    /// One past the last position of the window.
    #[inline]
    pub fn end(&self) -> usize {
        self.position + self.num_bytes
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors produced by the backward-reference engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackrefError {
    /// A scratch buffer could not grow to the size the window requires.
    Allocation(TryReserveError),
    /// No match finder is registered under this hash type.
    UnknownHasher(i32),
    /// The stream state claims more unparsed bytes than precede `position`.
    UnparsedBeforeStart { position: usize, unparsed: usize },
}

impl fmt::Display for BackrefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackrefError::Allocation(e) => write!(f, "scratch allocation failed: {e}"),
            BackrefError::UnknownHasher(t) => write!(f, "unknown hash type {t}"),
            BackrefError::UnparsedBeforeStart { position, unparsed } => write!(
                f,
                "{unparsed} unparsed bytes carried into a call at position {position}"
            ),
        }
    }
}

impl std::error::Error for BackrefError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackrefError::Allocation(e) => Some(e),
            BackrefError::UnknownHasher(_) | BackrefError::UnparsedBeforeStart { .. } => None,
        }
    }
}

impl From<TryReserveError> for BackrefError {
    fn from(e: TryReserveError) -> Self {
        BackrefError::Allocation(e)
    }
}

/// Clear `buf` and refill it with `len` copies of `value`, reporting
/// allocation failure instead of aborting.
pub(crate) fn reset_scratch<T: Clone>(
    buf: &mut Vec<T>,
    len: usize,
    value: T,
) -> Result<(), BackrefError> {
    buf.clear();
    buf.try_reserve(len)?;
    buf.resize(len, value);
    Ok(())
}
