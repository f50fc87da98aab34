//! Commands and their prefix symbols.
//!
//! A [`Command`] is "insert `insert_len` literals, then copy `copy_len`
//! bytes from `distance` back".  Alongside the raw lengths it carries the
//! symbols the entropy coder will emit for it, which the cost model also
//! needs:
//!
//! - the combined insert/copy prefix (704-symbol alphabet), whose low block
//!   (`< 128`) additionally means "reuse the last distance";
//! - the distance prefix (520-symbol alphabet) and its extra-bits word,
//!   packed as `nbits << 24 | value`.

use super::types::NUM_DISTANCE_SHORT_CODES;

// ─────────────────────────────────────────────────────────────────────────────
// Length code tables
// ─────────────────────────────────────────────────────────────────────────────

/// First insert length of each insert code.
pub const INSERT_BASE: [u32; 24] = [
    0, 1, 2, 3, 4, 5, 6, 8, 10, 14, 18, 26, 34, 50, 66, 98, 130, 194, 322, 578, 1090, 2114, 6210,
    22594,
];

/// Extra bits carried by each insert code.
pub const INSERT_EXTRA: [u32; 24] = [
    0, 0, 0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 7, 8, 9, 10, 12, 14, 24,
];

/// First copy length of each copy code.
pub const COPY_BASE: [u32; 24] = [
    2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 14, 18, 22, 30, 38, 54, 70, 102, 134, 198, 326, 582, 1094, 2118,
];

/// Extra bits carried by each copy code.
pub const COPY_EXTRA: [u32; 24] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 7, 8, 9, 10, 24,
];

/// Copy-length code an insert-only command is coded with.
const INSERT_ONLY_COPY_LEN_CODE: u32 = 4;

#[inline(always)]
fn log2_floor_nonzero(v: usize) -> u32 {
    debug_assert!(v > 0);
    usize::BITS - 1 - v.leading_zeros()
}

/// Insert code for an insert run of `insertlen` bytes.
pub fn insert_length_code(insertlen: usize) -> u16 {
    if insertlen < 6 {
        insertlen as u16
    } else if insertlen < 130 {
        let nbits = log2_floor_nonzero(insertlen - 2) - 1;
        ((nbits << 1) as usize + ((insertlen - 2) >> nbits) + 2) as u16
    } else if insertlen < 2114 {
        (log2_floor_nonzero(insertlen - 66) + 10) as u16
    } else if insertlen < 6210 {
        21
    } else if insertlen < 22594 {
        22
    } else {
        23
    }
}

/// Copy code for a copy of `copylen` (≥ 2) bytes.
pub fn copy_length_code(copylen: usize) -> u16 {
    debug_assert!(copylen >= 2);
    if copylen < 10 {
        (copylen - 2) as u16
    } else if copylen < 134 {
        let nbits = log2_floor_nonzero(copylen - 6) - 1;
        ((nbits << 1) as usize + ((copylen - 6) >> nbits) + 4) as u16
    } else if copylen < 2118 {
        (log2_floor_nonzero(copylen - 70) + 12) as u16
    } else {
        23
    }
}

/// Merge an insert code and a copy code into one command prefix symbol.
///
/// The 704 symbols are eleven 64-symbol blocks; the first two blocks are
/// reserved for commands that reuse the last distance.
pub fn combine_length_codes(inscode: u16, copycode: u16, use_last_distance: bool) -> u16 {
    let bits64 = (copycode & 0x7) | ((inscode & 0x7) << 3);
    if use_last_distance && inscode < 8 && copycode < 16 {
        if copycode < 8 {
            bits64
        } else {
            bits64 | 64
        }
    } else {
        // Block index 0..8 → block start K·64 with K = 2,3,6,4,5,8,7,9,10.
        // The per-block correction K - index - 1 fits in two bits and is
        // packed into the magic constant.
        let offset = 2 * ((copycode as u32 >> 3) + 3 * (inscode as u32 >> 3));
        let offset = (offset << 5) + 0x40 + ((0x0052_0D40u32 >> offset) & 0xC0);
        offset as u16 | bits64
    }
}

/// Command prefix for the given lengths.
#[inline]
pub fn command_prefix(insertlen: usize, copylen_code: usize, use_last_distance: bool) -> u16 {
    combine_length_codes(
        insert_length_code(insertlen),
        copy_length_code(copylen_code),
        use_last_distance,
    )
}

/// Distance prefix symbol and extra-bits word for `distance_code`.
pub fn prefix_encode_copy_distance(distance_code: usize) -> (u16, u32) {
    if distance_code < NUM_DISTANCE_SHORT_CODES {
        return (distance_code as u16, 0);
    }
    let dist = (1usize << 2) + distance_code - NUM_DISTANCE_SHORT_CODES;
    let bucket = log2_floor_nonzero(dist) - 1;
    let prefix = (dist >> bucket) & 1;
    let offset = (2 + prefix) << bucket;
    let nbits = bucket;
    let code = NUM_DISTANCE_SHORT_CODES + 2 * (nbits as usize - 1) + prefix;
    let extra = (nbits << 24) | (dist - offset) as u32;
    (code as u16, extra)
}

// ─────────────────────────────────────────────────────────────────────────────
// Command
// ─────────────────────────────────────────────────────────────────────────────

/// One insert-then-copy instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    /// Literal bytes inserted before the copy.
    pub insert_len: u32,
    /// Bytes copied; 0 for the insert-only command that closes a stream.
    pub copy_len: u32,
    /// Length the copy is coded as (equal to `copy_len` here).
    pub copy_len_code: u32,
    /// Short code `0..16` or `distance + 15`.
    pub distance_code: u32,
    /// Combined insert/copy prefix symbol.
    pub cmd_prefix: u16,
    /// Distance prefix symbol.
    pub dist_prefix: u16,
    /// Distance extra bits, `nbits << 24 | value`.
    pub dist_extra: u32,
}

impl Command {
    pub fn new(insert_len: usize, copy_len: usize, copy_len_code: usize, distance_code: usize) -> Self {
        let (dist_prefix, dist_extra) = prefix_encode_copy_distance(distance_code);
        Command {
            insert_len: insert_len as u32,
            copy_len: copy_len as u32,
            copy_len_code: copy_len_code as u32,
            distance_code: distance_code as u32,
            cmd_prefix: command_prefix(insert_len, copy_len_code, dist_prefix == 0),
            dist_prefix,
            dist_extra,
        }
    }

    /// A trailing literal run with no copy.
    pub fn insert_only(insert_len: usize) -> Self {
        Command {
            insert_len: insert_len as u32,
            copy_len: 0,
            copy_len_code: 0,
            distance_code: 0,
            cmd_prefix: command_prefix(insert_len, INSERT_ONLY_COPY_LEN_CODE as usize, false),
            dist_prefix: NUM_DISTANCE_SHORT_CODES as u16,
            dist_extra: 0,
        }
    }

    #[inline]
    pub fn is_insert_only(&self) -> bool {
        self.copy_len == 0
    }

    /// True when the prefix symbol itself implies "reuse the last distance".
    #[inline]
    pub fn uses_last_distance(&self) -> bool {
        self.cmd_prefix < 128
    }

    /// Whether the distance is sent through the distance cache.
    #[inline]
    pub fn is_short_code(&self) -> bool {
        !self.is_insert_only() && (self.distance_code as usize) < NUM_DISTANCE_SHORT_CODES
    }

    /// Bytes of output this command produces.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.insert_len as usize + self.copy_len as usize
    }
}
