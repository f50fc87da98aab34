//! Per-byte literal cost estimate for a window.
//!
//! Each byte is priced from a zero-order histogram of its neighbourhood
//! (the bytes within `WINDOW_HALF` either side), so the curve follows the
//! statistics an adaptive coder would see locally instead of one global
//! distribution.  Text that is mostly UTF-8 gets a variant keeping separate
//! histograms for the lead byte and continuation bytes of multi-byte
//! sequences.

use super::cost::fast_log2;
use super::types::RingBuffer;

/// Fraction of bytes that must parse as UTF-8 for the UTF-8 model.
const MIN_UTF8_RATIO: f64 = 0.75;

const WINDOW_HALF: usize = 2000;
const WINDOW_HALF_UTF8: usize = 495;

/// Decode one UTF-8 sequence from `bytes`; returns `(symbol, bytes_read)`.
/// Invalid input yields a symbol above the Unicode range and consumes one
/// byte.
fn parse_as_utf8(bytes: &[u8]) -> (u32, usize) {
    let b0 = bytes[0] as u32;
    if b0 & 0x80 == 0 && b0 > 0 {
        return (b0, 1);
    }
    if bytes.len() > 1 && b0 & 0xe0 == 0xc0 && bytes[1] & 0xc0 == 0x80 {
        let symbol = ((b0 & 0x1f) << 6) | (bytes[1] as u32 & 0x3f);
        if symbol > 0x7f {
            return (symbol, 2);
        }
    }
    if bytes.len() > 2
        && b0 & 0xf0 == 0xe0
        && bytes[1] & 0xc0 == 0x80
        && bytes[2] & 0xc0 == 0x80
    {
        let symbol =
            ((b0 & 0x0f) << 12) | ((bytes[1] as u32 & 0x3f) << 6) | (bytes[2] as u32 & 0x3f);
        if symbol > 0x7ff {
            return (symbol, 3);
        }
    }
    if bytes.len() > 3
        && b0 & 0xf8 == 0xf0
        && bytes[1] & 0xc0 == 0x80
        && bytes[2] & 0xc0 == 0x80
        && bytes[3] & 0xc0 == 0x80
    {
        let symbol = ((b0 & 0x07) << 18)
            | ((bytes[1] as u32 & 0x3f) << 12)
            | ((bytes[2] as u32 & 0x3f) << 6)
            | (bytes[3] as u32 & 0x3f);
        if symbol > 0xffff && symbol <= 0x10ffff {
            return (symbol, 4);
        }
    }
    (0x110000 | b0, 1)
}

/// Whether more than `min_fraction` of `[pos, pos+len)` is valid UTF-8.
pub fn is_mostly_utf8(ring: &RingBuffer<'_>, pos: usize, len: usize, min_fraction: f64) -> bool {
    let mut size_utf8 = 0usize;
    let mut i = 0usize;
    let mut buf = [0u8; 4];
    while i < len {
        let avail = (len - i).min(4);
        for (k, b) in buf.iter_mut().enumerate().take(avail) {
            *b = ring.byte(pos + i + k);
        }
        let (symbol, bytes_read) = parse_as_utf8(&buf[..avail]);
        i += bytes_read;
        if symbol < 0x110000 {
            size_utf8 += bytes_read;
        }
    }
    size_utf8 as f64 > min_fraction * len as f64
}

/// Histogram a byte goes to, given the two bytes before it.
///
/// 0 for ASCII and lead bytes, 1 for the byte after a lead byte, 2 for the
/// third byte of a three-byte sequence; clamped to `clamp`.
#[inline]
fn utf8_position(last: usize, c: usize, clamp: usize) -> usize {
    if c < 128 {
        0
    } else if c >= 192 {
        clamp.min(1)
    } else if last < 0xe0 {
        0
    } else {
        clamp.min(2)
    }
}

/// How many UTF-8 histograms are worth keeping for this window (0..=1).
fn decide_multi_byte_stats_level(ring: &RingBuffer<'_>, pos: usize, len: usize) -> usize {
    let mut counts = [0usize; 3];
    let mut last_c = 0usize;
    for i in 0..len {
        let c = ring.byte(pos + i) as usize;
        counts[utf8_position(last_c, c, 2)] += 1;
        last_c = c;
    }
    if counts[1] + counts[2] < 25 {
        0
    } else {
        // Two histograms compress better than three in practice.
        1
    }
}

#[inline]
fn squash(cost: f64) -> f64 {
    if cost < 1.0 {
        cost * 0.5 + 0.5
    } else {
        cost
    }
}

fn estimate_utf8(ring: &RingBuffer<'_>, pos: usize, len: usize, cost: &mut [f64]) {
    let max_utf8 = decide_multi_byte_stats_level(ring, pos, len);
    let mut histogram = [[0usize; 256]; 3];
    let mut in_window = [0usize; 3];

    // Histogram selector for the byte at window offset `k`; bytes before the
    // window start count as zero.
    let bucket_of = |k: usize| -> usize {
        let c = if k >= 1 { ring.byte(pos + k - 1) as usize } else { 0 };
        let last = if k >= 2 { ring.byte(pos + k - 2) as usize } else { 0 };
        utf8_position(last, c, max_utf8)
    };

    for k in 0..WINDOW_HALF_UTF8.min(len) {
        let b = bucket_of(k);
        histogram[b][ring.byte(pos + k) as usize] += 1;
        in_window[b] += 1;
    }

    for i in 0..len {
        if i >= WINDOW_HALF_UTF8 {
            let k = i - WINDOW_HALF_UTF8;
            let b = bucket_of(k);
            histogram[b][ring.byte(pos + k) as usize] -= 1;
            in_window[b] -= 1;
        }
        if i + WINDOW_HALF_UTF8 < len {
            let k = i + WINDOW_HALF_UTF8;
            let b = bucket_of(k);
            histogram[b][ring.byte(pos + k) as usize] += 1;
            in_window[b] += 1;
        }
        let b = bucket_of(i);
        let histo = histogram[b][ring.byte(pos + i) as usize].max(1);
        let mut lit_cost = fast_log2(in_window[b]) - fast_log2(histo) + 0.02905;
        lit_cost = squash(lit_cost);
        // The first bytes of a stream are priced higher; the statistics are
        // still settling there.
        if i < 2000 {
            lit_cost += 0.7 - ((2000 - i) as f64 / 2000.0 * 0.35);
        }
        cost[i] = lit_cost;
    }
}

/// Fill `cost[..len]` with the estimated bit cost of each byte in
/// `[pos, pos+len)`.
pub fn estimate_bit_costs_for_literals(
    ring: &RingBuffer<'_>,
    pos: usize,
    len: usize,
    cost: &mut [f64],
) {
    debug_assert!(cost.len() >= len);
    if is_mostly_utf8(ring, pos, len, MIN_UTF8_RATIO) {
        estimate_utf8(ring, pos, len, cost);
        return;
    }

    let mut histogram = [0usize; 256];
    let mut in_window = WINDOW_HALF.min(len);
    for k in 0..in_window {
        histogram[ring.byte(pos + k) as usize] += 1;
    }

    for i in 0..len {
        if i >= WINDOW_HALF {
            histogram[ring.byte(pos + i - WINDOW_HALF) as usize] -= 1;
            in_window -= 1;
        }
        if i + WINDOW_HALF < len {
            histogram[ring.byte(pos + i + WINDOW_HALF) as usize] += 1;
            in_window += 1;
        }
        let histo = histogram[ring.byte(pos + i) as usize].max(1);
        cost[i] = squash(fast_log2(in_window) - fast_log2(histo) + 0.029);
    }
}
