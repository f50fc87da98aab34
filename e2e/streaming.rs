//! E2E Test Suite: streaming over several calls
//!
//! Drives `create_backward_references` the way an encoder does: one call per
//! block, the same `StreamState`, `Hashers` and context threaded through.
//! Validates that:
//! - a split stream parses to the same commands as the whole stream, at
//!   greedy and optimal qualities, wherever the split falls
//! - a copy in flight at a call boundary is not cut short
//! - a non-final call holds back an unfinished segment, and parses the
//!   segments it completes
//! - no copy straddles a segment boundary
//! - a masked ring buffer that reuses its storage replays correctly

use backref::backref::{
    create_backward_references, BackrefParams, BackwardReferencesContext, Command, Hashers,
    InputBlock, RingBuffer, StreamState,
};
use backref::cli::replay::verify_commands;
use backref::config::LGSEGMENT;

const SEGMENT: usize = 1 << LGSEGMENT;

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn mixed_text(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    let mut x = 0x2545_f491u32;
    while out.len() < len {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        match x % 4 {
            0 => out.extend_from_slice(b"<item id=\"42\">value</item>\n"),
            1 => out.extend_from_slice(b"<item id=\"7\">other</item>\n"),
            2 => out.push(b'a' + (x >> 8) as u8 % 26),
            _ => out.extend_from_slice(format!("{}", x % 1000).as_bytes()),
        }
    }
    out.truncate(len);
    out
}

/// Parse `data` over a flat view, cutting it at `splits`.
fn parse_split(data: &[u8], splits: &[usize], quality: i32) -> (Vec<Command>, StreamState) {
    let ring = RingBuffer::flat(data);
    let params = BackrefParams::new(quality, 16);
    let mut hashers = Hashers::new();
    let mut ctx = BackwardReferencesContext::new();
    let mut state = StreamState::default();
    let mut commands = Vec::new();
    let mut bounds = splits.to_vec();
    bounds.push(data.len());
    let mut position = 0;
    for &end in &bounds {
        let input = InputBlock::new(&ring, position, end - position, end == data.len());
        create_backward_references(&input, &params, &mut hashers, &mut state, &mut commands, &mut ctx)
            .unwrap();
        position = end;
    }
    (commands, state)
}

/// `(start, end)` of every copy in `commands`.
fn copy_spans(commands: &[Command]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut pos = 0usize;
    for cmd in commands {
        pos += cmd.insert_len as usize;
        if !cmd.is_insert_only() {
            spans.push((pos, pos + cmd.copy_len as usize));
        }
        pos += cmd.copy_len as usize;
    }
    spans
}

// ─────────────────────────────────────────────────────────────────────────────
// Split versus whole
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_split_matches_whole() {
    let data = mixed_text(SEGMENT + 20_000);
    let split_sets: [&[usize]; 4] = [
        &[2_000],
        &[SEGMENT],
        &[SEGMENT - 1, SEGMENT + 1],
        &[777, 40_000, SEGMENT + 5_000, SEGMENT + 5_001],
    ];
    for quality in [5, 10, 11] {
        let (whole, whole_state) = parse_split(&data, &[], quality);
        for splits in split_sets {
            let (split, split_state) = parse_split(&data, splits, quality);
            assert_eq!(split, whole, "quality {quality} splits {splits:?}");
            assert_eq!(split_state, whole_state, "quality {quality} splits {splits:?}");
        }
        verify_commands(&whole, &data, 16).unwrap_or_else(|e| panic!("quality {quality}: {e}"));
    }
}

#[test]
fn test_split_inside_a_copy() {
    let data = mixed_text(12_000);
    for quality in [5, 10, 11] {
        let (whole, whole_state) = parse_split(&data, &[], quality);
        let &(start, end) = copy_spans(&whole)
            .iter()
            .find(|(start, end)| end - start >= 8 && *start > 1_000)
            .expect("a copy of at least 8 bytes");
        let cut = start + (end - start) / 2;

        let (split, split_state) = parse_split(&data, &[cut], quality);
        assert!(copy_spans(&split).contains(&(start, end)), "quality {quality}: copy cut at {cut}");
        assert_eq!(split, whole, "quality {quality}");
        assert_eq!(split_state.dist_cache, whole_state.dist_cache, "quality {quality}");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Segments
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unfinished_segment_is_held_back() {
    let data = mixed_text(5_000);
    let ring = RingBuffer::flat(&data);
    let params = BackrefParams::new(11, 16);
    let mut hashers = Hashers::new();
    let mut ctx = BackwardReferencesContext::new();
    let mut state = StreamState::default();
    let mut commands = Vec::new();

    let first = InputBlock::new(&ring, 0, 64, false);
    create_backward_references(&first, &params, &mut hashers, &mut state, &mut commands, &mut ctx)
        .unwrap();
    assert!(commands.is_empty());
    assert_eq!(state.unparsed_len, 64);
    assert_eq!(state.last_insert_len, 0);

    let rest = InputBlock::new(&ring, 64, data.len() - 64, true);
    create_backward_references(&rest, &params, &mut hashers, &mut state, &mut commands, &mut ctx)
        .unwrap();
    assert_eq!(state.unparsed_len, 0);
    assert_eq!(commands, parse_split(&data, &[], 11).0);
}

#[test]
fn test_completed_segment_is_parsed_early() {
    let data = mixed_text(SEGMENT + 300);
    for quality in [5, 11] {
        let ring = RingBuffer::flat(&data);
        let params = BackrefParams::new(quality, 16);
        let mut hashers = Hashers::new();
        let mut ctx = BackwardReferencesContext::new();
        let mut state = StreamState::default();
        let mut commands = Vec::new();

        let input = InputBlock::new(&ring, 0, SEGMENT + 100, false);
        create_backward_references(&input, &params, &mut hashers, &mut state, &mut commands, &mut ctx)
            .unwrap();
        assert!(!commands.is_empty(), "quality {quality}");
        assert_eq!(state.unparsed_len, 100, "quality {quality}");
        let covered: usize = commands.iter().map(Command::total_len).sum();
        assert_eq!(covered + state.last_insert_len, SEGMENT, "quality {quality}");
    }
}

#[test]
fn test_copies_stay_inside_their_segment() {
    let data = mixed_text(3 * SEGMENT + 1_000);
    for quality in [5, 11] {
        let (commands, _) = parse_split(&data, &[], quality);
        for (start, end) in copy_spans(&commands) {
            let boundary = (start / SEGMENT + 1) * SEGMENT;
            assert!(end <= boundary, "quality {quality}: copy {start}..{end}");
        }
    }
}

#[test]
fn test_many_small_calls_replay() {
    let data = mixed_text(40_000);
    let splits: Vec<usize> = (1..40).map(|k| k * 1_000 - (k % 7) * 3).collect();
    for quality in [3, 5, 9, 10, 11] {
        let (commands, state) = parse_split(&data, &splits, quality);
        assert_eq!(state.last_insert_len, 0);
        assert_eq!(state.unparsed_len, 0);
        verify_commands(&commands, &data, 16)
            .unwrap_or_else(|e| panic!("quality {quality}: {e}"));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Masked ring buffer
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_masked_ring_streaming() {
    const LGWIN: u32 = 16;
    // Window, one unfinished segment and the incoming block.
    const RING_BITS: u32 = 18;
    const BLOCK: usize = 1 << 15;
    let data = mixed_text(300_000);
    let mask = (1usize << RING_BITS) - 1;

    for quality in [5, 11] {
        let params = BackrefParams::new(quality, LGWIN);
        let mut storage = vec![0u8; 1 << RING_BITS];
        let mut hashers = Hashers::new();
        let mut ctx = BackwardReferencesContext::new();
        let mut state = StreamState::default();
        let mut commands = Vec::new();

        let mut position = 0;
        while position < data.len() {
            let n = BLOCK.min(data.len() - position);
            for (k, &b) in data[position..position + n].iter().enumerate() {
                storage[(position + k) & mask] = b;
            }
            let ring = RingBuffer::new(&storage, mask);
            let input = InputBlock::new(&ring, position, n, position + n == data.len());
            create_backward_references(&input, &params, &mut hashers, &mut state, &mut commands, &mut ctx)
                .unwrap();
            position += n;
        }

        verify_commands(&commands, &data, LGWIN)
            .unwrap_or_else(|e| panic!("quality {quality}: {e}"));
        assert_eq!(state.num_commands, commands.len());
        assert_eq!(commands, parse_split(&data, &[], quality).0, "quality {quality}");
    }
}
