// Tests for `create_backward_references`, the engine entry point.
//
// Coverage:
//   - command lengths always sum to the input length, every quality
//   - every copy resolves to a distance inside the window and the replayed
//     stream equals the input
//   - runs of one byte collapse into a single copy
//   - data with no repeats yields a single insert-only command
//   - empty windows: nothing to do, or flushing the carried literal run
//   - unknown hash types are reported, not panicked on
//   - a stream state that does not fit the call is reported
//   - histograms only accumulate on the optimal path

use backref::backref::{
    create_backward_references, max_backward_limit, BackrefError, BackrefParams,
    BackwardReferencesContext, Command, DistanceCache, Hashers, InputBlock, RingBuffer,
    StreamState,
};
use backref::cli::replay::verify_commands;

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Words picked by a small LCG: text-like data with plenty of short repeats
/// and no long ones.
fn word_soup(len: usize, seed: u32) -> Vec<u8> {
    const WORDS: [&str; 16] = [
        "lorem ", "ipsum ", "dolor ", "sit ", "amet, ", "consectetur ", "adipiscing ", "elit. ",
        "sed ", "do ", "eiusmod ", "tempor ", "incididunt ", "ut ", "labore ", "magna ",
    ];
    let mut out = Vec::with_capacity(len + 16);
    let mut s = seed;
    while out.len() < len {
        s = s.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        out.extend_from_slice(WORDS[(s >> 16) as usize % WORDS.len()].as_bytes());
    }
    out.truncate(len);
    out
}

/// Parse `data` in one final call.
fn parse_whole(data: &[u8], quality: i32, lgwin: u32) -> (Vec<Command>, StreamState) {
    let ring = RingBuffer::flat(data);
    let params = BackrefParams::new(quality, lgwin);
    let mut hashers = Hashers::new();
    let mut ctx = BackwardReferencesContext::new();
    let mut state = StreamState::default();
    let mut commands = Vec::new();
    create_backward_references(
        &InputBlock::new(&ring, 0, data.len(), true),
        &params,
        &mut hashers,
        &mut state,
        &mut commands,
        &mut ctx,
    )
    .unwrap();
    (commands, state)
}

fn covered(commands: &[Command]) -> usize {
    commands.iter().map(Command::total_len).sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Whole-buffer properties
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn lengths_sum_to_input_at_every_quality() {
    let data = word_soup(20_000, 7);
    for quality in 0..=11 {
        let (commands, state) = parse_whole(&data, quality, 16);
        assert_eq!(covered(&commands), data.len(), "quality {quality}");
        assert_eq!(state.last_insert_len, 0, "quality {quality}");
        assert_eq!(state.num_commands, commands.len(), "quality {quality}");
    }
}

#[test]
fn every_parse_replays_to_the_input() {
    let data = word_soup(50_000, 99);
    for quality in [1, 4, 5, 9, 10, 11] {
        let (commands, _) = parse_whole(&data, quality, 12);
        verify_commands(&commands, &data, 12)
            .unwrap_or_else(|e| panic!("quality {quality}: {e}"));
    }
}

#[test]
fn distances_stay_inside_the_window() {
    let data = word_soup(30_000, 3);
    let lgwin = 10;
    let limit = max_backward_limit(lgwin);
    for quality in [5, 11] {
        let (commands, _) = parse_whole(&data, quality, lgwin);
        let mut cache = DistanceCache::default();
        let mut pos = 0usize;
        for cmd in &commands {
            pos += cmd.insert_len as usize;
            if !cmd.is_insert_only() {
                let code = cmd.distance_code as usize;
                let distance = cache.resolve(code).unwrap();
                assert!(distance >= 1 && distance <= pos.min(limit), "distance {distance} at {pos}");
                cache.update(distance, code, pos.min(limit));
            }
            pos += cmd.copy_len as usize;
        }
    }
}

#[test]
fn literal_counter_matches_commands() {
    let data = word_soup(10_000, 5);
    for quality in [5, 11] {
        let (commands, state) = parse_whole(&data, quality, 16);
        let literals: usize = commands.iter().map(|c| c.insert_len as usize).sum();
        assert_eq!(state.num_literals, literals);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Degenerate inputs
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn one_byte_run_is_a_single_copy_optimal() {
    let data = vec![b'a'; 1000];
    let (commands, _) = parse_whole(&data, 11, 16);
    assert_eq!(commands.len(), 1);
    let cmd = commands[0];
    assert_eq!((cmd.insert_len, cmd.copy_len), (1, 999));
    assert_eq!(DistanceCache::default().resolve(cmd.distance_code as usize), Some(1));
}

#[test]
fn one_byte_run_is_a_single_copy_greedy() {
    let data = vec![b'a'; 1000];
    let (commands, _) = parse_whole(&data, 5, 16);
    assert_eq!(commands.len(), 1);
    let cmd = commands[0];
    assert_eq!((cmd.insert_len, cmd.copy_len), (1, 999));
    assert_eq!(cmd.distance_code, 1 + 15);
}

#[test]
fn distinct_bytes_give_one_insert() {
    let data: Vec<u8> = (0..256u32).map(|i| (i * 7 % 256) as u8).collect();
    for quality in [2, 5, 10, 11] {
        let (commands, state) = parse_whole(&data, quality, 16);
        assert_eq!(commands.len(), 1, "quality {quality}");
        assert!(commands[0].is_insert_only());
        assert_eq!(commands[0].insert_len, 256);
        assert_eq!(state.dist_cache, DistanceCache::default());
    }
}

#[test]
fn tiny_inputs() {
    for len in 1..8 {
        let data = vec![b'z'; len];
        for quality in [5, 11] {
            let (commands, _) = parse_whole(&data, quality, 16);
            assert_eq!(covered(&commands), len, "len {len} quality {quality}");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Empty windows
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn empty_window_is_a_no_op() {
    let ring = RingBuffer::flat(&[]);
    let mut hashers = Hashers::new();
    let mut ctx = BackwardReferencesContext::new();
    let mut state = StreamState { last_insert_len: 5, ..StreamState::default() };
    let before = state;
    let mut commands = Vec::new();
    create_backward_references(
        &InputBlock::new(&ring, 0, 0, false),
        &BackrefParams::default(),
        &mut hashers,
        &mut state,
        &mut commands,
        &mut ctx,
    )
    .unwrap();
    assert!(commands.is_empty());
    assert_eq!(state, before);
}

#[test]
fn empty_final_window_flushes_carried_literals() {
    let data = b"abcdefgh";
    let ring = RingBuffer::flat(data);
    let mut hashers = Hashers::new();
    let mut ctx = BackwardReferencesContext::new();
    let mut state = StreamState { last_insert_len: 8, ..StreamState::default() };
    let mut commands = Vec::new();
    create_backward_references(
        &InputBlock::new(&ring, 8, 0, true),
        &BackrefParams::default(),
        &mut hashers,
        &mut state,
        &mut commands,
        &mut ctx,
    )
    .unwrap();
    assert_eq!(commands, vec![Command::insert_only(8)]);
    assert_eq!(state.last_insert_len, 0);
    assert_eq!(state.num_commands, 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors and context
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn unknown_hash_type_is_an_error() {
    let data = word_soup(100, 1);
    let ring = RingBuffer::flat(&data);
    let params = BackrefParams { hash_type: 42, ..BackrefParams::new(5, 16) };
    let mut state = StreamState::default();
    let mut commands = Vec::new();
    let err = create_backward_references(
        &InputBlock::new(&ring, 0, data.len(), true),
        &params,
        &mut Hashers::new(),
        &mut state,
        &mut commands,
        &mut BackwardReferencesContext::new(),
    )
    .unwrap_err();
    assert_eq!(err, BackrefError::UnknownHasher(42));
    assert!(commands.is_empty());
}

#[test]
fn unparsed_tail_must_precede_position() {
    let data = word_soup(100, 2);
    let ring = RingBuffer::flat(&data);
    let mut state = StreamState { unparsed_len: 10, ..StreamState::default() };
    let before = state;
    let mut commands = Vec::new();
    let err = create_backward_references(
        &InputBlock::new(&ring, 4, 50, true),
        &BackrefParams::default(),
        &mut Hashers::new(),
        &mut state,
        &mut commands,
        &mut BackwardReferencesContext::new(),
    )
    .unwrap_err();
    assert_eq!(err, BackrefError::UnparsedBeforeStart { position: 4, unparsed: 10 });
    assert!(commands.is_empty());
    assert_eq!(state, before);
}

#[test]
fn histograms_follow_the_optimal_path_only() {
    let data = word_soup(4_000, 11);
    let ring = RingBuffer::flat(&data);
    for (quality, expect_counts) in [(5, false), (10, true), (11, true)] {
        let mut ctx = BackwardReferencesContext::new();
        let mut state = StreamState::default();
        let mut commands = Vec::new();
        create_backward_references(
            &InputBlock::new(&ring, 0, data.len(), true),
            &BackrefParams::new(quality, 16),
            &mut Hashers::new(),
            &mut state,
            &mut commands,
            &mut ctx,
        )
        .unwrap();
        let counted: u32 = ctx.histograms().command().iter().sum();
        if expect_counts {
            assert_eq!(counted as usize, commands.len(), "quality {quality}");
            let literals: u32 = ctx.histograms().literal().iter().sum();
            assert_eq!(literals as usize, state.num_literals, "quality {quality}");
        } else {
            assert_eq!(counted, 0, "quality {quality}");
        }
    }
}

#[test]
fn reset_forgets_histograms() {
    let data = word_soup(2_000, 4);
    let ring = RingBuffer::flat(&data);
    let mut ctx = BackwardReferencesContext::new();
    let mut commands = Vec::new();
    create_backward_references(
        &InputBlock::new(&ring, 0, data.len(), true),
        &BackrefParams::new(10, 16),
        &mut Hashers::new(),
        &mut StreamState::default(),
        &mut commands,
        &mut ctx,
    )
    .unwrap();
    assert!(!ctx.histograms().is_empty());
    ctx.reset();
    assert!(ctx.histograms().is_empty());
    assert!(ctx.nodes().is_empty());
}

#[test]
fn registered_finder_is_used() {
    use backref::backref::HashChain;
    use backref::config::HasherParams;

    let data = word_soup(8_000, 21);
    let ring = RingBuffer::flat(&data);
    let mut hashers = Hashers::new();
    let params = HasherParams { bucket_bits: 12, chain_depth: 2, num_last_distances_to_check: 4 };
    hashers.register(77, Box::new(HashChain::new(params)));
    let mut state = StreamState::default();
    let mut commands = Vec::new();
    create_backward_references(
        &InputBlock::new(&ring, 0, data.len(), true),
        &BackrefParams { hash_type: 77, ..BackrefParams::new(6, 16) },
        &mut hashers,
        &mut state,
        &mut commands,
        &mut BackwardReferencesContext::new(),
    )
    .unwrap();
    verify_commands(&commands, &data, 16).unwrap();
}
