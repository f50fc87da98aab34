// Tests for the greedy parser.
//
// Coverage:
//   - a non-final call carries its trailing literals forward
//   - low qualities never send adjusted short distance codes
//   - the distance cache in the stream state tracks the emitted copies

use backref::backref::greedy::create_greedy_references;
use backref::backref::hasher::FinderParams;
use backref::backref::{
    max_backward_limit, DistanceCache, Hashers, MatchFinder, ParseWindow, RingBuffer,
    StreamState,
};
use backref::Command;

fn text(len: usize) -> Vec<u8> {
    b"Sphinx of black quartz, judge my vow. Pack my box with five dozen liquor jugs. "
        .iter()
        .copied()
        .cycle()
        .enumerate()
        .map(|(i, b)| if i % 97 == 0 { b'#' } else { b })
        .take(len)
        .collect()
}

fn greedy(data: &[u8], quality: i32, is_last: bool) -> (Vec<Command>, StreamState) {
    let ring = RingBuffer::flat(data);
    let hash_type = backref::config::hash_type_for_quality(quality);
    let mut hashers = Hashers::new();
    let finder = hashers.get(hash_type).unwrap();
    finder.init(&FinderParams { quality, lgwin: 16 }, 0).unwrap();
    let window = ParseWindow {
        ring: &ring,
        position: 0,
        num_bytes: data.len(),
        is_last,
        max_backward_limit: max_backward_limit(16),
    };
    let mut state = StreamState::default();
    let mut commands = Vec::new();
    create_greedy_references(finder, &window, quality, &mut state, &mut commands).unwrap();
    (commands, state)
}

#[test]
fn trailing_literals_are_carried() {
    let mut data = text(4_000);
    data.extend((0..50u8).map(|b| b.wrapping_mul(37) | 0x80));
    let (commands, state) = greedy(&data, 6, false);
    assert!(state.last_insert_len >= 50);
    assert!(commands.iter().all(|c| !c.is_insert_only()));
    let covered: usize = commands.iter().map(Command::total_len).sum();
    assert_eq!(covered + state.last_insert_len, data.len());
}

#[test]
fn low_quality_skips_adjusted_codes() {
    let data = text(8_000);
    for quality in [1, 2, 3] {
        let (commands, _) = greedy(&data, quality, true);
        assert!(commands
            .iter()
            .filter(|c| !c.is_insert_only())
            .all(|c| c.distance_code < 4 || c.distance_code >= 16));
    }
}

#[test]
fn state_cache_follows_copies() {
    let data = text(3_000);
    let (commands, state) = greedy(&data, 7, true);
    let mut cache = DistanceCache::default();
    let mut pos = 0usize;
    for cmd in &commands {
        pos += cmd.insert_len as usize;
        if !cmd.is_insert_only() {
            let code = cmd.distance_code as usize;
            let distance = cache.resolve(code).unwrap();
            cache.update(distance, code, pos.min(max_backward_limit(16)));
        }
        pos += cmd.copy_len as usize;
    }
    assert_eq!(pos, data.len());
    assert_eq!(cache, state.dist_cache);
}
