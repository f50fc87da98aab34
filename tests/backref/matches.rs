// Tests for `MatchCandidates::collect`.
//
// Coverage:
//   - per-position counts add up to the flat candidate list
//   - candidates respect max length and distance
//   - a match longer than the parse limit collapses the positions it covers
//   - the finder is left primed for the next call

use backref::backref::hasher::FinderParams;
use backref::backref::types::MAX_ZOPFLI_LEN;
use backref::backref::{Hashers, MatchCandidates, MatchFinder, ParseWindow, RingBuffer};

fn collect(data: &[u8], quality: i32, lgwin: u32) -> MatchCandidates {
    let ring = RingBuffer::flat(data);
    let mut hashers = Hashers::new();
    let finder = hashers.get(10).unwrap();
    finder.init(&FinderParams { quality, lgwin }, 0).unwrap();
    let window = ParseWindow {
        ring: &ring,
        position: 0,
        num_bytes: data.len(),
        is_last: true,
        max_backward_limit: (1 << lgwin) - 16,
    };
    let mut candidates = MatchCandidates::new();
    candidates.collect(finder, &window).unwrap();
    candidates
}

#[test]
fn counts_cover_the_flat_list() {
    let data: Vec<u8> = b"the cat sat on the mat; the cat ate the rat. "
        .iter()
        .copied()
        .cycle()
        .take(2_000)
        .collect();
    let c = collect(&data, 11, 16);
    let total: usize = (0..data.len()).map(|i| c.count(i)).sum();
    assert_eq!(total, c.all().len());
    assert!(total > 0);
}

#[test]
fn candidates_stay_in_bounds() {
    let data: Vec<u8> = (0..5_000u32).map(|i| b"abcabdabe"[(i % 9) as usize] ^ (i / 700) as u8).collect();
    let c = collect(&data, 11, 10);
    let mut flat = c.all().iter();
    for i in 0..data.len() {
        let mut prev_len = 0;
        for _ in 0..c.count(i) {
            let m = flat.next().unwrap();
            assert!(m.length as usize <= data.len() - i);
            assert!(m.distance as usize <= i.min((1 << 10) - 16));
            assert!(m.length > prev_len, "lengths grow at {i}");
            prev_len = m.length;
        }
    }
}

#[test]
fn long_match_collapses_its_range() {
    let mut data: Vec<u8> = (0..100u32).map(|i| (i * 13 % 251) as u8).collect();
    let copy = data.clone();
    data.extend_from_slice(&copy);
    data.extend_from_slice(&copy);
    data.extend_from_slice(&copy);
    data.extend_from_slice(&copy);
    // A 400-byte repeat at offset 100.
    let c = collect(&data, 11, 16);
    assert_eq!(c.count(100), 1);
    let m = c.all()[c.all().len() - 1];
    assert_eq!(m.distance, 100);
    assert!(m.length as usize > MAX_ZOPFLI_LEN);
    assert!((101..data.len()).all(|i| c.count(i) == 0));
}
