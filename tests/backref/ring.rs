// Tests for the Start-Position Ring.
//
// Coverage:
//   - capacity follows the configured bit width
//   - once full, each push evicts the oldest entry
//   - lookups past the retained entries, or after a clear, come back empty
//   - min_costdiff only sees entries still retained

use backref::backref::StartPosRing;
use backref::config::START_RING_BITS;

#[test]
fn default_capacity_is_eight() {
    let ring = StartPosRing::new(START_RING_BITS);
    assert_eq!(ring.capacity(), 8);
    assert!(ring.is_empty());
    assert_eq!(ring.len(), 0);
}

#[test]
fn full_ring_evicts_oldest() {
    let mut ring = StartPosRing::new(START_RING_BITS);
    for pos in 0..10 {
        ring.push(pos, pos as f64);
    }
    assert_eq!(ring.len(), 8);
    assert_eq!(ring.get(0), Some(9));
    // 0 and 1 are gone.
    assert_eq!(ring.get(7), Some(2));
    assert!((0..ring.len()).all(|k| ring.get(k).is_some_and(|pos| pos >= 2)));
}

#[test]
fn lookup_past_len_is_none() {
    let mut ring = StartPosRing::new(START_RING_BITS);
    for pos in 1..=9 {
        ring.push(pos, 0.0);
    }
    // Nine pushes into eight slots: index 8 would wrap onto the newest.
    assert_eq!(ring.get(ring.len()), None);
    assert_eq!(ring.costdiff(ring.len()), None);

    let mut short = StartPosRing::new(START_RING_BITS);
    short.push(4, 1.0);
    assert_eq!(short.get(1), None);
}

#[test]
fn cleared_ring_hides_stale_slots() {
    let mut ring = StartPosRing::new(START_RING_BITS);
    for pos in 0..9 {
        ring.push(pos, -1.0);
    }
    ring.clear();
    assert_eq!(ring.len(), 0);
    assert_eq!(ring.get(0), None);
    assert_eq!(ring.min_costdiff(), None);

    ring.push(42, 2.0);
    assert_eq!(ring.get(0), Some(42));
    assert_eq!(ring.get(1), None);
    assert_eq!(ring.min_costdiff(), Some(2.0));
}

#[test]
fn min_costdiff_forgets_evicted_entries() {
    let mut ring = StartPosRing::new(1);
    ring.push(0, -5.0);
    ring.push(1, 3.0);
    assert_eq!(ring.min_costdiff(), Some(-5.0));
    ring.push(2, 4.0);
    assert_eq!(ring.min_costdiff(), Some(3.0));
    assert_eq!(ring.costdiff(0), Some(4.0));
}
