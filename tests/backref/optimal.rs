// Tests for the optimal parser phases driven one by one.
//
// Coverage:
//   - the terminal node never costs more than the all-literal path
//   - backtracked steps tile the window exactly
//   - the carried literal run is absorbed by the first command
//   - a non-final window leaves its trailing run in the stream state
//   - a distance seen again after another copy is sent as a cache code, and
//     each node's cache snapshot follows the edge that reached it

use backref::backref::hasher::FinderParams;
use backref::backref::optimal::{compute_shortest_path_from_nodes, create_commands, zopfli_iterate};
use backref::backref::{
    max_backward_limit, CostModel, DistanceCache, Hashers, MatchCandidates, MatchFinder, Node,
    ParseWindow, RingBuffer, StartPosRing, StreamState,
};
use backref::config::START_RING_BITS;

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn sentence_data(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    let mut n = 0u32;
    while out.len() < len {
        n = n.wrapping_mul(69_069).wrapping_add(1);
        let word: &[u8] = match (n >> 20) % 6 {
            0 => b"river ",
            1 => b"stone ",
            2 => b"bridge ",
            3 => b"over ",
            4 => b"the ",
            _ => b"quiet ",
        };
        out.extend_from_slice(word);
    }
    out.truncate(len);
    out
}

/// Distinct bytes arranged so that distance 80 comes back after a literal
/// run: `X Y X W Y[20..] X[..20] U`, with X and Y 40 bytes, W and U 20.
fn repeated_distance_data() -> Vec<u8> {
    let distinct = |k: u32| ((k * 37 + 11) % 251) as u8;
    let x: Vec<u8> = (0..40).map(distinct).collect();
    let y: Vec<u8> = (40..80).map(distinct).collect();
    let mut out = Vec::new();
    out.extend_from_slice(&x);
    out.extend_from_slice(&y);
    out.extend_from_slice(&x);
    out.extend((80..100).map(distinct));
    out.extend_from_slice(&y[20..]);
    out.extend_from_slice(&x[..20]);
    out.extend((100..120).map(distinct));
    out
}

fn window<'r, 'a>(ring: &'r RingBuffer<'a>, num_bytes: usize, is_last: bool) -> ParseWindow<'r, 'a> {
    ParseWindow { ring, position: 0, num_bytes, is_last, max_backward_limit: max_backward_limit(16) }
}

struct Parsed {
    nodes: Vec<Node>,
    path: Vec<usize>,
    cost: f64,
    model: CostModel,
}

fn parse(data: &[u8]) -> Parsed {
    let ring = RingBuffer::flat(data);
    let mut hashers = Hashers::new();
    let finder = hashers.get(10).unwrap();
    finder.init(&FinderParams { quality: 11, lgwin: 16 }, 0).unwrap();
    let window = window(&ring, data.len(), false);
    let mut candidates = MatchCandidates::new();
    candidates.collect(finder, &window).unwrap();

    let mut model = CostModel::new();
    model.set_from_literal_costs(&ring, 0, data.len()).unwrap();
    let mut queue = StartPosRing::new(START_RING_BITS);
    let mut nodes = Vec::new();
    let cost = zopfli_iterate(
        &window,
        &DistanceCache::default(),
        &candidates,
        &model,
        &mut queue,
        &mut nodes,
    )
    .unwrap();
    let (mut backwards, mut path) = (Vec::new(), Vec::new());
    compute_shortest_path_from_nodes(data.len(), &nodes, &mut backwards, &mut path).unwrap();
    Parsed { nodes, path, cost, model }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn never_worse_than_all_literals() {
    let data = sentence_data(6_000);
    let parsed = parse(&data);
    assert!(parsed.cost.is_finite());
    assert!(parsed.cost <= parsed.model.literal_cost(0, data.len()));
    assert_eq!(parsed.nodes[data.len()].cost, parsed.cost);
}

#[test]
fn path_tiles_the_window() {
    let data = sentence_data(3_000);
    let parsed = parse(&data);
    assert_eq!(parsed.path.iter().sum::<usize>(), data.len());
    // Only the final step may end on a literal-reached node.
    let mut pos = 0;
    for (n, &step) in parsed.path.iter().enumerate() {
        pos += step;
        if n + 1 < parsed.path.len() {
            assert!(parsed.nodes[pos].length > 0, "step {n} ends on a literal");
        }
    }
}

#[test]
fn carried_run_joins_the_first_command() {
    let data = sentence_data(2_000);
    let parsed = parse(&data);
    let ring = RingBuffer::flat(&data);
    let mut state = StreamState { last_insert_len: 7, ..StreamState::default() };
    let mut commands = Vec::new();
    let written = create_commands(
        &window(&ring, data.len(), false),
        &parsed.path,
        &parsed.nodes,
        &mut state,
        &mut commands,
    )
    .unwrap();
    assert_eq!(written, commands.len());
    assert!(written > 0);
    let first_step_literals = parsed.nodes[parsed.path[0]].insert_length;
    assert_eq!(commands[0].insert_len, first_step_literals + 7);

    let covered: usize = commands.iter().map(|c| c.total_len()).sum();
    assert_eq!(covered + state.last_insert_len, data.len() + 7);
    assert_eq!(state.num_commands, written);
}

#[test]
fn repeated_distance_uses_the_cache() {
    let data = repeated_distance_data();
    let parsed = parse(&data);
    let ring = RingBuffer::flat(&data);
    let mut state = StreamState::default();
    let mut commands = Vec::new();
    create_commands(&window(&ring, data.len(), true), &parsed.path, &parsed.nodes, &mut state, &mut commands)
        .unwrap();

    // 80 literals, copy X from 80 back; 20 literals, copy 40 from 80 back
    // again; the final 20 literals.
    let shape: Vec<(u32, u32)> = commands.iter().map(|c| (c.insert_len, c.copy_len)).collect();
    assert_eq!(shape, vec![(80, 40), (20, 40), (20, 0)]);
    assert_eq!(commands[0].distance_code, 80 + 15);
    assert!(commands[1].distance_code < 16, "code {}", commands[1].distance_code);

    let mut cache = DistanceCache::default();
    cache.update(80, commands[0].distance_code as usize, 80);
    assert_eq!(cache.resolve(commands[1].distance_code as usize), Some(80));
    assert_eq!(state.dist_cache, DistanceCache::new([80, 4, 11, 15]));
}

#[test]
fn node_cache_follows_the_edge_taken() {
    for data in [repeated_distance_data(), sentence_data(4_000)] {
        let parsed = parse(&data);
        let limit = max_backward_limit(16);
        let mut checked = 0;
        let mut pos = 0;
        for &step in &parsed.path {
            pos += step;
            let node = parsed.nodes[pos];
            if node.length == 0 {
                continue;
            }
            let copy_start = pos - node.length as usize;
            let run_start = copy_start - node.insert_length as usize;
            let expected = parsed.nodes[run_start].cache.after(
                node.distance as usize,
                node.distance_code as usize,
                copy_start.min(limit),
            );
            assert_eq!(node.cache, expected, "node {pos}");
            checked += 1;
        }
        assert!(checked > 0);
    }
}
