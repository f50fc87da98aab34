//! E2E Test Suite: parse then replay
//!
//! Every quality, window size and block size must produce commands that a
//! decoder-side replay turns back into the input.  Uses the same block
//! driver as the `backref` binary.

use backref::backref::BackrefParams;
use backref::cli::replay::{replay_commands, verify_commands};
use backref::cli::run::{analyze_buffer, parse_buffer};

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

fn repetitive() -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. "
        .iter()
        .copied()
        .cycle()
        .take(100_000)
        .collect()
}

fn noisy(len: usize) -> Vec<u8> {
    let mut x = 88_172_645_463_325_252u64;
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            (x >> 32) as u8
        })
        .collect()
}

/// Stretches of noise separated by repeats of earlier stretches at varying
/// distances, some beyond small windows.
fn patchwork() -> Vec<u8> {
    let base = noisy(70_000);
    let mut out = Vec::with_capacity(200_000);
    let mut k = 0usize;
    while out.len() < 200_000 {
        let start = (k * 7_919) % 60_000;
        let len = 50 + (k * 131) % 900;
        out.extend_from_slice(&base[start..start + len]);
        k += 1;
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_round_trip_all_qualities() {
    let inputs = [repetitive(), noisy(20_000), patchwork()];
    for data in &inputs {
        for quality in 0..=11 {
            let params = BackrefParams::new(quality, 18);
            let (commands, _) = parse_buffer(data, &params, 16).unwrap();
            verify_commands(&commands, data, 18)
                .unwrap_or_else(|e| panic!("quality {quality}: {e}"));
        }
    }
}

#[test]
fn test_round_trip_window_sizes() {
    let data = patchwork();
    for lgwin in [10, 12, 16, 20] {
        for quality in [4, 11] {
            let params = BackrefParams::new(quality, lgwin);
            let (commands, _) = parse_buffer(&data, &params, 17).unwrap();
            assert_eq!(replay_commands(&commands, &data, lgwin).unwrap(), data);
        }
    }
}

#[test]
fn test_repetitive_input_compresses() {
    let data = repetitive();
    for quality in [5, 10, 11] {
        let stats = analyze_buffer(&data, &BackrefParams::new(quality, 22), 16, true).unwrap();
        assert!(stats.literals < 1_000, "quality {quality}: {} literals", stats.literals);
        assert!(stats.digest.is_some());
    }
}

#[test]
fn test_noise_is_mostly_literals() {
    let data = noisy(50_000);
    let stats = analyze_buffer(&data, &BackrefParams::new(11, 22), 16, true).unwrap();
    assert!(stats.literals * 10 > data.len() * 9);
}
