//! Reference command applier used by `--verify`.
//!
//! Rebuilds a stream from its commands the way the paired decoder would:
//! literals are taken from the original input (the commands only carry
//! their count), copies are resolved through a decoder-side
//! [`DistanceCache`] and copied byte by byte from the output produced so
//! far.  A parse is correct when the rebuilt stream hashes the same as the
//! input.

use std::fmt;

use xxhash_rust::xxh64::xxh64;

use crate::backref::{max_backward_limit, Command, DistanceCache};

/// Seed for the content digests.
const DIGEST_SEED: u64 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// The commands cover more bytes than the input holds.
    LengthOverrun { command: usize },
    /// A distance code that resolves to no valid distance.
    BadDistanceCode { command: usize, code: u32 },
    /// A copy reaching before the stream start or outside the window.
    DistanceTooFar { command: usize, distance: usize, max_distance: usize },
    /// The commands cover fewer bytes than the input holds.
    LengthMismatch { expected: usize, actual: usize },
    /// Rebuilt content differs from the input.
    ContentMismatch { offset: usize },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::LengthOverrun { command } => {
                write!(f, "command {command} runs past the end of the input")
            }
            ReplayError::BadDistanceCode { command, code } => {
                write!(f, "command {command}: distance code {code} does not resolve")
            }
            ReplayError::DistanceTooFar { command, distance, max_distance } => write!(
                f,
                "command {command}: distance {distance} exceeds the allowed {max_distance}"
            ),
            ReplayError::LengthMismatch { expected, actual } => {
                write!(f, "rebuilt {actual} bytes, expected {expected}")
            }
            ReplayError::ContentMismatch { offset } => {
                write!(f, "rebuilt content differs at offset {offset}")
            }
        }
    }
}

impl std::error::Error for ReplayError {}

/// Rebuild the stream described by `commands`.
pub fn replay_commands(
    commands: &[Command],
    input: &[u8],
    lgwin: u32,
) -> Result<Vec<u8>, ReplayError> {
    let limit = max_backward_limit(lgwin);
    let mut out: Vec<u8> = Vec::with_capacity(input.len());
    let mut cache = DistanceCache::default();

    for (n, cmd) in commands.iter().enumerate() {
        let start = out.len();
        let end = start + cmd.insert_len as usize;
        if end + cmd.copy_len as usize > input.len() {
            return Err(ReplayError::LengthOverrun { command: n });
        }
        out.extend_from_slice(&input[start..end]);
        if cmd.is_insert_only() {
            continue;
        }

        let code = cmd.distance_code as usize;
        let distance = cache
            .resolve(code)
            .ok_or(ReplayError::BadDistanceCode { command: n, code: cmd.distance_code })?;
        let max_distance = out.len().min(limit);
        if distance > max_distance {
            return Err(ReplayError::DistanceTooFar { command: n, distance, max_distance });
        }
        cache.update(distance, code, max_distance);
        for _ in 0..cmd.copy_len {
            let b = out[out.len() - distance];
            out.push(b);
        }
    }
    Ok(out)
}

/// Replay `commands` and check the result against `input`; returns the
/// content digest on success.
pub fn verify_commands(commands: &[Command], input: &[u8], lgwin: u32) -> Result<u64, ReplayError> {
    let out = replay_commands(commands, input, lgwin)?;
    if out.len() != input.len() {
        return Err(ReplayError::LengthMismatch { expected: input.len(), actual: out.len() });
    }
    let digest = xxh64(input, DIGEST_SEED);
    if xxh64(&out, DIGEST_SEED) != digest {
        let offset = out.iter().zip(input).position(|(a, b)| a != b).unwrap_or(0);
        return Err(ReplayError::ContentMismatch { offset });
    }
    Ok(digest)
}
