// backref: cost-driven backward-reference selection for a brotli-style
// command stream, plus the `backref` analysis CLI.

pub mod display;
pub mod config;
pub mod backref;
pub mod cli;

// ── Version constants ────────────────────────────────────────────────────────
pub const BACKREF_VERSION_MAJOR: u32 = 0;
pub const BACKREF_VERSION_MINOR: u32 = 4;
pub const BACKREF_VERSION_RELEASE: u32 = 0;
pub const BACKREF_VERSION_NUMBER: u32 =
    BACKREF_VERSION_MAJOR * 100 * 100 + BACKREF_VERSION_MINOR * 100 + BACKREF_VERSION_RELEASE;
pub const BACKREF_VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

/// Returns the runtime version number.
pub fn version_number() -> u32 {
    BACKREF_VERSION_NUMBER
}

/// Returns the runtime version string.
pub fn version_string() -> &'static str {
    BACKREF_VERSION_STRING
}

// ── Top-level re-exports ──────────────────────────────────────────────────────
pub use backref::{
    create_backward_references, BackrefError, BackrefParams, BackwardReferencesContext, Command,
    DistanceCache, Hashers, InputBlock, RingBuffer, StreamState,
};
