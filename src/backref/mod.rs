//! Backward-reference selection engine.
//!
//! Splits a window of the input into "insert N literals, then copy L bytes
//! from D back" commands, minimising an estimated encoded size.
//!
//! Submodules, leaves first:
//!   - `types`      : shared constants, ring-buffer and window views, [`BackrefError`]
//!   - `ring`       : Start-Position Ring bounding the optimal parser's fan-out
//!   - `dist_cache` : four-slot distance cache and short distance codes
//!   - `command`    : [`Command`] and its prefix symbols
//!   - `literal_cost`- per-byte literal cost curve
//!   - `cost`       : cost model and accumulated histograms
//!   - `hasher`     : match-finder capability and hash-chain finders
//!   - `matches`    : per-position match candidates for the optimal parser
//!   - `optimal`    : optimal parser (node relaxation, backtrack, emission)
//!   - `greedy`     : greedy parser with lazy matching
//!   - `context`    : [`BackwardReferencesContext`]
//!   - `api`        : [`create_backward_references`]

pub mod api;
pub mod command;
pub mod context;
pub mod cost;
pub mod dist_cache;
pub mod greedy;
pub mod hasher;
pub mod literal_cost;
pub mod matches;
pub mod optimal;
pub mod ring;
pub mod types;

pub use api::{create_backward_references, BackrefParams, InputBlock, StreamState};
pub use command::Command;
pub use context::BackwardReferencesContext;
pub use cost::{CostModel, Histograms};
pub use dist_cache::DistanceCache;
pub use hasher::{BackwardMatch, FinderParams, HashChain, Hashers, LongestMatch, MatchFinder};
pub use matches::MatchCandidates;
pub use optimal::Node;
pub use ring::StartPosRing;
pub use types::{max_backward_limit, BackrefError, ParseWindow, RingBuffer};
