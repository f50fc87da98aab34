//! Backward-Reference Context: scratch buffers and persistent cost state.
//!
//! One context serves one stream.  The scratch buffers (nodes, match lists,
//! backtrace arrays, literal-cost curve) are resized per parsed segment and
//! keep their allocation between calls.  The histograms persist and only
//! grow, so the cost model keeps adapting as more of the stream is parsed.
//!
//! Lifecycle: [`BackwardReferencesContext::new`] once per session, then
//! [`reset`](BackwardReferencesContext::reset) at the start of every new
//! stream parsed with it.

use crate::config::START_RING_BITS;

use super::cost::{CostModel, Histograms};
use super::matches::MatchCandidates;
use super::optimal::Node;
use super::ring::StartPosRing;

#[derive(Debug)]
pub struct BackwardReferencesContext {
    pub(crate) candidates: MatchCandidates,
    pub(crate) nodes: Vec<Node>,
    pub(crate) queue: StartPosRing,
    pub(crate) backwards: Vec<usize>,
    pub(crate) path: Vec<usize>,
    pub(crate) model: CostModel,
    pub(crate) histograms: Histograms,
    /// Histograms plus the first pass's commands, for the second pass.
    pub(crate) pass_histograms: Histograms,
}

impl Default for BackwardReferencesContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BackwardReferencesContext {
    pub fn new() -> Self {
        BackwardReferencesContext {
            candidates: MatchCandidates::new(),
            nodes: Vec::new(),
            queue: StartPosRing::new(START_RING_BITS),
            backwards: Vec::new(),
            path: Vec::new(),
            model: CostModel::new(),
            histograms: Histograms::new(),
            pass_histograms: Histograms::new(),
        }
    }

    /// Forget all stream state; allocations are kept.
    pub fn reset(&mut self) {
        self.histograms.clear();
        self.pass_histograms.clear();
        self.queue.clear();
        self.nodes.clear();
        self.backwards.clear();
        self.path.clear();
    }

    /// Symbol counts of every command the optimal parser has emitted on
    /// this stream so far.
    pub fn histograms(&self) -> &Histograms {
        &self.histograms
    }

    /// Nodes of the last optimal pass (one per byte of its segment, plus one).
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}
