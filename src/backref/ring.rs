//! Start-position ring for the optimal parser.
//!
//! A fixed-capacity recency buffer of `(position, cost difference)` pairs.
//! The parser pushes the positions where a literal run may begin and, at
//! every step, only reconsiders the most recent few of them as command
//! starts.  Eviction is strictly oldest-first; the stored cost difference is
//! only consulted by the parser's push filter, never for ordering.

/// Bounded FIFO of candidate command start positions.
#[derive(Clone, Debug)]
pub struct StartPosRing {
    mask: usize,
    slots: Vec<(usize, f64)>,
    idx: usize,
}

impl StartPosRing {
    /// Ring holding the last `2^bits` pushes.
    pub fn new(bits: u32) -> Self {
        let capacity = 1usize << bits;
        Self {
            mask: capacity - 1,
            slots: vec![(0, 0.0); capacity],
            idx: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Forget every entry; the storage is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.idx = 0;
    }

    /// Record `pos`, overwriting the oldest entry once the ring is full.
    #[inline]
    pub fn push(&mut self, pos: usize, costdiff: f64) {
        self.slots[self.idx & self.mask] = (pos, costdiff);
        self.idx += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.idx.min(self.mask + 1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx == 0
    }

    /// Position pushed `k` pushes before the most recent one (`k = 0` is the
    /// most recent), or `None` once `k` reaches [`len`](Self::len).
    #[inline]
    pub fn get(&self, k: usize) -> Option<usize> {
        self.entry(k).map(|(pos, _)| pos)
    }

    /// Cost difference stored alongside [`get`](Self::get)`(k)`.
    #[inline]
    pub fn costdiff(&self, k: usize) -> Option<f64> {
        self.entry(k).map(|(_, costdiff)| costdiff)
    }

    /// Smallest cost difference still retained, or `None` when empty.
    pub fn min_costdiff(&self) -> Option<f64> {
        (0..self.len()).filter_map(|k| self.costdiff(k)).reduce(f64::min)
    }

    #[inline]
    fn entry(&self, k: usize) -> Option<(usize, f64)> {
        if k >= self.len() {
            return None;
        }
        Some(self.slots[self.idx.wrapping_sub(k + 1) & self.mask])
    }
}
