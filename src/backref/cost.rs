//! Cost model: estimated bit costs for literals, commands, and distances.
//!
//! The model never calls the entropy coder.  It keeps three symbol cost
//! tables (command prefix, distance prefix, literal) plus a prefix-sum array
//! of per-byte literal costs over the current window, so that the cost of
//! any literal run is a single subtraction.
//!
//! Two ways to populate it:
//!   - [`CostModel::set_from_literal_costs`]: stream start, when nothing has
//!     been emitted yet; command and distance symbols get a flat
//!     `log2(bias + symbol)` prior and literals follow the local estimate
//!     from [`literal_cost`](super::literal_cost).
//!   - [`CostModel::set_from_histograms`]: every symbol costs
//!     `log2(total) - log2(count)` under the accumulated [`Histograms`].

use super::command::{
    combine_length_codes, copy_length_code, insert_length_code, prefix_encode_copy_distance,
    Command, COPY_EXTRA, INSERT_EXTRA,
};
use super::literal_cost::estimate_bit_costs_for_literals;
use super::types::{
    reset_scratch, BackrefError, RingBuffer, NUM_COMMAND_PREFIXES, NUM_DISTANCE_PREFIXES,
    NUM_LITERAL_SYMBOLS,
};

/// `log2(v)`, with `fast_log2(0) == 0`.
#[inline]
pub fn fast_log2(v: usize) -> f64 {
    if v == 0 {
        0.0
    } else {
        (v as f64).log2()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Histograms
// ─────────────────────────────────────────────────────────────────────────────

/// Symbol counts accumulated from emitted commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histograms {
    literal: Vec<u32>,
    command: Vec<u32>,
    distance: Vec<u32>,
}

impl Default for Histograms {
    fn default() -> Self {
        Self::new()
    }
}

impl Histograms {
    pub fn new() -> Self {
        Histograms {
            literal: vec![0; NUM_LITERAL_SYMBOLS],
            command: vec![0; NUM_COMMAND_PREFIXES],
            distance: vec![0; NUM_DISTANCE_PREFIXES],
        }
    }

    pub fn clear(&mut self) {
        self.literal.fill(0);
        self.command.fill(0);
        self.distance.fill(0);
    }

    /// True until the first command has been added.
    pub fn is_empty(&self) -> bool {
        self.command.iter().all(|&c| c == 0)
    }

    pub fn literal(&self) -> &[u32] {
        &self.literal
    }

    pub fn command(&self) -> &[u32] {
        &self.command
    }

    pub fn distance(&self) -> &[u32] {
        &self.distance
    }

    /// Count the symbols of `commands`, whose first literal sits at absolute
    /// position `start` in `ring`.
    pub fn add_commands(&mut self, ring: &RingBuffer<'_>, start: usize, commands: &[Command]) {
        let mut pos = start;
        for cmd in commands {
            for k in 0..cmd.insert_len as usize {
                self.literal[ring.byte(pos + k) as usize] += 1;
            }
            self.command[cmd.cmd_prefix as usize] += 1;
            if cmd.copy_len > 0 && cmd.cmd_prefix >= 128 {
                self.distance[cmd.dist_prefix as usize] += 1;
            }
            pos += cmd.total_len();
        }
    }
}

/// Fill `cost` with `log2(total) - log2(count)` for each symbol of
/// `histogram`, floored at one bit.
///
/// Unseen symbols cost two bits more than a symbol seen once would; for the
/// command and distance alphabets each unseen symbol also counts towards the
/// total, since many of them are genuinely rare.
fn set_symbol_costs(histogram: &[u32], literal_histogram: bool, cost: &mut [f64]) {
    let sum: usize = histogram.iter().map(|&c| c as usize).sum();
    let log2sum = fast_log2(sum);
    let mut missing_symbol_sum = sum;
    if !literal_histogram {
        missing_symbol_sum += histogram.iter().filter(|&&c| c == 0).count();
    }
    let missing_symbol_cost = fast_log2(missing_symbol_sum) + 2.0;
    for (c, &count) in cost.iter_mut().zip(histogram) {
        *c = if count == 0 {
            missing_symbol_cost
        } else {
            (log2sum - fast_log2(count as usize)).max(1.0)
        };
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CostModel
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct CostModel {
    cost_cmd: Vec<f64>,
    cost_dist: Vec<f64>,
    /// `literal_costs[i]` is the cost of the first `i` bytes of the window.
    literal_costs: Vec<f64>,
    min_cost_cmd: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CostModel {
    pub fn new() -> Self {
        CostModel {
            cost_cmd: vec![0.0; NUM_COMMAND_PREFIXES],
            cost_dist: vec![0.0; NUM_DISTANCE_PREFIXES],
            literal_costs: Vec::new(),
            min_cost_cmd: 0.0,
        }
    }

    /// Price the window `[position, position+num_bytes)` from its own byte
    /// statistics, with flat priors for commands and distances.
    pub fn set_from_literal_costs(
        &mut self,
        ring: &RingBuffer<'_>,
        position: usize,
        num_bytes: usize,
    ) -> Result<(), BackrefError> {
        reset_scratch(&mut self.literal_costs, num_bytes + 1, 0.0)?;
        estimate_bit_costs_for_literals(ring, position, num_bytes, &mut self.literal_costs[1..]);
        for i in 0..num_bytes {
            self.literal_costs[i + 1] += self.literal_costs[i];
        }
        for (i, c) in self.cost_cmd.iter_mut().enumerate() {
            *c = fast_log2(11 + i);
        }
        for (i, c) in self.cost_dist.iter_mut().enumerate() {
            *c = fast_log2(20 + i);
        }
        self.min_cost_cmd = fast_log2(11);
        Ok(())
    }

    /// Price the window from accumulated symbol counts.
    pub fn set_from_histograms(
        &mut self,
        histograms: &Histograms,
        ring: &RingBuffer<'_>,
        position: usize,
        num_bytes: usize,
    ) -> Result<(), BackrefError> {
        let mut cost_literal = [0.0f64; NUM_LITERAL_SYMBOLS];
        set_symbol_costs(histograms.literal(), true, &mut cost_literal);
        set_symbol_costs(histograms.command(), false, &mut self.cost_cmd);
        set_symbol_costs(histograms.distance(), false, &mut self.cost_dist);
        self.min_cost_cmd = self.cost_cmd.iter().copied().fold(f64::INFINITY, f64::min);

        reset_scratch(&mut self.literal_costs, num_bytes + 1, 0.0)?;
        for i in 0..num_bytes {
            self.literal_costs[i + 1] =
                self.literal_costs[i] + cost_literal[ring.byte(position + i) as usize];
        }
        Ok(())
    }

    /// Cost of the literals at window offsets `[from, to)`.
    #[inline]
    pub fn literal_cost(&self, from: usize, to: usize) -> f64 {
        self.literal_costs[to] - self.literal_costs[from]
    }

    /// Cheapest command prefix symbol; a lower bound on any copy.
    #[inline]
    pub fn min_command_cost(&self) -> f64 {
        self.min_cost_cmd
    }

    #[inline]
    pub fn distance_symbol_cost(&self, symbol: usize) -> f64 {
        self.cost_dist[symbol]
    }

    #[inline]
    pub fn command_symbol_cost(&self, symbol: usize) -> f64 {
        self.cost_cmd[symbol]
    }

    /// Cost of a command copying `copy_len` bytes with `distance_code` after
    /// an insert of `insert_len` literals, excluding the literals themselves.
    pub fn command_cost(&self, distance_code: usize, copy_len: usize, insert_len: usize) -> f64 {
        let (dist_symbol, dist_extra) = prefix_encode_copy_distance(distance_code);
        let inscode = insert_length_code(insert_len);
        let copycode = copy_length_code(copy_len);
        let cmdcode = combine_length_codes(inscode, copycode, dist_symbol == 0) as usize;
        let mut cost = (INSERT_EXTRA[inscode as usize] + COPY_EXTRA[copycode as usize]) as f64
            + self.cost_cmd[cmdcode];
        if cmdcode >= 128 {
            cost += (dist_extra >> 24) as f64 + self.cost_dist[dist_symbol as usize];
        }
        cost
    }
}
