use rayon::prelude::*;

/// Minimum number of chunks a rayon job handles in one sweep round.
/// Rounds with fewer chunks than this run on a single thread.
const MIN_CHUNKS_PER_JOB: usize = 256;

/// Work-efficient (Blelloch) exclusive prefix sum on the CPU.
///
/// Keeps a power-of-two scratch buffer so the per-tick scan over a fixed
/// number of cells never reallocates.
pub struct PrefixSum {
    scratch: Vec<u32>,
}

impl PrefixSum {
    pub fn new(len: usize) -> Self {
        Self {
            scratch: vec![0; padded_len(len)],
        }
    }

    /// Replaces `values` with their exclusive prefix sum and returns the total.
    pub fn execute(&mut self, values: &mut [u32]) -> u32 {
        let n = values.len();
        if n == 0 {
            return 0;
        }
        if n.is_power_of_two() {
            return blelloch_scan(values);
        }

        let padded = padded_len(n);
        if self.scratch.len() != padded {
            self.scratch.resize(padded, 0);
        }
        self.scratch[..n].copy_from_slice(values);
        self.scratch[n..].fill(0);

        let total = blelloch_scan(&mut self.scratch);
        values.copy_from_slice(&self.scratch[..n]);
        total
    }
}

/// One-shot parallel exclusive scan. Allocates scratch when `values.len()` is
/// not a power of two; use [`PrefixSum`] to scan the same length repeatedly.
pub fn exclusive_scan(values: &mut [u32]) -> u32 {
    PrefixSum::new(0).execute(values)
}

/// Sequential reference scan with the same contract as [`exclusive_scan`].
pub fn exclusive_scan_sequential(values: &mut [u32]) -> u32 {
    let mut running = 0u32;
    for value in values.iter_mut() {
        let count = *value;
        *value = running;
        running += count;
    }
    running
}

fn padded_len(len: usize) -> usize {
    len.max(1).next_power_of_two()
}

/// In-place exclusive scan of a power-of-two sized slice.
///
/// Up-sweep: in round `d` every chunk of `2^(d+1)` elements adds its left
/// half's partial sum into its last element. After `log2(n)` rounds the last
/// element holds the total. Down-sweep: the root is cleared and the partial
/// sums are pushed back down, swapping and accumulating at every level.
/// Chunks in a round are disjoint so rayon runs them without synchronisation;
/// the end of each `for_each` is the barrier between rounds.
fn blelloch_scan(data: &mut [u32]) -> u32 {
    let n = data.len();
    debug_assert!(n.is_power_of_two());

    let mut stride = 2;
    while stride <= n {
        let half = stride / 2;
        data.par_chunks_mut(stride)
            .with_min_len(MIN_CHUNKS_PER_JOB)
            .for_each(|chunk| {
                chunk[stride - 1] += chunk[half - 1];
            });
        stride *= 2;
    }

    let total = data[n - 1];
    data[n - 1] = 0;

    let mut stride = n;
    while stride >= 2 {
        let half = stride / 2;
        data.par_chunks_mut(stride)
            .with_min_len(MIN_CHUNKS_PER_JOB)
            .for_each(|chunk| {
                let left = chunk[half - 1];
                chunk[half - 1] = chunk[stride - 1];
                chunk[stride - 1] += left;
            });
        stride /= 2;
    }

    total
}
