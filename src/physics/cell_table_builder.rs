use std::sync::atomic::{AtomicU32, Ordering};
use rayon::prelude::*;
use crate::particles::particle_cell_ids::PARTICLES_PER_JOB;
use crate::physics::cell_offset_table::CellOffsetTable;
use crate::utils::prefix_sum::PrefixSum;

/// Minimum cells per rayon job in the per-cell stages.
const CELLS_PER_JOB: usize = 4096;

/// Owns the per-cell atomics and runs the histogram, scan and offset stages.
///
/// Two distinct atomic arrays are used: `cell_counters` is zeroed in the
/// reset stage and incremented in the count stage; `scatter_cursors` is
/// seeded with every cell's start in the offsets stage and consumed by the
/// scatter stage. Neither is read across a stage boundary without its reset.
pub struct CellTableBuilder {
    cell_counters: Vec<AtomicU32>,
    scatter_cursors: Vec<AtomicU32>,
    counts: Vec<u32>,
    starts: Vec<u32>,
    prefix_sum: PrefixSum,
}

impl CellTableBuilder {
    pub fn new(num_cells: usize) -> Self {
        Self {
            cell_counters: (0..num_cells).map(|_| AtomicU32::new(0)).collect(),
            scatter_cursors: (0..num_cells).map(|_| AtomicU32::new(0)).collect(),
            counts: vec![0; num_cells],
            starts: vec![0; num_cells],
            prefix_sum: PrefixSum::new(num_cells),
        }
    }

    /// Reset stage: zero every cell counter.
    pub fn reset(&self) {
        self.cell_counters
            .par_iter()
            .with_min_len(CELLS_PER_JOB)
            .for_each(|counter| counter.store(0, Ordering::Relaxed));
    }

    /// Count stage: one atomic increment per particle on its cell's counter.
    pub fn count(&self, cell_ids: &[u32]) {
        cell_ids
            .par_iter()
            .with_min_len(PARTICLES_PER_JOB)
            .for_each(|&cell_id| {
                self.cell_counters[cell_id as usize].fetch_add(1, Ordering::Relaxed);
            });
    }

    /// Scan stage: snapshots the counters and turns them into exclusive start
    /// offsets. Returns the total number of counted particles.
    pub fn scan(&mut self) -> u32 {
        self.counts
            .par_iter_mut()
            .with_min_len(CELLS_PER_JOB)
            .zip(self.cell_counters.par_iter())
            .for_each(|(count, counter)| *count = counter.load(Ordering::Relaxed));

        self.starts.copy_from_slice(&self.counts);
        self.prefix_sum.execute(&mut self.starts)
    }

    /// Offsets stage: materialises the table and seeds every scatter cursor at
    /// its cell's start.
    pub fn build_offsets(&self, table: &mut CellOffsetTable) {
        table.fill(&self.starts, &self.counts);
        self.scatter_cursors
            .par_iter()
            .with_min_len(CELLS_PER_JOB)
            .zip(self.starts.par_iter())
            .for_each(|(cursor, &start)| cursor.store(start, Ordering::Relaxed));
    }

    pub fn scatter_cursors(&self) -> &[AtomicU32] {
        &self.scatter_cursors
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn starts(&self) -> &[u32] {
        &self.starts
    }

    pub fn num_cells(&self) -> usize {
        self.cell_counters.len()
    }
}
