use std::sync::atomic::{AtomicU32, Ordering};
use rayon::prelude::*;
use crate::error::SimError;
use crate::particles::particle_cell_ids::PARTICLES_PER_JOB;
use crate::physics::cell_offset_table::CellOffsetTable;

/// Counting sort of particle indices by cell id.
///
/// The scatter writes through an atomic staging buffer because slots are
/// claimed by concurrent fetch-and-increment; the result is then copied into
/// the plain sorted buffer the later stages read.
pub struct ParticleSort {
    staging: Vec<AtomicU32>,
}

impl ParticleSort {
    pub fn new(num_particles: usize) -> Self {
        Self {
            staging: (0..num_particles).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Scatter stage. `cursors` must already hold every cell's start offset.
    /// Each particle claims `cursors[cell]++` and writes its own index there,
    /// so a cell's indices end up in exactly `[start, start + count)`.
    pub fn scatter(&self, cell_ids: &[u32], cursors: &[AtomicU32], sorted: &mut [u32]) {
        debug_assert_eq!(cell_ids.len(), self.staging.len());
        debug_assert_eq!(sorted.len(), self.staging.len());

        cell_ids
            .par_iter()
            .with_min_len(PARTICLES_PER_JOB)
            .enumerate()
            .for_each(|(particle, &cell_id)| {
                let slot = cursors[cell_id as usize].fetch_add(1, Ordering::Relaxed);
                self.staging[slot as usize].store(particle as u32, Ordering::Relaxed);
            });

        sorted
            .par_iter_mut()
            .with_min_len(PARTICLES_PER_JOB)
            .zip(self.staging.par_iter())
            .for_each(|(dst, src)| *dst = src.load(Ordering::Relaxed));
    }
}

/// Checks that `sorted` is a permutation of `0..len` in which every particle
/// sits inside its own cell's range.
pub fn verify_permutation(sorted: &[u32], table: &CellOffsetTable, cell_ids: &[u32]) -> Result<(), SimError> {
    if sorted.len() != cell_ids.len() {
        return Err(SimError::CorruptCellTable(format!(
            "sorted buffer holds {} entries for {} particles",
            sorted.len(),
            cell_ids.len()
        )));
    }

    let mut seen = vec![false; sorted.len()];
    for (cell_id, cell) in table.iter().enumerate() {
        for &particle in &sorted[cell.range()] {
            let particle = particle as usize;
            if particle >= seen.len() || std::mem::replace(&mut seen[particle], true) {
                return Err(SimError::CorruptCellTable(format!(
                    "particle {particle} is missing or duplicated in the sorted buffer"
                )));
            }
            if cell_ids[particle] as usize != cell_id {
                return Err(SimError::CorruptCellTable(format!(
                    "particle {particle} of cell {} was sorted into cell {cell_id}",
                    cell_ids[particle]
                )));
            }
        }
    }
    Ok(())
}
