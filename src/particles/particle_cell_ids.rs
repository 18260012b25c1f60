use glam::Vec3;
use rayon::prelude::*;
use crate::grid::grid::Grid;

/// Minimum particles per rayon job in the per-particle stages.
pub const PARTICLES_PER_JOB: usize = 1024;

/// Index stage: writes the (clamped) linear cell id of every particle.
///
/// The ids are kept for the whole tick so the count and scatter stages never
/// recompute them.
pub fn compute_cell_ids(grid: &Grid, positions: &[Vec3], cell_ids: &mut [u32]) {
    debug_assert_eq!(positions.len(), cell_ids.len());
    cell_ids
        .par_iter_mut()
        .with_min_len(PARTICLES_PER_JOB)
        .zip(positions.par_iter())
        .for_each(|(cell_id, &position)| {
            *cell_id = grid.cell_id(position);
        });
}
