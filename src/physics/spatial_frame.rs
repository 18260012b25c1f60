use crate::error::SimError;
use crate::particles::particle_sort::verify_permutation;
use crate::physics::cell_offset_table::CellOffsetTable;

/// The per-tick spatial index: cell id of every particle, the cell table and
/// the particle indices sorted by cell.
#[derive(Debug, Clone, Default)]
pub struct SpatialFrame {
    pub(crate) cell_ids: Vec<u32>,
    pub(crate) sorted_indices: Vec<u32>,
    pub(crate) cell_table: CellOffsetTable,
}

impl SpatialFrame {
    pub fn new(num_particles: usize, num_cells: usize) -> Self {
        Self {
            cell_ids: vec![0; num_particles],
            sorted_indices: (0..num_particles as u32).collect(),
            cell_table: CellOffsetTable::new(num_cells),
        }
    }

    pub fn cell_ids(&self) -> &[u32] {
        &self.cell_ids
    }

    pub fn sorted_indices(&self) -> &[u32] {
        &self.sorted_indices
    }

    pub fn cell_table(&self) -> &CellOffsetTable {
        &self.cell_table
    }

    /// Particle indices stored in one cell.
    pub fn particles_in_cell(&self, cell_id: u32) -> &[u32] {
        &self.sorted_indices[self.cell_table.range(cell_id)]
    }

    /// Checks the table invariants and that the sorted buffer matches them.
    pub fn verify(&self) -> Result<(), SimError> {
        self.cell_table.verify(self.cell_ids.len())?;
        verify_permutation(&self.sorted_indices, &self.cell_table, &self.cell_ids)
    }
}
