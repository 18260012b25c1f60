use std::ops::Range;
use crate::error::SimError;

/// Where one cell's particles live inside the sorted index buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CellRange {
    pub start: u32,
    pub count: u32,
}

impl CellRange {
    pub fn range(&self) -> Range<usize> {
        self.start as usize..(self.start + self.count) as usize
    }

    pub fn end(&self) -> u32 {
        self.start + self.count
    }
}

/// Per-cell `(start, count)` pairs for one tick. Cell `i`'s particles occupy
/// `sorted[start_i..start_i + count_i]`, and consecutive cells are contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellOffsetTable {
    cells: Vec<CellRange>,
}

impl CellOffsetTable {
    pub fn new(num_cells: usize) -> Self {
        Self {
            cells: vec![CellRange::default(); num_cells],
        }
    }

    /// Pairs scanned starts with histogram counts. Both slices are indexed by cell id.
    pub fn fill(&mut self, starts: &[u32], counts: &[u32]) {
        debug_assert_eq!(starts.len(), counts.len());
        self.cells.clear();
        self.cells.extend(
            starts
                .iter()
                .zip(counts)
                .map(|(&start, &count)| CellRange { start, count }),
        );
    }

    pub fn get(&self, cell_id: u32) -> CellRange {
        self.cells[cell_id as usize]
    }

    pub fn range(&self, cell_id: u32) -> Range<usize> {
        self.get(cell_id).range()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellRange> {
        self.cells.iter()
    }

    pub fn as_slice(&self) -> &[CellRange] {
        &self.cells
    }

    pub fn counts(&self) -> Vec<u32> {
        self.cells.iter().map(|cell| cell.count).collect()
    }

    pub fn starts(&self) -> Vec<u32> {
        self.cells.iter().map(|cell| cell.start).collect()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.cells.iter().map(|cell| cell.count as u64).sum()
    }

    /// Checks `start_0 == 0`, `start_{i+1} == start_i + count_i` and that the
    /// counts add up to `particle_count`.
    pub fn verify(&self, particle_count: usize) -> Result<(), SimError> {
        let mut expected_start = 0u64;
        for (cell_id, cell) in self.cells.iter().enumerate() {
            if cell.start as u64 != expected_start {
                return Err(SimError::CorruptCellTable(format!(
                    "cell {cell_id} starts at {} but the previous cells end at {expected_start}",
                    cell.start
                )));
            }
            expected_start += cell.count as u64;
        }
        if expected_start != particle_count as u64 {
            return Err(SimError::CorruptCellTable(format!(
                "cells hold {expected_start} particles, expected {particle_count}"
            )));
        }
        Ok(())
    }
}

impl From<Vec<CellRange>> for CellOffsetTable {
    fn from(cells: Vec<CellRange>) -> Self {
        Self { cells }
    }
}
