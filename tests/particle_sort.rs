mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use glam::{UVec3, Vec3};
use grid_particles::grid::grid::Grid;
use grid_particles::particles::particle_cell_ids::compute_cell_ids;
use grid_particles::particles::particle_sort::{verify_permutation, ParticleSort};
use grid_particles::physics::cell_offset_table::CellOffsetTable;
use grid_particles::physics::cell_table_builder::CellTableBuilder;

/// Runs the reset, index, count, scan, offsets and scatter stages.
fn sort(grid: &Grid, positions: &[Vec3]) -> (Vec<u32>, CellOffsetTable, Vec<u32>) {
    let mut cell_ids = vec![0; positions.len()];
    let mut builder = CellTableBuilder::new(grid.num_cells());
    let mut table = CellOffsetTable::new(grid.num_cells());
    let mut sorted = vec![0; positions.len()];

    builder.reset();
    compute_cell_ids(grid, positions, &mut cell_ids);
    builder.count(&cell_ids);
    let total = builder.scan();
    assert_eq!(total as usize, positions.len());
    builder.build_offsets(&mut table);
    ParticleSort::new(positions.len()).scatter(&cell_ids, builder.scatter_cursors(), &mut sorted);

    (cell_ids, table, sorted)
}

#[test]
fn four_particles_in_cell_zero() {
    let grid = Grid::new(UVec3::splat(2), Vec3::ONE).unwrap();
    let positions = vec![
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(-0.9, -0.1, -0.2),
        Vec3::new(-0.1, -0.9, -0.7),
        Vec3::new(-1.0, -1.0, -1.0),
    ];

    let (cell_ids, table, sorted) = sort(&grid, &positions);

    assert_eq!(cell_ids, vec![0; 4]);
    assert_eq!(table.counts(), vec![4, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(table.starts(), vec![0, 4, 4, 4, 4, 4, 4, 4]);
    let mut in_cell_zero = sorted[table.range(0)].to_vec();
    in_cell_zero.sort_unstable();
    assert_eq!(in_cell_zero, vec![0, 1, 2, 3]);
    table.verify(positions.len()).unwrap();
}

#[test]
fn sorted_buffer_is_a_partitioned_permutation() {
    let grid = Grid::new(UVec3::new(8, 4, 6), Vec3::splat(1.25)).unwrap();
    let mut rng = common::rng(3);
    // some particles fall outside the grid and get clamped
    let positions = common::random_positions(&mut rng, 5_000, grid.extent() * 1.5);

    let (cell_ids, table, sorted) = sort(&grid, &positions);

    table.verify(positions.len()).unwrap();
    verify_permutation(&sorted, &table, &cell_ids).unwrap();
    assert_eq!(table.total(), positions.len() as u64);
}

#[test]
fn histogram_counts_match_cell_ids() {
    let grid = Grid::new(UVec3::splat(4), Vec3::ONE).unwrap();
    let mut rng = common::rng(8);
    let positions = common::random_positions(&mut rng, 1_000, grid.extent());

    let (cell_ids, table, _) = sort(&grid, &positions);

    let mut expected = vec![0u32; grid.num_cells()];
    for &cell in &cell_ids {
        expected[cell as usize] += 1;
    }
    assert_eq!(table.counts(), expected);
}

#[test]
fn verify_permutation_detects_duplicates() {
    let cell_ids = vec![0, 0, 1];
    let mut table = CellOffsetTable::new(2);
    table.fill(&[0, 2], &[2, 1]);

    verify_permutation(&[1, 0, 2], &table, &cell_ids).unwrap();
    assert!(verify_permutation(&[1, 1, 2], &table, &cell_ids).is_err());
    assert!(verify_permutation(&[2, 0, 1], &table, &cell_ids).is_err());
}

#[test]
fn scatter_advances_every_cursor_to_the_cell_end() {
    let cell_ids = vec![2, 0, 2, 1, 2];
    let cursors: Vec<AtomicU32> = [0, 1, 2].into_iter().map(AtomicU32::new).collect();
    let mut sorted = vec![0; cell_ids.len()];

    ParticleSort::new(cell_ids.len()).scatter(&cell_ids, &cursors, &mut sorted);

    let ends: Vec<u32> = cursors.iter().map(|c| c.load(Ordering::Relaxed)).collect();
    assert_eq!(ends, vec![1, 2, 5]);
    assert_eq!(sorted[0], 1);
    assert_eq!(sorted[1], 3);
    let mut last_cell = sorted[2..].to_vec();
    last_cell.sort_unstable();
    assert_eq!(last_cell, vec![0, 2, 4]);
}
