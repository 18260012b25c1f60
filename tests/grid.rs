mod common;

use glam::{IVec3, UVec3, Vec3};
use grid_particles::error::SimError;
use grid_particles::grid::grid::Grid;
use grid_particles::grid::wire_cube::WireCube;

fn grid_2x2x2() -> Grid {
    Grid::new(UVec3::splat(2), Vec3::ONE).unwrap()
}

#[test]
fn linear_ids_follow_x_then_y_then_z() {
    let grid = Grid::new(UVec3::new(4, 3, 2), Vec3::ONE).unwrap();
    assert_eq!(grid.linear_id(UVec3::new(1, 0, 0)), 1);
    assert_eq!(grid.linear_id(UVec3::new(0, 1, 0)), 4);
    assert_eq!(grid.linear_id(UVec3::new(0, 0, 1)), 12);
    for id in 0..grid.num_cells() as u32 {
        assert_eq!(grid.linear_id(grid.coord_of(id)), id);
    }
}

#[test]
fn grid_is_centered_at_the_origin() {
    let grid = grid_2x2x2();
    assert_eq!(grid.cell_coord(Vec3::splat(-0.5)), UVec3::ZERO);
    assert_eq!(grid.cell_coord(Vec3::splat(0.5)), UVec3::ONE);
    assert_eq!(grid.extent(), Vec3::splat(2.0));
}

#[test]
fn cell_origins_are_the_minimum_corners() {
    let grid = Grid::new(UVec3::new(4, 3, 2), Vec3::new(0.5, 1.0, 2.0)).unwrap();
    assert_eq!(grid.cell_origin(UVec3::ZERO), -grid.extent() * 0.5);
    for id in 0..grid.num_cells() as u32 {
        let coord = grid.coord_of(id);
        let center = grid.cell_origin(coord) + grid.cell_size() * 0.5;
        assert_eq!(grid.cell_coord(center), coord);
    }
}

#[test]
fn position_on_a_boundary_belongs_to_the_upper_cell() {
    let grid = grid_2x2x2();
    // x = 0 is the face shared by cells x = 0 and x = 1
    let position = Vec3::new(0.0, -0.5, -0.5);
    assert_eq!(grid.cell_coord(position), UVec3::new(1, 0, 0));
    assert_eq!(grid.cell_id(position), 1);
}

#[test]
fn out_of_range_positions_clamp_to_border_cells() {
    let grid = grid_2x2x2();
    assert_eq!(grid.raw_cell_coord(Vec3::new(100.0, 0.0, 0.0)).x, 101);
    assert_eq!(grid.cell_coord(Vec3::new(100.0, -100.0, 0.5)), UVec3::new(1, 0, 1));
    assert_eq!(grid.cell_coord(Vec3::splat(f32::INFINITY)), UVec3::ONE);
    assert_eq!(grid.cell_coord(Vec3::splat(f32::NEG_INFINITY)), UVec3::ZERO);
}

#[test]
fn nan_positions_land_in_cell_zero() {
    let grid = grid_2x2x2();
    assert_eq!(grid.cell_id(Vec3::splat(f32::NAN)), 0);
}

#[test]
fn stencil_is_clipped_to_the_grid() {
    let grid = Grid::new(UVec3::splat(4), Vec3::ONE).unwrap();
    assert_eq!(grid.stencil(UVec3::new(1, 1, 1), 1).len(), 27);
    assert_eq!(grid.stencil(UVec3::ZERO, 1).len(), 8);
    assert_eq!(grid.stencil(UVec3::new(0, 1, 1), 1).len(), 18);
    assert_eq!(grid.stencil(UVec3::ZERO, 4).len(), 64);

    let cells = grid.stencil(UVec3::new(2, 2, 2), 1);
    assert!(cells.windows(2).all(|w| w[0] < w[1]));
    for cell in cells {
        let offset = grid.coord_of(cell).as_ivec3() - IVec3::splat(2);
        assert!(offset.abs().max_element() <= 1);
    }
}

#[test]
fn contains_coord_rejects_outside_coordinates() {
    let grid = grid_2x2x2();
    assert!(grid.contains_coord(IVec3::new(1, 0, 1)));
    assert!(!grid.contains_coord(IVec3::new(2, 0, 0)));
    assert!(!grid.contains_coord(IVec3::new(0, -1, 0)));
}

#[test]
fn invalid_grids_are_rejected() {
    assert!(matches!(
        Grid::new(UVec3::new(4, 0, 4), Vec3::ONE),
        Err(SimError::InvalidGridDimensions(_))
    ));
    assert!(matches!(
        Grid::new(UVec3::splat(4), Vec3::new(1.0, 0.0, 1.0)),
        Err(SimError::InvalidCellSize(_))
    ));
    assert!(matches!(
        Grid::new(UVec3::splat(4), Vec3::splat(f32::NAN)),
        Err(SimError::InvalidCellSize(_))
    ));
    assert!(matches!(
        Grid::new(UVec3::splat(2048), Vec3::ONE),
        Err(SimError::TooManyCells(_))
    ));
}

#[test]
fn wire_cube_has_twelve_axis_aligned_edges() {
    let size = Vec3::new(10.0, 4.0, 2.0);
    let cube = WireCube::new(size);
    assert_eq!(cube.edges().count(), 12);
    for (a, b) in cube.edges() {
        let d = (b - a).abs();
        // exactly one axis changes along an edge
        assert_eq!(d.cmpgt(Vec3::ZERO).bitmask().count_ones(), 1);
        assert!(d == Vec3::new(size.x, 0.0, 0.0) || d == Vec3::new(0.0, size.y, 0.0) || d == Vec3::new(0.0, 0.0, size.z));
    }
}
