mod common;

use std::collections::HashSet;
use glam::{UVec3, Vec3};
use grid_particles::settings::SimulationSettings;

fn settings() -> SimulationSettings {
    SimulationSettings {
        particle_radius: 0.5,
        damping: 0.0,
        ..common::settings_with_grid(UVec3::splat(8), 1.25)
    }
}

#[test]
fn every_close_pair_is_a_candidate() {
    let mut rng = common::rng(21);
    let positions = common::random_positions(&mut rng, 800, Vec3::splat(10.0));
    let mut simulation = common::simulation_from_positions(settings(), positions.clone());
    // the spatial frame is built from the committed positions of the tick
    simulation.tick(0.0, 0.0).unwrap();

    let solver = simulation.collision_solver();
    let grid = simulation.grid();
    let frame = simulation.spatial_frame();

    let mut candidates = HashSet::new();
    for particle in 0..positions.len() {
        solver.for_each_candidate(grid, frame, particle, |other| {
            candidates.insert((particle.min(other), particle.max(other)));
        });
    }

    let close_pairs = common::brute_force_pairs(&positions, solver.interaction_radius());
    assert!(!close_pairs.is_empty());
    for pair in close_pairs {
        assert!(candidates.contains(&pair), "pair {pair:?} was never considered");
    }
}

#[test]
fn far_cells_are_never_visited() {
    let mut rng = common::rng(4);
    let positions = common::random_positions(&mut rng, 600, Vec3::splat(10.0));
    let mut simulation = common::simulation_from_positions(settings(), positions.clone());
    simulation.tick(0.0, 0.0).unwrap();

    let solver = simulation.collision_solver();
    let grid = simulation.grid();
    let frame = simulation.spatial_frame();
    let r = solver.stencil_radius_cells() as i32;

    for particle in 0..positions.len() {
        let own = grid.cell_coord(positions[particle]).as_ivec3();
        solver.for_each_candidate(grid, frame, particle, |other| {
            assert_ne!(other, particle);
            let theirs = grid.cell_coord(positions[other]).as_ivec3();
            assert!((own - theirs).abs().max_element() <= r);
        });
    }
}

#[test]
fn contacts_match_brute_force_distances() {
    let mut rng = common::rng(9);
    let positions = common::random_positions(&mut rng, 400, Vec3::splat(8.0));
    let mut simulation = common::simulation_from_positions(settings(), positions.clone());
    simulation.tick(0.0, 0.0).unwrap();

    let solver = simulation.collision_solver();
    let mut contacts = HashSet::new();
    for particle in 0..positions.len() {
        solver.for_each_contact(simulation.grid(), simulation.spatial_frame(), &positions, particle, |contact| {
            assert!(contact.penetration >= 0.0);
            assert!((contact.normal.length() - 1.0).abs() < 1e-4);
            contacts.insert((particle.min(contact.other), particle.max(contact.other)));
        });
    }

    let expected: HashSet<_> = common::brute_force_pairs(&positions, solver.interaction_radius())
        .into_iter()
        .collect();
    assert_eq!(contacts, expected);
}

#[test]
fn overlapping_pair_is_pushed_apart_symmetrically() {
    let positions = vec![Vec3::new(-0.2, 0.1, 0.1), Vec3::new(0.2, 0.1, 0.1)];
    let mut simulation = common::simulation_from_positions(settings(), positions);
    simulation.tick(0.0, 0.0).unwrap();

    let after = simulation.particles().positions();
    // interaction radius 1.0, distance 0.4 -> each moves by 0.3
    assert!((after[0].x - -0.5).abs() < 1e-5);
    assert!((after[1].x - 0.5).abs() < 1e-5);
    assert!((after[0].distance(after[1]) - 1.0).abs() < 1e-5);

    let forces = simulation.particles().forces();
    assert!((forces[0] - 0.6).abs() < 1e-5);
    assert_eq!(forces[0], forces[1]);
}

#[test]
fn approaching_pair_exchanges_momentum() {
    let positions = vec![Vec3::new(-0.4, 0.0, 0.0), Vec3::new(0.4, 0.0, 0.0)];
    let settings = SimulationSettings { restitution: 1.0, ..settings() };
    let mut simulation = common::simulation_from_positions(settings, positions);
    simulation.set_velocity(0, Vec3::new(1.0, 0.0, 0.0));
    simulation.set_velocity(1, Vec3::new(-1.0, 0.0, 0.0));
    simulation.tick(0.0, 0.0).unwrap();

    let velocities = simulation.particles().velocities();
    // elastic head-on collision of equal masses swaps the velocities
    assert!((velocities[0] - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    assert!((velocities[1] - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    assert!((velocities[0] + velocities[1]).length() < 1e-5);
}

#[test]
fn coincident_particles_separate_without_nan() {
    let positions = vec![Vec3::new(1.0, 1.0, 1.0); 2];
    let mut simulation = common::simulation_from_positions(settings(), positions);
    simulation.tick(0.0, 0.0).unwrap();

    let after = simulation.particles().positions();
    assert!(after.iter().all(|p| p.is_finite()));
    assert!((after[0].distance(after[1]) - 1.0).abs() < 1e-5);
}

#[test]
fn separated_particles_are_untouched() {
    let positions = vec![Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)];
    let mut simulation = common::simulation_from_positions(settings(), positions.clone());
    simulation.tick(0.0, 0.0).unwrap();

    assert_eq!(simulation.particles().positions(), positions.as_slice());
    assert_eq!(simulation.particles().forces(), &[0.0, 0.0]);
}
