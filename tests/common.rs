// Not every test file will use every function.
#![allow(dead_code)]

use glam::{UVec3, Vec3};
use grid_particles::particles::particle_system::ParticleSystem;
use grid_particles::settings::SimulationSettings;
use grid_particles::simulation::Simulation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DT: f32 = 1.0 / 60.0;

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Default settings on a custom grid, with a fixed seed.
pub fn settings_with_grid(dimensions: UVec3, cell_size: f32) -> SimulationSettings {
    SimulationSettings {
        grid_dimensions: dimensions.to_array(),
        seed: Some(7),
        ..SimulationSettings::default()
    }
    .with_uniform_cell_size(cell_size)
}

/// Uniform positions inside a box of `size` centered at the origin.
pub fn random_positions(rng: &mut StdRng, count: usize, size: Vec3) -> Vec<Vec3> {
    let h = size * 0.5;
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.random_range(-h.x..h.x),
                rng.random_range(-h.y..h.y),
                rng.random_range(-h.z..h.z),
            )
        })
        .collect()
}

pub fn simulation_from_positions(settings: SimulationSettings, positions: Vec<Vec3>) -> Simulation {
    Simulation::with_particle_system(settings, ParticleSystem::from_positions(positions, 1.0)).unwrap()
}

/// Every unordered pair closer than `radius`, found by checking all pairs.
pub fn brute_force_pairs(positions: &[Vec3], radius: f32) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for a in 0..positions.len() {
        for b in a + 1..positions.len() {
            if positions[a].distance(positions[b]) <= radius {
                pairs.push((a, b));
            }
        }
    }
    pairs
}
