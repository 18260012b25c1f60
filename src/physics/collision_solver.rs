use glam::Vec3;
use rayon::prelude::*;
use crate::grid::grid::Grid;
use crate::particles::particle_buffers::ParticleBuffers;
use crate::particles::particle_cell_ids::PARTICLES_PER_JOB;
use crate::physics::spatial_frame::SpatialFrame;
use crate::settings::SimulationSettings;

/// One overlapping neighbor as seen from the particle being resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub other: usize,
    /// Unit vector pointing from `other` towards the particle.
    pub normal: Vec3,
    pub distance: f32,
    pub penetration: f32,
}

/// Broad phase over the cell stencil plus a pairwise sphere response.
///
/// Every invocation reads the committed frame and writes only its own slot of
/// the next frame, so the result does not depend on scheduling.
#[derive(Debug, Clone)]
pub struct CollisionSolver {
    interaction_radius: f32,
    restitution: f32,
    stencil_radius_cells: u32,
}

impl CollisionSolver {
    pub fn new(grid: &Grid, settings: &SimulationSettings) -> Self {
        let solver = Self {
            interaction_radius: settings.interaction_radius(),
            restitution: settings.restitution,
            stencil_radius_cells: settings.stencil_radius_cells,
        };

        let reach = grid.cell_size() * solver.stencil_radius_cells as f32;
        if reach.min_element() < solver.interaction_radius {
            log::warn!(
                "Stencil of {} cell(s) covers {:?} but the interaction radius is {}, some contacts will be missed",
                solver.stencil_radius_cells,
                reach,
                solver.interaction_radius
            );
        }
        solver
    }

    pub fn interaction_radius(&self) -> f32 {
        self.interaction_radius
    }

    pub fn stencil_radius_cells(&self) -> u32 {
        self.stencil_radius_cells
    }

    /// Calls `f` with every other particle stored in the stencil around
    /// `particle`'s cell, before any distance test.
    pub fn for_each_candidate<F>(&self, grid: &Grid, frame: &SpatialFrame, particle: usize, mut f: F)
    where
        F: FnMut(usize),
    {
        let center = grid.coord_of(frame.cell_ids[particle]);
        grid.for_each_stencil_cell(center, self.stencil_radius_cells, |cell_id| {
            for &other in frame.particles_in_cell(cell_id) {
                if other as usize != particle {
                    f(other as usize);
                }
            }
        });
    }

    /// Calls `f` with every candidate within the interaction radius.
    pub fn for_each_contact<F>(&self, grid: &Grid, frame: &SpatialFrame, positions: &[Vec3], particle: usize, mut f: F)
    where
        F: FnMut(Contact),
    {
        let position = positions[particle];
        self.for_each_candidate(grid, frame, particle, |other| {
            let delta = position - positions[other];
            let distance = delta.length();
            if distance <= self.interaction_radius {
                let normal = if distance > 0.0 {
                    delta / distance
                } else {
                    coincident_normal(particle, other)
                };
                f(Contact {
                    other,
                    normal,
                    distance,
                    penetration: self.interaction_radius - distance,
                });
            }
        });
    }

    /// Collide stage. Reads positions and velocities from `current` and writes
    /// corrected positions, velocities and the accumulated penetration into `next`.
    pub fn resolve(&self, grid: &Grid, frame: &SpatialFrame, current: &ParticleBuffers, next: &mut ParticleBuffers) {
        let ParticleBuffers { positions, velocities, forces, .. } = next;

        positions
            .par_iter_mut()
            .zip(velocities.par_iter_mut())
            .zip(forces.par_iter_mut())
            .enumerate()
            .with_min_len(PARTICLES_PER_JOB)
            .for_each(|(particle, ((position, velocity), force))| {
                let own_velocity = current.velocities[particle];
                let mut correction = Vec3::ZERO;
                let mut impulse = Vec3::ZERO;
                let mut depth = 0.0;

                self.for_each_contact(grid, frame, &current.positions, particle, |contact| {
                    correction += contact.normal * (0.5 * contact.penetration);

                    let approach = (own_velocity - current.velocities[contact.other]).dot(contact.normal);
                    if approach < 0.0 {
                        impulse -= contact.normal * (0.5 * (1.0 + self.restitution) * approach);
                    }
                    depth += contact.penetration;
                });

                *position = current.positions[particle] + correction;
                *velocity = own_velocity + impulse;
                *force = depth;
            });
    }
}

/// Separation axis for two particles at the same point. Antisymmetric in the
/// pair so both sides push apart.
fn coincident_normal(particle: usize, other: usize) -> Vec3 {
    if particle < other { Vec3::X } else { Vec3::NEG_X }
}
