use std::f32::consts::PI;
use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::particles::particle_buffers::ParticleBuffers;
use crate::particles::particle_integration::particle_transform;
use crate::settings::SimulationSettings;

/// Borrowed views a tick works through.
pub(crate) struct TickBuffers<'a> {
    pub committed: &'a ParticleBuffers,
    pub next: &'a mut ParticleBuffers,
    pub angular_velocities: &'a [Vec3],
    pub scales: &'a [f32],
}

/// Fixed-size particle population.
///
/// Spawn-time attributes (`base_positions`, `angular_velocities`, `scales`) never
/// change. Tick state lives in two [`ParticleBuffers`]: `particle_buffers` is the
/// committed frame everybody reads, `particle_buffers_copy` is scratch space the
/// scheduler fills and then publishes with [`ParticleSystem::commit`].
pub struct ParticleSystem {
    base_positions: Vec<Vec3>,
    angular_velocities: Vec<Vec3>,
    scales: Vec<f32>,
    particle_buffers: ParticleBuffers,
    particle_buffers_copy: ParticleBuffers,
}

impl ParticleSystem {
    /// Scatters `settings.particle_count` particles uniformly inside the world
    /// bounds with random orientation and scale.
    pub fn spawn(settings: &SimulationSettings) -> Self {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::generate_initial_particles(settings, &mut rng)
    }

    fn generate_initial_particles(settings: &SimulationSettings, rng: &mut StdRng) -> Self {
        let num_particles = settings.particle_count as usize;
        let half_bounds = settings.world_bounds() * 0.5;

        let mut positions = Vec::with_capacity(num_particles);
        let mut rotations = Vec::with_capacity(num_particles);
        let mut scales = Vec::with_capacity(num_particles);
        let mut angular_velocities = Vec::with_capacity(num_particles);

        for _ in 0..num_particles {
            positions.push(Vec3::new(
                rng.random_range(-half_bounds.x..half_bounds.x),
                rng.random_range(-half_bounds.y..half_bounds.y),
                rng.random_range(-half_bounds.z..half_bounds.z),
            ));
            rotations.push(Vec3::new(
                rng.random_range(-PI..PI),
                rng.random_range(-PI..PI),
                rng.random_range(-PI..PI),
            ));
            scales.push(settings.particle_size * rng.random_range(0.5..1.5));

            let spin = Vec3::new(
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
            );
            angular_velocities.push(spin * settings.initial_angular_speed);
        }

        Self::from_parts(positions, rotations, scales, angular_velocities)
    }

    /// Builds a system from explicit positions with zero rotation and motion.
    pub fn from_positions(positions: Vec<Vec3>, scale: f32) -> Self {
        let len = positions.len();
        Self::from_parts(positions, vec![Vec3::ZERO; len], vec![scale; len], vec![Vec3::ZERO; len])
    }

    fn from_parts(positions: Vec<Vec3>, rotations: Vec<Vec3>, scales: Vec<f32>, angular_velocities: Vec<Vec3>) -> Self {
        let len = positions.len();
        let mut particle_buffers = ParticleBuffers::with_len(len);
        particle_buffers.transforms = positions
            .iter()
            .zip(&rotations)
            .zip(&scales)
            .map(|((&position, &rotation), &scale)| particle_transform(position, rotation, scale))
            .collect();
        particle_buffers.positions = positions.clone();
        particle_buffers.rotations = rotations;

        Self {
            base_positions: positions,
            angular_velocities,
            scales,
            particle_buffers_copy: particle_buffers.clone(),
            particle_buffers,
        }
    }

    /// Sets the committed velocity of one particle. Out-of-range indices are ignored.
    pub fn set_velocity(&mut self, index: usize, velocity: Vec3) {
        if let Some(v) = self.particle_buffers.velocities.get_mut(index) {
            *v = velocity;
        }
    }

    /// Sets the spin of one particle. Out-of-range indices are ignored.
    pub fn set_angular_velocity(&mut self, index: usize, angular_velocity: Vec3) {
        if let Some(w) = self.angular_velocities.get_mut(index) {
            *w = angular_velocity;
        }
    }

    /// Copies the committed frame into the back buffers so a tick starts from
    /// it, and clears the force accumulators.
    pub(crate) fn prepare_copy_buffers(&mut self) {
        self.particle_buffers_copy.copy_from(&self.particle_buffers);
        self.particle_buffers_copy.forces.fill(0.0);
    }

    /// Publishes the back buffers as the new committed frame.
    pub(crate) fn commit(&mut self) {
        std::mem::swap(&mut self.particle_buffers, &mut self.particle_buffers_copy);
    }

    /// Committed frame plus mutable back buffers, for the stages of one tick.
    pub(crate) fn split_for_tick(&mut self) -> TickBuffers<'_> {
        TickBuffers {
            committed: &self.particle_buffers,
            next: &mut self.particle_buffers_copy,
            angular_velocities: &self.angular_velocities,
            scales: &self.scales,
        }
    }

    pub fn buffers(&self) -> &ParticleBuffers {
        &self.particle_buffers
    }

    pub fn copy_buffers(&self) -> &ParticleBuffers {
        &self.particle_buffers_copy
    }

    pub fn len(&self) -> usize {
        self.base_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_positions.is_empty()
    }

    pub fn base_positions(&self) -> &[Vec3] {
        &self.base_positions
    }

    pub fn angular_velocities(&self) -> &[Vec3] {
        &self.angular_velocities
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.particle_buffers.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.particle_buffers.velocities
    }

    pub fn rotations(&self) -> &[Vec3] {
        &self.particle_buffers.rotations
    }

    pub fn forces(&self) -> &[f32] {
        &self.particle_buffers.forces
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.particle_buffers.transforms
    }
}
