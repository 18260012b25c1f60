use glam::{Mat4, Vec3};
use rayon::prelude::*;
use crate::error::SimError;

/// Per-particle state that a tick rewrites. The particle system keeps two of
/// these: the committed frame and a back copy that the stages write into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleBuffers {
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
    /// Euler angles in radians (x = pitch, y = yaw, z = roll).
    pub rotations: Vec<Vec3>,
    /// Penetration depth accumulated by the collide stage this tick.
    pub forces: Vec<f32>,
    pub transforms: Vec<Mat4>,
}

impl ParticleBuffers {
    pub fn with_len(len: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; len],
            velocities: vec![Vec3::ZERO; len],
            rotations: vec![Vec3::ZERO; len],
            forces: vec![0.0; len],
            transforms: vec![Mat4::IDENTITY; len],
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Overwrites this buffer set with `other` without reallocating.
    pub fn copy_from(&mut self, other: &ParticleBuffers) {
        self.positions.clone_from(&other.positions);
        self.velocities.clone_from(&other.velocities);
        self.rotations.clone_from(&other.rotations);
        self.forces.clone_from(&other.forces);
        self.transforms.clone_from(&other.transforms);
    }

    /// Finds the first particle with a NaN or infinite field, checking
    /// positions, velocities, rotations and transforms in that order.
    pub fn check_finite(&self) -> Result<(), SimError> {
        if let Some(index) = self.positions.par_iter().position_first(|p| !p.is_finite()) {
            return Err(SimError::NonFiniteState { index, field: "position" });
        }
        if let Some(index) = self.velocities.par_iter().position_first(|v| !v.is_finite()) {
            return Err(SimError::NonFiniteState { index, field: "velocity" });
        }
        if let Some(index) = self.rotations.par_iter().position_first(|r| !r.is_finite()) {
            return Err(SimError::NonFiniteState { index, field: "rotation" });
        }
        if let Some(index) = self.transforms.par_iter().position_first(|t| !t.is_finite()) {
            return Err(SimError::NonFiniteState { index, field: "transform" });
        }
        Ok(())
    }
}
