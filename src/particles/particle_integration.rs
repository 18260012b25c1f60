use std::f32::consts::{PI, TAU};
use glam::{EulerRot, Mat4, Quat, Vec3};
use rayon::prelude::*;
use crate::particles::particle_buffers::ParticleBuffers;
use crate::particles::particle_cell_ids::PARTICLES_PER_JOB;
use crate::settings::{RotationMode, SimulationSettings};

/// Tick-global inputs of the integrate stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationParams {
    pub delta_time: f32,
    pub time: f32,
    pub speed: f32,
    pub damping: f32,
    pub max_velocity: f32,
    pub external_velocity: Vec3,
    pub external_rotation: Vec3,
    pub rotation_mode: RotationMode,
    /// Half of the containment box; the box is centered at the origin.
    pub half_bounds: Vec3,
}

impl IntegrationParams {
    pub fn new(settings: &SimulationSettings, delta_time: f32, time: f32) -> Self {
        Self {
            delta_time,
            time,
            speed: settings.speed,
            damping: settings.damping,
            max_velocity: settings.max_velocity,
            external_velocity: settings.external_velocity(),
            external_rotation: settings.external_rotation(),
            rotation_mode: settings.rotation_mode,
            half_bounds: settings.world_bounds() * 0.5,
        }
    }
}

/// Integrate stage over the whole back buffer set.
pub fn integrate(params: &IntegrationParams, buffers: &mut ParticleBuffers, angular_velocities: &[Vec3], scales: &[f32]) {
    let ParticleBuffers { positions, velocities, rotations, transforms, .. } = buffers;

    positions
        .par_iter_mut()
        .zip(velocities.par_iter_mut())
        .zip(rotations.par_iter_mut())
        .zip(transforms.par_iter_mut())
        .zip(angular_velocities.par_iter().zip(scales.par_iter()))
        .with_min_len(PARTICLES_PER_JOB)
        .for_each(|((((position, velocity), rotation), transform), (&angular_velocity, &scale))| {
            integrate_particle(params, position, velocity, rotation, angular_velocity);
            *transform = particle_transform(*position, *rotation, scale);
        });
}

/// Advances one particle and keeps it inside the bounds.
pub fn integrate_particle(
    params: &IntegrationParams,
    position: &mut Vec3,
    velocity: &mut Vec3,
    rotation: &mut Vec3,
    angular_velocity: Vec3,
) {
    let dt = params.delta_time;

    let mut v = *velocity + params.external_velocity * params.speed * dt;
    v *= (1.0 - params.damping * dt).max(0.0);
    v = v.clamp_length_max(params.max_velocity);
    let mut p = *position + v * dt;

    for axis in 0..3 {
        let half = params.half_bounds[axis];
        if p[axis] > half {
            p[axis] = half;
            v[axis] = -v[axis].abs();
        } else if p[axis] < -half {
            p[axis] = -half;
            v[axis] = v[axis].abs();
        }
    }

    *position = p;
    *velocity = v;
    *rotation = match params.rotation_mode {
        RotationMode::Integrate => wrap_angles(*rotation + (angular_velocity + params.external_rotation) * dt),
        RotationMode::External => wrap_angles(params.external_rotation * params.time),
    };
}

/// Maps an angle into `[-PI, PI)`.
pub fn wrap_angle(angle: f32) -> f32 {
    let mut wrapped = (angle + PI).rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= TAU {
        wrapped -= TAU;
    }
    wrapped - PI
}

pub fn wrap_angles(angles: Vec3) -> Vec3 {
    Vec3::new(wrap_angle(angles.x), wrap_angle(angles.y), wrap_angle(angles.z))
}

/// Scale, then yaw (Y), pitch (X), roll (Z), then translation.
pub fn particle_transform(position: Vec3, rotation: Vec3, scale: f32) -> Mat4 {
    let orientation = Quat::from_euler(EulerRot::YXZ, rotation.y, rotation.x, rotation.z);
    Mat4::from_scale_rotation_translation(Vec3::splat(scale), orientation, position)
}
