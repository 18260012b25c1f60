use std::path::Path;
use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};
use crate::error::{SettingsError, SimError};

/// Power-of-two particle counts offered as presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleCount {
    P16 = 16,
    P32 = 32,
    P64 = 64,
    P128 = 128,
    P256 = 256,
    P512 = 512,
    P1024 = 1024,
    P2048 = 2048,
    P4096 = 4096,
    P8192 = 8192,
    P16384 = 16384,
    P32768 = 32768,
    P65536 = 65536,
    P131072 = 131072,
    P262144 = 262144,
    P524288 = 524288,
    P1048576 = 1048576,
    P2097152 = 2097152,
}

impl From<ParticleCount> for u32 {
    fn from(count: ParticleCount) -> Self {
        count as u32
    }
}

/// How the integrator advances each particle's Euler angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationMode {
    /// rotation += (angular_velocity + external_rotation) * dt
    #[default]
    Integrate,
    /// rotation = external_rotation * time
    External,
}

/// Everything the simulation core reads once at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub particle_count: u32,
    pub grid_dimensions: [u32; 3],
    /// World-space size of one cell on each axis.
    pub cell_size: [f32; 3],
    pub particle_radius: f32,
    /// Render scale before the per-particle random factor.
    pub particle_size: f32,
    /// Full size of the containment box, centered at the origin.
    pub world_bounds: [f32; 3],
    pub speed: f32,
    pub max_velocity: f32,
    pub damping: f32,
    pub restitution: f32,
    pub stencil_radius_cells: u32,
    pub external_rotation: [f32; 3],
    pub external_velocity: [f32; 3],
    pub rotation_mode: RotationMode,
    pub initial_angular_speed: f32,
    pub seed: Option<u64>,
    pub host: HostSettings,
}

/// Settings for the headless host loop in [`crate::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    pub ticks: u32,
    /// When `None` the host advances with wall-clock deltas.
    pub fixed_delta_time: Option<f32>,
    pub stats_interval: u32,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            ticks: 600,
            fixed_delta_time: Some(1.0 / 60.0),
            stats_interval: 60,
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            particle_count: ParticleCount::P1024.into(),
            grid_dimensions: [8, 8, 8],
            cell_size: [1.25; 3],
            particle_radius: 0.5,
            particle_size: 0.2,
            world_bounds: [10.0; 3],
            speed: 1.0,
            max_velocity: 10.0,
            damping: 0.1,
            restitution: 0.5,
            stencil_radius_cells: 1,
            external_rotation: [0.0; 3],
            external_velocity: [0.0; 3],
            rotation_mode: RotationMode::Integrate,
            initial_angular_speed: 0.0,
            seed: None,
            host: HostSettings::default(),
        }
    }
}

impl SimulationSettings {
    /// Loads settings from a RON file and validates them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_ron_str(&contents)?;
        log::info!("Loaded simulation settings from {:?}", path.as_ref());
        Ok(settings)
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects configurations that would produce undefined cell ids or
    /// meaningless physics. Called before any buffer is allocated.
    pub fn validate(&self) -> Result<(), SimError> {
        let dims = self.grid_dimensions();
        if dims.min_element() == 0 {
            return Err(SimError::InvalidGridDimensions(dims));
        }
        let num_cells = dims.x as u64 * dims.y as u64 * dims.z as u64;
        if num_cells > u32::MAX as u64 {
            return Err(SimError::TooManyCells(num_cells));
        }
        if !self.cell_size.iter().all(|s| s.is_finite() && *s > 0.0) {
            return Err(SimError::InvalidCellSize(self.cell_size));
        }
        if !self.world_bounds.iter().all(|b| b.is_finite() && *b > 0.0) {
            return Err(invalid("world_bounds", format!("{:?} must be positive", self.world_bounds)));
        }
        if self.stencil_radius_cells == 0 {
            return Err(invalid("stencil_radius_cells", "must be at least 1".into()));
        }
        for (name, value) in [
            ("particle_radius", self.particle_radius),
            ("particle_size", self.particle_size),
            ("speed", self.speed),
            ("max_velocity", self.max_velocity),
            ("damping", self.damping),
            ("initial_angular_speed", self.initial_angular_speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, format!("{value} must be a non-negative number")));
            }
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(invalid("restitution", format!("{} must lie in [0, 1]", self.restitution)));
        }
        let mut fields = self.external_rotation.iter().chain(self.external_velocity.iter());
        if !fields.all(|v| v.is_finite()) {
            return Err(invalid("external fields", "must be finite".into()));
        }
        if let Some(step) = self.host.fixed_delta_time {
            if std::time::Duration::try_from_secs_f32(step).is_err() {
                return Err(invalid("host.fixed_delta_time", format!("{step} is not a representable duration")));
            }
        }
        Ok(())
    }

    /// Creates settings with a uniform scalar cell size.
    pub fn with_uniform_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = [cell_size; 3];
        self
    }

    pub fn grid_dimensions(&self) -> UVec3 {
        UVec3::from_array(self.grid_dimensions)
    }

    pub fn cell_size(&self) -> Vec3 {
        Vec3::from_array(self.cell_size)
    }

    pub fn world_bounds(&self) -> Vec3 {
        Vec3::from_array(self.world_bounds)
    }

    pub fn external_rotation(&self) -> Vec3 {
        Vec3::from_array(self.external_rotation)
    }

    pub fn external_velocity(&self) -> Vec3 {
        Vec3::from_array(self.external_velocity)
    }

    /// Two particles touch when their centers are closer than this.
    pub fn interaction_radius(&self) -> f32 {
        2.0 * self.particle_radius
    }
}

fn invalid(name: &'static str, reason: String) -> SimError {
    SimError::InvalidSetting { name, reason }
}
