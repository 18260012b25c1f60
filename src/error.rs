use glam::UVec3;

/// Errors raised while building the simulation or advancing a tick.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("grid dimensions must be positive on every axis, got {0}")]
    InvalidGridDimensions(UVec3),

    #[error("grid of {0} cells does not fit in a 32-bit cell id")]
    TooManyCells(u64),

    #[error("cell size must be positive and finite, got {0:?}")]
    InvalidCellSize([f32; 3]),

    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("invalid clock values (delta_time = {delta_time}, time = {time})")]
    InvalidClock { delta_time: f32, time: f32 },

    #[error("particle {index} left the tick with a non-finite {field}")]
    NonFiniteState { index: usize, field: &'static str },

    #[error("cell table is inconsistent: {0}")]
    CorruptCellTable(String),
}

/// Errors raised while loading settings from disk.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error(transparent)]
    Invalid(#[from] SimError),
}
