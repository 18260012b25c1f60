use std::time::{Duration, Instant};
use crate::error::SimError;

/// Supplies `delta_time` and the absolute `time` for each tick.
///
/// In real-time mode the delta is the wall time since the previous call; in
/// fixed mode every call advances by the same step.
pub struct FrameClock {
    last_tick_time: Instant,
    fixed_delta: Option<Duration>,
    elapsed: Duration,
}

impl FrameClock {
    pub fn real_time() -> Self {
        Self {
            last_tick_time: Instant::now(),
            fixed_delta: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn fixed(delta: Duration) -> Self {
        Self {
            fixed_delta: Some(delta),
            ..Self::real_time()
        }
    }

    /// Picks fixed mode when `fixed_delta_time` is set. Negative, NaN or
    /// overflowing steps are rejected.
    pub fn from_settings(fixed_delta_time: Option<f32>) -> Result<Self, SimError> {
        match fixed_delta_time {
            Some(seconds) => Duration::try_from_secs_f32(seconds).map(Self::fixed).map_err(|err| SimError::InvalidSetting {
                name: "host.fixed_delta_time",
                reason: format!("{seconds}: {err}"),
            }),
            None => Ok(Self::real_time()),
        }
    }

    pub fn get_delta(&mut self) -> Duration {
        let now = Instant::now();
        let delta_time = self.fixed_delta.unwrap_or(now - self.last_tick_time);
        self.last_tick_time = now;
        self.elapsed = self.elapsed.saturating_add(delta_time);
        delta_time
    }

    /// Advances the clock and returns `(delta_time, time)` in seconds.
    pub fn tick(&mut self) -> (f32, f32) {
        let delta = self.get_delta();
        (delta.as_secs_f32(), self.elapsed.as_secs_f32())
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
