use std::fmt;
use std::time::{Duration, Instant};

/// The stages of one tick, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStage {
    Reset,
    Index,
    Count,
    Scan,
    Offsets,
    Scatter,
    Collide,
    Integrate,
}

impl FrameStage {
    pub const ALL: [FrameStage; 8] = [
        FrameStage::Reset,
        FrameStage::Index,
        FrameStage::Count,
        FrameStage::Scan,
        FrameStage::Offsets,
        FrameStage::Scatter,
        FrameStage::Collide,
        FrameStage::Integrate,
    ];

    /// The stage that follows this one. `Integrate` wraps around to `Reset`.
    pub fn next(self) -> FrameStage {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            FrameStage::Reset => "reset",
            FrameStage::Index => "index",
            FrameStage::Count => "count",
            FrameStage::Scan => "scan",
            FrameStage::Offsets => "offsets",
            FrameStage::Scatter => "scatter",
            FrameStage::Collide => "collide",
            FrameStage::Integrate => "integrate",
        }
    }
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wall time spent in each stage during the last tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    durations: [Duration; 8],
}

impl StageTimings {
    pub fn record(&mut self, stage: FrameStage, duration: Duration) {
        self.durations[stage.index()] = duration;
    }

    pub fn get(&self, stage: FrameStage) -> Duration {
        self.durations[stage.index()]
    }

    pub fn total(&self) -> Duration {
        self.durations.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameStage, Duration)> + '_ {
        FrameStage::ALL.iter().map(|&stage| (stage, self.get(stage)))
    }
}

impl fmt::Display for StageTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (stage, duration) in self.iter() {
            write!(f, "{stage}: {:.3}ms ", duration.as_secs_f64() * 1000.0)?;
        }
        write!(f, "(total {:.3}ms)", self.total().as_secs_f64() * 1000.0)
    }
}

/// Runs the stages of a tick strictly one after the other.
///
/// Every stage is a blocking call that only returns once all of its parallel
/// work has finished, so returning from [`FrameScheduler::run`] is the barrier
/// between a stage and the next.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    current_stage: FrameStage,
    timings: StageTimings,
    committed_ticks: u64,
    discarded_ticks: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self {
            // as if a tick had just finished, so the first stage entered is Reset
            current_stage: FrameStage::Integrate,
            timings: StageTimings::default(),
            committed_ticks: 0,
            discarded_ticks: 0,
        }
    }
}

impl FrameScheduler {
    /// Enters `stage`, runs `work` to completion and records its wall time.
    pub fn run<R>(&mut self, stage: FrameStage, work: impl FnOnce() -> R) -> R {
        debug_assert!(
            stage == FrameStage::Reset || stage == self.current_stage.next(),
            "stage {stage} entered after {}",
            self.current_stage
        );
        self.current_stage = stage;
        log::trace!("Entering stage {stage}");

        let started = Instant::now();
        let result = work();
        self.timings.record(stage, started.elapsed());
        result
    }

    pub(crate) fn commit(&mut self) {
        self.committed_ticks += 1;
        #[cfg(feature = "benchmark")]
        log::debug!("Tick {} stage timings: {}", self.committed_ticks, self.timings);
    }

    pub(crate) fn discard(&mut self) {
        self.discarded_ticks += 1;
    }

    /// The stage most recently entered.
    pub fn current_stage(&self) -> FrameStage {
        self.current_stage
    }

    pub fn timings(&self) -> &StageTimings {
        &self.timings
    }

    pub fn committed_ticks(&self) -> u64 {
        self.committed_ticks
    }

    pub fn discarded_ticks(&self) -> u64 {
        self.discarded_ticks
    }
}
