use anyhow::Context;

pub mod error;
pub mod settings;
pub mod frame_clock;
pub mod frame_scheduler;
pub mod simulation;

pub mod grid;
pub mod particles;
pub mod physics;
pub mod utils;

#[cfg(feature = "gpu")]
pub mod gpu;

use frame_clock::FrameClock;
use settings::SimulationSettings;
use simulation::Simulation;

/// Headless host: loads settings from the optional RON path given as the
/// first argument, then runs the configured number of ticks.
pub fn run() -> anyhow::Result<()> {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => SimulationSettings::load(&path).with_context(|| format!("Unable to load settings from {path}"))?,
        None => SimulationSettings::default(),
    };
    let host = settings.host.clone();

    let mut simulation = Simulation::new(settings)?;
    let mut clock = FrameClock::from_settings(host.fixed_delta_time)?;

    for tick in 1..=host.ticks {
        let (delta_time, time) = clock.tick();
        if let Err(err) = simulation.tick(delta_time, time) {
            log::debug!("Tick {tick} skipped: {err}");
            continue;
        }

        if host.stats_interval > 0 && tick % host.stats_interval == 0 {
            let stats = simulation.stats();
            log::info!(
                "Tick {tick}: {} occupied cells, max {} particles per cell, total penetration {:.4}",
                stats.occupied_cells,
                stats.max_cell_load,
                stats.total_penetration
            );
        }
    }

    let scheduler = simulation.scheduler();
    log::info!(
        "Finished after {:.2}s: {} ticks committed, {} discarded",
        clock.elapsed().as_secs_f32(),
        scheduler.committed_ticks(),
        scheduler.discarded_ticks()
    );
    Ok(())
}
