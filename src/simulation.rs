use glam::{Mat4, Vec3};
use crate::error::SimError;
use crate::frame_scheduler::{FrameScheduler, FrameStage, StageTimings};
use crate::grid::grid::Grid;
use crate::particles::particle_cell_ids::compute_cell_ids;
use crate::particles::particle_integration::{integrate, IntegrationParams};
use crate::particles::particle_sort::ParticleSort;
use crate::particles::particle_system::ParticleSystem;
use crate::physics::cell_offset_table::CellOffsetTable;
use crate::physics::cell_table_builder::CellTableBuilder;
use crate::physics::collision_solver::CollisionSolver;
use crate::physics::spatial_frame::SpatialFrame;
use crate::settings::SimulationSettings;

/// Arguments of one indexed indirect instanced draw, laid out the way GPU
/// indirect buffers expect them.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawIndirectArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

/// Summary of the committed spatial frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub occupied_cells: usize,
    pub max_cell_load: u32,
    pub total_penetration: f32,
}

/// Owns every buffer of the simulation and advances it one tick at a time.
///
/// Each tick writes into back buffers (particle state and spatial frame) and
/// only swaps them in once every stage finished and the result validated.
/// A failed tick leaves the committed frame exactly as it was.
pub struct Simulation {
    settings: SimulationSettings,
    grid: Grid,
    particle_system: ParticleSystem,
    cell_table_builder: CellTableBuilder,
    particle_sort: ParticleSort,
    collision_solver: CollisionSolver,
    spatial_frame: SpatialFrame,
    spatial_frame_copy: SpatialFrame,
    scheduler: FrameScheduler,
}

impl Simulation {
    /// Validates `settings` and spawns `settings.particle_count` particles.
    pub fn new(settings: SimulationSettings) -> Result<Self, SimError> {
        settings.validate()?;
        let particle_system = ParticleSystem::spawn(&settings);
        Self::with_particle_system(settings, particle_system)
    }

    /// Builds a simulation around an existing population. `particle_count` in
    /// the stored settings is replaced by the population's size.
    pub fn with_particle_system(mut settings: SimulationSettings, particle_system: ParticleSystem) -> Result<Self, SimError> {
        settings.particle_count = u32::try_from(particle_system.len()).map_err(|_| SimError::InvalidSetting {
            name: "particle_count",
            reason: format!("{} particles do not fit in a 32-bit index", particle_system.len()),
        })?;
        settings.validate()?;

        let grid = Grid::new(settings.grid_dimensions(), settings.cell_size())?;
        let num_particles = particle_system.len();
        let num_cells = grid.num_cells();

        log::info!(
            "Starting particle simulation with {} particles on a {} grid ({} cells)",
            num_particles,
            grid.dimensions(),
            num_cells
        );

        let collision_solver = CollisionSolver::new(&grid, &settings);

        Ok(Self {
            cell_table_builder: CellTableBuilder::new(num_cells),
            particle_sort: ParticleSort::new(num_particles),
            spatial_frame: SpatialFrame::new(num_particles, num_cells),
            spatial_frame_copy: SpatialFrame::new(num_particles, num_cells),
            scheduler: FrameScheduler::default(),
            collision_solver,
            particle_system,
            grid,
            settings,
        })
    }

    /// Advances the simulation by `delta_time` seconds; `time` is the absolute
    /// clock used by [`crate::settings::RotationMode::External`].
    pub fn tick(&mut self, delta_time: f32, time: f32) -> Result<(), SimError> {
        if !(delta_time.is_finite() && delta_time >= 0.0 && time.is_finite()) {
            log::warn!("Rejecting tick with delta_time = {delta_time}, time = {time}");
            return Err(SimError::InvalidClock { delta_time, time });
        }

        match self.run_stages(delta_time, time) {
            Ok(()) => {
                self.particle_system.commit();
                std::mem::swap(&mut self.spatial_frame, &mut self.spatial_frame_copy);
                self.scheduler.commit();
                Ok(())
            }
            Err(err) => {
                log::warn!("Discarding tick after stage {}: {err}", self.scheduler.current_stage());
                self.scheduler.discard();
                Err(err)
            }
        }
    }

    fn run_stages(&mut self, delta_time: f32, time: f32) -> Result<(), SimError> {
        let Self {
            settings,
            grid,
            particle_system,
            cell_table_builder,
            particle_sort,
            collision_solver,
            spatial_frame_copy: frame,
            scheduler,
            ..
        } = self;

        scheduler.run(FrameStage::Reset, || {
            particle_system.prepare_copy_buffers();
            cell_table_builder.reset();
        });

        let tick = particle_system.split_for_tick();
        let num_particles = tick.committed.len();

        scheduler.run(FrameStage::Index, || {
            compute_cell_ids(grid, &tick.committed.positions, &mut frame.cell_ids);
        });
        scheduler.run(FrameStage::Count, || cell_table_builder.count(&frame.cell_ids));

        let total = scheduler.run(FrameStage::Scan, || cell_table_builder.scan());
        log::trace!("Scan counted {total} of {num_particles} particles");

        scheduler.run(FrameStage::Offsets, || cell_table_builder.build_offsets(&mut frame.cell_table));
        scheduler.run(FrameStage::Scatter, || {
            particle_sort.scatter(&frame.cell_ids, cell_table_builder.scatter_cursors(), &mut frame.sorted_indices);
        });
        scheduler.run(FrameStage::Collide, || {
            collision_solver.resolve(grid, frame, tick.committed, tick.next);
        });

        let params = IntegrationParams::new(settings, delta_time, time);
        scheduler.run(FrameStage::Integrate, || {
            integrate(&params, tick.next, tick.angular_velocities, tick.scales);
        });

        tick.next.check_finite()?;
        frame.cell_table.verify(num_particles)?;
        if cfg!(debug_assertions) {
            frame.verify()?;
        }
        Ok(())
    }

    /// Arguments for drawing every particle with a mesh of `index_count` indices.
    pub fn draw_indirect_args(&self, index_count: u32) -> DrawIndirectArgs {
        DrawIndirectArgs {
            index_count,
            instance_count: self.particle_count(),
            first_index: 0,
            base_vertex: 0,
            first_instance: 0,
        }
    }

    /// Occupancy and contact totals of the committed frame.
    pub fn stats(&self) -> FrameStats {
        let table = self.spatial_frame.cell_table();
        FrameStats {
            occupied_cells: table.iter().filter(|cell| cell.count > 0).count(),
            max_cell_load: table.iter().map(|cell| cell.count).max().unwrap_or(0),
            total_penetration: self.particle_system.forces().iter().sum(),
        }
    }

    /// Sets a committed velocity; takes effect on the next tick.
    pub fn set_velocity(&mut self, index: usize, velocity: Vec3) {
        self.particle_system.set_velocity(index, velocity);
    }

    pub fn transforms(&self) -> &[Mat4] {
        self.particle_system.transforms()
    }

    /// The transforms as raw bytes, ready for an instance buffer upload.
    pub fn transform_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.particle_system.transforms())
    }

    pub fn particle_count(&self) -> u32 {
        self.settings.particle_count
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particle_system
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn collision_solver(&self) -> &CollisionSolver {
        &self.collision_solver
    }

    pub fn spatial_frame(&self) -> &SpatialFrame {
        &self.spatial_frame
    }

    pub fn sorted_indices(&self) -> &[u32] {
        self.spatial_frame.sorted_indices()
    }

    pub fn cell_ids(&self) -> &[u32] {
        self.spatial_frame.cell_ids()
    }

    pub fn cell_table(&self) -> &CellOffsetTable {
        self.spatial_frame.cell_table()
    }

    pub fn current_stage(&self) -> FrameStage {
        self.scheduler.current_stage()
    }

    pub fn stage_timings(&self) -> &StageTimings {
        self.scheduler.timings()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }
}
