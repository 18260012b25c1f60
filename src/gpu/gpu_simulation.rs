use glam::{Mat4, UVec3, Vec3, Vec4};
use wgpu::CommandEncoder;
use crate::error::SimError;
use crate::frame_scheduler::FrameStage;
use crate::gpu::wgpu_context::WgpuContext;
use crate::grid::grid::Grid;
use crate::particles::particle_system::ParticleSystem;
use crate::physics::cell_offset_table::{CellOffsetTable, CellRange};
use crate::settings::{RotationMode, SimulationSettings};
use crate::utils::bind_resources::{BindResources, BindingKind};
use crate::utils::compute_shader::ComputeShader;
use crate::utils::gpu_buffer::GpuBuffer;
use crate::utils::prefix_sum::prefix_sum::PrefixSum;

const WORKGROUP_SIZE: (u32, u32, u32) = (64, 1, 1);

const SPATIAL_GRID_SHADER: &str = concat!(
    include_str!("shaders/grid_common.wgsl"),
    include_str!("shaders/spatial_grid.wgsl")
);
const COLLIDE_SHADER: &str = concat!(
    include_str!("shaders/grid_common.wgsl"),
    include_str!("shaders/collide.wgsl")
);
const INTEGRATE_SHADER: &str = include_str!("shaders/integrate.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GridParams {
    dimensions: UVec3,
    num_particles: u32,
    cell_size: Vec3,
    num_cells: u32,
    interaction_radius: f32,
    restitution: f32,
    stencil_radius: u32,
    _padding: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct IntegrateParams {
    external_velocity: Vec3,
    delta_time: f32,
    external_rotation: Vec3,
    time: f32,
    half_bounds: Vec3,
    speed: f32,
    damping: f32,
    max_velocity: f32,
    rotation_mode: u32,
    num_particles: u32,
}

/// The tick pipeline as compute passes.
///
/// Every stage is its own compute pass, so a pass only starts once the
/// previous one has finished writing. Collide reads the committed buffers and
/// writes the `*_next` ones; the tick ends by copying them back.
pub struct GpuSimulation {
    settings: SimulationSettings,
    grid: Grid,
    num_particles: u32,

    positions: GpuBuffer<Vec4>,
    positions_next: GpuBuffer<Vec4>,
    velocities: GpuBuffer<Vec4>,
    velocities_next: GpuBuffer<Vec4>,
    rotations: GpuBuffer<Vec4>,
    rotations_next: GpuBuffer<Vec4>,
    _angular_velocities: GpuBuffer<Vec4>,
    _scales: GpuBuffer<f32>,
    forces: GpuBuffer<f32>,
    transforms: GpuBuffer<Mat4>,

    cell_ids: GpuBuffer<u32>,
    cell_counts: GpuBuffer<u32>,
    cell_starts: GpuBuffer<u32>,
    cell_table: GpuBuffer<CellRange>,
    _scatter_cursors: GpuBuffer<u32>,
    sorted_indices: GpuBuffer<u32>,

    _grid_params: GpuBuffer<GridParams>,
    integrate_params: GpuBuffer<IntegrateParams>,

    spatial_bind_resources: BindResources,
    collide_bind_resources: BindResources,
    integrate_bind_resources: BindResources,

    reset_cells_pass: ComputeShader,
    index_and_count_pass: ComputeShader,
    build_cell_table_pass: ComputeShader,
    scatter_pass: ComputeShader,
    collide_pass: ComputeShader,
    integrate_pass: ComputeShader,
    prefix_sum: PrefixSum,
}

impl GpuSimulation {
    pub fn new(wgpu_context: &WgpuContext, settings: &SimulationSettings, particle_system: &ParticleSystem) -> anyhow::Result<Self> {
        let mut settings = settings.clone();
        settings.particle_count = u32::try_from(particle_system.len())?;
        settings.validate()?;

        let grid = Grid::new(settings.grid_dimensions(), settings.cell_size())?;
        let num_particles = settings.particle_count;
        let num_cells = grid.num_cells();
        let n = particle_system.len();

        log::info!("Starting GPU particle simulation with {num_particles} particles and {num_cells} cells");

        let storage = wgpu::BufferUsages::STORAGE;
        let vec4s = |values: &[Vec3]| values.iter().map(|v| v.extend(0.0)).collect::<Vec<Vec4>>();

        let positions = GpuBuffer::new(wgpu_context, "Positions", vec4s(particle_system.positions()), storage);
        let positions_next = GpuBuffer::new(wgpu_context, "Positions Next", vec4s(particle_system.positions()), storage);
        let velocities = GpuBuffer::new(wgpu_context, "Velocities", vec4s(particle_system.velocities()), storage);
        let velocities_next = GpuBuffer::new(wgpu_context, "Velocities Next", vec4s(particle_system.velocities()), storage);
        let rotations = GpuBuffer::new(wgpu_context, "Rotations", vec4s(particle_system.rotations()), storage);
        let rotations_next = GpuBuffer::new(wgpu_context, "Rotations Next", vec4s(particle_system.rotations()), storage);
        let angular_velocities = GpuBuffer::new(
            wgpu_context,
            "Angular Velocities",
            vec4s(particle_system.angular_velocities()),
            storage,
        );
        let scales = GpuBuffer::new(wgpu_context, "Scales", particle_system.scales().to_vec(), storage);
        let forces = GpuBuffer::<f32>::zeroed(wgpu_context, "Forces", n, storage);
        let transforms = GpuBuffer::new(wgpu_context, "Transforms", particle_system.transforms().to_vec(), storage);

        let cell_ids = GpuBuffer::<u32>::zeroed(wgpu_context, "Cell Ids", n, storage);
        let cell_counts = GpuBuffer::<u32>::zeroed(wgpu_context, "Cell Counts", num_cells, storage);
        let cell_starts = GpuBuffer::<u32>::zeroed(wgpu_context, "Cell Starts", num_cells, storage);
        let cell_table = GpuBuffer::<CellRange>::zeroed(wgpu_context, "Cell Table", num_cells, storage);
        let scatter_cursors = GpuBuffer::<u32>::zeroed(wgpu_context, "Scatter Cursors", num_cells, storage);
        let sorted_indices = GpuBuffer::<u32>::zeroed(wgpu_context, "Sorted Indices", n, storage);

        let grid_params = GpuBuffer::new(
            wgpu_context,
            "Grid Params",
            vec![GridParams {
                dimensions: grid.dimensions(),
                num_particles,
                cell_size: grid.cell_size(),
                num_cells: num_cells as u32,
                interaction_radius: settings.interaction_radius(),
                restitution: settings.restitution,
                stencil_radius: settings.stencil_radius_cells,
                _padding: 0,
            }],
            wgpu::BufferUsages::UNIFORM,
        );
        let integrate_params: GpuBuffer<IntegrateParams> =
            GpuBuffer::zeroed(wgpu_context, "Integrate Params", 1, wgpu::BufferUsages::UNIFORM);

        let spatial_bind_resources = BindResources::new(
            wgpu_context,
            "Spatial Grid",
            &[
                (BindingKind::Uniform, grid_params.buffer()),
                (BindingKind::Storage, positions.buffer()),
                (BindingKind::Storage, cell_ids.buffer()),
                (BindingKind::Storage, cell_counts.buffer()),
                (BindingKind::Storage, cell_starts.buffer()),
                (BindingKind::Storage, cell_table.buffer()),
                (BindingKind::Storage, scatter_cursors.buffer()),
                (BindingKind::Storage, sorted_indices.buffer()),
            ],
        );
        let collide_bind_resources = BindResources::new(
            wgpu_context,
            "Collide",
            &[
                (BindingKind::Uniform, grid_params.buffer()),
                (BindingKind::Storage, positions.buffer()),
                (BindingKind::Storage, velocities.buffer()),
                (BindingKind::Storage, cell_table.buffer()),
                (BindingKind::Storage, sorted_indices.buffer()),
                (BindingKind::Storage, positions_next.buffer()),
                (BindingKind::Storage, velocities_next.buffer()),
                (BindingKind::Storage, forces.buffer()),
            ],
        );
        let integrate_bind_resources = BindResources::new(
            wgpu_context,
            "Integrate",
            &[
                (BindingKind::Uniform, integrate_params.buffer()),
                (BindingKind::Storage, positions_next.buffer()),
                (BindingKind::Storage, velocities_next.buffer()),
                (BindingKind::Storage, rotations.buffer()),
                (BindingKind::Storage, rotations_next.buffer()),
                (BindingKind::Storage, angular_velocities.buffer()),
                (BindingKind::Storage, scales.buffer()),
                (BindingKind::Storage, transforms.buffer()),
            ],
        );

        let device = wgpu_context.get_device();
        let spatial_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Spatial Grid Shader"),
            source: wgpu::ShaderSource::Wgsl(SPATIAL_GRID_SHADER.into()),
        });
        let collide_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Collide Shader"),
            source: wgpu::ShaderSource::Wgsl(COLLIDE_SHADER.into()),
        });
        let integrate_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Integrate Shader"),
            source: wgpu::ShaderSource::Wgsl(INTEGRATE_SHADER.into()),
        });

        let spatial_layout = &spatial_bind_resources.bind_group_layout;
        let reset_cells_pass = ComputeShader::new(wgpu_context, &spatial_module, "reset_cells", spatial_layout, WORKGROUP_SIZE);
        let index_and_count_pass = ComputeShader::new(wgpu_context, &spatial_module, "index_and_count", spatial_layout, WORKGROUP_SIZE);
        let build_cell_table_pass = ComputeShader::new(wgpu_context, &spatial_module, "build_cell_table", spatial_layout, WORKGROUP_SIZE);
        let scatter_pass = ComputeShader::new(wgpu_context, &spatial_module, "scatter", spatial_layout, WORKGROUP_SIZE);
        let collide_pass = ComputeShader::new(
            wgpu_context,
            &collide_module,
            "collide",
            &collide_bind_resources.bind_group_layout,
            WORKGROUP_SIZE,
        );
        let integrate_pass = ComputeShader::new(
            wgpu_context,
            &integrate_module,
            "integrate",
            &integrate_bind_resources.bind_group_layout,
            WORKGROUP_SIZE,
        );

        let prefix_sum = PrefixSum::new(wgpu_context, &cell_starts);

        Ok(Self {
            settings,
            grid,
            num_particles,
            positions,
            positions_next,
            velocities,
            velocities_next,
            rotations,
            rotations_next,
            _angular_velocities: angular_velocities,
            _scales: scales,
            forces,
            transforms,
            cell_ids,
            cell_counts,
            cell_starts,
            cell_table,
            _scatter_cursors: scatter_cursors,
            sorted_indices,
            _grid_params: grid_params,
            integrate_params,
            spatial_bind_resources,
            collide_bind_resources,
            integrate_bind_resources,
            reset_cells_pass,
            index_and_count_pass,
            build_cell_table_pass,
            scatter_pass,
            collide_pass,
            integrate_pass,
            prefix_sum,
        })
    }

    /// Runs one tick and blocks until the GPU has finished it.
    pub fn tick(&mut self, wgpu_context: &WgpuContext, delta_time: f32, time: f32) -> anyhow::Result<()> {
        if !(delta_time.is_finite() && delta_time >= 0.0 && time.is_finite()) {
            return Err(SimError::InvalidClock { delta_time, time }.into());
        }

        self.integrate_params.replace_elem(
            IntegrateParams {
                external_velocity: self.settings.external_velocity(),
                delta_time,
                external_rotation: self.settings.external_rotation(),
                time,
                half_bounds: self.settings.world_bounds() * 0.5,
                speed: self.settings.speed,
                damping: self.settings.damping,
                max_velocity: self.settings.max_velocity,
                rotation_mode: match self.settings.rotation_mode {
                    RotationMode::Integrate => 0,
                    RotationMode::External => 1,
                },
                num_particles: self.num_particles,
            },
            0,
            wgpu_context,
        );

        let mut encoder = wgpu_context
            .get_device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Tick Encoder") });
        self.encode_stages(&mut encoder);

        wgpu_context.get_queue().submit(Some(encoder.finish()));
        wgpu_context.get_device().poll(wgpu::PollType::Wait)?;
        Ok(())
    }

    fn encode_stages(&self, encoder: &mut CommandEncoder) {
        let particles = (self.num_particles, 1, 1);
        let cells = (self.grid.num_cells() as u32, 1, 1);
        let spatial = &self.spatial_bind_resources.bind_group;

        for stage in FrameStage::ALL {
            log::trace!("Encoding stage {stage}");
            match stage {
                FrameStage::Reset => self.reset_cells_pass.dispatch_by_items(encoder, cells, spatial),
                // Index and Count share one pass; the Count entry is empty
                FrameStage::Index => self.index_and_count_pass.dispatch_by_items(encoder, particles, spatial),
                FrameStage::Count => {}
                FrameStage::Scan => {
                    encoder.copy_buffer_to_buffer(
                        self.cell_counts.buffer(),
                        0,
                        self.cell_starts.buffer(),
                        0,
                        self.cell_counts.byte_len(),
                    );
                    self.prefix_sum.execute(encoder);
                }
                FrameStage::Offsets => self.build_cell_table_pass.dispatch_by_items(encoder, cells, spatial),
                FrameStage::Scatter => self.scatter_pass.dispatch_by_items(encoder, particles, spatial),
                FrameStage::Collide => {
                    self.collide_pass
                        .dispatch_by_items(encoder, particles, &self.collide_bind_resources.bind_group)
                }
                FrameStage::Integrate => {
                    self.integrate_pass
                        .dispatch_by_items(encoder, particles, &self.integrate_bind_resources.bind_group);
                    self.encode_commit(encoder);
                }
            }
        }
    }

    /// Publishes the `*_next` buffers as the committed frame.
    fn encode_commit(&self, encoder: &mut CommandEncoder) {
        if self.num_particles == 0 {
            return;
        }
        for (next, committed) in [
            (&self.positions_next, &self.positions),
            (&self.velocities_next, &self.velocities),
            (&self.rotations_next, &self.rotations),
        ] {
            encoder.copy_buffer_to_buffer(next.buffer(), 0, committed.buffer(), 0, next.byte_len());
        }
    }

    pub fn download_positions(&mut self, wgpu_context: &WgpuContext) -> anyhow::Result<Vec<Vec3>> {
        Ok(self.positions.download(wgpu_context)?.iter().map(|p| p.truncate()).collect())
    }

    pub fn download_velocities(&mut self, wgpu_context: &WgpuContext) -> anyhow::Result<Vec<Vec3>> {
        Ok(self.velocities.download(wgpu_context)?.iter().map(|v| v.truncate()).collect())
    }

    pub fn download_transforms(&mut self, wgpu_context: &WgpuContext) -> anyhow::Result<Vec<Mat4>> {
        Ok(self.transforms.download(wgpu_context)?.to_vec())
    }

    pub fn download_forces(&mut self, wgpu_context: &WgpuContext) -> anyhow::Result<Vec<f32>> {
        Ok(self.forces.download(wgpu_context)?.to_vec())
    }

    pub fn download_cell_ids(&mut self, wgpu_context: &WgpuContext) -> anyhow::Result<Vec<u32>> {
        Ok(self.cell_ids.download(wgpu_context)?.to_vec())
    }

    pub fn download_cell_counts(&mut self, wgpu_context: &WgpuContext) -> anyhow::Result<Vec<u32>> {
        Ok(self.cell_counts.download(wgpu_context)?.to_vec())
    }

    pub fn download_cell_table(&mut self, wgpu_context: &WgpuContext) -> anyhow::Result<CellOffsetTable> {
        Ok(CellOffsetTable::from(self.cell_table.download(wgpu_context)?.to_vec()))
    }

    pub fn download_sorted_indices(&mut self, wgpu_context: &WgpuContext) -> anyhow::Result<Vec<u32>> {
        Ok(self.sorted_indices.download(wgpu_context)?.to_vec())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn particle_count(&self) -> u32 {
        self.num_particles
    }
}
