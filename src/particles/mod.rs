pub mod particle_system;
pub mod particle_integration;
pub mod particle_buffers;
pub mod particle_sort;
pub mod particle_cell_ids;
