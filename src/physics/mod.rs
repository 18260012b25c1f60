pub mod cell_offset_table;
pub mod cell_table_builder;
pub mod collision_solver;
pub mod spatial_frame;
