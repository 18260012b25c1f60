pub mod grid;
pub mod wire_cube;
