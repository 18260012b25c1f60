use glam::{IVec3, UVec3, Vec3};
use crate::error::SimError;

/// Uniform 3D grid centered at the origin.
///
/// Cell coordinates run from `0` to `dimensions - 1` on each axis and map to a
/// linear id `x + y * dim_x + z * dim_x * dim_y`. Positions outside the grid are
/// clamped onto the border cells so every particle is always counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    dimensions: UVec3,
    cell_size: Vec3,
    half_dimensions: Vec3,
}

impl Grid {
    pub fn new(dimensions: UVec3, cell_size: Vec3) -> Result<Grid, SimError> {
        if dimensions.min_element() == 0 {
            return Err(SimError::InvalidGridDimensions(dimensions));
        }
        let num_cells = dimensions.x as u64 * dimensions.y as u64 * dimensions.z as u64;
        if num_cells > u32::MAX as u64 {
            return Err(SimError::TooManyCells(num_cells));
        }
        if !cell_size.is_finite() || cell_size.min_element() <= 0.0 {
            return Err(SimError::InvalidCellSize(cell_size.to_array()));
        }

        Ok(Grid {
            dimensions,
            cell_size,
            half_dimensions: dimensions.as_vec3() * 0.5,
        })
    }

    /// Unclamped cell coordinate: `floor(position / cell_size + dimensions / 2)`.
    pub fn raw_cell_coord(&self, position: Vec3) -> IVec3 {
        (position / self.cell_size + self.half_dimensions).floor().as_ivec3()
    }

    /// Cell coordinate of a position, clamped to the border cells.
    /// NaN components land in cell 0 of that axis.
    pub fn cell_coord(&self, position: Vec3) -> UVec3 {
        let max = (self.dimensions - UVec3::ONE).as_ivec3();
        // `as_ivec3` saturates infinities and maps NaN to 0
        self.raw_cell_coord(position).clamp(IVec3::ZERO, max).as_uvec3()
    }

    pub fn cell_id(&self, position: Vec3) -> u32 {
        self.linear_id(self.cell_coord(position))
    }

    pub fn linear_id(&self, coord: UVec3) -> u32 {
        coord.x + coord.y * self.dimensions.x + coord.z * self.dimensions.x * self.dimensions.y
    }

    pub fn coord_of(&self, cell_id: u32) -> UVec3 {
        let layer = self.dimensions.x * self.dimensions.y;
        UVec3::new(
            cell_id % self.dimensions.x,
            (cell_id % layer) / self.dimensions.x,
            cell_id / layer,
        )
    }

    pub fn contains_coord(&self, coord: IVec3) -> bool {
        coord.cmpge(IVec3::ZERO).all() && coord.cmplt(self.dimensions.as_ivec3()).all()
    }

    /// Calls `f` with the id of every in-bounds cell in the `(2r + 1)^3` block
    /// centered on `center`.
    pub fn for_each_stencil_cell<F>(&self, center: UVec3, radius_cells: u32, mut f: F)
    where
        F: FnMut(u32),
    {
        let r = radius_cells as i32;
        let center = center.as_ivec3();
        let lo = (center - IVec3::splat(r)).max(IVec3::ZERO);
        let hi = (center + IVec3::splat(r)).min(self.dimensions.as_ivec3() - IVec3::ONE);

        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    f(self.linear_id(UVec3::new(x as u32, y as u32, z as u32)));
                }
            }
        }
    }

    /// Ids of the stencil cells around `center`, in ascending order.
    pub fn stencil(&self, center: UVec3, radius_cells: u32) -> Vec<u32> {
        let mut cells = Vec::new();
        self.for_each_stencil_cell(center, radius_cells, |cell| cells.push(cell));
        cells
    }

    pub fn num_cells(&self) -> usize {
        self.dimensions.x as usize * self.dimensions.y as usize * self.dimensions.z as usize
    }

    pub fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    /// World-space size of the whole grid.
    pub fn extent(&self) -> Vec3 {
        self.dimensions.as_vec3() * self.cell_size
    }

    /// World-space minimum corner of a cell.
    pub fn cell_origin(&self, coord: UVec3) -> Vec3 {
        (coord.as_vec3() - self.half_dimensions) * self.cell_size
    }
}
