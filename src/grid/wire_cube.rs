use glam::Vec3;

/// Line-list mesh of an axis-aligned box centered at the origin.
/// Used by hosts to draw the simulation bounds and the grid extent.
#[derive(Debug, Clone, PartialEq)]
pub struct WireCube {
    pub vertices: [Vec3; 8],
    pub indices: [u32; 24],
}

impl WireCube {
    pub fn new(size: Vec3) -> Self {
        let h = size * 0.5;
        let vertices = [
            Vec3::new(-h.x, -h.y, -h.z), // 0: left bottom back
            Vec3::new(h.x, -h.y, -h.z),  // 1: right bottom back
            Vec3::new(-h.x, h.y, -h.z),  // 2: left top back
            Vec3::new(h.x, h.y, -h.z),   // 3: right top back
            Vec3::new(-h.x, -h.y, h.z),  // 4: left bottom front
            Vec3::new(h.x, -h.y, h.z),   // 5: right bottom front
            Vec3::new(-h.x, h.y, h.z),   // 6: left top front
            Vec3::new(h.x, h.y, h.z),    // 7: right top front
        ];

        let indices = [
            // Back face
            0, 1, 1, 3, 3, 2, 2, 0,
            // Front face
            4, 5, 5, 7, 7, 6, 6, 4,
            // Connecting edges
            0, 4, 1, 5, 2, 6, 3, 7,
        ];

        Self { vertices, indices }
    }

    /// The 12 edges as pairs of endpoints.
    pub fn edges(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.indices
            .chunks_exact(2)
            .map(|pair| (self.vertices[pair[0] as usize], self.vertices[pair[1] as usize]))
    }
}
