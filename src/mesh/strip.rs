use crate::math::Vec3;

/// Vertex, color and element buffers for a single triangle-strip draw
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMesh {
    pub positions: Vec<Vec3>,
    /// RGBA, one per position
    pub colors: Vec<[f32; 4]>,
    pub elements: Vec<u32>,
}

impl FlatMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a ring of vertices sharing one gray shade and return its first index
    pub fn push_ring(&mut self, points: impl IntoIterator<Item = Vec3>, gray: f32) -> u32 {
        let start = self.positions.len() as u32;
        for point in points {
            self.positions.push(point);
            self.colors.push([gray, gray, gray, 1.0]);
        }
        start
    }

    /// Zig-zag between two rings of `sides` vertices and close the loop.
    ///
    /// The tip ring's first index is repeated at the end so the next ring
    /// stitched onto this strip starts from a degenerate triangle.
    pub fn stitch_rings(&mut self, base: u32, tip: u32, sides: u32) {
        for i in 0..sides {
            self.elements.push(base + i);
            self.elements.push(tip + i);
        }
        self.elements.push(base);
        self.elements.push(tip);
        self.elements.push(tip);
    }

    /// Jump the strip back to `index` without drawing visible triangles
    pub fn break_strip(&mut self, index: u32) {
        self.elements.push(index);
        self.elements.push(index);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Positions as a flat `x, y, z` buffer
    pub fn vertex_data(&self) -> Vec<f32> {
        self.positions.iter().flat_map(|p| p.to_array()).collect()
    }

    /// Colors as a flat `r, g, b, a` buffer
    pub fn color_data(&self) -> Vec<f32> {
        self.colors.iter().flatten().copied().collect()
    }

    pub fn element_data(&self) -> &[u32] {
        &self.elements
    }
}

/// Unit circle in the XZ plane sampled at `sides` evenly spaced angles, starting on +X
pub fn ring_template(sides: usize) -> Vec<Vec3> {
    (0..sides)
        .map(|i| Vec3::horizontal(i as f32 * std::f32::consts::TAU / sides as f32))
        .collect()
}
