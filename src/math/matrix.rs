use super::Vec3;

/// 4x4 affine frame (column-major, same layout the renderer uploads)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub data: [f32; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0,
                0.0, 1.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    pub fn translation(offset: Vec3) -> Self {
        let mut m = Self::identity();
        m.data[12] = offset.x;
        m.data[13] = offset.y;
        m.data[14] = offset.z;
        m
    }

    /// Right-handed rotation of `angle` radians around `axis`.
    ///
    /// The axis is normalized first; a zero axis yields the identity.
    pub fn rotation_axis(angle: f32, axis: Vec3) -> Self {
        if axis.length() == 0.0 {
            return Self::identity();
        }
        let Vec3 { x, y, z } = axis.normalize();
        let c = angle.cos();
        let s = angle.sin();
        let t = 1.0 - c;

        Self {
            data: [
                x * x * t + c,     y * x * t + z * s, z * x * t - y * s, 0.0,
                x * y * t - z * s, y * y * t + c,     z * y * t + x * s, 0.0,
                x * z * t + y * s, y * z * t - x * s, z * z * t + c,     0.0,
                0.0,               0.0,               0.0,               1.0,
            ],
        }
    }

    /// Matrix multiplication
    pub fn mul(&self, other: &Mat4) -> Self {
        let mut result = [0.0f32; 16];

        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.data[row + k * 4] * other.data[k + col * 4];
                }
                result[row + col * 4] = sum;
            }
        }

        Self { data: result }
    }

    /// Rotate in the local frame (`self * R`)
    pub fn rotate(&self, angle: f32, axis: Vec3) -> Self {
        self.mul(&Self::rotation_axis(angle, axis))
    }

    /// Translate in the local frame (`self * T`)
    pub fn translate(&self, offset: Vec3) -> Self {
        self.mul(&Self::translation(offset))
    }

    /// Transform a point (applies translation)
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.data[0] * p.x + self.data[4] * p.y + self.data[8] * p.z + self.data[12],
            self.data[1] * p.x + self.data[5] * p.y + self.data[9] * p.z + self.data[13],
            self.data[2] * p.x + self.data[6] * p.y + self.data[10] * p.z + self.data[14],
        )
    }
}
