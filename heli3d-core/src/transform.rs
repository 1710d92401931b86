/// Model transforms: position, Euler rotation and scale
use nalgebra::{Matrix4, Vector3};

use crate::math::{multiply, wrap_angle};

/// Position, rotation (Euler angles in radians) and scale of one object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn new(position: Vector3<f32>, rotation: Vector3<f32>, scale: Vector3<f32>) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotation.x += dx;
        self.rotation.y += dy;
        self.rotation.z += dz;
    }

    /// Keep every Euler angle inside `[0, 2π)`
    pub fn wrap_rotation(&mut self) {
        self.rotation = self.rotation.map(wrap_angle);
    }

    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.position += delta;
    }

    /// `base * translation * rotation * scale`
    ///
    /// `base` is the camera view matrix for top-level objects, or the
    /// parent's model-view matrix for nested instances.
    pub fn model_view_matrix(&self, base: &Matrix4<f32>) -> Matrix4<f32> {
        let local = multiply(
            &translation_matrix(&self.position),
            &multiply(&rotation_matrix(&self.rotation), &scale_matrix(&self.scale)),
        );
        multiply(base, &local)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Fused Euler rotation matrix.
///
/// Built from products of the sines and cosines of all three angles in one
/// expression. It equals `Rz(-z) * Ry(-y) * Rx(-x)`, i.e. the transpose of
/// `Rx(x) * Ry(y) * Rz(z)`.
pub fn rotation_matrix(rotation: &Vector3<f32>) -> Matrix4<f32> {
    let (sx, cx) = rotation.x.sin_cos();
    let (sy, cy) = rotation.y.sin_cos();
    let (sz, cz) = rotation.z.sin_cos();

    #[rustfmt::skip]
    let m = Matrix4::new(
        cy * cz,  cx * sz + cz * sx * sy, sx * sz - cx * cz * sy, 0.0,
        -cy * sz, cx * cz - sx * sy * sz, cz * sx + cx * sy * sz, 0.0,
        sy,       -cy * sx,               cx * cy,                0.0,
        0.0,      0.0,                    0.0,                    1.0,
    );
    m
}

pub fn translation_matrix(position: &Vector3<f32>) -> Matrix4<f32> {
    Matrix4::new_translation(position)
}

pub fn scale_matrix(scale: &Vector3<f32>) -> Matrix4<f32> {
    Matrix4::new_nonuniform_scaling(scale)
}
