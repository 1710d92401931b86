/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};
use tracing::warn;

use crate::error::{MathError, ProjectionError};
use crate::math::{cross, normalize};

/// Below this length `forward x up` is treated as parallel
const PARALLEL_EPSILON: f32 = 1e-6;

/// Camera configuration for 3D rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, -2.0, 10.0),
            target: Point3::origin(),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: width as f32 / height.max(1) as f32,
            near: 0.1,
            far: 100.0,
        }
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Result<Matrix4<f32>, MathError> {
        view_matrix(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Result<Matrix4<f32>, ProjectionError> {
        perspective(self.fov, self.aspect, self.near, self.far)
    }

    pub fn validate(&self) -> Result<(), ProjectionError> {
        self.projection_matrix().map(|_| ())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Look-at view matrix for a right-handed camera looking down -Z.
///
/// When the view direction is parallel to `up`, an alternate up axis is
/// substituted so the basis stays orthonormal. Fails only when `eye` and
/// `target` coincide or the inputs are not finite.
pub fn view_matrix(
    eye: &Point3<f32>,
    target: &Point3<f32>,
    up: &Vector3<f32>,
) -> Result<Matrix4<f32>, MathError> {
    let forward = normalize(&(target - eye))?;

    let right = match normalize_non_parallel(&forward, up) {
        Some(right) => right,
        None => {
            let alternate = alternate_up(&forward);
            warn!(?up, ?alternate, "view direction parallel to up vector, using alternate up");
            normalize(&cross(&forward, &alternate))?
        }
    };
    let true_up = cross(&right, &forward);
    let eye = eye.coords;

    #[rustfmt::skip]
    let view = Matrix4::new(
        right.x,    right.y,    right.z,    -right.dot(&eye),
        true_up.x,  true_up.y,  true_up.z,  -true_up.dot(&eye),
        -forward.x, -forward.y, -forward.z, forward.dot(&eye),
        0.0,        0.0,        0.0,        1.0,
    );
    Ok(view)
}

fn normalize_non_parallel(forward: &Vector3<f32>, up: &Vector3<f32>) -> Option<Vector3<f32>> {
    let right = cross(forward, up);
    if right.norm() < PARALLEL_EPSILON {
        return None;
    }
    normalize(&right).ok()
}

/// World axis least aligned with `forward`
fn alternate_up(forward: &Vector3<f32>) -> Vector3<f32> {
    if forward.y.abs() < 0.9 {
        Vector3::y()
    } else {
        Vector3::z()
    }
}

/// OpenGL-style perspective projection (clip z in `[-w, w]`).
pub fn perspective(
    fovy: f32,
    aspect: f32,
    near: f32,
    far: f32,
) -> Result<Matrix4<f32>, ProjectionError> {
    if !(fovy.is_finite() && fovy > 0.0 && fovy < std::f32::consts::PI) {
        return Err(ProjectionError::InvalidFieldOfView(fovy));
    }
    if !(aspect.is_finite() && aspect > 0.0) {
        return Err(ProjectionError::InvalidAspect(aspect));
    }
    if !(near > 0.0 && far > near && far.is_finite()) {
        return Err(ProjectionError::InvalidRange { near, far });
    }

    let f = 1.0 / (0.5 * fovy).tan();
    let range_inv = 1.0 / (near - far);

    #[rustfmt::skip]
    let projection = Matrix4::new(
        f / aspect, 0.0, 0.0,                       0.0,
        0.0,        f,   0.0,                       0.0,
        0.0,        0.0, (near + far) * range_inv,  2.0 * near * far * range_inv,
        0.0,        0.0, -1.0,                      0.0,
    );
    Ok(projection)
}

/// Project an object-space point to pixel coordinates.
///
/// `clip_from_object` is the full projection * model-view product. Returns
/// `(x, y, depth)` with depth in NDC `[-1, 1]`, or `None` when the point is
/// behind the eye or outside the near/far planes.
pub fn project_to_viewport(
    clip_from_object: &Matrix4<f32>,
    point: &Point3<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip = clip_from_object * point.to_homogeneous();

    // Prevent division by near-zero or negative w (behind the camera)
    if clip.w <= 1e-6 {
        return None;
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let depth = clip.z / clip.w;

    if !(-1.0..=1.0).contains(&depth) {
        return None;
    }

    // Convert to screen space
    let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

    Some((screen_x, screen_y, depth))
}
