/// Single point light with an ambient term
use nalgebra::Vector3;

/// Light parameters uploaded as the `u_lightPosition`, `u_lightColor` and
/// `u_ambientColor` uniforms. `base_color` is the flat surface color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// View-space light position
    pub light_position: Vector3<f32>,
    pub light_color: Vector3<f32>,
    pub ambient_color: Vector3<f32>,
    pub base_color: Vector3<f32>,
}

impl Lighting {
    /// Lambertian shading: `ambient * base + light * base * max(L . N, 0)`.
    ///
    /// The CPU twin of the fragment shader. Degenerate normals or a light
    /// sitting on the fragment contribute no diffuse term.
    pub fn shade(&self, normal: &Vector3<f32>, fragment_position: &Vector3<f32>) -> Vector3<f32> {
        let ambient = self.ambient_color.component_mul(&self.base_color);
        ambient + self.light_color.component_mul(&self.base_color) * self.diffuse(normal, fragment_position)
    }

    /// Brightest channel of [`Lighting::shade`] relative to a fully lit
    /// surface, in `[0, 1]`
    pub fn intensity(&self, normal: &Vector3<f32>, fragment_position: &Vector3<f32>) -> f32 {
        let peak = (self.ambient_color + self.light_color)
            .component_mul(&self.base_color)
            .max();
        if peak <= 0.0 {
            return 0.0;
        }
        (self.shade(normal, fragment_position).max() / peak).clamp(0.0, 1.0)
    }

    pub fn diffuse(&self, normal: &Vector3<f32>, fragment_position: &Vector3<f32>) -> f32 {
        let to_light = self.light_position - fragment_position;
        match (to_light.try_normalize(1e-6), normal.try_normalize(1e-6)) {
            (Some(l), Some(n)) => l.dot(&n).max(0.0),
            _ => 0.0,
        }
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            light_position: Vector3::new(0.0, 1.0, 1.0),
            light_color: Vector3::new(1.0, 1.0, 1.0),
            ambient_color: Vector3::new(0.5, 0.5, 0.5),
            base_color: Vector3::new(1.0, 0.0, 0.0),
        }
    }
}
