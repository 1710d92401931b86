/// Demo configuration loaded from RON
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::ConfigError;
use crate::lighting::Lighting;
use crate::projection::{perspective, Camera};
use crate::transform::Transform;

/// Every tunable constant of the demo. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct DemoConfig {
    pub camera: CameraConfig,
    pub helicopter: HelicopterConfig,
    pub lighting: LightingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Lateral pan is clamped to `[-pan_limit, pan_limit]`
    pub pan_limit: f32,
    /// Pan distance per reference frame
    pub pan_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, -2.0, 10.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            pan_limit: 5.0,
            pan_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TransformConfig {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl From<TransformConfig> for Transform {
    fn from(config: TransformConfig) -> Self {
        Transform::new(
            Vector3::from(config.position),
            Vector3::from(config.rotation),
            Vector3::from(config.scale),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HelicopterConfig {
    pub body: TransformConfig,
    /// One entry per tail-fan instance, relative to the body
    pub tail_fans: Vec<TransformConfig>,
    /// Body travel per reference frame
    pub move_step: f32,
    /// Background zoom percentage at rest; backward flight stops here
    pub background_baseline: f32,
    /// Upper bound for the background zoom percentage
    pub background_ceiling: f32,
}

impl Default for HelicopterConfig {
    fn default() -> Self {
        Self {
            body: TransformConfig {
                position: [-10.0, -4.0, -10.0],
                rotation: [0.0, 0.0, 0.0],
                scale: [1.0, 2.0, 5.0],
            },
            tail_fans: vec![TransformConfig {
                position: [0.0, 1.5, 0.0],
                rotation: [0.0, 0.5, 0.0],
                scale: [2.0, 2.0, 1.0],
            }],
            move_step: 0.1,
            background_baseline: 100.0,
            background_ceiling: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub light_position: [f32; 3],
    pub light_color: [f32; 3],
    pub ambient_color: [f32; 3],
    pub base_color: [f32; 3],
}

impl Default for LightingConfig {
    fn default() -> Self {
        let lighting = Lighting::default();
        Self {
            light_position: lighting.light_position.into(),
            light_color: lighting.light_color.into(),
            ambient_color: lighting.ambient_color.into(),
            base_color: lighting.base_color.into(),
        }
    }
}

impl From<&LightingConfig> for Lighting {
    fn from(config: &LightingConfig) -> Self {
        Lighting {
            light_position: Vector3::from(config.light_position),
            light_color: Vector3::from(config.light_color),
            ambient_color: Vector3::from(config.ambient_color),
            base_color: Vector3::from(config.base_color),
        }
    }
}

impl DemoConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: DemoConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&source)?;
        info!(path = %path.display(), "loaded demo config");
        Ok(config)
    }

    /// Reject projection parameters that cannot produce a valid matrix and
    /// motion rates the update step cannot use.
    /// Aspect is only known at draw time, so a unit aspect is assumed here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        perspective(camera.fov_degrees.to_radians(), 1.0, camera.near, camera.far)?;

        let helicopter = &self.helicopter;
        for (field, value) in [
            ("camera.pan_limit", camera.pan_limit),
            ("camera.pan_step", camera.pan_step),
            ("helicopter.move_step", helicopter.move_step),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        for (field, value) in [
            ("helicopter.background_baseline", helicopter.background_baseline),
            ("helicopter.background_ceiling", helicopter.background_ceiling),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        Ok(())
    }

    /// Camera at its configured start position for the given aspect ratio
    pub fn camera(&self, aspect: f32) -> Camera {
        let camera = &self.camera;
        Camera {
            position: Point3::from(camera.position),
            target: Point3::from(camera.target),
            up: Vector3::from(camera.up),
            fov: camera.fov_degrees.to_radians(),
            aspect,
            near: camera.near,
            far: camera.far,
        }
    }

    pub fn lighting(&self) -> Lighting {
        Lighting::from(&self.lighting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectionError;

    #[test]
    fn test_defaults_match_reference_scene() {
        let config = DemoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.position, [0.0, -2.0, 10.0]);
        assert_eq!(config.helicopter.tail_fans.len(), 1);

        let body = Transform::from(config.helicopter.body);
        assert_eq!(body.scale, Vector3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = DemoConfig::from_ron_str(
            "(camera: (fov_degrees: 60.0, pan_limit: 3.0), lighting: (ambient_color: (0.2, 0.2, 0.2)))",
        )
        .unwrap();
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.pan_limit, 3.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.lighting.ambient_color, [0.2, 0.2, 0.2]);
        assert_eq!(config.helicopter, HelicopterConfig::default());
    }

    #[test]
    fn test_multiple_tail_fans() {
        let config = DemoConfig::from_ron_str(
            "(helicopter: (tail_fans: [
                (position: (0.0, 1.5, 0.0), rotation: (0.0, 0.5, 0.0), scale: (2.0, 2.0, 1.0)),
                (position: (0.0, 1.5, 1.0), rotation: (0.0, 0.0, 0.0), scale: (1.0, 1.0, 1.0)),
            ]))",
        )
        .unwrap();
        assert_eq!(config.helicopter.tail_fans.len(), 2);
        assert_eq!(config.helicopter.move_step, 0.1);
    }

    #[test]
    fn test_invalid_projection_rejected() {
        let result = DemoConfig::from_ron_str("(camera: (near: 10.0, far: 1.0))");
        assert!(matches!(
            result,
            Err(ConfigError::Projection(ProjectionError::InvalidRange { .. }))
        ));
    }

    #[test]
    fn test_invalid_motion_values_rejected() {
        let cases = [
            ("(camera: (pan_limit: NaN))", "camera.pan_limit"),
            ("(camera: (pan_limit: -1.0))", "camera.pan_limit"),
            ("(camera: (pan_step: NaN))", "camera.pan_step"),
            ("(camera: (pan_step: -0.1))", "camera.pan_step"),
            ("(helicopter: (move_step: NaN))", "helicopter.move_step"),
            ("(helicopter: (move_step: -0.5))", "helicopter.move_step"),
            ("(helicopter: (background_baseline: NaN))", "helicopter.background_baseline"),
            ("(helicopter: (background_ceiling: NaN))", "helicopter.background_ceiling"),
        ];
        for (source, expected) in cases {
            match DemoConfig::from_ron_str(source) {
                Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, expected, "{source}"),
                other => panic!("{source} was not rejected: {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_motion_rates_accepted() {
        let config =
            DemoConfig::from_ron_str("(camera: (pan_limit: 0.0, pan_step: 0.0), helicopter: (move_step: 0.0))")
                .unwrap();
        let mut state = crate::scene::SceneState::new(&config);
        state.update(&crate::input::InputState::new(), 1.0);
        assert_eq!(state.camera_position.x, 0.0);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            DemoConfig::from_ron_str("(camera: oops)"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            DemoConfig::load("/nonexistent/heli3d.ron"),
            Err(ConfigError::Io(_))
        ));
    }
}
