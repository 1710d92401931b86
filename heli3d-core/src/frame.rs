//! Frame building and submission.
//!
//! [`build_frame`] is pure: it turns the scene state into uniforms and an
//! ordered list of draw commands. [`submit`] is the only step that talks to a
//! [`DrawBackend`]. [`FrameDriver`] ties update, build and submit into the
//! single `tick` a host render loop calls once per display refresh.

use nalgebra::{Matrix3, Matrix4};
use tracing::{debug, info, warn};

use crate::config::DemoConfig;
use crate::error::{MathError, ProjectionError, RenderError};
use crate::geometry::{Mesh, MeshId};
use crate::input::InputState;
use crate::lighting::Lighting;
use crate::math::{ensure_finite, normal_matrix};
use crate::projection::Camera;
use crate::scene::SceneState;
use crate::transform::Transform;

/// Opaque reference to a mesh uploaded to a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub usize);

/// Uniforms shared by every draw in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub projection: Matrix4<f32>,
    pub lighting: Lighting,
}

/// One indexed-triangle draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub mesh: MeshId,
    /// Instance number within `mesh` (tail fans are numbered in order)
    pub instance: usize,
    pub model_view: Matrix4<f32>,
    pub normal_matrix: Matrix3<f32>,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub uniforms: FrameUniforms,
    pub commands: Vec<DrawCommand>,
    /// Meshes left out because their matrices were malformed
    pub skipped: usize,
    pub background_scale: f32,
}

/// A drawing backend: buffer upload, per-frame uniforms, indexed draws.
///
/// Shader compilation and program linking happen when the backend is
/// constructed and surface as [`RenderError::ShaderCompile`] or
/// [`RenderError::ProgramLink`].
pub trait DrawBackend {
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshHandle, RenderError>;

    /// Upload the projection matrix and light uniforms
    fn begin_frame(&mut self, uniforms: &FrameUniforms) -> Result<(), RenderError>;

    /// Upload the model-view and normal matrices and issue the draw
    fn draw(&mut self, mesh: MeshHandle, command: &DrawCommand) -> Result<(), RenderError>;

    fn end_frame(&mut self) -> Result<(), RenderError>;
}

/// Backend handles for the built-in meshes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHandles {
    pub body: MeshHandle,
    pub tail_fan: MeshHandle,
}

impl MeshHandles {
    /// Upload the body and tail-fan meshes, each to its own buffers
    pub fn upload<B: DrawBackend + ?Sized>(backend: &mut B) -> Result<Self, RenderError> {
        Ok(Self {
            body: backend.upload_mesh(&Mesh::builtin_for(MeshId::Body))?,
            tail_fan: backend.upload_mesh(&Mesh::builtin_for(MeshId::TailFan))?,
        })
    }

    pub fn get(&self, id: MeshId) -> MeshHandle {
        match id {
            MeshId::Body => self.body,
            MeshId::TailFan => self.tail_fan,
        }
    }
}

/// Camera template and lighting; the camera position comes from the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSettings {
    pub camera: Camera,
    pub lighting: Lighting,
}

impl From<&DemoConfig> for FrameSettings {
    fn from(config: &DemoConfig) -> Self {
        Self {
            camera: config.camera(1.0),
            lighting: config.lighting(),
        }
    }
}

/// Compute every matrix for the current scene.
///
/// Only an invalid projection is an error. Malformed model-view matrices drop
/// the affected mesh (and, for the body, the fans nested under it); a
/// singular normal matrix is replaced with the identity.
pub fn build_frame(
    state: &SceneState,
    settings: &FrameSettings,
    aspect: f32,
) -> Result<Frame, ProjectionError> {
    let camera = Camera {
        position: state.camera_position,
        aspect,
        ..settings.camera
    };
    let uniforms = FrameUniforms {
        projection: camera.projection_matrix()?,
        lighting: settings.lighting,
    };

    let mut frame = Frame {
        uniforms,
        commands: Vec::with_capacity(1 + state.tail_fans.len()),
        skipped: 0,
        background_scale: state.background_scale,
    };
    let total = 1 + state.tail_fans.len();

    let view = match camera.view_matrix() {
        Ok(view) => view,
        Err(err) => {
            warn!(%err, eye = ?camera.position, "cannot build view matrix, skipping frame geometry");
            frame.skipped = total;
            return Ok(frame);
        }
    };

    let Some(body) = draw_command(MeshId::Body, 0, &state.body, &view) else {
        frame.skipped = total;
        return Ok(frame);
    };
    frame.commands.push(body);

    for (instance, fan) in state.tail_fans.iter().enumerate() {
        match draw_command(MeshId::TailFan, instance, fan, &body.model_view) {
            Some(command) => frame.commands.push(command),
            None => frame.skipped += 1,
        }
    }

    Ok(frame)
}

fn draw_command(
    mesh: MeshId,
    instance: usize,
    transform: &Transform,
    base: &Matrix4<f32>,
) -> Option<DrawCommand> {
    let model_view = transform.model_view_matrix(base);
    if let Err(err) = ensure_finite(&model_view) {
        warn!(?mesh, instance, %err, "malformed model-view matrix, skipping mesh");
        return None;
    }

    let normal_matrix = match normal_matrix(&model_view) {
        Ok(normal) => normal,
        Err(MathError::SingularMatrix) => {
            debug!(?mesh, instance, "singular normal matrix, using identity");
            Matrix3::identity()
        }
        Err(err) => {
            warn!(?mesh, instance, %err, "cannot derive normal matrix, skipping mesh");
            return None;
        }
    };

    Some(DrawCommand {
        mesh,
        instance,
        model_view,
        normal_matrix,
    })
}

/// Hand a built frame to the backend
pub fn submit<B: DrawBackend + ?Sized>(
    frame: &Frame,
    backend: &mut B,
    handles: &MeshHandles,
) -> Result<(), RenderError> {
    backend.begin_frame(&frame.uniforms)?;
    for command in &frame.commands {
        backend.draw(handles.get(command.mesh), command)?;
    }
    backend.end_frame()
}

/// Per-tick summary returned to the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame_number: u64,
    pub draws: usize,
    pub skipped: usize,
    pub background_scale: f32,
}

/// Owns the scene and drives update, build and submit once per tick
#[derive(Debug, Clone)]
pub struct FrameDriver {
    state: SceneState,
    settings: FrameSettings,
    handles: MeshHandles,
    frame_number: u64,
}

impl FrameDriver {
    /// Validate the configuration and upload the built-in meshes
    pub fn new<B: DrawBackend + ?Sized>(
        config: &DemoConfig,
        backend: &mut B,
    ) -> Result<Self, RenderError> {
        config.validate()?;
        let handles = MeshHandles::upload(backend)?;
        info!(tail_fans = config.helicopter.tail_fans.len(), "frame driver ready");
        Ok(Self {
            state: SceneState::new(config),
            settings: FrameSettings::from(config),
            handles,
            frame_number: 0,
        })
    }

    /// Read input, update the scene, compute matrices and draw.
    ///
    /// `dt` is in reference frames (see [`SceneState::update`]).
    pub fn tick<B: DrawBackend + ?Sized>(
        &mut self,
        input: &InputState,
        dt: f32,
        aspect: f32,
        backend: &mut B,
    ) -> Result<FrameStats, RenderError> {
        if !input.is_empty() {
            debug!(keys = ?input.held().collect::<Vec<_>>(), dt, "input");
        }
        self.state.update(input, dt);
        let frame = build_frame(&self.state, &self.settings, aspect)?;
        submit(&frame, backend, &self.handles)?;
        self.frame_number += 1;

        Ok(FrameStats {
            frame_number: self.frame_number,
            draws: frame.commands.len(),
            skipped: frame.skipped,
            background_scale: frame.background_scale,
        })
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::input::Key;
    use nalgebra::{Point3, Vector3};

    #[derive(Debug, Default)]
    struct RecordingBackend {
        meshes: Vec<Mesh>,
        frames: usize,
        draws: Vec<(MeshHandle, DrawCommand)>,
        projection: Option<Matrix4<f32>>,
        open: bool,
    }

    impl DrawBackend for RecordingBackend {
        fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshHandle, RenderError> {
            self.meshes.push(mesh.clone());
            Ok(MeshHandle(self.meshes.len() - 1))
        }

        fn begin_frame(&mut self, uniforms: &FrameUniforms) -> Result<(), RenderError> {
            assert!(!self.open);
            self.open = true;
            self.projection = Some(uniforms.projection);
            Ok(())
        }

        fn draw(&mut self, mesh: MeshHandle, command: &DrawCommand) -> Result<(), RenderError> {
            assert!(self.open);
            if mesh.0 >= self.meshes.len() {
                return Err(RenderError::UnknownMesh(mesh.0));
            }
            self.draws.push((mesh, *command));
            Ok(())
        }

        fn end_frame(&mut self) -> Result<(), RenderError> {
            self.open = false;
            self.frames += 1;
            Ok(())
        }
    }

    #[test]
    fn test_build_frame_default_scene() {
        let config = DemoConfig::default();
        let state = SceneState::new(&config);
        let frame = build_frame(&state, &FrameSettings::from(&config), 4.0 / 3.0).unwrap();

        assert_eq!(frame.commands.len(), 2);
        assert_eq!(frame.skipped, 0);
        assert_eq!(frame.commands[0].mesh, MeshId::Body);
        assert_eq!(frame.commands[1].mesh, MeshId::TailFan);
        assert_eq!(frame.background_scale, 100.0);
    }

    #[test]
    fn test_fan_is_nested_under_body() {
        let config = DemoConfig::default();
        let state = SceneState::new(&config);
        let frame = build_frame(&state, &FrameSettings::from(&config), 1.0).unwrap();
        let body = &frame.commands[0];
        let fan = &frame.commands[1];

        let expected = state.tail_fans[0].model_view_matrix(&body.model_view);
        assert!((fan.model_view - expected).norm() < 1e-5);

        // fan origin sits at the body-local offset (0, 1.5, 0)
        let fan_origin = fan.model_view.transform_point(&Point3::origin());
        let via_body = body.model_view.transform_point(&Point3::new(0.0, 1.5, 0.0));
        assert!((fan_origin - via_body).norm() < 1e-4);
    }

    #[test]
    fn test_normal_matrix_is_inverse_transpose() {
        let config = DemoConfig::default();
        let state = SceneState::new(&config);
        let frame = build_frame(&state, &FrameSettings::from(&config), 1.0).unwrap();
        for command in &frame.commands {
            let upper: Matrix3<f32> = command.model_view.fixed_view::<3, 3>(0, 0).into_owned();
            let product = command.normal_matrix.transpose() * upper;
            assert!((product - Matrix3::identity()).norm() < 1e-4);
        }
    }

    #[test]
    fn test_singular_scale_uses_identity_normal_matrix() {
        let config = DemoConfig::default();
        let mut state = SceneState::new(&config);
        state.tail_fans[0].scale = Vector3::new(0.0, 1.0, 1.0);
        let frame = build_frame(&state, &FrameSettings::from(&config), 1.0).unwrap();
        assert_eq!(frame.commands.len(), 2);
        assert_eq!(frame.commands[1].normal_matrix, Matrix3::identity());
    }

    #[test]
    fn test_non_finite_body_skips_body_and_fans() {
        let config = DemoConfig::default();
        let mut state = SceneState::new(&config);
        state.body.position.x = f32::NAN;
        let frame = build_frame(&state, &FrameSettings::from(&config), 1.0).unwrap();
        assert!(frame.commands.is_empty());
        assert_eq!(frame.skipped, 2);
    }

    #[test]
    fn test_non_finite_fan_skips_only_fan() {
        let config = DemoConfig::default();
        let mut state = SceneState::new(&config);
        state.tail_fans[0].rotation.y = f32::INFINITY;
        let frame = build_frame(&state, &FrameSettings::from(&config), 1.0).unwrap();
        assert_eq!(frame.commands.len(), 1);
        assert_eq!(frame.commands[0].mesh, MeshId::Body);
        assert_eq!(frame.skipped, 1);
    }

    #[test]
    fn test_invalid_aspect_is_error() {
        let config = DemoConfig::default();
        let state = SceneState::new(&config);
        assert!(matches!(
            build_frame(&state, &FrameSettings::from(&config), 0.0),
            Err(ProjectionError::InvalidAspect(_))
        ));
    }

    #[test]
    fn test_camera_on_target_skips_geometry() {
        let config = DemoConfig::default();
        let mut state = SceneState::new(&config);
        state.camera_position = Point3::origin();
        let frame = build_frame(&state, &FrameSettings::from(&config), 1.0).unwrap();
        assert!(frame.commands.is_empty());
        assert_eq!(frame.skipped, 2);
    }

    #[test]
    fn test_driver_ticks_through_backend() {
        let config = DemoConfig::default();
        let mut backend = RecordingBackend::default();
        let mut driver = FrameDriver::new(&config, &mut backend).unwrap();
        assert_eq!(backend.meshes, vec![Mesh::helicopter_body(), Mesh::tail_fan()]);

        let stats = driver
            .tick(&InputState::with(&[Key::Digit1]), 1.0, 1.5, &mut backend)
            .unwrap();
        assert_eq!(stats.frame_number, 1);
        assert_eq!(stats.draws, 2);
        assert_eq!(backend.frames, 1);
        assert_eq!(backend.draws.len(), 2);
        assert_eq!(backend.draws[0].0, driver.handles.body);
        assert_eq!(backend.draws[1].0, driver.handles.tail_fan);
        assert!(backend.projection.is_some());

        let before = driver.state().body.position;
        driver
            .tick(&InputState::with(&[Key::ArrowLeft]), 1.0, 1.5, &mut backend)
            .unwrap();
        assert!(driver.state().body.position.x < before.x);
        assert_eq!(backend.frames, 2);
    }

    #[test]
    fn test_driver_rejects_invalid_config() {
        let mut config = DemoConfig::default();
        config.camera.far = -1.0;
        let mut backend = RecordingBackend::default();
        assert!(matches!(
            FrameDriver::new(&config, &mut backend),
            Err(RenderError::Config(ConfigError::Projection(
                ProjectionError::InvalidRange { .. }
            )))
        ));
        assert!(backend.meshes.is_empty());
    }

    #[test]
    fn test_driver_rejects_nan_pan_limit() {
        let mut config = DemoConfig::default();
        config.camera.pan_limit = f32::NAN;
        let mut backend = RecordingBackend::default();
        assert!(matches!(
            FrameDriver::new(&config, &mut backend),
            Err(RenderError::Config(ConfigError::InvalidValue {
                field: "camera.pan_limit",
                ..
            }))
        ));
    }
}
