/// Heli3D Core Library - Helicopter scene math, state and frame building
///
/// This library provides the platform-independent part of the demo:
/// vector/matrix helpers, model transforms, camera and projection, the
/// per-frame scene update and the draw-command list handed to a backend.

pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod input;
pub mod lighting;
pub mod math;
pub mod projection;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use config::DemoConfig;
pub use error::{ConfigError, GeometryError, MathError, ProjectionError, RenderError, ShaderStage};
pub use frame::{
    build_frame, submit, DrawBackend, DrawCommand, Frame, FrameDriver, FrameSettings, FrameStats,
    FrameUniforms, MeshHandle, MeshHandles,
};
pub use geometry::{Mesh, MeshId};
pub use input::{InputState, Key, KeyTracker};
pub use lighting::Lighting;
pub use projection::Camera;
pub use scene::{FanSpeed, SceneState, MAX_FRAME_STEP, REFERENCE_FPS};
pub use transform::Transform;
