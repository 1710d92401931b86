//! Mutable scene state and the per-frame update.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::config::DemoConfig;
use crate::input::{InputState, Key};
use crate::transform::Transform;

/// Largest `dt` (in reference frames) applied by a single update
pub const MAX_FRAME_STEP: f32 = 4.0;

/// Frames per second the per-frame rates are expressed against
pub const REFERENCE_FPS: f32 = 60.0;

/// Discrete tail-fan speeds. Movement is only possible once the fan spins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum FanSpeed {
    #[default]
    Off,
    Low,
    Medium,
    High,
}

impl FanSpeed {
    /// Rotation added to each fan per reference frame
    pub fn radians_per_frame(self) -> f32 {
        match self {
            FanSpeed::Off => 0.0,
            FanSpeed::Low => 0.3,
            FanSpeed::Medium => 0.5,
            FanSpeed::High => 1.0,
        }
    }

    /// Speed selected by the held trigger keys; the fastest one wins
    fn from_triggers(input: &InputState) -> Option<Self> {
        [
            (Key::Digit3, FanSpeed::High),
            (Key::Digit2, FanSpeed::Medium),
            (Key::Digit1, FanSpeed::Low),
        ]
        .into_iter()
        .find(|(key, _)| input.is_held(*key))
        .map(|(_, speed)| speed)
    }

    pub fn allows_flight(self) -> bool {
        self >= FanSpeed::Low
    }
}

/// Movement limits and rates copied out of the configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionLimits {
    pub pan_limit: f32,
    pub pan_step: f32,
    pub move_step: f32,
    pub background_baseline: f32,
    pub background_ceiling: f32,
}

impl From<&DemoConfig> for MotionLimits {
    fn from(config: &DemoConfig) -> Self {
        Self {
            pan_limit: config.camera.pan_limit.abs(),
            pan_step: config.camera.pan_step,
            move_step: config.helicopter.move_step,
            background_baseline: config.helicopter.background_baseline,
            background_ceiling: config
                .helicopter
                .background_ceiling
                .max(config.helicopter.background_baseline),
        }
    }
}

/// Everything that persists between frames
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    pub body: Transform,
    pub tail_fans: Vec<Transform>,
    pub fan_speed: FanSpeed,
    pub camera_position: Point3<f32>,
    /// Cosmetic background zoom, in percent
    pub background_scale: f32,
    pub limits: MotionLimits,
}

impl SceneState {
    pub fn new(config: &DemoConfig) -> Self {
        let limits = MotionLimits::from(config);
        Self {
            body: config.helicopter.body.into(),
            tail_fans: config
                .helicopter
                .tail_fans
                .iter()
                .copied()
                .map(Transform::from)
                .collect(),
            fan_speed: FanSpeed::Off,
            camera_position: Point3::from(config.camera.position),
            background_scale: limits.background_baseline,
            limits,
        }
    }

    /// Advance one frame. `dt` is measured in reference frames (1.0 is one
    /// 60 Hz frame) and clamped to `[0, MAX_FRAME_STEP]`.
    pub fn update(&mut self, input: &InputState, dt: f32) {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_STEP)
        } else {
            0.0
        };

        if let Some(speed) = FanSpeed::from_triggers(input) {
            if speed != self.fan_speed {
                debug!(from = ?self.fan_speed, to = ?speed, "fan speed changed");
            }
            self.fan_speed = speed;
        }

        let spin = self.fan_speed.radians_per_frame() * dt;
        for fan in &mut self.tail_fans {
            fan.rotate(0.0, spin, 0.0);
            fan.wrap_rotation();
        }

        self.pan_camera(input, dt);
        if self.fan_speed.allows_flight() {
            self.fly(input, dt);
        }
    }

    fn pan_camera(&mut self, input: &InputState, dt: f32) {
        let step = self.limits.pan_step * dt;
        let mut x = self.camera_position.x;
        if input.is_held(Key::KeyA) {
            x -= step;
        }
        if input.is_held(Key::KeyD) {
            x += step;
        }
        self.camera_position.x = x.clamp(-self.limits.pan_limit, self.limits.pan_limit);
    }

    fn fly(&mut self, input: &InputState, dt: f32) {
        let step = self.limits.move_step * dt;
        let mut delta = Vector3::zeros();

        if input.is_held(Key::ArrowUp) {
            delta.y += step;
        }
        if input.is_held(Key::ArrowDown) {
            delta.y -= step;
        }
        if input.is_held(Key::ArrowLeft) {
            delta.x -= step;
        }
        if input.is_held(Key::ArrowRight) {
            delta.x += step;
        }
        if input.is_held(Key::KeyW) {
            delta.z -= step;
            self.background_scale = (self.background_scale + step).min(self.limits.background_ceiling);
        }
        // Backward flight stops once the background is back at its baseline
        if input.is_held(Key::KeyS) && self.background_scale > self.limits.background_baseline {
            delta.z += step;
            self.background_scale = (self.background_scale - step).max(self.limits.background_baseline);
        }

        self.body.translate(delta);
    }
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new(&DemoConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn frames(state: &mut SceneState, input: InputState, count: usize) {
        for _ in 0..count {
            state.update(&input, 1.0);
        }
    }

    #[test]
    fn test_initial_state() {
        let state = SceneState::default();
        assert_eq!(state.fan_speed, FanSpeed::Off);
        assert_eq!(state.background_scale, 100.0);
        assert_eq!(state.camera_position, Point3::new(0.0, -2.0, 10.0));
        assert_eq!(state.tail_fans.len(), 1);
    }

    #[test]
    fn test_fan_speed_triggers() {
        let mut state = SceneState::default();
        state.update(&InputState::with(&[Key::Digit2]), 1.0);
        assert_eq!(state.fan_speed, FanSpeed::Medium);

        // no trigger held: speed is kept
        frames(&mut state, InputState::new(), 10);
        assert_eq!(state.fan_speed, FanSpeed::Medium);

        state.update(&InputState::with(&[Key::Digit1, Key::Digit3]), 1.0);
        assert_eq!(state.fan_speed, FanSpeed::High);
    }

    #[test]
    fn test_no_movement_while_fan_off() {
        let mut state = SceneState::default();
        let start = state.body.position;
        let all = InputState::with(&[
            Key::ArrowUp,
            Key::ArrowDown,
            Key::ArrowLeft,
            Key::ArrowRight,
            Key::KeyW,
            Key::KeyS,
        ]);
        frames(&mut state, all, 5);
        assert_eq!(state.body.position, start);
        assert_eq!(state.background_scale, 100.0);

        state.update(&InputState::with(&[Key::ArrowUp]), 1.0);
        assert_eq!(state.body.position, start);
    }

    #[test]
    fn test_movement_once_spinning() {
        let mut state = SceneState::default();
        state.update(&InputState::with(&[Key::Digit1]), 1.0);
        let start = state.body.position;

        frames(&mut state, InputState::with(&[Key::ArrowUp, Key::ArrowRight]), 10);
        assert!((state.body.position.y - (start.y + 1.0)).abs() < 1e-4);
        assert!((state.body.position.x - (start.x + 1.0)).abs() < 1e-4);
        assert!((state.body.position.z - start.z).abs() < 1e-6);
    }

    #[test]
    fn test_forward_and_backward_background_scale() {
        let mut state = SceneState::default();
        state.update(&InputState::with(&[Key::Digit1]), 1.0);
        let start_z = state.body.position.z;

        // backward at baseline is blocked
        frames(&mut state, InputState::with(&[Key::KeyS]), 3);
        assert_eq!(state.body.position.z, start_z);
        assert_eq!(state.background_scale, 100.0);

        frames(&mut state, InputState::with(&[Key::KeyW]), 5);
        assert!((state.body.position.z - (start_z - 0.5)).abs() < 1e-4);
        assert!((state.background_scale - 100.5).abs() < 1e-4);

        frames(&mut state, InputState::with(&[Key::KeyS]), 20);
        assert_eq!(state.background_scale, 100.0);
        assert!((state.body.position.z - start_z).abs() < 0.11);
    }

    #[test]
    fn test_background_scale_ceiling() {
        let mut state = SceneState::default();
        state.limits.background_ceiling = 101.0;
        state.update(&InputState::with(&[Key::Digit3]), 1.0);
        frames(&mut state, InputState::with(&[Key::KeyW]), 50);
        assert_eq!(state.background_scale, 101.0);
    }

    #[test]
    fn test_camera_pan_clamped_and_ungated() {
        let mut state = SceneState::default();
        frames(&mut state, InputState::with(&[Key::KeyA]), 200);
        assert_eq!(state.camera_position.x, -5.0);

        frames(&mut state, InputState::with(&[Key::KeyD]), 400);
        assert_eq!(state.camera_position.x, 5.0);
        assert_eq!(state.fan_speed, FanSpeed::Off);
    }

    #[test]
    fn test_fan_rotation_accumulates_with_wrap() {
        let mut state = SceneState::default();
        let start = state.tail_fans[0].rotation.y;
        state.update(&InputState::with(&[Key::Digit3]), 1.0);
        frames(&mut state, InputState::new(), 99);

        let expected = (start + 100.0_f32).rem_euclid(TAU);
        assert!((state.tail_fans[0].rotation.y - expected).abs() < 1e-3);
        assert!(state.tail_fans[0].rotation.y < TAU);
    }

    #[test]
    fn test_fan_still_when_off() {
        let mut state = SceneState::default();
        let before = state.tail_fans[0].rotation;
        frames(&mut state, InputState::new(), 10);
        assert_eq!(state.tail_fans[0].rotation, before);
    }

    #[test]
    fn test_dt_scaling_and_clamp() {
        let mut state = SceneState::default();
        state.update(&InputState::with(&[Key::Digit1]), 0.0);
        let start = state.body.position.y;

        state.update(&InputState::with(&[Key::ArrowUp]), 0.5);
        assert!((state.body.position.y - (start + 0.05)).abs() < 1e-5);

        state.update(&InputState::with(&[Key::ArrowUp]), 1000.0);
        assert!((state.body.position.y - (start + 0.05 + 0.4)).abs() < 1e-4);

        let before = state.body.position;
        state.update(&InputState::with(&[Key::ArrowUp]), f32::NAN);
        assert_eq!(state.body.position, before);
    }
}
