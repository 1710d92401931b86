//! Keyboard input for the frame loop.
//!
//! Key identifiers use the DOM `KeyboardEvent.code` names so web hosts can
//! forward events verbatim. [`KeyTracker`] is the live set written by the
//! event source; the frame driver reads one [`InputState`] snapshot per
//! frame.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Keys the demo reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum Key {
    /// Fan speed 0.3
    Digit1,
    /// Fan speed 0.5
    Digit2,
    /// Fan speed 1.0
    Digit3,
    /// Pan camera left
    KeyA,
    /// Pan camera right
    KeyD,
    /// Fly forward
    KeyW,
    /// Fly backward
    KeyS,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

impl Key {
    const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Parse a DOM `KeyboardEvent.code` value; unknown codes are ignored
    pub fn from_code(code: &str) -> Option<Self> {
        code.parse().ok()
    }
}

/// Snapshot of held keys for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    bits: u16,
}

impl InputState {
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    pub fn with(keys: &[Key]) -> Self {
        let mut state = Self::new();
        for &key in keys {
            state.press(key);
        }
        state
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.bits & key.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn held(&self) -> impl Iterator<Item = Key> + '_ {
        Key::iter().filter(|&k| self.is_held(k))
    }

    fn press(&mut self, key: Key) {
        self.bits |= key.bit();
    }

    fn release(&mut self, key: Key) {
        self.bits &= !key.bit();
    }
}

/// Live held-key set fed by key-down/key-up events.
///
/// Hosts that never report key release (most terminals) mark presses as
/// transient; those are dropped by [`KeyTracker::clear_transient`] after the
/// frame that consumed them.
#[derive(Debug, Clone, Default)]
pub struct KeyTracker {
    held: InputState,
    transient: InputState,
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        self.held.press(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.release(key);
        self.transient.release(key);
    }

    /// A press with no matching release event
    pub fn key_tap(&mut self, key: Key) {
        self.transient.press(key);
    }

    /// `key_down` / `key_up` by DOM code name. Returns whether the code was
    /// recognized.
    pub fn key_down_code(&mut self, code: &str) -> bool {
        Key::from_code(code).map(|k| self.key_down(k)).is_some()
    }

    pub fn key_up_code(&mut self, code: &str) -> bool {
        Key::from_code(code).map(|k| self.key_up(k)).is_some()
    }

    pub fn snapshot(&self) -> InputState {
        InputState {
            bits: self.held.bits | self.transient.bits,
        }
    }

    pub fn clear_transient(&mut self) {
        self.transient = InputState::new();
    }

    /// Forget everything, e.g. when the window loses focus
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
