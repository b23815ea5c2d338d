//! Tri-state keyboard state machine
//!
//! ```text
//! Idle --press--> Pressed --release--> Released --next frame--> Idle
//! ```
//!
//! A press while `Pressed` and a release while not `Pressed` are no-ops.

use super::{Event, KeyCode, KeyState};

/// State of every key, indexed by [`KeyCode::index`]
///
/// Cheap to copy; [`crate::Engine::keyboard_state`] hands out snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardState {
    keys: [KeyState; KeyCode::COUNT],
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardState {
    /// All keys idle
    pub const fn new() -> Self {
        Self {
            keys: [KeyState::Idle; KeyCode::COUNT],
        }
    }

    /// State of one key
    pub const fn get(&self, key: KeyCode) -> KeyState {
        self.keys[key.index()]
    }

    /// Whether the key is idle
    pub fn is_idle(&self, key: KeyCode) -> bool {
        self.get(key) == KeyState::Idle
    }

    /// Whether the key is held down
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.get(key) == KeyState::Pressed
    }

    /// Whether the key was released during the last processed frame
    pub fn is_released(&self, key: KeyCode) -> bool {
        self.get(key) == KeyState::Released
    }

    /// Frame boundary: every `Released` key becomes `Idle`
    pub fn begin_frame(&mut self) {
        for state in &mut self.keys {
            if *state == KeyState::Released {
                *state = KeyState::Idle;
            }
        }
    }

    /// Apply a press edge; returns whether the state changed
    pub fn press(&mut self, key: KeyCode) -> bool {
        let state = &mut self.keys[key.index()];
        if *state == KeyState::Pressed {
            return false;
        }
        *state = KeyState::Pressed;
        true
    }

    /// Apply a release edge; returns whether the state changed
    pub fn release(&mut self, key: KeyCode) -> bool {
        let state = &mut self.keys[key.index()];
        if *state != KeyState::Pressed {
            return false;
        }
        *state = KeyState::Released;
        true
    }

    /// Release every held key (used when the window loses focus)
    pub fn release_all(&mut self) {
        for state in &mut self.keys {
            if *state == KeyState::Pressed {
                *state = KeyState::Released;
            }
        }
    }

    /// Apply one drained event
    ///
    /// Losing focus releases every held key. Activation leaves key state
    /// untouched.
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::KeyPressed(key) => {
                self.press(key);
            }
            Event::KeyReleased(key) => {
                self.release(key);
            }
            Event::WindowDeactivated => self.release_all(),
            Event::WindowActivated | Event::WindowResized { .. } => {}
        }
    }

    /// Iterate over `(key, state)` pairs for every key that is not idle
    pub fn active_keys(&self) -> impl Iterator<Item = (KeyCode, KeyState)> + '_ {
        KeyCode::ALL
            .iter()
            .map(|key| (*key, self.get(*key)))
            .filter(|(_, state)| *state != KeyState::Idle)
    }
}
