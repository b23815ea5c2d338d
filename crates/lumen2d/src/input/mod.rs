//! Input management system
//!
//! Platform backends translate OS input into [`Event`]s and append them to
//! the per-frame [`EventQueue`]. Once per frame the engine drains the queue
//! into the persistent [`KeyboardState`], which is the only place key states
//! are written.
//!
//! Key states are edge-triggered: `Pressed` and `Released` are each visible
//! for at least one frame. A key stays `Pressed` while held, and `Released`
//! turns back into `Idle` at the start of the following frame.

pub mod keyboard;
pub mod queue;

pub use keyboard::KeyboardState;
pub use queue::EventQueue;

use serde::{Deserialize, Serialize};

/// Input events produced by platform backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Window gained focus
    WindowActivated,
    /// Window lost focus
    WindowDeactivated,
    /// Key was pressed
    KeyPressed(KeyCode),
    /// Key was released
    KeyReleased(KeyCode),
    /// Drawable area changed size, in pixels
    WindowResized {
        /// New width
        width: u32,
        /// New height
        height: u32,
    },
}

/// Per-key state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyState {
    /// Not held and not released this frame
    #[default]
    Idle,
    /// Held down (entered this state on a press event)
    Pressed,
    /// Released during the last processed frame
    Released,
}

macro_rules! key_codes {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        /// Logical key codes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum KeyCode {
            $($(#[$doc])* $name,)*
        }

        impl KeyCode {
            /// Every key code in index order
            pub const ALL: &'static [KeyCode] = &[$(KeyCode::$name,)*];

            /// Number of key codes
            pub const COUNT: usize = Self::ALL.len();

            /// Dense index of this key, `0..COUNT`
            pub const fn index(self) -> usize {
                self as usize
            }

            /// Key code for a dense index
            pub fn from_index(index: usize) -> Option<KeyCode> {
                Self::ALL.get(index).copied()
            }
        }
    };
}

key_codes! {
    /// 0 key
    Key0,
    /// 1 key
    Key1,
    /// 2 key
    Key2,
    /// 3 key
    Key3,
    /// 4 key
    Key4,
    /// 5 key
    Key5,
    /// 6 key
    Key6,
    /// 7 key
    Key7,
    /// 8 key
    Key8,
    /// 9 key
    Key9,
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// Grave accent / tilde key
    Grave,
    /// Apostrophe key
    Apostrophe,
    /// Minus key
    Minus,
    /// Equal key
    Equal,
    /// Left bracket key
    LeftBracket,
    /// Right bracket key
    RightBracket,
    /// Comma key
    Comma,
    /// Period key
    Period,
    /// Semicolon key
    Semicolon,
    /// Slash key
    Slash,
    /// Backslash key
    Backslash,
    /// Space key
    Space,
    /// Escape key
    Escape,
    /// Backspace key
    Backspace,
    /// Tab key
    Tab,
    /// Enter key
    Enter,
    /// F1 key
    F1,
    /// F2 key
    F2,
    /// F3 key
    F3,
    /// F4 key
    F4,
    /// F5 key
    F5,
    /// F6 key
    F6,
    /// F7 key
    F7,
    /// F8 key
    F8,
    /// F9 key
    F9,
    /// F10 key
    F10,
    /// F11 key
    F11,
    /// F12 key
    F12,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Left shift
    LeftShift,
    /// Right shift
    RightShift,
    /// Left control
    LeftControl,
    /// Right control
    RightControl,
    /// Left alt
    LeftAlt,
    /// Right alt
    RightAlt,
    /// Left super / logo key
    LeftSuper,
    /// Right super / logo key
    RightSuper,
    /// Menu key
    Menu,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// Home
    Home,
    /// End
    End,
    /// Insert
    Insert,
    /// Delete
    Delete,
    /// Pause
    Pause,
    /// Keypad 0
    Keypad0,
    /// Keypad 1
    Keypad1,
    /// Keypad 2
    Keypad2,
    /// Keypad 3
    Keypad3,
    /// Keypad 4
    Keypad4,
    /// Keypad 5
    Keypad5,
    /// Keypad 6
    Keypad6,
    /// Keypad 7
    Keypad7,
    /// Keypad 8
    Keypad8,
    /// Keypad 9
    Keypad9,
    /// Keypad multiply
    KeypadMultiply,
    /// Keypad add
    KeypadAdd,
    /// Keypad subtract
    KeypadSubtract,
    /// Keypad decimal point
    KeypadDecimal,
    /// Keypad divide
    KeypadDivide,
    /// Keypad enter
    KeypadEnter,
}
