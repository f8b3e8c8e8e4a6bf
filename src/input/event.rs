//=========================================================================
// Input Event Types
//
// Portable representation of the events a `Platform` delivers.
//
// Every event carries a type tag (`InputEventKind`) used as the dispatch
// key of the input callback table. `CloseRequested` is recognized by the
// runtime itself and never reaches the table.
//
// Event Flow:
// ```text
// Platform::poll_event()
//         ↓
//    InputEvent (this module)
//         ↓                      CloseRequested ──> Runtime stop request
//    InputManager::handle()
//         ↓
//    host callback ──> InputOutcome { None | Unsupported | Quit }
// ```
//
//=========================================================================

//=== MouseButton =========================================================

/// Physical mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button (typically left).
    Left,

    /// Secondary button (typically right).
    Right,

    /// Middle button (wheel click).
    Middle,

    /// Any other button (side buttons, thumb buttons).
    Other,
}

//=== KeyCode =============================================================

/// Physical keyboard key identifier.
///
/// Represents the key location, not the character produced, so `KeyA`
/// is the same key under QWERTY and AZERTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    //--- Numeric Keys -----------------------------------------------------

    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    //--- Alphabetic Keys --------------------------------------------------

    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI,
    KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO, KeyP, KeyQ, KeyR,
    KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,

    //--- Function Keys ----------------------------------------------------

    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    //--- Arrow Keys -------------------------------------------------------

    ArrowDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,

    //--- Special Keys -----------------------------------------------------

    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,

    /// Key the platform reported but this enum does not cover.
    Unidentified,
}

//=== Modifiers ===========================================================

/// Modifier key state at the time of a key or button event.
///
/// Left and right variants are not distinguished. Ctrl covers Command
/// on macOS and Alt covers Option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

//--- Modifier Constants --------------------------------------------------

impl Modifiers {
    pub const NONE: Self = Self { shift: false, ctrl: false, alt: false };
    pub const SHIFT: Self = Self { shift: true, ctrl: false, alt: false };
    pub const CTRL: Self = Self { shift: false, ctrl: true, alt: false };
    pub const ALT: Self = Self { shift: false, ctrl: false, alt: true };
    pub const SHIFT_CTRL: Self = Self { shift: true, ctrl: true, alt: false };
    pub const SHIFT_ALT: Self = Self { shift: true, ctrl: false, alt: true };
    pub const CTRL_ALT: Self = Self { shift: false, ctrl: true, alt: true };
    pub const ALL: Self = Self { shift: true, ctrl: true, alt: true };

    /// True when no modifier is held.
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

//=== WindowChange ========================================================

/// Window state notifications other than close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowChange {
    /// New inner size in physical pixels.
    Resized { width: u32, height: u32 },

    /// New outer position in physical pixels.
    Moved { x: i32, y: i32 },

    /// Keyboard focus gained (`true`) or lost.
    Focused(bool),
}

//=== InputEvent ==========================================================

/// Low-level input event from the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The user asked to close the window.
    CloseRequested,

    KeyDown {
        key: KeyCode,
        modifiers: Modifiers,
    },

    KeyUp {
        key: KeyCode,
        modifiers: Modifiers,
    },

    MouseButtonDown {
        button: MouseButton,
        modifiers: Modifiers,
    },

    MouseButtonUp {
        button: MouseButton,
        modifiers: Modifiers,
    },

    /// Cursor position in window space (pixels, top-left origin).
    MouseMoved { x: f32, y: f32 },

    /// Scroll delta in lines (pixel deltas are converted upstream).
    MouseWheel { dx: f32, dy: f32 },

    Window(WindowChange),

    /// Host-defined event injected through a platform.
    User { code: u32 },

    /// Event the platform could not map.
    Unidentified,
}

//--- Implementation ------------------------------------------------------

impl InputEvent {
    /// Type tag used as the dispatch key.
    pub fn kind(&self) -> InputEventKind {
        match self {
            Self::CloseRequested => InputEventKind::CloseRequested,
            Self::KeyDown { .. } => InputEventKind::KeyDown,
            Self::KeyUp { .. } => InputEventKind::KeyUp,
            Self::MouseButtonDown { .. } => InputEventKind::MouseButtonDown,
            Self::MouseButtonUp { .. } => InputEventKind::MouseButtonUp,
            Self::MouseMoved { .. } => InputEventKind::MouseMoved,
            Self::MouseWheel { .. } => InputEventKind::MouseWheel,
            Self::Window(_) => InputEventKind::Window,
            Self::User { code } => InputEventKind::User(*code),
            Self::Unidentified => InputEventKind::Unidentified,
        }
    }

    /// Returns a new event with updated modifiers (consumes self).
    ///
    /// Has no effect on events that carry no modifier state.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        match &mut self {
            Self::KeyDown { modifiers: m, .. }
            | Self::KeyUp { modifiers: m, .. }
            | Self::MouseButtonDown { modifiers: m, .. }
            | Self::MouseButtonUp { modifiers: m, .. } => {
                *m = modifiers;
            }
            _ => {}
        }
        self
    }

    /// Key carried by a key event.
    pub fn key(&self) -> Option<KeyCode> {
        match self {
            Self::KeyDown { key, .. } | Self::KeyUp { key, .. } => Some(*key),
            _ => None,
        }
    }
}

//=== InputEventKind ======================================================

/// Type tag of an [`InputEvent`].
///
/// `User` stays open-ended so hosts can route their own codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputEventKind {
    CloseRequested,
    KeyDown,
    KeyUp,
    MouseButtonDown,
    MouseButtonUp,
    MouseMoved,
    MouseWheel,
    Window,
    User(u32),
    Unidentified,
}

//=== InputOutcome ========================================================

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputOutcome {
    /// Handled, nothing further to do.
    #[default]
    None,

    /// No handler for the event kind, or the handler declined it.
    Unsupported,

    /// The session should stop at the end of the current frame.
    Quit,
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    //--- Test Helpers -----------------------------------------------------

    fn key_down(key: KeyCode) -> InputEvent {
        InputEvent::KeyDown {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    //=====================================================================
    // Kind Tests
    //=====================================================================

    #[test]
    fn kind_ignores_payload() {
        assert_eq!(key_down(KeyCode::KeyA).kind(), key_down(KeyCode::Escape).kind());
        assert_eq!(
            InputEvent::MouseMoved { x: 1.0, y: 2.0 }.kind(),
            InputEvent::MouseMoved { x: 300.0, y: 400.0 }.kind()
        );
    }

    #[test]
    fn kind_separates_press_and_release() {
        let up = InputEvent::KeyUp {
            key: KeyCode::KeyA,
            modifiers: Modifiers::NONE,
        };
        assert_ne!(key_down(KeyCode::KeyA).kind(), up.kind());
    }

    #[test]
    fn user_kind_keeps_code() {
        assert_eq!(InputEvent::User { code: 7 }.kind(), InputEventKind::User(7));
        assert_ne!(InputEventKind::User(7), InputEventKind::User(8));
    }

    #[test]
    fn window_changes_share_one_kind() {
        let resized = InputEvent::Window(WindowChange::Resized { width: 1, height: 1 });
        let focused = InputEvent::Window(WindowChange::Focused(true));
        assert_eq!(resized.kind(), focused.kind());
    }

    //=====================================================================
    // Modifier Tests
    //=====================================================================

    #[test]
    fn with_modifiers_updates_key_events() {
        let event = key_down(KeyCode::KeyS).with_modifiers(Modifiers::CTRL);
        assert_eq!(
            event,
            InputEvent::KeyDown {
                key: KeyCode::KeyS,
                modifiers: Modifiers::CTRL
            }
        );
    }

    #[test]
    fn with_modifiers_ignores_moves() {
        let event = InputEvent::MouseMoved { x: 5.0, y: 6.0 }.with_modifiers(Modifiers::ALL);
        assert_eq!(event, InputEvent::MouseMoved { x: 5.0, y: 6.0 });
    }

    #[test]
    fn modifier_constants() {
        assert!(Modifiers::default().is_empty());
        assert!(!Modifiers::SHIFT_ALT.ctrl);
        assert!(Modifiers::ALL.shift && Modifiers::ALL.ctrl && Modifiers::ALL.alt);
    }

    #[test]
    fn key_accessor() {
        assert_eq!(key_down(KeyCode::Escape).key(), Some(KeyCode::Escape));
        assert_eq!(InputEvent::CloseRequested.key(), None);
    }

    #[test]
    fn outcome_defaults_to_none() {
        assert_eq!(InputOutcome::default(), InputOutcome::None);
    }
}
