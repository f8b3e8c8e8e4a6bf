//=========================================================================
// Event Translation
//
// winit `WindowEvent` → runtime `InputEvent`.
//
// The translator is the only stateful part: winit reports modifiers as a
// separate `ModifiersChanged` event, so the last state seen is stamped
// onto every key and button event that follows.
//
// Dropped: key repeats, keys outside `KeyCode` (F13+, numpad, media),
// redraw/occlusion/theme notifications.
//
//=========================================================================

//=== External Crates =====================================================

use winit::{
    event::{ElementState, KeyEvent, MouseButton as WinitButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode as WinitKey, ModifiersState, PhysicalKey},
};

//=== Internal Dependencies ===============================================

use crate::input::{InputEvent, KeyCode, Modifiers, MouseButton, WindowChange};

/// Pixels per scroll line for devices reporting pixel deltas.
const LINE_HEIGHT: f64 = 20.0;

//=== EventTranslator =====================================================

#[derive(Debug, Default)]
pub(super) struct EventTranslator {
    modifiers: Modifiers,
}

impl EventTranslator {
    /// Translates one event, `None` when the runtime has no use for it.
    pub(super) fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        let translated = match event {
            WindowEvent::ModifiersChanged(state) => {
                self.modifiers = modifiers(state.state());
                return None;
            }
            WindowEvent::CloseRequested => InputEvent::CloseRequested,
            WindowEvent::KeyboardInput { event, .. } => self.key(event)?,
            WindowEvent::MouseInput { state, button, .. } => self.button(*state, *button),
            WindowEvent::CursorMoved { position, .. } => InputEvent::MouseMoved {
                x: position.x as f32,
                y: position.y as f32,
            },
            WindowEvent::MouseWheel { delta, .. } => wheel(*delta),
            WindowEvent::Resized(size) => InputEvent::Window(WindowChange::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::Moved(at) => InputEvent::Window(WindowChange::Moved { x: at.x, y: at.y }),
            WindowEvent::Focused(focused) => InputEvent::Window(WindowChange::Focused(*focused)),
            _ => return None,
        };
        Some(translated)
    }

    fn key(&self, event: &KeyEvent) -> Option<InputEvent> {
        let PhysicalKey::Code(code) = event.physical_key else {
            return None;
        };
        let key = key_code(code)?;
        if event.repeat {
            return None;
        }

        let modifiers = self.modifiers;
        Some(match event.state {
            ElementState::Pressed => InputEvent::KeyDown { key, modifiers },
            ElementState::Released => InputEvent::KeyUp { key, modifiers },
        })
    }

    fn button(&self, state: ElementState, button: WinitButton) -> InputEvent {
        let button = mouse_button(button);
        let modifiers = self.modifiers;
        match state {
            ElementState::Pressed => InputEvent::MouseButtonDown { button, modifiers },
            ElementState::Released => InputEvent::MouseButtonUp { button, modifiers },
        }
    }
}

//=== Conversions =========================================================

/// winit already folds Cmd into Ctrl and Option into Alt on macOS.
fn modifiers(state: ModifiersState) -> Modifiers {
    Modifiers {
        shift: state.shift_key(),
        ctrl: state.control_key(),
        alt: state.alt_key(),
    }
}

fn wheel(delta: MouseScrollDelta) -> InputEvent {
    let (dx, dy) = match delta {
        MouseScrollDelta::LineDelta(dx, dy) => (dx, dy),
        MouseScrollDelta::PixelDelta(px) => ((px.x / LINE_HEIGHT) as f32, (px.y / LINE_HEIGHT) as f32),
    };
    InputEvent::MouseWheel { dx, dy }
}

fn mouse_button(button: WinitButton) -> MouseButton {
    match button {
        WinitButton::Left => MouseButton::Left,
        WinitButton::Right => MouseButton::Right,
        WinitButton::Middle => MouseButton::Middle,
        _ => MouseButton::Other,
    }
}

/// Physical keys the runtime understands.
const KEYS: &[(WinitKey, KeyCode)] = &[
    (WinitKey::Digit0, KeyCode::Digit0), (WinitKey::Digit1, KeyCode::Digit1),
    (WinitKey::Digit2, KeyCode::Digit2), (WinitKey::Digit3, KeyCode::Digit3),
    (WinitKey::Digit4, KeyCode::Digit4), (WinitKey::Digit5, KeyCode::Digit5),
    (WinitKey::Digit6, KeyCode::Digit6), (WinitKey::Digit7, KeyCode::Digit7),
    (WinitKey::Digit8, KeyCode::Digit8), (WinitKey::Digit9, KeyCode::Digit9),
    (WinitKey::KeyA, KeyCode::KeyA), (WinitKey::KeyB, KeyCode::KeyB),
    (WinitKey::KeyC, KeyCode::KeyC), (WinitKey::KeyD, KeyCode::KeyD),
    (WinitKey::KeyE, KeyCode::KeyE), (WinitKey::KeyF, KeyCode::KeyF),
    (WinitKey::KeyG, KeyCode::KeyG), (WinitKey::KeyH, KeyCode::KeyH),
    (WinitKey::KeyI, KeyCode::KeyI), (WinitKey::KeyJ, KeyCode::KeyJ),
    (WinitKey::KeyK, KeyCode::KeyK), (WinitKey::KeyL, KeyCode::KeyL),
    (WinitKey::KeyM, KeyCode::KeyM), (WinitKey::KeyN, KeyCode::KeyN),
    (WinitKey::KeyO, KeyCode::KeyO), (WinitKey::KeyP, KeyCode::KeyP),
    (WinitKey::KeyQ, KeyCode::KeyQ), (WinitKey::KeyR, KeyCode::KeyR),
    (WinitKey::KeyS, KeyCode::KeyS), (WinitKey::KeyT, KeyCode::KeyT),
    (WinitKey::KeyU, KeyCode::KeyU), (WinitKey::KeyV, KeyCode::KeyV),
    (WinitKey::KeyW, KeyCode::KeyW), (WinitKey::KeyX, KeyCode::KeyX),
    (WinitKey::KeyY, KeyCode::KeyY), (WinitKey::KeyZ, KeyCode::KeyZ),
    (WinitKey::F1, KeyCode::F1), (WinitKey::F2, KeyCode::F2),
    (WinitKey::F3, KeyCode::F3), (WinitKey::F4, KeyCode::F4),
    (WinitKey::F5, KeyCode::F5), (WinitKey::F6, KeyCode::F6),
    (WinitKey::F7, KeyCode::F7), (WinitKey::F8, KeyCode::F8),
    (WinitKey::F9, KeyCode::F9), (WinitKey::F10, KeyCode::F10),
    (WinitKey::F11, KeyCode::F11), (WinitKey::F12, KeyCode::F12),
    (WinitKey::ArrowDown, KeyCode::ArrowDown), (WinitKey::ArrowLeft, KeyCode::ArrowLeft),
    (WinitKey::ArrowRight, KeyCode::ArrowRight), (WinitKey::ArrowUp, KeyCode::ArrowUp),
    (WinitKey::Space, KeyCode::Space), (WinitKey::Enter, KeyCode::Enter),
    (WinitKey::Escape, KeyCode::Escape), (WinitKey::Tab, KeyCode::Tab),
    (WinitKey::Backspace, KeyCode::Backspace), (WinitKey::Delete, KeyCode::Delete),
];

fn key_code(code: WinitKey) -> Option<KeyCode> {
    KEYS.iter().find(|(winit, _)| *winit == code).map(|(_, key)| *key)
}

//=========================================================================
// Unit Tests
//=========================================================================
