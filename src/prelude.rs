//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use luna_runtime::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Session
pub use crate::runtime::{Context, Event, FrameStage, Runtime, RuntimeBuilder, SessionConfig};

// Lifecycle and errors
pub use crate::core::Component;
pub use crate::error::RuntimeError;

// Backends
pub use crate::backend::{
    BufferTarget, BufferUsage, GraphicsBackend, Handle, HeadlessGraphics, HeadlessPlatform, Platform,
    ShaderKind, WindowHandle,
};

// Display
pub use crate::display::{DisplayConfig, DisplayFlags};

// Input
pub use crate::input::{InputEvent, InputEventKind, InputOutcome, KeyCode, Modifiers, MouseButton};

// Resources
pub use crate::resource::{Resources, ShaderSource};

// Logging
pub use crate::logging::{init_logging, LoggingConfig};
