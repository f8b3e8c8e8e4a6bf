//=========================================================================
// Backend Interfaces
//
// Narrow seams to the external windowing and graphics collaborators.
//
// Architecture:
// ```text
//   Runtime ──> Platform          (session, window, input polling)
//      │          ├─ WinitPlatform      OS window via winit
//      │          └─ HeadlessPlatform   scripted, in-process
//      │
//      └────> GraphicsBackend   (shaders, programs, buffers, arrays)
//                 ├─ GlowGraphics       OpenGL via glow
//                 └─ HeadlessGraphics   handle bookkeeping only
// ```
//
// Every creation primitive either succeeds with an opaque integer handle
// or fails with a diagnostic string. Callers wrap diagnostics into
// `RuntimeError::External`; backends never see runtime error types.
//
//=========================================================================

//=== Submodules ==========================================================

#[cfg(not(target_arch = "wasm32"))]
mod glow_graphics;
mod headless;
#[cfg(not(target_arch = "wasm32"))]
mod winit_platform;

//=== Public Exports ======================================================

#[cfg(not(target_arch = "wasm32"))]
pub use glow_graphics::GlowGraphics;
pub use headless::{EventSender, GpuObjectKind, HeadlessGraphics, HeadlessPlatform};
#[cfg(not(target_arch = "wasm32"))]
pub use winit_platform::WinitPlatform;

//=== Internal Dependencies ===============================================

use crate::display::DisplayConfig;
use crate::input::InputEvent;

//=== Handles =============================================================

/// Opaque identifier for an external GPU object.
pub type Handle = u32;

/// Opaque identifier for a window created by a [`Platform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub u32);

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Window 0x{:x}", self.0)
    }
}

//=== Graphics Enums ======================================================

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
    Geometry,
}

/// Buffer binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Index data.
    ElementArray,
    Uniform,
}

/// Expected update frequency of buffer contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Static,
    Dynamic,
    Stream,
}

//=== Platform ============================================================

/// Windowing, session and input collaborator.
pub trait Platform {
    /// Process-wide initialization of the windowing subsystem.
    fn begin_session(&mut self) -> Result<(), String>;

    /// Reverses [`Platform::begin_session`].
    fn end_session(&mut self);

    fn create_window(&mut self, config: &DisplayConfig) -> Result<WindowHandle, String>;

    fn destroy_window(&mut self, window: WindowHandle);

    /// Returns the next pending input event without blocking.
    fn poll_event(&mut self) -> Option<InputEvent>;
}

//=== GraphicsBackend =====================================================

/// GPU object collaborator.
///
/// Methods take `&self`: the backend is shared between the resource
/// managers and issues calls against a single current context.
pub trait GraphicsBackend {
    //--- Shaders ----------------------------------------------------------

    fn compile_shader(&self, kind: ShaderKind, source: &str) -> Result<Handle, String>;

    fn destroy_shader(&self, shader: Handle);

    //--- Programs ---------------------------------------------------------

    fn link_program(&self, shaders: &[Handle]) -> Result<Handle, String>;

    fn destroy_program(&self, program: Handle);

    /// Binds `program` for drawing, or unbinds when `None`.
    fn use_program(&self, program: Option<Handle>);

    fn attribute_location(&self, program: Handle, name: &str) -> Result<u32, String>;

    fn uniform_location(&self, program: Handle, name: &str) -> Result<u32, String>;

    //--- Buffers ----------------------------------------------------------

    fn allocate_buffer(&self, target: BufferTarget, count: usize) -> Result<Handle, String>;

    fn destroy_buffer(&self, buffer: Handle, count: usize);

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Handle>);

    /// Uploads `data` into the buffer bound at `target`.
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    //--- Vertex Arrays ----------------------------------------------------

    fn allocate_array(&self, count: usize) -> Result<Handle, String>;

    fn destroy_array(&self, array: Handle, count: usize);

    fn bind_array(&self, array: Option<Handle>);

    /// Enables attribute `index` as `components` tightly packed floats
    /// sourced from the bound array buffer.
    fn vertex_attribute(&self, index: u32, components: i32);

    //--- Drawing ----------------------------------------------------------

    fn draw_triangles(&self, first: i32, count: i32);
}
