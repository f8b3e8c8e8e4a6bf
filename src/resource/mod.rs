//=========================================================================
// GPU Resources
//
// Shader, program and vertex managers behind one facade.
//
// Architecture:
// ```text
//   Resources
//     ├─ gpu: Rc<dyn GraphicsBackend>  (shared by every registry)
//     ├─ ShaderManager    shader units, refcounted
//     ├─ ProgramManager   linked programs ──refs──> shaders
//     └─ VertexManager    buffers + arrays
// ```
//
// The facade owns the program → shader coupling: every call that can
// destroy a program routes the shader manager in, and teardown clears
// programs before shaders so each shader reference is returned first.
//
//=========================================================================

//=== Submodules ==========================================================

mod program;
mod shader;
mod vertex;

//=== Public Exports ======================================================

pub use program::ProgramManager;
pub use shader::{ShaderManager, ShaderSource};
pub use vertex::{BufferInfo, VertexManager};

//=== Standard Library Imports ============================================

use std::fmt;
use std::rc::Rc;

//=== External Crates =====================================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::backend::{GraphicsBackend, Handle, ShaderKind};
use crate::core::Component;
use crate::error::Result;

//=== Resources ===========================================================

pub struct Resources {
    gpu: Rc<dyn GraphicsBackend>,
    shaders: ShaderManager,
    programs: ProgramManager,
    vertex: VertexManager,
}

impl Resources {
    pub fn new(gpu: Rc<dyn GraphicsBackend>) -> Self {
        Self {
            shaders: ShaderManager::new(gpu.clone()),
            programs: ProgramManager::new(gpu.clone()),
            vertex: VertexManager::new(gpu.clone()),
            gpu,
        }
    }

    //--- Shaders ----------------------------------------------------------

    pub fn add_shader(&mut self, source: &ShaderSource, kind: ShaderKind) -> Result<Handle> {
        self.shaders.add(source, kind)
    }

    /// Forced removal. Programs linked from the shader keep working but
    /// no longer hold it, so their release never touches the handle again.
    pub fn remove_shader(&mut self, shader: Handle) -> Result<()> {
        self.shaders.remove(shader)?;
        self.forget_shader(shader);
        Ok(())
    }

    /// Releases one reference; returns the remaining count (0 once destroyed).
    pub fn decrement_shader(&mut self, shader: Handle) -> Result<usize> {
        let remaining = self.shaders.decrement_reference(shader)?;
        if remaining == 0 {
            self.forget_shader(shader);
        }
        Ok(remaining)
    }

    pub fn increment_shader(&mut self, shader: Handle) -> Result<usize> {
        self.shaders.increment_reference(shader)
    }

    //--- Programs ---------------------------------------------------------

    pub fn add_program(&mut self, shaders: &[Handle]) -> Result<Handle> {
        self.programs.add(&mut self.shaders, shaders)
    }

    pub fn remove_program(&mut self, program: Handle) -> Result<()> {
        self.programs.remove(&mut self.shaders, program)
    }

    pub fn decrement_program(&mut self, program: Handle) -> Result<usize> {
        self.programs.decrement_reference(&mut self.shaders, program)
    }

    //--- Managers ---------------------------------------------------------

    pub fn shaders(&self) -> &ShaderManager {
        &self.shaders
    }

    /// Read access; shader and program removal go through the facade.
    pub fn programs(&self) -> &ProgramManager {
        &self.programs
    }

    pub fn vertex(&self) -> &VertexManager {
        &self.vertex
    }

    pub fn vertex_mut(&mut self) -> &mut VertexManager {
        &mut self.vertex
    }

    /// Backend shared by the managers.
    pub fn gpu(&self) -> &dyn GraphicsBackend {
        self.gpu.as_ref()
    }

    //--- Whole Facade -----------------------------------------------------

    fn forget_shader(&mut self, shader: Handle) {
        let linked = self.programs.forget_shader(shader);
        if linked > 0 {
            warn!(target: "resource", "Shader 0x{:x} destroyed while linked into {} program(s)", shader, linked);
        }
    }

    /// Destroys programs, then shaders, then vertex objects.
    pub fn clear(&mut self) -> Result<()> {
        self.programs.clear(&mut self.shaders)?;
        self.shaders.clear()?;
        self.vertex.clear()?;
        debug!(target: "resource", "All GPU resources released");
        Ok(())
    }
}

//--- Trait Implementations -----------------------------------------------

impl Component for Resources {
    fn label(&self) -> &'static str {
        "resource"
    }

    fn initialize(&mut self) -> Result<()> {
        self.shaders.initialize()?;
        self.programs.initialize()?;
        self.vertex.initialize()
    }

    /// Programs go first so their shader references are returned.
    fn uninitialize(&mut self) -> Result<()> {
        self.programs.shutdown(&mut self.shaders)?;
        self.shaders.uninitialize()?;
        self.vertex.uninitialize()
    }

    fn is_initialized(&self) -> bool {
        self.shaders.is_initialized() && self.programs.is_initialized() && self.vertex.is_initialized()
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}\n{}", self.shaders, self.programs, self.vertex)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
