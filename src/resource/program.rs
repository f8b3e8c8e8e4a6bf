//=========================================================================
// Program Manager
//=========================================================================
//
// Linked shader programs.
//
// Each program holds one reference on every shader it was linked from:
//
// ```text
//   add(program, [vs, fs])     vs.refs += 1, fs.refs += 1
//   remove / clear / last decrement
//                              destroy program, vs.refs -= 1, fs.refs -= 1
// ```
//
// The shader manager is passed to every call that can create or destroy
// a program. When it is already uninitialized the shader side is skipped;
// its own teardown has destroyed the shaders. A shader destroyed outside
// that coupling is struck from every program through `forget_shader`, so
// a handle later reissued by the backend is never released on its behalf.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::fmt;
use std::rc::Rc;

//=== External Crates =====================================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::shader::ShaderManager;
use crate::backend::{GraphicsBackend, Handle};
use crate::core::{Component, Registry, Release, ResourceKind};
use crate::error::{Result, RuntimeError};

const LABEL: &str = "program";

//=== ProgramObject =======================================================

pub(crate) struct ProgramObject;

impl ResourceKind for ProgramObject {
    /// Constituent shaders, in link order.
    type Meta = Vec<Handle>;

    const LABEL: &'static str = LABEL;
    const ENTRY: &'static str = "Program";

    fn destroy(gpu: &dyn GraphicsBackend, handle: Handle, _meta: &Vec<Handle>) {
        gpu.destroy_program(handle);
    }
}

//=== ProgramManager ======================================================

pub struct ProgramManager {
    registry: Registry<ProgramObject>,
}

impl ProgramManager {
    pub fn new(gpu: Rc<dyn GraphicsBackend>) -> Self {
        Self {
            registry: Registry::new(gpu),
        }
    }

    //--- Mutation ---------------------------------------------------------

    /// Links `constituents` into a program.
    ///
    /// Every shader must be registered in `shaders`; an unknown handle
    /// fails with `NotFound` before anything is linked.
    pub fn add(&mut self, shaders: &mut ShaderManager, constituents: &[Handle]) -> Result<Handle> {
        self.registry.require_initialized()?;

        for shader in constituents {
            if !shaders.contains(*shader)? {
                return Err(RuntimeError::not_found("shader", format!("Shader 0x{:x}", shader)));
            }
        }

        let program = self
            .registry
            .gpu()
            .link_program(constituents)
            .map_err(|diagnostic| RuntimeError::external(LABEL, "link_program", diagnostic))?;

        self.registry.insert(program, constituents.to_vec())?;
        for shader in constituents {
            shaders.increment_reference(*shader)?;
        }
        Ok(program)
    }

    pub fn increment_reference(&mut self, program: Handle) -> Result<usize> {
        self.registry.increment_reference(program)
    }

    /// Releases one reference; the last one destroys the program and
    /// hands its shader references back.
    pub fn decrement_reference(&mut self, shaders: &mut ShaderManager, program: Handle) -> Result<usize> {
        match self.registry.decrement_reference(program)? {
            Release::Retained(count) => Ok(count),
            Release::Destroyed(constituents) => {
                release_shaders(shaders, program, &constituents);
                Ok(0)
            }
        }
    }

    /// Destroys `program` regardless of outstanding references.
    pub fn remove(&mut self, shaders: &mut ShaderManager, program: Handle) -> Result<()> {
        let constituents = self.registry.remove(program)?;
        release_shaders(shaders, program, &constituents);
        Ok(())
    }

    /// Strips a destroyed shader from every program's constituent list;
    /// returns how many programs still referenced it.
    pub fn forget_shader(&mut self, shader: Handle) -> usize {
        let mut linked = 0;
        for (program, constituents) in self.registry.metadata_mut() {
            let before = constituents.len();
            constituents.retain(|s| *s != shader);
            if constituents.len() != before {
                debug!(target: "resource", "Program 0x{:x} no longer holds shader 0x{:x}", program, shader);
                linked += 1;
            }
        }
        linked
    }

    pub fn clear(&mut self, shaders: &mut ShaderManager) -> Result<()> {
        let handles: Vec<_> = self.registry.handles().collect();
        let released = self.registry.clear()?;
        for (program, constituents) in handles.into_iter().zip(released) {
            release_shaders(shaders, program, &constituents);
        }
        Ok(())
    }

    /// Clears (releasing shader references) and uninitializes.
    pub fn shutdown(&mut self, shaders: &mut ShaderManager) -> Result<()> {
        self.clear(shaders)?;
        self.registry.uninitialize().map(drop)
    }

    //--- GPU Queries ------------------------------------------------------

    pub fn attribute(&self, program: Handle, name: &str) -> Result<u32> {
        self.require_program(program)?;
        self.registry
            .gpu()
            .attribute_location(program, name)
            .map_err(|diagnostic| RuntimeError::external(LABEL, "attribute_location", diagnostic))
    }

    pub fn uniform(&self, program: Handle, name: &str) -> Result<u32> {
        self.require_program(program)?;
        self.registry
            .gpu()
            .uniform_location(program, name)
            .map_err(|diagnostic| RuntimeError::external(LABEL, "uniform_location", diagnostic))
    }

    /// Binds `program` for drawing; `None` unbinds.
    pub fn use_program(&self, program: Option<Handle>) -> Result<()> {
        self.registry.require_initialized()?;
        if let Some(program) = program {
            self.require_program(program)?;
        }
        self.registry.gpu().use_program(program);
        Ok(())
    }

    //--- Queries ----------------------------------------------------------

    pub fn contains(&self, program: Handle) -> Result<bool> {
        self.registry.contains(program)
    }

    pub fn size(&self) -> Result<usize> {
        self.registry.size()
    }

    pub fn reference_count(&self, program: Handle) -> Result<usize> {
        self.registry.reference_count(program)
    }

    /// Shaders `program` was linked from.
    pub fn shaders(&self, program: Handle) -> Result<&[Handle]> {
        self.registry.metadata(program).map(Vec::as_slice)
    }

    //--- Internal Helpers -------------------------------------------------

    fn require_program(&self, program: Handle) -> Result<()> {
        self.registry.metadata(program).map(drop)
    }
}

/// Gives back the shader references held by a destroyed program.
fn release_shaders(shaders: &mut ShaderManager, program: Handle, constituents: &[Handle]) {
    if !shaders.is_initialized() {
        debug!(target: "resource", "Program 0x{:x}: shader manager down, skipping release", program);
        return;
    }

    for shader in constituents {
        match shaders.release_for_program(*shader) {
            Ok(Release::Destroyed(_)) => {
                debug!(target: "resource", "Shader 0x{:x} released by program 0x{:x}", shader, program);
            }
            Ok(Release::Retained(_)) => {}
            Err(err) => {
                warn!(target: "resource", "Program 0x{:x}: {}", program, err);
            }
        }
    }
}

//--- Trait Implementations -----------------------------------------------

impl Component for ProgramManager {
    fn label(&self) -> &'static str {
        LABEL
    }

    fn initialize(&mut self) -> Result<()> {
        self.registry.initialize()
    }

    /// Destroys programs without touching shader references; see
    /// [`ProgramManager::shutdown`] for the coupled teardown.
    fn uninitialize(&mut self) -> Result<()> {
        self.registry.uninitialize().map(drop)
    }

    fn is_initialized(&self) -> bool {
        self.registry.is_initialized()
    }
}

impl fmt::Display for ProgramManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.registry, f)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
