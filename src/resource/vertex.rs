//=========================================================================
// Vertex Manager
//=========================================================================
//
// Vertex buffers and vertex arrays, each in its own registry.
//
// The object count given at allocation is kept as metadata and passed
// back to the destroy primitive, so a multi-object allocation is
// released with the count it was created with.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::fmt;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use crate::backend::{BufferTarget, BufferUsage, GraphicsBackend, Handle};
use crate::core::{Component, Registry, ResourceKind};
use crate::error::{Result, RuntimeError};

const LABEL: &str = "vertex";

//=== Resource Kinds ======================================================

/// Buffer metadata: binding target and object count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferInfo {
    pub target: BufferTarget,
    pub count: usize,
}

pub(crate) struct VertexBuffer;

impl ResourceKind for VertexBuffer {
    type Meta = BufferInfo;

    const LABEL: &'static str = LABEL;
    const ENTRY: &'static str = "Vertex buffer";

    fn destroy(gpu: &dyn GraphicsBackend, handle: Handle, meta: &BufferInfo) {
        gpu.destroy_buffer(handle, meta.count);
    }
}

pub(crate) struct VertexArray;

impl ResourceKind for VertexArray {
    /// Object count.
    type Meta = usize;

    const LABEL: &'static str = LABEL;
    const ENTRY: &'static str = "Vertex array";

    fn destroy(gpu: &dyn GraphicsBackend, handle: Handle, count: &usize) {
        gpu.destroy_array(handle, *count);
    }
}

//=== VertexManager =======================================================

pub struct VertexManager {
    buffers: Registry<VertexBuffer>,
    arrays: Registry<VertexArray>,
}

impl VertexManager {
    pub fn new(gpu: Rc<dyn GraphicsBackend>) -> Self {
        Self {
            buffers: Registry::new(gpu.clone()),
            arrays: Registry::new(gpu),
        }
    }

    //--- Buffers ----------------------------------------------------------

    pub fn add_buffer(&mut self, target: BufferTarget, count: usize) -> Result<Handle> {
        self.buffers.require_initialized()?;
        if count == 0 {
            return Err(RuntimeError::invalid(LABEL, "buffer count must be positive"));
        }

        let buffer = self
            .buffers
            .gpu()
            .allocate_buffer(target, count)
            .map_err(|diagnostic| RuntimeError::external(LABEL, "allocate_buffer", diagnostic))?;
        self.buffers.insert(buffer, BufferInfo { target, count })
    }

    /// Binds `buffer` at `target`; `None` unbinds.
    pub fn bind_buffer(&self, target: BufferTarget, buffer: Option<Handle>) -> Result<()> {
        self.buffers.require_initialized()?;
        if let Some(buffer) = buffer {
            self.buffers.metadata(buffer)?;
        }
        self.buffers.gpu().bind_buffer(target, buffer);
        Ok(())
    }

    /// Uploads `data` into the buffer bound at `target`.
    pub fn set_buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) -> Result<()> {
        self.buffers.require_initialized()?;
        self.buffers.gpu().buffer_data(target, data, usage);
        Ok(())
    }

    pub fn contains_buffer(&self, buffer: Handle) -> Result<bool> {
        self.buffers.contains(buffer)
    }

    pub fn buffer_info(&self, buffer: Handle) -> Result<BufferInfo> {
        self.buffers.metadata(buffer).copied()
    }

    pub fn buffer_count(&self) -> Result<usize> {
        self.buffers.size()
    }

    pub fn increment_buffer(&mut self, buffer: Handle) -> Result<usize> {
        self.buffers.increment_reference(buffer)
    }

    pub fn decrement_buffer(&mut self, buffer: Handle) -> Result<usize> {
        self.buffers.decrement_reference(buffer).map(|release| release.count())
    }

    pub fn reference_count_buffer(&self, buffer: Handle) -> Result<usize> {
        self.buffers.reference_count(buffer)
    }

    pub fn remove_buffer(&mut self, buffer: Handle) -> Result<()> {
        self.buffers.remove(buffer).map(drop)
    }

    //--- Arrays -----------------------------------------------------------

    pub fn add_array(&mut self, count: usize) -> Result<Handle> {
        self.arrays.require_initialized()?;
        if count == 0 {
            return Err(RuntimeError::invalid(LABEL, "array count must be positive"));
        }

        let array = self
            .arrays
            .gpu()
            .allocate_array(count)
            .map_err(|diagnostic| RuntimeError::external(LABEL, "allocate_array", diagnostic))?;
        self.arrays.insert(array, count)
    }

    /// Binds `array`; `None` unbinds.
    pub fn bind_array(&self, array: Option<Handle>) -> Result<()> {
        self.arrays.require_initialized()?;
        if let Some(array) = array {
            self.arrays.metadata(array)?;
        }
        self.arrays.gpu().bind_array(array);
        Ok(())
    }

    /// Describes attribute `index` of the bound array as `components`
    /// floats read from the bound array buffer.
    pub fn set_attribute(&self, index: u32, components: i32) -> Result<()> {
        self.arrays.require_initialized()?;
        if !(1..=4).contains(&components) {
            return Err(RuntimeError::invalid(
                LABEL,
                format!("attribute components must be 1..=4, got {}", components),
            ));
        }
        self.arrays.gpu().vertex_attribute(index, components);
        Ok(())
    }

    pub fn contains_array(&self, array: Handle) -> Result<bool> {
        self.arrays.contains(array)
    }

    pub fn array_count(&self) -> Result<usize> {
        self.arrays.size()
    }

    pub fn increment_array(&mut self, array: Handle) -> Result<usize> {
        self.arrays.increment_reference(array)
    }

    pub fn decrement_array(&mut self, array: Handle) -> Result<usize> {
        self.arrays.decrement_reference(array).map(|release| release.count())
    }

    pub fn reference_count_array(&self, array: Handle) -> Result<usize> {
        self.arrays.reference_count(array)
    }

    pub fn remove_array(&mut self, array: Handle) -> Result<()> {
        self.arrays.remove(array).map(drop)
    }

    //--- Whole Manager ----------------------------------------------------

    /// Destroys every buffer and array.
    pub fn clear(&mut self) -> Result<()> {
        self.arrays.clear()?;
        self.buffers.clear()?;
        Ok(())
    }

    /// Buffers plus arrays.
    pub fn size(&self) -> Result<usize> {
        Ok(self.buffers.size()? + self.arrays.size()?)
    }

    /// Draws `count` vertices of the bound array as triangles.
    pub fn draw_triangles(&self, first: i32, count: i32) -> Result<()> {
        self.arrays.require_initialized()?;
        self.arrays.gpu().draw_triangles(first, count);
        Ok(())
    }
}

//--- Trait Implementations -----------------------------------------------

impl Component for VertexManager {
    fn label(&self) -> &'static str {
        LABEL
    }

    fn initialize(&mut self) -> Result<()> {
        self.buffers.initialize()?;
        self.arrays.initialize()
    }

    fn uninitialize(&mut self) -> Result<()> {
        self.arrays.uninitialize()?;
        self.buffers.uninitialize()?;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.buffers.is_initialized() && self.arrays.is_initialized()
    }
}

impl fmt::Display for VertexManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.buffers, f)?;
        let arrays = self.arrays.handles().count();
        if self.arrays.is_initialized() {
            write!(f, "\n--- {} vertex array(s)", arrays)?;
            for array in self.arrays.handles() {
                write!(f, "\n--- 0x{:08x}", array)?;
            }
        }
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
