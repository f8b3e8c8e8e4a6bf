//=========================================================================
// Glow Graphics
//
// `GraphicsBackend` over OpenGL through `glow`.
//
// The host creates the GL context (glutin, SDL, a test harness) and makes
// it current on the runtime thread before handing it over. Every call is
// issued against that context; glow's native object ids double as runtime
// handles.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::num::NonZeroU32;

//=== External Crates =====================================================

use glow::HasContext;
use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::{BufferTarget, BufferUsage, GraphicsBackend, Handle, ShaderKind};

//=== Handle Conversions ==================================================

fn shader(handle: Handle) -> Option<glow::NativeShader> {
    NonZeroU32::new(handle).map(glow::NativeShader)
}

fn program(handle: Handle) -> Option<glow::NativeProgram> {
    NonZeroU32::new(handle).map(glow::NativeProgram)
}

fn buffer(handle: Handle) -> Option<glow::NativeBuffer> {
    NonZeroU32::new(handle).map(glow::NativeBuffer)
}

fn array(handle: Handle) -> Option<glow::NativeVertexArray> {
    NonZeroU32::new(handle).map(glow::NativeVertexArray)
}

fn shader_type(kind: ShaderKind) -> u32 {
    match kind {
        ShaderKind::Vertex => glow::VERTEX_SHADER,
        ShaderKind::Fragment => glow::FRAGMENT_SHADER,
        ShaderKind::Geometry => glow::GEOMETRY_SHADER,
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        BufferTarget::Uniform => glow::UNIFORM_BUFFER,
    }
}

fn buffer_usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
        BufferUsage::Stream => glow::STREAM_DRAW,
    }
}

//=== GlowGraphics ========================================================

/// OpenGL backend.
///
/// glow hands out one object per create call, so multi-object counts
/// are carried as metadata only and one GL object backs each handle.
pub struct GlowGraphics {
    gl: glow::Context,
}

impl GlowGraphics {
    /// Wraps a context that is current on the calling thread.
    pub fn new(gl: glow::Context) -> Self {
        debug!(target: "platform", "OpenGL backend ready: {}", Self::describe(&gl));
        Self { gl }
    }

    /// Raw context for drawing code outside the backend interface.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn describe(gl: &glow::Context) -> String {
        // SAFETY: the context is current; GetString has no side effects.
        let (vendor, renderer) = unsafe {
            (
                gl.get_parameter_string(glow::VENDOR),
                gl.get_parameter_string(glow::RENDERER),
            )
        };
        format!("{} / {}", vendor, renderer)
    }
}

impl GraphicsBackend for GlowGraphics {
    //--- Shaders ----------------------------------------------------------

    fn compile_shader(&self, kind: ShaderKind, source: &str) -> Result<Handle, String> {
        let gl = &self.gl;
        unsafe {
            let shader = gl
                .create_shader(shader_type(kind))
                .map_err(|e| format!("create_shader({:?}) failed: {e:?}", kind))?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(log);
            }

            Ok(shader.0.get())
        }
    }

    fn destroy_shader(&self, handle: Handle) {
        if let Some(shader) = shader(handle) {
            unsafe { self.gl.delete_shader(shader) };
        }
    }

    //--- Programs ---------------------------------------------------------

    fn link_program(&self, shaders: &[Handle]) -> Result<Handle, String> {
        let attached: Vec<_> = shaders.iter().filter_map(|h| shader(*h)).collect();
        if attached.is_empty() {
            return Err("no shaders attached".to_string());
        }

        let gl = &self.gl;
        unsafe {
            let program = gl
                .create_program()
                .map_err(|e| format!("create_program failed: {e:?}"))?;
            for shader in &attached {
                gl.attach_shader(program, *shader);
            }
            gl.link_program(program);
            for shader in &attached {
                gl.detach_shader(program, *shader);
            }

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(log);
            }

            Ok(program.0.get())
        }
    }

    fn destroy_program(&self, handle: Handle) {
        if let Some(program) = program(handle) {
            unsafe { self.gl.delete_program(program) };
        }
    }

    fn use_program(&self, handle: Option<Handle>) {
        unsafe { self.gl.use_program(handle.and_then(program)) };
    }

    fn attribute_location(&self, handle: Handle, name: &str) -> Result<u32, String> {
        let program = program(handle).ok_or_else(|| "null program".to_string())?;
        unsafe { self.gl.get_attrib_location(program, name) }
            .ok_or_else(|| format!("attribute \"{}\" is not active", name))
    }

    fn uniform_location(&self, handle: Handle, name: &str) -> Result<u32, String> {
        let program = program(handle).ok_or_else(|| "null program".to_string())?;
        unsafe { self.gl.get_uniform_location(program, name) }
            .map(|location| location.0)
            .ok_or_else(|| format!("uniform \"{}\" is not active", name))
    }

    //--- Buffers ----------------------------------------------------------

    fn allocate_buffer(&self, _target: BufferTarget, count: usize) -> Result<Handle, String> {
        if count == 0 {
            return Err("buffer count must be positive".to_string());
        }
        if count > 1 {
            warn!(target: "platform", "Backing {} buffers with one GL object", count);
        }
        unsafe { self.gl.create_buffer() }.map(|b| b.0.get())
    }

    fn destroy_buffer(&self, handle: Handle, _count: usize) {
        if let Some(buffer) = buffer(handle) {
            unsafe { self.gl.delete_buffer(buffer) };
        }
    }

    fn bind_buffer(&self, target: BufferTarget, handle: Option<Handle>) {
        unsafe { self.gl.bind_buffer(buffer_target(target), handle.and_then(buffer)) };
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(buffer_target(target), data, buffer_usage(usage))
        };
    }

    //--- Vertex Arrays ----------------------------------------------------

    fn allocate_array(&self, count: usize) -> Result<Handle, String> {
        if count == 0 {
            return Err("array count must be positive".to_string());
        }
        if count > 1 {
            warn!(target: "platform", "Backing {} vertex arrays with one GL object", count);
        }
        unsafe { self.gl.create_vertex_array() }.map(|a| a.0.get())
    }

    fn destroy_array(&self, handle: Handle, _count: usize) {
        if let Some(array) = array(handle) {
            unsafe { self.gl.delete_vertex_array(array) };
        }
    }

    fn bind_array(&self, handle: Option<Handle>) {
        unsafe { self.gl.bind_vertex_array(handle.and_then(array)) };
    }

    fn vertex_attribute(&self, index: u32, components: i32) {
        unsafe {
            self.gl.enable_vertex_attrib_array(index);
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, 0, 0);
        }
    }

    //--- Drawing ----------------------------------------------------------

    fn draw_triangles(&self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, first, count) };
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Calls into GL need a live context; only the pure mappings are
    // checked here.

    #[test]
    fn null_handles_have_no_object() {
        assert!(shader(0).is_none());
        assert!(program(0).is_none());
        assert!(buffer(0).is_none());
        assert!(array(0).is_none());
    }

    #[test]
    fn handles_round_trip_through_native_ids() {
        assert_eq!(shader(7).map(|s| s.0.get()), Some(7));
        assert_eq!(program(9).map(|p| p.0.get()), Some(9));
        assert_eq!(buffer(1).map(|b| b.0.get()), Some(1));
        assert_eq!(array(3).map(|a| a.0.get()), Some(3));
        assert_eq!(buffer(Handle::MAX).map(|b| b.0.get()), Some(Handle::MAX));
    }

    #[test]
    fn shader_kinds_map_to_stages() {
        assert_eq!(shader_type(ShaderKind::Vertex), glow::VERTEX_SHADER);
        assert_eq!(shader_type(ShaderKind::Fragment), glow::FRAGMENT_SHADER);
        assert_eq!(shader_type(ShaderKind::Geometry), glow::GEOMETRY_SHADER);
    }

    #[test]
    fn buffer_targets_and_usages() {
        assert_eq!(buffer_target(BufferTarget::Array), glow::ARRAY_BUFFER);
        assert_eq!(buffer_target(BufferTarget::ElementArray), glow::ELEMENT_ARRAY_BUFFER);
        assert_eq!(buffer_target(BufferTarget::Uniform), glow::UNIFORM_BUFFER);

        assert_eq!(buffer_usage(BufferUsage::Static), glow::STATIC_DRAW);
        assert_eq!(buffer_usage(BufferUsage::Dynamic), glow::DYNAMIC_DRAW);
        assert_eq!(buffer_usage(BufferUsage::Stream), glow::STREAM_DRAW);
    }
}
