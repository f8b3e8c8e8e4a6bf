//=========================================================================
// Headless Backends
//
// In-process `Platform` and `GraphicsBackend` implementations with no
// OS window and no GPU.
//
// Used for tests, CI and off-screen runs. Both keep enough bookkeeping to
// observe what the runtime did:
//
// - HeadlessPlatform: session flag, open windows, scripted input queue
// - HeadlessGraphics: live objects per kind, destroy counts per handle,
//   bound program/buffer/array, uploaded bytes, draw calls
//
// Failures can be injected to exercise the error paths of every
// creation primitive.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};

//=== External Crates =====================================================

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::trace;

//=== Internal Dependencies ===============================================

use super::{BufferTarget, BufferUsage, GraphicsBackend, Handle, Platform, ShaderKind, WindowHandle};
use crate::display::DisplayConfig;
use crate::input::InputEvent;

//=== EventSender =========================================================

/// Producer side of a [`HeadlessPlatform`] input queue.
///
/// Cloneable and `Send`; events may be scripted before the session starts
/// or pushed from another thread while it runs.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<InputEvent>,
}

impl EventSender {
    /// Queues `event`. Returns `false` once the platform is dropped.
    pub fn send(&self, event: InputEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Queues a window close request.
    pub fn close(&self) -> bool {
        self.send(InputEvent::CloseRequested)
    }
}

//=== HeadlessPlatform ====================================================

/// Window-less platform fed by an [`EventSender`].
#[derive(Debug)]
pub struct HeadlessPlatform {
    rx: Receiver<InputEvent>,
    session_active: bool,
    sessions_begun: usize,
    next_window: u32,
    windows: BTreeMap<WindowHandle, DisplayConfig>,
    session_failure: Option<String>,
    window_failure: Option<String>,
}

impl HeadlessPlatform {
    pub fn new() -> (Self, EventSender) {
        let (tx, rx) = unbounded();
        let platform = Self {
            rx,
            session_active: false,
            sessions_begun: 0,
            next_window: 1,
            windows: BTreeMap::new(),
            session_failure: None,
            window_failure: None,
        };
        (platform, EventSender { tx })
    }

    //--- Failure Injection ------------------------------------------------

    /// Makes the next `begin_session` fail with `diagnostic`.
    pub fn fail_session(&mut self, diagnostic: impl Into<String>) {
        self.session_failure = Some(diagnostic.into());
    }

    /// Makes the next `create_window` fail with `diagnostic`.
    pub fn fail_window_creation(&mut self, diagnostic: impl Into<String>) {
        self.window_failure = Some(diagnostic.into());
    }

    //--- Inspection -------------------------------------------------------

    pub fn is_session_active(&self) -> bool {
        self.session_active
    }

    /// Number of successful `begin_session` calls so far.
    pub fn sessions_begun(&self) -> usize {
        self.sessions_begun
    }

    pub fn is_window_open(&self, window: WindowHandle) -> bool {
        self.windows.contains_key(&window)
    }

    pub fn open_windows(&self) -> usize {
        self.windows.len()
    }

    /// Configuration an open window was created with.
    pub fn window_config(&self, window: WindowHandle) -> Option<&DisplayConfig> {
        self.windows.get(&window)
    }

    /// Events queued but not yet polled.
    pub fn pending_events(&self) -> usize {
        self.rx.len()
    }
}

impl Platform for HeadlessPlatform {
    fn begin_session(&mut self) -> Result<(), String> {
        if let Some(diagnostic) = self.session_failure.take() {
            return Err(diagnostic);
        }
        self.session_active = true;
        self.sessions_begun += 1;
        trace!(target: "platform", "Headless session begun");
        Ok(())
    }

    fn end_session(&mut self) {
        self.session_active = false;
        trace!(target: "platform", "Headless session ended");
    }

    fn create_window(&mut self, config: &DisplayConfig) -> Result<WindowHandle, String> {
        if let Some(diagnostic) = self.window_failure.take() {
            return Err(diagnostic);
        }
        if !self.session_active {
            return Err("no active session".to_string());
        }

        let window = WindowHandle(self.next_window);
        self.next_window += 1;
        self.windows.insert(window, config.clone());
        Ok(window)
    }

    fn destroy_window(&mut self, window: WindowHandle) {
        self.windows.remove(&window);
    }

    fn poll_event(&mut self) -> Option<InputEvent> {
        self.rx.try_recv().ok()
    }
}

//=== GpuObjectKind =======================================================

/// Families of objects tracked by [`HeadlessGraphics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GpuObjectKind {
    Shader,
    Program,
    Buffer,
    Array,
}

//=== HeadlessGraphics ====================================================

#[derive(Debug, Default)]
struct GpuState {
    live: BTreeMap<Handle, GpuObjectKind>,
    destroyed: HashMap<Handle, usize>,
    program_shaders: HashMap<Handle, Vec<Handle>>,
    bound_buffers: HashMap<BufferTarget, Handle>,
    uploaded: HashMap<Handle, usize>,
    enabled_attributes: BTreeSet<u32>,
    compile_failure: Option<String>,
    link_failure: Option<String>,
}

/// Bookkeeping-only graphics backend.
///
/// Handles are issued from one counter shared by every object kind, so a
/// handle identifies its object uniquely for the backend's lifetime.
/// [`HeadlessGraphics::reusing_handles`] instead hands out the lowest free
/// handle, the way GL recycles deleted names.
#[derive(Debug)]
pub struct HeadlessGraphics {
    next_handle: Cell<Handle>,
    reuse_handles: bool,
    state: RefCell<GpuState>,
    program: Cell<Option<Handle>>,
    array: Cell<Option<Handle>>,
    draws: Cell<usize>,
    vertices_drawn: Cell<usize>,
}

impl HeadlessGraphics {
    pub fn new() -> Self {
        Self {
            next_handle: Cell::new(1),
            reuse_handles: false,
            state: RefCell::new(GpuState::default()),
            program: Cell::new(None),
            array: Cell::new(None),
            draws: Cell::new(0),
            vertices_drawn: Cell::new(0),
        }
    }

    /// Backend that reissues destroyed handles, lowest first.
    pub fn reusing_handles() -> Self {
        Self {
            reuse_handles: true,
            ..Self::new()
        }
    }

    //--- Failure Injection ------------------------------------------------

    /// Makes the next `compile_shader` fail with `diagnostic`.
    pub fn fail_next_compile(&self, diagnostic: impl Into<String>) {
        self.state.borrow_mut().compile_failure = Some(diagnostic.into());
    }

    /// Makes the next `link_program` fail with `diagnostic`.
    pub fn fail_next_link(&self, diagnostic: impl Into<String>) {
        self.state.borrow_mut().link_failure = Some(diagnostic.into());
    }

    //--- Inspection -------------------------------------------------------

    pub fn is_live(&self, handle: Handle) -> bool {
        self.state.borrow().live.contains_key(&handle)
    }

    pub fn live_count(&self, kind: GpuObjectKind) -> usize {
        self.state.borrow().live.values().filter(|k| **k == kind).count()
    }

    /// Times `handle` was passed to a destroy primitive.
    pub fn destroy_count(&self, handle: Handle) -> usize {
        self.state.borrow().destroyed.get(&handle).copied().unwrap_or(0)
    }

    pub fn bound_program(&self) -> Option<Handle> {
        self.program.get()
    }

    pub fn bound_array(&self) -> Option<Handle> {
        self.array.get()
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<Handle> {
        self.state.borrow().bound_buffers.get(&target).copied()
    }

    /// Shaders `program` was linked from, empty once it is destroyed.
    pub fn attached_shaders(&self, program: Handle) -> Vec<Handle> {
        self.state.borrow().program_shaders.get(&program).cloned().unwrap_or_default()
    }

    /// Bytes last uploaded into `buffer`.
    pub fn uploaded_bytes(&self, buffer: Handle) -> usize {
        self.state.borrow().uploaded.get(&buffer).copied().unwrap_or(0)
    }

    pub fn is_attribute_enabled(&self, index: u32) -> bool {
        self.state.borrow().enabled_attributes.contains(&index)
    }

    pub fn draw_calls(&self) -> usize {
        self.draws.get()
    }

    pub fn vertices_drawn(&self) -> usize {
        self.vertices_drawn.get()
    }

    //--- Internal Helpers -------------------------------------------------

    fn issue(&self, kind: GpuObjectKind) -> Handle {
        let mut state = self.state.borrow_mut();
        let handle = if self.reuse_handles {
            (1..).find(|h| !state.live.contains_key(h)).unwrap_or(Handle::MAX)
        } else {
            let handle = self.next_handle.get();
            self.next_handle.set(handle + 1);
            handle
        };
        state.live.insert(handle, kind);
        trace!(target: "platform", "Headless {:?} 0x{:x} created", kind, handle);
        handle
    }

    fn release(&self, handle: Handle, kind: GpuObjectKind) {
        let mut state = self.state.borrow_mut();
        *state.destroyed.entry(handle).or_insert(0) += 1;
        if state.live.get(&handle) == Some(&kind) {
            state.live.remove(&handle);
            state.program_shaders.remove(&handle);
            state.uploaded.remove(&handle);
        }
    }

    fn lookup(&self, program: Handle, name: &str) -> Result<u32, String> {
        let state = self.state.borrow();
        if state.live.get(&program) != Some(&GpuObjectKind::Program) {
            return Err(format!("program 0x{:x} is not live", program));
        }
        if name.is_empty() {
            return Err("empty name".to_string());
        }
        // Stable per name so repeated queries agree.
        Ok(name.bytes().fold(0u32, |acc, b| acc.wrapping_add(b as u32)) % 16)
    }
}

impl Default for HeadlessGraphics {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsBackend for HeadlessGraphics {
    //--- Shaders ----------------------------------------------------------

    fn compile_shader(&self, _kind: ShaderKind, source: &str) -> Result<Handle, String> {
        if let Some(diagnostic) = self.state.borrow_mut().compile_failure.take() {
            return Err(diagnostic);
        }
        if source.trim().is_empty() {
            return Err("empty shader source".to_string());
        }
        Ok(self.issue(GpuObjectKind::Shader))
    }

    fn destroy_shader(&self, shader: Handle) {
        self.release(shader, GpuObjectKind::Shader);
    }

    //--- Programs ---------------------------------------------------------

    fn link_program(&self, shaders: &[Handle]) -> Result<Handle, String> {
        {
            let mut state = self.state.borrow_mut();
            if let Some(diagnostic) = state.link_failure.take() {
                return Err(diagnostic);
            }
            if shaders.is_empty() {
                return Err("no shaders attached".to_string());
            }
            if let Some(dead) = shaders
                .iter()
                .find(|s| state.live.get(*s) != Some(&GpuObjectKind::Shader))
            {
                return Err(format!("shader 0x{:x} is not live", dead));
            }
        }

        let program = self.issue(GpuObjectKind::Program);
        self.state.borrow_mut().program_shaders.insert(program, shaders.to_vec());
        Ok(program)
    }

    fn destroy_program(&self, program: Handle) {
        if self.program.get() == Some(program) {
            self.program.set(None);
        }
        self.release(program, GpuObjectKind::Program);
    }

    fn use_program(&self, program: Option<Handle>) {
        self.program.set(program);
    }

    fn attribute_location(&self, program: Handle, name: &str) -> Result<u32, String> {
        self.lookup(program, name)
    }

    fn uniform_location(&self, program: Handle, name: &str) -> Result<u32, String> {
        self.lookup(program, name)
    }

    //--- Buffers ----------------------------------------------------------

    fn allocate_buffer(&self, _target: BufferTarget, count: usize) -> Result<Handle, String> {
        if count == 0 {
            return Err("buffer count must be positive".to_string());
        }
        Ok(self.issue(GpuObjectKind::Buffer))
    }

    fn destroy_buffer(&self, buffer: Handle, _count: usize) {
        self.state.borrow_mut().bound_buffers.retain(|_, bound| *bound != buffer);
        self.release(buffer, GpuObjectKind::Buffer);
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Handle>) {
        let mut state = self.state.borrow_mut();
        match buffer {
            Some(buffer) => state.bound_buffers.insert(target, buffer),
            None => state.bound_buffers.remove(&target),
        };
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], _usage: BufferUsage) {
        let mut state = self.state.borrow_mut();
        if let Some(buffer) = state.bound_buffers.get(&target).copied() {
            state.uploaded.insert(buffer, data.len());
        }
    }

    //--- Vertex Arrays ----------------------------------------------------

    fn allocate_array(&self, count: usize) -> Result<Handle, String> {
        if count == 0 {
            return Err("array count must be positive".to_string());
        }
        Ok(self.issue(GpuObjectKind::Array))
    }

    fn destroy_array(&self, array: Handle, _count: usize) {
        if self.array.get() == Some(array) {
            self.array.set(None);
        }
        self.release(array, GpuObjectKind::Array);
    }

    fn bind_array(&self, array: Option<Handle>) {
        self.array.set(array);
    }

    fn vertex_attribute(&self, index: u32, _components: i32) {
        self.state.borrow_mut().enabled_attributes.insert(index);
    }

    //--- Drawing ----------------------------------------------------------

    fn draw_triangles(&self, _first: i32, count: i32) {
        self.draws.set(self.draws.get() + 1);
        self.vertices_drawn.set(self.vertices_drawn.get() + count.max(0) as usize);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputEventKind;

    //=====================================================================
    // Platform Tests
    //=====================================================================

    #[test]
    fn events_arrive_in_order() {
        let (mut platform, events) = HeadlessPlatform::new();
        events.send(InputEvent::User { code: 1 });
        events.close();

        assert_eq!(platform.pending_events(), 2);
        assert_eq!(platform.poll_event().map(|e| e.kind()), Some(InputEventKind::User(1)));
        assert_eq!(platform.poll_event(), Some(InputEvent::CloseRequested));
        assert_eq!(platform.poll_event(), None);
    }

    #[test]
    fn window_requires_session() {
        let (mut platform, _events) = HeadlessPlatform::new();
        assert!(platform.create_window(&DisplayConfig::default()).is_err());

        platform.begin_session().unwrap();
        let window = platform.create_window(&DisplayConfig::default()).unwrap();
        assert!(platform.is_window_open(window));

        platform.destroy_window(window);
        assert_eq!(platform.open_windows(), 0);
    }

    #[test]
    fn injected_session_failure_is_one_shot() {
        let (mut platform, _events) = HeadlessPlatform::new();
        platform.fail_session("driver missing");

        assert_eq!(platform.begin_session(), Err("driver missing".to_string()));
        assert!(!platform.is_session_active());
        assert!(platform.begin_session().is_ok());
        assert_eq!(platform.sessions_begun(), 1);
    }

    //=====================================================================
    // Graphics Tests
    //=====================================================================

    #[test]
    fn empty_source_fails_to_compile() {
        let gpu = HeadlessGraphics::new();
        assert!(gpu.compile_shader(ShaderKind::Vertex, "  ").is_err());
        assert_eq!(gpu.live_count(GpuObjectKind::Shader), 0);
    }

    #[test]
    fn link_requires_live_shaders() {
        let gpu = HeadlessGraphics::new();
        let shader = gpu.compile_shader(ShaderKind::Vertex, "void main() {}").unwrap();

        assert!(gpu.link_program(&[]).is_err());
        assert!(gpu.link_program(&[shader + 100]).is_err());

        let program = gpu.link_program(&[shader]).unwrap();
        assert!(gpu.is_live(program));
        assert_eq!(gpu.attached_shaders(program), vec![shader]);
    }

    #[test]
    fn destroy_counts_every_call() {
        let gpu = HeadlessGraphics::new();
        let buffer = gpu.allocate_buffer(BufferTarget::Array, 1).unwrap();

        gpu.destroy_buffer(buffer, 1);
        gpu.destroy_buffer(buffer, 1);

        assert!(!gpu.is_live(buffer));
        assert_eq!(gpu.destroy_count(buffer), 2);
    }

    #[test]
    fn reusing_backend_recycles_lowest_free_handle() {
        let gpu = HeadlessGraphics::reusing_handles();
        let a = gpu.compile_shader(ShaderKind::Vertex, "void main() {}").unwrap();
        let b = gpu.compile_shader(ShaderKind::Vertex, "void main() {}").unwrap();

        gpu.destroy_shader(a);
        let c = gpu.allocate_buffer(BufferTarget::Array, 1).unwrap();

        assert_eq!((a, b, c), (1, 2, 1));
        assert!(gpu.is_live(c));
        assert_eq!(gpu.live_count(GpuObjectKind::Shader), 1);
    }

    #[test]
    fn buffer_data_goes_to_bound_buffer() {
        let gpu = HeadlessGraphics::new();
        let buffer = gpu.allocate_buffer(BufferTarget::Array, 1).unwrap();

        gpu.bind_buffer(BufferTarget::Array, Some(buffer));
        gpu.buffer_data(BufferTarget::Array, &[0u8; 36], BufferUsage::Static);

        assert_eq!(gpu.bound_buffer(BufferTarget::Array), Some(buffer));
        assert_eq!(gpu.uploaded_bytes(buffer), 36);
    }

    #[test]
    fn locations_need_live_program() {
        let gpu = HeadlessGraphics::new();
        assert!(gpu.attribute_location(99, "vert0").is_err());

        let shader = gpu.compile_shader(ShaderKind::Vertex, "void main() {}").unwrap();
        let program = gpu.link_program(&[shader]).unwrap();
        let first = gpu.attribute_location(program, "vert0").unwrap();
        assert_eq!(gpu.attribute_location(program, "vert0").unwrap(), first);
    }

    #[test]
    fn draw_calls_accumulate() {
        let gpu = HeadlessGraphics::new();
        gpu.draw_triangles(0, 3);
        gpu.draw_triangles(0, 6);

        assert_eq!(gpu.draw_calls(), 2);
        assert_eq!(gpu.vertices_drawn(), 9);
    }
}
