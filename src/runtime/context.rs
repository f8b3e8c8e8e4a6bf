//=========================================================================
// Session Context
//
// What a lifecycle or frame callback sees of the running session.
//
// Callbacks receive the host state `&mut C` and a `Context`:
// ```text
//   |host: &mut C, ctx: &mut Context| -> anyhow::Result<()>
//        │                 ├─ window()        current window handle
//        │                 ├─ tick()          loop iteration counter
//        │                 ├─ resources()     shaders, programs, vertex
//        │                 └─ request_stop()  stop after this frame
//        └─ whatever the host threads through the session
// ```
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::backend::WindowHandle;
use crate::resource::Resources;

//=== Event ===============================================================

/// Lifecycle points where host callbacks run, in session order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Event {
    /// After the window exists, before the loop is marked running.
    Setup,

    /// Session is running; the first frame follows.
    Start,

    /// Running flag is about to drop.
    Stop,

    /// Loop has exited; resources are released right after.
    Teardown,
}

//=== FrameStage ==========================================================

/// Per-iteration callback slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrameStage {
    /// After input is drained, before pacing.
    Tick,

    /// After pacing.
    Draw,
}

//=== SessionCallback =====================================================

/// Lifecycle, tick and draw callback.
///
/// An `Err` aborts the session: teardown runs and `start` returns
/// `EventFailure` carrying the error.
pub type SessionCallback<C> = Box<dyn FnMut(&mut C, &mut Context<'_>) -> anyhow::Result<()>>;

//=== Context =============================================================

pub struct Context<'a> {
    window: Option<WindowHandle>,
    tick: u64,
    resources: &'a mut Resources,
    stop_requested: bool,
}

impl<'a> Context<'a> {
    pub(crate) fn new(window: Option<WindowHandle>, tick: u64, resources: &'a mut Resources) -> Self {
        Self {
            window,
            tick,
            resources,
            stop_requested: false,
        }
    }

    /// Session window, `None` only if the display is down.
    pub fn window(&self) -> Option<WindowHandle> {
        self.window
    }

    /// Iterations completed so far; 0 during SETUP, START, the first frame
    /// and TEARDOWN.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn resources(&mut self) -> &mut Resources {
        self.resources
    }

    /// Stops the session once the current iteration finishes.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }
}
