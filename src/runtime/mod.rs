//=========================================================================
// Runtime
//
// Session facade: owns every manager and drives the frame loop.
//
// Architecture:
// ```text
//     RuntimeBuilder ──build()──> Runtime ──start(host, config)──> [loop]
//         │                         │
//         ├─ with_platform()        ├─ DisplayManager   window
//         ├─ with_graphics()        ├─ InputManager     input callbacks
//         └─ with_min_fps()         ├─ Resources        GPU objects
//                                   └─ event/tick/draw tables
// ```
//
// Session:
// ```text
//   setup ─> SETUP ─> START ─┬─> poll ─> TICK ─> pace ─> DRAW ─┬─> STOP ─> TEARDOWN ─> teardown
//                            └──────────── while running ──────┘
// ```
//
// Stop requests raised inside an iteration (window close, a `Quit`
// input outcome, `Context::request_stop`) are applied once the iteration
// completes, so STOP always follows a whole (TICK, DRAW) pair. Teardown
// runs on every exit from `start` once setup has begun; TEARDOWN itself
// is only invoked when SETUP succeeded.
//
//=========================================================================

//=== Submodules ==========================================================

mod config;
mod context;
mod pacing;

//=== Public Exports ======================================================

pub use config::SessionConfig;
pub use context::{Context, Event, FrameStage, SessionCallback};
pub use pacing::FramePacer;

//=== Standard Library Imports ============================================

use std::fmt;
use std::rc::Rc;
use std::time::Instant;

//=== External Crates =====================================================

use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use crate::backend::{GraphicsBackend, HeadlessGraphics, Platform, WindowHandle};
use crate::core::{CallbackTable, Component, ComponentState};
use crate::display::DisplayManager;
use crate::error::{Result, RuntimeError};
use crate::input::{InputEvent, InputManager, InputOutcome};
use crate::resource::Resources;

/// Runtime version, `major.minor.tick.revision`.
pub const VERSION: &str = "0.1.1545.3";

const LABEL: &str = "runtime";

//=== RuntimeBuilder ======================================================

/// Builder for a [`Runtime`].
///
/// # Default Values
///
/// - **Platform**: none, [`RuntimeBuilder::with_platform`] is required
/// - **Graphics**: [`HeadlessGraphics`]
/// - **Minimum FPS**: 30 (33 ms frame budget)
///
/// # Examples
///
/// ```no_run
/// use luna_runtime::prelude::*;
///
/// let (platform, _events) = HeadlessPlatform::new();
/// let mut runtime = RuntimeBuilder::new()
///     .with_platform(platform)
///     .with_min_fps(60)
///     .build::<()>();
///
/// runtime.initialize()?;
/// # Ok::<(), RuntimeError>(())
/// ```
pub struct RuntimeBuilder<P = ()> {
    platform: P,
    graphics: Option<Rc<dyn GraphicsBackend>>,
    min_fps: u32,
}

impl RuntimeBuilder<()> {
    pub fn new() -> Self {
        Self {
            platform: (),
            graphics: None,
            min_fps: FramePacer::DEFAULT_FPS,
        }
    }
}

impl<P> RuntimeBuilder<P> {
    /// Sets the windowing and input collaborator.
    pub fn with_platform<Q: Platform>(self, platform: Q) -> RuntimeBuilder<Q> {
        RuntimeBuilder {
            platform,
            graphics: self.graphics,
            min_fps: self.min_fps,
        }
    }

    /// Sets the GPU collaborator shared by the resource managers.
    pub fn with_graphics(mut self, graphics: Rc<dyn GraphicsBackend>) -> Self {
        self.graphics = Some(graphics);
        self
    }

    /// Sets the frame rate the loop paces down to.
    ///
    /// Frames finishing early are padded to `1000 / fps` ms; slower frames
    /// run unpaced.
    ///
    /// Default: 30
    ///
    /// # Panics
    ///
    /// Panics if `fps == 0`.
    pub fn with_min_fps(mut self, fps: u32) -> Self {
        assert!(fps > 0, "FPS must be positive, got {}", fps);
        self.min_fps = fps;
        self
    }
}

impl<P: Platform> RuntimeBuilder<P> {
    /// Builds an uninitialized runtime for host state `C`.
    pub fn build<C>(self) -> Runtime<C, P> {
        info!(target: "runtime", "Building runtime {} (min FPS: {})", VERSION, self.min_fps);

        let graphics = self
            .graphics
            .unwrap_or_else(|| Rc::new(HeadlessGraphics::new()));

        Runtime {
            state: ComponentState::new(LABEL),
            platform: self.platform,
            display: DisplayManager::new(),
            input: InputManager::new(),
            resources: Resources::new(graphics),
            events: CallbackTable::new("event"),
            ticks: CallbackTable::new("tick"),
            draws: CallbackTable::new("draw"),
            pacer: FramePacer::from_fps(self.min_fps),
            tick: 0,
            session_active: false,
            stop_requested: false,
        }
    }
}

impl Default for RuntimeBuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

//=== Runtime =============================================================

/// Session facade over host state `C` and platform `P`.
///
/// `start` blocks until the session ends, so from the caller's side the
/// runtime is only ever observed initialized or uninitialized.
pub struct Runtime<C, P: Platform> {
    state: ComponentState,
    platform: P,
    display: DisplayManager,
    input: InputManager<C>,
    resources: Resources,
    events: CallbackTable<Event, SessionCallback<C>>,
    ticks: CallbackTable<FrameStage, SessionCallback<C>>,
    draws: CallbackTable<FrameStage, SessionCallback<C>>,
    pacer: FramePacer,
    tick: u64,
    session_active: bool,
    stop_requested: bool,
}

impl<C, P: Platform> Runtime<C, P> {
    //--- Session ----------------------------------------------------------

    /// Runs one session to completion.
    ///
    /// # Errors
    ///
    /// - `Uninitialized` / `AlreadyStarted` before anything runs
    /// - `External` if the platform session or window cannot be created
    /// - `EventFailure` if a callback fails; teardown still runs
    ///
    /// When both the session and its teardown fail, the session error is
    /// returned and the teardown error is logged.
    pub fn start(&mut self, host: &mut C, config: SessionConfig<C>) -> Result<()> {
        self.state.require_stopped()?;

        info!(target: "runtime", "Session starting");
        self.tick = 0;
        self.stop_requested = false;

        let mut setup_done = false;
        let outcome = self.run_session(host, config, &mut setup_done);

        self.state.force_stopped();
        self.tick = 0;
        let cleanup = self.teardown(host, setup_done);

        match (outcome, cleanup) {
            (Ok(()), cleanup) => {
                info!(target: "runtime", "Session ended");
                cleanup
            }
            (Err(err), cleanup) => {
                error!(target: "runtime", "Session aborted: {}", err);
                if let Err(later) = cleanup {
                    error!(target: "runtime", "Teardown after abort: {}", later);
                }
                Err(err)
            }
        }
    }

    /// Invokes STOP and drops the running flag.
    ///
    /// The loop exits at its next check; teardown follows from `start`.
    pub fn stop(&mut self, host: &mut C) -> Result<()> {
        self.state.require_running()?;

        let result = self.invoke_event(host, Event::Stop);
        self.state.stop()?;
        self.stop_requested = false;

        info!(target: "runtime", "Session stopping after {} tick(s)", self.tick);
        result
    }

    //--- Queries ----------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Iterations completed in the current session, 0 between sessions.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn version(&self) -> &'static str {
        VERSION
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    pub fn display(&self) -> &DisplayManager {
        &self.display
    }

    pub fn input(&self) -> &InputManager<C> {
        &self.input
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    //--- Session Phases ---------------------------------------------------

    fn run_session(&mut self, host: &mut C, config: SessionConfig<C>, setup_done: &mut bool) -> Result<()> {
        self.setup(host, config)?;
        *setup_done = true;

        self.state.start()?;
        self.invoke_event(host, Event::Start)?;
        if self.stop_requested {
            self.stop(host)?;
        }

        while self.state.is_running() {
            self.frame(host)?;
        }
        Ok(())
    }

    fn setup(&mut self, host: &mut C, config: SessionConfig<C>) -> Result<()> {
        let SessionConfig {
            events,
            ticks,
            draws,
            input,
            display,
        } = config;

        self.platform
            .begin_session()
            .map_err(|diagnostic| RuntimeError::external(LABEL, "begin_session", diagnostic))?;
        self.session_active = true;

        self.resources.clear()?;
        self.input.set(input)?;
        self.display.start(&mut self.platform, display)?;

        self.events = events;
        self.ticks = ticks;
        self.draws = draws;
        debug!(
            target: "runtime",
            "Installed {} event, {} tick, {} draw callback(s)",
            self.events.size(),
            self.ticks.size(),
            self.draws.size()
        );

        self.invoke_event(host, Event::Setup)
    }

    /// One loop iteration: poll, TICK, pace, DRAW.
    fn frame(&mut self, host: &mut C) -> Result<()> {
        let frame_start = Instant::now();

        while let Some(event) = self.platform.poll_event() {
            if event == InputEvent::CloseRequested {
                debug!(target: "runtime", "Window close requested");
                self.stop_requested = true;
                continue;
            }
            if self.input.handle(host, &event)? == InputOutcome::Quit {
                debug!(target: "runtime", "Quit from {:?}", event.kind());
                self.stop_requested = true;
            }
        }

        self.invoke_stage(host, FrameStage::Tick)?;
        self.pacer.pace(frame_start);
        self.invoke_stage(host, FrameStage::Draw)?;
        self.tick += 1;

        if self.stop_requested {
            self.stop(host)?;
        }
        Ok(())
    }

    /// Releases whatever setup brought up, in reverse dependency order.
    fn teardown(&mut self, host: &mut C, setup_done: bool) -> Result<()> {
        let mut failure = None;

        if setup_done {
            keep_first(&mut failure, self.invoke_event(host, Event::Teardown));
        }

        self.events.clear();
        self.ticks.clear();
        self.draws.clear();

        if self.display.is_running() {
            keep_first(&mut failure, self.display.stop(&mut self.platform));
        }
        if self.input.is_initialized() {
            keep_first(&mut failure, self.input.clear());
        }
        if self.resources.is_initialized() {
            keep_first(&mut failure, self.resources.clear());
        }
        self.end_session();

        failure.map_or(Ok(()), Err)
    }

    fn end_session(&mut self) {
        if self.session_active {
            self.platform.end_session();
            self.session_active = false;
            debug!(target: "runtime", "Platform session ended");
        }
    }

    /// Uninitializes every initialized sub-manager.
    fn release_components(&mut self) -> Result<()> {
        let mut failure = None;

        if self.display.is_initialized() {
            keep_first(&mut failure, self.display.shutdown(&mut self.platform));
        }
        if self.input.is_initialized() {
            keep_first(&mut failure, self.input.uninitialize());
        }
        if self.resources.is_initialized() {
            keep_first(&mut failure, self.resources.uninitialize());
        }
        self.end_session();

        failure.map_or(Ok(()), Err)
    }

    //--- Dispatch ---------------------------------------------------------

    fn invoke_event(&mut self, host: &mut C, event: Event) -> Result<()> {
        let window = self.display.window();
        let stop = dispatch(&mut self.events, event, host, window, self.tick, &mut self.resources)?;
        self.stop_requested |= stop;
        Ok(())
    }

    fn invoke_stage(&mut self, host: &mut C, stage: FrameStage) -> Result<()> {
        let window = self.display.window();
        let table = match stage {
            FrameStage::Tick => &mut self.ticks,
            FrameStage::Draw => &mut self.draws,
        };
        let stop = dispatch(table, stage, host, window, self.tick, &mut self.resources)?;
        self.stop_requested |= stop;
        Ok(())
    }
}

//--- Trait Implementations -----------------------------------------------

impl<C, P: Platform> Component for Runtime<C, P> {
    fn label(&self) -> &'static str {
        LABEL
    }

    /// Initializes resources, input and display, in that order.
    ///
    /// A failing sub-manager rolls back the ones already initialized.
    fn initialize(&mut self) -> Result<()> {
        self.state.initialize()?;

        let cascade = self
            .resources
            .initialize()
            .and_then(|()| self.input.initialize())
            .and_then(|()| self.display.initialize());

        if let Err(err) = cascade {
            warn!(target: "runtime", "Initialization failed, rolling back: {}", err);
            if let Err(rollback) = self.release_components() {
                error!(target: "runtime", "Rollback failed: {}", rollback);
            }
            self.state.uninitialize()?;
            return Err(err);
        }

        info!(target: "runtime", "Runtime {} initialized", VERSION);
        Ok(())
    }

    fn uninitialize(&mut self) -> Result<()> {
        self.state.require_initialized()?;

        let result = self.release_components();
        self.state.uninitialize()?;

        info!(target: "runtime", "Runtime uninitialized");
        result
    }

    fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }
}

impl<C, P: Platform> fmt::Display for Runtime<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(RUNTIME) ({}, {}) v{}, tick {}, budget {:?}",
            self.state.init_tag(),
            self.state.run_tag(),
            VERSION,
            self.tick,
            self.pacer.budget()
        )?;
        if self.state.is_initialized() {
            write!(f, "\n{}\n{}\n{}", self.display, self.input, self.resources)?;
        }
        Ok(())
    }
}

//=== Helpers =============================================================

/// Runs the callback for `key`, if any. Returns whether it asked to stop.
fn dispatch<C, K>(
    table: &mut CallbackTable<K, SessionCallback<C>>,
    key: K,
    host: &mut C,
    window: Option<WindowHandle>,
    tick: u64,
    resources: &mut Resources,
) -> Result<bool>
where
    K: Ord + Copy + fmt::Debug,
{
    let mut ctx = Context::new(window, tick, resources);
    table.invoke_with(key, |callback| callback(host, &mut ctx))?;
    Ok(ctx.stop_requested())
}

/// Keeps the first error of a cleanup sequence; later ones are logged.
fn keep_first(failure: &mut Option<RuntimeError>, result: Result<()>) {
    if let Err(err) = result {
        match failure {
            None => *failure = Some(err),
            Some(_) => error!(target: "runtime", "Further cleanup failure: {}", err),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
