//=========================================================================
// Winit Platform
//
// OS windows and input through winit, polled without blocking.
//
// Architecture:
// ```text
//  Runtime loop                    WinitPlatform
//  ┌──────────────────┐           ┌────────────────────────────────┐
//  │ poll_event() ────┼──────────>│ queue empty?                   │
//  │                  │           │   └─ pump_app_events(ZERO)     │
//  │                  │           │        ↓                       │
//  │                  │           │      EventHandler              │
//  │                  │           │        ├─ EventTranslator      │
//  │                  │           │        └─ Sender<InputEvent>   │
//  │ <────────────────┼───────────│ Receiver::try_recv()           │
//  └──────────────────┘           └────────────────────────────────┘
// ```
//
// The event loop is pumped at most once per drain: `poll_event` pumps
// when the queue runs dry, hands out what arrived and reports `None` on
// the next empty read, which re-arms the pump for the following frame.
//
// winit allows one event loop per process, so it is created by the first
// `begin_session` and kept across sessions; `end_session` only closes
// windows.
//
//=========================================================================

//=== Submodules ==========================================================

mod translate;

//=== Standard Library Imports ============================================

use std::collections::BTreeMap;
use std::time::Duration;

//=== External Crates =====================================================

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

//=== Internal Dependencies ===============================================

use super::{Platform, WindowHandle};
use crate::display::{DisplayConfig, DisplayFlags};
use crate::input::InputEvent;
use translate::EventTranslator;

//=== EventHandler ========================================================

/// winit callback target: converts and queues window events.
struct EventHandler {
    tx: Sender<InputEvent>,
    translator: EventTranslator,
}

impl ApplicationHandler for EventHandler {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        trace!(target: "platform", "Event loop resumed");
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(input) = self.translator.translate(&event) else {
            return;
        };

        trace!(target: "platform", "{:?}: {:?}", window_id, input);
        if self.tx.send(input).is_err() {
            warn!(target: "platform", "Input queue disconnected, dropping event");
        }
    }
}

//=== WinitPlatform =======================================================

/// Desktop platform backed by winit.
///
/// Must be created and driven on the main thread (macOS/iOS requirement).
pub struct WinitPlatform {
    event_loop: Option<EventLoop<()>>,
    handler: EventHandler,
    rx: Receiver<InputEvent>,
    windows: BTreeMap<WindowHandle, Window>,
    next_window: u32,
    pumped: bool,
}

impl WinitPlatform {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            event_loop: None,
            handler: EventHandler {
                tx,
                translator: EventTranslator::default(),
            },
            rx,
            windows: BTreeMap::new(),
            next_window: 1,
            pumped: false,
        }
    }

    /// Borrow of an open winit window, for surface/context creation.
    pub fn window(&self, window: WindowHandle) -> Option<&Window> {
        self.windows.get(&window)
    }

    //--- Internal Helpers -------------------------------------------------

    fn pump(&mut self) {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return;
        };

        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.handler) {
            debug!(target: "platform", "Event loop exited with code {}", code);
            let _ = self.handler.tx.send(InputEvent::CloseRequested);
        }
    }

    fn attributes(config: &DisplayConfig) -> WindowAttributes {
        let flags = config.flags;
        let mut attrs = WindowAttributes::default()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(flags.contains(DisplayFlags::RESIZABLE))
            .with_visible(!flags.contains(DisplayFlags::HIDDEN))
            .with_decorations(!flags.contains(DisplayFlags::BORDERLESS))
            .with_maximized(flags.contains(DisplayFlags::MAXIMIZED));

        if let Some((x, y)) = config.position {
            attrs = attrs.with_position(PhysicalPosition::new(x, y));
        }
        if flags.contains(DisplayFlags::FULLSCREEN) {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        attrs
    }
}

impl Default for WinitPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for WinitPlatform {
    fn begin_session(&mut self) -> Result<(), String> {
        if self.event_loop.is_none() {
            let event_loop = EventLoop::new().map_err(|e| e.to_string())?;
            info!(target: "platform", "Winit event loop created");
            self.event_loop = Some(event_loop);
        }
        Ok(())
    }

    fn end_session(&mut self) {
        if !self.windows.is_empty() {
            warn!(target: "platform", "Closing {} window(s) left open", self.windows.len());
            self.windows.clear();
        }
        while self.rx.try_recv().is_ok() {}
        self.pumped = false;
    }

    fn create_window(&mut self, config: &DisplayConfig) -> Result<WindowHandle, String> {
        let event_loop = self
            .event_loop
            .as_ref()
            .ok_or_else(|| "no active session".to_string())?;

        // ActiveEventLoop is only reachable inside callbacks; the loop is
        // pumped on demand so windows are created from outside.
        #[allow(deprecated)]
        let window = event_loop
            .create_window(Self::attributes(config))
            .map_err(|e| e.to_string())?;

        info!(
            target: "platform",
            "Window created: {}x{} @ {}x DPI",
            window.inner_size().width,
            window.inner_size().height,
            window.scale_factor()
        );

        let handle = WindowHandle(self.next_window);
        self.next_window += 1;
        self.windows.insert(handle, window);
        Ok(handle)
    }

    fn destroy_window(&mut self, window: WindowHandle) {
        if self.windows.remove(&window).is_none() {
            warn!(target: "platform", "{} is not open", window);
        }
    }

    fn poll_event(&mut self) -> Option<InputEvent> {
        if let Ok(event) = self.rx.try_recv() {
            return Some(event);
        }

        if !self.pumped {
            self.pumped = true;
            self.pump();
            if let Ok(event) = self.rx.try_recv() {
                return Some(event);
            }
        }

        self.pumped = false;
        None
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
