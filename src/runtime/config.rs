//=========================================================================
// Session Configuration
//
// Everything `Runtime::start` installs for one session: lifecycle, tick,
// draw and input callbacks plus the window description.
//
// ```no_run
// use luna_runtime::prelude::*;
//
// struct Game { frames: u64 }
//
// let config = SessionConfig::<Game>::new()
//     .with_display(DisplayConfig::new("Demo").with_size(800, 600))
//     .on(Event::Setup, |_game, ctx| {
//         ctx.resources().vertex_mut().add_array(1)?;
//         Ok(())
//     })
//     .on_tick(|game, _ctx| {
//         game.frames += 1;
//         Ok(())
//     })
//     .on_input(InputEventKind::KeyDown, |_game, event| match event.key() {
//         Some(KeyCode::Escape) => InputOutcome::Quit,
//         _ => InputOutcome::None,
//     });
// ```
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::fmt;

//=== Internal Dependencies ===============================================

use super::context::{Context, Event, FrameStage, SessionCallback};
use crate::core::CallbackTable;
use crate::display::DisplayConfig;
use crate::error::Result;
use crate::input::{InputCallback, InputConfig, InputEvent, InputEventKind, InputOutcome};

//=== SessionConfig =======================================================

pub struct SessionConfig<C> {
    pub(super) events: CallbackTable<Event, SessionCallback<C>>,
    pub(super) ticks: CallbackTable<FrameStage, SessionCallback<C>>,
    pub(super) draws: CallbackTable<FrameStage, SessionCallback<C>>,
    pub(super) input: InputConfig<C>,
    pub(super) display: DisplayConfig,
}

impl<C> SessionConfig<C> {
    /// Empty configuration with the default window.
    pub fn new() -> Self {
        Self {
            events: CallbackTable::new("event"),
            ticks: CallbackTable::new("tick"),
            draws: CallbackTable::new("draw"),
            input: CallbackTable::new("input"),
            display: DisplayConfig::default(),
        }
    }

    //--- Builder ----------------------------------------------------------

    /// Runs `callback` at lifecycle point `event`.
    pub fn on<F>(mut self, event: Event, callback: F) -> Self
    where
        F: FnMut(&mut C, &mut Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.events.set(event, Box::new(callback));
        self
    }

    /// Runs `callback` once per iteration, before pacing.
    pub fn on_tick<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut C, &mut Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.ticks.set(FrameStage::Tick, Box::new(callback));
        self
    }

    /// Runs `callback` once per iteration, after pacing.
    pub fn on_draw<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut C, &mut Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.draws.set(FrameStage::Draw, Box::new(callback));
        self
    }

    /// Routes events of `kind` to `callback`.
    pub fn on_input<F>(mut self, kind: InputEventKind, callback: F) -> Self
    where
        F: FnMut(&mut C, &InputEvent) -> InputOutcome + 'static,
    {
        self.input.set(kind, Box::new(callback));
        self
    }

    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    //--- Fallible Registration --------------------------------------------

    /// Registers an optional lifecycle callback; `None` is `InvalidArgument`.
    pub fn add_event(&mut self, event: Event, callback: Option<SessionCallback<C>>) -> Result<()> {
        self.events.add(event, callback)
    }

    /// Registers an optional input callback; `None` is `InvalidArgument`.
    pub fn add_input(&mut self, kind: InputEventKind, callback: Option<InputCallback<C>>) -> Result<()> {
        self.input.add(kind, callback)
    }

    //--- Queries ----------------------------------------------------------

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    pub fn has_event(&self, event: Event) -> bool {
        self.events.contains(event)
    }

    pub fn has_tick(&self) -> bool {
        self.ticks.contains(FrameStage::Tick)
    }

    pub fn has_draw(&self) -> bool {
        self.draws.contains(FrameStage::Draw)
    }

    pub fn input_kinds(&self) -> usize {
        self.input.size()
    }
}

impl<C> Default for SessionConfig<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for SessionConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("events", &self.events)
            .field("tick", &self.has_tick())
            .field("draw", &self.has_draw())
            .field("input", &self.input)
            .field("display", &self.display)
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;

    struct Host;

    #[test]
    fn new_config_is_empty() {
        let config = SessionConfig::<Host>::new();

        assert!(!config.has_tick());
        assert!(!config.has_draw());
        assert_eq!(config.input_kinds(), 0);
        assert_eq!(config.display(), &DisplayConfig::default());
    }

    #[test]
    fn builder_registers_callbacks() {
        let config = SessionConfig::<Host>::new()
            .on(Event::Setup, |_, _| Ok(()))
            .on(Event::Teardown, |_, _| Ok(()))
            .on_tick(|_, _| Ok(()))
            .on_draw(|_, _| Ok(()))
            .on_input(InputEventKind::KeyDown, |_, _| InputOutcome::None)
            .with_display(DisplayConfig::new("Configured"));

        assert!(config.has_event(Event::Setup));
        assert!(config.has_event(Event::Teardown));
        assert!(!config.has_event(Event::Start));
        assert!(config.has_tick() && config.has_draw());
        assert_eq!(config.input_kinds(), 1);
        assert_eq!(config.display().title, "Configured");
    }

    #[test]
    fn missing_callbacks_are_rejected() {
        let mut config = SessionConfig::<Host>::new();

        assert!(matches!(
            config.add_event(Event::Start, None),
            Err(RuntimeError::InvalidArgument { component: "event", .. })
        ));
        assert!(matches!(
            config.add_input(InputEventKind::KeyUp, None),
            Err(RuntimeError::InvalidArgument { component: "input", .. })
        ));
        assert!(!config.has_event(Event::Start));
        assert_eq!(config.input_kinds(), 0);
    }
}
