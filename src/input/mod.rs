//=========================================================================
// Input Manager
//
// Routes platform events to host callbacks keyed by event kind.
//
// Dispatch is tolerant: an event whose kind has no registered handler
// yields `InputOutcome::Unsupported` instead of an error, since hosts are
// expected to handle only the events they care about.
//
//=========================================================================

//=== Submodules ==========================================================

mod event;

//=== Public Exports ======================================================

pub use event::{
    InputEvent, InputEventKind, InputOutcome, KeyCode, Modifiers, MouseButton, WindowChange,
};

//=== Standard Library Imports ============================================

use std::fmt;

//=== External Crates =====================================================

use log::{debug, trace};

//=== Internal Dependencies ===============================================

use crate::core::{CallbackTable, Component, ComponentState};
use crate::error::Result;

//=== Callback Types ======================================================

/// Host handler for one input kind.
pub type InputCallback<C> = Box<dyn FnMut(&mut C, &InputEvent) -> InputOutcome>;

/// Input callback table, keyed by event kind.
pub type InputConfig<C> = CallbackTable<InputEventKind, InputCallback<C>>;

const LABEL: &str = "input";

//=== InputManager ========================================================

pub struct InputManager<C> {
    state: ComponentState,
    table: InputConfig<C>,
}

impl<C> InputManager<C> {
    pub fn new() -> Self {
        Self {
            state: ComponentState::new(LABEL),
            table: CallbackTable::new(LABEL),
        }
    }

    //--- Configuration ----------------------------------------------------

    /// Registers (or replaces) the handler for `kind`.
    pub fn add(&mut self, kind: InputEventKind, callback: Option<InputCallback<C>>) -> Result<()> {
        self.state.require_initialized()?;
        self.table.add(kind, callback)
    }

    pub fn remove(&mut self, kind: InputEventKind) -> Result<()> {
        self.state.require_initialized()?;
        self.table.remove(kind).map(drop)
    }

    pub fn contains(&self, kind: InputEventKind) -> Result<bool> {
        self.state.require_initialized()?;
        Ok(self.table.contains(kind))
    }

    pub fn size(&self) -> Result<usize> {
        self.state.require_initialized()?;
        Ok(self.table.size())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.state.require_initialized()?;
        self.table.clear();
        Ok(())
    }

    /// Replaces the whole table with `config`.
    pub fn set(&mut self, config: InputConfig<C>) -> Result<()> {
        self.state.require_initialized()?;
        self.table.clear();
        self.table.extend(config);
        debug!(target: "input", "Input table set with {} handler(s)", self.table.size());
        Ok(())
    }

    //--- Dispatch ---------------------------------------------------------

    /// Dispatches `event` to the handler for its kind.
    pub fn handle(&mut self, host: &mut C, event: &InputEvent) -> Result<InputOutcome> {
        self.state.require_initialized()?;

        let kind = event.kind();
        let Some(callback) = self.table.get_mut(kind) else {
            trace!(target: "input", "No handler for {:?}", kind);
            return Ok(InputOutcome::Unsupported);
        };

        let outcome = callback(host, event);
        trace!(target: "input", "{:?} -> {:?}", kind, outcome);
        Ok(outcome)
    }
}

//--- Trait Implementations -----------------------------------------------

impl<C> Component for InputManager<C> {
    fn label(&self) -> &'static str {
        LABEL
    }

    fn initialize(&mut self) -> Result<()> {
        self.state.initialize()?;
        self.table.clear();
        Ok(())
    }

    fn uninitialize(&mut self) -> Result<()> {
        self.state.require_initialized()?;
        self.table.clear();
        self.state.uninitialize()
    }

    fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }
}

impl<C> Default for InputManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Display for InputManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(INPUT) ({})", self.state.init_tag())?;
        if self.state.is_initialized() {
            for kind in self.table.keys() {
                write!(f, "\n--- {:?}", kind)?;
            }
        }
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
