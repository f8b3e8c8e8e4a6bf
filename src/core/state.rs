//=========================================================================
// Component State
//=========================================================================
//
// Lifecycle state machine shared by every manager.
//
// ```text
//   Uninitialized ──initialize()──> Initialized ──start()──> Running
//         ^                            │   ^                    │
//         └────────uninitialize()──────┘   └──────stop()────────┘
// ```
//
// Only the display manager and the runtime facade ever enter `Running`;
// resource and input managers stay within the first two states.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::error::{Result, RuntimeError};

//=== Component ===========================================================

/// Uniform lifecycle surface used by the runtime to cascade
/// initialization and teardown across its sub-managers.
pub trait Component {
    /// Short label used in errors, logs and summaries.
    fn label(&self) -> &'static str;

    fn initialize(&mut self) -> Result<()>;

    fn uninitialize(&mut self) -> Result<()>;

    fn is_initialized(&self) -> bool;
}

//=== ComponentState ======================================================

/// Two independent flags forming the three-state component lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentState {
    label: &'static str,
    initialized: bool,
    running: bool,
}

impl ComponentState {
    //--- Construction -----------------------------------------------------

    pub const fn new(label: &'static str) -> Self {
        Self {
            label,
            initialized: false,
            running: false,
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Fails with `Uninitialized` unless `initialize` has been called.
    pub fn require_initialized(&self) -> Result<()> {
        if !self.initialized {
            return Err(RuntimeError::Uninitialized { component: self.label });
        }
        Ok(())
    }

    /// Fails with `AlreadyStarted` while running.
    pub fn require_stopped(&self) -> Result<()> {
        self.require_initialized()?;
        if self.running {
            return Err(RuntimeError::AlreadyStarted { component: self.label });
        }
        Ok(())
    }

    /// Fails with `AlreadyStopped` unless running.
    pub fn require_running(&self) -> Result<()> {
        self.require_initialized()?;
        if !self.running {
            return Err(RuntimeError::AlreadyStopped { component: self.label });
        }
        Ok(())
    }

    //--- Transitions ------------------------------------------------------

    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(RuntimeError::AlreadyInitialized { component: self.label });
        }
        self.initialized = true;
        Ok(())
    }

    /// Leaves the initialized state. Callers stop the component first.
    pub fn uninitialize(&mut self) -> Result<()> {
        self.require_initialized()?;
        self.initialized = false;
        self.running = false;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.require_stopped()?;
        self.running = true;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.require_running()?;
        self.running = false;
        Ok(())
    }

    /// Clears the running flag without validation.
    ///
    /// Used on unwind paths where the flag may already be down.
    pub(crate) fn force_stopped(&mut self) {
        self.running = false;
    }

    /// `INIT`/`UNINIT` tag used by the `Display` summaries.
    pub(crate) fn init_tag(&self) -> &'static str {
        if self.initialized { "INIT" } else { "UNINIT" }
    }

    /// `STARTED`/`STOPPED` tag used by the `Display` summaries.
    pub(crate) fn run_tag(&self) -> &'static str {
        if self.running { "STARTED" } else { "STOPPED" }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninitialized_and_stopped() {
        let state = ComponentState::new("test");
        assert!(!state.is_initialized());
        assert!(!state.is_running());
        assert_eq!(state.label(), "test");
    }

    #[test]
    fn full_cycle() {
        let mut state = ComponentState::new("test");

        state.initialize().unwrap();
        state.start().unwrap();
        assert!(state.is_running());

        state.stop().unwrap();
        assert!(state.is_initialized());
        assert!(!state.is_running());

        state.uninitialize().unwrap();
        assert!(!state.is_initialized());
    }

    #[test]
    fn double_initialize_fails() {
        let mut state = ComponentState::new("test");
        state.initialize().unwrap();

        let err = state.initialize().unwrap_err();
        assert!(matches!(err, RuntimeError::AlreadyInitialized { component: "test" }));
    }

    #[test]
    fn double_uninitialize_fails() {
        let mut state = ComponentState::new("test");
        state.initialize().unwrap();
        state.uninitialize().unwrap();

        let err = state.uninitialize().unwrap_err();
        assert!(matches!(err, RuntimeError::Uninitialized { .. }));
    }

    #[test]
    fn start_requires_initialize() {
        let mut state = ComponentState::new("test");
        assert!(matches!(state.start(), Err(RuntimeError::Uninitialized { .. })));
    }

    #[test]
    fn double_start_fails() {
        let mut state = ComponentState::new("test");
        state.initialize().unwrap();
        state.start().unwrap();

        assert!(matches!(state.start(), Err(RuntimeError::AlreadyStarted { .. })));
    }

    #[test]
    fn stop_when_stopped_fails() {
        let mut state = ComponentState::new("test");
        state.initialize().unwrap();

        assert!(matches!(state.stop(), Err(RuntimeError::AlreadyStopped { .. })));
    }

    #[test]
    fn tags_follow_state() {
        let mut state = ComponentState::new("test");
        assert_eq!((state.init_tag(), state.run_tag()), ("UNINIT", "STOPPED"));

        state.initialize().unwrap();
        state.start().unwrap();
        assert_eq!((state.init_tag(), state.run_tag()), ("INIT", "STARTED"));
    }
}
