//=========================================================================
// Display Manager
//
// Owns the single window of a session.
//
// States:
// ```text
//   Uninitialized ──initialize──> Initialized ──start(config)──> Running
//                                      ^                            │
//                                      └──────────stop()────────────┘
// ```
//
// `start` stores the configuration and asks the platform for a window.
// A creation failure leaves the manager Initialized with no window.
// `stop` destroys the window and resets the stored configuration.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::fmt;

//=== External Crates =====================================================

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use crate::backend::{Platform, WindowHandle};
use crate::core::{Component, ComponentState};
use crate::error::{Result, RuntimeError};

const LABEL: &str = "display";

//=== DisplayFlags ========================================================

/// Window creation flags.
///
/// Combine with `|`; `NONE` is a plain decorated, visible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DisplayFlags(u32);

impl DisplayFlags {
    pub const NONE: Self = Self(0);
    pub const RESIZABLE: Self = Self(1 << 0);
    pub const HIDDEN: Self = Self(1 << 1);
    pub const FULLSCREEN: Self = Self(1 << 2);
    pub const BORDERLESS: Self = Self(1 << 3);
    pub const MAXIMIZED: Self = Self(1 << 4);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for DisplayFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for DisplayFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

//=== DisplayConfig =======================================================

/// Window parameters passed to [`Platform::create_window`].
///
/// Defaults:
/// - title: `"Untitled Window"`
/// - size: 640 × 480
/// - position: `None` (platform decides, usually centered)
/// - flags: `DisplayFlags::NONE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub position: Option<(i32, i32)>,
    pub flags: DisplayFlags,
}

impl DisplayConfig {
    pub const DEFAULT_TITLE: &'static str = "Untitled Window";
    pub const DEFAULT_WIDTH: u32 = 640;
    pub const DEFAULT_HEIGHT: u32 = 480;

    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the inner size in pixels.
    ///
    /// # Panics
    /// Panics if either dimension is zero.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "Display size must be positive");
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = Some((x, y));
        self
    }

    pub fn with_flags(mut self, flags: DisplayFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: Self::DEFAULT_TITLE.to_string(),
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            position: None,
            flags: DisplayFlags::NONE,
        }
    }
}

//=== DisplayManager ======================================================

pub struct DisplayManager {
    state: ComponentState,
    config: DisplayConfig,
    window: Option<WindowHandle>,
}

impl DisplayManager {
    pub fn new() -> Self {
        Self {
            state: ComponentState::new(LABEL),
            config: DisplayConfig::default(),
            window: None,
        }
    }

    //--- Configuration ----------------------------------------------------

    /// Stores `config` for the next `start`.
    pub fn set(&mut self, config: DisplayConfig) -> Result<()> {
        self.state.require_initialized()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Resets the stored configuration to defaults.
    pub fn clear(&mut self) -> Result<()> {
        self.state.require_initialized()?;
        self.config = DisplayConfig::default();
        Ok(())
    }

    //--- Lifecycle --------------------------------------------------------

    /// Creates the window described by `config`.
    pub fn start(&mut self, platform: &mut dyn Platform, config: DisplayConfig) -> Result<WindowHandle> {
        self.state.require_stopped()?;

        let window = platform
            .create_window(&config)
            .map_err(|diagnostic| RuntimeError::external(LABEL, "create_window", diagnostic))?;

        info!(
            target: "display",
            "{} created: \"{}\" {}x{}",
            window, config.title, config.width, config.height
        );

        self.config = config;
        self.window = Some(window);
        self.state.start()?;
        Ok(window)
    }

    /// Destroys the window and resets the stored configuration.
    pub fn stop(&mut self, platform: &mut dyn Platform) -> Result<()> {
        self.state.require_running()?;

        match self.window.take() {
            Some(window) => {
                platform.destroy_window(window);
                debug!(target: "display", "{} destroyed", window);
            }
            None => warn!(target: "display", "Running display had no window"),
        }

        self.config = DisplayConfig::default();
        self.state.stop()
    }

    //--- Queries ----------------------------------------------------------

    pub fn window(&self) -> Option<WindowHandle> {
        self.window
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Stops the display if running, then uninitializes.
    pub fn shutdown(&mut self, platform: &mut dyn Platform) -> Result<()> {
        if self.state.is_running() {
            self.stop(platform)?;
        }
        self.uninitialize()
    }
}

//--- Trait Implementations -----------------------------------------------

impl Component for DisplayManager {
    fn label(&self) -> &'static str {
        LABEL
    }

    fn initialize(&mut self) -> Result<()> {
        self.state.initialize()?;
        self.config = DisplayConfig::default();
        self.window = None;
        Ok(())
    }

    /// Windows still open are dropped from bookkeeping; use
    /// [`DisplayManager::shutdown`] to destroy them through the platform.
    fn uninitialize(&mut self) -> Result<()> {
        self.state.require_initialized()?;
        if let Some(window) = self.window.take() {
            warn!(target: "display", "{} abandoned on uninitialize", window);
        }
        self.config = DisplayConfig::default();
        self.state.uninitialize()
    }

    fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DisplayManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(DISPLAY) ({}, {})", self.state.init_tag(), self.state.run_tag())?;
        if let Some(window) = self.window {
            let position = match self.config.position {
                Some((x, y)) => format!("{}, {}", x, y),
                None => "default".to_string(),
            };
            write!(
                f,
                "\n--- {}, \"{}\", {}x{} @ {}, flags 0x{:x}",
                window,
                self.config.title,
                self.config.width,
                self.config.height,
                position,
                self.config.flags.bits()
            )?;
        }
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessPlatform;

    //--- Test Helpers -----------------------------------------------------

    fn setup() -> (HeadlessPlatform, DisplayManager) {
        let (platform, _events) = HeadlessPlatform::new();
        let mut display = DisplayManager::new();
        display.initialize().unwrap();
        (platform, display)
    }

    //=====================================================================
    // Config Tests
    //=====================================================================

    #[test]
    fn config_defaults() {
        let config = DisplayConfig::default();
        assert_eq!(config.title, "Untitled Window");
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.position, None);
        assert!(config.flags.is_empty());
    }

    #[test]
    fn config_builder() {
        let config = DisplayConfig::new("Demo")
            .with_size(800, 600)
            .with_position(10, 20)
            .with_flags(DisplayFlags::RESIZABLE | DisplayFlags::HIDDEN);

        assert_eq!(config.title, "Demo");
        assert_eq!(config.position, Some((10, 20)));
        assert!(config.flags.contains(DisplayFlags::HIDDEN));
        assert!(!config.flags.contains(DisplayFlags::FULLSCREEN));
    }

    #[test]
    #[should_panic(expected = "Display size must be positive")]
    fn config_rejects_zero_size() {
        let _ = DisplayConfig::default().with_size(0, 480);
    }

    //=====================================================================
    // Lifecycle Tests
    //=====================================================================

    #[test]
    fn start_creates_window() {
        let (mut platform, mut display) = setup();

        let window = display.start(&mut platform, DisplayConfig::new("Test")).unwrap();

        assert!(display.is_running());
        assert_eq!(display.window(), Some(window));
        assert_eq!(display.config().title, "Test");
        assert!(platform.is_window_open(window));
    }

    #[test]
    fn start_twice_fails() {
        let (mut platform, mut display) = setup();
        display.start(&mut platform, DisplayConfig::default()).unwrap();

        let err = display.start(&mut platform, DisplayConfig::default()).unwrap_err();
        assert!(matches!(err, RuntimeError::AlreadyStarted { component: "display" }));
    }

    #[test]
    fn failed_creation_stays_initialized() {
        let (mut platform, mut display) = setup();
        platform.fail_window_creation("no surface");

        let err = display.start(&mut platform, DisplayConfig::default()).unwrap_err();

        assert!(matches!(err, RuntimeError::External { operation: "create_window", .. }));
        assert!(display.is_initialized());
        assert!(!display.is_running());
        assert_eq!(display.window(), None);
    }

    #[test]
    fn stop_destroys_window_and_resets_config() {
        let (mut platform, mut display) = setup();
        let window = display.start(&mut platform, DisplayConfig::new("Test")).unwrap();

        display.stop(&mut platform).unwrap();

        assert!(!display.is_running());
        assert!(!platform.is_window_open(window));
        assert_eq!(display.config(), &DisplayConfig::default());
    }

    #[test]
    fn stop_when_stopped_fails() {
        let (mut platform, mut display) = setup();
        assert!(matches!(
            display.stop(&mut platform),
            Err(RuntimeError::AlreadyStopped { .. })
        ));
    }

    #[test]
    fn shutdown_stops_first() {
        let (mut platform, mut display) = setup();
        let window = display.start(&mut platform, DisplayConfig::default()).unwrap();

        display.shutdown(&mut platform).unwrap();

        assert!(!display.is_initialized());
        assert!(!platform.is_window_open(window));
    }

    #[test]
    fn display_summary_shows_window() {
        let (mut platform, mut display) = setup();
        display.start(&mut platform, DisplayConfig::new("Summary")).unwrap();

        let summary = display.to_string();
        assert!(summary.starts_with("(DISPLAY) (INIT, STARTED)"));
        assert!(summary.contains("\"Summary\", 640x480 @ default"));
    }
}
