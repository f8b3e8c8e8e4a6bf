//=========================================================================
// Luna Runtime - Library Root
//
// Single-session real-time runtime: one window, input dispatch, a
// fixed-cadence tick loop and reference-counted GPU resources.
//
// Responsibilities:
// - Expose the session facade (`Runtime`, `RuntimeBuilder`, `SessionConfig`)
// - Expose the managers a host touches from its callbacks
// - Keep external collaborators behind the `backend` traits
//
// Typical usage:
// ```no_run
// use luna_runtime::prelude::*;
//
// let (platform, events) = HeadlessPlatform::new();
// let mut runtime = RuntimeBuilder::new().with_platform(platform).build::<u64>();
// runtime.initialize()?;
//
// let mut frames = 0u64;
// events.close();
// runtime.start(&mut frames, SessionConfig::<u64>::new().on_tick(|frames, _| {
//     *frames += 1;
//     Ok(())
// }))?;
// runtime.uninitialize()?;
// # Ok::<(), RuntimeError>(())
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the shared lifecycle, registry and callback-table pieces
// every manager is built from. `backend` defines the platform and
// graphics seams plus the winit, glow and headless implementations.
//
pub mod backend;
pub mod core;
pub mod display;
pub mod error;
pub mod input;
pub mod logging;
pub mod prelude;
pub mod resource;
pub mod runtime;

//--- Public Exports ------------------------------------------------------

pub use error::{Result, RuntimeError};
pub use runtime::{Runtime, RuntimeBuilder, SessionConfig, VERSION};
