//=========================================================================
// Core Building Blocks
//
// Shared machinery every runtime component is assembled from.
//
// Architecture:
// ```text
//   ComponentState   initialized/running flags + Component trait
//        │
//        ├── Registry<K>        handle → (meta, refcount), external destroy
//        │     used by: shader, program, vertex buffer, vertex array
//        │
//        └── CallbackTable<K,H> key → handler, tolerant or fatal invoke
//              used by: lifecycle events, tick, draw, input kinds
// ```
//
//=========================================================================

//=== Submodules ==========================================================

mod callback;
mod registry;
mod state;

//=== Public Exports ======================================================

pub use callback::CallbackTable;
pub use registry::{Registry, Release, ResourceKind, REFERENCE_INIT};
pub use state::{Component, ComponentState};
