//=========================================================================
// Resource Registry
//=========================================================================
//
// Reference-counted map from external GPU handles to metadata.
//
// Architecture:
// ```text
//   Manager::add()                 Registry<K>
//     │  external create ──ok──>     insert(handle, meta)   refs = 1
//     │                              increment_reference()  refs + 1
//     │                              decrement_reference()  refs - 1
//     │                                └─ at 1: K::destroy + erase
//     │                              remove()               destroy + erase
//     └──────────────────────────    clear()                destroy all
// ```
//
// Invariants:
// - A handle present in the registry denotes a live external object.
// - Every erase is paired with exactly one external destroy.
// - Reference counts never reach zero while an entry survives.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

//=== External Crates =====================================================

use log::{debug, trace, warn};

//=== Internal Dependencies ===============================================

use crate::backend::{GraphicsBackend, Handle};
use crate::error::{Result, RuntimeError};
use super::state::ComponentState;

//=== ResourceKind ========================================================

/// Describes one family of external objects tracked by a [`Registry`].
pub trait ResourceKind {
    /// Per-entry metadata (shader stage, constituent shaders, counts).
    type Meta: fmt::Debug;

    /// Label used in errors and log targets (e.g. `"shader"`).
    const LABEL: &'static str;

    /// Human readable entry name for `NotFound` errors.
    const ENTRY: &'static str;

    /// Releases the external object behind `handle`.
    fn destroy(gpu: &dyn GraphicsBackend, handle: Handle, meta: &Self::Meta);
}

/// Reference count assigned on creation.
pub const REFERENCE_INIT: usize = 1;

//=== Entry ===============================================================

#[derive(Debug)]
struct Entry<M> {
    meta: M,
    references: usize,
}

//=== Release =============================================================

/// Result of [`Registry::decrement_reference`].
#[derive(Debug, PartialEq, Eq)]
pub enum Release<M> {
    /// Entry survives with the given reference count.
    Retained(usize),

    /// Count was at its floor: the object was destroyed and erased.
    Destroyed(M),
}

impl<M> Release<M> {
    /// Remaining count, zero once destroyed.
    pub fn count(&self) -> usize {
        match self {
            Self::Retained(count) => *count,
            Self::Destroyed(_) => 0,
        }
    }
}

//=== Registry ============================================================

/// Handle → (metadata, reference count) map coupled to external destroy.
pub struct Registry<K: ResourceKind> {
    state: ComponentState,
    entries: BTreeMap<Handle, Entry<K::Meta>>,
    gpu: Rc<dyn GraphicsBackend>,
}

impl<K: ResourceKind> Registry<K> {
    //--- Construction -----------------------------------------------------

    pub fn new(gpu: Rc<dyn GraphicsBackend>) -> Self {
        Self {
            state: ComponentState::new(K::LABEL),
            entries: BTreeMap::new(),
            gpu,
        }
    }

    /// Backend used to create and destroy entries.
    pub fn gpu(&self) -> &dyn GraphicsBackend {
        self.gpu.as_ref()
    }

    //--- Lifecycle --------------------------------------------------------

    pub fn initialize(&mut self) -> Result<()> {
        self.state.initialize()?;
        self.clear()?;
        Ok(())
    }

    pub fn uninitialize(&mut self) -> Result<Vec<K::Meta>> {
        let released = self.clear()?;
        self.state.uninitialize()?;
        Ok(released)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }

    pub fn require_initialized(&self) -> Result<()> {
        self.state.require_initialized()
    }

    //--- Mutation ---------------------------------------------------------

    /// Registers a freshly created external object with one reference.
    ///
    /// The backend only reissues a handle once its object is gone, so an
    /// entry still stored under `handle` is stale. It is dropped without
    /// an external destroy and reported.
    pub fn insert(&mut self, handle: Handle, meta: K::Meta) -> Result<Handle> {
        self.state.require_initialized()?;

        debug!(target: "resource", "{} 0x{:x} registered: {:?}", K::ENTRY, handle, meta);
        let entry = Entry { meta, references: REFERENCE_INIT };
        if let Some(stale) = self.entries.insert(handle, entry) {
            warn!(
                target: "resource",
                "{} 0x{:x} reissued while tracked; dropping stale entry {:?} (REF. {})",
                K::ENTRY, handle, stale.meta, stale.references
            );
        }
        Ok(handle)
    }

    pub fn increment_reference(&mut self, handle: Handle) -> Result<usize> {
        self.state.require_initialized()?;

        let entry = self.find_mut(handle)?;
        entry.references += 1;
        trace!(target: "resource", "{} 0x{:x} ref -> {}", K::ENTRY, handle, entry.references);
        Ok(entry.references)
    }

    /// Drops one reference; at the initial count the object is destroyed.
    pub fn decrement_reference(&mut self, handle: Handle) -> Result<Release<K::Meta>> {
        self.state.require_initialized()?;

        let entry = self.find_mut(handle)?;
        if entry.references > REFERENCE_INIT {
            entry.references -= 1;
            trace!(target: "resource", "{} 0x{:x} ref -> {}", K::ENTRY, handle, entry.references);
            return Ok(Release::Retained(entry.references));
        }

        Ok(Release::Destroyed(self.destroy_entry(handle)?))
    }

    /// Destroys the object regardless of outstanding references.
    pub fn remove(&mut self, handle: Handle) -> Result<K::Meta> {
        self.state.require_initialized()?;
        self.destroy_entry(handle)
    }

    /// Destroys every tracked object and empties the registry.
    pub fn clear(&mut self) -> Result<Vec<K::Meta>> {
        self.state.require_initialized()?;

        let entries = std::mem::take(&mut self.entries);
        if !entries.is_empty() {
            debug!(target: "resource", "Clearing {} {} object(s)", entries.len(), K::LABEL);
        }

        Ok(entries
            .into_iter()
            .map(|(handle, entry)| {
                K::destroy(self.gpu.as_ref(), handle, &entry.meta);
                entry.meta
            })
            .collect())
    }

    //--- Queries ----------------------------------------------------------

    pub fn contains(&self, handle: Handle) -> Result<bool> {
        self.state.require_initialized()?;
        Ok(self.entries.contains_key(&handle))
    }

    pub fn size(&self) -> Result<usize> {
        self.state.require_initialized()?;
        Ok(self.entries.len())
    }

    pub fn reference_count(&self, handle: Handle) -> Result<usize> {
        self.state.require_initialized()?;
        Ok(self.find(handle)?.references)
    }

    pub fn metadata(&self, handle: Handle) -> Result<&K::Meta> {
        self.state.require_initialized()?;
        Ok(&self.find(handle)?.meta)
    }

    /// Tracked handles in ascending order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.keys().copied()
    }

    /// Every entry's metadata, for edits that keep the entry alive.
    pub fn metadata_mut(&mut self) -> impl Iterator<Item = (Handle, &mut K::Meta)> + '_ {
        self.entries.iter_mut().map(|(handle, entry)| (*handle, &mut entry.meta))
    }

    //--- Internal Helpers -------------------------------------------------

    fn find(&self, handle: Handle) -> Result<&Entry<K::Meta>> {
        self.entries.get(&handle).ok_or_else(|| Self::missing(handle))
    }

    fn find_mut(&mut self, handle: Handle) -> Result<&mut Entry<K::Meta>> {
        self.entries.get_mut(&handle).ok_or_else(|| Self::missing(handle))
    }

    fn destroy_entry(&mut self, handle: Handle) -> Result<K::Meta> {
        let entry = self.entries.remove(&handle).ok_or_else(|| Self::missing(handle))?;
        K::destroy(self.gpu.as_ref(), handle, &entry.meta);
        debug!(target: "resource", "{} 0x{:x} destroyed", K::ENTRY, handle);
        Ok(entry.meta)
    }

    fn missing(handle: Handle) -> RuntimeError {
        RuntimeError::not_found(K::LABEL, format!("{} 0x{:x}", K::ENTRY, handle))
    }
}

//--- Trait Implementations -----------------------------------------------

impl<K: ResourceKind> fmt::Display for Registry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) ({})", K::LABEL.to_uppercase(), self.state.init_tag())?;
        if self.state.is_initialized() {
            for (handle, entry) in &self.entries {
                write!(f, "\n--- 0x{:08x}, {:?}, REF. {}", handle, entry.meta, entry.references)?;
            }
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
    use crate::backend::{BufferTarget, GpuObjectKind, HeadlessGraphics};

    //--- Test Helpers -----------------------------------------------------

    /// Buffer objects are the simplest kind to drive through the registry.
    struct TestBuffer;

    impl ResourceKind for TestBuffer {
        type Meta = usize;
        const LABEL: &'static str = "test";
        const ENTRY: &'static str = "Buffer";

        fn destroy(gpu: &dyn GraphicsBackend, handle: Handle, meta: &usize) {
            gpu.destroy_buffer(handle, *meta);
        }
    }

    fn setup() -> (Rc<HeadlessGraphics>, Registry<TestBuffer>) {
        let gpu = Rc::new(HeadlessGraphics::new());
        let mut registry = Registry::<TestBuffer>::new(gpu.clone());
        registry.initialize().unwrap();
        (gpu, registry)
    }

    fn create(gpu: &HeadlessGraphics, registry: &mut Registry<TestBuffer>) -> Handle {
        let handle = gpu.allocate_buffer(BufferTarget::Array, 1).unwrap();
        registry.insert(handle, 1).unwrap()
    }

    //=====================================================================
    // Lifecycle Tests
    //=====================================================================

    #[test]
    fn operations_require_initialize() {
        let gpu = Rc::new(HeadlessGraphics::new());
        let mut registry = Registry::<TestBuffer>::new(gpu);

        assert!(matches!(registry.size(), Err(RuntimeError::Uninitialized { .. })));
        assert!(matches!(registry.contains(1), Err(RuntimeError::Uninitialized { .. })));
        assert!(matches!(registry.insert(1, 1), Err(RuntimeError::Uninitialized { .. })));
        assert!(matches!(registry.clear(), Err(RuntimeError::Uninitialized { .. })));
    }

    #[test]
    fn double_initialize_fails() {
        let (_gpu, mut registry) = setup();
        assert!(matches!(
            registry.initialize(),
            Err(RuntimeError::AlreadyInitialized { component: "test" })
        ));
    }

    #[test]
    fn uninitialize_destroys_everything_once() {
        let (gpu, mut registry) = setup();
        let a = create(&gpu, &mut registry);
        let b = create(&gpu, &mut registry);

        registry.uninitialize().unwrap();

        assert_eq!(gpu.destroy_count(a), 1);
        assert_eq!(gpu.destroy_count(b), 1);
        assert!(matches!(registry.uninitialize(), Err(RuntimeError::Uninitialized { .. })));
    }

    //=====================================================================
    // Reference Counting Tests
    //=====================================================================

    #[test]
    fn insert_grows_size_by_one() {
        let (gpu, mut registry) = setup();
        let before = registry.size().unwrap();

        let handle = create(&gpu, &mut registry);

        assert!(registry.contains(handle).unwrap());
        assert_eq!(registry.size().unwrap(), before + 1);
        assert_eq!(registry.reference_count(handle).unwrap(), REFERENCE_INIT);
    }

    #[test]
    fn increment_then_decrement_round_trips() {
        let (gpu, mut registry) = setup();
        let handle = create(&gpu, &mut registry);

        assert_eq!(registry.increment_reference(handle).unwrap(), 2);
        assert_eq!(registry.decrement_reference(handle).unwrap(), Release::Retained(1));

        assert!(registry.contains(handle).unwrap());
        assert_eq!(registry.reference_count(handle).unwrap(), 1);
        assert_eq!(gpu.destroy_count(handle), 0);
    }

    #[test]
    fn decrement_at_initial_count_destroys_once() {
        let (gpu, mut registry) = setup();
        let handle = create(&gpu, &mut registry);

        let release = registry.decrement_reference(handle).unwrap();

        assert_eq!(release, Release::Destroyed(1));
        assert_eq!(release.count(), 0);
        assert!(!registry.contains(handle).unwrap());
        assert_eq!(gpu.destroy_count(handle), 1);

        // A second decrement finds nothing and destroys nothing.
        assert!(matches!(
            registry.decrement_reference(handle),
            Err(RuntimeError::NotFound { .. })
        ));
        assert_eq!(gpu.destroy_count(handle), 1);
    }

    #[test]
    fn unknown_handles_are_not_found() {
        let (_gpu, mut registry) = setup();

        assert!(matches!(registry.increment_reference(42), Err(RuntimeError::NotFound { .. })));
        assert!(matches!(registry.remove(42), Err(RuntimeError::NotFound { .. })));
        assert!(matches!(registry.reference_count(42), Err(RuntimeError::NotFound { .. })));
    }

    #[test]
    fn remove_ignores_outstanding_references() {
        let (gpu, mut registry) = setup();
        let handle = create(&gpu, &mut registry);
        registry.increment_reference(handle).unwrap();
        registry.increment_reference(handle).unwrap();

        registry.remove(handle).unwrap();

        assert!(!registry.contains(handle).unwrap());
        assert_eq!(gpu.destroy_count(handle), 1);
    }

    #[test]
    fn clear_empties_and_destroys() {
        let (gpu, mut registry) = setup();
        let handles: Vec<_> = (0..3).map(|_| create(&gpu, &mut registry)).collect();

        let released = registry.clear().unwrap();

        assert_eq!(released.len(), 3);
        assert_eq!(registry.size().unwrap(), 0);
        assert!(handles.iter().all(|h| gpu.destroy_count(*h) == 1));
        assert_eq!(gpu.live_count(GpuObjectKind::Buffer), 0);
    }

    #[test]
    fn reissued_handle_replaces_stale_entry() {
        let (gpu, mut registry) = setup();
        let handle = create(&gpu, &mut registry);
        registry.increment_reference(handle).unwrap();

        registry.insert(handle, 4).unwrap();

        assert_eq!(registry.size().unwrap(), 1);
        assert_eq!(registry.reference_count(handle).unwrap(), REFERENCE_INIT);
        assert_eq!(registry.metadata(handle).unwrap(), &4);
        assert_eq!(gpu.destroy_count(handle), 0);
    }

    #[test]
    fn metadata_edits_keep_entries() {
        let (gpu, mut registry) = setup();
        let a = create(&gpu, &mut registry);
        let b = create(&gpu, &mut registry);

        for (handle, meta) in registry.metadata_mut() {
            *meta = handle as usize * 10;
        }

        assert_eq!(registry.metadata(a).unwrap(), &(a as usize * 10));
        assert_eq!(registry.metadata(b).unwrap(), &(b as usize * 10));
        assert_eq!(registry.size().unwrap(), 2);
    }

    #[test]
    fn display_lists_entries() {
        let (gpu, mut registry) = setup();
        let handle = create(&gpu, &mut registry);

        let summary = registry.to_string();
        assert!(summary.starts_with("(TEST) (INIT)"));
        assert!(summary.contains(&format!("0x{:08x}", handle)));
        assert!(summary.contains("REF. 1"));
    }
}
