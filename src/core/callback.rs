//=========================================================================
// Callback Table
//=========================================================================
//
// Keyed storage for host callbacks.
//
// The runtime keeps four of these: lifecycle events, the tick stage, the
// draw stage and input kinds. Each table is generic over its key and the
// boxed handler type so every instance shares one add/remove/invoke
// contract:
//
// - `add` rejects a missing handler and overwrites existing keys
// - `invoke_with` on an absent key is a silent no-op
// - a handler error surfaces as `EventFailure` annotated with the key
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::collections::BTreeMap;
use std::fmt;

//=== External Crates =====================================================

use log::trace;

//=== Internal Dependencies ===============================================

use crate::error::{Result, RuntimeError};

//=== CallbackTable =======================================================

/// Map from event key to handler.
pub struct CallbackTable<K, H> {
    label: &'static str,
    handlers: BTreeMap<K, H>,
}

impl<K, H> CallbackTable<K, H>
where
    K: Ord + Copy + fmt::Debug,
{
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            handlers: BTreeMap::new(),
        }
    }

    //--- Mutation ---------------------------------------------------------

    /// Inserts or overwrites the handler for `key`.
    ///
    /// `None` is rejected with `InvalidArgument` and leaves the table
    /// unchanged.
    pub fn add(&mut self, key: K, handler: Option<H>) -> Result<()> {
        let Some(handler) = handler else {
            return Err(RuntimeError::invalid(
                self.label,
                format!("missing callback for {:?}", key),
            ));
        };

        self.set(key, handler);
        Ok(())
    }

    /// Infallible form of [`CallbackTable::add`].
    pub fn set(&mut self, key: K, handler: H) {
        if self.handlers.insert(key, handler).is_some() {
            trace!(target: "runtime", "({}) Replaced callback for {:?}", self.label, key);
        }
    }

    pub fn remove(&mut self, key: K) -> Result<H> {
        self.handlers
            .remove(&key)
            .ok_or_else(|| RuntimeError::not_found(self.label, format!("Callback {:?}", key)))
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Moves every handler of `other` into this table, overwriting keys.
    pub fn extend(&mut self, other: CallbackTable<K, H>) {
        self.handlers.extend(other.handlers);
    }

    //--- Queries ----------------------------------------------------------

    pub fn contains(&self, key: K) -> bool {
        self.handlers.contains_key(&key)
    }

    pub fn size(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut H> {
        self.handlers.get_mut(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.handlers.keys().copied()
    }

    //--- Dispatch ---------------------------------------------------------

    /// Runs the handler registered for `key` through `call`.
    ///
    /// Returns `Ok(false)` when nothing is registered. A failing handler is
    /// wrapped into `EventFailure` with the key as event name.
    pub fn invoke_with<F>(&mut self, key: K, call: F) -> Result<bool>
    where
        F: FnOnce(&mut H) -> anyhow::Result<()>,
    {
        let Some(handler) = self.handlers.get_mut(&key) else {
            return Ok(false);
        };

        call(handler).map_err(|source| RuntimeError::EventFailure {
            component: self.label,
            event: format!("{:?}", key),
            source,
        })?;
        Ok(true)
    }
}

//--- Trait Implementations -----------------------------------------------

impl<K: fmt::Debug, H> fmt::Display for CallbackTable<K, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {} callback(s)", self.label, self.handlers.len())?;
        for key in self.handlers.keys() {
            write!(f, "\n--- {:?}", key)?;
        }
        Ok(())
    }
}

impl<K, H> fmt::Debug for CallbackTable<K, H>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTable")
            .field("label", &self.label)
            .field("keys", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type Handler = Box<dyn FnMut(&mut Vec<u8>) -> anyhow::Result<()>>;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Key {
        Alpha,
        Beta,
    }

    fn push(value: u8) -> Handler {
        Box::new(move |log: &mut Vec<u8>| -> anyhow::Result<()> {
            log.push(value);
            Ok(())
        })
    }

    fn table() -> CallbackTable<Key, Handler> {
        CallbackTable::new("test")
    }

    //=====================================================================
    // Registration Tests
    //=====================================================================

    #[test]
    fn add_missing_handler_is_invalid() {
        let mut table = table();
        table.add(Key::Alpha, Some(push(1))).unwrap();

        let err = table.add(Key::Beta, None).unwrap_err();

        assert!(matches!(err, RuntimeError::InvalidArgument { component: "test", .. }));
        assert_eq!(table.size(), 1);
        assert!(!table.contains(Key::Beta));
    }

    #[test]
    fn add_overwrites_existing_key() {
        let mut table = table();
        let mut log = Vec::new();

        table.add(Key::Alpha, Some(push(1))).unwrap();
        table.add(Key::Alpha, Some(push(2))).unwrap();
        table.invoke_with(Key::Alpha, |h| h(&mut log)).unwrap();

        assert_eq!(table.size(), 1);
        assert_eq!(log, vec![2]);
    }

    #[test]
    fn remove_absent_key_is_not_found() {
        let mut table = table();
        assert!(matches!(table.remove(Key::Alpha), Err(RuntimeError::NotFound { .. })));
    }

    #[test]
    fn clear_does_not_invoke() {
        let mut table = table();
        let mut log = Vec::new();
        table.set(Key::Alpha, push(1));
        table.set(Key::Beta, push(2));

        table.clear();

        assert!(table.is_empty());
        assert!(!table.invoke_with(Key::Alpha, |h| h(&mut log)).unwrap());
        assert!(log.is_empty());
    }

    #[test]
    fn extend_merges_and_overwrites() {
        let mut table = table();
        table.set(Key::Alpha, push(1));

        let mut other = CallbackTable::new("other");
        other.set(Key::Alpha, push(3));
        other.set(Key::Beta, push(4));
        table.extend(other);

        let mut log = Vec::new();
        table.invoke_with(Key::Alpha, |h| h(&mut log)).unwrap();
        assert_eq!(table.keys().collect::<Vec<_>>(), vec![Key::Alpha, Key::Beta]);
        assert_eq!(log, vec![3]);
    }

    //=====================================================================
    // Dispatch Tests
    //=====================================================================

    #[test]
    fn invoke_absent_key_is_noop() {
        let mut table = table();
        let mut called = false;

        let invoked = table
            .invoke_with(Key::Alpha, |_| {
                called = true;
                Ok(())
            })
            .unwrap();

        assert!(!invoked);
        assert!(!called);
    }

    #[test]
    fn invoke_failure_names_the_key() {
        let mut table = table();
        table.set(Key::Beta, Box::new(|_: &mut Vec<u8>| -> anyhow::Result<()> {
            anyhow::bail!("boom")
        }));

        let err = table.invoke_with(Key::Beta, |h| h(&mut Vec::new())).unwrap_err();

        match err {
            RuntimeError::EventFailure { event, source, .. } => {
                assert_eq!(event, "Beta");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn display_lists_keys() {
        let mut table = table();
        table.set(Key::Alpha, push(1));

        let summary = table.to_string();
        assert!(summary.starts_with("(test) 1 callback(s)"));
        assert!(summary.contains("--- Alpha"));
    }
}
