// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named callback registry.
//!
//! Callbacks are stored behind [`Rc`] so a dispatch can hold its own handle
//! and run after the session borrow has been released. Every registration
//! gets a fresh [`RegistrationToken`]; removing by token only removes that
//! exact registration, so a stale disposer cannot remove a newer callback
//! registered under the same name.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;
use core::fmt;

use crate::error::RegistrationError;

/// Argument passed to a visibility callback.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityEvent<E> {
    /// The element that changed.
    pub target: E,
    /// The callback name the element carries.
    pub name: String,
    /// Whether the element became visible (`true`) or hidden (`false`).
    pub visible: bool,
}

/// A shared visibility callback returning `R`.
pub type Callback<E, R> = Rc<dyn Fn(&VisibilityEvent<E>) -> R>;

/// Wraps `callback` so its body runs at most once.
///
/// Later calls return a clone of the first result. A call made while the
/// first call is still running (re-entrancy) returns `R::default()`.
pub fn once<E: 'static, R: Clone + Default + 'static>(callback: Callback<E, R>) -> Callback<E, R> {
    let pending = RefCell::new(Some(callback));
    let result: RefCell<Option<R>> = RefCell::new(None);
    Rc::new(move |event: &VisibilityEvent<E>| {
        let first = pending.borrow_mut().take();
        if let Some(callback) = first {
            let value = callback(event);
            *result.borrow_mut() = Some(value.clone());
            return value;
        }
        result.borrow().clone().unwrap_or_default()
    })
}

/// Identifies one registration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegistrationToken {
    name: String,
    id: u64,
}

impl RegistrationToken {
    /// Returns the registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

struct Entry<E, R> {
    id: u64,
    callback: Callback<E, R>,
}

/// Mapping from callback name to the active callback.
pub struct CallbackRegistry<E, R> {
    entries: BTreeMap<String, Entry<E, R>>,
    next_id: u64,
}

impl<E, R> Default for CallbackRegistry<E, R> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<E, R> fmt::Debug for CallbackRegistry<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("len", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<E: 'static, R: Clone + Default + 'static> CallbackRegistry<E, R> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` under `name`, replacing any previous entry.
    ///
    /// With `once`, the callback is wrapped by [`once`](fn@once).
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EmptyName`] if `name` is empty.
    pub fn register(
        &mut self,
        name: &str,
        callback: Callback<E, R>,
        once: bool,
    ) -> Result<RegistrationToken, RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        let callback = if once { self::once(callback) } else { callback };
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(name.into(), Entry { id, callback });
        Ok(RegistrationToken {
            name: name.into(),
            id,
        })
    }
}

impl<E, R> CallbackRegistry<E, R> {
    /// Removes the registration identified by `token`.
    ///
    /// Returns `false` if that registration is already gone or was replaced.
    pub fn remove(&mut self, token: &RegistrationToken) -> bool {
        if !self.holds(token) {
            return false;
        }
        self.entries.remove(&token.name);
        true
    }

    /// Returns the callback registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Callback<E, R>> {
        self.entries.get(name).map(|entry| Rc::clone(&entry.callback))
    }

    /// Returns the active registration under `name` along with its callback.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(RegistrationToken, Callback<E, R>)> {
        self.entries.get_key_value(name).map(|(key, entry)| {
            let token = RegistrationToken {
                name: key.clone(),
                id: entry.id,
            };
            (token, Rc::clone(&entry.callback))
        })
    }

    /// Returns `true` while the registration identified by `token` is the
    /// active one for its name.
    #[must_use]
    pub fn holds(&self, token: &RegistrationToken) -> bool {
        self.entries
            .get(&token.name)
            .is_some_and(|entry| entry.id == token.id)
    }

    /// Returns `true` if a callback is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every registration.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::cell::Cell;

    fn event(visible: bool) -> VisibilityEvent<u32> {
        VisibilityEvent {
            target: 7,
            name: "x".into(),
            visible,
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut registry = CallbackRegistry::<u32, ()>::new();
        let err = registry
            .register("", Rc::new(|_: &VisibilityEvent<u32>| {}), false)
            .unwrap_err();
        assert_eq!(err, RegistrationError::EmptyName);
        assert!(registry.is_empty());
    }

    #[test]
    fn once_runs_body_a_single_time() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&calls);
        let callback: Callback<u32, u32> = Rc::new(move |_: &VisibilityEvent<u32>| {
            counter.set(counter.get() + 1);
            counter.get() * 10
        });
        let guarded = once(callback);

        assert_eq!(guarded(&event(true)), 10);
        assert_eq!(guarded(&event(false)), 10);
        assert_eq!(guarded(&event(true)), 10);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn registry_wraps_with_once_when_asked() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let mut registry = CallbackRegistry::<u32, ()>::new();
        registry
            .register(
                "x",
                Rc::new(move |e: &VisibilityEvent<u32>| log.borrow_mut().push(e.visible)),
                true,
            )
            .unwrap();

        let callback = registry.get("x").unwrap();
        callback(&event(true));
        callback(&event(false));
        assert_eq!(*seen.borrow(), [true]);
    }

    #[test]
    fn stale_token_does_not_remove_newer_registration() {
        let mut registry = CallbackRegistry::<u32, ()>::new();
        let noop = || -> Callback<u32, ()> { Rc::new(|_: &VisibilityEvent<u32>| {}) };
        let old = registry.register("x", noop(), false).unwrap();
        let new = registry.register("x", noop(), false).unwrap();

        assert!(!registry.remove(&old));
        assert!(registry.contains("x"));
        assert!(registry.remove(&new));
        assert!(!registry.contains("x"));
        assert!(!registry.remove(&new));
    }

    #[test]
    fn lookup_token_tracks_the_active_registration() {
        let mut registry = CallbackRegistry::<u32, ()>::new();
        let noop = || -> Callback<u32, ()> { Rc::new(|_: &VisibilityEvent<u32>| {}) };
        let first = registry.register("x", noop(), false).unwrap();

        let (token, _) = registry.lookup("x").unwrap();
        assert_eq!(token, first);
        assert!(registry.holds(&token));

        registry.register("x", noop(), false).unwrap();
        assert!(!registry.holds(&token));
        registry.clear();
        assert!(registry.lookup("x").is_none());
    }
}
