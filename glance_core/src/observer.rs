// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared handle over a [`Session`].
//!
//! An [`Observer`] is a cheap, clonable handle. The batch handler it installs
//! on the host only holds a weak reference, so dropping every `Observer`
//! clone ends the session even while a subscription is still alive.
//!
//! Callbacks always run with the session unborrowed, so a callback may call
//! back into the observer (for example to [`stop`](Observer::stop) it or to
//! dispose of its own registration).

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::config::{Config, Overrides};
use crate::error::Error;
use crate::host::{Host, Signal};
use crate::preset::Preset;
use crate::ready::Ready;
use crate::registry::{RegistrationToken, VisibilityEvent};
use crate::session::{Session, Target, Targets};
use crate::trace::TraceSink;

/// Shared, re-entrant visibility observer.
pub struct Observer<H: Host, R = ()> {
    session: Rc<RefCell<Session<H, R>>>,
}

impl<H: Host, R> Clone for Observer<H, R> {
    fn clone(&self) -> Self {
        Self {
            session: Rc::clone(&self.session),
        }
    }
}

impl<H: Host, R> fmt::Debug for Observer<H, R>
where
    H::Element: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.session.try_borrow() {
            Ok(session) => f.debug_tuple("Observer").field(&*session).finish(),
            Err(_) => f.debug_tuple("Observer").field(&"<borrowed>").finish(),
        }
    }
}

impl<H: Host, R: Clone + Default + 'static> Observer<H, R> {
    /// Creates an observer from validated overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEnvironment`] if the host has no viewport.
    pub fn new(host: H, overrides: Overrides) -> Result<Self, Error> {
        let session = Session::new(host, overrides)?;
        Ok(Self {
            session: Rc::new(RefCell::new(session)),
        })
    }

    /// Creates an observer configured by a named preset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEnvironment`] if the host has no viewport.
    pub fn from_preset(host: H, preset: Preset) -> Result<Self, Error> {
        Self::new(host, preset.overrides())
    }

    /// Creates an observer from a dot-separated toggle string such as
    /// `"classes.callback.once"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an unknown toggle and
    /// [`Error::UnsupportedEnvironment`] if the host has no viewport.
    pub fn from_toggles(host: H, toggles: &str) -> Result<Self, Error> {
        let overrides = Overrides::from_preset_str(toggles)?;
        Self::new(host, overrides)
    }

    /// Registers `callback` under `name`.
    ///
    /// Elements whose `callback` dataset entry equals `name` dispatch to it
    /// when callback mode is on. Registering the same name again replaces
    /// the previous callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCallbackRegistration`] if `name` is empty.
    pub fn register_callback<F>(&self, name: &str, callback: F) -> Result<Disposer<H, R>, Error>
    where
        F: Fn(&VisibilityEvent<H::Element>) -> R + 'static,
    {
        let token = self
            .session
            .borrow_mut()
            .register_callback(name, Rc::new(callback))?;
        Ok(Disposer {
            session: Rc::downgrade(&self.session),
            token,
        })
    }

    /// Starts observing every registered item.
    ///
    /// See [`Session::start`] for restart and failure behavior.
    pub fn start(&self) -> Ready<H::Subscription> {
        let weak = Rc::downgrade(&self.session);
        let on_batch = Box::new(move |signals: Vec<Signal<H::Element>>| {
            if let Some(session) = weak.upgrade() {
                run_batch(&session, signals);
            }
        });
        self.session.borrow_mut().start(on_batch)
    }
}

impl<H: Host, R> Observer<H, R> {
    /// Appends one target. Chainable.
    pub fn register_one(&self, target: Target<'_, H::Element>) -> &Self {
        self.session.borrow_mut().register(target);
        self
    }

    /// Appends several targets. Chainable.
    pub fn register_many(&self, targets: Targets<'_, H::Element>) -> &Self {
        self.session.borrow_mut().register_many(targets);
        self
    }

    /// Stops observing and clears items and callbacks.
    pub fn stop(&self) {
        self.session.borrow_mut().stop();
    }

    /// Processes a batch as if the subscription had delivered it, returning
    /// the results of the callbacks that ran, in order.
    pub fn deliver(&self, signals: Vec<Signal<H::Element>>) -> Vec<R> {
        run_batch(&self.session, signals)
    }

    /// Returns a copy of the merged configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        self.session.borrow().config().clone()
    }

    /// Returns `true` if a subscription is active.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.session.borrow().is_watching()
    }

    /// Runs `f` with shared access to the session.
    pub fn with_session<T>(&self, f: impl FnOnce(&Session<H, R>) -> T) -> T {
        f(&self.session.borrow())
    }

    /// Installs a trace sink.
    pub fn set_trace_sink(&self, sink: Box<dyn TraceSink>) {
        self.session.borrow_mut().set_trace_sink(sink);
    }
}

/// Handles a batch, then runs each dispatch whose registration is still
/// active. A callback that stops the observer or disposes a registration
/// suppresses the affected dispatches queued behind it.
fn run_batch<H: Host, R>(
    session: &RefCell<Session<H, R>>,
    signals: Vec<Signal<H::Element>>,
) -> Vec<R> {
    let dispatches = session.borrow_mut().handle_batch(signals);
    let mut results = Vec::with_capacity(dispatches.len());
    for dispatch in dispatches {
        if session.borrow().is_registered(dispatch.token()) {
            results.push(dispatch.run());
        }
    }
    results
}

/// Removes one callback registration.
///
/// Dropping a `Disposer` keeps the callback registered.
pub struct Disposer<H: Host, R = ()> {
    session: Weak<RefCell<Session<H, R>>>,
    token: RegistrationToken,
}

impl<H: Host, R> Disposer<H, R> {
    /// Returns the registered callback name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.token.name()
    }

    /// Removes the registration.
    ///
    /// Returns `false` if the observer is gone, was stopped, or the name has
    /// since been registered again.
    pub fn dispose(self) -> bool {
        self.session
            .upgrade()
            .is_some_and(|session| session.borrow_mut().remove_callback(&self.token))
    }
}

impl<H: Host, R> fmt::Debug for Disposer<H, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
