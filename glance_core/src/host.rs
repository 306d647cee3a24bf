// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host capabilities required by the core.
//!
//! The core never talks to a browser directly. A *host* provides:
//!
//! - **DOM access** ([`Dom`]): class and data-attribute mutation, resource
//!   swaps, parent lookup, and one-shot load handlers.
//! - **Viewport query** ([`Host::viewport_height`]): `None` means the
//!   environment cannot observe anything, which surfaces as
//!   [`Error::UnsupportedEnvironment`](crate::Error::UnsupportedEnvironment).
//! - **Subscription factory** ([`Host::subscribe`]): creates the
//!   intersection primitive and later delivers signal batches to the
//!   supplied [`BatchHandler`].
//! - **Selector resolution** and a **deferral** hook for one-tick delays.
//!
//! `glance_web` implements these on top of `web_sys`; `glance_harness`
//! implements them in memory for tests.
//!
//! # Re-entrancy contract
//!
//! [`Host::subscribe`] and [`Subscription::attach`] must not invoke the
//! batch handler synchronously. Batches are delivered later, from the
//! host's own event loop, exactly like `IntersectionObserver` callbacks.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::config::ObservePolicy;
use crate::error::SetupError;

/// Dataset key naming the callback an element dispatches to.
pub const CALLBACK_KEY: &str = "callback";

/// Dataset key holding an element's deferred resource reference.
pub const LAZY_KEY: &str = "lazy";

/// Dataset key set once an element's deferred resource has loaded.
pub const LOADED_KEY: &str = "loaded";

/// Value of [`LOADED_KEY`] on a loaded element.
pub const LOADED_VALUE: &str = "1";

/// Element-level DOM operations.
///
/// Dataset keys are given in their dataset (camelCase) form; hosts map them
/// to attribute names as the platform requires. All operations are
/// infallible from the core's point of view: a host that cannot perform one
/// (for example adding an empty class name) ignores it.
pub trait Dom: Clone + 'static {
    /// The host's element handle. Equality must be element identity.
    type Element: Clone + PartialEq + 'static;

    /// Adds `class` to the element's class list.
    fn add_class(&self, element: &Self::Element, class: &str);

    /// Removes `class` from the element's class list.
    fn remove_class(&self, element: &Self::Element, class: &str);

    /// Reads a dataset entry.
    fn data(&self, element: &Self::Element, key: &str) -> Option<String>;

    /// Writes a dataset entry.
    fn set_data(&self, element: &Self::Element, key: &str, value: &str);

    /// Removes a dataset entry.
    fn remove_data(&self, element: &Self::Element, key: &str);

    /// Returns the element's parent element, if any.
    fn parent(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Writes `source` into the element's active resource slot (`src`).
    fn set_source(&self, element: &Self::Element, source: &str);

    /// Runs `handler` the next time the element finishes loading, then
    /// forgets it.
    fn on_load_once(&self, element: &Self::Element, handler: Box<dyn FnOnce()>);
}

/// One visibility signal for one element.
#[derive(Clone, Debug, PartialEq)]
pub struct Signal<E> {
    /// The element whose intersection changed.
    pub target: E,
    /// Fraction of the element's area inside the (inset) viewport, `0.0..=1.0`.
    pub ratio: f64,
}

impl<E> Signal<E> {
    /// Creates a signal.
    #[must_use]
    pub const fn new(target: E, ratio: f64) -> Self {
        Self { target, ratio }
    }
}

/// Receives each signal batch from a subscription.
pub type BatchHandler<E> = Box<dyn FnMut(Vec<Signal<E>>)>;

/// A live intersection subscription.
///
/// Clones refer to the same underlying subscription.
pub trait Subscription: Clone + 'static {
    /// The element handle type.
    type Element;

    /// Starts delivering signals for `element`.
    fn attach(&self, element: &Self::Element);

    /// Stops delivering signals for `element`.
    fn detach(&self, element: &Self::Element);

    /// Stops delivering signals for every element.
    fn dispose(&self);
}

/// A platform that can observe element visibility.
pub trait Host: Dom {
    /// The subscription type produced by [`subscribe`](Self::subscribe).
    type Subscription: Subscription<Element = Self::Element>;

    /// Returns the viewport height in CSS pixels, or `None` if there is no
    /// viewport.
    fn viewport_height(&self) -> Option<f64>;

    /// Creates a subscription scoped to `policy`.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] if the platform primitive cannot be created.
    fn subscribe(
        &self,
        policy: &ObservePolicy,
        on_batch: BatchHandler<Self::Element>,
    ) -> Result<Self::Subscription, SetupError>;

    /// Resolves a selector to its first match.
    fn select_one(&self, selector: &str) -> Option<Self::Element>;

    /// Resolves a selector to all matches, in document order.
    fn select_all(&self, selector: &str) -> Vec<Self::Element>;

    /// Runs `task` on a later turn of the host's event loop.
    fn defer(&self, task: Box<dyn FnOnce()>);
}
