// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observation session: registered elements, callbacks, and the active
//! subscription.
//!
//! A [`Session`] is plain owned state. It applies the [`Plan`]s produced by
//! [`evaluate`] to the host DOM and to its own bookkeeping, but it never runs
//! user callbacks itself: [`handle_batch`](Session::handle_batch) returns the
//! queued [`Dispatch`]es so the caller can run them once it no longer holds
//! the session. [`Observer`](crate::Observer) does exactly that for shared,
//! re-entrant use.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::config::{Config, ObservePolicy, Overrides};
use crate::error::Error;
use crate::evaluate::{ElementState, Plan, Snapshot, Visibility, evaluate};
use crate::host::{
    BatchHandler, CALLBACK_KEY, Dom, Host, LAZY_KEY, LOADED_KEY, LOADED_VALUE, Signal,
    Subscription,
};
use crate::ready::{self, Ready, Resolver};
use crate::registry::{Callback, CallbackRegistry, RegistrationToken, VisibilityEvent};
use crate::trace::{
    AttachEvent, BatchSummary, DispatchEvent, LoadEvent, ReleaseEvent, SetupFailedEvent,
    StartEvent, StopEvent, TraceSink, Tracer, TransitionEvent, WatchId,
};

/// A single registration target.
#[derive(Clone, Debug, PartialEq)]
pub enum Target<'a, E> {
    /// A live element.
    Element(E),
    /// A selector resolved to its first match.
    Selector(&'a str),
}

impl<'a, E> From<&'a str> for Target<'a, E> {
    fn from(selector: &'a str) -> Self {
        Self::Selector(selector)
    }
}

/// A multi-element registration target.
#[derive(Clone, Debug, PartialEq)]
pub enum Targets<'a, E> {
    /// Live elements, in order.
    Elements(Vec<E>),
    /// A selector resolved to all matches.
    Selector(&'a str),
}

impl<'a, E> From<&'a str> for Targets<'a, E> {
    fn from(selector: &'a str) -> Self {
        Self::Selector(selector)
    }
}

impl<E> From<Vec<E>> for Targets<'_, E> {
    fn from(elements: Vec<E>) -> Self {
        Self::Elements(elements)
    }
}

/// A queued callback invocation.
///
/// A dispatch remembers the exact registration it was queued for. Callers
/// that let callbacks touch the session should skip a dispatch once
/// [`Session::is_registered`] reports its token as gone.
pub struct Dispatch<E, R> {
    token: RegistrationToken,
    callback: Callback<E, R>,
    event: VisibilityEvent<E>,
}

impl<E, R> Dispatch<E, R> {
    /// Returns the event the callback will receive.
    #[must_use]
    pub fn event(&self) -> &VisibilityEvent<E> {
        &self.event
    }

    /// Returns the registration this dispatch was queued for.
    #[must_use]
    pub fn token(&self) -> &RegistrationToken {
        &self.token
    }

    /// Invokes the callback.
    pub fn run(self) -> R {
        (self.callback)(&self.event)
    }
}

impl<E: fmt::Debug, R> fmt::Debug for Dispatch<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("token", &self.token)
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Watched<E> {
    element: E,
    state: ElementState,
    load_pending: bool,
}

/// State of one observation session.
pub struct Session<H: Host, R = ()> {
    host: H,
    config: Config,
    policy: ObservePolicy,
    items: Vec<H::Element>,
    callbacks: CallbackRegistry<H::Element, R>,
    subscription: Option<H::Subscription>,
    started: bool,
    watched: Vec<Watched<H::Element>>,
    batch_index: u64,
    ready: Option<Resolver<H::Subscription>>,
    tracer: Tracer,
}

impl<H: Host, R> fmt::Debug for Session<H, R>
where
    H::Element: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("items", &self.items)
            .field("callbacks", &self.callbacks)
            .field("watching", &self.subscription.is_some())
            .field("started", &self.started)
            .field("watched", &self.watched)
            .field("batch_index", &self.batch_index)
            .finish_non_exhaustive()
    }
}

impl<H: Host, R: Clone + Default + 'static> Session<H, R> {
    /// Creates a session from validated overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEnvironment`] if the host has no viewport.
    pub fn new(host: H, overrides: Overrides) -> Result<Self, Error> {
        Self::with_config(host, overrides.into_config())
    }

    /// Creates a session from a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEnvironment`] if the host has no viewport.
    pub fn with_config(host: H, config: Config) -> Result<Self, Error> {
        let viewport_height = host
            .viewport_height()
            .ok_or(Error::UnsupportedEnvironment)?;
        let policy = ObservePolicy::derive(&config, viewport_height);
        Ok(Self {
            host,
            config,
            policy,
            items: Vec::new(),
            callbacks: CallbackRegistry::new(),
            subscription: None,
            started: false,
            watched: Vec::new(),
            batch_index: 0,
            ready: None,
            tracer: Tracer::none(),
        })
    }

    /// Registers a callback under `name`.
    ///
    /// With `callbackOnce` configured, the callback is wrapped so that it
    /// runs at most once for the lifetime of the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCallbackRegistration`] if `name` is empty.
    pub fn register_callback(
        &mut self,
        name: &str,
        callback: Callback<H::Element, R>,
    ) -> Result<RegistrationToken, Error> {
        self.callbacks
            .register(name, callback, self.config.callback_once)
            .map_err(Error::from)
    }
}

impl<H: Host, R> Session<H, R> {
    /// Returns the merged configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the derived observation policy.
    #[must_use]
    pub fn policy(&self) -> &ObservePolicy {
        &self.policy
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns the registered items, duplicates included, in order.
    #[must_use]
    pub fn items(&self) -> &[H::Element] {
        &self.items
    }

    /// Returns `true` if a subscription is active.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.subscription.is_some()
    }

    /// Returns `true` once the active subscription has delivered a batch.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Returns the active subscription handle.
    #[must_use]
    pub fn subscription(&self) -> Option<&H::Subscription> {
        self.subscription.as_ref()
    }

    /// Returns the logical state of a watched element.
    #[must_use]
    pub fn state_of(&self, element: &H::Element) -> Option<ElementState> {
        self.watched
            .iter()
            .find(|w| w.element == *element)
            .map(|w| w.state)
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Installs a trace sink. Without the `trace` feature the sink is dropped.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer.set_sink(sink);
    }

    /// Appends one target to the item list.
    ///
    /// A selector without a match appends nothing. Items added while a
    /// subscription is active are attached on the next [`start`](Self::start).
    pub fn register(&mut self, target: Target<'_, H::Element>) {
        match target {
            Target::Element(element) => self.items.push(element),
            Target::Selector(selector) => {
                if let Some(element) = self.host.select_one(selector) {
                    self.items.push(element);
                }
            }
        }
    }

    /// Appends every target to the item list, in order.
    pub fn register_many(&mut self, targets: Targets<'_, H::Element>) {
        match targets {
            Targets::Elements(elements) => self.items.extend(elements),
            Targets::Selector(selector) => {
                let elements = self.host.select_all(selector);
                self.items.extend(elements);
            }
        }
    }

    /// Removes one callback registration.
    ///
    /// Returns `false` if it was already removed or replaced.
    pub fn remove_callback(&mut self, token: &RegistrationToken) -> bool {
        self.callbacks.remove(token)
    }

    /// Returns `true` while `token` names the active registration for its
    /// callback name. Disposal, replacement, and [`stop`](Self::stop) all end
    /// a registration.
    #[must_use]
    pub fn is_registered(&self, token: &RegistrationToken) -> bool {
        self.callbacks.holds(token)
    }

    /// Creates the subscription and attaches every registered item.
    ///
    /// An active subscription is disposed first, and a previous [`Ready`]
    /// still pending settles with [`Error::Stopped`]. The returned future
    /// resolves with a clone of the subscription handle one host tick after
    /// the first batch has been processed.
    ///
    /// Setup failure is traced and reported through the returned future as
    /// [`Error::ObservationSetupFailed`].
    pub fn start(&mut self, on_batch: BatchHandler<H::Element>) -> Ready<H::Subscription> {
        if let Some(previous) = self.subscription.take() {
            previous.dispose();
        }
        self.ready = None;
        self.started = false;
        self.batch_index = 0;
        self.watched.clear();

        let subscription = match self.host.subscribe(&self.policy, on_batch) {
            Ok(subscription) => subscription,
            Err(err) => {
                self.tracer.setup_failed(&SetupFailedEvent {
                    reason: err.message(),
                });
                return Ready::rejected(Error::ObservationSetupFailed(err));
            }
        };
        self.tracer.start(&StartEvent {
            items: self.items.len(),
            margin_px: self.policy.margin_px,
            threshold: self.policy.threshold,
        });

        let config = &self.config;
        for item in &self.items {
            if config.set_class_mode {
                self.host
                    .set_data(item, &config.data_attr_observe, &config.data_attr_start_value);
                self.host.add_class(item, &config.observe_class);
            }
            if config.lazy_mode {
                self.host.add_class(item, &config.img_load_class);
                if let Some(parent) = self.host.parent(item) {
                    self.host.add_class(&parent, &config.img_wrap_load_class);
                }
            }
            subscription.attach(item);

            if !self.watched.iter().any(|w| w.element == *item) {
                self.tracer.attach(&AttachEvent {
                    element: WatchId::from_index(self.watched.len()),
                });
                self.watched.push(Watched {
                    element: item.clone(),
                    state: ElementState::Attached,
                    load_pending: false,
                });
            }
        }

        self.subscription = Some(subscription);
        let (resolver, ready) = ready::channel();
        self.ready = Some(resolver);
        ready
    }

    /// Evaluates one signal batch and applies its DOM effects.
    ///
    /// Returns the callback dispatches in signal order; the caller runs them
    /// after releasing the session.
    #[must_use = "callbacks only run when the returned dispatches are run"]
    pub fn handle_batch(
        &mut self,
        signals: Vec<Signal<H::Element>>,
    ) -> Vec<Dispatch<H::Element, R>> {
        let mut summary = BatchSummary {
            batch_index: self.batch_index,
            signals: signals.len(),
            ..BatchSummary::default()
        };
        let mut dispatches = Vec::new();

        for Signal { target, ratio } in signals {
            let Some(index) = self
                .watched
                .iter()
                .position(|w| w.element == target && w.state != ElementState::Released)
            else {
                summary.ignored += 1;
                continue;
            };

            let name = self
                .host
                .data(&target, CALLBACK_KEY)
                .filter(|name| !name.is_empty());
            let callback = name
                .as_deref()
                .filter(|_| self.config.callback_mode)
                .and_then(|name| self.callbacks.lookup(name));
            let snapshot = Snapshot {
                ratio,
                loaded: self.host.data(&target, LOADED_KEY).as_deref() == Some(LOADED_VALUE),
                load_pending: self.watched[index].load_pending,
                dispatch_eligible: callback.is_some(),
                started: self.started,
            };
            let plan = evaluate(&self.config, &snapshot);
            self.apply(index, &target, &plan);

            let state = self.watched[index].state;
            self.tracer.transition(&TransitionEvent {
                batch_index: self.batch_index,
                element: WatchId::from_index(index),
                ratio,
                visibility: plan.visibility,
                state,
            });
            match plan.visibility {
                Visibility::Visible => summary.visible += 1,
                Visibility::Hidden => summary.hidden += 1,
            }
            if plan.release {
                self.tracer.release(&ReleaseEvent {
                    batch_index: self.batch_index,
                    element: WatchId::from_index(index),
                });
                summary.released += 1;
            }

            if let (Some(visible), Some((token, callback)), Some(name)) =
                (plan.dispatch, callback, name)
            {
                self.tracer.dispatch(&DispatchEvent {
                    element: WatchId::from_index(index),
                    name: &name,
                    visible,
                });
                summary.dispatched += 1;
                dispatches.push(Dispatch {
                    token,
                    callback,
                    event: VisibilityEvent {
                        target,
                        name,
                        visible,
                    },
                });
            }
        }

        self.tracer.batch_summary(&summary);
        self.batch_index += 1;
        if !self.started {
            self.started = true;
            self.schedule_ready();
        }
        dispatches
    }

    /// Disposes the subscription and clears items, callbacks, and element
    /// states. Safe to call when not watching.
    pub fn stop(&mut self) {
        let had_subscription = match self.subscription.take() {
            Some(subscription) => {
                subscription.dispose();
                true
            }
            None => false,
        };
        self.tracer.stop(&StopEvent {
            had_subscription,
            items: self.items.len(),
            callbacks: self.callbacks.len(),
        });
        self.callbacks.clear();
        self.items.clear();
        self.watched.clear();
        self.started = false;
        self.batch_index = 0;
        self.ready = None;
    }

    fn schedule_ready(&mut self) {
        let Some(resolver) = self.ready.take() else {
            return;
        };
        if let Some(subscription) = self.subscription.clone() {
            self.host
                .defer(Box::new(move || resolver.resolve(Ok(subscription))));
        }
    }

    fn apply(&mut self, index: usize, target: &H::Element, plan: &Plan) {
        let config = &self.config;

        if plan.begin_load
            && let Some(source) = self.host.data(target, LAZY_KEY)
        {
            self.host.set_source(target, &source);
            self.host
                .on_load_once(target, load_completion(&self.host, target, config));
            self.watched[index].load_pending = true;
            self.tracer.load_begin(&LoadEvent {
                element: WatchId::from_index(index),
            });
        }

        match plan.mark {
            Some(Visibility::Visible) => {
                self.host.add_class(target, &config.observed_class);
                self.host.set_data(
                    target,
                    &config.data_attr_observe,
                    &config.data_attr_complete_value,
                );
            }
            Some(Visibility::Hidden) => {
                self.host.remove_class(target, &config.observed_class);
                self.host
                    .set_data(target, &config.data_attr_observe, &config.data_attr_start_value);
            }
            None => {}
        }

        if plan.release {
            if let Some(subscription) = &self.subscription {
                subscription.detach(target);
            }
        }

        let watched = &mut self.watched[index];
        watched.state = watched.state.after(plan);
    }
}

impl<H: Host, R> Drop for Session<H, R> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.dispose();
        }
    }
}

/// Builds the one-shot handler that marks a lazy element as loaded.
fn load_completion<D: Dom>(dom: &D, element: &D::Element, config: &Config) -> Box<dyn FnOnce()> {
    let dom = dom.clone();
    let element = element.clone();
    let complete: String = config.img_load_complete.clone();
    let wrap_complete: String = config.img_wrap_load_complete.clone();
    Box::new(move || {
        dom.add_class(&element, &complete);
        dom.set_data(&element, LOADED_KEY, LOADED_VALUE);
        dom.remove_data(&element, LAZY_KEY);
        if let Some(parent) = dom.parent(&element) {
            dom.add_class(&parent, &wrap_complete);
        }
    })
}

impl<H: Host, R> Session<H, R> {
    /// Handles `signals` and runs the resulting dispatches, returning their
    /// results in order.
    ///
    /// Only for callers that own the session outright; shared sessions go
    /// through [`Observer`](crate::Observer), which runs dispatches unborrowed.
    pub fn deliver(&mut self, signals: Vec<Signal<H::Element>>) -> Vec<R> {
        self.handle_batch(signals)
            .into_iter()
            .map(Dispatch::run)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetupError;
    use alloc::vec;

    #[derive(Clone, Debug, Default)]
    struct NullHost {
        viewport: Option<f64>,
    }

    #[derive(Clone, Debug)]
    struct NullSubscription;

    impl Subscription for NullSubscription {
        type Element = u32;
        fn attach(&self, _: &u32) {}
        fn detach(&self, _: &u32) {}
        fn dispose(&self) {}
    }

    impl Dom for NullHost {
        type Element = u32;
        fn add_class(&self, _: &u32, _: &str) {}
        fn remove_class(&self, _: &u32, _: &str) {}
        fn data(&self, _: &u32, _: &str) -> Option<String> {
            None
        }
        fn set_data(&self, _: &u32, _: &str, _: &str) {}
        fn remove_data(&self, _: &u32, _: &str) {}
        fn parent(&self, _: &u32) -> Option<u32> {
            None
        }
        fn set_source(&self, _: &u32, _: &str) {}
        fn on_load_once(&self, _: &u32, _: Box<dyn FnOnce()>) {}
    }

    impl Host for NullHost {
        type Subscription = NullSubscription;
        fn viewport_height(&self) -> Option<f64> {
            self.viewport
        }
        fn subscribe(
            &self,
            _: &ObservePolicy,
            _: BatchHandler<u32>,
        ) -> Result<NullSubscription, SetupError> {
            Ok(NullSubscription)
        }
        fn select_one(&self, _: &str) -> Option<u32> {
            None
        }
        fn select_all(&self, _: &str) -> Vec<u32> {
            Vec::new()
        }
        fn defer(&self, task: Box<dyn FnOnce()>) {
            task();
        }
    }

    fn session() -> Session<NullHost> {
        Session::new(
            NullHost {
                viewport: Some(1000.0),
            },
            Overrides::new(),
        )
        .unwrap()
    }

    #[test]
    fn missing_viewport_is_unsupported() {
        let err = Session::<NullHost>::new(NullHost::default(), Overrides::new()).unwrap_err();
        assert_eq!(err, Error::UnsupportedEnvironment);
    }

    #[test]
    fn policy_is_derived_at_construction() {
        assert_eq!(session().policy().margin_px, 150);
    }

    #[test]
    fn unmatched_selector_registers_nothing() {
        let mut session = session();
        session.register(Target::from(".missing"));
        session.register_many(Targets::from(".missing"));
        session.register_many(Targets::from(vec![1, 2, 2]));
        assert_eq!(session.items(), [1, 2, 2]);
    }

    #[test]
    fn duplicates_share_one_state() {
        let mut session = session();
        session.register_many(Targets::from(vec![4, 4]));
        let _ready = session.start(Box::new(|_| {}));
        assert_eq!(session.watched.len(), 1);
        assert_eq!(session.state_of(&4), Some(ElementState::Attached));
    }

    #[test]
    fn unknown_signal_is_ignored() {
        let mut session = session();
        session.register(Target::Element(1));
        let _ready = session.start(Box::new(|_| {}));
        let dispatched = session.handle_batch(vec![Signal::new(9, 1.0)]);
        assert!(dispatched.is_empty());
        assert_eq!(session.state_of(&9), None);
        assert!(session.is_started());
    }

    #[test]
    fn stop_clears_everything() {
        let mut session = session();
        session.register(Target::Element(1));
        session
            .register_callback("x", alloc::rc::Rc::new(|_: &VisibilityEvent<u32>| {}))
            .unwrap();
        let _ready = session.start(Box::new(|_| {}));
        session.stop();
        assert!(!session.is_watching());
        assert!(session.items().is_empty());
        assert_eq!(session.callback_count(), 0);
        session.stop();
    }
}
