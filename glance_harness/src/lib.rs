// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host for driving Glance sessions without a browser.
//!
//! [`FakeHost`] keeps a flat element tree with classes, dataset entries, a
//! resource slot, and layout boxes. Subscriptions it creates only deliver
//! when told to:
//!
//! - [`FakeHost::observe`] computes intersections against the inset viewport
//!   and delivers the elements whose state changed, like a real
//!   `IntersectionObserver` would after layout.
//! - [`FakeHost::deliver`] hands an arbitrary batch to the newest live
//!   subscription.
//! - [`FakeHost::run_deferred`] runs tasks queued through
//!   [`Host::defer`](glance_core::Host::defer).
//!
//! ```
//! use glance_core::{Observer, Overrides, Target};
//! use glance_harness::FakeHost;
//! use kurbo::Rect;
//!
//! let host = FakeHost::new(400.0, 800.0);
//! let card = host.create("div", Rect::new(0.0, 100.0, 400.0, 300.0));
//!
//! let observer = Observer::<_>::new(host.clone(), Overrides::new()).unwrap();
//! observer.register_one(Target::Element(card));
//! let _ready = observer.start();
//! host.observe();
//! host.run_deferred();
//! ```

#![no_std]

extern crate alloc;

mod geometry;
mod subscription;

pub use geometry::{Intersection, intersect, observation_root};
pub use subscription::FakeSubscription;

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::rc::{Rc, Weak};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use glance_core::host::{BatchHandler, Dom, Host, Signal};
use glance_core::{ObservePolicy, SetupError};
use kurbo::{Rect, Size};

use crate::subscription::{Reported, SubscriptionState};

/// Handle to an element in a [`FakeHost`] document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FakeElement(u32);

impl FakeElement {
    /// Returns the element's index in creation order.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

type LoadHandler = Box<dyn FnOnce()>;

struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    data: BTreeMap<String, String>,
    source: Option<String>,
    parent: Option<FakeElement>,
    bounds: Rect,
    load_handlers: Vec<LoadHandler>,
}

struct Document {
    nodes: Vec<Node>,
    viewport: Option<Size>,
    scroll: f64,
    subscriptions: Vec<Weak<RefCell<SubscriptionState>>>,
    deferred: VecDeque<Box<dyn FnOnce()>>,
    fail_next_subscribe: Option<String>,
}

impl Document {
    fn node(&self, element: FakeElement) -> Option<&Node> {
        self.nodes.get(element.0 as usize)
    }

    fn node_mut(&mut self, element: FakeElement) -> Option<&mut Node> {
        self.nodes.get_mut(element.0 as usize)
    }

    fn matches(node: &Node, selector: &str) -> bool {
        if let Some(id) = selector.strip_prefix('#') {
            node.id.as_deref() == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            node.classes.iter().any(|c| c == class)
        } else {
            node.tag == selector
        }
    }

    fn live_subscriptions(&mut self) -> Vec<FakeSubscription> {
        self.subscriptions.retain(|weak| weak.strong_count() > 0);
        self.subscriptions
            .iter()
            .filter_map(Weak::upgrade)
            .map(|state| FakeSubscription { state })
            .filter(|sub| !sub.is_disposed())
            .collect()
    }
}

/// An in-memory document and viewport.
///
/// Clones share the same document.
#[derive(Clone)]
pub struct FakeHost {
    doc: Rc<RefCell<Document>>,
}

impl fmt::Debug for FakeHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = self.doc.borrow();
        f.debug_struct("FakeHost")
            .field("elements", &doc.nodes.len())
            .field("viewport", &doc.viewport)
            .field("scroll", &doc.scroll)
            .field("deferred", &doc.deferred.len())
            .finish_non_exhaustive()
    }
}

impl FakeHost {
    /// Creates a host with a `width` x `height` viewport scrolled to the top.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_viewport(Some(Size::new(width, height)))
    }

    /// Creates a host without a viewport, which sessions reject as an
    /// unsupported environment.
    #[must_use]
    pub fn headless() -> Self {
        Self::with_viewport(None)
    }

    fn with_viewport(viewport: Option<Size>) -> Self {
        Self {
            doc: Rc::new(RefCell::new(Document {
                nodes: Vec::new(),
                viewport,
                scroll: 0.0,
                subscriptions: Vec::new(),
                deferred: VecDeque::new(),
                fail_next_subscribe: None,
            })),
        }
    }

    /// Creates a detached element with `tag` laid out at `bounds` (document
    /// coordinates).
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a test document never holds more than u32::MAX elements"
    )]
    pub fn create(&self, tag: &str, bounds: Rect) -> FakeElement {
        let mut doc = self.doc.borrow_mut();
        let element = FakeElement(doc.nodes.len() as u32);
        doc.nodes.push(Node {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            data: BTreeMap::new(),
            source: None,
            parent: None,
            bounds,
            load_handlers: Vec::new(),
        });
        element
    }

    /// Creates an element as a child of `parent`.
    pub fn create_child(&self, parent: FakeElement, tag: &str, bounds: Rect) -> FakeElement {
        let child = self.create(tag, bounds);
        self.set_parent(child, parent);
        child
    }

    /// Reparents `child`.
    pub fn set_parent(&self, child: FakeElement, parent: FakeElement) {
        if let Some(node) = self.doc.borrow_mut().node_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Sets the element's id.
    pub fn set_id(&self, element: FakeElement, id: &str) {
        if let Some(node) = self.doc.borrow_mut().node_mut(element) {
            node.id = Some(id.to_string());
        }
    }

    /// Moves the element's layout box.
    pub fn set_bounds(&self, element: FakeElement, bounds: Rect) {
        if let Some(node) = self.doc.borrow_mut().node_mut(element) {
            node.bounds = bounds;
        }
    }

    /// Returns `true` if the element carries `class`.
    #[must_use]
    pub fn has_class(&self, element: FakeElement, class: &str) -> bool {
        self.doc
            .borrow()
            .node(element)
            .is_some_and(|node| node.classes.iter().any(|c| c == class))
    }

    /// Returns the element's classes in insertion order.
    #[must_use]
    pub fn classes(&self, element: FakeElement) -> Vec<String> {
        self.doc
            .borrow()
            .node(element)
            .map(|node| node.classes.clone())
            .unwrap_or_default()
    }

    /// Returns the element's active resource.
    #[must_use]
    pub fn source(&self, element: FakeElement) -> Option<String> {
        self.doc
            .borrow()
            .node(element)
            .and_then(|node| node.source.clone())
    }

    /// Returns the number of load handlers waiting on the element.
    #[must_use]
    pub fn pending_loads(&self, element: FakeElement) -> usize {
        self.doc
            .borrow()
            .node(element)
            .map_or(0, |node| node.load_handlers.len())
    }

    /// Simulates the element's resource finishing loading.
    ///
    /// Runs and forgets every handler armed through
    /// [`Dom::on_load_once`]. Returns the number of handlers run.
    pub fn finish_load(&self, element: FakeElement) -> usize {
        let handlers = self
            .doc
            .borrow_mut()
            .node_mut(element)
            .map(|node| core::mem::take(&mut node.load_handlers))
            .unwrap_or_default();
        let count = handlers.len();
        for handler in handlers {
            handler();
        }
        count
    }

    /// Makes the next [`Host::subscribe`] call fail with `reason`.
    pub fn fail_next_subscribe(&self, reason: &str) {
        self.doc.borrow_mut().fail_next_subscribe = Some(reason.to_string());
    }

    /// Runs queued deferred tasks, including tasks they queue, until the
    /// queue is empty. Returns the number of tasks run.
    pub fn run_deferred(&self) -> usize {
        let mut count = 0;
        loop {
            let task = self.doc.borrow_mut().deferred.pop_front();
            let Some(task) = task else {
                return count;
            };
            task();
            count += 1;
        }
    }

    /// Returns the newest live subscription.
    #[must_use]
    pub fn subscription(&self) -> Option<FakeSubscription> {
        self.doc.borrow_mut().live_subscriptions().pop()
    }

    /// Scrolls the viewport to `top` and observes.
    pub fn scroll_to(&self, top: f64) {
        self.doc.borrow_mut().scroll = top;
        self.observe();
    }

    /// Computes intersections for every live subscription and delivers one
    /// batch per subscription.
    ///
    /// An element is included the first time it is observed after being
    /// attached, and afterwards whenever it starts or stops intersecting or
    /// crosses the threshold.
    pub fn observe(&self) {
        let subscriptions = self.doc.borrow_mut().live_subscriptions();
        for subscription in subscriptions {
            let signals = self.pending_signals(&subscription);
            subscription.deliver(signals);
        }
    }

    /// Hands `signals` to the newest live subscription, as `(element,
    /// ratio)` pairs.
    pub fn deliver(&self, signals: &[(FakeElement, f64)]) {
        if let Some(subscription) = self.subscription() {
            subscription.deliver(
                signals
                    .iter()
                    .map(|&(element, ratio)| Signal::new(element, ratio))
                    .collect(),
            );
        }
    }

    fn pending_signals(&self, subscription: &FakeSubscription) -> Vec<Signal<FakeElement>> {
        let doc = self.doc.borrow();
        let Some(viewport) = doc.viewport else {
            return Vec::new();
        };
        let mut state = subscription.state.borrow_mut();
        let root = observation_root(
            Rect::new(0.0, doc.scroll, viewport.width, doc.scroll + viewport.height),
            f64::from(state.policy.margin_px),
        );
        let threshold = state.policy.threshold;

        let mut signals = Vec::new();
        for element in state.attached.clone() {
            let Some(node) = doc.node(element) else {
                continue;
            };
            let hit = intersect(node.bounds, root);
            let now = Reported {
                intersecting: hit.intersecting,
                above: hit.ratio >= threshold,
            };
            if state.reported.insert(element, now) != Some(now) {
                signals.push(Signal::new(element, hit.ratio));
            }
        }
        signals
    }
}

impl Dom for FakeHost {
    type Element = FakeElement;

    fn add_class(&self, element: &FakeElement, class: &str) {
        if class.is_empty() {
            return;
        }
        if let Some(node) = self.doc.borrow_mut().node_mut(*element)
            && !node.classes.iter().any(|c| c == class)
        {
            node.classes.push(class.to_string());
        }
    }

    fn remove_class(&self, element: &FakeElement, class: &str) {
        if let Some(node) = self.doc.borrow_mut().node_mut(*element) {
            node.classes.retain(|c| c != class);
        }
    }

    fn data(&self, element: &FakeElement, key: &str) -> Option<String> {
        self.doc
            .borrow()
            .node(*element)
            .and_then(|node| node.data.get(key).cloned())
    }

    fn set_data(&self, element: &FakeElement, key: &str, value: &str) {
        if key.is_empty() {
            return;
        }
        if let Some(node) = self.doc.borrow_mut().node_mut(*element) {
            node.data.insert(key.to_string(), value.to_string());
        }
    }

    fn remove_data(&self, element: &FakeElement, key: &str) {
        if let Some(node) = self.doc.borrow_mut().node_mut(*element) {
            node.data.remove(key);
        }
    }

    fn parent(&self, element: &FakeElement) -> Option<FakeElement> {
        self.doc.borrow().node(*element).and_then(|node| node.parent)
    }

    fn set_source(&self, element: &FakeElement, source: &str) {
        if let Some(node) = self.doc.borrow_mut().node_mut(*element) {
            node.source = Some(source.to_string());
        }
    }

    fn on_load_once(&self, element: &FakeElement, handler: Box<dyn FnOnce()>) {
        if let Some(node) = self.doc.borrow_mut().node_mut(*element) {
            node.load_handlers.push(handler);
        }
    }
}

impl Host for FakeHost {
    type Subscription = FakeSubscription;

    fn viewport_height(&self) -> Option<f64> {
        self.doc.borrow().viewport.map(|size| size.height)
    }

    fn subscribe(
        &self,
        policy: &ObservePolicy,
        on_batch: BatchHandler<FakeElement>,
    ) -> Result<FakeSubscription, SetupError> {
        let mut doc = self.doc.borrow_mut();
        if let Some(reason) = doc.fail_next_subscribe.take() {
            return Err(SetupError::new(reason));
        }
        let subscription = FakeSubscription::new(*policy, on_batch);
        doc.subscriptions.push(Rc::downgrade(&subscription.state));
        Ok(subscription)
    }

    fn select_one(&self, selector: &str) -> Option<FakeElement> {
        self.select_all(selector).into_iter().next()
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "element indices are created from u32"
    )]
    fn select_all(&self, selector: &str) -> Vec<FakeElement> {
        let selector = selector.trim();
        if selector.len() < 2 && (selector.starts_with('#') || selector.starts_with('.')) {
            return Vec::new();
        }
        self.doc
            .borrow()
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| Document::matches(node, selector))
            .map(|(index, _)| FakeElement(index as u32))
            .collect()
    }

    fn defer(&self, task: Box<dyn FnOnce()>) {
        self.doc.borrow_mut().deferred.push_back(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn selectors_resolve_in_document_order() {
        let host = FakeHost::new(100.0, 100.0);
        let a = host.create("img", Rect::ZERO);
        let b = host.create("div", Rect::ZERO);
        let c = host.create("img", Rect::ZERO);
        host.add_class(&b, "card");
        host.add_class(&c, "card");
        host.set_id(c, "hero");

        assert_eq!(host.select_all("img"), [a, c]);
        assert_eq!(host.select_all(".card"), [b, c]);
        assert_eq!(host.select_one("#hero"), Some(c));
        assert_eq!(host.select_one("#nope"), None);
        assert!(host.select_all("#").is_empty());
    }

    #[test]
    fn classes_are_deduplicated_and_empty_ignored() {
        let host = FakeHost::new(100.0, 100.0);
        let el = host.create("div", Rect::ZERO);
        host.add_class(&el, "a");
        host.add_class(&el, "a");
        host.add_class(&el, "");
        assert_eq!(host.classes(el), ["a"]);
        host.remove_class(&el, "a");
        assert!(host.classes(el).is_empty());
    }

    #[test]
    fn load_handlers_run_once() {
        let host = FakeHost::new(100.0, 100.0);
        let el = host.create("img", Rect::ZERO);
        let runs = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&runs);
        host.on_load_once(&el, Box::new(move || *counter.borrow_mut() += 1));
        assert_eq!(host.finish_load(el), 1);
        assert_eq!(host.finish_load(el), 0);
        assert_eq!(*runs.borrow(), 1);
    }

    #[test]
    fn observe_reports_changes_only() {
        let host = FakeHost::new(100.0, 100.0);
        let near = host.create("div", Rect::new(0.0, 40.0, 100.0, 60.0));
        let far = host.create("div", Rect::new(0.0, 500.0, 100.0, 600.0));
        let batches = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&batches);
        let policy = ObservePolicy {
            threshold: 0.01,
            margin_px: 10,
        };
        let sub = host
            .subscribe(
                &policy,
                Box::new(move |signals: Vec<Signal<FakeElement>>| {
                    log.borrow_mut()
                        .push(signals.iter().map(|s| s.target).collect::<Vec<_>>());
                }),
            )
            .unwrap();
        glance_core::Subscription::attach(&sub, &near);
        glance_core::Subscription::attach(&sub, &far);

        host.observe();
        host.observe();
        host.scroll_to(480.0);
        assert_eq!(*batches.borrow(), [vec![near, far], vec![near, far]]);
    }

    #[test]
    fn failed_subscribe_reports_reason() {
        let host = FakeHost::new(100.0, 100.0);
        host.fail_next_subscribe("no observer");
        let policy = ObservePolicy {
            threshold: 0.01,
            margin_px: 0,
        };
        let err = host.subscribe(&policy, Box::new(|_| {})).unwrap_err();
        assert_eq!(err.message(), "no observer");
        assert!(host.subscribe(&policy, Box::new(|_| {})).is_ok());
    }
}
