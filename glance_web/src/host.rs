// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `web_sys` implementation of the host traits.
//!
//! Dataset keys map to `data-*` attributes the same way `element.dataset`
//! does: `dataAttrObserve` becomes `data-data-attr-observe`, `lazy` becomes
//! `data-lazy`. Attributes are used instead of `dataset` so non-HTML elements
//! (SVG images) work too.

use std::cell::RefCell;
use std::rc::Rc;

use glance_core::host::{BatchHandler, Dom, Host, Signal, Subscription};
use glance_core::{ObservePolicy, SetupError};
use js_sys::Array;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Document, Element, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, Window,
};

// Direct global binding instead of going through `Window` for every deferral.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay: i32) -> JsValue;
}

/// Schedules `task` on a later turn of the event loop.
pub(crate) fn later(task: impl FnOnce() + 'static) {
    let _ = set_timeout(&Closure::once_into_js(task), 0);
}

/// Converts a dataset key to its attribute name.
pub(crate) fn data_attribute(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 8);
    name.push_str("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            name.push('-');
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}

/// Browser host backed by the global `window` and `document`.
#[derive(Clone, Debug)]
pub struct WebHost {
    window: Window,
    document: Document,
}

impl WebHost {
    /// Returns a host for the current global scope, or `None` outside a
    /// document (workers, server-side rendering).
    #[must_use]
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    /// Returns the document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl Dom for WebHost {
    type Element = Element;

    fn add_class(&self, element: &Element, class: &str) {
        // `DOMTokenList.add("")` throws.
        if !class.is_empty() {
            let _ = element.class_list().add_1(class);
        }
    }

    fn remove_class(&self, element: &Element, class: &str) {
        if !class.is_empty() {
            let _ = element.class_list().remove_1(class);
        }
    }

    fn data(&self, element: &Element, key: &str) -> Option<String> {
        element.get_attribute(&data_attribute(key))
    }

    fn set_data(&self, element: &Element, key: &str, value: &str) {
        let _ = element.set_attribute(&data_attribute(key), value);
    }

    fn remove_data(&self, element: &Element, key: &str) {
        let _ = element.remove_attribute(&data_attribute(key));
    }

    fn parent(&self, element: &Element) -> Option<Element> {
        element.parent_element()
    }

    fn set_source(&self, element: &Element, source: &str) {
        let _ = element.set_attribute("src", source);
    }

    fn on_load_once(&self, element: &Element, handler: Box<dyn FnOnce()>) {
        let listener = Closure::once_into_js(handler);
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        let _ = element.add_event_listener_with_callback_and_add_event_listener_options(
            "load",
            listener.unchecked_ref(),
            &options,
        );
    }
}

impl Host for WebHost {
    type Subscription = WebSubscription;

    fn viewport_height(&self) -> Option<f64> {
        let inner = self.window.inner_height().ok()?.as_f64().unwrap_or(0.0);
        let client = self
            .document
            .document_element()
            .map_or(0.0, |root| f64::from(root.client_height()));
        Some(inner.max(client))
    }

    fn subscribe(
        &self,
        policy: &ObservePolicy,
        on_batch: BatchHandler<Element>,
    ) -> Result<WebSubscription, SetupError> {
        let mut on_batch = on_batch;
        let closure: BatchClosure = Closure::new(move |entries: Array| {
            let signals = entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .map(|entry| Signal::new(entry.target(), entry.intersection_ratio()))
                .collect();
            on_batch(signals);
        });

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&policy.root_margin());
        init.set_threshold(&JsValue::from_f64(policy.threshold));
        let observer =
            IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init)
                .map_err(|err| SetupError::new(describe(&err)))?;

        Ok(WebSubscription {
            observer,
            closure: Rc::new(RefCell::new(Some(closure))),
        })
    }

    fn select_one(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn select_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn defer(&self, task: Box<dyn FnOnce()>) {
        later(task);
    }
}

type BatchClosure = Closure<dyn FnMut(Array)>;

/// A live `IntersectionObserver` and the closure it calls.
///
/// Clones share the observer. Disposing disconnects it and releases the
/// closure on a later tick, since disposal may happen from inside the
/// closure itself.
#[derive(Clone, Debug)]
pub struct WebSubscription {
    observer: IntersectionObserver,
    closure: Rc<RefCell<Option<BatchClosure>>>,
}

impl WebSubscription {
    /// Returns the underlying observer.
    #[must_use]
    pub fn observer(&self) -> &IntersectionObserver {
        &self.observer
    }
}

impl Subscription for WebSubscription {
    type Element = Element;

    fn attach(&self, element: &Element) {
        self.observer.observe(element);
    }

    fn detach(&self, element: &Element) {
        self.observer.unobserve(element);
    }

    fn dispose(&self) {
        self.observer.disconnect();
        if let Some(closure) = self.closure.borrow_mut().take() {
            later(move || drop(closure));
        }
    }
}

/// Extracts a readable message from a thrown JS value.
pub(crate) fn describe(err: &JsValue) -> String {
    err.dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| "IntersectionObserver could not be created".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_keys_become_kebab_attributes() {
        assert_eq!(data_attribute("lazy"), "data-lazy");
        assert_eq!(data_attribute("observe"), "data-observe");
        assert_eq!(data_attribute("dataAttrObserve"), "data-data-attr-observe");
        assert_eq!(data_attribute(""), "data-");
    }
}
