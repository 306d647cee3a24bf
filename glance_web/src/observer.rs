// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The JavaScript-facing `Observer` class.

use std::cell::RefCell;
use std::fmt;

use glance_core::{
    ConfigError, Disposer, Error, Observer, Preset, RegistrationError, Target, Targets,
    VisibilityEvent,
};
use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{Element, console};

use crate::config::overrides_from_js;
use crate::console::ConsoleSink;
use crate::host::WebHost;

type Inner = Observer<WebHost, JsValue>;

/// An [`Error`] on its way to JavaScript, where it becomes an `Error` whose
/// message is the display text.
#[derive(Debug)]
pub struct WebError(pub Error);

impl From<Error> for WebError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<ConfigError> for WebError {
    fn from(err: ConfigError) -> Self {
        Self(Error::from(err))
    }
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<WebError> for JsValue {
    fn from(err: WebError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

/// Visibility observer exposed to JavaScript as `Observer`.
///
/// Clones share one session: the object returned by `simple()` or
/// `collection()` is the same observer.
#[wasm_bindgen(js_name = Observer)]
#[derive(Clone, Debug)]
pub struct WebObserver {
    inner: Inner,
}

impl WebObserver {
    fn with_overrides(overrides: glance_core::Overrides) -> Result<Self, WebError> {
        let host = WebHost::detect().ok_or(Error::UnsupportedEnvironment)?;
        let inner = Inner::new(host, overrides)?;
        inner.set_trace_sink(Box::new(ConsoleSink::errors_only()));
        Ok(Self { inner })
    }

    fn from_preset(preset: Preset) -> Result<Self, WebError> {
        Self::with_overrides(preset.overrides())
    }

    /// Returns the shared Rust observer.
    #[must_use]
    pub fn inner(&self) -> &Observer<WebHost, JsValue> {
        &self.inner
    }
}

#[wasm_bindgen(js_class = Observer)]
impl WebObserver {
    /// `new Observer(params?)`: validates `params` against the known options.
    #[wasm_bindgen(constructor)]
    pub fn new(params: JsValue) -> Result<Self, WebError> {
        Self::with_overrides(overrides_from_js(&params)?)
    }

    /// Builds an observer from dot-separated toggles, e.g.
    /// `"classes.callback.lazy"`.
    #[wasm_bindgen(js_name = fromToggles)]
    pub fn from_toggles(toggles: &str) -> Result<Self, WebError> {
        Self::with_overrides(glance_core::Overrides::from_preset_str(toggles)?)
    }

    /// `classes.callback.lazy`
    #[wasm_bindgen(js_name = "default")]
    pub fn preset_default() -> Result<Self, WebError> {
        Self::from_preset(Preset::Default)
    }

    /// `zero`
    pub fn zero() -> Result<Self, WebError> {
        Self::from_preset(Preset::Zero)
    }

    /// `infinity`
    pub fn infinity() -> Result<Self, WebError> {
        Self::from_preset(Preset::Infinity)
    }

    /// `callback`
    pub fn callback() -> Result<Self, WebError> {
        Self::from_preset(Preset::Callback)
    }

    /// `callback.once`
    #[wasm_bindgen(js_name = callbackOnce)]
    pub fn callback_once() -> Result<Self, WebError> {
        Self::from_preset(Preset::CallbackOnce)
    }

    /// `callback.infinity`
    #[wasm_bindgen(js_name = callbackInfinity)]
    pub fn callback_infinity() -> Result<Self, WebError> {
        Self::from_preset(Preset::CallbackInfinity)
    }

    /// `classes`
    pub fn classes() -> Result<Self, WebError> {
        Self::from_preset(Preset::Classes)
    }

    /// `lazy`
    pub fn lazy() -> Result<Self, WebError> {
        Self::from_preset(Preset::Lazy)
    }

    /// Registers one element, or the first match of a selector string.
    pub fn simple(&self, target: &JsValue) -> Self {
        if let Some(selector) = target.as_string() {
            self.inner.register_one(Target::Selector(&selector));
        } else if let Some(element) = target.dyn_ref::<Element>() {
            self.inner.register_one(Target::Element(element.clone()));
        }
        self.clone()
    }

    /// Registers every match of a selector string, or every element of an
    /// iterable (`NodeList`, `HTMLCollection`, arrays).
    pub fn collection(&self, targets: &JsValue) -> Self {
        if let Some(selector) = targets.as_string() {
            self.inner.register_many(Targets::Selector(&selector));
        } else if let Some(element) = targets.dyn_ref::<Element>() {
            self.inner
                .register_many(Targets::Elements(vec![element.clone()]));
        } else if let Ok(Some(items)) = js_sys::try_iter(targets) {
            let elements = items
                .filter_map(Result::ok)
                .filter_map(|item| item.dyn_into::<Element>().ok())
                .collect();
            self.inner.register_many(Targets::Elements(elements));
        }
        self.clone()
    }

    /// Starts observing. The promise resolves with the underlying
    /// `IntersectionObserver` one tick after the first batch.
    pub fn watch(&self) -> Promise {
        let ready = self.inner.start();
        future_to_promise(async move {
            match ready.await {
                Ok(subscription) => Ok(subscription.observer().clone().into()),
                Err(err) => Err(WebError(err).into()),
            }
        })
    }

    /// Stops observing and forgets items and callbacks.
    pub fn disconnect(&self) -> Self {
        self.inner.stop();
        self.clone()
    }

    /// Registers `callback` under `name`.
    ///
    /// The callback receives `{ target, name, visible }`. Exceptions it
    /// throws are logged and otherwise ignored.
    #[wasm_bindgen(js_name = createCallback)]
    pub fn create_callback(
        &self,
        name: &str,
        callback: JsValue,
    ) -> Result<CallbackDisposer, WebError> {
        let Some(function) = callback.dyn_ref::<Function>().cloned() else {
            return Err(Error::from(RegistrationError::NotCallable).into());
        };
        let disposer = self
            .inner
            .register_callback(name, move |event: &VisibilityEvent<Element>| {
                match function.call1(&JsValue::NULL, &event_object(event)) {
                    Ok(value) => value,
                    Err(err) => {
                        console::error_2(&JsValue::from_str("glance: callback threw"), &err);
                        JsValue::UNDEFINED
                    }
                }
            })?;
        Ok(CallbackDisposer {
            disposer: Some(disposer),
        })
    }

    /// `true` while a subscription is active.
    #[wasm_bindgen(getter, js_name = isWatching)]
    pub fn is_watching(&self) -> bool {
        self.inner.is_watching()
    }
}

fn event_object(event: &VisibilityEvent<Element>) -> JsValue {
    let object = Object::new();
    let _ = Reflect::set(&object, &JsValue::from_str("target"), event.target.as_ref());
    let _ = Reflect::set(
        &object,
        &JsValue::from_str("name"),
        &JsValue::from_str(&event.name),
    );
    let _ = Reflect::set(
        &object,
        &JsValue::from_str("visible"),
        &JsValue::from_bool(event.visible),
    );
    object.into()
}

/// Returned by `createCallback`; `delete()` removes that registration.
#[wasm_bindgen]
#[derive(Debug)]
pub struct CallbackDisposer {
    disposer: Option<Disposer<WebHost, JsValue>>,
}

#[wasm_bindgen]
impl CallbackDisposer {
    /// Removes the registration. Returns `false` if it was already gone or
    /// has been replaced under the same name.
    #[wasm_bindgen(js_name = delete)]
    pub fn dispose(&mut self) -> bool {
        self.disposer.take().is_some_and(Disposer::dispose)
    }
}

thread_local! {
    static DEFAULT: RefCell<Option<WebObserver>> = const { RefCell::new(None) };
}

/// Returns the process-wide observer configured as `classes.callback.lazy`,
/// creating it on first use.
///
/// # Errors
///
/// Fails with the unsupported-environment error outside a document.
#[wasm_bindgen(js_name = defaultObserver)]
pub fn default_observer() -> Result<WebObserver, WebError> {
    DEFAULT.with(|slot| {
        if let Some(observer) = slot.borrow().as_ref() {
            return Ok(observer.clone());
        }
        let observer = WebObserver::from_preset(Preset::Default)?;
        *slot.borrow_mut() = Some(observer.clone());
        Ok(observer)
    })
}
