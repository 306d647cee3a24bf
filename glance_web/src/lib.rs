// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser host for Glance.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebHost`]: DOM operations and `IntersectionObserver` subscriptions
//! - [`WebObserver`]: the `Observer` class exported to JavaScript
//! - [`ConsoleSink`]: trace output to the browser console
//!
//! From JavaScript:
//!
//! ```js
//! import init, { Observer, defaultObserver } from "./glance_web.js";
//! await init();
//!
//! const ob = Observer.callbackOnce();
//! ob.createCallback("hero", ({ target, visible }) => console.log(target, visible));
//! await ob.collection("[data-callback]").watch();
//! ```

#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "the JavaScript surface only runs in the browser")
)]

mod config;
mod console;
mod host;
mod observer;

pub use config::overrides_from_js;
pub use console::ConsoleSink;
pub use host::{WebHost, WebSubscription};
pub use observer::{CallbackDisposer, WebError, WebObserver, default_observer};
