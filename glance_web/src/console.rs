// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser console trace sink.

use glance_core::trace::{
    BatchSummary, DispatchEvent, LoadEvent, ReleaseEvent, SetupFailedEvent, StartEvent, StopEvent,
    TraceSink,
};
use wasm_bindgen::JsValue;
use web_sys::console;

/// Writes session events to the browser console.
///
/// Setup failures go to `console.error`; everything else goes to
/// `console.debug` when `verbose` is set.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink {
    verbose: bool,
}

impl ConsoleSink {
    /// Creates a sink that only reports errors.
    #[must_use]
    pub const fn errors_only() -> Self {
        Self { verbose: false }
    }

    /// Creates a sink that reports every lifecycle event.
    #[must_use]
    pub const fn verbose() -> Self {
        Self { verbose: true }
    }

    fn debug(&self, line: &str) {
        if self.verbose {
            console::debug_1(&JsValue::from_str(line));
        }
    }
}

impl TraceSink for ConsoleSink {
    fn on_start(&mut self, e: &StartEvent) {
        self.debug(&format!(
            "glance: watching {} item(s), rootMargin -{}px, threshold {}",
            e.items, e.margin_px, e.threshold
        ));
    }

    fn on_load_begin(&mut self, e: &LoadEvent) {
        self.debug(&format!("glance: loading element #{}", e.element.0));
    }

    fn on_dispatch(&mut self, e: &DispatchEvent<'_>) {
        self.debug(&format!(
            "glance: callback {:?} visible={} (element #{})",
            e.name, e.visible, e.element.0
        ));
    }

    fn on_release(&mut self, e: &ReleaseEvent) {
        self.debug(&format!("glance: unobserve element #{}", e.element.0));
    }

    fn on_setup_failed(&mut self, e: &SetupFailedEvent<'_>) {
        console::error_1(&JsValue::from_str(&format!(
            "glance: observation setup failed: {}",
            e.reason
        )));
    }

    fn on_stop(&mut self, e: &StopEvent) {
        self.debug(&format!(
            "glance: disconnected ({} item(s), {} callback(s))",
            e.items, e.callbacks
        ));
    }

    fn on_batch_summary(&mut self, s: &BatchSummary) {
        if s.ignored > 0 {
            self.debug(&format!(
                "glance: batch #{} ignored {} signal(s) for released elements",
                s.batch_index, s.ignored
            ));
        }
    }
}
