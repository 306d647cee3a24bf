// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for observation sessions.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! session calls at each stage of its lifecycle. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing and installed sinks are
//! dropped. When **on**, each method performs a single `Option` branch before
//! dispatching.
//!
//! Elements are identified by [`WatchId`], their position in the session's
//! watch list, so events stay independent of the host's element type.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use alloc::boxed::Box;

use crate::evaluate::{ElementState, Visibility};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Position of an element in the session's watch list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchId(pub u32);

impl WatchId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a subscription has been created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartEvent {
    /// Registered items, duplicates included.
    pub items: usize,
    /// Inward margin in pixels.
    pub margin_px: u32,
    /// Visibility threshold.
    pub threshold: f64,
}

/// Emitted when a distinct element is attached to the subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachEvent {
    /// The attached element.
    pub element: WatchId,
}

/// Emitted for every evaluated signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionEvent {
    /// Batch the signal arrived in.
    pub batch_index: u64,
    /// The element.
    pub element: WatchId,
    /// Ratio carried by the signal.
    pub ratio: f64,
    /// Classification against the threshold.
    pub visibility: Visibility,
    /// State after applying the plan.
    pub state: ElementState,
}

/// Emitted when a deferred resource swap starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadEvent {
    /// The element.
    pub element: WatchId,
}

/// Emitted when a callback dispatch is queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchEvent<'a> {
    /// The element.
    pub element: WatchId,
    /// Callback name.
    pub name: &'a str,
    /// The `visible` flag passed to the callback.
    pub visible: bool,
}

/// Emitted when an element is detached for good.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseEvent {
    /// Batch the release happened in.
    pub batch_index: u64,
    /// The element.
    pub element: WatchId,
}

/// Emitted when the host fails to create a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetupFailedEvent<'a> {
    /// Host-provided description.
    pub reason: &'a str,
}

/// Emitted when the session is torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopEvent {
    /// Whether a subscription was disposed.
    pub had_subscription: bool,
    /// Items cleared.
    pub items: usize,
    /// Callbacks cleared.
    pub callbacks: usize,
}

/// Per-batch counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Batch counter, starting at 0 for each subscription.
    pub batch_index: u64,
    /// Signals delivered.
    pub signals: usize,
    /// Signals classified visible.
    pub visible: usize,
    /// Signals classified hidden.
    pub hidden: usize,
    /// Elements released.
    pub released: usize,
    /// Signals for unknown or released elements.
    pub ignored: usize,
    /// Callback dispatches queued.
    pub dispatched: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a session.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after a subscription is created.
    fn on_start(&mut self, e: &StartEvent) {
        _ = e;
    }

    /// Called when a distinct element is attached.
    fn on_attach(&mut self, e: &AttachEvent) {
        _ = e;
    }

    /// Called for every evaluated signal.
    fn on_transition(&mut self, e: &TransitionEvent) {
        _ = e;
    }

    /// Called when a deferred resource swap starts.
    fn on_load_begin(&mut self, e: &LoadEvent) {
        _ = e;
    }

    /// Called when a callback dispatch is queued.
    fn on_dispatch(&mut self, e: &DispatchEvent<'_>) {
        _ = e;
    }

    /// Called when an element is released.
    fn on_release(&mut self, e: &ReleaseEvent) {
        _ = e;
    }

    /// Called when subscription creation fails.
    fn on_setup_failed(&mut self, e: &SetupFailedEvent<'_>) {
        _ = e;
    }

    /// Called when the session is stopped.
    fn on_stop(&mut self, e: &StopEvent) {
        _ = e;
    }

    /// Called once per processed batch.
    fn on_batch_summary(&mut self, s: &BatchSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Owner of an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:ident) => {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    };
}

impl Tracer {
    /// Creates a tracer that dispatches to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        let mut tracer = Self::default();
        tracer.set_sink(sink);
        tracer
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Replaces the installed sink.
    #[inline]
    pub fn set_sink(&mut self, sink: Box<dyn TraceSink>) {
        #[cfg(feature = "trace")]
        {
            self.sink = Some(sink);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
        }
    }

    /// Removes and returns the installed sink.
    #[inline]
    pub fn take_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        #[cfg(feature = "trace")]
        {
            self.sink.take()
        }
        #[cfg(not(feature = "trace"))]
        {
            None
        }
    }

    /// Emits a [`StartEvent`].
    #[inline]
    pub fn start(&mut self, e: &StartEvent) {
        dispatch!(self, on_start, e);
    }

    /// Emits an [`AttachEvent`].
    #[inline]
    pub fn attach(&mut self, e: &AttachEvent) {
        dispatch!(self, on_attach, e);
    }

    /// Emits a [`TransitionEvent`].
    #[inline]
    pub fn transition(&mut self, e: &TransitionEvent) {
        dispatch!(self, on_transition, e);
    }

    /// Emits a [`LoadEvent`].
    #[inline]
    pub fn load_begin(&mut self, e: &LoadEvent) {
        dispatch!(self, on_load_begin, e);
    }

    /// Emits a [`DispatchEvent`].
    #[inline]
    pub fn dispatch(&mut self, e: &DispatchEvent<'_>) {
        dispatch!(self, on_dispatch, e);
    }

    /// Emits a [`ReleaseEvent`].
    #[inline]
    pub fn release(&mut self, e: &ReleaseEvent) {
        dispatch!(self, on_release, e);
    }

    /// Emits a [`SetupFailedEvent`].
    #[inline]
    pub fn setup_failed(&mut self, e: &SetupFailedEvent<'_>) {
        dispatch!(self, on_setup_failed, e);
    }

    /// Emits a [`StopEvent`].
    #[inline]
    pub fn stop(&mut self, e: &StopEvent) {
        dispatch!(self, on_stop, e);
    }

    /// Emits a [`BatchSummary`].
    #[inline]
    pub fn batch_summary(&mut self, s: &BatchSummary) {
        dispatch!(self, on_batch_summary, s);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transition() -> TransitionEvent {
        TransitionEvent {
            batch_index: 3,
            element: WatchId(1),
            ratio: 0.5,
            visibility: Visibility::Visible,
            state: ElementState::Visible,
        }
    }

    #[test]
    fn watch_id_saturates() {
        assert_eq!(WatchId::from_index(4), WatchId(4));
        assert_eq!(WatchId::from_index(usize::MAX), WatchId(u32::MAX));
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_transition(&sample_transition());
        sink.on_batch_summary(&BatchSummary::default());
        sink.on_setup_failed(&SetupFailedEvent { reason: "nope" });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.transition(&sample_transition());
        tracer.batch_summary(&BatchSummary::default());
        assert!(tracer.take_sink().is_none());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::rc::Rc;
        use alloc::vec::Vec;
        use core::cell::RefCell;

        struct RecordingSink {
            batches: Rc<RefCell<Vec<u64>>>,
        }
        impl TraceSink for RecordingSink {
            fn on_transition(&mut self, e: &TransitionEvent) {
                self.batches.borrow_mut().push(e.batch_index);
            }
        }

        let batches = Rc::new(RefCell::new(Vec::new()));
        let mut tracer = Tracer::new(Box::new(RecordingSink {
            batches: Rc::clone(&batches),
        }));
        tracer.transition(&sample_transition());
        assert_eq!(*batches.borrow(), [3]);
        assert!(tracer.take_sink().is_some());
    }
}
