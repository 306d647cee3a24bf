// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use glance_core::evaluate::{ElementState, Visibility};
use glance_core::trace::{
    AttachEvent, BatchSummary, DispatchEvent, LoadEvent, ReleaseEvent, SetupFailedEvent,
    StartEvent, StopEvent, TraceSink, TransitionEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    summaries: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("summaries", &self.summaries)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            summaries: true,
        }
    }

    /// Enables or disables per-batch summary lines.
    #[must_use]
    pub fn with_summaries(mut self, summaries: bool) -> Self {
        self.summaries = summaries;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn visibility_name(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Visible => "visible",
        Visibility::Hidden => "hidden",
    }
}

fn state_name(state: ElementState) -> &'static str {
    match state {
        ElementState::Attached => "attached",
        ElementState::Visible => "visible",
        ElementState::Hidden => "hidden",
        ElementState::Released => "released",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_start(&mut self, e: &StartEvent) {
        let _ = writeln!(
            self.writer,
            "[start] items={} margin=-{}px threshold={}",
            e.items, e.margin_px, e.threshold,
        );
    }

    fn on_attach(&mut self, e: &AttachEvent) {
        let _ = writeln!(self.writer, "[attach] el={}", e.element.0);
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        let _ = writeln!(
            self.writer,
            "[signal] batch={} el={} ratio={:.3} {} -> {}",
            e.batch_index,
            e.element.0,
            e.ratio,
            visibility_name(e.visibility),
            state_name(e.state),
        );
    }

    fn on_load_begin(&mut self, e: &LoadEvent) {
        let _ = writeln!(self.writer, "[load] el={}", e.element.0);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[dispatch] el={} name={:?} visible={}",
            e.element.0, e.name, e.visible,
        );
    }

    fn on_release(&mut self, e: &ReleaseEvent) {
        let _ = writeln!(
            self.writer,
            "[release] batch={} el={}",
            e.batch_index, e.element.0,
        );
    }

    fn on_setup_failed(&mut self, e: &SetupFailedEvent<'_>) {
        let _ = writeln!(self.writer, "[setup:failed] {}", e.reason);
    }

    fn on_stop(&mut self, e: &StopEvent) {
        let _ = writeln!(
            self.writer,
            "[stop] subscription={} items={} callbacks={}",
            e.had_subscription, e.items, e.callbacks,
        );
    }

    fn on_batch_summary(&mut self, s: &BatchSummary) {
        if !self.summaries {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[batch] #{} signals={} visible={} hidden={} released={} ignored={} dispatched={}",
            s.batch_index, s.signals, s.visible, s.hidden, s.released, s.ignored, s.dispatched,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_core::trace::WatchId;

    fn output(f: impl FnOnce(&mut PrettyPrintSink<Vec<u8>>)) -> String {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        f(&mut sink);
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn transition_line() {
        let text = output(|sink| {
            sink.on_transition(&TransitionEvent {
                batch_index: 2,
                element: WatchId(5),
                ratio: 0.25,
                visibility: Visibility::Visible,
                state: ElementState::Released,
            });
        });
        assert_eq!(text, "[signal] batch=2 el=5 ratio=0.250 visible -> released\n");
    }

    #[test]
    fn dispatch_quotes_name() {
        let text = output(|sink| {
            sink.on_dispatch(&DispatchEvent {
                element: WatchId(0),
                name: "hero",
                visible: false,
            });
        });
        assert_eq!(text, "[dispatch] el=0 name=\"hero\" visible=false\n");
    }

    #[test]
    fn summaries_can_be_silenced() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new()).with_summaries(false);
        sink.on_batch_summary(&BatchSummary::default());
        sink.on_setup_failed(&SetupFailedEvent { reason: "denied" });
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "[setup:failed] denied\n");
    }
}
