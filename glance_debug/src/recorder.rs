// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording with JSON-lines export.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps every event as an owned
//! [`Record`]. [`RecorderSink::write_json_lines`] writes them out as one JSON
//! object per line, each tagged with an `"event"` field.

use std::io::{self, Write};

use glance_core::evaluate::{ElementState, Visibility};
use glance_core::trace::{
    AttachEvent, BatchSummary, DispatchEvent, LoadEvent, ReleaseEvent, SetupFailedEvent,
    StartEvent, StopEvent, TraceSink, TransitionEvent,
};
use serde_json::{Value, json};

/// One recorded event.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    /// See [`TraceSink::on_start`].
    Start(StartEvent),
    /// See [`TraceSink::on_attach`].
    Attach(AttachEvent),
    /// See [`TraceSink::on_transition`].
    Transition(TransitionEvent),
    /// See [`TraceSink::on_load_begin`].
    LoadBegin(LoadEvent),
    /// See [`TraceSink::on_dispatch`]. Owns the callback name.
    Dispatch {
        /// Element position.
        element: u32,
        /// Callback name.
        name: String,
        /// The `visible` flag.
        visible: bool,
    },
    /// See [`TraceSink::on_release`].
    Release(ReleaseEvent),
    /// See [`TraceSink::on_setup_failed`]. Owns the reason.
    SetupFailed(String),
    /// See [`TraceSink::on_stop`].
    Stop(StopEvent),
    /// See [`TraceSink::on_batch_summary`].
    BatchSummary(BatchSummary),
}

impl Record {
    /// Returns the record as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Start(e) => json!({
                "event": "start",
                "items": e.items,
                "margin_px": e.margin_px,
                "threshold": e.threshold,
            }),
            Self::Attach(e) => json!({ "event": "attach", "element": e.element.0 }),
            Self::Transition(e) => json!({
                "event": "transition",
                "batch": e.batch_index,
                "element": e.element.0,
                "ratio": e.ratio,
                "visibility": match e.visibility {
                    Visibility::Visible => "visible",
                    Visibility::Hidden => "hidden",
                },
                "state": match e.state {
                    ElementState::Attached => "attached",
                    ElementState::Visible => "visible",
                    ElementState::Hidden => "hidden",
                    ElementState::Released => "released",
                },
            }),
            Self::LoadBegin(e) => json!({ "event": "load", "element": e.element.0 }),
            Self::Dispatch {
                element,
                name,
                visible,
            } => json!({
                "event": "dispatch",
                "element": element,
                "name": name,
                "visible": visible,
            }),
            Self::Release(e) => json!({
                "event": "release",
                "batch": e.batch_index,
                "element": e.element.0,
            }),
            Self::SetupFailed(reason) => json!({ "event": "setup_failed", "reason": reason }),
            Self::Stop(e) => json!({
                "event": "stop",
                "had_subscription": e.had_subscription,
                "items": e.items,
                "callbacks": e.callbacks,
            }),
            Self::BatchSummary(s) => json!({
                "event": "batch",
                "batch": s.batch_index,
                "signals": s.signals,
                "visible": s.visible,
                "hidden": s.hidden,
                "released": s.released,
                "ignored": s.ignored,
                "dispatched": s.dispatched,
            }),
        }
    }
}

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    records: Vec<Record>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events in arrival order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the recorder and returns the recorded events.
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Writes one JSON object per record, newline-terminated.
    ///
    /// # Errors
    ///
    /// Returns any I/O or serialization error from the writer.
    pub fn write_json_lines<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for record in &self.records {
            serde_json::to_writer(&mut writer, &record.to_json())?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl TraceSink for RecorderSink {
    fn on_start(&mut self, e: &StartEvent) {
        self.records.push(Record::Start(*e));
    }

    fn on_attach(&mut self, e: &AttachEvent) {
        self.records.push(Record::Attach(*e));
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        self.records.push(Record::Transition(*e));
    }

    fn on_load_begin(&mut self, e: &LoadEvent) {
        self.records.push(Record::LoadBegin(*e));
    }

    fn on_dispatch(&mut self, e: &DispatchEvent<'_>) {
        self.records.push(Record::Dispatch {
            element: e.element.0,
            name: e.name.to_owned(),
            visible: e.visible,
        });
    }

    fn on_release(&mut self, e: &ReleaseEvent) {
        self.records.push(Record::Release(*e));
    }

    fn on_setup_failed(&mut self, e: &SetupFailedEvent<'_>) {
        self.records.push(Record::SetupFailed(e.reason.to_owned()));
    }

    fn on_stop(&mut self, e: &StopEvent) {
        self.records.push(Record::Stop(*e));
    }

    fn on_batch_summary(&mut self, s: &BatchSummary) {
        self.records.push(Record::BatchSummary(*s));
    }
}
