// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and recording for Glance session traces.
//!
//! This crate provides [`TraceSink`](glance_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: in-memory records with JSON-lines export.

pub mod pretty;
pub mod recorder;
