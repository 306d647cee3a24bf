// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types and session logic for viewport visibility tracking.
//!
//! `glance_core` watches a set of elements through a host-provided
//! intersection primitive and drives three optional behaviors per element:
//! deferred resource loading, CSS state toggling, and named callbacks. It is
//! `no_std` compatible (with `alloc`) and never touches a browser API
//! directly; every I/O concern goes through the [`host`] traits.
//!
//! # Architecture
//!
//! ```text
//!   Overrides ──► Config ──► ObservePolicy (margin, threshold)
//!                                 │
//!   Observer::start() ──► Host::subscribe() ──► Subscription
//!                                                   │
//!                 ┌─────────── signal batch ────────┘
//!                 ▼
//!   Session::handle_batch() ──► evaluate() ──► Plan
//!                 │                              │
//!                 │   classes, markers, detach ◄─┘
//!                 ▼
//!   Dispatch::run() (after the session borrow is released)
//! ```
//!
//! **[`config`]**: Recognized options, defaults, validated [`Overrides`],
//! and the derived [`ObservePolicy`].
//!
//! **[`preset`]**: Named toggles (`classes.callback.lazy`) that expand to
//! override sets.
//!
//! **[`host`]**: The [`Dom`](host::Dom), [`Host`](host::Host), and
//! [`Subscription`](host::Subscription) capabilities a platform provides.
//!
//! **[`session`]**: Owns registered elements, callbacks, and the single
//! active subscription.
//!
//! **[`evaluate`]**: Pure per-signal transition logic.
//!
//! **[`observer`]**: Shared, re-entrant handle over a session.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and session events.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` dispatch to an installed
//!   sink.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod error;
pub mod evaluate;
pub mod host;
pub mod observer;
pub mod preset;
pub mod ready;
pub mod registry;
pub mod session;
pub mod trace;

pub use config::{Config, ObservePolicy, OptionKey, OptionValue, Overrides, ValueKind};
pub use error::{ConfigError, Error, RegistrationError, SetupError};
pub use evaluate::{ElementState, Visibility};
pub use host::{Dom, Host, Signal, Subscription};
pub use observer::{Disposer, Observer};
pub use preset::{Preset, Toggle, parse_toggles};
pub use ready::Ready;
pub use registry::{Callback, RegistrationToken, VisibilityEvent};
pub use session::{Dispatch, Session, Target, Targets};
