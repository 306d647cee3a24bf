// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Configuration, registration, and environment errors are raised
//! synchronously. [`Error::ObservationSetupFailed`] and [`Error::Stopped`]
//! surface through the [`Ready`](crate::ready::Ready) future returned by
//! `start()`. Everything else (a missing callback, a disabled mode, an
//! unknown element) is ordinary control flow and never produces an error.

use alloc::string::String;
use core::fmt;

use crate::config::{OptionKey, ValueKind};

/// Errors produced by the visibility core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The host cannot report a viewport, so nothing can be observed.
    UnsupportedEnvironment,
    /// An override or preset token was rejected.
    InvalidConfiguration(ConfigError),
    /// A callback registration was rejected.
    InvalidCallbackRegistration(RegistrationError),
    /// The host failed to create the intersection subscription.
    ObservationSetupFailed(SetupError),
    /// The session was stopped or restarted before it became ready.
    Stopped,
}

/// Why a configuration was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The key is not a recognized option name.
    UnknownOption(String),
    /// The token is not a recognized preset toggle.
    UnknownToggle(String),
    /// The value kind does not match the option.
    MismatchedValue {
        /// The option that received the value.
        option: OptionKey,
        /// The kind the option accepts.
        expected: ValueKind,
    },
}

/// Why a callback registration was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    /// The callback name was empty.
    EmptyName,
    /// The supplied handler cannot be called.
    NotCallable,
}

/// A host-reported failure while creating a subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupError(String);

impl SetupError {
    /// Creates a setup error with a host-specific description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Returns the host-specific description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedEnvironment => {
                f.write_str("no viewport available: visibility tracking needs a DOM host")
            }
            Self::InvalidConfiguration(err) => write!(f, "invalid configuration: {err}"),
            Self::InvalidCallbackRegistration(err) => {
                write!(f, "invalid callback registration: {err}")
            }
            Self::ObservationSetupFailed(err) => {
                write!(f, "intersection observer setup failed: {err}")
            }
            Self::Stopped => f.write_str("observation stopped before it became ready"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOption(key) => write!(f, "`{key}` is not a valid option"),
            Self::UnknownToggle(token) => write!(f, "`{token}` is not a valid preset toggle"),
            Self::MismatchedValue { option, expected } => {
                write!(f, "`{}` expects a {expected} value", option.name())
            }
        }
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => f.write_str("callback name must not be empty"),
            Self::NotCallable => f.write_str("callback must be a function"),
        }
    }
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::InvalidConfiguration(err) => Some(err),
            Self::InvalidCallbackRegistration(err) => Some(err),
            Self::ObservationSetupFailed(err) => Some(err),
            Self::UnsupportedEnvironment | Self::Stopped => None,
        }
    }
}

impl core::error::Error for ConfigError {}
impl core::error::Error for RegistrationError {}
impl core::error::Error for SetupError {}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfiguration(err)
    }
}

impl From<RegistrationError> for Error {
    fn from(err: RegistrationError) -> Self {
        Self::InvalidCallbackRegistration(err)
    }
}

impl From<SetupError> for Error {
    fn from(err: SetupError) -> Self {
        Self::ObservationSetupFailed(err)
    }
}
