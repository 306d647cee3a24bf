// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observation options, caller overrides, and the derived policy.
//!
//! A [`Config`] is always complete: every option has a default, and
//! [`Overrides`] only records the options a caller changed. String-keyed
//! overrides are validated against the fixed [`OptionKey`] set, so a typo in
//! an option name fails at construction instead of being silently ignored.
//!
//! The [`ObservePolicy`] is what the host subscription actually consumes: a
//! visibility threshold and an inward margin derived from the viewport height.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::error::ConfigError;

/// Complete, immutable observation settings.
///
/// Build one through [`Overrides`] (validated, string-keyed or typed) or by
/// assigning fields on [`Config::default`].
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Fraction of the viewport height used as an inward margin.
    ///
    /// `0.0` triggers exactly at the viewport edge; larger values make an
    /// element travel further into the viewport before it counts as visible.
    pub percent_observe: f64,
    /// The intersection ratio must be strictly greater than this to count as
    /// visible.
    pub threshold: f64,
    /// Keep watching after the first visible transition.
    pub returns: bool,
    /// Dispatch visibility changes to registered callbacks.
    pub callback_mode: bool,
    /// Wrap registered callbacks so each runs at most once.
    pub callback_once: bool,
    /// Reflect visibility through classes and the tri-state data attribute.
    pub set_class_mode: bool,
    /// Swap deferred resource references in on first visibility.
    pub lazy_mode: bool,
    /// Class added to every element when watching starts.
    pub observe_class: String,
    /// Class added while an element is visible.
    pub observed_class: String,
    /// Dataset key of the tri-state visibility attribute.
    pub data_attr_observe: String,
    /// Value of the tri-state attribute before the element was seen.
    pub data_attr_start_value: String,
    /// Value of the tri-state attribute while the element is visible.
    pub data_attr_complete_value: String,
    /// Class added to a lazy element while its resource is pending.
    pub img_load_class: String,
    /// Class added to a lazy element's parent while its resource is pending.
    pub img_wrap_load_class: String,
    /// Class added to a lazy element once its resource has loaded.
    pub img_load_complete: String,
    /// Class added to a lazy element's parent once its resource has loaded.
    pub img_wrap_load_complete: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            percent_observe: 0.15,
            threshold: 0.01,
            returns: false,
            callback_mode: false,
            callback_once: false,
            set_class_mode: false,
            lazy_mode: false,
            observe_class: "ob".into(),
            observed_class: "vis".into(),
            data_attr_observe: "observe".into(),
            data_attr_start_value: String::new(),
            data_attr_complete_value: "vis".into(),
            img_load_class: "ob-load".into(),
            img_wrap_load_class: "ob-load-wrap".into(),
            img_load_complete: "ob-load-c".into(),
            img_wrap_load_complete: "ob-load-wrap-c".into(),
        }
    }
}

impl Config {
    /// Returns the current value of `key`.
    #[must_use]
    pub fn value(&self, key: OptionKey) -> OptionValue {
        match key {
            OptionKey::PercentObserve => OptionValue::Number(self.percent_observe),
            OptionKey::Threshold => OptionValue::Number(self.threshold),
            OptionKey::Returns => OptionValue::Bool(self.returns),
            OptionKey::CallbackMode => OptionValue::Bool(self.callback_mode),
            OptionKey::CallbackOnce => OptionValue::Bool(self.callback_once),
            OptionKey::SetClassMode => OptionValue::Bool(self.set_class_mode),
            OptionKey::LazyMode => OptionValue::Bool(self.lazy_mode),
            _ => OptionValue::Text(self.text(key).map(String::as_str).unwrap_or_default().into()),
        }
    }

    /// Assigns `value` to `key`, rejecting a value of the wrong kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MismatchedValue`] if the value kind does not
    /// match [`OptionKey::kind`].
    pub fn assign(&mut self, key: OptionKey, value: OptionValue) -> Result<(), ConfigError> {
        let mismatch = ConfigError::MismatchedValue {
            option: key,
            expected: key.kind(),
        };
        match value {
            OptionValue::Number(n) => *self.number_mut(key).ok_or(mismatch)? = n,
            OptionValue::Bool(b) => *self.flag_mut(key).ok_or(mismatch)? = b,
            OptionValue::Text(t) => *self.text_mut(key).ok_or(mismatch)? = t,
        }
        Ok(())
    }

    fn number_mut(&mut self, key: OptionKey) -> Option<&mut f64> {
        match key {
            OptionKey::PercentObserve => Some(&mut self.percent_observe),
            OptionKey::Threshold => Some(&mut self.threshold),
            _ => None,
        }
    }

    fn flag_mut(&mut self, key: OptionKey) -> Option<&mut bool> {
        match key {
            OptionKey::Returns => Some(&mut self.returns),
            OptionKey::CallbackMode => Some(&mut self.callback_mode),
            OptionKey::CallbackOnce => Some(&mut self.callback_once),
            OptionKey::SetClassMode => Some(&mut self.set_class_mode),
            OptionKey::LazyMode => Some(&mut self.lazy_mode),
            _ => None,
        }
    }

    fn text(&self, key: OptionKey) -> Option<&String> {
        match key {
            OptionKey::ObserveClass => Some(&self.observe_class),
            OptionKey::ObservedClass => Some(&self.observed_class),
            OptionKey::DataAttrObserve => Some(&self.data_attr_observe),
            OptionKey::DataAttrStartValue => Some(&self.data_attr_start_value),
            OptionKey::DataAttrCompleteValue => Some(&self.data_attr_complete_value),
            OptionKey::ImgLoadClass => Some(&self.img_load_class),
            OptionKey::ImgWrapLoadClass => Some(&self.img_wrap_load_class),
            OptionKey::ImgLoadComplete => Some(&self.img_load_complete),
            OptionKey::ImgWrapLoadComplete => Some(&self.img_wrap_load_complete),
            _ => None,
        }
    }

    fn text_mut(&mut self, key: OptionKey) -> Option<&mut String> {
        match key {
            OptionKey::ObserveClass => Some(&mut self.observe_class),
            OptionKey::ObservedClass => Some(&mut self.observed_class),
            OptionKey::DataAttrObserve => Some(&mut self.data_attr_observe),
            OptionKey::DataAttrStartValue => Some(&mut self.data_attr_start_value),
            OptionKey::DataAttrCompleteValue => Some(&mut self.data_attr_complete_value),
            OptionKey::ImgLoadClass => Some(&mut self.img_load_class),
            OptionKey::ImgWrapLoadClass => Some(&mut self.img_wrap_load_class),
            OptionKey::ImgLoadComplete => Some(&mut self.img_load_complete),
            OptionKey::ImgWrapLoadComplete => Some(&mut self.img_wrap_load_complete),
            _ => None,
        }
    }
}

/// The recognized option names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionKey {
    /// `percentObserve`
    PercentObserve,
    /// `threshold`
    Threshold,
    /// `returns`
    Returns,
    /// `callbackMode`
    CallbackMode,
    /// `callbackOnce`
    CallbackOnce,
    /// `setClassMode`
    SetClassMode,
    /// `lazyMode`
    LazyMode,
    /// `observeClass`
    ObserveClass,
    /// `observedClass`
    ObservedClass,
    /// `dataAttrObserve`
    DataAttrObserve,
    /// `dataAttrStartValue`
    DataAttrStartValue,
    /// `dataAttrCompleteValue`
    DataAttrCompleteValue,
    /// `imgLoadClass`
    ImgLoadClass,
    /// `imgWrapLoadClass`
    ImgWrapLoadClass,
    /// `imgLoadComplete`
    ImgLoadComplete,
    /// `imgWrapLoadComplete`
    ImgWrapLoadComplete,
}

impl OptionKey {
    /// Every recognized option, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::PercentObserve,
        Self::Threshold,
        Self::Returns,
        Self::CallbackMode,
        Self::CallbackOnce,
        Self::SetClassMode,
        Self::LazyMode,
        Self::ObserveClass,
        Self::ObservedClass,
        Self::DataAttrObserve,
        Self::DataAttrStartValue,
        Self::DataAttrCompleteValue,
        Self::ImgLoadClass,
        Self::ImgWrapLoadClass,
        Self::ImgLoadComplete,
        Self::ImgWrapLoadComplete,
    ];

    /// Returns the external (camelCase) option name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PercentObserve => "percentObserve",
            Self::Threshold => "threshold",
            Self::Returns => "returns",
            Self::CallbackMode => "callbackMode",
            Self::CallbackOnce => "callbackOnce",
            Self::SetClassMode => "setClassMode",
            Self::LazyMode => "lazyMode",
            Self::ObserveClass => "observeClass",
            Self::ObservedClass => "observedClass",
            Self::DataAttrObserve => "dataAttrObserve",
            Self::DataAttrStartValue => "dataAttrStartValue",
            Self::DataAttrCompleteValue => "dataAttrCompleteValue",
            Self::ImgLoadClass => "imgLoadClass",
            Self::ImgWrapLoadClass => "imgWrapLoadClass",
            Self::ImgLoadComplete => "imgLoadComplete",
            Self::ImgWrapLoadComplete => "imgWrapLoadComplete",
        }
    }

    /// Returns the kind of value this option accepts.
    #[must_use]
    pub const fn kind(self) -> ValueKind {
        match self {
            Self::PercentObserve | Self::Threshold => ValueKind::Number,
            Self::Returns
            | Self::CallbackMode
            | Self::CallbackOnce
            | Self::SetClassMode
            | Self::LazyMode => ValueKind::Bool,
            _ => ValueKind::Text,
        }
    }
}

impl FromStr for OptionKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownOption(s.into()))
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The kind of value an option accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A fraction.
    Number,
    /// A switch.
    Bool,
    /// A class name, attribute name, or attribute value.
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::Text => "string",
        })
    }
}

/// A dynamically typed option value.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    /// A fraction.
    Number(f64),
    /// A switch.
    Bool(bool),
    /// A class name, attribute name, or attribute value.
    Text(String),
}

impl OptionValue {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::Bool(_) => ValueKind::Bool,
            Self::Text(_) => ValueKind::Text,
        }
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Caller-provided changes on top of the default [`Config`].
///
/// Every setter validates eagerly, so an `Overrides` value only ever holds
/// recognized options with correctly typed values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overrides {
    config: Config,
    provided: Vec<OptionKey>,
}

impl Overrides {
    /// Creates an empty override set (all defaults).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an override set from `(name, value)` pairs.
    ///
    /// # Errors
    ///
    /// Fails with the first unknown option name or mismatched value.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self, ConfigError>
    where
        K: AsRef<str>,
        V: Into<OptionValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut overrides = Self::new();
        for (key, value) in pairs {
            overrides.set(key.as_ref(), value)?;
        }
        Ok(overrides)
    }

    /// Sets the option named `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownOption`] if `key` is not recognized, or
    /// [`ConfigError::MismatchedValue`] if the value has the wrong kind.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<OptionValue>,
    ) -> Result<&mut Self, ConfigError> {
        self.set_option(key.parse()?, value.into())
    }

    /// Sets a typed option.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MismatchedValue`] if the value has the wrong
    /// kind.
    pub fn set_option(
        &mut self,
        key: OptionKey,
        value: OptionValue,
    ) -> Result<&mut Self, ConfigError> {
        self.config.assign(key, value)?;
        self.mark(key);
        Ok(self)
    }

    /// Consuming variant of [`set`](Self::set) for builder-style chains.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set).
    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Result<Self, ConfigError> {
        self.set(key, value)?;
        Ok(self)
    }

    /// Returns the options that were explicitly provided, in first-set order.
    #[must_use]
    pub fn provided(&self) -> &[OptionKey] {
        &self.provided
    }

    /// Returns `true` if no option was provided.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.provided.is_empty()
    }

    /// Returns the merged configuration (defaults plus overrides).
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consumes the overrides and returns the merged configuration.
    #[must_use]
    pub fn into_config(self) -> Config {
        self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub(crate) fn mark(&mut self, key: OptionKey) {
        if !self.provided.contains(&key) {
            self.provided.push(key);
        }
    }
}

/// Threshold and margin handed to the host subscription.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObservePolicy {
    /// Minimum visible ratio (exclusive) for a visible transition.
    pub threshold: f64,
    /// Inward inset in whole pixels, applied on every side of the viewport.
    pub margin_px: u32,
}

impl ObservePolicy {
    /// Derives the policy for a viewport of `viewport_height` pixels.
    ///
    /// The margin is `floor(viewport_height * percent_observe)`. Negative or
    /// non-finite products yield a zero margin.
    #[must_use]
    pub fn derive(config: &Config, viewport_height: f64) -> Self {
        let inset = viewport_height * config.percent_observe;
        #[expect(
            clippy::cast_possible_truncation,
            reason = "`as` saturates and truncates toward zero, which is floor here"
        )]
        let margin_px = inset as u32;
        Self {
            threshold: config.threshold,
            margin_px,
        }
    }

    /// Returns the margin as a CSS root-margin string (`-{margin}px`).
    #[must_use]
    pub fn root_margin(&self) -> String {
        format!("-{}px", self.margin_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_yield_defaults() {
        let overrides = Overrides::new();
        assert!(overrides.is_empty());
        assert_eq!(overrides.config(), &Config::default());
    }

    #[test]
    fn every_recognized_key_parses() {
        for key in OptionKey::ALL {
            assert_eq!(key.name().parse::<OptionKey>(), Ok(key));
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = Overrides::new().set("percent", 0.5).unwrap_err();
        assert_eq!(err, ConfigError::UnknownOption("percent".into()));

        let err = Overrides::from_pairs([
            ("returns", OptionValue::Bool(true)),
            ("lazy", true.into()),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::UnknownOption("lazy".into()));
    }

    #[test]
    fn key_names_are_case_sensitive() {
        assert!("SetClassMode".parse::<OptionKey>().is_err());
        assert!("set_class_mode".parse::<OptionKey>().is_err());
    }

    #[test]
    fn mismatched_value_is_rejected() {
        let err = Overrides::new().set("returns", "yes").unwrap_err();
        assert_eq!(
            err,
            ConfigError::MismatchedValue {
                option: OptionKey::Returns,
                expected: ValueKind::Bool,
            }
        );
    }

    #[test]
    fn overrides_merge_over_defaults() {
        let overrides = Overrides::new()
            .with("setClassMode", true)
            .and_then(|o| o.with("observedClass", "seen"))
            .and_then(|o| o.with("threshold", 0.25))
            .unwrap();
        let config = overrides.into_config();

        assert!(config.set_class_mode);
        assert_eq!(config.observed_class, "seen");
        assert_eq!(config.threshold, 0.25);
        // Untouched options keep their defaults.
        assert_eq!(config.observe_class, "ob");
        assert_eq!(config.percent_observe, 0.15);
        assert!(!config.returns);
    }

    #[test]
    fn provided_keys_are_recorded_once() {
        let mut overrides = Overrides::new();
        overrides.set("returns", true).unwrap();
        overrides.set("lazyMode", true).unwrap();
        overrides.set("returns", false).unwrap();
        assert_eq!(
            overrides.provided(),
            &[OptionKey::Returns, OptionKey::LazyMode]
        );
        assert!(!overrides.config().returns);
    }

    #[test]
    fn value_round_trips_through_assign() {
        let mut config = Config::default();
        for key in OptionKey::ALL {
            let value = config.value(key);
            assert_eq!(value.kind(), key.kind(), "kind of {key}");
            config.assign(key, value).unwrap();
        }
        assert_eq!(config, Config::default());
    }

    #[test]
    fn margin_is_floor_of_height_times_percent() {
        let mut config = Config::default();
        let policy = ObservePolicy::derive(&config, 800.0);
        // 800 * 0.15 = 120
        assert_eq!(policy.margin_px, 120);
        assert_eq!(policy.threshold, 0.01);

        config.percent_observe = 0.33;
        let policy = ObservePolicy::derive(&config, 777.0);
        // 777 * 0.33 = 256.41
        assert_eq!(policy.margin_px, 256);
        assert_eq!(policy.root_margin(), "-256px");
    }

    #[test]
    fn zero_percent_yields_zero_margin() {
        let config = Config {
            percent_observe: 0.0,
            ..Config::default()
        };
        let policy = ObservePolicy::derive(&config, 1080.0);
        assert_eq!(policy.margin_px, 0);
        assert_eq!(policy.root_margin(), "-0px");
    }

    #[test]
    fn negative_product_clamps_to_zero() {
        let config = Config {
            percent_observe: -0.5,
            ..Config::default()
        };
        assert_eq!(ObservePolicy::derive(&config, 600.0).margin_px, 0);
    }
}
