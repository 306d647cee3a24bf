// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Preset toggles.
//!
//! A preset is a dot-separated list of toggle names such as
//! `"classes.callback.lazy"`. Each [`Toggle`] sets exactly one option, so a
//! preset is only a shorthand for an [`Overrides`] value and goes through the
//! same validated configuration path.

use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::config::{OptionKey, Overrides};
use crate::error::ConfigError;

/// A single named preset toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Toggle {
    /// `percentObserve = 0`
    Zero,
    /// `returns = true`
    Infinity,
    /// `callbackMode = true`
    Callback,
    /// `setClassMode = true`
    Classes,
    /// `lazyMode = true`
    Lazy,
    /// `callbackOnce = true`
    Once,
}

impl Toggle {
    /// Every toggle.
    pub const ALL: [Self; 6] = [
        Self::Zero,
        Self::Infinity,
        Self::Callback,
        Self::Classes,
        Self::Lazy,
        Self::Once,
    ];

    /// Returns the token that names this toggle.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::Infinity => "infinity",
            Self::Callback => "callback",
            Self::Classes => "classes",
            Self::Lazy => "lazy",
            Self::Once => "once",
        }
    }

    /// Returns the option this toggle sets.
    #[must_use]
    pub const fn option(self) -> OptionKey {
        match self {
            Self::Zero => OptionKey::PercentObserve,
            Self::Infinity => OptionKey::Returns,
            Self::Callback => OptionKey::CallbackMode,
            Self::Classes => OptionKey::SetClassMode,
            Self::Lazy => OptionKey::LazyMode,
            Self::Once => OptionKey::CallbackOnce,
        }
    }

    fn apply(self, overrides: &mut Overrides) {
        let config = overrides.config_mut();
        match self {
            Self::Zero => config.percent_observe = 0.0,
            Self::Infinity => config.returns = true,
            Self::Callback => config.callback_mode = true,
            Self::Classes => config.set_class_mode = true,
            Self::Lazy => config.lazy_mode = true,
            Self::Once => config.callback_once = true,
        }
        overrides.mark(self.option());
    }
}

impl FromStr for Toggle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|toggle| toggle.name() == s)
            .ok_or_else(|| ConfigError::UnknownToggle(s.into()))
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses a dot-separated toggle list.
///
/// Surrounding whitespace and empty segments are ignored, so `" classes..lazy "`
/// is the same as `"classes.lazy"`. Whitespace is trimmed around each token
/// too, so `"classes. lazy"` is accepted rather than rejected as an unknown
/// `" lazy"` toggle.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownToggle`] for the first unrecognized token.
pub fn parse_toggles(tokens: &str) -> Result<Vec<Toggle>, ConfigError> {
    tokens
        .trim()
        .split('.')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Toggle::from_str)
        .collect()
}

impl Overrides {
    /// Builds overrides from an ordered list of toggles.
    #[must_use]
    pub fn from_toggles(toggles: &[Toggle]) -> Self {
        let mut overrides = Self::new();
        for toggle in toggles {
            toggle.apply(&mut overrides);
        }
        overrides
    }

    /// Builds overrides from a dot-separated toggle list.
    ///
    /// # Errors
    ///
    /// See [`parse_toggles`].
    pub fn from_preset_str(tokens: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_toggles(&parse_toggles(tokens)?))
    }
}

/// The named, ready-made presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    /// `classes.callback.lazy`
    Default,
    /// `zero`
    Zero,
    /// `infinity`
    Infinity,
    /// `callback`
    Callback,
    /// `callback.once`
    CallbackOnce,
    /// `callback.infinity`
    CallbackInfinity,
    /// `classes`
    Classes,
    /// `lazy`
    Lazy,
}

impl Preset {
    /// Returns the toggles this preset expands to.
    #[must_use]
    pub const fn toggles(self) -> &'static [Toggle] {
        match self {
            Self::Default => &[Toggle::Classes, Toggle::Callback, Toggle::Lazy],
            Self::Zero => &[Toggle::Zero],
            Self::Infinity => &[Toggle::Infinity],
            Self::Callback => &[Toggle::Callback],
            Self::CallbackOnce => &[Toggle::Callback, Toggle::Once],
            Self::CallbackInfinity => &[Toggle::Callback, Toggle::Infinity],
            Self::Classes => &[Toggle::Classes],
            Self::Lazy => &[Toggle::Lazy],
        }
    }

    /// Returns the overrides this preset expands to.
    #[must_use]
    pub fn overrides(self) -> Overrides {
        Overrides::from_toggles(self.toggles())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn preset_equals_manual_overrides() {
        let from_preset = Overrides::from_preset_str("classes.callback.lazy")
            .unwrap()
            .into_config();
        let manual = Overrides::new()
            .with("setClassMode", true)
            .and_then(|o| o.with("callbackMode", true))
            .and_then(|o| o.with("lazyMode", true))
            .unwrap()
            .into_config();
        assert_eq!(from_preset, manual);
        assert_eq!(Preset::Default.overrides().into_config(), manual);
    }

    #[test]
    fn each_toggle_sets_exactly_one_option() {
        let defaults = Config::default();
        for toggle in Toggle::ALL {
            let overrides = Overrides::from_toggles(&[toggle]);
            assert_eq!(overrides.provided(), &[toggle.option()]);
            let config = overrides.config();
            for key in OptionKey::ALL {
                if key == toggle.option() {
                    assert_ne!(config.value(key), defaults.value(key), "{toggle} changes {key}");
                } else {
                    assert_eq!(config.value(key), defaults.value(key), "{toggle} leaves {key}");
                }
            }
        }
    }

    #[test]
    fn zero_clears_percent_observe() {
        let config = Preset::Zero.overrides().into_config();
        assert_eq!(config.percent_observe, 0.0);
    }

    #[test]
    fn unknown_token_is_rejected() {
        assert_eq!(
            parse_toggles("classes.forever"),
            Err(ConfigError::UnknownToggle("forever".into()))
        );
    }

    #[test]
    fn whitespace_and_empty_segments_are_ignored() {
        assert_eq!(
            parse_toggles("  callback..once. "),
            Ok(alloc::vec![Toggle::Callback, Toggle::Once])
        );
        assert_eq!(parse_toggles(""), Ok(alloc::vec![]));
        assert_eq!(
            parse_toggles("classes. lazy"),
            Ok(alloc::vec![Toggle::Classes, Toggle::Lazy])
        );
    }

    #[test]
    fn named_presets_match_their_strings() {
        let cases = [
            (Preset::Default, "classes.callback.lazy"),
            (Preset::Zero, "zero"),
            (Preset::Infinity, "infinity"),
            (Preset::Callback, "callback"),
            (Preset::CallbackOnce, "callback.once"),
            (Preset::CallbackInfinity, "callback.infinity"),
            (Preset::Classes, "classes"),
            (Preset::Lazy, "lazy"),
        ];
        for (preset, tokens) in cases {
            assert_eq!(parse_toggles(tokens).unwrap(), preset.toggles(), "{preset:?}");
        }
    }
}
