// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reading overrides from a JavaScript options object.

use glance_core::{ConfigError, OptionKey, OptionValue, Overrides};
use js_sys::{Array, Object};
use wasm_bindgen::{JsCast as _, JsValue};

/// Converts a JS primitive to an option value.
///
/// Returns `None` for anything that is not a boolean, number, or string.
pub(crate) fn option_value(value: &JsValue) -> Option<OptionValue> {
    if let Some(flag) = value.as_bool() {
        Some(OptionValue::Bool(flag))
    } else if let Some(number) = value.as_f64() {
        Some(OptionValue::Number(number))
    } else {
        value.as_string().map(OptionValue::Text)
    }
}

/// Builds overrides from the own enumerable properties of `params`.
///
/// `undefined`, `null`, and other non-objects yield empty overrides.
///
/// # Errors
///
/// Fails on the first unknown key or on a value of the wrong kind.
pub fn overrides_from_js(params: &JsValue) -> Result<Overrides, ConfigError> {
    let mut overrides = Overrides::new();
    if !params.is_object() {
        return Ok(overrides);
    }
    for entry in Object::entries(params.unchecked_ref()).iter() {
        let pair: Array = entry.unchecked_into();
        let name = pair.get(0).as_string().unwrap_or_default();
        let key: OptionKey = name.parse()?;
        let Some(value) = option_value(&pair.get(1)) else {
            return Err(ConfigError::MismatchedValue {
                option: key,
                expected: key.kind(),
            });
        };
        overrides.set_option(key, value)?;
    }
    Ok(overrides)
}
