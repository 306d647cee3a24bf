// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser tests. Run with `wasm-pack test --headless --firefox glance_web`.

#![cfg(target_arch = "wasm32")]

use glance_core::host::{Dom as _, Host as _};
use glance_core::{ConfigError, Error, Observer, Overrides, RegistrationError, Target};
use glance_web::{WebHost, WebObserver, default_observer, overrides_from_js};
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

wasm_bindgen_test_configure!(run_in_browser);

fn params(pairs: &[(&str, JsValue)]) -> JsValue {
    let object = Object::new();
    for (key, value) in pairs {
        Reflect::set(&object, &JsValue::from_str(key), value).unwrap();
    }
    object.into()
}

#[wasm_bindgen_test]
fn js_params_are_validated() {
    let overrides = overrides_from_js(&params(&[
        ("returns", JsValue::TRUE),
        ("percentObserve", JsValue::from_f64(0.3)),
    ]))
    .unwrap();
    assert!(overrides.config().returns);
    assert_eq!(overrides.config().percent_observe, 0.3);

    let err = overrides_from_js(&params(&[("percent", JsValue::from_f64(1.0))])).unwrap_err();
    assert_eq!(err, ConfigError::UnknownOption("percent".into()));

    assert!(overrides_from_js(&JsValue::UNDEFINED).unwrap().is_empty());
}

#[wasm_bindgen_test]
fn dataset_round_trips_through_attributes() {
    let host = WebHost::detect().unwrap();
    let element = host.document().create_element("img").unwrap();
    host.set_data(&element, "dataAttrObserve", "vis");
    assert_eq!(
        element.get_attribute("data-data-attr-observe").as_deref(),
        Some("vis")
    );
    assert_eq!(host.data(&element, "dataAttrObserve").as_deref(), Some("vis"));
    host.remove_data(&element, "dataAttrObserve");
    assert_eq!(host.data(&element, "dataAttrObserve"), None);
}

#[wasm_bindgen_test]
fn start_marks_registered_elements() {
    let host = WebHost::detect().unwrap();
    let document = host.document();
    let wrap = document.create_element("figure").unwrap();
    let img = document.create_element("img").unwrap();
    wrap.append_child(&img).unwrap();
    document.body().unwrap().append_child(&wrap).unwrap();

    let overrides = Overrides::from_preset_str("classes.lazy").unwrap();
    let observer = Observer::<WebHost>::new(host.clone(), overrides).unwrap();
    observer.register_one(Target::Element(img.clone()));
    let _ready = observer.start();

    assert!(img.class_list().contains("ob"));
    assert!(img.class_list().contains("ob-load"));
    assert!(wrap.class_list().contains("ob-load-wrap"));
    assert!(observer.is_watching());
    assert!(host.viewport_height().is_some());

    observer.stop();
    wrap.remove();
}

#[wasm_bindgen_test]
fn non_function_callback_is_not_callable() {
    let observer = WebObserver::new(JsValue::UNDEFINED).unwrap();
    let err = observer
        .create_callback("hero", JsValue::from_f64(1.0))
        .unwrap_err();
    assert_eq!(
        err.0,
        Error::InvalidCallbackRegistration(RegistrationError::NotCallable)
    );

    let err = observer
        .create_callback("", Function::new_no_args("").into())
        .unwrap_err();
    assert_eq!(
        err.0,
        Error::InvalidCallbackRegistration(RegistrationError::EmptyName)
    );
}

#[wasm_bindgen_test]
fn delete_removes_registration_once() {
    let observer = WebObserver::new(JsValue::UNDEFINED).unwrap();
    let mut disposer = observer
        .create_callback("hero", Function::new_no_args("").into())
        .unwrap();
    assert_eq!(observer.inner().with_session(|s| s.callback_count()), 1);

    assert!(disposer.dispose());
    assert!(!disposer.dispose());
    assert_eq!(observer.inner().with_session(|s| s.callback_count()), 0);
}

#[wasm_bindgen_test]
fn default_observer_is_created_once() {
    let first = default_observer().unwrap();
    let second = default_observer().unwrap();
    let _disposer = first
        .create_callback("shared", Function::new_no_args("").into())
        .unwrap();
    assert_eq!(second.inner().with_session(|s| s.callback_count()), 1);

    let config = second.inner().config();
    assert!(config.set_class_mode && config.callback_mode && config.lazy_mode);
    first.disconnect();
}

#[wasm_bindgen_test]
fn static_presets_configure_their_toggles() {
    let config = WebObserver::callback_once().unwrap().inner().config();
    assert!(config.callback_mode && config.callback_once);

    let config = WebObserver::zero().unwrap().inner().config();
    assert_eq!(config.percent_observe, 0.0);

    let config = WebObserver::infinity().unwrap().inner().config();
    assert!(config.returns);

    let err = WebObserver::from_toggles("classes.sometimes").unwrap_err();
    assert_eq!(
        err.0,
        Error::InvalidConfiguration(ConfigError::UnknownToggle("sometimes".into()))
    );
}
