// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scrolling gallery of lazily loaded images.
//!
//! Every `<img>` carries its real URL in `data-lazy` and is swapped in once it
//! scrolls past the inset margin. Every fifth image also names the `counter`
//! callback, which updates a fixed HUD with the number of visible tiles.
//!
//! Build with: `wasm-pack build --target web demos/lazy_gallery`
//! Then serve `demos/lazy_gallery/` and open `index.html`.

#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glance_core::{Observer, Overrides, Targets, VisibilityEvent};
use glance_web::{ConsoleSink, WebHost};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement};

const TILES: u32 = 40;
const CALLBACK_EVERY: u32 = 5;

thread_local! {
    // The page owns the observer for its whole lifetime.
    static GALLERY: RefCell<Option<Observer<WebHost>>> = const { RefCell::new(None) };
}

fn element(document: &Document, tag: &str) -> Result<Element, JsValue> {
    document.create_element(tag)
}

fn build_gallery(document: &Document, body: &HtmlElement) -> Result<Vec<Element>, JsValue> {
    let mut images = Vec::new();
    for index in 0..TILES {
        let figure = element(document, "figure")?;
        let img = element(document, "img")?;
        img.set_attribute("alt", &format!("tile {index}"))?;
        let source = format!("https://picsum.photos/seed/glance{index}/640/400");
        img.set_attribute("data-lazy", &source)?;
        if index % CALLBACK_EVERY == 0 {
            img.set_attribute("data-callback", "counter")?;
        }
        figure.append_child(&img)?;
        body.append_child(&figure)?;
        images.push(img);
    }
    Ok(images)
}

/// Entry point for the gallery demo.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    let host = WebHost::detect().ok_or_else(|| JsValue::from_str("no document"))?;
    let document = host.document().clone();
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?;

    let hud: HtmlElement = element(&document, "div")?.unchecked_into();
    hud.style().set_css_text(
        "position: fixed; top: 12px; right: 12px; padding: 6px 10px; background: #10121f; color: #eff8ff; border-radius: 6px;",
    );
    hud.set_text_content(Some("seen: 0"));
    body.append_child(&hud)?;

    let images = build_gallery(&document, &body)?;

    let overrides = Overrides::from_preset_str("classes.callback.lazy.infinity")
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    let observer = Observer::<WebHost>::new(host, overrides)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    observer.set_trace_sink(Box::new(ConsoleSink::verbose()));

    let seen = Rc::new(Cell::new(0_u32));
    observer
        .register_callback("counter", move |event: &VisibilityEvent<Element>| {
            if event.visible {
                seen.set(seen.get() + 1);
            }
            let alt = event.target.get_attribute("alt").unwrap_or_default();
            let state = if event.visible { "in" } else { "out" };
            hud.set_text_content(Some(&format!("seen: {} ({alt} {state})", seen.get())));
        })
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    observer.register_many(Targets::Elements(images));

    let ready = observer.start();
    GALLERY.with(|slot| *slot.borrow_mut() = Some(observer));
    wasm_bindgen_futures::spawn_local(async move {
        match ready.await {
            Ok(subscription) => web_sys::console::log_2(
                &JsValue::from_str("gallery: observing with"),
                subscription.observer().as_ref(),
            ),
            Err(err) => web_sys::console::error_1(&JsValue::from_str(&err.to_string())),
        }
    });

    Ok(())
}
