//! Optional bridge to an MRAID ad container (`window.mraid`).
//!
//! Outside an ad container the bridge is empty and `open` falls back to
//! `window.open`.

use js_sys::{Function, Reflect};
use log::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

pub struct AdBridge {
    mraid: Option<JsValue>,
}

impl AdBridge {
    pub fn detect(window: &Window) -> Self {
        let mraid = Reflect::get(window, &JsValue::from_str("mraid"))
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null());
        let bridge = Self { mraid };
        if bridge.is_present() {
            bridge.hook_events();
        }
        bridge
    }

    pub fn is_present(&self) -> bool {
        self.mraid.is_some()
    }

    fn call(&self, method: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
        let mraid = self
            .mraid
            .as_ref()
            .ok_or_else(|| JsValue::from_str("mraid unavailable"))?;
        let f: Function = Reflect::get(mraid, &JsValue::from_str(method))?.dyn_into()?;
        match args {
            [] => f.call0(mraid),
            [a] => f.call1(mraid, a),
            [a, b] => f.call2(mraid, a, b),
            _ => Err(JsValue::from_str("too many arguments")),
        }
    }

    fn hook_events(&self) {
        let state = self.call("getState", &[]).ok().and_then(|v| v.as_string());
        if state.as_deref() == Some("loading") {
            let ready = Closure::wrap(Box::new(|| {
                info!("ad container ready");
            }) as Box<dyn FnMut()>);
            if let Err(e) = self.call("addEventListener", &[&JsValue::from_str("ready"), ready.as_ref()]) {
                warn!("mraid ready hook failed: {:?}", e);
            }
            ready.forget();
        }

        let viewable = Closure::wrap(Box::new(|viewable: JsValue| {
            if viewable.as_bool() == Some(true) {
                info!("ad became viewable");
            }
        }) as Box<dyn FnMut(JsValue)>);
        if let Err(e) = self.call(
            "addEventListener",
            &[&JsValue::from_str("viewableChange"), viewable.as_ref()],
        ) {
            warn!("mraid viewableChange hook failed: {:?}", e);
        }
        viewable.forget();
    }

    /// Open the store page through the container, or a new tab without one.
    pub fn open(&self, window: &Window, url: &str) {
        if self.is_present() {
            match self.call("open", &[&JsValue::from_str(url)]) {
                Ok(_) => return,
                Err(e) => warn!("mraid.open failed, falling back: {:?}", e),
            }
        }
        if let Err(e) = window.open_with_url_and_target(url, "_blank") {
            warn!("window.open failed: {:?}", e);
        }
    }
}
