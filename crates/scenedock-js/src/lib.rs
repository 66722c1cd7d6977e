//! WASM bindings for the scenedock documentation embed plugin.
//!
//! The host page constructs one [`Scenedock`] handle and forwards its
//! renderer's lifecycle notifications:
//!
//! ```js
//! const plugin = new Scenedock({ lazyLoad: true });
//! window.$docsify.plugins = (window.$docsify.plugins || []).concat(hook => {
//!   hook.doneEach(() => plugin.pageRendered());
//! });
//! ```
//!
//! Hash navigation is also observed directly, so `routeChanged` only matters
//! for routers that navigate without touching the fragment.

use wasm_bindgen::prelude::*;

use scenedock_browser::EmbedPlugin;
use scenedock_core::EmbedOptions;

/// Panic hook and tracing subscriber, installed once at module load.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let _ = tracing::subscriber::set_global_default(Registry::default().with(wasm_layer));
}

/// Plugin handle exported to the documentation renderer.
#[wasm_bindgen]
pub struct Scenedock {
    plugin: EmbedPlugin,
}

#[wasm_bindgen]
impl Scenedock {
    /// Mount the plugin. `options` may be undefined or a partial options
    /// object; missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<Scenedock, JsValue> {
        let opts: EmbedOptions = if options.is_undefined() || options.is_null() {
            EmbedOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|err| JsValue::from_str(&err.to_string()))?
        };

        let plugin =
            EmbedPlugin::mount(opts).map_err(|err| JsValue::from_str(&err.to_string()))?;
        Ok(Scenedock { plugin })
    }

    /// The host renderer finished rendering content (e.g. docsify's
    /// `doneEach` hook).
    #[wasm_bindgen(js_name = pageRendered)]
    pub fn page_rendered(&self) {
        self.plugin.page_rendered();
    }

    /// The host renderer switched routes without a hash change.
    #[wasm_bindgen(js_name = routeChanged)]
    pub fn route_changed(&self) {
        self.plugin.route_changed();
    }
}
