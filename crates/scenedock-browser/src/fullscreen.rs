//! Fullscreen capability handling.
//!
//! The provider is selected once at mount instead of branching on vendor
//! APIs at every call site. Platforms with a working Fullscreen API get
//! [`FullscreenProvider::Native`]; mobile browsers and documents where the
//! API is disabled get [`FullscreenProvider::Emulated`], a fixed-position
//! takeover driven by a CSS class on the frame wrapper.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlIFrameElement};

use crate::platform::Platform;
use crate::widget::open_popout;

/// CSS class toggled on the frame wrapper in emulated mode.
pub const TAKEOVER_CLASS: &str = "sd-embed-takeover";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FullscreenProvider {
    /// The Fullscreen API, with a WebKit-prefixed request shim behind it.
    Native,
    /// CSS-class takeover for platforms without a usable Fullscreen API.
    Emulated,
}

impl FullscreenProvider {
    /// Pick a provider for this document. Called once at mount.
    pub fn detect(document: &Document, platform: &Platform) -> Self {
        if platform.mobile || !document.fullscreen_enabled() {
            Self::Emulated
        } else {
            Self::Native
        }
    }

    /// Toggle fullscreen for a widget's iframe.
    ///
    /// A native request that is refused falls back to the pop-out window,
    /// so the button always does something visible.
    pub fn toggle(&self, document: &Document, iframe: &HtmlIFrameElement, url: &str, label: &str) {
        match self {
            Self::Native => {
                if document.fullscreen_element().is_some() {
                    document.exit_fullscreen();
                } else if request_fullscreen(iframe).is_err() {
                    tracing::warn!(label, "fullscreen request refused, opening pop-out");
                    open_popout(url, label);
                }
            }
            Self::Emulated => {
                if let Some(wrapper) = iframe.parent_element() {
                    let _ = wrapper.class_list().toggle(TAKEOVER_CLASS);
                }
            }
        }
    }

    /// Whether this widget's iframe is currently presented fullscreen.
    pub fn is_active(&self, document: &Document, iframe: &HtmlIFrameElement) -> bool {
        match self {
            Self::Native => document.fullscreen_element().is_some(),
            Self::Emulated => iframe
                .parent_element()
                .is_some_and(|wrapper| wrapper.class_list().contains(TAKEOVER_CLASS)),
        }
    }
}

/// Request fullscreen, trying the unprefixed API first and the
/// WebKit-prefixed shim second.
fn request_fullscreen(iframe: &HtmlIFrameElement) -> Result<(), ()> {
    if iframe.request_fullscreen().is_ok() {
        return Ok(());
    }
    let shim = js_sys::Reflect::get(iframe, &JsValue::from_str("webkitRequestFullscreen"))
        .ok()
        .and_then(|value| value.dyn_into::<js_sys::Function>().ok());
    match shim {
        Some(func) => func.call0(iframe).map(|_| ()).map_err(|_| ()),
        None => Err(()),
    }
}
