//! Deferred iframe loading.
//!
//! In lazy mode the scaffold leaves the iframe's `src` unset and parks the
//! demo URL in a `data-src` attribute. One shared `IntersectionObserver`
//! watches every lazy iframe and promotes the attribute when the widget
//! scrolls into view; a click on the placeholder (or any control that needs
//! the demo running) promotes it early. Either way the promotion happens at
//! most once per widget - a set `src` is never touched again.

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{HtmlIFrameElement, IntersectionObserver, IntersectionObserverEntry};

use scenedock_core::DEFERRED_SRC_ATTR;

pub struct LazyLoader {
    observer: Option<IntersectionObserver>,
}

impl LazyLoader {
    pub fn new() -> Self {
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let entry: IntersectionObserverEntry = entry.unchecked_into();
                    if !entry.is_intersecting() {
                        continue;
                    }
                    let target = entry.target();
                    observer.unobserve(&target);
                    if let Some(iframe) = target.dyn_ref::<HtmlIFrameElement>() {
                        reveal(iframe);
                    }
                }
            },
        );
        let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref()).ok();
        callback.forget();
        Self { observer }
    }

    /// Watch an iframe until it becomes visible. Reveals immediately when
    /// visibility observation is unavailable.
    pub fn observe(&self, iframe: &HtmlIFrameElement) {
        match &self.observer {
            Some(observer) => observer.observe(iframe),
            None => reveal(iframe),
        }
    }
}

impl Default for LazyLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Promote a deferred `data-src` to the real `src`, once, and drop the
/// placeholder button.
pub fn reveal(iframe: &HtmlIFrameElement) {
    if iframe.has_attribute("src") {
        return;
    }
    let Some(url) = iframe.get_attribute(DEFERRED_SRC_ATTR) else {
        return;
    };
    iframe.set_src(&url);
    if let Some(sibling) = iframe.previous_element_sibling() {
        if sibling.class_list().contains("sd-embed-placeholder") {
            sibling.remove();
        }
    }
}
