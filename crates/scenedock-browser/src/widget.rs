//! Control wiring for one widget.
//!
//! The scaffold markup is rendered by `scenedock-core`; this module looks
//! the freshly inserted elements back up and attaches their behavior:
//! fullscreen toggle, pop-out window, lazy-load triggers, and responsive
//! iframe sizing. Every listener is owned by elements of one widget (plus
//! document-level fullscreen-change listeners scoped to that widget's
//! button), so repeated pipeline runs never stack duplicate handlers on
//! shared targets.

use std::cell::Cell;
use std::rc::Rc;

use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlIFrameElement};

use scenedock_core::{EmbedError, EmbedOptions, ResolvedDemo, WidgetIds};

use crate::fullscreen::FullscreenProvider;
use crate::lazy::{self, LazyLoader};

const POPOUT_FEATURES: &str =
    "width=1000,height=800,scrollbars=yes,resizable=yes,toolbar=no,menubar=no,location=no,status=no";

/// Delay before refitting the iframe after a burst of resize events.
const RESIZE_SETTLE_MS: u32 = 100;

/// Attach behavior to a widget that was just inserted into the document.
pub fn wire_controls(
    document: &Document,
    demo: &ResolvedDemo,
    ids: &WidgetIds,
    provider: FullscreenProvider,
    opts: &EmbedOptions,
    lazy: &LazyLoader,
) -> Result<(), EmbedError> {
    let iframe: HtmlIFrameElement = element_by_id(document, &ids.iframe)?;
    let fullscreen_btn: HtmlElement = element_by_id(document, &ids.fullscreen_btn)?;
    let popout_btn: HtmlElement = element_by_id(document, &ids.popout_btn)?;

    // Pop-out.
    {
        let url = demo.url.clone();
        let label = demo.scene_label.clone();
        EventListener::new(&popout_btn, "click", move |_| open_popout(&url, &label)).forget();
    }

    // Fullscreen toggle. Entering fullscreen on a lazy widget first promotes
    // its iframe; fullscreening an empty frame helps nobody.
    {
        let document = document.clone();
        let iframe = iframe.clone();
        let btn = fullscreen_btn.clone();
        let url = demo.url.clone();
        let label = demo.scene_label.clone();
        EventListener::new(&fullscreen_btn, "click", move |_| {
            lazy::reveal(&iframe);
            provider.toggle(&document, &iframe, &url, &label);
            update_fullscreen_button(&btn, provider.is_active(&document, &iframe));
        })
        .forget();
    }

    // Track fullscreen transitions so the button label stays honest. Only
    // the native provider gets transitions; the emulated toggle is
    // synchronous and updated in the click handler above.
    if provider == FullscreenProvider::Native {
        for event in ["fullscreenchange", "webkitfullscreenchange"] {
            let observed = document.clone();
            let btn = fullscreen_btn.clone();
            EventListener::new(document, event, move |_| {
                update_fullscreen_button(&btn, observed.fullscreen_element().is_some());
            })
            .forget();
        }
    }

    if opts.lazy_load {
        if let Ok(placeholder) = element_by_id::<HtmlElement>(document, &ids.placeholder) {
            let iframe = iframe.clone();
            EventListener::new(&placeholder, "click", move |_| lazy::reveal(&iframe)).forget();
        }
        lazy.observe(&iframe);
    }

    attach_resize(&iframe, opts.min_frame_height, opts.max_frame_height);

    Ok(())
}

fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, EmbedError> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok())
        .ok_or_else(|| EmbedError::DomUnavailable {
            what: format!("#{id}"),
        })
}

pub(crate) fn update_fullscreen_button(btn: &HtmlElement, active: bool) {
    if active {
        btn.set_text_content(Some("\u{26f6} Exit Fullscreen"));
        btn.set_title("Exit fullscreen");
    } else {
        btn.set_text_content(Some("\u{26f6} Fullscreen"));
        btn.set_title("Toggle fullscreen");
    }
}

/// Open the demo in a named pop-out window; a blocked popup falls back to a
/// plain new tab.
pub(crate) fn open_popout(url: &str, label: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let name = format!("sd-popout-{label}");
    match window.open_with_url_and_target_and_features(url, &name, POPOUT_FEATURES) {
        Ok(Some(popup)) => {
            let _ = popup.focus();
        }
        _ => {
            tracing::warn!(label, "pop-out blocked, opening a new tab instead");
            let _ = window.open_with_url_and_target(url, "_blank");
        }
    }
}

/// Fit the iframe height to its wrapper width at 4:3, clamped.
fn fit_height(iframe: &HtmlIFrameElement, min: u32, max: u32) {
    let Some(wrapper) = iframe.parent_element() else {
        return;
    };
    let width = wrapper.client_width();
    if width <= 0 {
        return;
    }
    let height = ((width as f64) * 3.0 / 4.0) as u32;
    let height = height.clamp(min, max);
    let _ = iframe
        .style()
        .set_property("height", &format!("{height}px"));
}

/// Keep the iframe fitted: once now, after each burst of window resizes,
/// and when the frame's content loads.
fn attach_resize(iframe: &HtmlIFrameElement, min: u32, max: u32) {
    fit_height(iframe, min, max);

    let Some(window) = web_sys::window() else {
        return;
    };

    let settling = Rc::new(Cell::new(false));
    {
        let iframe = iframe.clone();
        let settling = settling.clone();
        EventListener::new(&window, "resize", move |_| {
            if settling.replace(true) {
                return;
            }
            let iframe = iframe.clone();
            let settling = settling.clone();
            Timeout::new(RESIZE_SETTLE_MS, move || {
                settling.set(false);
                fit_height(&iframe, min, max);
            })
            .forget();
        })
        .forget();
    }

    {
        let target = iframe.clone();
        EventListener::new(iframe, "load", move |_| fit_height(&target, min, max)).forget();
    }
}
