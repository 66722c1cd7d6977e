//! Plugin driver: one merged navigation signal source feeding the refresh
//! controller.
//!
//! The original problem this solves: a documentation router re-renders
//! content on every navigation, and several raw events fire around each
//! render (hash change, DOM mutations, the renderer's own lifecycle hook).
//! All of them funnel into [`NavigationSignal`] values here; the controller
//! debounces them into single pipeline runs and the runs are consumed in
//! timer slices so the router never waits on us.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord};

use scenedock_core::{
    EmbedError, EmbedOptions, NavigationSignal, RefreshController, ScheduleAction, SliceOutcome,
    WIDGET_ATTR,
};

use crate::dom::BrowserDocument;
use crate::fullscreen::FullscreenProvider;
use crate::platform;

/// Handle owned by the host page for the lifetime of the plugin.
pub struct EmbedPlugin {
    inner: Rc<PluginInner>,
}

struct PluginInner {
    opts: EmbedOptions,
    controller: RefCell<RefreshController<BrowserDocument>>,
    host: RefCell<BrowserDocument>,
}

impl EmbedPlugin {
    /// Mount the plugin: resolve the scan root, wire the navigation signal
    /// sources, and schedule the initial run.
    pub fn mount(opts: EmbedOptions) -> Result<Self, EmbedError> {
        let window = web_sys::window().ok_or_else(|| dom_unavailable("window"))?;
        let document = window.document().ok_or_else(|| dom_unavailable("document"))?;

        let root: Element = document
            .query_selector(&opts.content_selector)
            .ok()
            .flatten()
            .or_else(|| document.body().map(Into::into))
            .ok_or_else(|| dom_unavailable("content root"))?;

        let detected = platform::detect();
        let provider = FullscreenProvider::detect(&document, &detected);
        tracing::debug!(
            ?detected,
            ?provider,
            selector = %opts.content_selector,
            "scenedock mounting"
        );

        let host = BrowserDocument::new(document, root.clone(), provider, opts.clone());
        let controller = RefreshController::new(opts.debounce_ms);

        let inner = Rc::new(PluginInner {
            opts,
            controller: RefCell::new(controller),
            host: RefCell::new(host),
        });

        // Route changes arrive as hash navigation.
        {
            let inner = Rc::clone(&inner);
            EventListener::new(&window, "hashchange", move |_| {
                deliver(&inner, NavigationSignal::RouteChanged);
            })
            .forget();
        }

        // Structural content mutations, ignoring our own widget insertions
        // so a run does not retrigger itself.
        {
            let inner = Rc::clone(&inner);
            let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
                move |records: js_sys::Array, _observer: MutationObserver| {
                    let external = records.iter().any(|record| {
                        let record: MutationRecord = record.unchecked_into();
                        !is_own_mutation(&record)
                    });
                    if external {
                        deliver(&inner, NavigationSignal::ContentMutated);
                    }
                },
            );
            if let Ok(observer) = MutationObserver::new(callback.as_ref().unchecked_ref()) {
                let init = MutationObserverInit::new();
                init.set_child_list(true);
                init.set_subtree(true);
                let _ = observer.observe_with_options(&root, &init);
            }
            callback.forget();
        }

        deliver(&inner, NavigationSignal::InitialLoad);
        Ok(Self { inner })
    }

    /// The host renderer finished rendering content (e.g. docsify's
    /// `doneEach` hook).
    pub fn page_rendered(&self) {
        deliver(&self.inner, NavigationSignal::ContentMutated);
    }

    /// The host renderer switched routes.
    pub fn route_changed(&self) {
        deliver(&self.inner, NavigationSignal::RouteChanged);
    }
}

fn dom_unavailable(what: &str) -> EmbedError {
    EmbedError::DomUnavailable {
        what: what.to_string(),
    }
}

/// A mutation record is "ours" when everything it added is a widget
/// container or lives inside one.
fn is_own_mutation(record: &MutationRecord) -> bool {
    let added = record.added_nodes();
    if added.length() == 0 {
        // Pure removals mean the router replaced content.
        return false;
    }
    for index in 0..added.length() {
        let Some(node) = added.item(index) else {
            continue;
        };
        let owned = node.dyn_ref::<Element>().is_some_and(|el| {
            el.has_attribute(WIDGET_ATTR)
                || el
                    .closest(&format!("[{WIDGET_ATTR}]"))
                    .ok()
                    .flatten()
                    .is_some()
        });
        if !owned {
            return false;
        }
    }
    true
}

/// Feed one signal into the controller and arm the debounce timer when the
/// controller asks for it. Everything downstream of here runs on timer
/// callbacks, never synchronously inside the originating event.
fn deliver(inner: &Rc<PluginInner>, signal: NavigationSignal) {
    let action = inner.controller.borrow_mut().notify(signal);
    if let ScheduleAction::ArmTimer { delay_ms } = action {
        arm_timer(inner, delay_ms);
    }
}

fn arm_timer(inner: &Rc<PluginInner>, delay_ms: u32) {
    let inner = Rc::clone(inner);
    Timeout::new(delay_ms, move || on_timer(&inner)).forget();
}

fn on_timer(inner: &Rc<PluginInner>) {
    let started = {
        let mut controller = inner.controller.borrow_mut();
        let mut host = inner.host.borrow_mut();
        controller.timer_fired(&mut host)
    };
    if started {
        run_slices(inner);
    }
}

fn run_slices(inner: &Rc<PluginInner>) {
    let outcome = {
        let mut controller = inner.controller.borrow_mut();
        let mut host = inner.host.borrow_mut();
        controller.run_slice(&mut host, inner.opts.chunk_size)
    };
    match outcome {
        SliceOutcome::More => {
            // Yield to the event loop between slices so navigation
            // rendering stays responsive.
            let inner = Rc::clone(inner);
            Timeout::new(0, move || run_slices(&inner)).forget();
        }
        SliceOutcome::Finished { rearm, .. } => {
            if rearm {
                arm_timer(inner, inner.opts.debounce_ms);
            }
        }
    }
}
