//! `DocumentHost` over the live document.
//!
//! The locator walks comment nodes under the scan root with a `TreeWalker`,
//! which visits them in document order; the refresh controller relies on
//! that ordering. Widget presence is detected structurally - a widget is
//! always the immediate next sibling of its marker and carries the
//! [`WIDGET_ATTR`] attribute - so a re-run over a document that already has
//! widgets inserts nothing.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Node};

use scenedock_core::{
    DocumentHost, EmbedError, EmbedOptions, MARKER_PREFIX, ResolvedDemo, WIDGET_ATTR, WidgetIds,
    render_widget_html,
};

use crate::fullscreen::FullscreenProvider;
use crate::lazy::LazyLoader;
use crate::widget;

/// `NodeFilter.SHOW_COMMENT`, not exposed as a constant by web-sys.
const SHOW_COMMENT: u32 = 0x80;

pub struct BrowserDocument {
    document: Document,
    root: Element,
    fullscreen: FullscreenProvider,
    lazy: LazyLoader,
    opts: EmbedOptions,
}

impl BrowserDocument {
    pub fn new(
        document: Document,
        root: Element,
        fullscreen: FullscreenProvider,
        opts: EmbedOptions,
    ) -> Self {
        Self {
            document,
            root,
            fullscreen,
            lazy: LazyLoader::new(),
            opts,
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }
}

impl DocumentHost for BrowserDocument {
    type Anchor = Node;

    fn page_url(&self) -> String {
        self.document
            .location()
            .and_then(|location| location.href().ok())
            .unwrap_or_default()
    }

    fn collect_comments(&mut self) -> Vec<(Node, String)> {
        let mut found = Vec::new();
        let Ok(walker) = self
            .document
            .create_tree_walker_with_what_to_show(&self.root, SHOW_COMMENT)
        else {
            return found;
        };
        while let Ok(Some(node)) = walker.next_node() {
            let Some(text) = node.node_value() else {
                continue;
            };
            if text.contains(MARKER_PREFIX) {
                found.push((node, text));
            }
        }
        found
    }

    fn widget_follows(&self, anchor: &Node) -> bool {
        anchor
            .next_sibling()
            .and_then(|node| node.dyn_into::<Element>().ok())
            .is_some_and(|el| el.has_attribute(WIDGET_ATTR))
    }

    fn build_widget(
        &mut self,
        anchor: &Node,
        demo: &ResolvedDemo,
        ids: &WidgetIds,
    ) -> Result<(), EmbedError> {
        let parent = anchor
            .parent_node()
            .ok_or_else(|| EmbedError::DomUnavailable {
                what: "marker parent node".to_string(),
            })?;

        let container =
            self.document
                .create_element("div")
                .map_err(|_| EmbedError::DomUnavailable {
                    what: "widget container".to_string(),
                })?;
        container.set_class_name("sd-embed");
        let _ = container.set_attribute(WIDGET_ATTR, "");
        container.set_inner_html(&render_widget_html(
            demo,
            ids,
            self.opts.lazy_load,
            self.opts.caption.as_deref(),
        ));

        parent
            .insert_before(&container, anchor.next_sibling().as_ref())
            .map_err(|_| EmbedError::DomUnavailable {
                what: "widget insertion point".to_string(),
            })?;

        widget::wire_controls(
            &self.document,
            demo,
            ids,
            self.fullscreen,
            &self.opts,
            &self.lazy,
        )
    }
}
