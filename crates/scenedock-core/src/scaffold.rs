//! Widget HTML scaffold.
//!
//! Renders the inner markup of one embed widget (header, controls, iframe,
//! fallback, caption) as an escaped HTML string. The container element itself
//! is created and inserted by the DOM layer; keeping the markup here keeps
//! the widget structure testable without a browser.
//!
//! In lazy mode the iframe is created without a `src`; the demo URL rides in
//! a `data-src` attribute until the visibility observer (or a click on the
//! placeholder) promotes it, exactly once.

use smol_str::{SmolStr, format_smolstr};

use crate::resolve::ResolvedDemo;

/// Attribute marking a widget container. Presence of this attribute on a
/// marker's next sibling is what makes re-runs idempotent.
pub const WIDGET_ATTR: &str = "data-scenedock";

/// Attribute carrying a deferred iframe src in lazy mode.
pub const DEFERRED_SRC_ATTR: &str = "data-src";

/// Element ids for one widget instance.
///
/// Ids embed the scene label (slugified), the run generation, and the
/// widget's sequence number within the run, so repeated labels on one page
/// still produce unique ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetIds {
    pub iframe: SmolStr,
    pub fullscreen_btn: SmolStr,
    pub popout_btn: SmolStr,
    pub placeholder: SmolStr,
}

impl WidgetIds {
    pub fn new(label: &str, generation: u64, seq: usize) -> Self {
        let slug = slugify(label);
        Self {
            iframe: format_smolstr!("sd-frame-{slug}-{generation}-{seq}"),
            fullscreen_btn: format_smolstr!("sd-fullscreen-{slug}-{generation}-{seq}"),
            popout_btn: format_smolstr!("sd-popout-{slug}-{generation}-{seq}"),
            placeholder: format_smolstr!("sd-placeholder-{slug}-{generation}-{seq}"),
        }
    }
}

/// Reduce a label to `[a-z0-9-]` for use inside element ids.
fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut last_dash = true;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("scene");
    }
    slug
}

/// Render the widget's inner HTML.
pub fn render_widget_html(
    demo: &ResolvedDemo,
    ids: &WidgetIds,
    lazy: bool,
    caption: Option<&str>,
) -> String {
    let label = html_escape(&demo.scene_label);
    let url = html_escape(&demo.url);

    let mut html = String::new();

    html.push_str("<div class=\"sd-embed-header\">");
    html.push_str("<h3 class=\"sd-embed-title\">Interactive Demo: ");
    html.push_str(&label);
    html.push_str("</h3>");
    html.push_str("<span class=\"sd-embed-controls\">");
    html.push_str("<button id=\"");
    html.push_str(&ids.fullscreen_btn);
    html.push_str("\" class=\"sd-embed-button\" type=\"button\" title=\"Toggle fullscreen\">\u{26f6} Fullscreen</button>");
    html.push_str("<button id=\"");
    html.push_str(&ids.popout_btn);
    html.push_str("\" class=\"sd-embed-button\" type=\"button\" title=\"Open in new window\">\u{2197}\u{fe0e} Pop Out</button>");
    html.push_str("</span>");
    html.push_str("</div>");

    html.push_str("<div class=\"sd-embed-frame\">");
    if lazy {
        html.push_str("<button id=\"");
        html.push_str(&ids.placeholder);
        html.push_str("\" class=\"sd-embed-placeholder\" type=\"button\">\u{25b6}\u{fe0e} Load demo: ");
        html.push_str(&label);
        html.push_str("</button>");
    }
    html.push_str("<iframe id=\"");
    html.push_str(&ids.iframe);
    html.push_str("\" ");
    if lazy {
        html.push_str(DEFERRED_SRC_ATTR);
    } else {
        html.push_str("src");
    }
    html.push_str("=\"");
    html.push_str(&url);
    html.push_str("\" title=\"");
    html.push_str(&label);
    html.push_str(" demo\" frameborder=\"0\" allowfullscreen=\"true\">");
    html.push_str("<p>Your browser does not support iframes. <a href=\"");
    html.push_str(&url);
    html.push_str("\" target=\"_blank\" rel=\"noopener\">Open the demo in a new tab</a>.</p>");
    html.push_str("</iframe>");
    html.push_str("</div>");

    if let Some(caption) = caption {
        html.push_str("<p class=\"sd-embed-caption\">");
        html.push_str(&html_escape(caption));
        html.push_str("</p>");
    }

    html
}

/// Simple HTML escaping.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> ResolvedDemo {
        ResolvedDemo {
            scene_label: "tween".into(),
            url: "https://x.io/demo/exports/web/?scene=animation%2Ftween".into(),
        }
    }

    #[test]
    fn test_ids_are_unique_per_sequence() {
        let a = WidgetIds::new("tween", 1, 0);
        let b = WidgetIds::new("tween", 1, 1);
        assert_ne!(a.iframe, b.iframe);
        assert_eq!(a.iframe, "sd-frame-tween-1-0");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Bounce House 2"), "bounce-house-2");
        assert_eq!(slugify("__"), "scene");
    }

    #[test]
    fn test_eager_scaffold_sets_src() {
        let html = render_widget_html(&demo(), &WidgetIds::new("tween", 1, 0), false, None);
        assert!(html.contains("src=\"https://x.io/demo/exports/web/?scene=animation%2Ftween\""));
        assert!(!html.contains(DEFERRED_SRC_ATTR));
        assert!(!html.contains("sd-embed-placeholder"));
        assert!(!html.contains("sd-embed-caption"));
    }

    #[test]
    fn test_lazy_scaffold_defers_src() {
        let html = render_widget_html(&demo(), &WidgetIds::new("tween", 1, 0), true, None);
        assert!(html.contains("data-src=\""));
        assert!(!html.contains(" src=\""));
        assert!(html.contains("id=\"sd-placeholder-tween-1-0\""));
    }

    #[test]
    fn test_caption_rendered_and_escaped() {
        let html = render_widget_html(
            &demo(),
            &WidgetIds::new("tween", 1, 0),
            false,
            Some("press <R> to reset"),
        );
        assert!(html.contains("<p class=\"sd-embed-caption\">press &lt;R&gt; to reset</p>"));
    }

    #[test]
    fn test_label_escaped_in_title() {
        let spiky = ResolvedDemo {
            scene_label: "a<b>".into(),
            url: "https://x.io/p/exports/web/".into(),
        };
        let html = render_widget_html(&spiky, &WidgetIds::new("a<b>", 1, 0), false, None);
        assert!(html.contains("Interactive Demo: a&lt;b&gt;"));
    }
}
