//! Demo URL construction from an embed request and the page location.
//!
//! The exported web build of a project lives under
//! `<base>/<project>/exports/web/`, where `<base>` is the directory the
//! documentation site is served from. Scene selection travels as a `scene`
//! query parameter that the embedded application understands; without it the
//! build opens its default browsable view.

use smol_str::SmolStr;
use url::form_urlencoded;

use crate::marker::EmbedRequest;

/// Path of an exported web build below the project directory.
pub const EXPORT_SUBPATH: &str = "exports/web/";

/// Query parameter the embedded application reads its initial scene from.
pub const SCENE_PARAM: &str = "scene";

/// A demo ready to be embedded: display label plus a normalized absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDemo {
    pub scene_label: SmolStr,
    pub url: String,
}

/// Resolve a request against the page's absolute URL.
///
/// Never fails: malformed marker input was already rejected by the parser,
/// and the page URL comes from the browser's own location.
pub fn resolve_demo(request: &EmbedRequest, page_url: &str) -> ResolvedDemo {
    let mut url = normalize_base(page_url);
    url.push_str(request.project.as_str());
    url.push('/');
    url.push_str(EXPORT_SUBPATH);

    let mut url = collapse_slashes(&url);

    if let Some(scene) = &request.scene {
        url.push('?');
        url.push_str(
            &form_urlencoded::Serializer::new(String::new())
                .append_pair(SCENE_PARAM, &scene.selector)
                .finish(),
        );
    }

    debug_assert!(
        url::Url::parse(&url).is_ok(),
        "resolver produced a malformed URL: {url}"
    );

    ResolvedDemo {
        scene_label: SmolStr::new(request.label()),
        url,
    }
}

/// Strip the navigation fragment and any trailing `index.html` segment, and
/// make sure the base ends with exactly one `/`.
///
/// Locally served sites often carry an explicit `index.html`; keeping it
/// would produce URLs like `.../index.html/demo/exports/web/`.
fn normalize_base(page_url: &str) -> String {
    let base = page_url.split('#').next().unwrap_or(page_url);
    let base = match base.strip_suffix("index.html") {
        Some(dir) if dir.ends_with('/') => dir,
        _ => base,
    };
    let mut base = base.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

/// Collapse runs of `/` in everything after the scheme separator.
fn collapse_slashes(url: &str) -> String {
    let (scheme, rest) = match url.find("://") {
        Some(at) => url.split_at(at + 3),
        None => ("", url),
    };

    let mut out = String::with_capacity(url.len());
    out.push_str(scheme);
    let mut prev_slash = false;
    for c in rest.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            prev_slash = false;
            out.push(c);
        }
    }
    out
}
