//! Embed-marker grammar and scene-path resolution.
//!
//! Documentation authors drop HTML comments into their pages to request a
//! demo widget:
//!
//! ```text
//! <!-- embed-<project> -->
//! <!-- embed-<project>: <scene-path> -->
//! <!-- embed-<project>: {$PATH}/<rest> -->
//! ```
//!
//! The first form opens the project's default scene browser. The second
//! selects a scene by its slash-separated path. The third expands the
//! `{$PATH}` placeholder from the page's current navigation route, so a
//! document can embed "the scene this page is about" without repeating its
//! own location.
//!
//! Earlier revisions of the marker syntax (`start-embed-TYPE-path`) are
//! recognized and rejected with a dedicated diagnostic rather than being
//! mis-parsed as a project name.

use std::hash::{DefaultHasher, Hash, Hasher};

use smol_str::SmolStr;

use crate::error::EmbedError;

/// Comment text must contain this prefix to be considered a marker candidate.
pub const MARKER_PREFIX: &str = "embed-";

/// Marker prefix used by retired revisions of the grammar.
const LEGACY_PREFIX: &str = "start-embed-";

/// Placeholder expanded from the current navigation route.
const PATH_PLACEHOLDER: &str = "{$PATH}";

/// A resolved scene path needs at least `root/category/sceneFolder/sceneName`.
const MIN_SCENE_SEGMENTS: usize = 4;

/// Raw marker as read from the document: trimmed comment text plus its
/// occurrence ordinal among markers with identical text on the same page.
///
/// The ordinal keeps duplicated marker text from collapsing into a single
/// identity, so each occurrence still gets its own widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedMarker {
    text: SmolStr,
    ordinal: u32,
}

impl EmbedMarker {
    pub fn new(text: &str, ordinal: u32) -> Self {
        Self {
            text: SmolStr::new(text.trim()),
            ordinal,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Identity of this marker within one page render generation.
    pub fn id(&self) -> MarkerId {
        MarkerId {
            fingerprint: fingerprint(&self.text),
            ordinal: self.ordinal,
        }
    }
}

/// Stable marker identity: a fingerprint of the marker text plus the
/// occurrence ordinal. Stable across repeated runs over the same render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId {
    fingerprint: u64,
    ordinal: u32,
}

/// Hash of the trimmed marker text.
pub fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Scene selection parsed out of a marker's scene path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenePath {
    /// `category/sceneFolder`, passed to the demo as its scene selector.
    pub selector: String,
    /// `sceneName`, used only as a display label.
    pub label: SmolStr,
}

/// A fully parsed embed request. Derived entirely from the marker text and
/// the current route; no other state feeds into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRequest {
    pub project: SmolStr,
    /// `None` means "open the project's default scene browser".
    pub scene: Option<ScenePath>,
}

impl EmbedRequest {
    /// Label used in widget UI text and generated element ids: the scene
    /// name when one was selected, otherwise the project name.
    pub fn label(&self) -> &str {
        self.scene
            .as_ref()
            .map(|scene| scene.label.as_str())
            .unwrap_or(self.project.as_str())
    }
}

fn is_project_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parse a marker's comment text into an [`EmbedRequest`].
///
/// `route` is the page's current navigation fragment (the part after `#`),
/// consulted only for `{$PATH}` expansion.
pub fn parse_marker(text: &str, route: &str) -> Result<EmbedRequest, EmbedError> {
    let text = text.trim();

    if text.starts_with(LEGACY_PREFIX) {
        return Err(EmbedError::LegacySyntax {
            text: text.to_string(),
        });
    }

    let rest = text
        .strip_prefix(MARKER_PREFIX)
        .ok_or_else(|| EmbedError::Parse {
            text: text.to_string(),
        })?;

    let project_len = rest.chars().take_while(|c| is_project_char(*c)).count();
    if project_len == 0 {
        return Err(EmbedError::Parse {
            text: text.to_string(),
        });
    }
    let (project, tail) = rest.split_at(project_len);

    let tail = tail.trim();
    let scene = if tail.is_empty() {
        None
    } else {
        let raw = tail
            .strip_prefix(':')
            .ok_or_else(|| EmbedError::Parse {
                text: text.to_string(),
            })?
            .trim();
        if raw.is_empty() {
            None
        } else {
            Some(resolve_scene_path(project, raw, route)?)
        }
    };

    Ok(EmbedRequest {
        project: SmolStr::new(project),
        scene,
    })
}

/// Expand a template if present, then split and validate the scene path.
fn resolve_scene_path(project: &str, raw: &str, route: &str) -> Result<ScenePath, EmbedError> {
    let expanded: String = match raw.strip_prefix(PATH_PLACEHOLDER) {
        Some(rest) => {
            let rest = rest.strip_prefix('/').unwrap_or(rest);
            let prefix = expand_route_prefix(project, route)?;
            format!("{prefix}/{rest}")
        }
        None => raw.to_string(),
    };

    let segments: Vec<&str> = expanded.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < MIN_SCENE_SEGMENTS {
        return Err(EmbedError::InvalidPath {
            path: expanded.clone(),
            found: segments.len(),
        });
    }

    Ok(ScenePath {
        selector: format!("{}/{}", segments[1], segments[2]),
        label: SmolStr::new(segments[3]),
    })
}

/// Derive the `{$PATH}` replacement from the navigation route.
///
/// The route is expected to look like `#/<project>/<...scene tree...>/<doc>`;
/// the replacement is everything between the project segment and the final
/// document segment. At least two scene-tree segments must be present.
fn expand_route_prefix(project: &str, route: &str) -> Result<String, EmbedError> {
    let path = route.trim_start_matches('#');
    let path = path.split('?').next().unwrap_or(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let err = || EmbedError::PathExpansion {
        project: project.to_string(),
        route: route.to_string(),
    };

    let at = segments.iter().position(|s| *s == project).ok_or_else(err)?;
    let after = &segments[at + 1..];
    // The final route segment is the document page itself, not part of the
    // scene tree.
    if after.len() < 3 {
        return Err(err());
    }
    Ok(after[..after.len() - 1].join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_only() {
        let req = parse_marker("embed-demo", "").unwrap();
        assert_eq!(req.project, "demo");
        assert_eq!(req.scene, None);
        assert_eq!(req.label(), "demo");
    }

    #[test]
    fn test_parse_with_scene_path() {
        let req = parse_marker("embed-demo: scenes/animation/tween/tween", "").unwrap();
        assert_eq!(req.project, "demo");
        let scene = req.scene.unwrap();
        assert_eq!(scene.selector, "animation/tween");
        assert_eq!(scene.label, "tween");
    }

    #[test]
    fn test_parse_long_scene_path_uses_positional_segments() {
        let req = parse_marker("embed-demo: scenes/physics/bounce/main/extra", "").unwrap();
        let scene = req.scene.unwrap();
        assert_eq!(scene.selector, "physics/bounce");
        assert_eq!(scene.label, "main");
    }

    #[test]
    fn test_parse_template_expansion() {
        let route = "/demo/scenes/physics/bounce/readme";
        let req = parse_marker("embed-demo: {$PATH}/foo", route).unwrap();
        let scene = req.scene.unwrap();
        assert_eq!(scene.selector, "physics/bounce");
        assert_eq!(scene.label, "foo");
    }

    #[test]
    fn test_template_expansion_missing_project_in_route() {
        let err = parse_marker("embed-demo: {$PATH}/foo", "/other/scenes/a/b/readme").unwrap_err();
        assert!(matches!(err, EmbedError::PathExpansion { .. }));
    }

    #[test]
    fn test_template_expansion_route_too_shallow() {
        let err = parse_marker("embed-demo: {$PATH}/foo", "/demo/scenes/readme").unwrap_err();
        assert!(matches!(err, EmbedError::PathExpansion { .. }));
    }

    #[test]
    fn test_scene_path_too_short() {
        let err = parse_marker("embed-demo: scenes/animation/tween", "").unwrap_err();
        assert!(matches!(err, EmbedError::InvalidPath { found: 3, .. }));
    }

    #[test]
    fn test_expanded_path_too_short() {
        // Expansion succeeds but the result still has only three segments.
        let err = parse_marker("embed-demo: {$PATH}", "/demo/scenes/physics/bounce/readme")
            .unwrap_err();
        assert!(matches!(err, EmbedError::InvalidPath { found: 3, .. }));
    }

    #[test]
    fn test_legacy_syntax_rejected() {
        let err = parse_marker("start-embed-demo-scenes/foo", "").unwrap_err();
        assert!(matches!(err, EmbedError::LegacySyntax { .. }));
    }

    #[test]
    fn test_unrelated_comment_rejected() {
        let err = parse_marker("TODO rewrite this section", "").unwrap_err();
        assert!(matches!(err, EmbedError::Parse { .. }));
        let err = parse_marker("embed-demo stuff", "").unwrap_err();
        assert!(matches!(err, EmbedError::Parse { .. }));
    }

    #[test]
    fn test_empty_scene_path_after_colon() {
        let req = parse_marker("embed-demo:", "").unwrap();
        assert_eq!(req.scene, None);
    }

    #[test]
    fn test_marker_identity_distinguishes_occurrences() {
        let a = EmbedMarker::new("embed-demo", 0);
        let b = EmbedMarker::new("embed-demo", 1);
        let c = EmbedMarker::new("embed-demo", 0);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), c.id());
    }

    #[test]
    fn test_marker_identity_ignores_surrounding_whitespace() {
        let a = EmbedMarker::new("  embed-demo  ", 0);
        let b = EmbedMarker::new("embed-demo", 0);
        assert_eq!(a.id(), b.id());
    }
}
