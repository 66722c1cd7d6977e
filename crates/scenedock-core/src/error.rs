use miette::Diagnostic;
use thiserror::Error;

/// Per-marker failures in the embed pipeline.
///
/// Every variant is non-fatal: the pipeline logs the error, skips the marker
/// it belongs to, and keeps processing the rest of the document.
#[derive(Debug, Error, Diagnostic)]
pub enum EmbedError {
    #[error("marker does not match the embed grammar: {text:?}")]
    #[diagnostic(code(scenedock::marker::parse))]
    Parse { text: String },

    #[error("marker uses the retired start-embed syntax: {text:?}")]
    #[diagnostic(
        code(scenedock::marker::legacy_syntax),
        help("rewrite the marker as <!-- embed-<project>: <scene-path> -->")
    )]
    LegacySyntax { text: String },

    #[error("cannot expand {{$PATH}} for project {project:?} from route {route:?}")]
    #[diagnostic(code(scenedock::marker::path_expansion))]
    PathExpansion { project: String, route: String },

    #[error("scene path {path:?} has {found} segments, expected at least 4")]
    #[diagnostic(code(scenedock::marker::invalid_path))]
    InvalidPath { path: String, found: usize },

    #[error("document element missing while wiring widget controls: {what}")]
    #[diagnostic(code(scenedock::widget::dom_unavailable))]
    DomUnavailable { what: String },
}
