//! Plugin configuration.

use serde::{Deserialize, Serialize};

/// Options the host page passes at plugin construction.
///
/// Every field has a default; the host only overrides what it needs. Crossing
/// the JS boundary the field names are camelCased and missing fields fall
/// back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbedOptions {
    /// CSS selector for the element whose subtree is scanned for markers.
    /// Falls back to the document body when nothing matches.
    pub content_selector: String,
    /// Debounce window between a navigation trigger and the pipeline run,
    /// in milliseconds. Also the minimum interval between two runs.
    pub debounce_ms: u32,
    /// Markers processed per deferred slice of a run.
    pub chunk_size: usize,
    /// Defer iframe loading until the widget scrolls into view.
    pub lazy_load: bool,
    /// Caption line rendered under each widget; `None` disables it.
    pub caption: Option<String>,
    /// Iframe height bounds in px when fitted to the container width.
    pub min_frame_height: u32,
    pub max_frame_height: u32,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            content_selector: "#main".to_string(),
            debounce_ms: 150,
            chunk_size: 8,
            lazy_load: true,
            caption: Some("Use arrow keys to move \u{2022} Press R to reset".to_string()),
            min_frame_height: 300,
            max_frame_height: 800,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_fill_defaults() {
        let opts: EmbedOptions = serde_json::from_str(r#"{"lazyLoad": false}"#).unwrap();
        assert!(!opts.lazy_load);
        assert_eq!(opts.debounce_ms, 150);
        assert_eq!(opts.content_selector, "#main");
    }
}
