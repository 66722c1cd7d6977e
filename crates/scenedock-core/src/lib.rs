//! scenedock-core: embed pipeline logic without browser dependencies.
//!
//! This crate provides:
//! - the embed-marker grammar and parser (`marker`)
//! - demo URL resolution against the page location (`resolve`)
//! - the widget HTML scaffold (`scaffold`)
//! - the refresh state machine, generic over a [`DocumentHost`] (`refresh`)
//!
//! The flow is one-directional: locate markers, parse them, resolve URLs,
//! build widgets, all driven by the refresh controller. The DOM half lives
//! in `scenedock-browser`; everything here compiles and tests on any target.

pub mod error;
pub mod marker;
pub mod options;
pub mod refresh;
pub mod resolve;
pub mod scaffold;

pub use error::EmbedError;
pub use marker::{EmbedMarker, EmbedRequest, MARKER_PREFIX, MarkerId, ScenePath, parse_marker};
pub use options::EmbedOptions;
pub use refresh::{
    DocumentHost, NavigationSignal, RefreshController, RefreshState, RunReport, ScheduleAction,
    SliceOutcome,
};
pub use resolve::{ResolvedDemo, resolve_demo};
pub use scaffold::{DEFERRED_SRC_ATTR, WIDGET_ATTR, WidgetIds, render_widget_html};
pub use smol_str::SmolStr;
