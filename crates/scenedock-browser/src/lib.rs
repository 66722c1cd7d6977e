//! Browser DOM layer for scenedock.
//!
//! This crate locates embed markers in the live document, builds demo
//! widgets for them, and feeds navigation events into the core refresh
//! controller. It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: `DocumentHost` over the real document - marker locator and
//!   widget insertion
//! - `widget`: per-widget control wiring (fullscreen, pop-out, lazy
//!   loading, responsive sizing)
//! - `fullscreen`: capability-selected fullscreen provider
//! - `lazy`: deferred iframe loading via a shared visibility observer
//! - `plugin`: the merged navigation signal source and run scheduling
//! - `platform`: browser/OS detection
//!
//! # Re-exports
//!
//! This crate re-exports `scenedock-core` for convenience, so consumers
//! only need to depend on `scenedock-browser`.

pub use scenedock_core;
pub use scenedock_core::*;

pub mod dom;
pub mod fullscreen;
pub mod lazy;
pub mod platform;
pub mod plugin;
pub mod widget;

pub use dom::BrowserDocument;
pub use fullscreen::FullscreenProvider;
pub use lazy::LazyLoader;
pub use platform::Platform;
pub use plugin::EmbedPlugin;
