//! Browser/OS detection for platform-dependent behavior.
//!
//! The only decision hanging off this today is fullscreen capability:
//! mobile browsers (iOS Safari in particular) either lack the Fullscreen
//! API on iframes or make it unusable, so they get the emulated provider.

/// Detected platform traits.
#[derive(Clone, Copy, Debug, Default)]
pub struct Platform {
    pub android: bool,
    pub ios: bool,
    pub touch: bool,
    pub mobile: bool,
}

/// Detect the current platform from the user agent. Falls back to the
/// defaults (desktop, no touch) outside a browser environment.
pub fn detect() -> Platform {
    let Some(window) = web_sys::window() else {
        return Platform::default();
    };
    let navigator = window.navigator();
    let ua = navigator.user_agent().unwrap_or_default().to_lowercase();

    let android = ua.contains("android");
    let ios = ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod");
    let touch = navigator.max_touch_points() > 0;

    Platform {
        android,
        ios,
        touch,
        mobile: android || ios,
    }
}
