//! Console logging.
//!
//! In the browser everything goes to the devtools console. Native builds
//! (unit tests) cannot call into `web_sys`, so they write to stderr instead.

const PREFIX: &str = "[clicker]";

pub fn info(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&format!("{PREFIX} {msg}").into());
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{PREFIX} {msg}");
}

pub fn warn(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&format!("{PREFIX} {msg}").into());
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{PREFIX} warn: {msg}");
}

pub fn error(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&format!("{PREFIX} {msg}").into());
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{PREFIX} error: {msg}");
}
