//! Minimal helper utility to set the backtrace environment variable if not set.

/// The backtracing utility.
#[derive(Debug, Clone, Copy)]
pub struct Backtracing;

impl Backtracing {
    /// Sets `RUST_BACKTRACE=1` unless a value has already been provided.
    ///
    /// Call this first thing in `main`, before any thread is spawned.
    pub fn enable() {
        if std::env::var_os("RUST_BACKTRACE").is_none() {
            // SAFETY: called at startup on the main thread, so nothing else reads the
            // environment concurrently.
            unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
        }
    }
}
