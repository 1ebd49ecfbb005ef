//! Logging facade for the spatial structures
//!
//! The library only emits records through the `log` macros; binaries and
//! tests decide where they go.

pub use log::{debug, error, info, trace, warn};

/// Initialize `env_logger` from `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Initialize logging for unit tests (captured by the test harness).
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
