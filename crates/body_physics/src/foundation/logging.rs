//! Logging utilities and structured logging support
//!
//! The library only emits through the `log` facade. Binaries (and tests that
//! want output) install `env_logger` through the helpers below.

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a fallback filter when `RUST_LOG` is unset.
///
/// Returns `false` if a logger was already installed.
pub fn try_init_with_default(filter: &str) -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .try_init()
        .is_ok()
}
