//! Idempotent logger initialization for embedders.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the global `env_logger` once.
///
/// Honors `RUST_LOG` when set, defaulting to info level otherwise.
/// Subsequent calls are ignored, so embedders and tests may call this
/// freely.
pub fn init() {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        if let Ok(filter) = std::env::var("RUST_LOG") {
            let _ = builder.parse_filters(&filter);
        } else {
            let _ = builder.filter_level(log::LevelFilter::Info);
        }
        builder.init();
    });
}
