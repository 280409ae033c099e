/// Logs through `tracing::info!` only while the `debug-logging` setting is on.
///
/// The first argument is the current value of that setting.
#[macro_export]
macro_rules! debug_if_enabled {
    ($enabled:expr, $($arg:tt)*) => {
        if $enabled {
            tracing::info!($($arg)*);
        }
    };
}

/// Per-frame chatter, skipped entirely unless TRACE is enabled
#[macro_export]
macro_rules! trace_if_enabled {
    ($($arg:tt)*) => {
        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!($($arg)*);
        }
    };
}
