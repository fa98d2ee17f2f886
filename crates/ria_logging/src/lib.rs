#![deny(missing_docs)]
//! Shared logging utilities for the RIA client workspace.
//!
//! This crate provides the `ria_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger.

/// Target used by every `ria_*` macro, so the app can filter client logs
/// apart from reqwest/hyper noise.
pub const LOG_TARGET: &str = "ria";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! ria_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! ria_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! ria_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! ria_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! ria_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Debug in debug builds so failing poll sequences show every tick.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    #[test]
    fn macros_expand_without_a_logger() {
        crate::ria_trace!("trace {}", 1);
        crate::ria_debug!("debug {}", 2);
        crate::ria_info!("info {}", 3);
        crate::ria_warn!("warn {}", 4);
        crate::ria_error!("error {}", 5);
    }

    #[test]
    fn test_initializer_is_idempotent() {
        super::initialize_for_tests();
        super::initialize_for_tests();
    }
}
