//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and the tick loop.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hourglass_core::config::ConfigError,
    },

    /// The configured day periods are unusable.
    #[error("calendar error: {source}")]
    Calendar {
        /// The underlying calendar error.
        #[from]
        source: hourglass_core::calendar::CalendarError,
    },

    /// A queue or watcher could not be set up.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: hourglass_core::SchedulerError,
    },

    /// The tick driver failed.
    #[error("driver error: {source}")]
    Driver {
        /// The underlying driver error.
        #[from]
        source: hourglass_core::driver::DriverError,
    },
}
