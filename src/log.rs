//! Logging sink used by jobs and runners.
//!
//! Components hold an `Arc<dyn Logger>` and never call `tracing` directly, so
//! tests can run silent with [`NoOpLogger`]. Log output never feeds back into
//! job behavior.

use std::fmt::Arguments;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Leveled logging interface.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

/// Forwards to `tracing`, tagging every event with a sawmill name.
///
/// The subscriber is installed by the host (see `main.rs`); without one the
/// events are simply dropped.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    sawmill: String,
}

impl TracingLogger {
    pub fn new(sawmill: impl Into<String>) -> Self {
        Self {
            sawmill: sawmill.into(),
        }
    }

    pub fn sawmill(&self) -> &str {
        &self.sawmill
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        let sawmill = self.sawmill.as_str();
        match level {
            LogLevel::Trace => tracing::trace!(sawmill = sawmill, "{}", args),
            LogLevel::Debug => tracing::debug!(sawmill = sawmill, "{}", args),
            LogLevel::Info => tracing::info!(sawmill = sawmill, "{}", args),
            LogLevel::Warn => tracing::warn!(sawmill = sawmill, "{}", args),
            LogLevel::Error => tracing::error!(sawmill = sawmill, "{}", args),
        }
    }
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Captures formatted messages for assertions.
    #[derive(Default)]
    pub(crate) struct Capture(Mutex<Vec<(LogLevel, String)>>);

    impl Capture {
        pub(crate) fn messages(&self, level: LogLevel) -> Vec<String> {
            self.0
                .lock()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, msg)| msg.clone())
                .collect()
        }
    }

    impl Logger for Capture {
        fn log(&self, level: LogLevel, args: Arguments<'_>) {
            self.0.lock().push((level, args.to_string()));
        }
    }

    #[test]
    fn macros_route_to_the_right_level() {
        let capture = Arc::new(Capture::default());
        let logger: Arc<dyn Logger> = capture.clone();
        log_debug!(logger, "seed {}", 42);
        log_info!(logger, "done");

        let lines = capture.0.lock();
        assert_eq!(lines[0], (LogLevel::Debug, "seed 42".to_string()));
        assert_eq!(lines[1], (LogLevel::Info, "done".to_string()));
    }

    #[test]
    fn loggers_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoOpLogger>();
        assert_send_sync::<TracingLogger>();
    }

    #[test]
    fn tracing_logger_without_subscriber_is_harmless() {
        let logger = TracingLogger::new("shadow_map_job");
        assert_eq!(logger.sawmill(), "shadow_map_job");
        log_trace!(logger, "nobody is listening");
    }

    #[test]
    fn log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
    }
}
