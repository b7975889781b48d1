use crate::domain::logging::{LogEntry, LogLevel, Logger, TimeProvider};

/// Logger writing to the browser console, one console method per level.
pub struct ConsoleLogger {
    min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    pub fn new_production() -> Self {
        Self::new(LogLevel::Info)
    }

    pub fn new_development() -> Self {
        Self::new(LogLevel::Debug)
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }
        let line = entry.format();

        #[cfg(target_arch = "wasm32")]
        {
            match entry.level {
                LogLevel::Trace | LogLevel::Debug => gloo::console::debug!(line),
                LogLevel::Info => gloo::console::info!(line),
                LogLevel::Warn => gloo::console::warn!(line),
                LogLevel::Error => gloo::console::error!(line),
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        eprintln!("{}", line);
    }
}

/// `performance.now()` based clock for log timestamps.
#[derive(Default)]
pub struct BrowserTimeProvider;

impl BrowserTimeProvider {
    pub fn new() -> Self {
        Self
    }
}

impl TimeProvider for BrowserTimeProvider {
    fn now_ms(&self) -> f64 {
        crate::time_utils::now_ms()
    }

    fn format_timestamp(&self, timestamp_ms: f64) -> String {
        crate::time_utils::format_elapsed(timestamp_ms)
    }
}
