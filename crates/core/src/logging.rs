//! Logging shared by the chip cores.
//!
//! Levels are stored in atomics so an embedding frontend can change
//! verbosity at runtime without locking. Messages are built lazily via a
//! closure, so a disabled category costs one atomic load per call site.
//!
//! ```rust
//! use raster_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Registers, LogLevel::Debug, || {
//!     format!("write {:02X} <- {:02X}", 0x1B, 0xFF)
//! });
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Log category for the different chip-core components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Register writes and reads
    Registers,
    /// Catch-up rendering and compositing
    Renderer,
    /// Beam clock, frame sync, stalls
    Timing,
    /// Raster/timer interrupt sources
    Interrupts,
    /// Unimplemented features/stubs
    Stubs,
}

const CATEGORY_COUNT: usize = 5;

fn category_index(category: LogCategory) -> usize {
    match category {
        LogCategory::Registers => 0,
        LogCategory::Renderer => 1,
        LogCategory::Timing => 2,
        LogCategory::Interrupts => 3,
        LogCategory::Stubs => 4,
    }
}

/// Global logging configuration.
///
/// A category with level `Off` falls back to the global level, so a
/// frontend can set one knob for everything and override per category.
pub struct LogConfig {
    global_level: AtomicU8,
    category_levels: [AtomicU8; CATEGORY_COUNT],
}

impl LogConfig {
    fn new() -> Self {
        const OFF: AtomicU8 = AtomicU8::new(LogLevel::Off as u8);
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            category_levels: [OFF; CATEGORY_COUNT],
        }
    }

    /// Get the global singleton instance
    pub fn global() -> &'static Self {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.category_levels[category_index(category)].store(level as u8, Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.category_levels[category_index(category)].load(Ordering::Relaxed))
    }

    /// A category-specific level, when set, overrides the global one.
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Reset all logging to Off
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for atomic in &self.category_levels {
            atomic.store(LogLevel::Off as u8, Ordering::Relaxed);
        }
    }
}

/// Log a message with the specified category and level.
///
/// The closure is only called when the category/level combination is
/// enabled, so format arguments for hot-path register traces are free
/// when tracing is off.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if config.should_log(category, level) {
        eprintln!("[{:?}] {}", category, message_fn());
    }
}
