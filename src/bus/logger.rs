//! Public logging entry point.

use std::collections::BTreeMap;
use std::panic::Location;

use super::queue::EventBus;
use crate::message::{Event, EventKind, Extra, Level, SourceLocation};

/// Cheap, cloneable handle that turns log calls into queued events.
///
/// Logging never blocks and never fails; when the bus is full the oldest
/// queued event is dropped instead.
#[derive(Debug, Clone)]
pub struct Logger {
    bus: EventBus,
    min_level: Level,
}

impl Logger {
    /// Create a logger feeding `bus`, discarding events below `min_level`.
    pub fn new(bus: EventBus, min_level: Level) -> Self {
        Self { bus, min_level }
    }

    /// Check if events at `level` are kept.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    /// Log a message, recording the caller's file and line.
    #[track_caller]
    pub fn log(
        &self,
        level: Level,
        category: &str,
        message: impl Into<String>,
        context: Option<BTreeMap<String, String>>,
        extras: &[Extra],
    ) {
        let caller = Location::caller();
        let location = SourceLocation::new(caller.file(), "", caller.line());
        self.log_at(level, category, message, context, extras, location);
    }

    /// Log a message with an explicit source location.
    pub fn log_at(
        &self,
        level: Level,
        category: &str,
        message: impl Into<String>,
        context: Option<BTreeMap<String, String>>,
        extras: &[Extra],
        location: SourceLocation,
    ) {
        if !self.enabled(level) {
            return;
        }
        let mut event = Event::log(level, message)
            .with_category(category)
            .with_location(location)
            .with_extras(extras.iter().copied());
        if let Some(context) = context {
            event = event.with_context(context);
        }
        self.bus.enqueue(event);
    }

    /// Record an application lifecycle event.
    pub fn lifecycle(&self, kind: EventKind, message: impl Into<String>) {
        self.bus.enqueue(Event::new(kind, Level::Info, message));
    }

    /// Queue an already built event, subject to the level filter.
    pub fn emit(&self, event: Event) {
        if self.enabled(event.level()) {
            self.bus.enqueue(event);
        }
    }

    /// The bus this logger feeds.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

/// Log through a [`Logger`] with `format!` arguments, recording file, module
/// path and line.
///
/// ```ignore
/// tailbeat::log!(logger, Level::Info, "net", "connected to {}", addr);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $category:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.enabled(level) {
            logger.log_at(
                level,
                $category,
                ::std::format!($($arg)+),
                ::std::option::Option::None,
                &[],
                $crate::message::SourceLocation::new(file!(), module_path!(), line!()),
            );
        }
    }};
}
