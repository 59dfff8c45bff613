//! Telemetry event model.
//!
//! An [`Event`] is built at the producer call site and is immutable from then
//! on. Small enumerations travel as integers on the wire, matching the
//! companion tool's decoder.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::DecodeError;

/// Declares a fieldless enum that is carried as a `u8` on the wire.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(into = "u8", try_from = "u8")]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = DecodeError;

            fn try_from(value: u8) -> Result<Self, DecodeError> {
                match value {
                    $( $value => Ok($name::$variant), )+
                    other => Err(DecodeError::Malformed(format!(
                        concat!("unknown ", stringify!($name), " {}"),
                        other
                    ))),
                }
            }
        }
    };
}

wire_enum! {
    /// Severity of an event, ordered from least to most severe.
    pub enum Level {
        /// Fine-grained tracing.
        Trace = 0,
        /// Debugging detail.
        Debug = 1,
        /// Informational.
        Info = 2,
        /// Something unexpected but recoverable.
        Warning = 3,
        /// An operation failed.
        Error = 4,
        /// The application cannot continue.
        Fatal = 5,
    }
}

wire_enum! {
    /// What an event describes.
    pub enum EventKind {
        /// A log line.
        Log = 0,
        /// The instrumented application started.
        AppStarted = 1,
        /// The instrumented application is exiting.
        AppExited = 2,
    }
}

wire_enum! {
    /// Where an event was captured.
    pub enum Origin {
        /// Captured from standard output.
        Stdout = 0,
        /// Captured from standard error.
        Stderr = 1,
        /// Polled from the OS log facility.
        OsLog = 2,
        /// Logged directly through the engine's entry point.
        Direct = 3,
    }
}

wire_enum! {
    /// Presentation markers attached to an event.
    pub enum Extra {
        /// Highlight the event in the companion.
        Highlight = 0,
        /// Marks the first event of a new run.
        NewStart = 1,
        /// The message carries a stack trace.
        StackTrace = 2,
    }
}

impl Level {
    /// All levels in ascending severity.
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Fatal,
    ];

    /// Lowercase name of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "warn" => Ok(Level::Warning),
            name => Level::ALL
                .into_iter()
                .find(|level| level.as_str() == name)
                .ok_or_else(|| DecodeError::Malformed(format!("unknown level {s:?}"))),
        }
    }
}

/// Call site of a direct log call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Source file path.
    pub file: String,
    /// Enclosing function or module path.
    pub function: String,
    /// Line number.
    pub line: u32,
}

impl SourceLocation {
    /// Create a source location.
    pub fn new(file: impl Into<String>, function: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            function: function.into(),
            line,
        }
    }
}

/// A single telemetry event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "EventRecord", from = "EventRecord")]
pub struct Event {
    id: Uuid,
    timestamp: DateTime<Utc>,
    kind: EventKind,
    level: Level,
    category: String,
    message: String,
    context: Option<BTreeMap<String, String>>,
    location: Option<SourceLocation>,
    extras: BTreeSet<Extra>,
    origin: Origin,
}

impl Event {
    /// Create a direct event stamped with a fresh id and the current time.
    pub fn new(kind: EventKind, level: Level, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            level,
            category: String::new(),
            message: message.into(),
            context: None,
            location: None,
            extras: BTreeSet::new(),
            origin: Origin::Direct,
        }
    }

    /// Create a `Log` event.
    pub fn log(level: Level, message: impl Into<String>) -> Self {
        Self::new(EventKind::Log, level, message)
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the key/value context.
    pub fn with_context(mut self, context: BTreeMap<String, String>) -> Self {
        self.context = Some(context);
        self
    }

    /// Attach a source location. Ignored for captured events.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        if self.origin == Origin::Direct {
            self.location = Some(location);
        }
        self
    }

    /// Add presentation markers.
    pub fn with_extras(mut self, extras: impl IntoIterator<Item = Extra>) -> Self {
        self.extras.extend(extras);
        self
    }

    /// Set the origin. Captured origins drop any source location.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        if origin != Origin::Direct {
            self.location = None;
        }
        self
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Event identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Creation time.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Event kind.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Severity.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Category (may be empty).
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Key/value context.
    pub fn context(&self) -> Option<&BTreeMap<String, String>> {
        self.context.as_ref()
    }

    /// Source location of a direct log call.
    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Presentation markers.
    pub fn extras(&self) -> &BTreeSet<Extra> {
        &self.extras
    }

    /// Capture origin.
    pub fn origin(&self) -> Origin {
        self.origin
    }
}

/// Flat wire shape of [`Event`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventRecord {
    id: Uuid,
    timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    kind: EventKind,
    level: Level,
    #[serde(default)]
    category: String,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(default)]
    extras: BTreeSet<Extra>,
    source: Origin,
}

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        let (file, function, line) = match event.location {
            Some(loc) => (Some(loc.file), Some(loc.function), Some(loc.line)),
            None => (None, None, None),
        };
        Self {
            id: event.id,
            timestamp: event.timestamp,
            kind: event.kind,
            level: event.level,
            category: event.category,
            message: event.message,
            context: event.context,
            file,
            function,
            line,
            extras: event.extras,
            source: event.origin,
        }
    }
}

impl From<EventRecord> for Event {
    fn from(record: EventRecord) -> Self {
        let location = match (record.file, record.line) {
            (Some(file), Some(line)) if record.source == Origin::Direct => Some(SourceLocation {
                file,
                function: record.function.unwrap_or_default(),
                line,
            }),
            _ => None,
        };
        Self {
            id: record.id,
            timestamp: record.timestamp,
            kind: record.kind,
            level: record.level,
            category: record.category,
            message: record.message,
            context: record.context,
            location,
            extras: record.extras,
            origin: record.source,
        }
    }
}
