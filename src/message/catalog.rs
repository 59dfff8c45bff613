//! Message catalog.
//!
//! The closed set of messages exchanged with the companion tool. Both unions
//! are externally tagged: every record is a JSON object with a single key
//! naming the variant.

use serde::{Deserialize, Serialize};

use super::event::Event;
use super::preference::PreferencePatch;
use crate::core::PAYLOAD_SCHEMA_VERSION;

fn schema_version() -> u32 {
    PAYLOAD_SCHEMA_VERSION
}

/// Messages sent from the application to the companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Acknowledgement or greeting.
    Ack(String),
    /// Error report.
    Error(String),
    /// A telemetry event.
    #[serde(rename = "log")]
    LogEvent(Event),
    /// Current language/appearance.
    #[serde(rename = "environment")]
    EnvironmentSnapshot(AppEnvironment),
    /// Application identity.
    #[serde(rename = "info")]
    AppInfo(AppInfo),
    /// All application windows.
    #[serde(rename = "windows")]
    WindowList(Vec<AppWindow>),
    /// Full preference snapshot.
    #[serde(rename = "defaults")]
    PreferenceSnapshot(Vec<PreferencePatch>),
}

impl OutboundMessage {
    /// Short variant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Ack(_) => "ack",
            OutboundMessage::Error(_) => "error",
            OutboundMessage::LogEvent(_) => "log",
            OutboundMessage::EnvironmentSnapshot(_) => "environment",
            OutboundMessage::AppInfo(_) => "info",
            OutboundMessage::WindowList(_) => "windows",
            OutboundMessage::PreferenceSnapshot(_) => "defaults",
        }
    }
}

/// Messages sent from the companion to the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InboundMessage {
    /// Acknowledgement.
    Ack(String),
    /// Error report.
    Error(String),
    /// Companion asks for a fresh preference snapshot.
    #[serde(rename = "requestDefaults")]
    RequestPreferences {},
    /// Switch the displayed language to a locale identifier.
    LanguageChangeRequest(String),
    /// Switch between light and dark appearance.
    AppearanceChangeRequest(Appearance),
    /// Move/resize a window.
    WindowResizeRequest(WindowResizeRequest),
    /// Bring a window to front and make it key.
    #[serde(rename = "windowAsKeyRequest")]
    WindowActivateRequest(i64),
    /// Set or delete preference keys.
    #[serde(rename = "userDefaultsPatch")]
    PreferencePatch(Vec<PreferencePatch>),
}

impl InboundMessage {
    /// Short variant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Ack(_) => "ack",
            InboundMessage::Error(_) => "error",
            InboundMessage::RequestPreferences {} => "requestDefaults",
            InboundMessage::LanguageChangeRequest(_) => "languageChangeRequest",
            InboundMessage::AppearanceChangeRequest(_) => "appearanceChangeRequest",
            InboundMessage::WindowResizeRequest(_) => "windowResizeRequest",
            InboundMessage::WindowActivateRequest(_) => "windowAsKeyRequest",
            InboundMessage::PreferencePatch(_) => "userDefaultsPatch",
        }
    }
}

/// Light or dark appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    /// Light appearance.
    Light,
    /// Dark appearance.
    Dark,
}

/// Window rectangle, encoded as `[[x, y], [width, height]]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RectRecord", into = "RectRecord")]
pub struct Rect {
    /// Origin x.
    pub x: f64,
    /// Origin y.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

type RectRecord = ((f64, f64), (f64, f64));

impl Rect {
    /// Create a rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<RectRecord> for Rect {
    fn from(((x, y), (width, height)): RectRecord) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<Rect> for RectRecord {
    fn from(rect: Rect) -> Self {
        ((rect.x, rect.y), (rect.width, rect.height))
    }
}

/// Application identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    /// Payload schema version.
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    /// Display name.
    pub name: String,
    /// Bundle/package identifier.
    #[serde(default)]
    pub bundle_id: Option<String>,
    /// Marketing version.
    pub version: String,
    /// Build number.
    pub build: String,
    /// Available localizations.
    #[serde(default)]
    pub localizations: Vec<String>,
}

impl AppInfo {
    /// Create app info with the current schema version.
    pub fn new(
        name: impl Into<String>,
        bundle_id: Option<String>,
        version: impl Into<String>,
        build: impl Into<String>,
        localizations: Vec<String>,
    ) -> Self {
        Self {
            schema_version: PAYLOAD_SCHEMA_VERSION,
            name: name.into(),
            bundle_id,
            version: version.into(),
            build: build.into(),
            localizations,
        }
    }
}

/// Current language and appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEnvironment {
    /// Payload schema version.
    #[serde(default = "schema_version")]
    pub schema: u32,
    /// Active locale identifier.
    #[serde(default)]
    pub language: Option<String>,
    /// Active appearance.
    #[serde(default)]
    pub appearance: Option<Appearance>,
}

impl AppEnvironment {
    /// Create an environment snapshot with the current schema version.
    pub fn new(language: Option<String>, appearance: Option<Appearance>) -> Self {
        Self {
            schema: PAYLOAD_SCHEMA_VERSION,
            language,
            appearance,
        }
    }
}

/// One application window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppWindow {
    /// Payload schema version.
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    /// Window identifier.
    pub window_number: i64,
    /// Window title.
    #[serde(default)]
    pub title: String,
    /// Window frame.
    pub frame: Rect,
}

impl AppWindow {
    /// Create a window description with the current schema version.
    pub fn new(window_number: i64, title: impl Into<String>, frame: Rect) -> Self {
        Self {
            schema_version: PAYLOAD_SCHEMA_VERSION,
            window_number,
            title: title.into(),
            frame,
        }
    }
}

/// Request to move/resize a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowResizeRequest {
    /// Payload schema version.
    #[serde(default = "schema_version")]
    pub schema_version: u32,
    /// Target window.
    pub window_number: i64,
    /// Requested frame.
    pub frame: Rect,
}

impl WindowResizeRequest {
    /// Create a resize request with the current schema version.
    pub fn new(window_number: i64, frame: Rect) -> Self {
        Self {
            schema_version: PAYLOAD_SCHEMA_VERSION,
            window_number,
            frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outbound_discriminators() {
        let cases = [
            (OutboundMessage::Ack("hello".into()), "ack"),
            (OutboundMessage::Error("boom".into()), "error"),
            (
                OutboundMessage::EnvironmentSnapshot(AppEnvironment::new(None, None)),
                "environment",
            ),
            (OutboundMessage::WindowList(vec![]), "windows"),
            (OutboundMessage::PreferenceSnapshot(vec![]), "defaults"),
        ];

        for (msg, key) in cases {
            let value = serde_json::to_value(&msg).unwrap();
            assert!(value.get(key).is_some(), "missing key {key} in {value}");
            assert_eq!(msg.kind(), key);
        }
    }

    #[test]
    fn test_inbound_from_companion_json() {
        let msg: InboundMessage = serde_json::from_value(json!({"ack": "x"})).unwrap();
        assert_eq!(msg, InboundMessage::Ack("x".into()));

        let msg: InboundMessage = serde_json::from_value(json!({"requestDefaults": {}})).unwrap();
        assert_eq!(msg, InboundMessage::RequestPreferences {});

        let msg: InboundMessage =
            serde_json::from_value(json!({"appearanceChangeRequest": "dark"})).unwrap();
        assert_eq!(msg, InboundMessage::AppearanceChangeRequest(Appearance::Dark));

        let msg: InboundMessage = serde_json::from_value(json!({"windowAsKeyRequest": 7})).unwrap();
        assert_eq!(msg, InboundMessage::WindowActivateRequest(7));
    }

    #[test]
    fn test_resize_request_frame_shape() {
        let msg: InboundMessage = serde_json::from_value(json!({
            "windowResizeRequest": {
                "schemaVersion": 1,
                "windowNumber": 3,
                "frame": [[10.0, 20.0], [640.0, 480.0]]
            }
        }))
        .unwrap();

        assert_eq!(
            msg,
            InboundMessage::WindowResizeRequest(WindowResizeRequest::new(
                3,
                Rect::new(10.0, 20.0, 640.0, 480.0)
            ))
        );
    }

    #[test]
    fn test_schema_version_defaults() {
        let env: AppEnvironment = serde_json::from_value(json!({"language": "de"})).unwrap();
        assert_eq!(env.schema, 1);
        assert_eq!(env.language.as_deref(), Some("de"));
        assert_eq!(env.appearance, None);
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let result = serde_json::from_value::<InboundMessage>(json!({"selfDestruct": true}));
        assert!(result.is_err());
    }
}
