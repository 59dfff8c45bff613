//! Framing codec.
//!
//! Wire format: one compact JSON object per record, UTF-8, terminated by a
//! single [`RECORD_DELIMITER`] byte. Compact JSON escapes control characters
//! inside strings, so the delimiter never occurs inside a payload.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::catalog::{InboundMessage, OutboundMessage};
use crate::core::{DecodeError, EncodeError, RECORD_DELIMITER};

/// Encode any serializable message into one delimited record.
pub fn encode_record<M: Serialize>(message: &M) -> Result<Vec<u8>, EncodeError> {
    let mut record = serde_json::to_vec(message)?;
    if record.contains(&RECORD_DELIMITER) {
        return Err(EncodeError::EmbeddedDelimiter);
    }
    record.push(RECORD_DELIMITER);
    Ok(record)
}

/// Decode one record (without its delimiter).
///
/// Returns `Ok(None)` for an empty record.
pub fn decode_record<M: DeserializeOwned>(record: &[u8]) -> Result<Option<M>, DecodeError> {
    if record.is_empty() {
        return Ok(None);
    }
    let text = std::str::from_utf8(record).map_err(|_| DecodeError::InvalidUtf8)?;
    Ok(Some(serde_json::from_str(text)?))
}

/// Encode an outbound message.
pub fn encode(message: &OutboundMessage) -> Result<Vec<u8>, EncodeError> {
    encode_record(message)
}

/// Decode an inbound record.
pub fn decode(record: &[u8]) -> Result<Option<InboundMessage>, DecodeError> {
    decode_record(record)
}

/// Split the first complete record off the front of `buffer`.
///
/// Returns the record without its delimiter and the number of bytes consumed
/// (record plus delimiter), or `None` if no complete record is buffered.
pub fn split_record(buffer: &[u8]) -> Option<(&[u8], usize)> {
    let end = buffer.iter().position(|&b| b == RECORD_DELIMITER)?;
    Some((&buffer[..end], end + 1))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::message::{
        AppEnvironment, AppInfo, AppWindow, Appearance, Event, Extra, Level, Origin,
        PreferencePatch, PreferenceValue, Rect, SourceLocation, WindowResizeRequest,
    };

    fn sample_event() -> Event {
        let mut context = BTreeMap::new();
        context.insert("user".to_owned(), "42".to_owned());
        Event::log(Level::Error, "line one\nline two")
            .with_category("net")
            .with_context(context)
            .with_location(SourceLocation::new("src/lib.rs", "lib::run", 7))
            .with_extras([Extra::NewStart])
    }

    fn sample_patches() -> Vec<PreferencePatch> {
        let date = Utc.with_ymd_and_hms(2025, 10, 8, 12, 0, 0).unwrap();
        let mut nested = BTreeMap::new();
        nested.insert("a".to_owned(), PreferenceValue::Int(1));
        vec![
            PreferencePatch::set("name", "tail\nbeat"),
            PreferencePatch::set("count", 3i64),
            PreferencePatch::set("on", true),
            PreferencePatch::set("ratio", 0.5),
            PreferencePatch::set("blob", vec![0u8, 10, 255]),
            PreferencePatch::set("when", date),
            PreferencePatch::set("langs", PreferenceValue::Array(vec!["en".into()])),
            PreferencePatch::set("nested", PreferenceValue::Map(nested)),
            PreferencePatch::delete("old"),
        ]
    }

    #[test]
    fn test_outbound_round_trip() {
        let messages = vec![
            OutboundMessage::Ack("hello".into()),
            OutboundMessage::Error("bad\nthing".into()),
            OutboundMessage::LogEvent(sample_event()),
            OutboundMessage::LogEvent(
                Event::log(Level::Info, "captured").with_origin(Origin::Stderr),
            ),
            OutboundMessage::EnvironmentSnapshot(AppEnvironment::new(
                Some("en_US".into()),
                Some(Appearance::Light),
            )),
            OutboundMessage::AppInfo(AppInfo::new(
                "Demo",
                Some("io.demo".into()),
                "1.0",
                "7",
                vec!["en".into(), "de".into()],
            )),
            OutboundMessage::WindowList(vec![AppWindow::new(
                1,
                "Main",
                Rect::new(0.0, 0.0, 800.0, 600.0),
            )]),
            OutboundMessage::PreferenceSnapshot(sample_patches()),
        ];

        for msg in messages {
            let record = encode(&msg).unwrap();
            assert_eq!(record.last(), Some(&RECORD_DELIMITER));
            let (body, consumed) = split_record(&record).unwrap();
            assert_eq!(consumed, record.len());
            let back: OutboundMessage = decode_record(body).unwrap().unwrap();
            assert_eq!(back, msg);
        }
    }

    #[test]
    fn test_inbound_round_trip() {
        let messages = vec![
            InboundMessage::Ack("x".into()),
            InboundMessage::Error("y".into()),
            InboundMessage::RequestPreferences {},
            InboundMessage::LanguageChangeRequest("de_DE".into()),
            InboundMessage::AppearanceChangeRequest(Appearance::Dark),
            InboundMessage::WindowResizeRequest(WindowResizeRequest::new(
                2,
                Rect::new(1.0, 2.0, 3.0, 4.0),
            )),
            InboundMessage::WindowActivateRequest(9),
            InboundMessage::PreferencePatch(sample_patches()),
        ];

        for msg in messages {
            let record = encode_record(&msg).unwrap();
            let (body, _) = split_record(&record).unwrap();
            assert_eq!(decode(body).unwrap(), Some(msg));
        }
    }

    #[test]
    fn test_no_raw_newline_in_payload() {
        let record = encode(&OutboundMessage::LogEvent(sample_event())).unwrap();
        let newlines = record.iter().filter(|&&b| b == RECORD_DELIMITER).count();
        assert_eq!(newlines, 1);
    }

    #[test]
    fn test_empty_record_is_no_message() {
        assert_eq!(decode(b"").unwrap(), None);
    }

    #[test]
    fn test_malformed_record() {
        assert!(matches!(decode(b"{\"bad json"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode(&[0xff, 0xfe]), Err(DecodeError::InvalidUtf8)));
    }

    #[test]
    fn test_split_record() {
        assert_eq!(split_record(b"partial"), None);
        assert_eq!(split_record(b"a\nb\n"), Some((&b"a"[..], 2)));
        assert_eq!(split_record(b"\nrest"), Some((&b""[..], 1)));
    }
}
