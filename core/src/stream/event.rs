//! Inbound progress frames and their normalized form.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::backend::text_or_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    StepStart,
    StepProgress,
    StepComplete,
    StepError,
    Generic,
}

impl ProgressKind {
    /// Unknown and missing tags collapse into `Generic`.
    pub fn from_wire(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some("step_start") => Self::StepStart,
            Some("step_progress") => Self::StepProgress,
            Some("step_complete") => Self::StepComplete,
            Some("step_error") => Self::StepError,
            Some(_) | None => Self::Generic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StepStart => "step_start",
            Self::StepProgress => "step_progress",
            Self::StepComplete => "step_complete",
            Self::StepError => "step_error",
            Self::Generic => "generic",
        }
    }
}

/// Frame exactly as the backend sends it. Every field is optional and loosely
/// typed; nothing here is trusted until `normalize` ran.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFrame {
    #[serde(rename = "type", default, deserialize_with = "loose_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "loose_step")]
    pub step: Option<u32>,
    #[serde(default, deserialize_with = "loose_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub progress: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "text_or_json")]
    pub result: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: ProgressKind,
    /// 1-based step index.
    pub step: Option<u32>,
    pub message: Option<String>,
    pub description: Option<String>,
    pub progress: Option<String>,
    pub error: Option<String>,
    pub result: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(kind: ProgressKind, step: Option<u32>) -> Self {
        Self {
            kind,
            step,
            message: None,
            description: None,
            progress: None,
            error: None,
            result: None,
            timestamp: Utc::now(),
        }
    }

    /// Best human-readable line for this event.
    pub fn summary(&self) -> Option<&str> {
        self.error
            .as_deref()
            .filter(|_| self.kind == ProgressKind::StepError)
            .or(self.message.as_deref())
            .or(self.progress.as_deref())
            .or(self.description.as_deref())
            .or(self.result.as_deref())
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame is not valid utf-8")]
    Utf8,
    #[error("frame is not a JSON event: {0}")]
    Json(serde_json::Error),
    #[error("frame is a JSON {0}, expected an object")]
    NotObject(&'static str),
}

/// Only JSON objects are events. Arrays would otherwise fill `RawFrame`
/// positionally.
pub fn decode_frame(text: &str) -> Result<ProgressEvent, DecodeError> {
    let value: Value = serde_json::from_str(text).map_err(DecodeError::Json)?;
    let raw = match value {
        Value::Object(_) => RawFrame::deserialize(value).map_err(DecodeError::Json)?,
        Value::Array(_) => return Err(DecodeError::NotObject("array")),
        Value::String(_) => return Err(DecodeError::NotObject("string")),
        Value::Number(_) => return Err(DecodeError::NotObject("number")),
        Value::Bool(_) => return Err(DecodeError::NotObject("bool")),
        Value::Null => return Err(DecodeError::NotObject("null")),
    };
    Ok(normalize(raw, Utc::now()))
}

pub fn decode_binary(bytes: &[u8]) -> Result<ProgressEvent, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;
    decode_frame(text)
}

pub fn normalize(raw: RawFrame, now: DateTime<Utc>) -> ProgressEvent {
    let timestamp = raw
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);

    ProgressEvent {
        kind: ProgressKind::from_wire(raw.kind.as_deref()),
        step: raw.step,
        message: raw.message,
        description: raw.description,
        progress: raw.progress,
        error: raw.error,
        result: raw.result,
        timestamp,
    }
}

/// RFC 3339, or a naive ISO timestamp (Python's `isoformat()`) taken as UTC.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn loose_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(match v {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn loose_step<'de, D>(de: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(match v {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn missing_type_defaults_to_generic() {
        let ev = decode_frame(r#"{"message":"warming up"}"#).unwrap();
        assert_eq!(ev.kind, ProgressKind::Generic);
        assert_eq!(ev.message.as_deref(), Some("warming up"));
    }

    #[test]
    fn unknown_type_defaults_to_generic() {
        let ev = decode_frame(r#"{"type":"heartbeat","step":2}"#).unwrap();
        assert_eq!(ev.kind, ProgressKind::Generic);
        assert_eq!(ev.step, Some(2));
    }

    #[test]
    fn known_types_map_exhaustively() {
        for (tag, kind) in [
            ("step_start", ProgressKind::StepStart),
            ("step_progress", ProgressKind::StepProgress),
            ("step_complete", ProgressKind::StepComplete),
            ("step_error", ProgressKind::StepError),
            ("generic", ProgressKind::Generic),
        ] {
            let ev = decode_frame(&format!(r#"{{"type":"{tag}"}}"#)).unwrap();
            assert_eq!(ev.kind, kind);
            assert_eq!(ev.kind.as_str(), tag);
        }
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert!(matches!(decode_frame("{not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode_frame("42"), Err(DecodeError::NotObject("number"))));
        assert!(matches!(decode_binary(&[0xff, 0xfe]), Err(DecodeError::Utf8)));
    }

    #[test]
    fn non_object_frames_are_rejected() {
        for (frame, shape) in [
            ("[]", "array"),
            (r#"["step_error",3,"desc",null,null,"boom"]"#, "array"),
            (r#""step_start""#, "string"),
            ("true", "bool"),
            ("null", "null"),
        ] {
            match decode_frame(frame) {
                Err(DecodeError::NotObject(got)) => assert_eq!(got, shape, "{frame}"),
                other => panic!("{frame} decoded as {other:?}"),
            }
        }
        assert!(matches!(
            decode_binary(br#"["step_error",3]"#),
            Err(DecodeError::NotObject("array"))
        ));
    }

    #[test]
    fn optional_fields_pass_through() {
        let ev = decode_frame(
            r#"{"type":"step_complete","step":"3","description":"Book flights",
                "progress":"100%","result":{"booked":true},"error":null}"#,
        )
        .unwrap();
        assert_eq!(ev.kind, ProgressKind::StepComplete);
        assert_eq!(ev.step, Some(3));
        assert_eq!(ev.description.as_deref(), Some("Book flights"));
        assert_eq!(ev.progress.as_deref(), Some("100%"));
        assert_eq!(ev.result.as_deref(), Some(r#"{"booked":true}"#));
        assert_eq!(ev.error, None);
    }

    #[test]
    fn timestamp_defaults_to_now_when_absent() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let ev = normalize(RawFrame::default(), now);
        assert_eq!(ev.timestamp, now);
    }

    #[test]
    fn timestamp_accepts_rfc3339_and_naive_iso() {
        let now = Utc::now();
        let raw = RawFrame {
            timestamp: Some("2024-06-01T12:00:00+02:00".to_string()),
            ..Default::default()
        };
        assert_eq!(
            normalize(raw, now).timestamp,
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
        );

        let raw = RawFrame {
            timestamp: Some("2024-06-01T12:00:00.250000".to_string()),
            ..Default::default()
        };
        let ts = normalize(raw, now).timestamp;
        assert_eq!(ts.timestamp_millis() % 1000, 250);

        let raw = RawFrame {
            timestamp: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert_eq!(normalize(raw, now).timestamp, now);
    }

    #[test]
    fn summary_prefers_error_for_step_error() {
        let mut ev = ProgressEvent::new(ProgressKind::StepError, Some(1));
        ev.error = Some("tool crashed".to_string());
        ev.description = Some("Search flights".to_string());
        assert_eq!(ev.summary(), Some("tool crashed"));

        ev.kind = ProgressKind::StepStart;
        assert_eq!(ev.summary(), Some("Search flights"));
    }
}
