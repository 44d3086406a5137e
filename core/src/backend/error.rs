use serde_json::Value;
use std::{error::Error as StdError, fmt};

const BODY_PREVIEW_LIMIT: usize = 512;

pub const NO_RESPONSE_MESSAGE: &str = "No response from the server";
const GENERIC_FAILURE_MESSAGE: &str = "The server could not complete the request";
const DECODE_FAILURE_MESSAGE: &str = "The server sent a response that could not be read";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Status,
    Unknown,
}

impl BackendErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Status => "status",
            Self::Unknown => "unknown",
        }
    }

    /// The request never produced a usable HTTP response.
    pub fn is_transport(self) -> bool {
        matches!(self, Self::Timeout | Self::Connect | Self::Request)
    }
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct BackendError {
    kind: BackendErrorKind,
    status: Option<u16>,
    url: Option<String>,
    message: String,
    detail: Option<String>,
    source: Option<anyhow::Error>,
}

impl BackendError {
    pub fn kind(&self) -> BackendErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// `detail` / `message` extracted from a structured error body.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Message fit for an end user: server-provided detail verbatim when
    /// there is one, a generic line otherwise.
    pub fn user_message(&self) -> String {
        if self.kind.is_transport() {
            return NO_RESPONSE_MESSAGE.to_string();
        }
        match (&self.detail, self.kind) {
            (Some(detail), _) => detail.clone(),
            (None, BackendErrorKind::Decode) => DECODE_FAILURE_MESSAGE.to_string(),
            (None, _) => match self.status {
                Some(status) => format!("{GENERIC_FAILURE_MESSAGE} (HTTP {status})"),
                None => GENERIC_FAILURE_MESSAGE.to_string(),
            },
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, url: String) -> Self {
        let kind = if err.is_timeout() {
            BackendErrorKind::Timeout
        } else if err.is_connect() {
            BackendErrorKind::Connect
        } else if err.is_request() {
            BackendErrorKind::Request
        } else if err.is_body() {
            BackendErrorKind::Body
        } else if err.is_decode() {
            BackendErrorKind::Decode
        } else {
            BackendErrorKind::Unknown
        };
        let status = err.status().map(|s| s.as_u16());
        let message = err.to_string();
        BackendError {
            kind,
            status,
            url: Some(url),
            message,
            detail: None,
            source: Some(anyhow::Error::new(err)),
        }
    }

    pub(crate) fn status_error(status: u16, url: String, body: &str) -> Self {
        BackendError {
            kind: BackendErrorKind::Status,
            status: Some(status),
            url: Some(url),
            message: preview_body(body),
            detail: extract_detail(body),
            source: None,
        }
    }

    pub(crate) fn decode_error(status: u16, url: String, err: serde_json::Error, body: &str) -> Self {
        let message = format!(
            "failed to decode response body: {} | body={}",
            err,
            preview_body(body)
        );
        BackendError {
            kind: BackendErrorKind::Decode,
            status: Some(status),
            url: Some(url),
            message,
            detail: None,
            source: Some(anyhow::Error::new(err)),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backend http error kind={}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " status={}", status)?;
        }
        if let Some(url) = &self.url {
            write!(f, " url={}", url)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl StdError for BackendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out = String::new();
    let mut truncated = false;
    for (idx, ch) in trimmed.chars().enumerate() {
        if idx >= BODY_PREVIEW_LIMIT {
            truncated = true;
            break;
        }
        out.push(ch);
    }

    if truncated {
        out.push_str("...");
    }

    out
}

/// FastAPI answers `{"detail": "..."}`; other services use `message`.
/// Validation errors put a list under `detail`, which is not user text.
fn extract_detail(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body.trim()).ok()?;
    ["detail", "message"]
        .iter()
        .filter_map(|key| v.get(*key))
        .find_map(|field| match field {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_body_empty() {
        assert_eq!(preview_body("   "), "<empty body>");
    }

    #[test]
    fn preview_body_truncates() {
        let body = "a".repeat(BODY_PREVIEW_LIMIT + 10);
        let preview = preview_body(&body);
        assert!(preview.ends_with("..."));
        assert!(preview.len() <= BODY_PREVIEW_LIMIT + 3);
    }

    #[test]
    fn status_error_surfaces_detail_verbatim() {
        let err = BackendError::status_error(
            404,
            "http://localhost:8000/api/v1/agent/execute".to_string(),
            r#"{"detail":"Plan 7 not found"}"#,
        );
        assert_eq!(err.detail(), Some("Plan 7 not found"));
        assert_eq!(err.user_message(), "Plan 7 not found");

        let msg = err.to_string();
        assert!(msg.contains("kind=status"));
        assert!(msg.contains("status=404"));
        assert!(msg.contains("url=http://localhost:8000/api/v1/agent/execute"));
    }

    #[test]
    fn status_error_falls_back_to_message_field() {
        let err = BackendError::status_error(500, "u".to_string(), r#"{"message":"boom"}"#);
        assert_eq!(err.user_message(), "boom");
    }

    #[test]
    fn status_error_without_detail_is_generic() {
        let err = BackendError::status_error(
            422,
            "u".to_string(),
            r#"{"detail":[{"loc":["body","prompt"],"msg":"field required"}]}"#,
        );
        assert_eq!(err.detail(), None);
        assert_eq!(
            err.user_message(),
            "The server could not complete the request (HTTP 422)"
        );

        let err = BackendError::status_error(502, "u".to_string(), "<html>bad gateway</html>");
        assert!(err.user_message().contains("HTTP 502"));
    }

    #[test]
    fn decode_error_is_not_passed_through() {
        let decode_err = serde_json::from_str::<Value>("not json").unwrap_err();
        let err = BackendError::decode_error(200, "u".to_string(), decode_err, "not json");
        assert!(err.to_string().contains("failed to decode response body"));
        assert_eq!(err.user_message(), DECODE_FAILURE_MESSAGE);
    }
}
