//! Unified client error model.
//! One enum is shared by the transport, the session store and the CLI so that callers can make a
//! single decision (retry, redirect to login, display) regardless of which layer failed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateError {
    /// Missing credentials, or credentials the client refuses to send.
    #[error("{code}: {message}")]
    Auth { code: String, message: String },
    /// Non-2xx response, surfaced with the status and body exactly as received.
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("{code}: {message}")]
    Transport { code: String, message: String },
    #[error("{code}: {message}")]
    Decode { code: String, message: String },
    #[error("{code}: {message}")]
    Storage { code: String, message: String },
    #[error("{code}: {message}")]
    Config { code: String, message: String },
}

impl GateError {
    pub fn code_str(&self) -> &str {
        match self {
            GateError::Http { .. } => "http_status",
            GateError::Auth { code, .. }
            | GateError::Transport { code, .. }
            | GateError::Decode { code, .. }
            | GateError::Storage { code, .. }
            | GateError::Config { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            GateError::Http { body, .. } => body.as_str(),
            GateError::Auth { message, .. }
            | GateError::Transport { message, .. }
            | GateError::Decode { message, .. }
            | GateError::Storage { message, .. }
            | GateError::Config { message, .. } => message.as_str(),
        }
    }

    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { GateError::Auth { code: code.into(), message: msg.into() } }
    pub fn http<S: Into<String>>(status: u16, body: S) -> Self { GateError::Http { status, body: body.into() } }
    pub fn transport<S: Into<String>>(code: S, msg: S) -> Self { GateError::Transport { code: code.into(), message: msg.into() } }
    pub fn decode<S: Into<String>>(code: S, msg: S) -> Self { GateError::Decode { code: code.into(), message: msg.into() } }
    pub fn storage<S: Into<String>>(code: S, msg: S) -> Self { GateError::Storage { code: code.into(), message: msg.into() } }
    pub fn config<S: Into<String>>(code: S, msg: S) -> Self { GateError::Config { code: code.into(), message: msg.into() } }

    /// Status a gateway would report for this error. `Http` keeps the backend's own status.
    pub fn http_status(&self) -> u16 {
        match self {
            GateError::Auth { .. } => 401,
            GateError::Http { status, .. } => *status,
            GateError::Transport { .. } => 503,
            GateError::Decode { .. } => 502,
            GateError::Storage { .. } => 500,
            GateError::Config { .. } => 400,
        }
    }

    /// True when the caller should drop the session and send the user to login.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, GateError::Auth { .. } | GateError::Http { status: 401, .. })
    }
}

pub type GateResult<T> = Result<T, GateError>;

impl From<reqwest::Error> for GateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return GateError::decode("invalid_body".to_string(), err.to_string());
        }
        if let Some(status) = err.status() {
            return GateError::http(status.as_u16(), err.to_string());
        }
        GateError::transport("http_transport".to_string(), err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GateError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            // Upgrade refused by the server: keep the status so 401s route to login
            WsError::Http(resp) => {
                let status = resp.status().as_u16();
                let body = resp
                    .body()
                    .as_ref()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default();
                GateError::Http { status, body }
            }
            other => GateError::transport("ws_transport".to_string(), other.to_string()),
        }
    }
}

impl From<serde_json::Error> for GateError {
    fn from(err: serde_json::Error) -> Self {
        GateError::decode("invalid_json".to_string(), err.to_string())
    }
}

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        GateError::storage("io".to_string(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(GateError::auth("no_token", "missing").http_status(), 401);
        assert_eq!(GateError::http(404, "nope").http_status(), 404);
        assert_eq!(GateError::transport("http_transport", "refused").http_status(), 503);
        assert_eq!(GateError::decode("invalid_json", "eof").http_status(), 502);
        assert_eq!(GateError::storage("io", "denied").http_status(), 500);
        assert_eq!(GateError::config("bad_flag", "x").http_status(), 400);
    }

    #[test]
    fn auth_rejection_covers_local_and_backend_401() {
        assert!(GateError::auth("no_token", "missing").is_auth_rejection());
        assert!(GateError::http(401, "{\"detail\":\"Could not validate credentials\"}").is_auth_rejection());
        assert!(!GateError::http(403, "inactive").is_auth_rejection());
        assert!(!GateError::transport("http_transport", "refused").is_auth_rejection());
    }

    #[test]
    fn http_error_keeps_body_verbatim() {
        let e = GateError::http(500, "{\"detail\":\"Failed to fetch user applications\"}");
        assert_eq!(e.code_str(), "http_status");
        assert_eq!(e.message(), "{\"detail\":\"Failed to fetch user applications\"}");
        assert_eq!(e.to_string(), "http 500: {\"detail\":\"Failed to fetch user applications\"}");
    }

    #[test]
    fn serializes_with_type_tag() {
        let v = serde_json::to_value(GateError::auth("no_token", "missing")).unwrap();
        assert_eq!(v["type"], "auth");
        assert_eq!(v["code"], "no_token");
    }
}
