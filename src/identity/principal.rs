use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const ADMIN_ROLE: &str = "admin";

/// The user profile as persisted by the login flow. Mirrors the backend's user response;
/// fields this crate does not know about are kept in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_phone_verified: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.role.is_none()
            && self.is_admin.is_none()
            && self.is_email_verified.is_none()
            && self.is_phone_verified.is_none()
            && self.extra.is_empty()
    }

    /// Admin if either signal says so. An explicit `isAdmin: false` does not veto `role: "admin"`.
    pub fn declares_admin(&self) -> bool {
        let flag = self.is_admin.unwrap_or(false);
        let role = self.role.as_deref().map(|r| r.trim().eq_ignore_ascii_case(ADMIN_ROLE)).unwrap_or(false);
        flag || role
    }
}

/// Parse a stored profile. Anything that is not a JSON object matching `Profile` is absent.
pub fn parse_profile(raw: &str) -> Option<Profile> {
    let raw = raw.trim();
    if raw.is_empty() { return None; }
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(target: "session", error = %e, "stored profile is not valid json; treating as no session");
            return None;
        }
    };
    match value {
        Value::Null => None,
        Value::Object(_) => match serde_json::from_value::<Profile>(value) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(target: "session", error = %e, "stored profile has unexpected shape; treating as no session");
                None
            }
        },
        other => {
            warn!(target: "session", kind = json_kind(&other), "stored profile is not an object; treating as no session");
            None
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Snapshot of who is asking. Produced by the session store; never written back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Principal {
    pub token: Option<String>,
    pub profile: Option<Profile>,
}

impl Principal {
    pub fn anonymous() -> Self { Self::default() }

    pub fn new(token: Option<String>, profile: Option<Profile>) -> Self { Self { token, profile } }

    /// Build from the raw stored values, dropping a profile that does not parse.
    pub fn from_raw(token: Option<String>, raw_profile: Option<&str>) -> Self {
        Self { token, profile: raw_profile.and_then(parse_profile) }
    }

    /// Token, if present and non-empty.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some() && self.profile.as_ref().map(|p| !p.is_empty()).unwrap_or(false)
    }

    pub fn has_elevated_privilege(&self) -> bool {
        self.profile.as_ref().map(Profile::declares_admin).unwrap_or(false)
    }

    /// Best identifier for log lines.
    pub fn label(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.email.as_deref().or(p.id.as_deref()))
            .unwrap_or("<anonymous>")
    }
}
