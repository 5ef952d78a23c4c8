//! Login and logout: the only code path that writes session state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::endpoints::Capability;
use crate::error::{GateError, GateResult};
use crate::identity::{Principal, Profile, SessionStore, SessionWriter};

use super::transport::AuthedClient;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: String,
    password: &'a str,
}

/// Backend reply to a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: Profile,
}

pub struct AuthFlow {
    client: AuthedClient,
    writer: SessionWriter,
}

impl AuthFlow {
    pub fn new(client: AuthedClient, writer: SessionWriter) -> Self { Self { client, writer } }

    pub fn session(&self) -> SessionStore { self.writer.reader() }

    /// Exchange credentials for a token and persist token and profile.
    pub async fn login(&self, email: &str, password: &str) -> GateResult<Principal> {
        let url = self.client.endpoints().join(Capability::Auth, "/login");
        let req = LoginRequest { email: email.trim().to_lowercase(), password };
        let resp: LoginResponse = self.client.post_public(&url, &req).await?;

        if let Some(kind) = resp.token_type.as_deref() {
            if !kind.eq_ignore_ascii_case("bearer") {
                return Err(GateError::auth("unsupported_token_type".to_string(), format!("backend issued a {} token", kind)));
            }
        }
        if resp.access_token.is_empty() {
            return Err(GateError::auth("missing_token", "login response carried an empty token"));
        }
        if resp.user.is_empty() {
            return Err(GateError::auth("missing_profile", "login response carried no user profile"));
        }

        self.writer.persist(&resp.access_token, &resp.user)?;
        let principal = Principal::new(Some(resp.access_token), Some(resp.user));
        info!(target: "auth", user = principal.label(), admin = principal.has_elevated_privilege(), "logged in");
        Ok(principal)
    }

    /// Tell the backend (best effort) and drop the local session regardless.
    pub async fn logout(&self) -> GateResult<()> {
        let principal = self.session().current_principal();
        if principal.bearer().is_some() {
            let url = self.client.endpoints().join(Capability::Auth, "/logout");
            if let Err(e) = self.client.post_json::<_, Value>(&principal, &url, &serde_json::json!({})).await {
                warn!(target: "auth", error = %e, "backend logout failed; clearing local session anyway");
            }
        }
        self.writer.clear()?;
        info!(target: "auth", user = principal.label(), "logged out");
        Ok(())
    }

    /// Clear the session when `err` means the backend no longer accepts the token.
    /// Returns whether the session was cleared.
    pub fn handle_rejection(&self, err: &GateError) -> GateResult<bool> {
        if !err.is_auth_rejection() {
            return Ok(false);
        }
        warn!(target: "auth", error = %err, "credentials rejected; clearing session");
        self.writer.clear()?;
        Ok(true)
    }
}
