use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::endpoints::{is_absolute_http, to_ws_origin, EndpointTable};
use crate::error::{GateError, GateResult};
use crate::identity::Principal;

/// Bearer token of `principal`, or `Auth` when there is none to send.
pub fn require_token(principal: &Principal) -> GateResult<&str> {
    principal
        .bearer()
        .ok_or_else(|| GateError::auth("missing_token", "session has no bearer token"))
}

/// `Authorization: Bearer <token>` and `Content-Type: application/json`.
pub fn auth_headers(token: &str) -> GateResult<HeaderMap> {
    let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| GateError::auth("invalid_token", "token is not a valid header value"))?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// HTTP transport bound to one endpoint table. Completes path-only URLs against the page origin,
/// the way a browser would for a same-origin deployment.
#[derive(Clone)]
pub struct AuthedClient {
    endpoints: Arc<EndpointTable>,
    page_origin: Option<Url>,
    http: reqwest::Client,
}

impl AuthedClient {
    pub fn new(endpoints: EndpointTable, page_origin: Option<&str>) -> GateResult<Self> {
        let page_origin = match page_origin {
            Some(o) => Some(
                Url::parse(o).map_err(|e| GateError::config("invalid_page_origin".to_string(), format!("{}: {}", o, e)))?,
            ),
            None => None,
        };
        let http = reqwest::Client::builder().build()?;
        Ok(Self { endpoints: Arc::new(endpoints), page_origin, http })
    }

    pub fn endpoints(&self) -> &EndpointTable { &self.endpoints }

    pub fn page_origin(&self) -> Option<&Url> { self.page_origin.as_ref() }

    /// Absolute HTTP URL for a resolved endpoint.
    pub fn absolute(&self, url: &str) -> GateResult<Url> {
        if is_absolute_http(url) {
            return Url::parse(url).map_err(|e| GateError::config("invalid_url".to_string(), format!("{}: {}", url, e)));
        }
        let base = self.page_origin.as_ref().ok_or_else(|| {
            GateError::config("relative_endpoint".to_string(), format!("{} is path-only and no page origin is set", url))
        })?;
        base.join(url).map_err(|e| GateError::config("invalid_url".to_string(), format!("{}: {}", url, e)))
    }

    /// Absolute WebSocket URL. Path-only endpoints take the page origin with its scheme swapped.
    pub fn ws_url(&self, url: &str) -> GateResult<String> {
        if url.starts_with("ws://") || url.starts_with("wss://") {
            return Ok(url.to_string());
        }
        let http = self.absolute(url)?;
        Ok(to_ws_origin(http.as_str()))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, principal: &Principal, url: &str) -> GateResult<T> {
        let token = require_token(principal)?;
        let target = self.absolute(url)?;
        debug!(target: "transport", method = "GET", url = %target, "authenticated request");
        self.execute(self.http.get(target).headers(auth_headers(token)?)).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        principal: &Principal,
        url: &str,
        body: &B,
    ) -> GateResult<T> {
        let token = require_token(principal)?;
        let target = self.absolute(url)?;
        debug!(target: "transport", method = "POST", url = %target, "authenticated request");
        self.execute(self.http.post(target).headers(auth_headers(token)?).json(body)).await
    }

    /// Unauthenticated POST, used only by the login exchange.
    pub(crate) async fn post_public<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: &str, body: &B) -> GateResult<T> {
        let target = self.absolute(url)?;
        debug!(target: "transport", method = "POST", url = %target, "public request");
        self.execute(self.http.post(target).json(body)).await
    }

    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> GateResult<T> {
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            debug!(target: "transport", status = status.as_u16(), "request failed");
            return Err(GateError::http(status.as_u16(), text));
        }
        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}
