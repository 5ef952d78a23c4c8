use futures_util::StreamExt;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue as WsHeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::{GateError, GateResult};
use crate::identity::Principal;

use super::transport::{require_token, AuthedClient};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live admin dashboard updates over the `admin.ws.dashboard` WebSocket.
pub struct DashboardFeed {
    url: String,
    stream: WsStream,
}

impl DashboardFeed {
    /// Open the feed with the principal's bearer token on the upgrade request.
    pub async fn connect(client: &AuthedClient, principal: &Principal) -> GateResult<Self> {
        let token = require_token(principal)?;
        let url = client.ws_url(client.endpoints().ws_dashboard())?;
        let mut req = url.as_str().into_client_request()?;
        let bearer = WsHeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| GateError::auth("invalid_token", "token is not a valid header value"))?;
        req.headers_mut().insert("authorization", bearer);
        let (stream, _resp) = tokio_tungstenite::connect_async(req).await?;
        info!(target: "dashboard_feed", url = %url, user = principal.label(), "connected");
        Ok(Self { url, stream })
    }

    pub fn url(&self) -> &str { &self.url }

    /// Next JSON update, or `None` once the server closes the feed.
    pub async fn next_update(&mut self) -> GateResult<Option<Value>> {
        while let Some(msg) = self.stream.next().await {
            match msg? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(frame) => {
                    debug!(target: "dashboard_feed", ?frame, "closed by server");
                    return Ok(None);
                }
                // pings are answered by the stream itself
                _ => continue,
            }
        }
        Ok(None)
    }

    pub async fn close(mut self) -> GateResult<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
