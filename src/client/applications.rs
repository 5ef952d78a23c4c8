//! Cross-domain application history.
//!
//! One request to the dashboard capability returns every loan, insurance, investment and tax
//! application of the current user. Records are opaque here; the backend owns their shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::endpoints::Capability;
use crate::error::GateResult;
use crate::identity::Principal;

use super::transport::{require_token, AuthedClient};

pub const APPLICATIONS_SUBPATH: &str = "/applications";

/// One backend record, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationRecord(pub Value);

impl ApplicationRecord {
    pub fn as_value(&self) -> &Value { &self.0 }

    pub fn into_value(self) -> Value { self.0 }
}

/// The backend's envelope around the record list. The `applications` key is required: an object
/// without it is an unknown shape, not an empty history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationsPage {
    pub applications: Vec<ApplicationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_summary: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApplicationsBody {
    List(Vec<ApplicationRecord>),
    Page(ApplicationsPage),
}

impl From<ApplicationsBody> for ApplicationsPage {
    fn from(body: ApplicationsBody) -> Self {
        match body {
            ApplicationsBody::Page(p) => p,
            ApplicationsBody::List(applications) => {
                ApplicationsPage { applications, total: None, category_summary: None, extra: Map::new() }
            }
        }
    }
}

#[derive(Clone)]
pub struct ApplicationAggregator {
    client: AuthedClient,
}

impl ApplicationAggregator {
    pub fn new(client: AuthedClient) -> Self { Self { client } }

    pub fn url(&self) -> String {
        self.client.endpoints().join(Capability::Dashboard, APPLICATIONS_SUBPATH)
    }

    /// Every application of `principal`. Fails with `Auth` before any I/O when there is no
    /// token, and with `Http` (status and body as received) on a non-2xx reply.
    pub async fn fetch_user_applications(&self, principal: &Principal) -> GateResult<Vec<ApplicationRecord>> {
        Ok(self.fetch_user_applications_page(principal).await?.applications)
    }

    /// Same request, keeping the envelope's totals and category summary.
    pub async fn fetch_user_applications_page(&self, principal: &Principal) -> GateResult<ApplicationsPage> {
        require_token(principal)?;
        let body: ApplicationsBody = self.client.get_json(principal, &self.url()).await?;
        let page = ApplicationsPage::from(body);
        debug!(target: "applications", user = principal.label(), count = page.applications.len(), "fetched applications");
        Ok(page)
    }
}
