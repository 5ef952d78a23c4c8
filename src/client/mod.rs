//! Network side of the portal client: authenticated HTTP transport, the application
//! aggregator, the login/logout flow and the admin dashboard feed.

mod transport;
mod applications;
mod auth_flow;
mod dashboard_feed;

pub use transport::{AuthedClient, auth_headers, require_token};
pub use applications::{ApplicationAggregator, ApplicationRecord, ApplicationsPage, APPLICATIONS_SUBPATH};
pub use auth_flow::{AuthFlow, LoginResponse};
pub use dashboard_feed::DashboardFeed;
