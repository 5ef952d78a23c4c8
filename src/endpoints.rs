//! Endpoint resolution.
//!
//! Every backend capability lives under `<origin>/api/...`. The origin comes from the
//! `DeploymentConfig` and the table is rebuilt whenever that changes (in practice once, at
//! startup). Resolution never fails: a missing override degrades to the local-development origin.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use tracing::debug;

use crate::config::{DeploymentConfig, OriginMode, LOCAL_DEV_ORIGIN};

pub const API_PREFIX: &str = "/api";

/// Named backend function areas. Nested domains share a dotted prefix in their logical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Admin,
    Auth,
    Dashboard,
    DashboardApplications,
    PersonalLoan,
    HomeLoan,
    BusinessLoan,
    ShortTermLoan,
    LoanManagement,
    HealthInsurance,
    MotorInsurance,
    TermInsurance,
    Sip,
    MutualFunds,
    InvestmentManagement,
    PersonalTax,
    BusinessTax,
    RetailServices,
    BusinessServices,
    CorporateServices,
    Settings,
    Notifications,
    AdminWsDashboard,
}

impl Capability {
    pub const ALL: [Capability; 23] = [
        Capability::Admin,
        Capability::Auth,
        Capability::Dashboard,
        Capability::DashboardApplications,
        Capability::PersonalLoan,
        Capability::HomeLoan,
        Capability::BusinessLoan,
        Capability::ShortTermLoan,
        Capability::LoanManagement,
        Capability::HealthInsurance,
        Capability::MotorInsurance,
        Capability::TermInsurance,
        Capability::Sip,
        Capability::MutualFunds,
        Capability::InvestmentManagement,
        Capability::PersonalTax,
        Capability::BusinessTax,
        Capability::RetailServices,
        Capability::BusinessServices,
        Capability::CorporateServices,
        Capability::Settings,
        Capability::Notifications,
        Capability::AdminWsDashboard,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Capability::Admin => "admin",
            Capability::Auth => "auth",
            Capability::Dashboard => "dashboard",
            Capability::DashboardApplications => "dashboard.applications",
            Capability::PersonalLoan => "loans.personal",
            Capability::HomeLoan => "loans.home",
            Capability::BusinessLoan => "loans.business",
            Capability::ShortTermLoan => "loans.short_term",
            Capability::LoanManagement => "loans.management",
            Capability::HealthInsurance => "insurance.health",
            Capability::MotorInsurance => "insurance.motor",
            Capability::TermInsurance => "insurance.term",
            Capability::Sip => "investments.sip",
            Capability::MutualFunds => "investments.mutual_funds",
            Capability::InvestmentManagement => "investments.management",
            Capability::PersonalTax => "tax.personal",
            Capability::BusinessTax => "tax.business",
            Capability::RetailServices => "services.retail",
            Capability::BusinessServices => "services.business",
            Capability::CorporateServices => "services.corporate",
            Capability::Settings => "settings",
            Capability::Notifications => "notifications",
            Capability::AdminWsDashboard => "admin.ws.dashboard",
        }
    }

    /// Path below `/api`.
    pub fn path(self) -> &'static str {
        match self {
            Capability::Admin => "/admin",
            Capability::Auth => "/auth",
            Capability::Dashboard => "/dashboard",
            Capability::DashboardApplications => "/dashboard/applications",
            Capability::PersonalLoan => "/personal-loan",
            Capability::HomeLoan => "/home-loan",
            Capability::BusinessLoan => "/business-loan",
            Capability::ShortTermLoan => "/short-term-loan",
            Capability::LoanManagement => "/loan-management",
            Capability::HealthInsurance => "/health-insurance",
            Capability::MotorInsurance => "/motor-insurance",
            Capability::TermInsurance => "/term-insurance",
            Capability::Sip => "/sip",
            Capability::MutualFunds => "/mutual-funds",
            Capability::InvestmentManagement => "/investment-management",
            Capability::PersonalTax => "/personal-tax",
            Capability::BusinessTax => "/business-tax",
            Capability::RetailServices => "/retail-services",
            Capability::BusinessServices => "/business-services",
            Capability::CorporateServices => "/corporate-services",
            Capability::Settings => "/settings",
            Capability::Notifications => "/notifications",
            Capability::AdminWsDashboard => "/admin/ws/dashboard",
        }
    }

    pub fn is_websocket(self) -> bool { matches!(self, Capability::AdminWsDashboard) }

    pub fn from_name(name: &str) -> Option<Capability> {
        Capability::ALL.iter().copied().find(|c| c.name() == name)
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

/// Swap an `http`/`https` scheme prefix for `ws`/`wss`. Anything else is returned unchanged.
pub fn to_ws_origin(origin: &str) -> String {
    if let Some(rest) = strip_prefix_ci(origin, "https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = strip_prefix_ci(origin, "http://") {
        format!("ws://{}", rest)
    } else {
        origin.to_string()
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) { Some(&s[prefix.len()..]) } else { None }
}

pub fn is_absolute_http(s: &str) -> bool {
    strip_prefix_ci(s, "http://").is_some() || strip_prefix_ci(s, "https://").is_some()
}

/// Resolved URL for every capability under one deployment config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTable {
    mode: OriginMode,
    http_origin: String,
    ws_origin: String,
    urls: BTreeMap<Capability, String>,
}

/// Build the endpoint table for a deployment config.
pub fn resolve(config: &DeploymentConfig) -> EndpointTable {
    let mode = config.mode();
    let http_origin = config.http_origin().to_string();
    let ws_origin = match &mode {
        OriginMode::LocalDefault => to_ws_origin(LOCAL_DEV_ORIGIN),
        // Path-only; the transport completes it against the page origin at connect time
        OriginMode::SameOrigin => String::new(),
        OriginMode::Remote(o) => to_ws_origin(o),
    };
    let mut urls = BTreeMap::new();
    for cap in Capability::ALL {
        let base = if cap.is_websocket() { &ws_origin } else { &http_origin };
        urls.insert(cap, format!("{}{}{}", base, API_PREFIX, cap.path()));
    }
    debug!(target: "endpoints", ?mode, http_origin = %http_origin, ws_origin = %ws_origin, "resolved endpoint table");
    EndpointTable { mode, http_origin, ws_origin, urls }
}

impl EndpointTable {
    pub fn mode(&self) -> &OriginMode { &self.mode }

    /// Empty in same-origin mode.
    pub fn http_origin(&self) -> &str { &self.http_origin }

    /// Empty in same-origin mode.
    pub fn ws_origin(&self) -> &str { &self.ws_origin }

    pub fn url(&self, cap: Capability) -> &str {
        // Every capability is inserted by `resolve`
        self.urls.get(&cap).map(String::as_str).unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        Capability::from_name(name).map(|c| self.url(c))
    }

    /// `url(cap)` with a sub-path appended, normalising the joining slash.
    pub fn join(&self, cap: Capability, sub: &str) -> String {
        let sub = sub.trim_start_matches('/');
        if sub.is_empty() {
            self.url(cap).to_string()
        } else {
            format!("{}/{}", self.url(cap).trim_end_matches('/'), sub)
        }
    }

    pub fn ws_dashboard(&self) -> &str { self.url(Capability::AdminWsDashboard) }

    pub fn iter(&self) -> impl Iterator<Item = (Capability, &str)> {
        self.urls.iter().map(|(c, u)| (*c, u.as_str()))
    }

    /// Absolute URL for an asset path served by the backend.
    ///
    /// Absent or empty input gives `""`; `http(s)://` input is returned unchanged; anything else is
    /// prefixed with the HTTP origin and exactly one `/`. Applying it to its own output is a no-op.
    pub fn asset_url(&self, path: Option<&str>) -> String {
        let Some(path) = path else { return String::new(); };
        if path.is_empty() || is_absolute_http(path) {
            return path.to_string();
        }
        let origin = self.http_origin.as_str();
        // Already prefixed with a non-http origin (e.g. a bare host override)
        if !origin.is_empty() {
            if let Some(rest) = path.strip_prefix(origin) {
                if rest.starts_with('/') { return path.to_string(); }
            }
        }
        format!("{}/{}", origin, path.trim_start_matches('/'))
    }
}
