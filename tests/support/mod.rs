//! In-process mock of the portal backend for integration tests.
//! Binds an ephemeral localhost port and serves the handful of routes the client talks to.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

pub const GOOD_TOKEN: &str = "good-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const BROKEN_TOKEN: &str = "broken-token";
/// Gets a 200 whose body is not the applications envelope.
pub const RESHAPED_TOKEN: &str = "reshaped-token";

#[derive(Clone, Default)]
pub struct Hits {
    pub applications: Arc<AtomicUsize>,
    pub login: Arc<AtomicUsize>,
    pub logout: Arc<AtomicUsize>,
    pub ws: Arc<AtomicUsize>,
}

impl Hits {
    pub fn applications(&self) -> usize { self.applications.load(Ordering::SeqCst) }
    pub fn login(&self) -> usize { self.login.load(Ordering::SeqCst) }
    pub fn logout(&self) -> usize { self.logout.load(Ordering::SeqCst) }
    pub fn ws(&self) -> usize { self.ws.load(Ordering::SeqCst) }
}

/// Aborts the server task on drop.
pub struct Backend {
    pub origin: String,
    pub hits: Hits,
    handle: JoinHandle<()>,
}

impl Drop for Backend {
    fn drop(&mut self) { self.handle.abort(); }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Could not validate credentials"}))).into_response()
}

pub fn sample_applications() -> Value {
    json!({
        "applications": [
            {"id": "PL-1001", "type": "Personal Loan", "category": "Loan", "amount": "₹5,00,000",
             "status": "Under Review", "appliedDate": "12 Mar 2024", "icon": "💰"},
            {"id": "HI-2002", "type": "Health Insurance", "category": "Insurance", "amount": null,
             "status": "Approved", "appliedDate": "02 Feb 2024", "statusColor": "green"}
        ],
        "total": 2,
        "categorySummary": {"Loan": 1, "Insurance": 1, "Investment": 0, "Tax Planning": 0}
    })
}

async fn applications(State(hits): State<Hits>, headers: HeaderMap) -> Response {
    hits.applications.fetch_add(1, Ordering::SeqCst);
    let json_body = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) == Some("application/json");
    match bearer(&headers) {
        Some(BROKEN_TOKEN) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "{\"detail\":\"Failed to fetch user applications\"}").into_response()
        }
        Some(RESHAPED_TOKEN) => Json(json!({"data": [{"id": "PL1"}], "detail": "moved"})).into_response(),
        Some(GOOD_TOKEN) | Some(ADMIN_TOKEN) if json_body => Json(sample_applications()).into_response(),
        _ => unauthorized(),
    }
}

async fn login(State(hits): State<Hits>, Json(body): Json<Value>) -> Response {
    hits.login.fetch_add(1, Ordering::SeqCst);
    let email = body.get("email").and_then(|v| v.as_str()).unwrap_or("");
    let password = body.get("password").and_then(|v| v.as_str()).unwrap_or("");
    let (token, role, is_admin) = match (email, password) {
        ("asha@example.com", "Secret123") => (GOOD_TOKEN, "user", false),
        ("admin@cashper.ai", "Admin@123") => (ADMIN_TOKEN, "admin", true),
        _ => {
            return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Invalid email or password"}))).into_response();
        }
    };
    let id = if is_admin { "admin_user" } else { "65f0c0ffee" };
    let full_name = if is_admin { "Admin" } else { "Asha Rao" };
    Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": {
            "id": id,
            "fullName": full_name,
            "email": email,
            "phone": "9876543210",
            "role": role,
            "isAdmin": is_admin,
            "isEmailVerified": true,
            "isPhoneVerified": false,
            "createdAt": "2024-01-05T09:30:00"
        }
    }))
    .into_response()
}

async fn logout(State(hits): State<Hits>, headers: HeaderMap) -> Response {
    hits.logout.fetch_add(1, Ordering::SeqCst);
    match bearer(&headers) {
        Some(GOOD_TOKEN) | Some(ADMIN_TOKEN) => Json(json!({"message": "Logged out successfully"})).into_response(),
        _ => unauthorized(),
    }
}

async fn dashboard_ws(State(hits): State<Hits>, headers: HeaderMap, ws: WebSocketUpgrade) -> Response {
    hits.ws.fetch_add(1, Ordering::SeqCst);
    if bearer(&headers) != Some(ADMIN_TOKEN) {
        return (StatusCode::UNAUTHORIZED, "admin token required").into_response();
    }
    ws.on_upgrade(|mut socket| async move {
        let updates = [
            json!({"type": "stats", "totalUsers": 120, "pendingApplications": 7}),
            json!({"type": "application", "id": "PL-1001", "status": "Approved"}),
        ];
        for u in updates {
            if socket.send(Message::Text(u.to_string().into())).await.is_err() {
                return;
            }
        }
        let _ = socket.send(Message::Close(None)).await;
    })
}

pub async fn start_backend() -> Backend {
    let hits = Hits::default();
    let app = Router::new()
        .route("/api/dashboard/applications", get(applications))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/admin/ws/dashboard", get(dashboard_ws))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("mock backend error: {e:?}");
        }
    });
    Backend { origin: format!("http://{}", addr), hits, handle }
}
