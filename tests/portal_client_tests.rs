//! Application aggregator and login/logout flow against the in-process mock backend.

mod support;

use std::sync::Arc;

use cashper_gate::client::{ApplicationAggregator, AuthFlow, AuthedClient};
use cashper_gate::config::DeploymentConfig;
use cashper_gate::endpoints::resolve;
use cashper_gate::identity::{
    AccessDecision, AccessGuard, FileStorage, MemoryStorage, Principal, SessionStorage, SessionStore, PROFILE_KEY,
    TOKEN_KEY,
};
use cashper_gate::GateError;

use support::{sample_applications, start_backend, ADMIN_TOKEN, BROKEN_TOKEN, GOOD_TOKEN, RESHAPED_TOKEN};

fn principal(token: &str) -> Principal {
    Principal::from_raw(Some(token.to_string()), Some(r#"{"email":"asha@example.com","role":"user"}"#))
}

fn remote_client(origin: &str) -> AuthedClient {
    AuthedClient::new(resolve(&DeploymentConfig::remote(origin)), None).expect("client")
}

#[tokio::test]
async fn fetch_returns_records_verbatim() {
    let backend = start_backend().await;
    let agg = ApplicationAggregator::new(remote_client(&backend.origin));

    let records = agg.fetch_user_applications(&principal(GOOD_TOKEN)).await.expect("fetch");
    let expected = sample_applications();
    let expected = expected["applications"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    for (got, want) in records.iter().zip(expected) {
        assert_eq!(got.as_value(), want);
    }
    assert_eq!(backend.hits.applications(), 1);
}

#[tokio::test]
async fn page_keeps_totals_and_summary() {
    let backend = start_backend().await;
    let agg = ApplicationAggregator::new(remote_client(&backend.origin));

    let page = agg.fetch_user_applications_page(&principal(ADMIN_TOKEN)).await.expect("fetch");
    assert_eq!(page.total, Some(serde_json::json!(2)));
    assert_eq!(page.category_summary.as_ref().unwrap()["Tax Planning"], 0);
}

#[tokio::test]
async fn missing_token_never_reaches_backend() {
    let backend = start_backend().await;
    let agg = ApplicationAggregator::new(remote_client(&backend.origin));

    let anon = Principal::from_raw(None, Some(r#"{"role":"user"}"#));
    let err = agg.fetch_user_applications(&anon).await.unwrap_err();
    assert!(matches!(err, GateError::Auth { .. }), "{:?}", err);
    assert_eq!(backend.hits.applications(), 0);
}

#[tokio::test]
async fn rejected_token_surfaces_401_unmodified() {
    let backend = start_backend().await;
    let agg = ApplicationAggregator::new(remote_client(&backend.origin));

    let err = agg.fetch_user_applications(&principal("stale-token")).await.unwrap_err();
    match &err {
        GateError::Http { status, body } => {
            assert_eq!(*status, 401);
            assert_eq!(body, r#"{"detail":"Could not validate credentials"}"#);
        }
        other => panic!("expected http error, got {:?}", other),
    }
    assert!(err.is_auth_rejection());
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let backend = start_backend().await;
    let agg = ApplicationAggregator::new(remote_client(&backend.origin));

    let err = agg.fetch_user_applications(&principal(BROKEN_TOKEN)).await.unwrap_err();
    assert_eq!(err, GateError::http(500, r#"{"detail":"Failed to fetch user applications"}"#));
    assert!(!err.is_auth_rejection());
}

#[tokio::test]
async fn unexpected_success_body_is_decode_error() {
    let backend = start_backend().await;
    let agg = ApplicationAggregator::new(remote_client(&backend.origin));

    let err = agg.fetch_user_applications(&principal(RESHAPED_TOKEN)).await.unwrap_err();
    assert!(matches!(err, GateError::Decode { .. }), "{:?}", err);
    assert_eq!(backend.hits.applications(), 1);
}

#[tokio::test]
async fn same_origin_paths_complete_against_page_origin() {
    let backend = start_backend().await;
    let table = resolve(&DeploymentConfig::same_origin());
    assert_eq!(table.url(cashper_gate::endpoints::Capability::Dashboard), "/api/dashboard");

    let client = AuthedClient::new(table, Some(backend.origin.as_str())).expect("client");
    let records = ApplicationAggregator::new(client).fetch_user_applications(&principal(GOOD_TOKEN)).await.expect("fetch");
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn login_persists_session_and_unlocks_guard() {
    let backend = start_backend().await;
    let tmp = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(tmp.path()).unwrap());
    let (store, writer) = SessionStore::open(storage.clone());
    let flow = AuthFlow::new(remote_client(&backend.origin), writer);
    let guard = AccessGuard::default();

    assert_eq!(guard.check_current(&store, "/dashboard"), AccessDecision::Redirect("/login".into()));

    // Email is normalised before it is sent
    let p = flow.login("  Asha@Example.com ", "Secret123").await.expect("login");
    assert_eq!(p.bearer(), Some(GOOD_TOKEN));
    assert!(!p.has_elevated_privilege());

    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some(GOOD_TOKEN));
    assert!(storage.get(PROFILE_KEY).unwrap().contains("\"fullName\":\"Asha Rao\""));

    assert_eq!(guard.check_current(&store, "/dashboard"), AccessDecision::Allow);
    assert_eq!(guard.check_current(&store, "/admin"), AccessDecision::Redirect("/dashboard".into()));

    flow.logout().await.expect("logout");
    assert_eq!(backend.hits.logout(), 1);
    assert_eq!(store.current_principal(), Principal::anonymous());
    assert_eq!(guard.check_current(&store, "/dashboard"), AccessDecision::Redirect("/login".into()));
}

#[tokio::test]
async fn admin_login_reaches_admin_routes() {
    let backend = start_backend().await;
    let (store, writer) = SessionStore::open(Arc::new(MemoryStorage::new()));
    let flow = AuthFlow::new(remote_client(&backend.origin), writer);

    let p = flow.login("admin@cashper.ai", "Admin@123").await.expect("login");
    assert!(p.has_elevated_privilege());
    assert_eq!(AccessGuard::default().check_current(&store, "/admin/dashboard"), AccessDecision::Allow);
}

#[tokio::test]
async fn failed_login_leaves_session_untouched() {
    let backend = start_backend().await;
    let (store, writer) = SessionStore::in_memory();
    let flow = AuthFlow::new(remote_client(&backend.origin), writer);

    let err = flow.login("asha@example.com", "wrong-password").await.unwrap_err();
    assert!(matches!(err, GateError::Http { status: 401, .. }), "{:?}", err);
    assert_eq!(backend.hits.login(), 1);
    assert_eq!(store.current_principal(), Principal::anonymous());
}

#[tokio::test]
async fn expired_session_is_cleared_after_rejection() {
    let backend = start_backend().await;
    let (store, writer) = SessionStore::in_memory();
    let client = remote_client(&backend.origin);
    let flow = AuthFlow::new(client.clone(), writer);
    flow.login("asha@example.com", "Secret123").await.expect("login");

    // A stale snapshot from before the token was revoked server-side
    let stale = principal("revoked-token");
    let err = ApplicationAggregator::new(client).fetch_user_applications(&stale).await.unwrap_err();
    assert!(flow.handle_rejection(&err).expect("clear"));
    assert!(!store.current_principal().is_authenticated());
}

#[tokio::test]
async fn logout_clears_even_when_backend_rejects() {
    let backend = start_backend().await;
    let storage = Arc::new(MemoryStorage::with_entries([
        (TOKEN_KEY, "revoked-token"),
        (PROFILE_KEY, r#"{"email":"asha@example.com","role":"user"}"#),
    ]));
    let (store, writer) = SessionStore::open(storage);
    let flow = AuthFlow::new(remote_client(&backend.origin), writer);

    flow.logout().await.expect("logout");
    assert_eq!(backend.hits.logout(), 1);
    assert_eq!(store.current_principal(), Principal::anonymous());
}
