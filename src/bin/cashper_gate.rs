//!
//! cashper_gate client binary
//! --------------------------
//! Command-line front for the portal client core: resolve endpoints, inspect the stored session,
//! evaluate route guards, log in/out, fetch applications and follow the admin dashboard feed.
//! Supports configuration via CLI flags and environment variables.

use std::sync::Arc;

use anyhow::{Context, Result};
use std::env;

use cashper_gate::client::{ApplicationAggregator, AuthFlow, AuthedClient, DashboardFeed};
use cashper_gate::config::{self, ClientSettings, DeploymentConfig};
use cashper_gate::endpoints::resolve;
use cashper_gate::identity::{AccessDecision, AccessGuard, FileStorage, SessionStore};

const USAGE: &str = "cashper_gate\n\nUSAGE:\n  cashper_gate [OPTIONS] <COMMAND>\n\nCOMMANDS:\n  endpoints                 Print the resolved endpoint table\n  whoami                    Print the stored session snapshot\n  check <route>             Evaluate the access guard for a front-end route\n  login <email> <password>  Log in and persist the session\n  logout                    Log out and clear the session\n  applications              Fetch the current user's applications\n  watch                     Stream admin dashboard updates\n\nOPTIONS:\n  --api-url URL       Origin override (env: CASHPER_API_URL). Pass \"\" for same-origin.\n  --page-origin URL   Origin path-only URLs are completed against (env: CASHPER_PAGE_ORIGIN)\n  --session-dir PATH  Session storage folder (env: CASHPER_SESSION_DIR, default .cashper)\n";

/// Value following `flag`, if the flag is present. An empty value is kept as empty.
fn parse_value_arg(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Arguments with the value-taking options removed.
fn positional(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--api-url" | "--page-origin" | "--session-dir" => i += 2,
            _ => {
                out.push(args[i].clone());
                i += 1;
            }
        }
    }
    out
}

fn print_decision(route: &str, decision: &AccessDecision) {
    match decision {
        AccessDecision::Allow => println!("{} -> allow", route),
        AccessDecision::Redirect(to) => println!("{} -> redirect {}", route, to),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber with env filter if provided
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .context("invalid log filter")?;
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let args: Vec<String> = env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    // CLI arguments override environment
    let deployment = match parse_value_arg(&args, "--api-url") {
        Some(origin) => DeploymentConfig { configured_origin: Some(origin) },
        None => DeploymentConfig::from_env(),
    };
    let deployment = config::init_global(deployment);
    let mut settings = ClientSettings::from_env();
    if let Some(o) = parse_value_arg(&args, "--page-origin").filter(|s| !s.is_empty()) {
        settings.page_origin = Some(o);
    }
    if let Some(d) = parse_value_arg(&args, "--session-dir") {
        settings.session_dir = d.into();
    }
    tracing::info!(
        target: "cashper_gate",
        "mode={:?}, page_origin={:?}, session_dir={}",
        deployment.mode(), settings.page_origin, settings.session_dir.display()
    );

    let table = resolve(deployment);
    let storage = FileStorage::open(&settings.session_dir)
        .with_context(|| format!("While opening session storage under {}", settings.session_dir.display()))?;
    let (store, writer) = SessionStore::open(Arc::new(storage));
    let guard = AccessGuard::default();

    let pos = positional(&args);
    let cmd = pos.first().map(String::as_str).unwrap_or("");
    match cmd {
        "endpoints" => {
            for (cap, url) in table.iter() {
                println!("{:<26} {}", cap.name(), url);
            }
        }
        "whoami" => {
            let p = store.current_principal();
            println!("user: {}", p.label());
            println!("authenticated: {}", SessionStore::is_authenticated(&p));
            println!("elevated: {}", SessionStore::has_elevated_privilege(&p));
        }
        "check" => {
            let route = pos.get(1).context("check needs a route, e.g. check /admin")?;
            print_decision(route, &guard.check_current(&store, route));
        }
        "login" => {
            let (Some(email), Some(password)) = (pos.get(1), pos.get(2)) else {
                anyhow::bail!("login needs <email> <password>");
            };
            let client = AuthedClient::new(table, settings.page_origin.as_deref())?;
            let flow = AuthFlow::new(client, writer);
            let p = flow.login(email, password).await.context("login failed")?;
            println!("logged in as {} (admin: {})", p.label(), p.has_elevated_privilege());
        }
        "logout" => {
            let client = AuthedClient::new(table, settings.page_origin.as_deref())?;
            AuthFlow::new(client, writer).logout().await?;
            println!("logged out");
        }
        "applications" => {
            let principal = store.current_principal();
            if let AccessDecision::Redirect(to) = guard.check_route("/dashboard/applications", &principal) {
                anyhow::bail!("not signed in; go to {}", to);
            }
            let client = AuthedClient::new(table, settings.page_origin.as_deref())?;
            let flow = AuthFlow::new(client.clone(), writer);
            match ApplicationAggregator::new(client).fetch_user_applications_page(&principal).await {
                Ok(page) => println!("{}", serde_json::to_string_pretty(&page)?),
                Err(e) => {
                    if flow.handle_rejection(&e)? {
                        eprintln!("session expired; log in again");
                    }
                    return Err(e.into());
                }
            }
        }
        "watch" => {
            let principal = store.current_principal();
            if let AccessDecision::Redirect(to) = guard.check_route("/admin/dashboard", &principal) {
                anyhow::bail!("admin access required; go to {}", to);
            }
            let client = AuthedClient::new(table, settings.page_origin.as_deref())?;
            let mut feed = DashboardFeed::connect(&client, &principal).await?;
            while let Some(update) = feed.next_update().await? {
                println!("{}", update);
            }
        }
        _ => {
            println!("{}", USAGE);
        }
    }
    Ok(())
}
