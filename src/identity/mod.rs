//! Client-held identity: session snapshots, durable storage and route gating.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod storage;
mod session;
mod guard;

pub use principal::{Principal, Profile, parse_profile, ADMIN_ROLE};
pub use storage::{SessionStorage, MemoryStorage, FileStorage, SESSION_FILE};
pub use session::{SessionStore, SessionWriter, TOKEN_KEY, PROFILE_KEY};
pub use guard::{AccessGuard, AccessDecision, Gated, Requirement, RouteTable, LOGIN_ROUTE, LANDING_ROUTE};
