use std::sync::Arc;

use tracing::debug;

use crate::error::GateResult;
use crate::tprintln;

use super::principal::{Principal, Profile};
use super::storage::{MemoryStorage, SessionStorage};

pub const TOKEN_KEY: &str = "access_token";
pub const PROFILE_KEY: &str = "user";

/// Read side of the session. Cheap to clone; every read is an independent snapshot.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
}

/// The one write handle. Deliberately not `Clone`: only the login/logout flow holds it.
pub struct SessionWriter {
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    /// Wrap a storage backend, handing out the reader and the single writer.
    pub fn open(storage: Arc<dyn SessionStorage>) -> (SessionStore, SessionWriter) {
        let reader = SessionStore { storage: storage.clone() };
        (reader, SessionWriter { storage })
    }

    pub fn in_memory() -> (SessionStore, SessionWriter) {
        Self::open(Arc::new(MemoryStorage::new()))
    }

    pub fn current_principal(&self) -> Principal {
        let token = self.storage.get(TOKEN_KEY);
        let raw_profile = self.storage.get(PROFILE_KEY);
        let principal = Principal::from_raw(token, raw_profile.as_deref());
        debug!(
            target: "session",
            has_token = principal.bearer().is_some(),
            has_profile = principal.profile.is_some(),
            "session snapshot"
        );
        principal
    }

    pub fn is_authenticated(principal: &Principal) -> bool { principal.is_authenticated() }

    pub fn has_elevated_privilege(principal: &Principal) -> bool { principal.has_elevated_privilege() }
}

impl SessionWriter {
    /// Persist a fresh login. The old token is dropped before the new profile lands and the new
    /// token goes last, so every intermediate snapshot reads as unauthenticated.
    pub fn persist(&self, token: &str, profile: &Profile) -> GateResult<()> {
        let raw = serde_json::to_string(profile)?;
        self.storage.remove(TOKEN_KEY)?;
        self.storage.set(PROFILE_KEY, &raw)?;
        self.storage.set(TOKEN_KEY, token)?;
        tprintln!("session.persist user={:?}", profile.email.as_deref().or(profile.id.as_deref()));
        Ok(())
    }

    /// Drop both artifacts. Token first, so a half-cleared session reads as unauthenticated.
    pub fn clear(&self) -> GateResult<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(PROFILE_KEY)?;
        tprintln!("session.clear");
        Ok(())
    }

    pub fn reader(&self) -> SessionStore { SessionStore { storage: self.storage.clone() } }
}
