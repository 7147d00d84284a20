use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use super::store::TokenStore;
use crate::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
use crate::utils::{log_warn, ApiResult};

/// Access and refresh tokens as returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CredentialPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Explicit handle on the persisted credentials
///
/// Cheap to clone; every clone shares the same store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// Snapshot of both tokens
    pub fn credentials(&self) -> CredentialPair {
        CredentialPair {
            access_token: self.access_token(),
            refresh_token: self.refresh_token(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Store a new access token and, when given, a new refresh token
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) -> ApiResult<()> {
        self.store.set(ACCESS_TOKEN_KEY, access)?;
        if let Some(refresh) = refresh {
            self.store.set(REFRESH_TOKEN_KEY, refresh)?;
        }
        Ok(())
    }

    /// Overwrite only the access token
    pub fn set_access_token(&self, access: &str) -> ApiResult<()> {
        self.set_tokens(access, None)
    }

    /// Forget both tokens and the cached user
    pub fn clear(&self) -> ApiResult<()> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        self.store.remove(USER_KEY)
    }

    pub fn cache_user<T: Serialize>(&self, user: &T) -> ApiResult<()> {
        let json = serde_json::to_string(user)?;
        self.store.set(USER_KEY, &json)
    }

    /// Cached profile, `None` when absent or unreadable
    pub fn cached_user<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                log_warn("⚠️", format!("Ignoring unreadable cached user: {}", e));
                None
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print token values
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
