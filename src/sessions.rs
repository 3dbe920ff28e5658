/// Session registry: the single currently-valid refresh token per user.
///
/// `store` overwrites any prior value, which is the revocation mechanism —
/// issuing a new refresh token implicitly invalidates the old one. Password
/// change and reset delete the entry outright, forcing re-authentication
/// everywhere. The registry is last-writer-wins: concurrent logins race and
/// the final `store` call decides the live token.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::AppError;

#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Record the current refresh token for a user, replacing any prior one.
    async fn store(&self, user_id: Uuid, token: &str, ttl_secs: i64) -> Result<(), AppError>;

    /// The currently valid refresh token, if any.
    async fn get(&self, user_id: Uuid) -> Result<Option<String>, AppError>;

    /// Explicit revocation (logout, password change/reset). Deleting an
    /// absent entry is a no-op.
    async fn delete(&self, user_id: Uuid) -> Result<(), AppError>;
}

struct SessionEntry {
    token: String,
    expires_at: DateTime<Utc>,
}

/// In-process registry: a swept map rather than an ever-growing one.
/// Expired entries are dropped lazily on read and in bulk via `sweep`.
#[derive(Default)]
pub struct InMemorySessionRegistry {
    entries: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(_) => return 0,
        };
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn store(&self, user_id: Uuid, token: &str, ttl_secs: i64) -> Result<(), AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal("session registry lock poisoned".to_string()))?;
        entries.insert(
            user_id,
            SessionEntry {
                token: token.to_string(),
                expires_at: Utc::now() + Duration::seconds(ttl_secs),
            },
        );
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal("session registry lock poisoned".to_string()))?;
        match entries.get(&user_id) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(entry.token.clone())),
            Some(_) => {
                entries.remove(&user_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal("session registry lock poisoned".to_string()))?;
        entries.remove(&user_id);
        Ok(())
    }
}
