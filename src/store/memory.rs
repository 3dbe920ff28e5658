use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::User;
use crate::error::{AppError, AuthError};
use crate::store::UserStore;

/// In-memory credential store. Backs the test suite and storeless demo runs.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| AppError::Store("user store lock poisoned".to_string()))?;

        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Auth(AuthError::UserExists));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self
            .users
            .lock()
            .map_err(|_| AppError::Store("user store lock poisoned".to_string()))?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_lowercase();
        let users = self
            .users
            .lock()
            .map_err(|_| AppError::Store("user store lock poisoned".to_string()))?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> Result<Option<User>, AppError> {
        let users = self
            .users
            .lock()
            .map_err(|_| AppError::Store("user store lock poisoned".to_string()))?;
        Ok(users
            .values()
            .find(|u| u.reset_token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn find_by_verification_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let users = self
            .users
            .lock()
            .map_err(|_| AppError::Store("user store lock poisoned".to_string()))?;
        Ok(users
            .values()
            .find(|u| u.verification_token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| AppError::Store("user store lock poisoned".to_string()))?;
        users.insert(user.id, user.clone());
        Ok(())
    }
}
