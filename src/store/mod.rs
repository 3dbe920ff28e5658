/// Credential store.
///
/// The auth core only ever talks to the `UserStore` trait; the Postgres
/// implementation backs production, the in-memory one backs the test suite
/// and keeps the core decoupled from any particular storage technology.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::User;
use crate::error::AppError;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. Fails with `USER_EXISTS` on a duplicate email.
    async fn insert(&self, user: &User) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Lookup by canonical (lowercased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Lookup by the digest of an outstanding password-reset token.
    async fn find_by_reset_token(&self, token_hash: &str) -> Result<Option<User>, AppError>;

    /// Lookup by the digest of an outstanding email-verification token.
    async fn find_by_verification_token(&self, token_hash: &str)
        -> Result<Option<User>, AppError>;

    /// Persist every mutable field of an existing user.
    async fn update(&self, user: &User) -> Result<(), AppError>;
}
