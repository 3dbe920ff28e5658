use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::User;
use crate::error::AppError;
use crate::store::UserStore;

const USER_COLUMNS: &str = r#"
    id, email, password_hash, first_name, last_name, role,
    is_active, is_email_verified, two_factor_enabled,
    login_attempts, lock_until, last_login_at, password_changed_at,
    reset_token_hash, reset_token_expires_at, verification_token_hash,
    created_at, updated_at
"#;

/// Postgres-backed credential store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, first_name, last_name, role,
                is_active, is_email_verified, two_factor_enabled,
                login_attempts, lock_until, last_login_at, password_changed_at,
                reset_token_hash, reset_token_expires_at, verification_token_hash,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.is_email_verified)
        .bind(user.two_factor_enabled)
        .bind(user.login_attempts)
        .bind(user.lock_until)
        .bind(user.last_login_at)
        .bind(user.password_changed_at)
        .bind(&user.reset_token_hash)
        .bind(user.reset_token_expires_at)
        .bind(&user.verification_token_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE reset_token_hash = $1",
            USER_COLUMNS
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_verification_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE verification_token_hash = $1",
            USER_COLUMNS
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                password_hash = $3,
                first_name = $4,
                last_name = $5,
                role = $6,
                is_active = $7,
                is_email_verified = $8,
                two_factor_enabled = $9,
                login_attempts = $10,
                lock_until = $11,
                last_login_at = $12,
                password_changed_at = $13,
                reset_token_hash = $14,
                reset_token_expires_at = $15,
                verification_token_hash = $16,
                updated_at = $17
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.is_email_verified)
        .bind(user.two_factor_enabled)
        .bind(user.login_attempts)
        .bind(user.lock_until)
        .bind(user.last_login_at)
        .bind(user.password_changed_at)
        .bind(&user.reset_token_hash)
        .bind(user.reset_token_expires_at)
        .bind(&user.verification_token_hash)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
