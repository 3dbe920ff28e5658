/// Credential and session lifecycle operations.
///
/// `AuthService` owns no state of its own: the user store, session registry
/// and settings are injected at construction and every operation is a plain
/// async call over them. The entity stays plain data; this service is where
/// behavior lives.

use std::sync::Arc;

use actix_web::web;
use chrono::Duration;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::reset_token::{generate_opaque_token, hash_token};
use crate::auth::tokens::{issue_token_pair, refresh_expiry, validate_refresh_token, TokenPair};
use crate::configuration::{JwtSettings, SecuritySettings};
use crate::domain::validators::{validate_email, validate_name};
use crate::domain::{Role, User};
use crate::error::{AppError, AuthError};
use crate::sessions::SessionRegistry;
use crate::store::UserStore;

/// Result of an operation that authenticates a user.
pub struct AuthOutcome {
    pub user: User,
    pub tokens: TokenPair,
}

/// Result of registration: the authenticated user plus the plaintext
/// email-verification token for the delivery collaborator.
pub struct RegistrationOutcome {
    pub user: User,
    pub tokens: TokenPair,
    pub verification_token: String,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionRegistry>,
    jwt: JwtSettings,
    security: SecuritySettings,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionRegistry>,
        jwt: JwtSettings,
        security: SecuritySettings,
    ) -> Self {
        Self {
            users,
            sessions,
            jwt,
            security,
        }
    }

    /// Register a new account and log it in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        role: Option<Role>,
    ) -> Result<RegistrationOutcome, AppError> {
        let email = validate_email(email)?;
        let first_name = validate_name("first_name", first_name)?;
        let last_name = validate_name("last_name", last_name)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Auth(AuthError::UserExists));
        }

        let password_hash = self.hash_on_blocking_pool(password.to_string()).await?;

        let verification_token = generate_opaque_token();
        let mut user = User::new(
            email,
            password_hash,
            first_name,
            last_name,
            role.unwrap_or(Role::User),
        );
        user.verification_token_hash = Some(hash_token(&verification_token));

        self.users.insert(&user).await?;

        let tokens = self.open_session(&user, false).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        Ok(RegistrationOutcome {
            user,
            tokens,
            verification_token,
        })
    }

    /// Authenticate with email and password, enforcing the lockout policy.
    ///
    /// Order matters: the lock check runs before password verification so a
    /// locked account burns no further attempts, and a correct password
    /// during the lock window is still refused.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<AuthOutcome, AppError> {
        let mut user = self
            .users
            .find_by_email(&email.to_lowercase())
            .await?
            .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Login attempt on deactivated account");
            return Err(AppError::Auth(AuthError::AccountDeactivated));
        }

        if user.is_locked() {
            tracing::warn!(user_id = %user.id, "Login attempt on locked account");
            return Err(AppError::Auth(AuthError::AccountLocked));
        }

        let password_valid = self
            .verify_on_blocking_pool(password.to_string(), user.password_hash.clone())
            .await?;

        if !password_valid {
            let locked = user.register_failed_login(
                self.security.max_login_attempts,
                Duration::seconds(self.security.lockout_duration_secs),
            );
            self.users.update(&user).await?;

            if locked {
                tracing::warn!(
                    user_id = %user.id,
                    attempts = user.login_attempts,
                    "Account locked after repeated failed logins"
                );
                return Err(AppError::Auth(AuthError::AccountLocked));
            }
            return Err(AppError::Auth(AuthError::InvalidCredentials));
        }

        user.register_successful_login();
        self.users.update(&user).await?;

        let tokens = self.open_session(&user, remember_me).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(AuthOutcome { user, tokens })
    }

    /// Rotate a refresh token: the presented token must match the registry's
    /// current value, and the replacement overwrites it, so the presented
    /// token is dead after this call.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthOutcome, AppError> {
        let claims = validate_refresh_token(refresh_token, &self.jwt)?;
        let user_id = claims
            .user_id()
            .map_err(|_| AppError::Auth(AuthError::InvalidRefreshToken))?;

        match self.sessions.get(user_id).await? {
            Some(current) if current == refresh_token => (),
            _ => {
                tracing::warn!(user_id = %user_id, "Refresh token not current for user");
                return Err(AppError::Auth(AuthError::InvalidRefreshToken));
            }
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Auth(AuthError::UserNotFound))?;

        let tokens = self.open_session(&user, true).await?;

        tracing::info!(user_id = %user.id, "Tokens refreshed");

        Ok(AuthOutcome { user, tokens })
    }

    /// Best-effort session revocation. Safe to call repeatedly; an unknown
    /// or already-revoked token is a no-op, never an error.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<(), AppError> {
        let Some(token) = refresh_token else {
            return Ok(());
        };

        if let Ok(claims) = validate_refresh_token(token, &self.jwt) {
            if let Ok(user_id) = claims.user_id() {
                self.sessions.delete(user_id).await?;
                tracing::info!(user_id = %user_id, "User logged out");
            }
        }
        Ok(())
    }

    /// Change the password of an authenticated user, revoking their session.
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let current_valid = self
            .verify_on_blocking_pool(current_password.to_string(), user.password_hash.clone())
            .await?;
        if !current_valid {
            return Err(AppError::Auth(AuthError::IncorrectCurrentPassword));
        }

        let new_hash = self.hash_on_blocking_pool(new_password.to_string()).await?;

        let mut user = user.clone();
        user.set_password_hash(new_hash);
        self.users.update(&user).await?;

        // Force re-authentication everywhere.
        self.sessions.delete(user.id).await?;

        tracing::info!(user_id = %user.id, "Password changed, session revoked");

        Ok(())
    }

    /// Mint a password-reset token for the account behind `email`.
    ///
    /// Returns `None` when no such account exists; callers present the same
    /// success-shaped response either way so the endpoint cannot be used to
    /// enumerate accounts.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, AppError> {
        let Some(mut user) = self.users.find_by_email(&email.to_lowercase()).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = generate_opaque_token();
        user.set_reset_token(
            hash_token(&token),
            Duration::seconds(self.security.reset_token_expiry_secs),
        );
        self.users.update(&user).await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");

        Ok(Some(token))
    }

    /// Redeem a reset token for a new password; revokes the session.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        if token.is_empty() {
            return Err(AppError::Auth(AuthError::InvalidResetToken));
        }

        let mut user = self
            .users
            .find_by_reset_token(&hash_token(token))
            .await?
            .ok_or(AppError::Auth(AuthError::InvalidResetToken))?;

        if !user.reset_token_valid() {
            return Err(AppError::Auth(AuthError::InvalidResetToken));
        }

        let new_hash = self.hash_on_blocking_pool(new_password.to_string()).await?;

        user.set_password_hash(new_hash);
        self.users.update(&user).await?;
        self.sessions.delete(user.id).await?;

        tracing::info!(user_id = %user.id, "Password reset, session revoked");

        Ok(())
    }

    /// Redeem an email-verification token.
    pub async fn verify_email(&self, token: &str) -> Result<(), AppError> {
        if token.is_empty() {
            return Err(AppError::Auth(AuthError::InvalidVerificationToken));
        }

        let mut user = self
            .users
            .find_by_verification_token(&hash_token(token))
            .await?
            .ok_or(AppError::Auth(AuthError::InvalidVerificationToken))?;

        user.is_email_verified = true;
        user.verification_token_hash = None;
        user.updated_at = chrono::Utc::now();
        self.users.update(&user).await?;

        tracing::info!(user_id = %user.id, "Email verified");

        Ok(())
    }

    /// Issue a token pair and record the refresh token as the user's single
    /// live session. Last writer wins by design.
    async fn open_session(&self, user: &User, remember_me: bool) -> Result<TokenPair, AppError> {
        let tokens = issue_token_pair(user, &self.jwt, remember_me)?;
        self.sessions
            .store(
                user.id,
                &tokens.refresh_token,
                refresh_expiry(&self.jwt, remember_me),
            )
            .await?;
        Ok(tokens)
    }

    /// Bcrypt is deliberately slow; run it off the async executor.
    async fn hash_on_blocking_pool(&self, password: String) -> Result<String, AppError> {
        let cost = self.security.bcrypt_cost;
        web::block(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
    }

    async fn verify_on_blocking_pool(
        &self,
        password: String,
        hash: String,
    ) -> Result<bool, AppError> {
        web::block(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
    }
}
