use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::role::Role;

/// A registered account.
///
/// Plain data: mutation helpers below adjust the in-memory value, persistence
/// goes through a `UserStore`. Never hard-deleted by normal flows; `is_active`
/// is the soft-deactivation switch.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Stored lowercased; uniqueness is case-insensitive.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub two_factor_enabled: bool,
    /// Consecutive failed login attempts; reset to 0 on success.
    #[serde(skip_serializing)]
    pub login_attempts: i32,
    /// While set and in the future, authentication is refused regardless of
    /// password correctness.
    #[serde(skip_serializing)]
    pub lock_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    /// Bumped whenever the hash changes; tokens issued before it are dead.
    #[serde(skip_serializing)]
    pub password_changed_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub verification_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            password_hash,
            first_name,
            last_name,
            role,
            is_active: true,
            is_email_verified: false,
            two_factor_enabled: false,
            login_attempts: 0,
            lock_until: None,
            last_login_at: None,
            password_changed_at: now,
            reset_token_hash: None,
            reset_token_expires_at: None,
            verification_token_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the account is inside an active lockout window.
    pub fn is_locked(&self) -> bool {
        match self.lock_until {
            Some(until) => Utc::now() < until,
            None => false,
        }
    }

    /// Whether a token issued at `issued_at` predates the latest password
    /// change. Strictly-after comparison: a token minted in the same second
    /// as the change is still honored.
    pub fn password_changed_after(&self, issued_at: DateTime<Utc>) -> bool {
        self.password_changed_at > issued_at
    }

    /// Record a failed login attempt. Locks the account once the attempt
    /// count reaches `max_attempts`. Returns true when this attempt caused
    /// the lock.
    pub fn register_failed_login(&mut self, max_attempts: i32, lockout: Duration) -> bool {
        self.login_attempts += 1;
        self.updated_at = Utc::now();
        if self.login_attempts >= max_attempts {
            self.lock_until = Some(Utc::now() + lockout);
            return true;
        }
        false
    }

    /// Record a successful login: reset the attempt counter, clear any lock,
    /// stamp the login time.
    pub fn register_successful_login(&mut self) {
        self.login_attempts = 0;
        self.lock_until = None;
        self.last_login_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Install a new password hash and bump the change epoch.
    pub fn set_password_hash(&mut self, hash: String) {
        self.password_hash = hash;
        self.password_changed_at = Utc::now();
        self.reset_token_hash = None;
        self.reset_token_expires_at = None;
        self.updated_at = Utc::now();
    }

    pub fn set_reset_token(&mut self, token_hash: String, ttl: Duration) {
        self.reset_token_hash = Some(token_hash);
        self.reset_token_expires_at = Some(Utc::now() + ttl);
        self.updated_at = Utc::now();
    }

    /// Whether the stored reset token is still usable.
    pub fn reset_token_valid(&self) -> bool {
        match (&self.reset_token_hash, self.reset_token_expires_at) {
            (Some(_), Some(expires_at)) => Utc::now() < expires_at,
            _ => false,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User::new(
            "Alice@Example.com".to_string(),
            "$2b$04$fakehash".to_string(),
            "Alice".to_string(),
            "Smith".to_string(),
            Role::User,
        )
    }

    #[test]
    fn new_user_lowercases_email() {
        let user = test_user();
        assert_eq!(user.email, "alice@example.com");
        assert!(user.is_active);
        assert!(!user.is_locked());
        assert_eq!(user.login_attempts, 0);
    }

    #[test]
    fn failed_logins_lock_at_threshold() {
        let mut user = test_user();
        for _ in 0..4 {
            assert!(!user.register_failed_login(5, Duration::minutes(15)));
        }
        assert!(!user.is_locked());
        assert!(user.register_failed_login(5, Duration::minutes(15)));
        assert!(user.is_locked());
        assert_eq!(user.login_attempts, 5);
    }

    #[test]
    fn successful_login_clears_lock_state() {
        let mut user = test_user();
        for _ in 0..5 {
            user.register_failed_login(5, Duration::minutes(15));
        }
        assert!(user.is_locked());

        user.register_successful_login();
        assert!(!user.is_locked());
        assert_eq!(user.login_attempts, 0);
        assert!(user.last_login_at.is_some());
    }

    #[test]
    fn expired_lock_is_not_locked() {
        let mut user = test_user();
        user.lock_until = Some(Utc::now() - Duration::seconds(1));
        assert!(!user.is_locked());
    }

    #[test]
    fn password_epoch_comparison_is_strict() {
        let mut user = test_user();
        let issued_at = user.password_changed_at;
        assert!(!user.password_changed_after(issued_at));

        user.set_password_hash("$2b$04$newhash".to_string());
        assert!(user.password_changed_after(issued_at));
    }

    #[test]
    fn set_password_clears_reset_token() {
        let mut user = test_user();
        user.set_reset_token("digest".to_string(), Duration::hours(1));
        assert!(user.reset_token_valid());

        user.set_password_hash("$2b$04$newhash".to_string());
        assert!(!user.reset_token_valid());
        assert!(user.reset_token_hash.is_none());
    }

    #[test]
    fn expired_reset_token_is_invalid() {
        let mut user = test_user();
        user.reset_token_hash = Some("digest".to_string());
        user.reset_token_expires_at = Some(Utc::now() - Duration::seconds(1));
        assert!(!user.reset_token_valid());
    }
}
