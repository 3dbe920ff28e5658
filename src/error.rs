/// Error Handling Module
///
/// Unified error handling for the auth core:
/// 1. Domain-specific error types (validation, store, auth, policy)
/// 2. A central `AppError` used for control flow
/// 3. HTTP response mapping with structured bodies and logging
///
/// Every operational error carries a fixed HTTP status and a machine-readable
/// code string; those propagate to the boundary unmodified. Unexpected errors
/// (store unreachable, signer misconfigured) log full detail and surface as a
/// generic 500 without leaking internals.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Validation errors for input data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(msg) => write!(f, "{}", msg),
        }
    }
}

impl StdError for ValidationError {}

/// Credential and session lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token supplied.
    MissingToken,
    /// Token signature or structure is invalid.
    InvalidToken,
    /// Token is well-formed but past its expiry.
    TokenExpired,
    /// Refresh token absent, malformed, or not the registry's current one.
    InvalidRefreshToken,
    /// Token decoded but no matching active user record exists.
    UserNotFound,
    /// The account has been deactivated.
    AccountDeactivated,
    /// Too many failed logins; the account is temporarily locked.
    AccountLocked,
    /// The password changed after this token was issued.
    PasswordChanged,
    /// Wrong email or password.
    InvalidCredentials,
    /// Registration attempted with an email that is already taken.
    UserExists,
    /// change-password supplied a wrong current password.
    IncorrectCurrentPassword,
    /// Password-reset token missing, unknown, or expired.
    InvalidResetToken,
    /// Email-verification token missing, unknown, or already used.
    InvalidVerificationToken,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "UNAUTHORIZED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            AuthError::AccountLocked => "ACCOUNT_LOCKED",
            AuthError::PasswordChanged => "PASSWORD_CHANGED",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::UserExists => "USER_EXISTS",
            AuthError::IncorrectCurrentPassword => "INCORRECT_CURRENT_PASSWORD",
            AuthError::InvalidResetToken => "INVALID_RESET_TOKEN",
            AuthError::InvalidVerificationToken => "INVALID_VERIFICATION_TOKEN",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::InvalidRefreshToken
            | AuthError::UserNotFound
            | AuthError::AccountDeactivated
            | AuthError::PasswordChanged
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::AccountLocked => StatusCode::LOCKED,
            AuthError::UserExists => StatusCode::CONFLICT,
            AuthError::IncorrectCurrentPassword
            | AuthError::InvalidResetToken
            | AuthError::InvalidVerificationToken => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AuthError::MissingToken => "Missing authentication token",
            AuthError::InvalidToken => "Invalid token",
            AuthError::TokenExpired => "Token has expired",
            AuthError::InvalidRefreshToken => "Invalid refresh token",
            AuthError::UserNotFound => "User not found",
            AuthError::AccountDeactivated => "Account has been deactivated",
            AuthError::AccountLocked => {
                "Account temporarily locked due to too many failed login attempts"
            }
            AuthError::PasswordChanged => "Password was changed, please log in again",
            AuthError::InvalidCredentials => "Invalid email or password",
            AuthError::UserExists => "Email already registered",
            AuthError::IncorrectCurrentPassword => "Current password is incorrect",
            AuthError::InvalidResetToken => "Invalid or expired password reset token",
            AuthError::InvalidVerificationToken => "Invalid or expired verification token",
        };
        write!(f, "{}", msg)
    }
}

impl StdError for AuthError {}

/// Authorization policy rejections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    InsufficientPermissions,
    ResourceNotFound,
    TwoFactorRequired,
    InvalidTwoFactorToken,
    /// Per-client request ceiling hit; carries the retry hint in seconds.
    RateLimitExceeded { retry_after: u64 },
}

impl PolicyError {
    pub fn code(&self) -> &'static str {
        match self {
            PolicyError::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            PolicyError::ResourceNotFound => "RESOURCE_NOT_FOUND",
            PolicyError::TwoFactorRequired => "2FA_REQUIRED",
            PolicyError::InvalidTwoFactorToken => "INVALID_2FA_TOKEN",
            PolicyError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PolicyError::InsufficientPermissions => StatusCode::FORBIDDEN,
            PolicyError::ResourceNotFound => StatusCode::NOT_FOUND,
            PolicyError::TwoFactorRequired | PolicyError::InvalidTwoFactorToken => {
                StatusCode::UNAUTHORIZED
            }
            PolicyError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            PolicyError::ResourceNotFound => write!(f, "Resource not found"),
            PolicyError::TwoFactorRequired => write!(f, "Two-factor authentication required"),
            PolicyError::InvalidTwoFactorToken => {
                write!(f, "Invalid two-factor authentication token")
            }
            PolicyError::RateLimitExceeded { retry_after } => {
                write!(f, "Too many requests, retry in {} seconds", retry_after)
            }
        }
    }
}

impl StdError for PolicyError {}

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Auth(AuthError),
    Policy(PolicyError),
    /// Credential store failure; never shown to the caller.
    Store(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Policy(e) => write!(f, "{}", e),
            AppError::Store(msg) => write!(f, "Store error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        AppError::Policy(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let error_msg = err.to_string();

        if error_msg.contains("duplicate key") || error_msg.contains("unique constraint") {
            AppError::Auth(AuthError::UserExists)
        } else {
            AppError::Store(error_msg)
        }
    }
}

/// Structured error body: `{"success": false, "message", "code"}`.
/// Rate-limit rejections additionally carry a retry-after hint.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl AppError {
    fn response_parts(&self) -> (StatusCode, ErrorResponse) {
        let (status, code, message, retry_after) = match self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR".to_string(),
                e.to_string(),
                None,
            ),
            AppError::Auth(e) => (e.status(), e.code().to_string(), e.to_string(), None),
            AppError::Policy(e) => {
                let retry_after = match e {
                    PolicyError::RateLimitExceeded { retry_after } => Some(*retry_after),
                    _ => None,
                };
                (e.status(), e.code().to_string(), e.to_string(), retry_after)
            }
            // Store and internal failures: generic message, details stay in logs.
            AppError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                "Internal server error".to_string(),
                None,
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                "Internal server error".to_string(),
                None,
            ),
        };

        (
            status,
            ErrorResponse {
                success: false,
                message,
                code,
                retry_after,
            },
        )
    }

    fn log(&self) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error = %e, "Validation error");
            }
            AppError::Auth(e) => {
                tracing::warn!(error = %e, code = e.code(), "Authentication error");
            }
            AppError::Policy(e) => {
                tracing::warn!(error = %e, code = e.code(), "Authorization rejection");
            }
            AppError::Store(msg) => {
                tracing::error!(error = %msg, "Credential store error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.log();

        let (status, body) = self.response_parts();
        let mut builder = HttpResponse::build(status);
        if let Some(retry_after) = body.retry_after {
            builder.insert_header(("Retry-After", retry_after.to_string()));
        }
        builder.json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(e) => e.status(),
            AppError::Policy(e) => e.status(),
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_codes_and_statuses() {
        assert_eq!(AuthError::MissingToken.code(), "UNAUTHORIZED");
        assert_eq!(AuthError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::AccountLocked.status(), StatusCode::LOCKED);
        assert_eq!(AuthError::UserExists.status(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::IncorrectCurrentPassword.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::PasswordChanged.code(), "PASSWORD_CHANGED");
    }

    #[test]
    fn policy_error_codes_and_statuses() {
        assert_eq!(
            PolicyError::InsufficientPermissions.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(PolicyError::ResourceNotFound.status(), StatusCode::NOT_FOUND);
        let limited = PolicyError::RateLimitExceeded { retry_after: 42 };
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.code(), "RATE_LIMIT_EXCEEDED");
    }

    #[test]
    fn response_body_shape() {
        let err = AppError::Auth(AuthError::InvalidCredentials);
        let (status, body) = err.response_parts();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!body.success);
        assert_eq!(body.code, "INVALID_CREDENTIALS");
        assert!(body.retry_after.is_none());
    }

    #[test]
    fn rate_limit_response_carries_retry_after() {
        let err = AppError::Policy(PolicyError::RateLimitExceeded { retry_after: 7 });
        let (status, body) = err.response_parts();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body.retry_after, Some(7));
    }

    #[test]
    fn store_errors_do_not_leak_details() {
        let err = AppError::Store("connection refused at 10.0.0.3:5432".to_string());
        let (_, body) = err.response_parts();
        assert_eq!(body.message, "Internal server error");
        assert!(!body.message.contains("10.0.0.3"));
    }

    #[test]
    fn unique_violation_maps_to_user_exists() {
        let err: AppError = sqlx::Error::Protocol(
            "duplicate key value violates unique constraint \"users_email_key\"".into(),
        )
        .into();
        match err {
            AppError::Auth(AuthError::UserExists) => (),
            other => panic!("expected UserExists, got {:?}", other),
        }
    }
}
