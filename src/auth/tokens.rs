/// Token issuance and validation.
///
/// Access and refresh tokens are both self-contained HS256 JWTs signed with
/// independent secrets. The refresh token is additionally pinned to the
/// session registry: it is only honored while it matches the registry's
/// current value for that user, which is what makes revocation possible.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::Serialize;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::domain::User;
use crate::error::{AppError, AuthError};

/// An issued access/refresh pair.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Mint an access/refresh pair for a user. `remember_me` selects the longer
/// refresh lifetime. Signing failures are configuration errors and surface
/// as internal errors.
pub fn issue_token_pair(
    user: &User,
    config: &JwtSettings,
    remember_me: bool,
) -> Result<TokenPair, AppError> {
    let access_token = generate_access_token(user, config)?;
    let refresh_token = generate_refresh_token(user, config, remember_me)?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        expires_in: config.access_token_expiry,
    })
}

pub fn generate_access_token(user: &User, config: &JwtSettings) -> Result<String, AppError> {
    let claims = Claims::new(
        user.id,
        user.email.clone(),
        user.role,
        config.access_token_expiry,
        config.issuer.clone(),
    );
    sign(&claims, &config.access_secret)
}

pub fn generate_refresh_token(
    user: &User,
    config: &JwtSettings,
    remember_me: bool,
) -> Result<String, AppError> {
    let claims = Claims::new(
        user.id,
        user.email.clone(),
        user.role,
        refresh_expiry(config, remember_me),
        config.issuer.clone(),
    );
    sign(&claims, &config.refresh_secret)
}

/// Refresh TTL in seconds for the chosen login persistence.
pub fn refresh_expiry(config: &JwtSettings, remember_me: bool) -> i64 {
    if remember_me {
        config.refresh_token_expiry
    } else {
        config.short_refresh_token_expiry
    }
}

fn sign(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate an access token, distinguishing stale from malformed tokens.
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    decode_with(token, &config.access_secret, &config.issuer).map_err(|kind| match kind {
        ErrorKind::ExpiredSignature => AppError::Auth(AuthError::TokenExpired),
        _ => AppError::Auth(AuthError::InvalidToken),
    })
}

/// Validate a refresh token. Any defect (signature, structure, expiry,
/// issuer) collapses to `INVALID_REFRESH_TOKEN`.
pub fn validate_refresh_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    decode_with(token, &config.refresh_secret, &config.issuer)
        .map_err(|_| AppError::Auth(AuthError::InvalidRefreshToken))
}

fn decode_with(token: &str, secret: &str, issuer: &str) -> Result<Claims, ErrorKind> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| e.into_kind())
}
