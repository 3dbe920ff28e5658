/// Authentication routes.
///
/// Thin HTTP boundary over `AuthService`: request shape checks live in the
/// DTOs, everything else is delegated. Error bodies are produced by
/// `AppError`'s `ResponseError` impl.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AuthService, RegistrationOutcome};
use crate::domain::Role;
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize, Default)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// POST /auth/register
pub async fn register(
    form: web::Json<RegisterRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let RegistrationOutcome { user, tokens, .. } = service
        .register(
            &form.email,
            &form.password,
            &form.first_name,
            &form.last_name,
            form.role,
        )
        .await?;
    // The verification token rides on the outcome for the email delivery
    // collaborator; the HTTP response never carries it.

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "user": user,
        "access_token": tokens.access_token,
        "refresh_token": tokens.refresh_token,
        "token_type": "Bearer",
        "expires_in": tokens.expires_in,
    })))
}

/// POST /auth/login
pub async fn login(
    form: web::Json<LoginRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let outcome = service
        .login(&form.email, &form.password, form.remember_me)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": outcome.user,
        "access_token": outcome.tokens.access_token,
        "refresh_token": outcome.tokens.refresh_token,
        "token_type": "Bearer",
        "expires_in": outcome.tokens.expires_in,
    })))
}

/// POST /auth/refresh
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let outcome = service.refresh(&form.refresh_token).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "access_token": outcome.tokens.access_token,
        "refresh_token": outcome.tokens.refresh_token,
        "token_type": "Bearer",
        "expires_in": outcome.tokens.expires_in,
    })))
}

/// POST /auth/logout — best-effort revocation, idempotent.
pub async fn logout(
    form: Option<web::Json<LogoutRequest>>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = form.as_ref().and_then(|f| f.refresh_token.as_deref());
    service.logout(refresh_token).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Logged out",
    })))
}

/// POST /auth/forgot-password
///
/// Always success-shaped, whether or not the email exists, so the endpoint
/// cannot be used to enumerate accounts.
pub async fn forgot_password(
    form: web::Json<ForgotPasswordRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    // The minted token (if any) goes to the email delivery collaborator.
    let _ = service.forgot_password(&form.email).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "If that email is registered, a password reset link has been sent",
    })))
}

/// POST /auth/reset-password
pub async fn reset_password(
    form: web::Json<ResetPasswordRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    service
        .reset_password(&form.token, &form.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password has been reset, please log in again",
    })))
}

/// POST /auth/verify-email
pub async fn verify_email(
    form: web::Json<VerifyEmailRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    service.verify_email(&form.token).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Email verified",
    })))
}

/// POST /api/change-password (authenticated)
pub async fn change_password(
    identity: web::ReqData<AuthenticatedUser>,
    form: web::Json<ChangePasswordRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    service
        .change_password(&identity.user, &form.current_password, &form.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password changed, please log in again",
    })))
}

/// GET /api/me (authenticated)
pub async fn current_user(
    identity: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": identity.user,
    })))
}
