/// Request-time authentication gate.
///
/// Per-request pipeline: bearer token extraction, signature/expiry
/// validation, user reload, active check, password-epoch check. The first
/// failed step settles the request with its specific rejection reason:
///
///   missing token        -> UNAUTHORIZED
///   bad signature/shape  -> INVALID_TOKEN
///   expired              -> TOKEN_EXPIRED
///   no active record     -> USER_NOT_FOUND
///   deactivated account  -> ACCOUNT_DEACTIVATED
///   stale password epoch -> PASSWORD_CHANGED
///
/// `AuthGate::optional` runs the same checks but proceeds unauthenticated on
/// any failure, for endpoints that merely behave differently for guests.

use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;

use crate::auth::{validate_access_token, Claims};
use crate::configuration::JwtSettings;
use crate::domain::User;
use crate::error::{AppError, AuthError};
use crate::store::UserStore;

/// Identity attached to the request after the gate passes.
#[derive(Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub claims: Claims,
    /// The raw bearer token, for handlers that pass it downstream.
    pub token: String,
}

pub struct AuthGate {
    users: Arc<dyn UserStore>,
    jwt: JwtSettings,
    required: bool,
}

impl AuthGate {
    /// Reject requests that fail any check.
    pub fn required(users: Arc<dyn UserStore>, jwt: JwtSettings) -> Self {
        Self {
            users,
            jwt,
            required: true,
        }
    }

    /// Proceed unauthenticated on failure instead of rejecting.
    pub fn optional(users: Arc<dyn UserStore>, jwt: JwtSettings) -> Self {
        Self {
            users,
            jwt,
            required: false,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthGateService {
            service: Rc::new(service),
            users: self.users.clone(),
            jwt: self.jwt.clone(),
            required: self.required,
        }))
    }
}

pub struct AuthGateService<S> {
    service: Rc<S>,
    users: Arc<dyn UserStore>,
    jwt: JwtSettings,
    required: bool,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let bearer = extract_bearer(&req);
        let users = self.users.clone();
        let jwt = self.jwt.clone();
        let required = self.required;
        let service = self.service.clone();

        Box::pin(async move {
            match authenticate(bearer, users.as_ref(), &jwt).await {
                Ok(identity) => {
                    tracing::debug!(
                        user_id = %identity.user.id,
                        role = %identity.user.role,
                        "Request authenticated"
                    );
                    req.extensions_mut().insert(identity);
                    service.call(req).await
                }
                Err(e) if required => Err(e.into()),
                Err(_) => service.call(req).await,
            }
        })
    }
}

fn extract_bearer(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// The full verification state machine. Short-circuits on the first failure.
async fn authenticate(
    bearer: Option<String>,
    users: &dyn UserStore,
    jwt: &JwtSettings,
) -> Result<AuthenticatedUser, AppError> {
    let token = bearer.ok_or(AppError::Auth(AuthError::MissingToken))?;

    let claims = validate_access_token(&token, jwt)?;
    let user_id = claims
        .user_id()
        .map_err(|_| AppError::Auth(AuthError::InvalidToken))?;

    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::Auth(AuthError::UserNotFound))?;

    if !user.is_active {
        return Err(AppError::Auth(AuthError::AccountDeactivated));
    }

    // Tokens minted before the last password change are dead even if
    // unexpired. This also closes the crash gap when the explicit session
    // revoke on password change did not land.
    if user.password_changed_after(claims.issued_at()) {
        return Err(AppError::Auth(AuthError::PasswordChanged));
    }

    Ok(AuthenticatedUser {
        user,
        claims,
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_access_token;
    use crate::domain::Role;
    use crate::store::InMemoryUserStore;
    use actix_web::{test, web, App, HttpResponse};

    fn test_jwt() -> JwtSettings {
        JwtSettings {
            access_secret: "access-test-secret-at-least-32-chars!".to_string(),
            refresh_secret: "refresh-test-secret-at-least-32-chars".to_string(),
            issuer: "taskhive-test".to_string(),
            ..JwtSettings::default()
        }
    }

    async fn seeded_store() -> (Arc<InMemoryUserStore>, User) {
        let store = Arc::new(InMemoryUserStore::new());
        let user = User::new(
            "gate@example.com".to_string(),
            "$2b$04$fakehash".to_string(),
            "Gate".to_string(),
            "User".to_string(),
            Role::User,
        );
        store.insert(&user).await.unwrap();
        (store, user)
    }

    async fn whoami(identity: Option<web::ReqData<AuthenticatedUser>>) -> HttpResponse {
        match identity {
            Some(identity) => HttpResponse::Ok().body(identity.user.email.clone()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    #[actix_web::test]
    async fn valid_token_passes_and_attaches_identity() {
        let (store, user) = seeded_store().await;
        let jwt = test_jwt();
        let token = generate_access_token(&user, &jwt).unwrap();

        let app = test::init_service(
            App::new()
                .wrap(AuthGate::required(store.clone(), jwt))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body = test::read_body(resp).await;
        assert_eq!(body, "gate@example.com");
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let (store, _) = seeded_store().await;
        let app = test::init_service(
            App::new()
                .wrap(AuthGate::required(store.clone(), test_jwt()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::try_call_service(&app, req).await;
        let err = resp.expect_err("should reject");
        assert_eq!(err.as_response_error().status_code(), 401);
    }

    #[actix_web::test]
    async fn deactivated_user_is_rejected() {
        let (store, mut user) = seeded_store().await;
        let jwt = test_jwt();
        let token = generate_access_token(&user, &jwt).unwrap();

        user.is_active = false;
        store.update(&user).await.unwrap();

        let app = test::init_service(
            App::new()
                .wrap(AuthGate::required(store.clone(), jwt))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let err = test::try_call_service(&app, req).await.expect_err("reject");
        assert_eq!(err.as_response_error().status_code(), 401);
        assert!(err.to_string().contains("deactivated"));
    }

    #[actix_web::test]
    async fn stale_password_epoch_is_rejected() {
        let (store, mut user) = seeded_store().await;
        let jwt = test_jwt();
        let token = generate_access_token(&user, &jwt).unwrap();

        // Simulate a later password change.
        user.password_changed_at = chrono::Utc::now() + chrono::Duration::seconds(5);
        store.update(&user).await.unwrap();

        let app = test::init_service(
            App::new()
                .wrap(AuthGate::required(store.clone(), jwt))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let err = test::try_call_service(&app, req).await.expect_err("reject");
        assert_eq!(err.as_response_error().status_code(), 401);
        assert!(err.to_string().contains("Password was changed"));
    }

    #[actix_web::test]
    async fn optional_gate_proceeds_unauthenticated() {
        let (store, _) = seeded_store().await;
        let app = test::init_service(
            App::new()
                .wrap(AuthGate::optional(store.clone(), test_jwt()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        // No token: passes through as anonymous.
        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(test::read_body(resp).await, "anonymous");

        // Garbage token: also anonymous rather than rejected.
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, "Bearer not.a.token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(test::read_body(resp).await, "anonymous");
    }
}
