use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::configuration::Settings;
use crate::middleware::{AuthGate, RateLimit, RateLimiter};
use crate::routes::{
    admin_overview, change_password, current_user, forgot_password, health_check, login, logout,
    refresh, register, reset_password, verify_email,
};
use crate::sessions::SessionRegistry;
use crate::store::UserStore;

pub fn run(
    listener: TcpListener,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionRegistry>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let limiter = Arc::new(RateLimiter::new(
        settings.security.rate_limit_window_secs,
        settings.security.rate_limit_max_requests,
    ));
    let service = web::Data::new(AuthService::new(
        users.clone(),
        sessions,
        settings.jwt.clone(),
        settings.security.clone(),
    ));
    let jwt_config = settings.jwt;

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(RateLimit::new(limiter.clone()))
            // Shared state
            .app_data(service.clone())
            // Public routes (no authentication required)
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))
            .route("/auth/forgot-password", web::post().to(forgot_password))
            .route("/auth/reset-password", web::post().to(reset_password))
            .route("/auth/verify-email", web::post().to(verify_email))
            // Protected routes (require a live access token)
            .service(
                web::scope("/api")
                    .wrap(AuthGate::required(users.clone(), jwt_config.clone()))
                    .route("/me", web::get().to(current_user))
                    .route("/change-password", web::post().to(change_password))
                    .route("/admin/overview", web::get().to(admin_overview)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
