// HTTP request handlers for the auth flow and system endpoints
pub mod auth;
pub mod oauth;
pub mod system;


use actix_web::web;

// Re-export the main handler functions
pub use auth::{login, logout, me};
pub use oauth::oauth_callback;
pub use system::{health, notify_owner};

/// Register every route
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/auth/login", web::post().to(login))
        .route("/api/auth/logout", web::post().to(logout))
        .route("/api/auth/me", web::get().to(me))
        .route("/api/oauth/callback", web::get().to(oauth_callback))
        .route("/api/system/health", web::post().to(health))
        .route("/api/system/notify-owner", web::post().to(notify_owner));
}
