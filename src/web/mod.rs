//! HTTP surface: login, logout, CSRF protection and the user-management
//! endpoints.
//!
//! # Module Structure
//!
//! - `csrf` - session-backed CSRF token middleware
//! - `login` - form login and logout handlers
//! - `users` - gated user-management handlers

pub mod csrf;
pub mod login;
pub mod users;

use actix_web::web;

pub use csrf::{CsrfConfig, CsrfMiddleware, CsrfProtection, CsrfToken};
pub use login::{FormLoginConfig, LoginForm};

/// Registers the login and user-management routes.
///
/// Expects `Arc<DaoAuthenticator>`, `Arc<UserService>` and
/// [`FormLoginConfig`] in application data.
///
/// # Example
/// ```ignore
/// App::new()
///     .app_data(web::Data::new(authenticator))
///     .app_data(web::Data::new(service))
///     .app_data(web::Data::new(FormLoginConfig::new()))
///     .configure(routes)
/// ```
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::get().to(login::login_page))
        .route("/login", web::post().to(login::login))
        .route("/logout", web::post().to(login::logout))
        .route("/users", web::get().to(users::list_users))
        .route("/users", web::post().to(users::create_user))
        .route("/users", web::put().to(users::update_user))
        .route("/users/roles", web::post().to(users::update_roles))
        .route("/users/{username}", web::get().to(users::get_user))
        .route("/roles", web::get().to(users::list_roles));
}
