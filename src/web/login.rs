//! Form login and logout endpoints.
//!
//! Successful authentication rotates the session id and stores the
//! principal under the session; failures redirect back to the login page
//! with a generic error marker so the response never reveals whether the
//! username exists, the password was wrong or the account is flagged.

use std::sync::Arc;

use actix_session::Session;
use actix_web::http::header::LOCATION;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::security::{AuthError, DaoAuthenticator, SessionUser, SESSION_PRINCIPAL_KEY};

use super::csrf::CsrfToken;

/// Form login configuration.
#[derive(Clone)]
pub struct FormLoginConfig {
    login_page: String,
    default_success_url: String,
    failure_url: String,
    logout_success_url: String,
}

impl Default for FormLoginConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FormLoginConfig {
    /// Default configuration: login at `/login`, success redirects to `/`,
    /// failures to `/login?error=true` and logout to `/login?logout`.
    pub fn new() -> Self {
        FormLoginConfig {
            login_page: "/login".to_string(),
            default_success_url: "/".to_string(),
            failure_url: "/login?error=true".to_string(),
            logout_success_url: "/login?logout".to_string(),
        }
    }

    /// Sets the login page path.
    pub fn login_page(mut self, url: &str) -> Self {
        self.login_page = url.to_string();
        self
    }

    /// Sets the post-login redirect target.
    pub fn default_success_url(mut self, url: &str) -> Self {
        self.default_success_url = url.to_string();
        self
    }

    /// Sets the post-failure redirect target.
    pub fn failure_url(mut self, url: &str) -> Self {
        self.failure_url = url.to_string();
        self
    }

    /// Sets the post-logout redirect target.
    pub fn logout_success_url(mut self, url: &str) -> Self {
        self.logout_success_url = url.to_string();
        self
    }
}

/// Submitted login credentials.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Serves the login page.
///
/// Returns the CSRF token the subsequent POST must carry.
pub async fn login_page(token: Option<web::ReqData<CsrfToken>>) -> impl Responder {
    let token = token.map(|t| t.value().to_string());
    HttpResponse::Ok().json(json!({ "csrf_token": token }))
}

/// Handles a login attempt.
pub async fn login(
    form: web::Form<LoginForm>,
    session: Session,
    authenticator: web::Data<Arc<DaoAuthenticator>>,
    config: web::Data<FormLoginConfig>,
) -> HttpResponse {
    match authenticator.authenticate(&form.username, &form.password).await {
        Ok(principal) => {
            log::debug!("Authenticated {}", principal.username());
            // Rotate the session id so a pre-login session cannot be fixated.
            session.renew();
            if session
                .insert(SESSION_PRINCIPAL_KEY, SessionUser::from_principal(&principal))
                .is_err()
            {
                log::error!("Failed to persist principal into the session");
                return HttpResponse::InternalServerError().finish();
            }
            HttpResponse::Found()
                .insert_header((LOCATION, config.default_success_url.clone()))
                .finish()
        }
        Err(AuthError::Store(reason)) => {
            log::error!("Credential store unavailable during login: {}", reason);
            HttpResponse::InternalServerError().finish()
        }
        Err(error) => {
            log::debug!("Login failed for {}: {}", form.username, error);
            HttpResponse::Found()
                .insert_header((LOCATION, config.failure_url.clone()))
                .finish()
        }
    }
}

/// Terminates the session.
pub async fn logout(session: Session, config: web::Data<FormLoginConfig>) -> HttpResponse {
    session.purge();
    HttpResponse::Found()
        .insert_header((LOCATION, config.logout_success_url.clone()))
        .finish()
}
