//! Request-scoped security context.
//!
//! The current identity is passed explicitly: handlers take a
//! [`SecurityContext`] argument and hand it to whatever operation they call.
//! There is no ambient thread-local or global holder, which keeps access
//! decisions pure and trivially testable.

use std::future::{ready, Ready};

use actix_session::SessionExt;
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};

use crate::security::Principal;

/// Session key under which the authenticated identity is stored.
pub const SESSION_PRINCIPAL_KEY: &str = "authority.principal";

/// The identity attached to the current request, if any.
///
/// # Usage
/// ```ignore
/// async fn handler(ctx: SecurityContext, service: web::Data<UserService>) -> impl Responder {
///     service.get_users(&ctx).await
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct SecurityContext {
    principal: Option<Principal>,
}

impl SecurityContext {
    /// A context with no authenticated identity.
    pub fn anonymous() -> Self {
        SecurityContext { principal: None }
    }

    /// A context carrying an authenticated principal.
    pub fn of(principal: Principal) -> Self {
        SecurityContext {
            principal: Some(principal),
        }
    }

    /// Returns the authenticated principal, if present.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns true if an authenticated principal is present.
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Checks if the current principal holds the given authority.
    pub fn has_authority(&self, authority: &str) -> bool {
        self.principal
            .as_ref()
            .is_some_and(|p| p.has_authority(authority))
    }

    /// Checks if the current principal holds any of the given authorities.
    pub fn has_any_authority(&self, authorities: &[&str]) -> bool {
        self.principal
            .as_ref()
            .is_some_and(|p| p.has_any_authority(authorities))
    }

    /// Checks if the current principal holds all of the given authorities.
    pub fn has_all_authorities(&self, authorities: &[&str]) -> bool {
        self.principal
            .as_ref()
            .is_some_and(|p| p.has_all_authorities(authorities))
    }
}

impl FromRequest for SecurityContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = match req.get_session().get::<SessionUser>(SESSION_PRINCIPAL_KEY) {
            Ok(Some(user)) => SecurityContext::of(user.into_principal()),
            _ => SecurityContext::anonymous(),
        };
        ready(Ok(ctx))
    }
}

/// Serializable identity stored in the session after a successful login.
///
/// Kept separate from [`Principal`] so the session never carries the
/// password hash or account flags.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionUser {
    /// Username, lower case.
    pub username: String,
    /// Authority set resolved at login time.
    pub authorities: Vec<String>,
}

impl SessionUser {
    /// Captures the session-relevant part of a principal.
    pub fn from_principal(principal: &Principal) -> Self {
        SessionUser {
            username: principal.username().to_string(),
            authorities: principal.authorities().iter().cloned().collect(),
        }
    }

    /// Rebuilds a principal for the remainder of the session.
    pub fn into_principal(self) -> Principal {
        Principal::resumed(&self.username, self.authorities)
    }
}
