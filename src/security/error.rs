//! Error taxonomy for authentication and access decisions.
//!
//! Every variant is terminal for the attempt that produced it. Nothing in
//! this crate retries an authentication on the caller's behalf; a failed
//! login has to be resubmitted by the end user.

use actix_web::error::ResponseError;
use actix_web::http::header::LOCATION;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use derive_more::{Display, Error};

/// Failure outcomes of the authentication and authorization flow.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum AuthError {
    /// No user record matches the presented username.
    ///
    /// Also reported when the resolved authority set is empty under the
    /// masking policy, so callers cannot tell absence apart from an account
    /// without permissions.
    #[display("user not found")]
    UserNotFound,
    /// The presented password does not match the stored hash, or the
    /// presented identity assertion is unusable.
    #[display("bad credentials")]
    BadCredentials,
    #[display("account disabled")]
    AccountDisabled,
    #[display("account expired")]
    AccountExpired,
    #[display("account locked")]
    AccountLocked,
    #[display("credentials expired")]
    CredentialsExpired,
    /// No authenticated principal in the current context.
    #[display("unauthenticated")]
    Unauthenticated,
    /// The principal lacks the required authority.
    #[display("forbidden")]
    Forbidden,
    /// The credential store failed. Surfaced as a server fault rather than
    /// an authentication outcome.
    #[display("credential store error: {_0}")]
    Store(#[error(not(source))] String),
}

impl AuthError {
    /// Whether this error came out of a login attempt.
    ///
    /// The web layer collapses all of these into a single generic login
    /// failure redirect so the response does not leak which check failed.
    pub fn is_login_failure(&self) -> bool {
        matches!(
            self,
            AuthError::UserNotFound
                | AuthError::BadCredentials
                | AuthError::AccountDisabled
                | AuthError::AccountExpired
                | AuthError::AccountLocked
                | AuthError::CredentialsExpired
        )
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::FOUND,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // A request with no authenticated identity is sent to the login
            // page; everything else is answered in place.
            AuthError::Unauthenticated => HttpResponse::Found()
                .insert_header((LOCATION, "/login"))
                .finish(),
            _ => HttpResponseBuilder::new(self.status_code()).body(self.to_string()),
        }
    }
}
