//! Authentication, principals and access decisions.
//!
//! # Module Structure
//!
//! - `access` - typed per-operation authority requirements
//! - `authenticator` - local credential authentication
//! - `context` - explicitly passed request-scoped security context
//! - `crypto` - password encoding (Argon2, BCrypt, NoOp)
//! - `error` - the failure taxonomy
//! - `oauth2` - federated identity resolution and auto-provisioning
//! - `principal` - the resolved authenticated identity

pub mod access;
pub mod authenticator;
pub mod context;
pub mod crypto;
pub mod error;
pub mod oauth2;
pub mod principal;

pub use access::Requirement;
pub use authenticator::{DaoAuthenticator, EmptyAuthorityPolicy};
pub use context::{SecurityContext, SessionUser, SESSION_PRINCIPAL_KEY};
#[cfg(feature = "argon2")]
pub use crypto::Argon2PasswordEncoder;
#[cfg(feature = "bcrypt")]
pub use crypto::BCryptPasswordEncoder;
pub use crypto::{NoOpPasswordEncoder, PasswordEncoder};
pub use error::AuthError;
pub use oauth2::{MissingEmailPolicy, OAuth2UserAssertion, RegisteringOAuth2UserService};
pub use principal::Principal;
