//! Authentication and authorization resolution for actix-web applications.
//!
//! The crate turns a presented credential, or a federated identity assertion,
//! into a [`security::Principal`] carrying the flattened set of authorities
//! derived from the user's roles, and gates protected operations on typed
//! [`security::Requirement`] policies checked against an explicitly passed
//! [`security::SecurityContext`].
//!
//! # Layers
//!
//! - [`domain`] - user/role/privilege records, repository traits with an
//!   in-memory reference store, authority resolution, and the gated
//!   user-management service.
//! - [`security`] - password encoding, the local and federated authentication
//!   adapters, the principal model, and access decisions.
//! - [`web`] - form login, CSRF protection, and the user-management HTTP
//!   endpoints.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use actix_authority::domain::{AuthorityResolver, InMemoryStore};
//! use actix_authority::security::{Argon2PasswordEncoder, DaoAuthenticator};
//!
//! let store = Arc::new(InMemoryStore::new());
//! let resolver = AuthorityResolver::new(store.clone());
//! let authenticator = DaoAuthenticator::new(
//!     store.clone(),
//!     resolver,
//!     Arc::new(Argon2PasswordEncoder::new()),
//! );
//!
//! let principal = authenticator.authenticate("admin", "secret").await?;
//! assert!(principal.has_authority("CREATE_USER"));
//! ```

pub mod domain;
pub mod security;
pub mod web;

pub use domain::{AuthorityResolver, InMemoryStore, RoleRepository, UserRepository, UserService};
pub use security::{AuthError, DaoAuthenticator, Principal, Requirement, SecurityContext};
pub use web::{CsrfConfig, CsrfProtection, FormLoginConfig};
