//! Access decisions for protected operations.
//!
//! Each protected operation declares its requirement as a typed
//! [`Requirement`] value and checks it against the caller's
//! [`SecurityContext`] before executing. The check is state-free: the same
//! context and requirement always produce the same decision.

use crate::security::{AuthError, Principal, SecurityContext};

/// A statically declared authority requirement for one operation.
///
/// # Example
/// ```
/// use actix_authority::security::{Principal, Requirement, SecurityContext};
///
/// let requirement = Requirement::authority("CREATE_USER");
/// let ctx = SecurityContext::of(Principal::resumed("admin", ["CREATE_USER".to_string()]));
/// assert!(requirement.check(&ctx).is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// A single authority must be held.
    Authority(String),
    /// At least one of the authorities must be held (OR).
    AnyOf(Vec<String>),
    /// Every authority must be held (AND).
    AllOf(Vec<String>),
}

impl Requirement {
    /// Requires a single authority.
    pub fn authority(name: &str) -> Self {
        Requirement::Authority(name.to_string())
    }

    /// Requires any one of the given authorities.
    pub fn any_of(names: &[&str]) -> Self {
        Requirement::AnyOf(names.iter().map(|n| n.to_string()).collect())
    }

    /// Requires all of the given authorities.
    pub fn all_of(names: &[&str]) -> Self {
        Requirement::AllOf(names.iter().map(|n| n.to_string()).collect())
    }

    /// Whether the given principal satisfies this requirement.
    pub fn satisfied_by(&self, principal: &Principal) -> bool {
        match self {
            Requirement::Authority(name) => principal.has_authority(name),
            Requirement::AnyOf(names) => names.iter().any(|n| principal.has_authority(n)),
            Requirement::AllOf(names) => names.iter().all(|n| principal.has_authority(n)),
        }
    }

    /// Gate for a protected operation.
    ///
    /// Fails with [`AuthError::Unauthenticated`] when the context carries no
    /// principal, and with [`AuthError::Forbidden`] when the principal lacks
    /// the required authorities. Both reject the operation outright; there is
    /// no partial execution.
    pub fn check(&self, ctx: &SecurityContext) -> Result<(), AuthError> {
        let principal = ctx.principal().ok_or(AuthError::Unauthenticated)?;
        if self.satisfied_by(principal) {
            Ok(())
        } else {
            log::debug!(
                "Denied {}: requirement {:?} not satisfied",
                principal.username(),
                self
            );
            Err(AuthError::Forbidden)
        }
    }
}
