//! Local credential authentication.
//!
//! Verifies a username/password pair against the credential store and
//! produces a [`Principal`] carrying the resolved authority set.

use std::sync::Arc;

use crate::domain::{AuthorityResolver, StoreError, UserRepository};
use crate::security::crypto::PasswordEncoder;
use crate::security::{AuthError, Principal};

/// Policy for users whose resolved authority set is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptyAuthorityPolicy {
    /// Fail the attempt as [`AuthError::UserNotFound`], hiding whether the
    /// account exists without permissions or not at all.
    #[default]
    MaskAsNotFound,
    /// Authenticate with an empty authority set. Such a principal passes no
    /// access check, but the session is established.
    Allow,
}

/// Authenticates local credentials against a [`UserRepository`].
///
/// # Example
/// ```ignore
/// let authenticator = DaoAuthenticator::new(store.clone(), resolver, encoder);
/// let principal = authenticator.authenticate("admin", "secret").await?;
/// ```
pub struct DaoAuthenticator {
    users: Arc<dyn UserRepository>,
    resolver: AuthorityResolver,
    encoder: Arc<dyn PasswordEncoder>,
    empty_authority_policy: EmptyAuthorityPolicy,
}

impl DaoAuthenticator {
    /// Creates an authenticator with the default empty-authority policy
    /// ([`EmptyAuthorityPolicy::MaskAsNotFound`]).
    pub fn new(
        users: Arc<dyn UserRepository>,
        resolver: AuthorityResolver,
        encoder: Arc<dyn PasswordEncoder>,
    ) -> Self {
        DaoAuthenticator {
            users,
            resolver,
            encoder,
            empty_authority_policy: EmptyAuthorityPolicy::default(),
        }
    }

    /// Overrides the empty-authority policy.
    pub fn empty_authority_policy(mut self, policy: EmptyAuthorityPolicy) -> Self {
        self.empty_authority_policy = policy;
        self
    }

    /// Authenticates a username/password pair.
    ///
    /// The username is folded to lower case before lookup. Checks run in a
    /// fixed order and the first failing one wins: existence, password,
    /// disabled, expired, locked, credentials-expired, and finally the
    /// empty-authority policy. A disabled and locked account therefore
    /// reports "disabled", not "locked".
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Principal, AuthError> {
        let normalized = username.to_lowercase();
        log::debug!("Authenticating {}", normalized);

        let user = self
            .users
            .find_by_username(&normalized)
            .await?
            .ok_or_else(|| {
                log::debug!("Username {} not found", normalized);
                AuthError::UserNotFound
            })?;

        // A federated-only account has no stored hash and cannot log in here.
        let stored = user.password.as_deref().ok_or(AuthError::BadCredentials)?;
        if !self.encoder.matches(password, stored) {
            return Err(AuthError::BadCredentials);
        }

        if !user.enabled {
            return Err(AuthError::AccountDisabled);
        }
        if user.expired {
            return Err(AuthError::AccountExpired);
        }
        if user.locked {
            return Err(AuthError::AccountLocked);
        }
        if user.credentials_expired {
            return Err(AuthError::CredentialsExpired);
        }

        let authorities = self.resolver.resolve(user.id).await?;
        if authorities.is_empty()
            && self.empty_authority_policy == EmptyAuthorityPolicy::MaskAsNotFound
        {
            log::debug!("User {} has no authorities, masking as not found", normalized);
            return Err(AuthError::UserNotFound);
        }

        Ok(Principal::new(
            user.username,
            stored.to_string(),
            user.enabled,
            user.expired,
            user.locked,
            user.credentials_expired,
            authorities,
        ))
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Store(err.to_string())
    }
}
