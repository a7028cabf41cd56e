//! Authority resolution.
//!
//! Flattens a user's roles into the distinct set of privilege names. The
//! set is recomputed on every call and never cached on the user record, so
//! role and privilege edits take effect on the next login rather than
//! retroactively on an active session.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::model::UserId;
use crate::domain::repository::{RoleRepository, StoreError};

/// Resolves the flattened authority set of a user.
///
/// The resolution is a two-level navigation executed as two explicit
/// queries: one for the user's roles, one for those roles' privileges.
/// Concurrent role edits may be observed before or after; no snapshot
/// isolation is provided across the two steps.
#[derive(Clone)]
pub struct AuthorityResolver {
    roles: Arc<dyn RoleRepository>,
}

impl AuthorityResolver {
    /// Creates a resolver over the given role repository.
    pub fn new(roles: Arc<dyn RoleRepository>) -> Self {
        AuthorityResolver { roles }
    }

    /// Returns the distinct union of privilege names across all roles the
    /// user holds. Zero roles, or roles without privileges, resolve to the
    /// empty set.
    pub async fn resolve(&self, user: UserId) -> Result<HashSet<String>, StoreError> {
        let roles = self.roles.find_for_user(user).await?;
        log::trace!("Roles for user {}: {:?}", user, roles);

        let role_ids: Vec<_> = roles.iter().map(|r| r.id).collect();
        let privileges = self.roles.find_privileges(&role_ids).await?;

        let authorities: HashSet<String> =
            privileges.into_iter().map(|p| p.name).collect();
        log::debug!("Authorities for user {}: {:?}", user, authorities);

        Ok(authorities)
    }
}
