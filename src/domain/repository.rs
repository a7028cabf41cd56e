//! Credential store access.
//!
//! The store is modelled as two repository traits so implementations can be
//! backed by any relational or remote source. Reads are idempotent and
//! absence is `Ok(None)`, never an error; the caller decides whether absence
//! is fatal. [`InMemoryStore`] is the reference implementation used in tests
//! and small deployments.

use std::sync::Arc;

use async_trait::async_trait;
use derive_more::{Display, Error};
use tokio::sync::RwLock;

use crate::domain::model::{NewUser, Privilege, PrivilegeId, Role, RoleId, User, UserId};

/// Errors produced by the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum StoreError {
    /// The addressed record does not exist (write paths only).
    #[display("record not found")]
    NotFound,
    /// A unique constraint (username or email) would be violated.
    #[display("record already exists")]
    AlreadyExists,
    /// The underlying store failed.
    #[display("store unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
}

/// Read and write access to user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks up a user by username, case-insensitively.
    ///
    /// Stored usernames are expected to be lower case; this layer does not
    /// enforce it.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Looks up a user by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Returns all user records.
    async fn find_all(&self) -> Result<Vec<User>, StoreError>;

    /// Persists a new user, assigning its identifier.
    async fn save(&self, user: NewUser) -> Result<User, StoreError>;

    /// Updates an existing user record.
    async fn update(&self, user: &User) -> Result<(), StoreError>;

    /// Replaces the set of roles assigned to a user.
    async fn assign_roles(&self, user: UserId, roles: &[RoleId]) -> Result<(), StoreError>;
}

/// Read access to roles and their privileges.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Returns all roles.
    async fn find_all(&self) -> Result<Vec<Role>, StoreError>;

    /// Returns the roles whose names appear in `names`.
    async fn find_by_name_in(&self, names: &[&str]) -> Result<Vec<Role>, StoreError>;

    /// Returns the roles assigned to a user, in one round trip.
    async fn find_for_user(&self, user: UserId) -> Result<Vec<Role>, StoreError>;

    /// Returns the privileges of the given roles, in one round trip.
    async fn find_privileges(&self, roles: &[RoleId]) -> Result<Vec<Privilege>, StoreError>;
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    roles: Vec<Role>,
    privileges: Vec<Privilege>,
    user_roles: Vec<(UserId, RoleId)>,
    role_privileges: Vec<(RoleId, PrivilegeId)>,
    next_user_id: UserId,
    next_role_id: RoleId,
    next_privilege_id: PrivilegeId,
}

/// In-memory credential store implementing both repository traits.
///
/// # Example
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// let admin_role = store.add_role("ADMIN", &["CREATE_USER", "READ_USER"]).await;
/// let admin = store.save(NewUser::new("admin", "admin@example.com")).await?;
/// store.assign_roles(admin.id, &[admin_role]).await?;
/// ```
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        InMemoryStore {
            inner: RwLock::new(Tables::default()),
        }
    }

    /// Creates an empty store behind an `Arc`, ready to share between the
    /// repository seams.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Adds a role with the given privileges, creating privileges that do
    /// not exist yet. Returns the role id.
    pub async fn add_role(&self, name: &str, privileges: &[&str]) -> RoleId {
        let mut tables = self.inner.write().await;

        let role_id = match tables.roles.iter().find(|r| r.name == name) {
            Some(role) => role.id,
            None => {
                tables.next_role_id += 1;
                let id = tables.next_role_id;
                tables.roles.push(Role {
                    id,
                    name: name.to_string(),
                });
                id
            }
        };

        for privilege in privileges {
            let privilege_id = match tables.privileges.iter().find(|p| p.name == *privilege) {
                Some(existing) => existing.id,
                None => {
                    tables.next_privilege_id += 1;
                    let id = tables.next_privilege_id;
                    tables.privileges.push(Privilege {
                        id,
                        name: privilege.to_string(),
                    });
                    id
                }
            };
            if !tables.role_privileges.contains(&(role_id, privilege_id)) {
                tables.role_privileges.push((role_id, privilege_id));
            }
        }

        role_id
    }

    /// Assigns an existing role to a user by role name, keeping any roles
    /// the user already holds.
    pub async fn assign_role(&self, user: UserId, role_name: &str) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;

        if !tables.users.iter().any(|u| u.id == user) {
            return Err(StoreError::NotFound);
        }
        let role_id = tables
            .roles
            .iter()
            .find(|r| r.name == role_name)
            .map(|r| r.id)
            .ok_or(StoreError::NotFound)?;

        if !tables.user_roles.contains(&(user, role_id)) {
            tables.user_roles.push((user, role_id));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.users.clone())
    }

    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.inner.write().await;

        let duplicate = tables.users.iter().any(|u| {
            u.username.eq_ignore_ascii_case(&user.username)
                || (!user.email.is_empty() && u.email == user.email)
        });
        if duplicate {
            return Err(StoreError::AlreadyExists);
        }

        tables.next_user_id += 1;
        let record = User {
            id: tables.next_user_id,
            username: user.username,
            password: user.password,
            email: user.email,
            enabled: user.enabled,
            expired: user.expired,
            locked: user.locked,
            credentials_expired: user.credentials_expired,
        };
        tables.users.push(record.clone());
        Ok(record)
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        match tables.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn assign_roles(&self, user: UserId, roles: &[RoleId]) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;

        if !tables.users.iter().any(|u| u.id == user) {
            return Err(StoreError::NotFound);
        }
        tables.user_roles.retain(|(u, _)| *u != user);
        for role in roles {
            tables.user_roles.push((user, *role));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Role>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.roles.clone())
    }

    async fn find_by_name_in(&self, names: &[&str]) -> Result<Vec<Role>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .roles
            .iter()
            .filter(|r| names.contains(&r.name.as_str()))
            .cloned()
            .collect())
    }

    async fn find_for_user(&self, user: UserId) -> Result<Vec<Role>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .roles
            .iter()
            .filter(|r| tables.user_roles.contains(&(user, r.id)))
            .cloned()
            .collect())
    }

    async fn find_privileges(&self, roles: &[RoleId]) -> Result<Vec<Privilege>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .privileges
            .iter()
            .filter(|p| {
                tables
                    .role_privileges
                    .iter()
                    .any(|(r, pr)| roles.contains(r) && *pr == p.id)
            })
            .cloned()
            .collect())
    }
}
