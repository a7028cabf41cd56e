//! User, role and privilege records.
//!
//! These are plain data structures handed out by the repositories. There is
//! no live object graph: the user to role to privilege navigation is done
//! through explicit queries.

/// Identifier of a stored user.
pub type UserId = i64;
/// Identifier of a stored role.
pub type RoleId = i64;
/// Identifier of a stored privilege.
pub type PrivilegeId = i64;

/// A stored user record.
///
/// Usernames are unique and kept in lower case. Users are never physically
/// deleted; accounts are retired through the status flags instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Encoded password. `None` for users provisioned through federated
    /// login, which cannot authenticate with a local credential.
    pub password: Option<String>,
    pub email: String,
    pub enabled: bool,
    pub expired: bool,
    pub locked: bool,
    pub credentials_expired: bool,
}

/// A named bundle of privileges, many-to-many with users.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    /// Unique role name, e.g. `ADMIN`.
    pub name: String,
}

/// The atomic permission unit, many-to-many with roles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Privilege {
    pub id: PrivilegeId,
    /// Unique privilege name, e.g. `CREATE_USER`.
    pub name: String,
}

/// Data for a user about to be persisted.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub password: Option<String>,
    pub email: String,
    pub enabled: bool,
    pub expired: bool,
    pub locked: bool,
    pub credentials_expired: bool,
}

impl NewUser {
    /// A new enabled user with all other flags clear and no password.
    pub fn new(username: &str, email: &str) -> Self {
        NewUser {
            username: username.to_string(),
            password: None,
            email: email.to_string(),
            enabled: true,
            expired: false,
            locked: false,
            credentials_expired: false,
        }
    }

    /// Sets the encoded password.
    pub fn password(mut self, encoded: &str) -> Self {
        self.password = Some(encoded.to_string());
        self
    }

    /// Sets the enabled flag.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the expired flag.
    pub fn expired(mut self, expired: bool) -> Self {
        self.expired = expired;
        self
    }

    /// Sets the locked flag.
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Sets the credentials-expired flag.
    pub fn credentials_expired(mut self, credentials_expired: bool) -> Self {
        self.credentials_expired = credentials_expired;
        self
    }
}
