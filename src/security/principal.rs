//! The resolved, authenticated representation of a user.

use std::collections::HashSet;
use std::fmt;

/// An authenticated identity for the duration of one session.
///
/// A principal is built per authentication event and carries the flattened
/// authority set resolved at that moment. Role or privilege changes made
/// after authentication are only picked up on the next login.
///
/// # Example
/// ```
/// use actix_authority::security::Principal;
///
/// let principal = Principal::resumed("admin", ["CREATE_USER".to_string()]);
/// assert!(principal.has_authority("CREATE_USER"));
/// assert!(!principal.has_authority("DELETE_USER"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    username: String,
    /// Encoded password, held for verification only. Empty for principals
    /// restored from a session or produced by federated login.
    password: String,
    enabled: bool,
    expired: bool,
    locked: bool,
    credentials_expired: bool,
    authorities: HashSet<String>,
}

impl Principal {
    /// Creates a principal from resolved user data.
    pub fn new(
        username: String,
        password: String,
        enabled: bool,
        expired: bool,
        locked: bool,
        credentials_expired: bool,
        authorities: HashSet<String>,
    ) -> Self {
        Principal {
            username,
            password,
            enabled,
            expired,
            locked,
            credentials_expired,
            authorities,
        }
    }

    /// Creates a principal restored from an established session, or produced
    /// by a path that carries no local credential.
    ///
    /// Status flags were already checked when the session was established, so
    /// the restored principal reports a clean account.
    pub fn resumed(username: &str, authorities: impl IntoIterator<Item = String>) -> Self {
        Principal {
            username: username.to_string(),
            password: String::new(),
            enabled: true,
            expired: false,
            locked: false,
            credentials_expired: false,
            authorities: authorities.into_iter().collect(),
        }
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the encoded password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns whether the account is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns whether the account has expired.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Returns whether the account is locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns whether the account's credentials have expired.
    pub fn is_credentials_expired(&self) -> bool {
        self.credentials_expired
    }

    /// Returns the resolved authority set.
    pub fn authorities(&self) -> &HashSet<String> {
        &self.authorities
    }

    /// Checks if the principal holds a specific authority.
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    /// Checks if the principal holds ANY of the given authorities.
    pub fn has_any_authority(&self, authorities: &[&str]) -> bool {
        authorities.iter().any(|a| self.has_authority(a))
    }

    /// Checks if the principal holds ALL of the given authorities.
    pub fn has_all_authorities(&self, authorities: &[&str]) -> bool {
        authorities.iter().all(|a| self.has_authority(a))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The password hash stays out of logs.
        write!(
            f,
            "Principal {{ username: {}, authorities: {:?} }}",
            self.username, self.authorities
        )
    }
}
