//! Federated (OAuth2/OIDC) authentication.
//!
//! The adapter consumes the user-info payload of an already completed
//! authorization-code exchange, matches it to a local user by email, and
//! auto-provisions a local record for identities seen for the first time.
//! The wire-level token exchange belongs to the surrounding web layer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;

use crate::domain::{AuthorityResolver, NewUser, RoleRepository, UserRepository};
use crate::security::{AuthError, Principal};

/// Attribute key carrying the identity's email address.
const EMAIL_ATTRIBUTE: &str = "email";
/// Attribute key carrying the identity's display name.
const NAME_ATTRIBUTE: &str = "name";

/// An identity assertion from an external provider.
///
/// Wraps the attribute map of the provider's user-info response. Only the
/// `email` and `name` attributes are interpreted here; everything else is
/// carried opaquely.
///
/// # Example
/// ```
/// use actix_authority::security::OAuth2UserAssertion;
/// use serde_json::json;
///
/// let assertion = OAuth2UserAssertion::new()
///     .attribute("email", json!("jane@example.com"))
///     .attribute("name", json!("Jane"));
///
/// assert_eq!(assertion.email().as_deref(), Some("jane@example.com"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct OAuth2UserAssertion {
    attributes: HashMap<String, Value>,
}

impl OAuth2UserAssertion {
    /// Creates an empty assertion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an assertion from a deserialized user-info payload.
    pub fn from_attributes(attributes: HashMap<String, Value>) -> Self {
        OAuth2UserAssertion { attributes }
    }

    /// Adds an attribute (builder pattern).
    pub fn attribute(mut self, key: &str, value: Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    /// Returns a raw attribute value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Returns the email attribute, if the provider sent one.
    pub fn email(&self) -> Option<String> {
        self.string_attribute(EMAIL_ATTRIBUTE)
    }

    /// Returns the display-name attribute, if the provider sent one.
    pub fn name(&self) -> Option<String> {
        self.string_attribute(NAME_ATTRIBUTE)
    }

    fn string_attribute(&self, key: &str) -> Option<String> {
        self.attributes
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// Policy for assertions that carry no email attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingEmailPolicy {
    /// Fail the attempt as [`AuthError::BadCredentials`]. Without an email
    /// there is nothing to match or provision a local user against.
    #[default]
    Reject,
    /// Authenticate with an empty authority set. Degraded compatibility
    /// behavior; opt in deliberately.
    EmptyAuthorities,
}

/// Resolves federated identities against the local credential store,
/// registering new users by email.
///
/// An assertion whose email matches an existing user reuses that user's
/// authorities. A novel email provisions exactly one new local user with
/// the configured default role.
pub struct RegisteringOAuth2UserService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    resolver: AuthorityResolver,
    default_role: String,
    missing_email: MissingEmailPolicy,
}

impl RegisteringOAuth2UserService {
    /// Creates a service provisioning new identities with the `USER` role.
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        resolver: AuthorityResolver,
    ) -> Self {
        RegisteringOAuth2UserService {
            users,
            roles,
            resolver,
            default_role: "USER".to_string(),
            missing_email: MissingEmailPolicy::default(),
        }
    }

    /// Overrides the role assigned to newly provisioned users.
    pub fn default_role(mut self, role: &str) -> Self {
        self.default_role = role.to_string();
        self
    }

    /// Overrides the missing-email policy.
    pub fn missing_email_policy(mut self, policy: MissingEmailPolicy) -> Self {
        self.missing_email = policy;
        self
    }

    /// Resolves an identity assertion into a principal.
    pub async fn authenticate(
        &self,
        assertion: &OAuth2UserAssertion,
    ) -> Result<Principal, AuthError> {
        let Some(email) = assertion.email() else {
            log::warn!("Federated identity is missing the email attribute");
            return match self.missing_email {
                MissingEmailPolicy::Reject => Err(AuthError::BadCredentials),
                MissingEmailPolicy::EmptyAuthorities => Ok(Principal::resumed(
                    &assertion.name().unwrap_or_default(),
                    HashSet::new(),
                )),
            };
        };

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => {
                log::trace!("Found user for email {}", email);
                user
            }
            None => {
                log::debug!("No user found for email {}, creating new user", email);
                self.provision(&email, assertion.name()).await?
            }
        };

        let authorities = self.resolver.resolve(user.id).await?;

        Ok(Principal::new(
            user.username,
            String::new(),
            user.enabled,
            user.expired,
            user.locked,
            user.credentials_expired,
            authorities,
        ))
    }

    async fn provision(
        &self,
        email: &str,
        name: Option<String>,
    ) -> Result<crate::domain::User, AuthError> {
        let username = match name {
            Some(name) => name.to_lowercase(),
            None => {
                log::warn!(
                    "Federated identity for {} is missing the name attribute, applying email as username",
                    email
                );
                email.to_lowercase()
            }
        };

        let user = self.users.save(NewUser::new(&username, email)).await?;

        let roles = self
            .roles
            .find_by_name_in(&[self.default_role.as_str()])
            .await?;
        let role_ids: Vec<_> = roles.iter().map(|r| r.id).collect();
        self.users.assign_roles(user.id, &role_ids).await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InMemoryStore;
    use serde_json::json;

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: RegisteringOAuth2UserService,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::shared();
        store.add_role("USER", &["READ_USER"]).await;
        store.add_role("ADMIN", &["CREATE_USER", "READ_USER"]).await;
        let service = RegisteringOAuth2UserService::new(
            store.clone(),
            store.clone(),
            AuthorityResolver::new(store.clone()),
        );
        Fixture { store, service }
    }

    fn assertion(email: Option<&str>, name: Option<&str>) -> OAuth2UserAssertion {
        let mut a = OAuth2UserAssertion::new();
        if let Some(email) = email {
            a = a.attribute("email", json!(email));
        }
        if let Some(name) = name {
            a = a.attribute("name", json!(name));
        }
        a
    }

    #[tokio::test]
    async fn existing_email_reuses_authorities_without_duplicating() {
        let fix = fixture().await;
        let user = fix
            .store
            .save(NewUser::new("jane", "jane@example.com"))
            .await
            .unwrap();
        fix.store.assign_role(user.id, "ADMIN").await.unwrap();

        let principal = fix
            .service
            .authenticate(&assertion(Some("jane@example.com"), Some("Jane Doe")))
            .await
            .unwrap();

        assert_eq!(principal.username(), "jane");
        assert!(principal.has_authority("CREATE_USER"));
        let users = UserRepository::find_all(fix.store.as_ref()).await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn novel_email_provisions_one_user_with_default_role() {
        let fix = fixture().await;

        let principal = fix
            .service
            .authenticate(&assertion(Some("new@example.com"), Some("Newcomer")))
            .await
            .unwrap();

        assert_eq!(principal.username(), "newcomer");
        assert!(principal.has_authority("READ_USER"));
        assert!(!principal.authorities().is_empty());

        let users = UserRepository::find_all(fix.store.as_ref()).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "new@example.com");
        assert_eq!(users[0].password, None);
    }

    #[tokio::test]
    async fn provisioning_falls_back_to_email_as_username() {
        let fix = fixture().await;

        let principal = fix
            .service
            .authenticate(&assertion(Some("Anon@Example.com"), None))
            .await
            .unwrap();

        assert_eq!(principal.username(), "anon@example.com");
    }

    #[tokio::test]
    async fn missing_email_is_rejected_by_default() {
        let fix = fixture().await;

        assert_eq!(
            fix.service.authenticate(&assertion(None, Some("Ghost"))).await,
            Err(AuthError::BadCredentials)
        );
        let users = UserRepository::find_all(fix.store.as_ref()).await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn missing_email_yields_empty_authorities_when_opted_in() {
        let store = InMemoryStore::shared();
        let service = RegisteringOAuth2UserService::new(
            store.clone(),
            store.clone(),
            AuthorityResolver::new(store.clone()),
        )
        .missing_email_policy(MissingEmailPolicy::EmptyAuthorities);

        let principal = service
            .authenticate(&assertion(None, Some("Ghost")))
            .await
            .unwrap();

        assert!(principal.authorities().is_empty());
        let users = UserRepository::find_all(store.as_ref()).await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn second_federated_login_does_not_provision_again() {
        let fix = fixture().await;
        let a = assertion(Some("new@example.com"), Some("Newcomer"));

        fix.service.authenticate(&a).await.unwrap();
        fix.service.authenticate(&a).await.unwrap();

        let users = UserRepository::find_all(fix.store.as_ref()).await.unwrap();
        assert_eq!(users.len(), 1);
    }
}
