//! Gated user-management operations.
//!
//! Every operation declares its required authority in a
//! [`UserServicePolicy`] and checks it against the caller's context before
//! touching the store. The gate rejects the whole operation; there is no
//! partial or degraded execution.

use std::sync::Arc;

use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};

use crate::domain::model::{NewUser, User};
use crate::domain::repository::{RoleRepository, StoreError, UserRepository};
use crate::security::crypto::PasswordEncoder;
use crate::security::{AuthError, Requirement, SecurityContext};

/// Errors surfaced by the user-management operations.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum ServiceError {
    /// The caller failed the access check.
    #[display("{_0}")]
    Auth(AuthError),
    /// The credential store rejected the operation.
    #[display("{_0}")]
    Store(StoreError),
    /// The submitted form data is unusable.
    #[display("invalid user data: {_0}")]
    Validation(#[error(not(source))] String),
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Auth(e) => e.status_code(),
            ServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            ServiceError::Store(StoreError::AlreadyExists) => StatusCode::CONFLICT,
            ServiceError::Store(StoreError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // Preserves the redirect for unauthenticated callers.
            ServiceError::Auth(e) => e.error_response(),
            _ => HttpResponseBuilder::new(self.status_code()).body(self.to_string()),
        }
    }
}

/// Form data for creating or updating a user.
#[derive(Clone, Debug, Deserialize)]
pub struct UserForm {
    pub username: String,
    /// Plain-text password; encoded before it reaches the store. Absent for
    /// updates that keep the current password.
    pub password: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub locked: bool,
}

fn default_true() -> bool {
    true
}

/// Form data replacing a user's role assignment.
#[derive(Clone, Debug, Deserialize)]
pub struct UserRolesForm {
    pub username: String,
    pub roles: Vec<String>,
}

/// Outward representation of a user record, without the password hash.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct UserDto {
    pub username: String,
    pub email: String,
    pub enabled: bool,
    pub expired: bool,
    pub locked: bool,
    pub credentials_expired: bool,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            username: user.username,
            email: user.email,
            enabled: user.enabled,
            expired: user.expired,
            locked: user.locked,
            credentials_expired: user.credentials_expired,
        }
    }
}

/// Required authorities per operation.
#[derive(Clone, Debug)]
pub struct UserServicePolicy {
    pub create: Requirement,
    pub read: Requirement,
    pub update: Requirement,
}

impl Default for UserServicePolicy {
    fn default() -> Self {
        UserServicePolicy {
            create: Requirement::authority("CREATE_USER"),
            read: Requirement::authority("READ_USER"),
            update: Requirement::authority("UPDATE_USER"),
        }
    }
}

/// User-management operations over the credential store.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    encoder: Arc<dyn PasswordEncoder>,
    policy: UserServicePolicy,
}

impl UserService {
    /// Creates a service with the default policy.
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        encoder: Arc<dyn PasswordEncoder>,
    ) -> Self {
        UserService {
            users,
            roles,
            encoder,
            policy: UserServicePolicy::default(),
        }
    }

    /// Overrides the per-operation policy.
    pub fn with_policy(mut self, policy: UserServicePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates a user from form data. Requires the create authority.
    pub async fn create(
        &self,
        ctx: &SecurityContext,
        form: UserForm,
    ) -> Result<UserDto, ServiceError> {
        self.policy.create.check(ctx)?;

        if form.username.trim().is_empty() {
            return Err(ServiceError::Validation("username is empty".into()));
        }

        let password = form.password.as_deref().map(|p| self.encoder.encode(p));
        let record = NewUser {
            username: form.username.to_lowercase(),
            password,
            email: form.email,
            enabled: form.enabled,
            expired: form.expired,
            locked: form.locked,
            credentials_expired: false,
        };

        let user = self.users.save(record).await?;
        log::debug!("Created user {}", user.username);
        Ok(user.into())
    }

    /// Returns one user by username. Requires the read authority.
    pub async fn get_user(
        &self,
        ctx: &SecurityContext,
        username: &str,
    ) -> Result<UserDto, ServiceError> {
        self.policy.read.check(ctx)?;

        let user = self
            .users
            .find_by_username(&username.to_lowercase())
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(user.into())
    }

    /// Returns all users. Requires the read authority.
    pub async fn get_users(&self, ctx: &SecurityContext) -> Result<Vec<UserDto>, ServiceError> {
        self.policy.read.check(ctx)?;

        let users = self.users.find_all().await?;
        Ok(users.into_iter().map(UserDto::from).collect())
    }

    /// Returns all role names. Requires the read authority.
    pub async fn get_all_roles(&self, ctx: &SecurityContext) -> Result<Vec<String>, ServiceError> {
        self.policy.read.check(ctx)?;

        let roles = self.roles.find_all().await?;
        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    /// Updates a user's record from form data. Requires the update
    /// authority. A missing password keeps the stored hash.
    pub async fn update(&self, ctx: &SecurityContext, form: UserForm) -> Result<(), ServiceError> {
        self.policy.update.check(ctx)?;

        let mut user = self
            .users
            .find_by_username(&form.username.to_lowercase())
            .await?
            .ok_or(StoreError::NotFound)?;

        user.email = form.email;
        user.enabled = form.enabled;
        user.expired = form.expired;
        user.locked = form.locked;
        if let Some(password) = form.password.as_deref() {
            user.password = Some(self.encoder.encode(password));
        }

        self.users.update(&user).await?;
        Ok(())
    }

    /// Replaces a user's roles. Requires the update authority. Takes effect
    /// on the user's next authentication.
    pub async fn update_roles(
        &self,
        ctx: &SecurityContext,
        form: UserRolesForm,
    ) -> Result<(), ServiceError> {
        self.policy.update.check(ctx)?;

        let user = self
            .users
            .find_by_username(&form.username.to_lowercase())
            .await?
            .ok_or(StoreError::NotFound)?;

        let names: Vec<&str> = form.roles.iter().map(String::as_str).collect();
        let roles = self.roles.find_by_name_in(&names).await?;
        let role_ids: Vec<_> = roles.iter().map(|r| r.id).collect();

        self.users.assign_roles(user.id, &role_ids).await?;
        log::debug!("Replaced roles of {} with {:?}", user.username, form.roles);
        Ok(())
    }
}
