//! User, role and privilege records, store access and the gated
//! user-management service.

pub mod authority;
pub mod model;
pub mod repository;
pub mod service;

pub use authority::AuthorityResolver;
pub use model::{NewUser, Privilege, PrivilegeId, Role, RoleId, User, UserId};
pub use repository::{InMemoryStore, RoleRepository, StoreError, UserRepository};
pub use service::{ServiceError, UserDto, UserForm, UserRolesForm, UserService, UserServicePolicy};
