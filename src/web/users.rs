//! User-management endpoints.
//!
//! Handlers take the caller's [`SecurityContext`] explicitly; the access
//! decision itself happens inside [`UserService`], which answers denials
//! through [`ServiceError`]'s `ResponseError` mapping.

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::domain::{ServiceError, UserForm, UserRolesForm, UserService};
use crate::security::SecurityContext;

/// `POST /users` - creates a user. Requires `CREATE_USER`.
pub async fn create_user(
    ctx: SecurityContext,
    form: web::Form<UserForm>,
    service: web::Data<Arc<UserService>>,
) -> Result<HttpResponse, ServiceError> {
    let dto = service.create(&ctx, form.into_inner()).await?;
    Ok(HttpResponse::Created().json(dto))
}

/// `GET /users` - lists all users. Requires `READ_USER`.
pub async fn list_users(
    ctx: SecurityContext,
    service: web::Data<Arc<UserService>>,
) -> Result<HttpResponse, ServiceError> {
    let users = service.get_users(&ctx).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// `GET /users/{username}` - returns one user. Requires `READ_USER`.
pub async fn get_user(
    ctx: SecurityContext,
    username: web::Path<String>,
    service: web::Data<Arc<UserService>>,
) -> Result<HttpResponse, ServiceError> {
    let user = service.get_user(&ctx, &username).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// `GET /roles` - lists all role names. Requires `READ_USER`.
pub async fn list_roles(
    ctx: SecurityContext,
    service: web::Data<Arc<UserService>>,
) -> Result<HttpResponse, ServiceError> {
    let roles = service.get_all_roles(&ctx).await?;
    Ok(HttpResponse::Ok().json(roles))
}

/// `PUT /users` - updates a user's record. Requires `UPDATE_USER`.
pub async fn update_user(
    ctx: SecurityContext,
    form: web::Form<UserForm>,
    service: web::Data<Arc<UserService>>,
) -> Result<HttpResponse, ServiceError> {
    service.update(&ctx, form.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `POST /users/roles` - replaces a user's roles. Requires `UPDATE_USER`.
///
/// Takes JSON rather than form data so the role list round-trips as a
/// proper array.
pub async fn update_roles(
    ctx: SecurityContext,
    form: web::Json<UserRolesForm>,
    service: web::Data<Arc<UserService>>,
) -> Result<HttpResponse, ServiceError> {
    service.update_roles(&ctx, form.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
