//! End-to-end resolution flow without the HTTP layer: local and federated
//! authentication into a principal, then access decisions against it.

use std::sync::Arc;

use serde_json::json;

use actix_authority::domain::{AuthorityResolver, InMemoryStore, NewUser, UserRepository};
use actix_authority::security::{
    AuthError, DaoAuthenticator, NoOpPasswordEncoder, OAuth2UserAssertion,
    RegisteringOAuth2UserService, Requirement, SecurityContext,
};

async fn store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::shared();
    store
        .add_role("ADMIN", &["CREATE_USER", "READ_USER", "UPDATE_USER"])
        .await;
    store.add_role("USER", &["READ_USER"]).await;

    let admin = store
        .save(NewUser::new("admin", "admin@example.com").password("admin"))
        .await
        .unwrap();
    store.assign_role(admin.id, "ADMIN").await.unwrap();

    store
}

fn authenticator(store: &Arc<InMemoryStore>) -> DaoAuthenticator {
    DaoAuthenticator::new(
        store.clone(),
        AuthorityResolver::new(store.clone()),
        Arc::new(NoOpPasswordEncoder::new()),
    )
}

#[tokio::test]
async fn local_credential_resolves_into_decidable_principal() {
    let store = store().await;

    let principal = authenticator(&store)
        .authenticate("admin", "admin")
        .await
        .unwrap();
    let ctx = SecurityContext::of(principal);

    assert!(Requirement::authority("CREATE_USER").check(&ctx).is_ok());
    assert!(Requirement::all_of(&["READ_USER", "UPDATE_USER"])
        .check(&ctx)
        .is_ok());
    assert_eq!(
        Requirement::authority("DELETE_USER").check(&ctx),
        Err(AuthError::Forbidden)
    );
}

#[tokio::test]
async fn anonymous_context_is_unauthenticated_not_forbidden() {
    let ctx = SecurityContext::anonymous();

    assert_eq!(
        Requirement::authority("READ_USER").check(&ctx),
        Err(AuthError::Unauthenticated)
    );
}

#[tokio::test]
async fn federated_identity_joins_the_same_authority_model() {
    let store = store().await;
    let oauth = RegisteringOAuth2UserService::new(
        store.clone(),
        store.clone(),
        AuthorityResolver::new(store.clone()),
    );

    let assertion = OAuth2UserAssertion::new()
        .attribute("email", json!("visitor@example.com"))
        .attribute("name", json!("Visitor"));

    let principal = oauth.authenticate(&assertion).await.unwrap();
    let ctx = SecurityContext::of(principal);

    // Provisioned with the default USER role.
    assert!(Requirement::authority("READ_USER").check(&ctx).is_ok());
    assert_eq!(
        Requirement::authority("CREATE_USER").check(&ctx),
        Err(AuthError::Forbidden)
    );

    // The provisioned record has no local credential to log in with.
    let result = authenticator(&store).authenticate("visitor", "").await;
    assert_eq!(result, Err(AuthError::BadCredentials));
}

#[tokio::test]
async fn role_changes_are_visible_on_the_next_authentication() {
    let store = store().await;
    let authenticator = authenticator(&store);

    let user = store
        .save(NewUser::new("worker", "worker@example.com").password("pw"))
        .await
        .unwrap();
    store.assign_role(user.id, "USER").await.unwrap();

    let first = authenticator.authenticate("worker", "pw").await.unwrap();
    assert!(!first.has_authority("CREATE_USER"));

    store.assign_role(user.id, "ADMIN").await.unwrap();

    let second = authenticator.authenticate("worker", "pw").await.unwrap();
    assert!(second.has_authority("CREATE_USER"));
    // The earlier principal keeps its snapshot.
    assert!(!first.has_authority("CREATE_USER"));
}
