//! Common test utilities and configuration.
//!
//! This module provides shared test infrastructure including:
//! - A seeded in-memory store
//! - A fully wired test app builder
//! - Session and CSRF helpers

use std::sync::Arc;

use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::{Cookie, Key};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};

use actix_authority::domain::{
    AuthorityResolver, InMemoryStore, NewUser, UserRepository, UserService,
};
use actix_authority::security::{Argon2PasswordEncoder, DaoAuthenticator, PasswordEncoder};
use actix_authority::web::{routes, CsrfConfig, CsrfProtection, FormLoginConfig};

// =============================================================================
// Test Configuration
// =============================================================================

/// Seeds the store with roles and users.
///
/// Roles:
/// - ADMIN: CREATE_USER, READ_USER, UPDATE_USER
/// - VIEWER: READ_USER
/// - USER: READ_USER
///
/// Users:
/// - admin/admin: ADMIN
/// - reader/reader: VIEWER
/// - ghost/ghost: VIEWER, but disabled
pub async fn seed_store(encoder: &dyn PasswordEncoder) -> Arc<InMemoryStore> {
    let store = InMemoryStore::shared();

    store
        .add_role("ADMIN", &["CREATE_USER", "READ_USER", "UPDATE_USER"])
        .await;
    store.add_role("VIEWER", &["READ_USER"]).await;
    store.add_role("USER", &["READ_USER"]).await;

    let admin = store
        .save(NewUser::new("admin", "admin@example.com").password(&encoder.encode("admin")))
        .await
        .unwrap();
    store.assign_role(admin.id, "ADMIN").await.unwrap();

    let reader = store
        .save(NewUser::new("reader", "reader@example.com").password(&encoder.encode("reader")))
        .await
        .unwrap();
    store.assign_role(reader.id, "VIEWER").await.unwrap();

    let ghost = store
        .save(
            NewUser::new("ghost", "ghost@example.com")
                .password(&encoder.encode("ghost"))
                .enabled(false),
        )
        .await
        .unwrap();
    store.assign_role(ghost.id, "VIEWER").await.unwrap();

    store
}

// =============================================================================
// Test App Builder
// =============================================================================

/// Creates a fully configured test application over the given store.
pub async fn create_test_app(
    store: Arc<InMemoryStore>,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse,
    Error = actix_web::Error,
> {
    let encoder: Arc<dyn PasswordEncoder> = Arc::new(Argon2PasswordEncoder::new());
    let resolver = AuthorityResolver::new(store.clone());
    let authenticator = Arc::new(DaoAuthenticator::new(
        store.clone(),
        resolver,
        encoder.clone(),
    ));
    let service = Arc::new(UserService::new(store.clone(), store.clone(), encoder));

    test::init_service(
        App::new().service(
            web::scope("")
                .app_data(web::Data::new(authenticator))
                .app_data(web::Data::new(service))
                .app_data(web::Data::new(FormLoginConfig::new()))
                .configure(routes)
                // Session runs outermost so the CSRF layer can read it.
                .wrap(CsrfProtection::new(CsrfConfig::new()))
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                ),
        ),
    )
    .await
}

/// Convenience: seeds the default store and wires the app over it.
///
/// Run with `RUST_LOG=actix_authority=trace` to follow the resolution flow.
pub async fn seeded_app() -> (
    Arc<InMemoryStore>,
    impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
) {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = seed_store(&Argon2PasswordEncoder::new()).await;
    let app = create_test_app(store.clone()).await;
    (store, app)
}

// =============================================================================
// Session and CSRF Helpers
// =============================================================================

/// A browsing session: the cookie carrying state and the CSRF token that
/// state-changing requests must present.
pub struct BrowserSession {
    pub cookie: Cookie<'static>,
    pub csrf_token: String,
}

/// Fetches the login page to obtain a session cookie and its CSRF token.
pub async fn open_session<S>(app: &S) -> BrowserSession
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let req = test::TestRequest::get().uri("/login").to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .next()
        .expect("session cookie")
        .into_owned();

    let body: serde_json::Value = test::read_body_json(resp).await;
    let csrf_token = body["csrf_token"].as_str().expect("csrf token").to_string();

    BrowserSession { cookie, csrf_token }
}

/// Logs in through the form endpoint and returns the authenticated session.
///
/// Panics if the attempt does not redirect to the success target.
pub async fn login<S>(app: &S, username: &str, password: &str) -> BrowserSession
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let session = open_session(app).await;

    let req = test::TestRequest::post()
        .uri("/login")
        .cookie(session.cookie.clone())
        .insert_header(("X-CSRF-TOKEN", session.csrf_token.clone()))
        .set_form([("username", username), ("password", password)])
        .to_request();
    let resp = test::call_service(app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    // The session id rotates on login.
    let cookie = resp
        .response()
        .cookies()
        .next()
        .map(|c| c.into_owned())
        .unwrap_or(session.cookie);

    BrowserSession {
        cookie,
        csrf_token: session.csrf_token,
    }
}

/// Reads the `Location` header of a redirect response.
pub fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
