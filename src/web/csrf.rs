//! CSRF protection for state-changing requests.
//!
//! A random token is generated per session and must accompany every
//! state-changing request, either in the `X-CSRF-TOKEN` header or in the
//! `_csrf` query parameter. Requests without a matching token are answered
//! with 403 before they reach a handler.
//!
//! # Example
//! ```ignore
//! App::new()
//!     .wrap(CsrfProtection::new(CsrfConfig::new()))
//!     .wrap(session_middleware)
//! ```

use std::rc::Rc;

use actix_session::SessionExt;
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Method;
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use rand::Rng;
use regex::Regex;

/// The per-session CSRF token, exposed to handlers through request
/// extensions so login pages and forms can render it.
#[derive(Clone, Debug)]
pub struct CsrfToken {
    token: String,
}

impl CsrfToken {
    /// Wraps a token value.
    pub fn new(token: String) -> Self {
        CsrfToken { token }
    }

    /// Returns the token value.
    pub fn value(&self) -> &str {
        &self.token
    }
}

/// CSRF protection configuration.
#[derive(Clone)]
pub struct CsrfConfig {
    /// Methods that require a valid token.
    protected_methods: Vec<Method>,
    /// Path patterns exempt from validation.
    ignored_paths: Vec<Regex>,
    /// Header carrying the token.
    header_name: String,
    /// Query parameter carrying the token.
    parameter_name: String,
    /// Session key storing the expected token.
    session_key: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrfConfig {
    /// Default configuration: POST, PUT, DELETE and PATCH are protected,
    /// the header is `X-CSRF-TOKEN` and the parameter is `_csrf`.
    pub fn new() -> Self {
        CsrfConfig {
            protected_methods: vec![Method::POST, Method::PUT, Method::DELETE, Method::PATCH],
            ignored_paths: Vec::new(),
            header_name: "X-CSRF-TOKEN".to_string(),
            parameter_name: "_csrf".to_string(),
            session_key: "authority.csrf".to_string(),
        }
    }

    /// Replaces the set of protected methods.
    pub fn protected_methods(mut self, methods: Vec<Method>) -> Self {
        self.protected_methods = methods;
        self
    }

    /// Exempts paths matching the pattern from validation.
    pub fn ignore_path(mut self, pattern: &str) -> Self {
        if let Ok(regex) = Regex::new(pattern) {
            self.ignored_paths.push(regex);
        }
        self
    }

    /// Sets the header name.
    pub fn header_name(mut self, name: &str) -> Self {
        self.header_name = name.to_string();
        self
    }

    /// Sets the query parameter name.
    pub fn parameter_name(mut self, name: &str) -> Self {
        self.parameter_name = name.to_string();
        self
    }

    fn is_path_ignored(&self, path: &str) -> bool {
        self.ignored_paths.iter().any(|regex| regex.is_match(path))
    }

    fn requires_protection(&self, method: &Method) -> bool {
        self.protected_methods.contains(method)
    }

    fn generate_token(&self) -> String {
        let bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(bytes)
    }
}

/// CSRF protection middleware.
#[derive(Clone)]
pub struct CsrfProtection {
    config: CsrfConfig,
}

impl CsrfProtection {
    /// Creates the middleware with the given configuration.
    pub fn new(config: CsrfConfig) -> Self {
        CsrfProtection { config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CsrfProtection
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CsrfMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CsrfMiddleware {
            service: Rc::new(service),
            config: self.config.clone(),
        })
    }
}

/// Service produced by [`CsrfProtection`].
pub struct CsrfMiddleware<S> {
    service: Rc<S>,
    config: CsrfConfig,
}

impl<S, B> Service<ServiceRequest> for CsrfMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            if config.is_path_ignored(req.path()) {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let session = req.get_session();
            let expected = match session.get::<String>(&config.session_key) {
                Ok(Some(token)) => token,
                _ => {
                    let token = config.generate_token();
                    let _ = session.insert(&config.session_key, &token);
                    token
                }
            };

            // Handlers render the token into forms and login pages.
            req.extensions_mut().insert(CsrfToken::new(expected.clone()));

            if config.requires_protection(req.method()) {
                match submitted_token(&req, &config) {
                    Some(submitted) if submitted == expected => {}
                    Some(_) => {
                        log::debug!("CSRF token mismatch for {}", req.path());
                        let response = HttpResponse::Forbidden()
                            .body("CSRF token mismatch")
                            .map_into_right_body();
                        return Ok(req.into_response(response));
                    }
                    None => {
                        log::debug!("CSRF token missing for {}", req.path());
                        let response = HttpResponse::Forbidden()
                            .body("CSRF token missing")
                            .map_into_right_body();
                        return Ok(req.into_response(response));
                    }
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Reads the submitted token from the header or the query string.
fn submitted_token(req: &ServiceRequest, config: &CsrfConfig) -> Option<String> {
    if let Some(header) = req.headers().get(&config.header_name) {
        if let Ok(value) = header.to_str() {
            return Some(value.to_string());
        }
    }

    req.query_string().split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == config.parameter_name {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_protects_state_changing_methods() {
        let config = CsrfConfig::new();

        assert!(config.requires_protection(&Method::POST));
        assert!(config.requires_protection(&Method::PUT));
        assert!(config.requires_protection(&Method::DELETE));
        assert!(config.requires_protection(&Method::PATCH));
        assert!(!config.requires_protection(&Method::GET));
        assert!(!config.requires_protection(&Method::HEAD));
    }

    #[test]
    fn ignored_paths_match_by_regex() {
        let config = CsrfConfig::new().ignore_path("^/api/.*").ignore_path("^/webhook$");

        assert!(config.is_path_ignored("/api/v1/things"));
        assert!(config.is_path_ignored("/webhook"));
        assert!(!config.is_path_ignored("/users"));
    }

    #[test]
    fn generated_tokens_are_random_hex() {
        let config = CsrfConfig::new();
        let a = config.generate_token();
        let b = config.generate_token();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
