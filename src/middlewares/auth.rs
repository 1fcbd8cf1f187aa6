use crate::error::AppError;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Identity attached to the request once the bearer token checks out.
/// The VIP flag is a snapshot from token-mint time; anything that gates
/// on VIP re-reads the user row.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub phone: String,
    pub name: String,
    pub is_vip: bool,
}

pub fn current_user(req: &HttpRequest) -> Option<AuthenticatedUser> {
    req.extensions().get::<AuthenticatedUser>().cloned()
}

struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    excluded_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec!["/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            prefix_paths: vec![
                "/swagger-ui/",
                "/api-docs/",
                "/api/v1/auth/",
                // cron trigger for the expiry sweep
                "/api/v1/subscriptions/check-expired",
            ],
            // authenticated even though they sit under a public prefix
            excluded_paths: vec!["/api/v1/auth/me"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self
            .excluded_paths
            .iter()
            .any(|&excluded| path.starts_with(excluded))
        {
            return false;
        }

        if self.exact_paths.contains(&path) {
            return true;
        }

        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflights pass through
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let path = req.path();

        if self.public_paths.is_public_path(path) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let auth_header = req.headers().get("Authorization");

        let token = if let Some(auth_value) = auth_header {
            if let Ok(auth_str) = auth_value.to_str() {
                auth_str.strip_prefix("Bearer ")
            } else {
                None
            }
        } else {
            None
        };

        if let Some(token) = token {
            match self.jwt_service.verify_token(token) {
                Ok(claims) => {
                    req.extensions_mut().insert(AuthenticatedUser {
                        id: claims.id,
                        phone: claims.phone,
                        name: claims.name,
                        is_vip: claims.is_vip,
                    });
                    let fut = self.service.call(req);
                    Box::pin(fut)
                }
                Err(err) => Box::pin(async move { Err(err.into()) }),
            }
        } else {
            let error = AppError::AuthError("Missing access token".to_string());
            Box::pin(async move { Err(error.into()) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_routes_are_public() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path("/api/v1/auth/register"));
        assert!(paths.is_public_path("/api/v1/auth/otp/request"));
        assert!(paths.is_public_path("/api/v1/auth/otp/verify"));
        assert!(paths.is_public_path("/api/v1/subscriptions/check-expired"));
        assert!(paths.is_public_path("/swagger-ui/"));
    }

    #[test]
    fn test_me_requires_auth_despite_public_prefix() {
        let paths = PublicPaths::new();
        assert!(!paths.is_public_path("/api/v1/auth/me"));
    }

    #[test]
    fn test_protected_routes_are_not_public() {
        let paths = PublicPaths::new();
        assert!(!paths.is_public_path("/api/v1/subscriptions/status"));
        assert!(!paths.is_public_path("/api/v1/subscriptions/purchase"));
        assert!(!paths.is_public_path("/api/v1/subscriptions/history"));
    }
}
