use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::request_otp,
        handlers::auth::request_registration_otp,
        handlers::auth::verify_otp,
        handlers::auth::me,
        handlers::subscription::get_status,
        handlers::subscription::purchase,
        handlers::subscription::cancel,
        handlers::subscription::check_expired,
        handlers::subscription::get_history,
    ),
    components(
        schemas(
            RegisterRequest,
            RequestOtpRequest,
            VerifyOtpRequest,
            SendCodeResponse,
            UserResponse,
            AuthResponse,
            VipPlan,
            PurchaseRequest,
            CancelRequest,
            VipSubscriptionResponse,
            VipStatusResponse,
            CheckExpiredResponse,
            PaginationParams,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and OTP login API"),
        (name = "subscriptions", description = "VIP subscription API"),
    ),
    info(
        title = "Bachat Backend API",
        version = "1.0.0",
        description = "Bachat discount app REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
