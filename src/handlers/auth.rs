use crate::error::AppError;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::AuthService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, phone still unverified", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Phone or email already registered")
    )
)]
pub async fn register(
    auth_service: web::Data<AuthService>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    match auth_service.register(request.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "user": user },
            "message": "Registration successful, verify your phone to log in"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/otp/request",
    tag = "auth",
    request_body = RequestOtpRequest,
    responses(
        (status = 200, description = "Verification code sent", body = SendCodeResponse),
        (status = 404, description = "No account for this phone")
    )
)]
pub async fn request_otp(
    auth_service: web::Data<AuthService>,
    request: web::Json<RequestOtpRequest>,
) -> Result<HttpResponse> {
    match auth_service.request_login_otp(&request.phone).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response,
            "message": "Verification code sent"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/otp/request-registration",
    tag = "auth",
    request_body = RequestOtpRequest,
    responses(
        (status = 200, description = "Verification code sent", body = SendCodeResponse),
        (status = 409, description = "Account already exists for this phone")
    )
)]
pub async fn request_registration_otp(
    auth_service: web::Data<AuthService>,
    request: web::Json<RequestOtpRequest>,
) -> Result<HttpResponse> {
    match auth_service.request_registration_otp(&request.phone).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response,
            "message": "Verification code sent"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/otp/verify",
    tag = "auth",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted, session token issued", body = AuthResponse),
        (status = 401, description = "Code missing, used, expired or wrong"),
        (status = 404, description = "No account for this phone")
    )
)]
pub async fn verify_otp(
    auth_service: web::Data<AuthService>,
    request: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse> {
    match auth_service.verify_otp(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Token subject no longer resolves")
    )
)]
pub async fn me(auth_service: web::Data<AuthService>, req: HttpRequest) -> Result<HttpResponse> {
    let Some(auth) = current_user(&req) else {
        return Ok(AppError::AuthError("Missing access token".to_string()).error_response());
    };

    match auth_service.me(&auth.id).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "user": user }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/otp/request", web::post().to(request_otp))
            .route(
                "/otp/request-registration",
                web::post().to(request_registration_otp),
            )
            .route("/otp/verify", web::post().to(verify_otp))
            .route("/me", web::get().to(me)),
    );
}
