use crate::error::AppError;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::SubscriptionService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

fn require_user(req: &HttpRequest) -> Result<crate::middlewares::AuthenticatedUser, AppError> {
    current_user(req).ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

#[utoipa::path(
    get,
    path = "/subscriptions/status",
    tag = "subscriptions",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Live VIP status", body = VipStatusResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_status(
    subscription_service: web::Data<SubscriptionService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let auth = match require_user(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };

    match subscription_service.status(&auth.id).await {
        Ok(status) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": status
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/subscriptions/purchase",
    tag = "subscriptions",
    request_body = PurchaseRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Subscription activated", body = VipSubscriptionResponse),
        (status = 400, description = "Unknown plan"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn purchase(
    subscription_service: web::Data<SubscriptionService>,
    req: HttpRequest,
    request: web::Json<PurchaseRequest>,
) -> Result<HttpResponse> {
    let auth = match require_user(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };

    match subscription_service
        .purchase(&auth.id, request.into_inner())
        .await
    {
        Ok(subscription) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "subscription": subscription }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/subscriptions/cancel",
    tag = "subscriptions",
    request_body = CancelRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Subscription cancelled"),
        (status = 400, description = "No active subscription"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn cancel(
    subscription_service: web::Data<SubscriptionService>,
    req: HttpRequest,
    request: web::Json<CancelRequest>,
) -> Result<HttpResponse> {
    let auth = match require_user(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };

    match subscription_service
        .cancel(&auth.id, request.into_inner().reason)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Subscription cancelled"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/subscriptions/check-expired",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Expired subscriptions downgraded", body = CheckExpiredResponse)
    )
)]
pub async fn check_expired(
    subscription_service: web::Data<SubscriptionService>,
) -> Result<HttpResponse> {
    match subscription_service.sweep_expired(Utc::now()).await {
        Ok(expired_count) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": CheckExpiredResponse { expired_count }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/subscriptions/history",
    tag = "subscriptions",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("page_size" = Option<i64>, Query, description = "Items per page")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Subscription history, newest first"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_history(
    subscription_service: web::Data<SubscriptionService>,
    req: HttpRequest,
    params: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let auth = match require_user(&req) {
        Ok(auth) => auth,
        Err(e) => return Ok(e.error_response()),
    };

    match subscription_service.history(&auth.id, &params).await {
        Ok(history) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": history
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn subscription_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/subscriptions")
            .route("/status", web::get().to(get_status))
            .route("/purchase", web::post().to(purchase))
            .route("/cancel", web::post().to(cancel))
            .route("/check-expired", web::post().to(check_expired))
            .route("/history", web::get().to(get_history)),
    );
}
