use crate::entities::{users, vip_subscriptions};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::auth_service::resolve_user;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct SubscriptionService {
    pool: Arc<DatabaseConnection>,
}

impl SubscriptionService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { pool: pool.into() }
    }

    /// Live VIP status. Always read from the user row, never trusted
    /// from a token: a 30-day token outlives most subscriptions.
    pub async fn status(&self, subject: &str) -> AppResult<VipStatusResponse> {
        let user = resolve_user(&self.pool, subject).await?;

        let subscription = match user.current_subscription_id {
            Some(id) => vip_subscriptions::Entity::find_by_id(id)
                .one(self.pool.as_ref())
                .await?
                .map(VipSubscriptionResponse::from),
            None => None,
        };

        Ok(VipStatusResponse {
            is_vip: user.is_vip,
            vip_expires_at: user.vip_expires_at,
            subscription,
        })
    }

    /// Create the subscription row and flip the user's VIP fields in one
    /// transaction: either both land or neither does.
    pub async fn purchase(
        &self,
        subject: &str,
        request: PurchaseRequest,
    ) -> AppResult<VipSubscriptionResponse> {
        let plan = VipPlan::from_id(&request.plan_id)
            .ok_or_else(|| AppError::InvalidPlan(request.plan_id.clone()))?;
        let user = resolve_user(&self.pool, subject).await?;

        let now = Utc::now();
        let ends_at = now + Duration::days(plan.duration_days());

        let txn = self.pool.begin().await?;

        let subscription = vip_subscriptions::ActiveModel {
            user_id: Set(user.id),
            plan_id: Set(request.plan_id),
            plan_name: Set(request.plan_name),
            amount_paid: Set(request.amount_paid),
            original_price: Set(request.original_price),
            discount_applied: Set(request.discount_applied),
            coupon_code: Set(request.coupon_code),
            starts_at: Set(now),
            ends_at: Set(ends_at),
            is_active: Set(true),
            payment_method: Set(request.payment_method),
            payment_status: Set("completed".to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let user_id = user.id;
        let mut active = user.into_active_model();
        active.is_vip = Set(true);
        active.vip_expires_at = Set(Some(ends_at));
        active.current_subscription_id = Set(Some(subscription.id));
        active.updated_at = Set(Some(now));
        active.update(&txn).await?;

        txn.commit().await?;

        log::info!("User {user_id} purchased {plan} plan, VIP until {ends_at}");
        Ok(VipSubscriptionResponse::from(subscription))
    }

    /// Explicit cancellation by the user.
    pub async fn cancel(&self, subject: &str, reason: Option<String>) -> AppResult<()> {
        let user = resolve_user(&self.pool, subject).await?;
        let Some(subscription_id) = user.current_subscription_id else {
            return Err(AppError::NoActiveSubscription);
        };

        let reason = reason.unwrap_or_else(|| "Cancelled by user".to_string());
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        downgrade(&txn, user.id, Some(subscription_id), &reason, now).await?;
        txn.commit().await?;

        log::info!("User {} cancelled subscription {subscription_id}", user.id);
        Ok(())
    }

    /// Downgrade every user whose VIP window has passed. Safe to run
    /// repeatedly: downgraded users no longer match the query.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let expired = users::Entity::find()
            .filter(users::Column::IsVip.eq(true))
            .filter(users::Column::VipExpiresAt.lt(now))
            .all(self.pool.as_ref())
            .await?;

        let mut downgraded = 0u64;
        for user in expired {
            let txn = self.pool.begin().await?;
            downgrade(
                &txn,
                user.id,
                user.current_subscription_id,
                "Subscription expired",
                now,
            )
            .await?;
            txn.commit().await?;
            downgraded += 1;
        }

        Ok(downgraded)
    }

    pub async fn history(
        &self,
        subject: &str,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<VipSubscriptionResponse>> {
        let user = resolve_user(&self.pool, subject).await?;

        let total = vip_subscriptions::Entity::find()
            .filter(vip_subscriptions::Column::UserId.eq(user.id))
            .count(self.pool.as_ref())
            .await? as i64;

        let models = vip_subscriptions::Entity::find()
            .filter(vip_subscriptions::Column::UserId.eq(user.id))
            .order_by_desc(vip_subscriptions::Column::CreatedAt)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(self.pool.as_ref())
            .await?;
        let items: Vec<VipSubscriptionResponse> = models
            .into_iter()
            .map(VipSubscriptionResponse::from)
            .collect();

        Ok(PaginatedResponse::new(
            items,
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(20),
            total,
        ))
    }
}

/// Shared downgrade: deactivate the current subscription row (when one is
/// tracked) and clear the user's VIP fields. Used by both explicit
/// cancellation and the expiry sweep.
async fn downgrade<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    subscription_id: Option<i64>,
    reason: &str,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if let Some(subscription_id) = subscription_id {
        vip_subscriptions::Entity::update_many()
            .col_expr(vip_subscriptions::Column::IsActive, Expr::value(false))
            .col_expr(vip_subscriptions::Column::CancelledAt, Expr::value(Some(now)))
            .col_expr(
                vip_subscriptions::Column::CancellationReason,
                Expr::value(Some(reason.to_string())),
            )
            .col_expr(vip_subscriptions::Column::UpdatedAt, Expr::value(Some(now)))
            .filter(vip_subscriptions::Column::Id.eq(subscription_id))
            .filter(vip_subscriptions::Column::IsActive.eq(true))
            .exec(conn)
            .await?;
    }

    users::Entity::update_many()
        .col_expr(users::Column::IsVip, Expr::value(false))
        .col_expr(
            users::Column::VipExpiresAt,
            Expr::value(Option::<DateTime<Utc>>::None),
        )
        .col_expr(
            users::Column::CurrentSubscriptionId,
            Expr::value(Option::<i64>::None),
        )
        .col_expr(users::Column::UpdatedAt, Expr::value(Some(now)))
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn vip_user(id: i64, expires_in_secs: i64, subscription_id: Option<i64>) -> users::Model {
        users::Model {
            id,
            public_id: Some(format!("USER{id:03}")),
            name: "Asha".to_string(),
            phone: format!("+9198765432{id:02}"),
            email: None,
            is_vip: true,
            vip_expires_at: Some(Utc::now() + Duration::seconds(expires_in_secs)),
            current_subscription_id: subscription_id,
            created_at: None,
            updated_at: None,
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    #[tokio::test]
    async fn test_purchase_rejects_unknown_plan() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = SubscriptionService::new(db)
            .purchase(
                "AB12CD",
                PurchaseRequest {
                    plan_id: "weekly".to_string(),
                    plan_name: "VIP Weekly".to_string(),
                    amount_paid: 4900,
                    original_price: None,
                    discount_applied: None,
                    coupon_code: None,
                    payment_method: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPlan(_)));
    }

    #[tokio::test]
    async fn test_cancel_without_subscription() {
        let mut user = vip_user(1, 3600, None);
        user.is_vip = false;
        user.vip_expires_at = None;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .into_connection();
        let err = SubscriptionService::new(db)
            .cancel("USER001", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoActiveSubscription));
    }

    #[tokio::test]
    async fn test_cancel_downgrades_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![vip_user(1, 3600, Some(9))]])
            .append_exec_results([exec_ok(), exec_ok()])
            .into_connection();
        SubscriptionService::new(db)
            .cancel("USER001", Some("Too expensive".to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_downgrades_expired_users() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![vip_user(1, -60, Some(9)), vip_user(2, -120, None)]])
            .append_exec_results([exec_ok(), exec_ok(), exec_ok()])
            .into_connection();
        let count = SubscriptionService::new(db)
            .sweep_expired(Utc::now())
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_sweep_with_nothing_expired() {
        // Idempotence: a repeat run matches no users and touches nothing
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let count = SubscriptionService::new(db)
            .sweep_expired(Utc::now())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
