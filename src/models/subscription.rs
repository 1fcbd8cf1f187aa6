use crate::entities::vip_subscriptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VipPlan {
    Monthly,
    HalfYearly,
    Yearly,
}

impl VipPlan {
    pub fn from_id(plan_id: &str) -> Option<Self> {
        match plan_id {
            "monthly" => Some(VipPlan::Monthly),
            "halfyearly" => Some(VipPlan::HalfYearly),
            "yearly" => Some(VipPlan::Yearly),
            _ => None,
        }
    }

    pub fn duration_days(&self) -> i64 {
        match self {
            VipPlan::Monthly => 30,
            VipPlan::HalfYearly => 182,
            VipPlan::Yearly => 365,
        }
    }
}

impl std::fmt::Display for VipPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VipPlan::Monthly => write!(f, "monthly"),
            VipPlan::HalfYearly => write!(f, "halfyearly"),
            VipPlan::Yearly => write!(f, "yearly"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    #[schema(example = "monthly")]
    pub plan_id: String,
    #[schema(example = "VIP Monthly")]
    pub plan_name: String,
    /// paise
    #[schema(example = 19900)]
    pub amount_paid: i64,
    pub original_price: Option<i64>,
    pub discount_applied: Option<i64>,
    pub coupon_code: Option<String>,
    #[schema(example = "upi")]
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VipSubscriptionResponse {
    pub id: i64,
    pub plan_id: String,
    pub plan_name: String,
    pub amount_paid: i64,
    pub original_price: Option<i64>,
    pub discount_applied: Option<i64>,
    pub coupon_code: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: String,
}

impl From<vip_subscriptions::Model> for VipSubscriptionResponse {
    fn from(sub: vip_subscriptions::Model) -> Self {
        Self {
            id: sub.id,
            plan_id: sub.plan_id,
            plan_name: sub.plan_name,
            amount_paid: sub.amount_paid,
            original_price: sub.original_price,
            discount_applied: sub.discount_applied,
            coupon_code: sub.coupon_code,
            starts_at: sub.starts_at,
            ends_at: sub.ends_at,
            is_active: sub.is_active,
            cancelled_at: sub.cancelled_at,
            cancellation_reason: sub.cancellation_reason,
            payment_method: sub.payment_method,
            payment_status: sub.payment_status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VipStatusResponse {
    pub is_vip: bool,
    pub vip_expires_at: Option<DateTime<Utc>>,
    pub subscription: Option<VipSubscriptionResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckExpiredResponse {
    pub expired_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_durations() {
        assert_eq!(VipPlan::from_id("monthly").unwrap().duration_days(), 30);
        assert_eq!(VipPlan::from_id("halfyearly").unwrap().duration_days(), 182);
        assert_eq!(VipPlan::from_id("yearly").unwrap().duration_days(), 365);
    }

    #[test]
    fn test_unknown_plan_rejected() {
        assert_eq!(VipPlan::from_id("weekly"), None);
        assert_eq!(VipPlan::from_id(""), None);
        assert_eq!(VipPlan::from_id("Monthly"), None);
    }
}
