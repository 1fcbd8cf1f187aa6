use crate::entities::users;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How a token subject refers to a user. Public ids are preferred;
/// numeric internal ids survive in tokens minted before the public-id
/// rollout, so lookups try both in this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Public(String),
    Internal(i64),
}

impl Identifier {
    pub fn candidates(subject: &str) -> Vec<Identifier> {
        let mut out = vec![Identifier::Public(subject.to_string())];
        if let Ok(n) = subject.parse::<i64>() {
            out.push(Identifier::Internal(n));
        }
        out
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Asha Patel")]
    pub name: String,
    #[schema(example = "+911234567890")]
    pub phone: String,
    #[schema(example = "asha@example.com")]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestOtpRequest {
    #[schema(example = "+911234567890")]
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    #[schema(example = "+911234567890")]
    pub phone: String,
    #[schema(example = "4821")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendCodeResponse {
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// Public id when assigned, internal id as a fallback for legacy rows
    pub id: String,
    pub public_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub is_vip: bool,
    pub vip_expires_at: Option<DateTime<Utc>>,
    pub current_subscription_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
    pub expires_in: i64,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        let id = user
            .public_id
            .clone()
            .unwrap_or_else(|| user.id.to_string());
        Self {
            id,
            public_id: user.public_id,
            name: user.name,
            phone: user.phone,
            email: user.email,
            is_vip: user.is_vip,
            vip_expires_at: user.vip_expires_at,
            current_subscription_id: user.current_subscription_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_public_only() {
        let c = Identifier::candidates("AB12CD");
        assert_eq!(c, vec![Identifier::Public("AB12CD".to_string())]);
    }

    #[test]
    fn test_candidates_numeric_tries_public_first() {
        let c = Identifier::candidates("42");
        assert_eq!(
            c,
            vec![
                Identifier::Public("42".to_string()),
                Identifier::Internal(42)
            ]
        );
    }

    #[test]
    fn test_user_response_prefers_public_id() {
        let user = users::Model {
            id: 7,
            public_id: Some("XK93PQ".to_string()),
            name: "Asha".to_string(),
            phone: "+911234567890".to_string(),
            email: None,
            is_vip: false,
            vip_expires_at: None,
            current_subscription_id: None,
            created_at: None,
            updated_at: None,
        };
        let resp = UserResponse::from(user);
        assert_eq!(resp.id, "XK93PQ");

        let legacy = users::Model {
            id: 7,
            public_id: None,
            name: "Asha".to_string(),
            phone: "+911234567890".to_string(),
            email: None,
            is_vip: false,
            vip_expires_at: None,
            current_subscription_id: None,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(UserResponse::from(legacy).id, "7");
    }
}
