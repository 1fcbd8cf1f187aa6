use crate::entities::users;
use crate::error::AppResult;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// public id when assigned, internal id as a string otherwise
    pub id: String,
    pub phone: String,
    pub name: String,
    pub is_vip: bool,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expires_in: expires_in,
        }
    }

    pub fn generate_token(&self, user: &users::Model) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.token_expires_in);

        let claims = Claims {
            id: user
                .public_id
                .clone()
                .unwrap_or_else(|| user.id.to_string()),
            phone: user.phone.clone(),
            name: user.name.clone(),
            is_vip: user.is_vip,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    pub fn get_token_expires_in(&self) -> i64 {
        self.token_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn test_user() -> users::Model {
        users::Model {
            id: 1,
            public_id: Some("AB12CD".to_string()),
            name: "Asha".to_string(),
            phone: "+911234567890".to_string(),
            email: None,
            is_vip: true,
            vip_expires_at: None,
            current_subscription_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let svc = JwtService::new("test-secret", 2_592_000);
        let token = svc.generate_token(&test_user()).unwrap();
        let claims = svc.verify_token(&token).unwrap();
        assert_eq!(claims.id, "AB12CD");
        assert_eq!(claims.phone, "+911234567890");
        assert_eq!(claims.name, "Asha");
        assert!(claims.is_vip);
        assert_eq!(claims.exp - claims.iat, 2_592_000);
    }

    #[test]
    fn test_token_subject_falls_back_to_internal_id() {
        let svc = JwtService::new("test-secret", 60);
        let mut user = test_user();
        user.public_id = None;
        let token = svc.generate_token(&user).unwrap();
        assert_eq!(svc.verify_token(&token).unwrap().id, "1");
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = JwtService::new("test-secret", -3600);
        let token = svc.generate_token(&test_user()).unwrap();
        let err = svc.verify_token(&token).unwrap_err();
        match err {
            AppError::JwtError(e) => assert!(matches!(
                e.kind(),
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
            )),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let svc = JwtService::new("test-secret", 60);
        let token = svc.generate_token(&test_user()).unwrap();
        let other = JwtService::new("other-secret", 60);
        assert!(other.verify_token(&token).is_err());
    }
}
