use crate::entities::users;
use crate::error::{AppError, AppResult};
use crate::external::SmsService;
use crate::models::*;
use crate::services::otp_service::{OTP_TTL_SECONDS, OtpService};
use crate::utils::{JwtService, generate_unique_public_id, validate_in_phone};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthService {
    pool: Arc<DatabaseConnection>,
    jwt_service: JwtService,
    sms_service: SmsService,
    otp_service: OtpService,
}

impl AuthService {
    pub fn new(
        pool: impl Into<Arc<DatabaseConnection>>,
        jwt_service: JwtService,
        sms_service: SmsService,
    ) -> Self {
        let pool = pool.into();
        let otp_service = OtpService::new(Arc::clone(&pool));
        Self {
            pool,
            jwt_service,
            sms_service,
            otp_service,
        }
    }

    /// Create an unverified account. No token is issued; the caller must
    /// verify the phone before first login.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<UserResponse> {
        validate_in_phone(&request.phone)?;
        if request.name.trim().is_empty() {
            return Err(AppError::ValidationError("Name is required".to_string()));
        }

        if let Some(email) = &request.email {
            let existing = users::Entity::find()
                .filter(users::Column::Email.eq(email.as_str()))
                .one(self.pool.as_ref())
                .await?;
            if existing.is_some() {
                return Err(AppError::DuplicateEmail);
            }
        }

        let existing = users::Entity::find()
            .filter(users::Column::Phone.eq(request.phone.as_str()))
            .one(self.pool.as_ref())
            .await?;
        if existing.is_some() {
            return Err(AppError::DuplicatePhone);
        }

        let public_id = generate_unique_public_id(|candidate| {
            let pool = self.pool.clone();
            async move {
                Ok(users::Entity::find()
                    .filter(users::Column::PublicId.eq(candidate))
                    .one(pool.as_ref())
                    .await?
                    .is_some())
            }
        })
        .await?;

        let user = users::ActiveModel {
            public_id: Set(Some(public_id)),
            name: Set(request.name.trim().to_string()),
            phone: Set(request.phone),
            email: Set(request.email),
            is_vip: Set(false),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        log::info!(
            "Registered user {} ({})",
            user.public_id.as_deref().unwrap_or("-"),
            user.phone
        );
        Ok(UserResponse::from(user))
    }

    /// Issue a login code for an existing account.
    pub async fn request_login_otp(&self, phone: &str) -> AppResult<SendCodeResponse> {
        validate_in_phone(phone)?;

        let user = users::Entity::find()
            .filter(users::Column::Phone.eq(phone))
            .one(self.pool.as_ref())
            .await?;
        if user.is_none() {
            return Err(AppError::NotFound(
                "No account found for this phone".to_string(),
            ));
        }

        self.issue_and_send(phone).await
    }

    /// Issue a code for a phone that must NOT have an account yet.
    pub async fn request_registration_otp(&self, phone: &str) -> AppResult<SendCodeResponse> {
        validate_in_phone(phone)?;

        let user = users::Entity::find()
            .filter(users::Column::Phone.eq(phone))
            .one(self.pool.as_ref())
            .await?;
        if user.is_some() {
            return Err(AppError::DuplicatePhone);
        }

        self.issue_and_send(phone).await
    }

    async fn issue_and_send(&self, phone: &str) -> AppResult<SendCodeResponse> {
        let issued = self.otp_service.issue(phone).await?;

        // Delivery is best-effort; the code stays consumable either way
        if let Err(e) = self
            .sms_service
            .send_verification_code(phone, &issued.code)
            .await
        {
            log::warn!("OTP SMS delivery failed for {phone}: {e:?}");
        }

        Ok(SendCodeResponse {
            expires_in: OTP_TTL_SECONDS,
        })
    }

    /// Consume the newest code for the phone and mint a session token.
    pub async fn verify_otp(&self, request: VerifyOtpRequest) -> AppResult<AuthResponse> {
        validate_in_phone(&request.phone)?;

        let user = users::Entity::find()
            .filter(users::Column::Phone.eq(request.phone.as_str()))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("No account found for this phone".to_string()))?;

        self.otp_service
            .consume(&request.phone, &request.code)
            .await?;

        let token = self.jwt_service.generate_token(&user)?;
        log::info!("User {} logged in", user.phone);

        Ok(AuthResponse {
            token,
            user: UserResponse::from(user),
            expires_in: self.jwt_service.get_token_expires_in(),
        })
    }

    /// Resolve the acting user for a verified token subject.
    pub async fn me(&self, subject: &str) -> AppResult<UserResponse> {
        let user = resolve_user(&self.pool, subject).await?;
        Ok(UserResponse::from(user))
    }
}

/// Resolve a token subject to a user row: the public id is tried first,
/// then the internal numeric id for tokens minted before the public-id
/// rollout.
pub async fn resolve_user(pool: &DatabaseConnection, subject: &str) -> AppResult<users::Model> {
    for identifier in Identifier::candidates(subject) {
        let found = match &identifier {
            Identifier::Public(public_id) => {
                users::Entity::find()
                    .filter(users::Column::PublicId.eq(public_id.as_str()))
                    .one(pool)
                    .await?
            }
            Identifier::Internal(id) => users::Entity::find_by_id(*id).one(pool).await?,
        };
        if let Some(user) = found {
            return Ok(user);
        }
    }
    Err(AppError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmsConfig;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: DatabaseConnection) -> AuthService {
        AuthService::new(
            db,
            JwtService::new("test-secret", 2_592_000),
            SmsService::new(SmsConfig::default()),
        )
    }

    fn user(id: i64, public_id: Option<&str>, phone: &str) -> users::Model {
        users::Model {
            id,
            public_id: public_id.map(str::to_string),
            name: "Asha".to_string(),
            phone: phone.to_string(),
            email: Some("asha@example.com".to_string()),
            is_vip: false,
            vip_expires_at: None,
            current_subscription_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn otp(id: i64, phone: &str, code: &str) -> crate::entities::otp_codes::Model {
        use chrono::Duration;
        let now = chrono::Utc::now();
        crate::entities::otp_codes::Model {
            id,
            phone: phone.to_string(),
            code: code.to_string(),
            expires_at: now + Duration::seconds(OTP_TTL_SECONDS),
            consumed_at: None,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_phone() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(1, Some("AB12CD"), "+911234567890")]])
            .into_connection();
        let err = service(db)
            .register(RegisterRequest {
                name: "Asha".to_string(),
                phone: "+911234567890".to_string(),
                email: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicatePhone));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(1, Some("AB12CD"), "+911234567890")]])
            .into_connection();
        let err = service(db)
            .register(RegisterRequest {
                name: "Meera".to_string(),
                phone: "+919999999999".to_string(),
                email: Some("asha@example.com".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_phone() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = service(db)
            .register(RegisterRequest {
                name: "Asha".to_string(),
                phone: "12345".to_string(),
                email: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_request_login_otp_unknown_phone() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let err = service(db)
            .request_login_otp("+911234567890")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_request_registration_otp_existing_phone() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(1, Some("AB12CD"), "+911234567890")]])
            .into_connection();
        let err = service(db)
            .request_registration_otp("+911234567890")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicatePhone));
    }

    #[tokio::test]
    async fn test_verify_otp_unknown_phone() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let err = service(db)
            .verify_otp(VerifyOtpRequest {
                phone: "+911234567890".to_string(),
                code: "1234".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_verify_otp_returns_token_for_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(1, Some("AB12CD"), "+911234567890")]])
            .append_query_results([vec![otp(5, "+911234567890", "4821")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let svc = service(db);
        let response = svc
            .verify_otp(VerifyOtpRequest {
                phone: "+911234567890".to_string(),
                code: "4821".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.user.id, "AB12CD");
        assert!(!response.user.is_vip);

        let claims = JwtService::new("test-secret", 2_592_000)
            .verify_token(&response.token)
            .unwrap();
        assert_eq!(claims.id, "AB12CD");
        assert_eq!(claims.phone, "+911234567890");
        assert!(!claims.is_vip);
    }

    #[tokio::test]
    async fn test_verify_otp_propagates_otp_failure() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(1, Some("AB12CD"), "+911234567890")]])
            .append_query_results([vec![otp(5, "+911234567890", "4821")]])
            .into_connection();
        let err = service(db)
            .verify_otp(VerifyOtpRequest {
                phone: "+911234567890".to_string(),
                code: "0000".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::OtpError(crate::error::OtpFailure::Mismatch)
        ));
    }

    #[tokio::test]
    async fn test_resolve_user_public_id_first() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user(1, Some("AB12CD"), "+911234567890")]])
            .into_connection();
        let found = resolve_user(&db, "AB12CD").await.unwrap();
        assert_eq!(found.id, 1);
    }

    #[tokio::test]
    async fn test_resolve_user_falls_back_to_internal_id() {
        // Numeric subject misses on public_id, then matches the legacy pk
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .append_query_results([vec![user(42, None, "+911234567890")]])
            .into_connection();
        let found = resolve_user(&db, "42").await.unwrap();
        assert_eq!(found.id, 42);
    }

    #[tokio::test]
    async fn test_resolve_user_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let err = resolve_user(&db, "ZZZZZZ").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
