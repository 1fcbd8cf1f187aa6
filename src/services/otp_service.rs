use crate::entities::otp_codes;
use crate::error::{AppResult, OtpFailure};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

/// Codes stop being consumable 5 minutes after issuance.
pub const OTP_TTL_SECONDS: i64 = 300;

#[derive(Debug)]
pub struct IssuedOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct OtpService {
    pool: Arc<DatabaseConnection>,
}

impl OtpService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { pool: pool.into() }
    }

    /// 4-digit code, uniform over 1000-9999.
    pub fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        rng.gen_range(1000..=9999).to_string()
    }

    /// Persist a fresh code for `phone`. Earlier codes are not revoked;
    /// `consume` only ever looks at the newest row, which makes them
    /// unusable without touching them.
    pub async fn issue(&self, phone: &str) -> AppResult<IssuedOtp> {
        let code = Self::generate_code();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(OTP_TTL_SECONDS);

        otp_codes::ActiveModel {
            phone: Set(phone.to_string()),
            code: Set(code.clone()),
            expires_at: Set(expires_at),
            consumed_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        log::info!("Issued verification code for {phone}, expires at {expires_at}");
        Ok(IssuedOtp { code, expires_at })
    }

    /// Check `submitted` against the newest code for `phone` and mark it
    /// used. The mark is a conditional update on `consumed_at IS NULL`,
    /// so of two racing verifies at most one succeeds.
    pub async fn consume(&self, phone: &str, submitted: &str) -> AppResult<()> {
        let latest = otp_codes::Entity::find()
            .filter(otp_codes::Column::Phone.eq(phone))
            .order_by_desc(otp_codes::Column::CreatedAt)
            .one(self.pool.as_ref())
            .await?;

        let record_id = evaluate(latest.as_ref(), submitted, Utc::now())?;

        let result = otp_codes::Entity::update_many()
            .col_expr(otp_codes::Column::ConsumedAt, Expr::value(Some(Utc::now())))
            .filter(otp_codes::Column::Id.eq(record_id))
            .filter(otp_codes::Column::ConsumedAt.is_null())
            .exec(self.pool.as_ref())
            .await?;

        if result.rows_affected == 0 {
            // Another request consumed it between our read and write
            return Err(OtpFailure::AlreadyUsed.into());
        }

        Ok(())
    }
}

/// Decide whether the newest stored code accepts `submitted`, returning
/// the row to consume. Comparison is string equality, not numeric.
fn evaluate(
    record: Option<&otp_codes::Model>,
    submitted: &str,
    now: DateTime<Utc>,
) -> Result<i64, OtpFailure> {
    let Some(record) = record else {
        return Err(OtpFailure::NotRequested);
    };
    if record.consumed_at.is_some() {
        return Err(OtpFailure::AlreadyUsed);
    }
    if now > record.expires_at {
        return Err(OtpFailure::Expired);
    }
    if record.code != submitted {
        return Err(OtpFailure::Mismatch);
    }
    Ok(record.id)
}
