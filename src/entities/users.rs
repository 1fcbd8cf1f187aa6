use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 6-7 character user-facing id; legacy rows imported without one
    pub public_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub is_vip: bool,
    pub vip_expires_at: Option<DateTime<Utc>>,
    pub current_subscription_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
