use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    PublicId,
    Name,
    Phone,
    Email,
    IsVip,
    VipExpiresAt,
    CurrentSubscriptionId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OtpCodes {
    Table,
    Id,
    Phone,
    Code,
    ExpiresAt,
    ConsumedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum VipSubscriptions {
    Table,
    Id,
    UserId,
    PlanId,
    PlanName,
    AmountPaid,
    OriginalPrice,
    DiscountApplied,
    CouponCode,
    StartsAt,
    EndsAt,
    IsActive,
    CancelledAt,
    CancellationReason,
    PaymentMethod,
    PaymentStatus,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // nullable: rows imported from the legacy system predate public ids
                    .col(ColumnDef::new(Users::PublicId).string_len(16).null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Phone).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().null())
                    .col(
                        ColumnDef::new(Users::IsVip)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::VipExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::CurrentSubscriptionId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_users_phone")
                    .table(Users::Table)
                    .col(Users::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_users_public_id")
                    .table(Users::Table)
                    .col(Users::PublicId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OtpCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtpCodes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OtpCodes::Phone).string().not_null())
                    .col(ColumnDef::new(OtpCodes::Code).string_len(8).not_null())
                    .col(
                        ColumnDef::new(OtpCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpCodes::ConsumedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(OtpCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // consume always reads the newest row for a phone
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_otp_codes_phone_created_at")
                    .table(OtpCodes::Table)
                    .col(OtpCodes::Phone)
                    .col(OtpCodes::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VipSubscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VipSubscriptions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VipSubscriptions::PlanId).string().not_null())
                    .col(
                        ColumnDef::new(VipSubscriptions::PlanName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::AmountPaid)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::OriginalPrice)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::DiscountApplied)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(VipSubscriptions::CouponCode).string().null())
                    .col(
                        ColumnDef::new(VipSubscriptions::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::EndsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::CancelledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::CancellationReason)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::PaymentMethod)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::PaymentStatus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VipSubscriptions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_vip_subscriptions_user_id")
                    .table(VipSubscriptions::Table)
                    .col(VipSubscriptions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VipSubscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OtpCodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
