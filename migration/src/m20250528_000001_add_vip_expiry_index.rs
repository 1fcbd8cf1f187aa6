use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Partial index using raw statement (SeaQuery doesn't support WHERE on index yet).
        // The expiry sweep scans `is_vip AND vip_expires_at < now`.
        let stmt = sea_orm::Statement::from_string(
            manager.get_database_backend(),
            "CREATE INDEX IF NOT EXISTS idx_users_vip_expires_at ON users(vip_expires_at) WHERE is_vip = TRUE".to_owned(),
        );
        manager.get_connection().execute(stmt).await?;
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}
