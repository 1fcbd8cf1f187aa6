pub use sea_orm_migration::prelude::*;

mod m20250510_000001_initial;
mod m20250528_000001_add_vip_expiry_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250510_000001_initial::Migration),
            Box::new(m20250528_000001_add_vip_expiry_index::Migration),
        ]
    }
}
