use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users_table;
mod m20261001_000002_create_refresh_tokens_table;
mod m20261001_000003_create_categories_tables;
mod m20261001_000004_create_posts_table;
mod m20261001_000005_create_post_interactions;
mod m20261001_000006_create_forum_tables;
mod m20261001_000007_create_reports_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_users_table::Migration),
            Box::new(m20261001_000002_create_refresh_tokens_table::Migration),
            Box::new(m20261001_000003_create_categories_tables::Migration),
            Box::new(m20261001_000004_create_posts_table::Migration),
            Box::new(m20261001_000005_create_post_interactions::Migration),
            Box::new(m20261001_000006_create_forum_tables::Migration),
            Box::new(m20261001_000007_create_reports_table::Migration),
        ]
    }
}
