//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_seat_table;
mod m20250101_000002_create_member_table;
mod m20250101_000003_create_seat_move_request_table;
mod m20250101_000004_create_notification_table;
mod m20250101_000005_create_income_table;
mod m20250101_000006_add_pending_move_unique_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_seat_table::Migration),
            Box::new(m20250101_000002_create_member_table::Migration),
            Box::new(m20250101_000003_create_seat_move_request_table::Migration),
            Box::new(m20250101_000004_create_notification_table::Migration),
            Box::new(m20250101_000005_create_income_table::Migration),
            Box::new(m20250101_000006_add_pending_move_unique_index::Migration),
        ]
    }
}
