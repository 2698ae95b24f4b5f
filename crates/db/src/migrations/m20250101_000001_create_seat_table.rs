//! Create seat table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Seat::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Seat::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Seat::Label).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Seat::Position).integer().not_null())
                    .col(ColumnDef::new(Seat::HasLocker).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Seat::Status)
                            .string_len(16)
                            .not_null()
                            .default("available"),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: status (for availability lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_seat_status")
                    .table(Seat::Table)
                    .col(Seat::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Seat::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Seat {
    Table,
    Id,
    Label,
    Position,
    HasLocker,
    Status,
}
