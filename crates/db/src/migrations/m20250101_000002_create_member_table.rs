//! Create member table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Member::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Member::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Member::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Member::Phone).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Member::CredentialHash).string_len(256).not_null())
                    .col(ColumnDef::new(Member::ExamGoal).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Member::ProfileApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Member::SeatApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Member::AssignedSeatId).string_len(32))
                    .col(ColumnDef::new(Member::JoiningDate).date().not_null())
                    .col(ColumnDef::new(Member::DueDate).string_len(32))
                    .col(ColumnDef::new(Member::MercyDays).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Member::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: assigned_seat_id (at most one holder per seat; NULLs do not collide)
        manager
            .create_index(
                Index::create()
                    .name("idx_member_assigned_seat_id")
                    .table(Member::Table)
                    .col(Member::AssignedSeatId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: status (for lockout sweeps and approval queues)
        manager
            .create_index(
                Index::create()
                    .name("idx_member_status")
                    .table(Member::Table)
                    .col(Member::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Member::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
    Name,
    Phone,
    CredentialHash,
    ExamGoal,
    ProfileApproved,
    SeatApproved,
    AssignedSeatId,
    JoiningDate,
    DueDate,
    MercyDays,
    Status,
}
