//! Create `seat_move_request` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SeatMoveRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SeatMoveRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SeatMoveRequest::MemberId).string_len(32).not_null())
                    .col(ColumnDef::new(SeatMoveRequest::CurrentSeat).string_len(32).not_null())
                    .col(ColumnDef::new(SeatMoveRequest::RequestedSeat).string_len(32).not_null())
                    .col(ColumnDef::new(SeatMoveRequest::Reason).text().not_null())
                    .col(
                        ColumnDef::new(SeatMoveRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(SeatMoveRequest::RequestedOn).date().not_null())
                    .col(ColumnDef::new(SeatMoveRequest::DecidedOn).date())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seat_move_request_member")
                            .from(SeatMoveRequest::Table, SeatMoveRequest::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (member_id, status)
        manager
            .create_index(
                Index::create()
                    .name("idx_seat_move_request_member_status")
                    .table(SeatMoveRequest::Table)
                    .col(SeatMoveRequest::MemberId)
                    .col(SeatMoveRequest::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SeatMoveRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SeatMoveRequest {
    Table,
    Id,
    MemberId,
    CurrentSeat,
    RequestedSeat,
    Reason,
    Status,
    RequestedOn,
    DecidedOn,
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
}
