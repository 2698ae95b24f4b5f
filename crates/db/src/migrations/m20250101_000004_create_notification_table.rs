//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Notification::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Notification::MemberId).string_len(32).not_null())
                    .col(ColumnDef::new(Notification::Message).text().not_null())
                    .col(ColumnDef::new(Notification::Date).date().not_null())
                    .col(ColumnDef::new(Notification::IsRead).boolean().not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_member")
                            .from(Notification::Table, Notification::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (member_id, date) for per-day duplicate checks
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_member_date")
                    .table(Notification::Table)
                    .col(Notification::MemberId)
                    .col(Notification::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    MemberId,
    Message,
    Date,
    IsRead,
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
}
