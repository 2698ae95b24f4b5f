//! Create income ledger table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Income::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Income::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Income::MemberId).string_len(32).not_null())
                    .col(ColumnDef::new(Income::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Income::Date).date().not_null())
                    .col(ColumnDef::new(Income::Remarks).text())
                    .col(
                        ColumnDef::new(Income::TransactionId)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_income_member")
                            .from(Income::Table, Income::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: member_id
        manager
            .create_index(
                Index::create()
                    .name("idx_income_member_id")
                    .table(Income::Table)
                    .col(Income::MemberId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Income::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Income {
    Table,
    Id,
    MemberId,
    Amount,
    Date,
    Remarks,
    TransactionId,
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
}
