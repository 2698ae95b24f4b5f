//! Income ledger entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Manual ledger entry for a fee payment.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "income")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub member_id: String,

    /// Amount in minor currency units
    pub amount: i64,

    pub date: Date,

    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,

    #[sea_orm(unique)]
    pub transaction_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id"
    )]
    Member,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
