//! Seat entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Occupancy state of a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum SeatStatus {
    #[sea_orm(string_value = "available")]
    #[default]
    Available,
    #[sea_orm(string_value = "occupied")]
    Occupied,
    /// Held by a member who is currently granted mercy days.
    #[sea_orm(string_value = "mercy")]
    Mercy,
}

impl SeatStatus {
    /// Whether some member holds the seat.
    #[must_use]
    pub const fn is_taken(self) -> bool {
        matches!(self, Self::Occupied | Self::Mercy)
    }

    /// Status a seat takes while held by a member with `mercy_days` granted.
    #[must_use]
    pub const fn held_with_mercy(mercy_days: i32) -> Self {
        if mercy_days > 0 {
            Self::Mercy
        } else {
            Self::Occupied
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "seat")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Human-facing label, e.g. `A-7`
    #[sea_orm(unique)]
    pub label: String,

    /// Floor-plan order
    pub position: i32,

    pub has_locker: bool,

    /// Source of truth for whether the seat is taken
    pub status: SeatStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::member::Entity")]
    Member,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
