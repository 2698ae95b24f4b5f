//! Member entity.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Storage format of `due_date`.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Lifecycle state of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum MemberStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "locked")]
    Locked,
    #[sea_orm(string_value = "alumni")]
    Alumni,
}

/// Lifecycle operations that change a member's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Transition {
    /// Gate 1.
    ApproveProfile,
    /// Automatic lockout after the grace window.
    Lock,
    /// Fee renewal.
    Renew,
    /// Termination.
    Terminate,
}

impl Transition {
    /// Verb used in error messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::ApproveProfile => "approve",
            Self::Lock => "lock",
            Self::Renew => "renew",
            Self::Terminate => "terminate",
        }
    }
}

impl MemberStatus {
    /// Transition table of the member lifecycle.
    ///
    /// | from    | operation      | to     |
    /// |---------|----------------|--------|
    /// | Pending | ApproveProfile | Active |
    /// | Active  | Lock           | Locked |
    /// | Active  | Renew          | Active |
    /// | Locked  | Renew          | Active |
    /// | Active  | Terminate      | Alumni |
    /// | Locked  | Terminate      | Alumni |
    ///
    /// Alumni is terminal. `None` means the operation is not allowed.
    #[must_use]
    pub const fn apply(self, transition: Transition) -> Option<Self> {
        match (self, transition) {
            (Self::Pending, Transition::ApproveProfile) => Some(Self::Active),
            (Self::Active, Transition::Lock) => Some(Self::Locked),
            (Self::Active | Self::Locked, Transition::Renew) => Some(Self::Active),
            (Self::Active | Self::Locked, Transition::Terminate) => Some(Self::Alumni),
            _ => None,
        }
    }

    /// Whether some operation in the table leads from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending | Self::Active | Self::Locked, Self::Active)
                | (Self::Active, Self::Locked)
                | (Self::Active | Self::Locked, Self::Alumni)
        )
    }

    /// Lowercase name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Locked => "locked",
            Self::Alumni => "alumni",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    #[sea_orm(unique)]
    pub phone: String,

    /// Argon2 hash of the login credential
    #[serde(skip_serializing)]
    pub credential_hash: String,

    pub exam_goal: String,

    /// Gate 1
    pub profile_approved: bool,

    /// Gate 2
    pub seat_approved: bool,

    /// Back-reference to the held seat; the seat's status is authoritative
    #[sea_orm(unique, nullable)]
    pub assigned_seat_id: Option<String>,

    pub joining_date: Date,

    /// `YYYY-MM-DD`; kept as text because imported rows are not guaranteed to parse
    #[sea_orm(nullable)]
    pub due_date: Option<String>,

    pub mercy_days: i32,

    pub status: MemberStatus,
}

impl Model {
    /// The due date, if present and well-formed.
    #[must_use]
    pub fn parsed_due_date(&self) -> Option<NaiveDate> {
        self.due_date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), DUE_DATE_FORMAT).ok())
    }
}

/// Render a date in the `due_date` storage format.
#[must_use]
pub fn format_due_date(date: NaiveDate) -> String {
    date.format(DUE_DATE_FORMAT).to_string()
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::seat::Entity",
        from = "Column::AssignedSeatId",
        to = "super::seat::Column::Id"
    )]
    Seat,
    #[sea_orm(has_many = "super::seat_move_request::Entity")]
    SeatMoveRequest,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notification,
    #[sea_orm(has_many = "super::income::Entity")]
    Income,
}

impl Related<super::seat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seat.def()
    }
}

impl Related<super::seat_move_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeatMoveRequest.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notification.def()
    }
}

impl Related<super::income::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Income.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_transition_table() {
        use MemberStatus::{Active, Alumni, Locked, Pending};

        let allowed = [
            (Pending, Active),
            (Active, Active),
            (Locked, Active),
            (Active, Locked),
            (Active, Alumni),
            (Locked, Alumni),
        ];

        for from in MemberStatus::iter() {
            for to in MemberStatus::iter() {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn test_apply_agrees_with_can_transition_to() {
        for from in MemberStatus::iter() {
            for to in MemberStatus::iter() {
                let reachable = Transition::iter().any(|t| from.apply(t) == Some(to));
                assert_eq!(reachable, from.can_transition_to(to), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn test_renewal_not_allowed_before_approval() {
        assert_eq!(MemberStatus::Pending.apply(Transition::Renew), None);
        assert_eq!(MemberStatus::Pending.apply(Transition::Terminate), None);
        assert_eq!(MemberStatus::Locked.apply(Transition::Lock), None);
    }

    #[test]
    fn test_alumni_is_terminal() {
        for to in MemberStatus::iter() {
            assert!(!MemberStatus::Alumni.can_transition_to(to));
        }
    }

    #[test]
    fn test_parsed_due_date() {
        let mut member = Model {
            id: "m1".to_string(),
            name: "Asha".to_string(),
            phone: "9876543210".to_string(),
            credential_hash: String::new(),
            exam_goal: "UPSC".to_string(),
            profile_approved: true,
            seat_approved: false,
            assigned_seat_id: None,
            joining_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: Some("2024-01-31".to_string()),
            mercy_days: 0,
            status: MemberStatus::Active,
        };
        assert_eq!(
            member.parsed_due_date(),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );

        member.due_date = Some("31/01/2024".to_string());
        assert_eq!(member.parsed_due_date(), None);

        member.due_date = None;
        assert_eq!(member.parsed_due_date(), None);
    }

    #[test]
    fn test_format_due_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(format_due_date(date), "2024-03-09");
    }
}
