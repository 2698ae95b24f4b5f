//! Business logic services.

#![allow(missing_docs)]

pub mod access;
pub mod approval;
pub mod billing;
pub mod lifecycle;
pub mod member;
pub mod notification;
pub mod seat;
pub mod seat_move;
pub mod termination;

pub use access::{
    AccessDecision, AccessService, AccessState, SweepReport, compute_access, evaluate,
    lockout_date,
};
pub use approval::ApprovalService;
pub use billing::{BillingService, RenewalReceipt};
pub use member::{CreateMemberInput, MemberService};
pub use notification::NotificationService;
pub use seat::{FloorPlanEntry, InvariantViolation, SeatService};
pub use seat_move::SeatMoveService;
pub use termination::TerminationService;
