//! Two-gate approval pipeline: profile approval, then seat assignment.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use studyhall_common::{AppError, AppResult, MembershipConfig, SharedClock};
use studyhall_db::{
    entities::{
        member::{self, MemberStatus, Transition, format_due_date},
        seat::SeatStatus,
    },
    repositories::{MemberRepository, SeatRepository},
};
use tracing::{info, warn};

use super::{access::add_days, lifecycle, notification::NotificationService};

/// Approval service for the admin queues.
#[derive(Clone)]
pub struct ApprovalService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    seat_repo: SeatRepository,
    notifications: NotificationService,
    clock: SharedClock,
    policy: MembershipConfig,
}

impl ApprovalService {
    /// Create a new approval service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        member_repo: MemberRepository,
        seat_repo: SeatRepository,
        notifications: NotificationService,
        clock: SharedClock,
        policy: MembershipConfig,
    ) -> Self {
        Self {
            db,
            member_repo,
            seat_repo,
            notifications,
            clock,
            policy,
        }
    }

    /// Gate 1: approve a pending profile and start the first billing cycle.
    pub async fn approve_profile(&self, member_id: &str) -> AppResult<member::Model> {
        let today = self.clock.today();
        let txn = lifecycle::begin(&self.db).await?;
        let member = self.member_repo.get_by_id_on(&txn, member_id).await?;

        if member.profile_approved {
            return Err(AppError::State(format!(
                "Profile of member {member_id} is already approved"
            )));
        }
        lifecycle::next_status(&member, Transition::ApproveProfile)?;

        let due_date = add_days(today, self.policy.billing_cycle_days);
        if !self
            .member_repo
            .approve_profile(&txn, member_id, format_due_date(due_date))
            .await?
        {
            warn!(member_id, "Profile approval lost a race");
            return Err(AppError::State(format!(
                "Profile of member {member_id} is already approved"
            )));
        }

        self.notifications
            .emit(
                &txn,
                member_id,
                &format!("Profile approved. First fee due on {due_date}."),
                today,
            )
            .await?;

        let approved = self.member_repo.get_by_id_on(&txn, member_id).await?;
        lifecycle::commit(txn).await?;

        info!(member_id, %due_date, "Profile approved");
        Ok(approved)
    }

    /// Gate 2: give an approved member the seat labelled `seat_label`.
    ///
    /// The gate is checked before the seat, so an unapproved member gets a
    /// state error whether or not the seat is free. The seat claim and the
    /// member's back-reference commit together or not at all.
    pub async fn assign_seat(&self, member_id: &str, seat_label: &str) -> AppResult<member::Model> {
        let txn = lifecycle::begin(&self.db).await?;
        let member = self.member_repo.get_by_id_on(&txn, member_id).await?;

        if !member.profile_approved {
            return Err(AppError::State(format!(
                "Member {member_id} must pass profile approval before seat assignment"
            )));
        }
        if member.seat_approved {
            return Err(AppError::State(format!(
                "Member {member_id} already has a seat assignment"
            )));
        }
        if member.status == MemberStatus::Alumni {
            return Err(AppError::State(format!("Member {member_id} has left")));
        }

        let seat = self.seat_repo.get_by_label_on(&txn, seat_label).await?;

        let held = SeatStatus::held_with_mercy(member.mercy_days);
        if !self.seat_repo.claim(&txn, &seat.id, held).await? {
            warn!(member_id, seat = seat_label, "Seat already taken");
            return Err(AppError::ResourceUnavailable(format!(
                "Seat {seat_label} is not available"
            )));
        }

        if !self.member_repo.link_seat(&txn, member_id, &seat.id).await? {
            return Err(AppError::State(format!(
                "Member {member_id} changed while assigning seat {seat_label}"
            )));
        }

        self.notifications
            .emit(
                &txn,
                member_id,
                &format!("Seat {seat_label} assigned."),
                self.clock.today(),
            )
            .await?;

        let assigned = self.member_repo.get_by_id_on(&txn, member_id).await?;
        lifecycle::commit(txn).await?;

        info!(member_id, seat = seat_label, "Seat assigned");
        Ok(assigned)
    }

    /// Members waiting for profile approval.
    pub async fn pending_profiles(&self) -> AppResult<Vec<member::Model>> {
        self.member_repo.find_pending_profiles().await
    }

    /// Approved members still waiting for a seat.
    pub async fn awaiting_seat(&self) -> AppResult<Vec<member::Model>> {
        self.member_repo.find_awaiting_seat().await
    }
}
