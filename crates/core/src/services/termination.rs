//! Membership termination.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use studyhall_common::{AppError, AppResult, SharedClock};
use studyhall_db::{
    entities::member::{self, Transition},
    repositories::{MemberRepository, SeatMoveRequestRepository, SeatRepository},
};
use tracing::{info, warn};

use super::{lifecycle, notification::NotificationService};

/// Termination service.
#[derive(Clone)]
pub struct TerminationService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    seat_repo: SeatRepository,
    move_repo: SeatMoveRequestRepository,
    notifications: NotificationService,
    clock: SharedClock,
}

impl TerminationService {
    /// Create a new termination service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        member_repo: MemberRepository,
        seat_repo: SeatRepository,
        move_repo: SeatMoveRequestRepository,
        notifications: NotificationService,
        clock: SharedClock,
    ) -> Self {
        Self {
            db,
            member_repo,
            seat_repo,
            move_repo,
            notifications,
            clock,
        }
    }

    /// Move a member to `Alumni`.
    ///
    /// In one transaction: the held seat becomes available, the member's
    /// reference is cleared, and open move requests are rejected.
    pub async fn terminate(&self, member_id: &str) -> AppResult<member::Model> {
        let today = self.clock.today();
        let txn = lifecycle::begin(&self.db).await?;
        let member = self.member_repo.get_by_id_on(&txn, member_id).await?;

        lifecycle::next_status(&member, Transition::Terminate)?;
        let seat_id = member.assigned_seat_id.as_deref();

        if !self
            .member_repo
            .terminate(&txn, member_id, member.status, seat_id)
            .await?
        {
            warn!(member_id, "Member changed during termination");
            return Err(AppError::State(format!(
                "Member {member_id} changed concurrently; retry the termination"
            )));
        }

        if let Some(seat_id) = seat_id
            && !self.seat_repo.release(&txn, seat_id).await?
        {
            warn!(member_id, seat_id, "Referenced seat was already available");
        }

        let rejected = self
            .move_repo
            .reject_pending_for_member(&txn, member_id, today)
            .await?;

        self.notifications
            .emit(&txn, member_id, "Membership terminated.", today)
            .await?;

        let alumni = self.member_repo.get_by_id_on(&txn, member_id).await?;
        lifecycle::commit(txn).await?;

        info!(member_id, seat_id = ?seat_id, rejected_moves = rejected, "Member terminated");
        Ok(alumni)
    }
}
