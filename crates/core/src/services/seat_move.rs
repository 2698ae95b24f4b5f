//! Seat-move requests and their approval.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, DatabaseTransaction, Set};
use studyhall_common::{AppError, AppResult, IdGenerator, SharedClock};
use studyhall_db::{
    entities::{
        member::MemberStatus,
        seat::SeatStatus,
        seat_move_request::{self, MoveStatus},
    },
    repositories::{MemberRepository, SeatMoveRequestRepository, SeatRepository},
};
use tracing::{info, warn};

use super::{lifecycle, notification::NotificationService};

/// Maximum length of a move reason.
const MAX_REASON_LEN: usize = 500;

/// Seat-move workflow service.
#[derive(Clone)]
pub struct SeatMoveService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    seat_repo: SeatRepository,
    move_repo: SeatMoveRequestRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
    clock: SharedClock,
}

impl SeatMoveService {
    /// Create a new seat-move service.
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
            id_gen: IdGenerator::new(),
            clock,
        }
    }

    /// File a request to move to the seat labelled `requested_seat`.
    ///
    /// Nothing moves until an admin approves the request. The member row is
    /// pinned for the duration, so a termination cannot slip in between the
    /// checks and the insert.
    pub async fn request_move(
        &self,
        member_id: &str,
        requested_seat: &str,
        reason: &str,
    ) -> AppResult<seat_move_request::Model> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation(
                "Move reason must not be empty".to_string(),
            ));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(AppError::Validation(format!(
                "Move reason must be at most {MAX_REASON_LEN} characters"
            )));
        }

        let txn = lifecycle::begin(&self.db).await?;
        let member = self.member_repo.get_by_id_on(&txn, member_id).await?;
        if member.status == MemberStatus::Alumni {
            return Err(AppError::State(format!("Member {member_id} has left")));
        }
        let current_id = member.assigned_seat_id.as_deref().ok_or_else(|| {
            AppError::State(format!("Member {member_id} does not hold a seat"))
        })?;

        if !self
            .member_repo
            .pin(&txn, member_id, member.status, Some(current_id))
            .await?
        {
            warn!(member_id, "Member changed while filing a move request");
            return Err(AppError::State(format!(
                "Member {member_id} changed concurrently; retry the request"
            )));
        }

        let current = self
            .seat_repo
            .find_by_id_on(&txn, current_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Seat {current_id} is missing")))?;

        let target = self.seat_repo.get_by_label_on(&txn, requested_seat).await?;
        if target.id == current.id {
            return Err(AppError::Validation(format!(
                "Member {member_id} already sits at {requested_seat}"
            )));
        }
        if target.status.is_taken() {
            return Err(AppError::ResourceUnavailable(format!(
                "Seat {requested_seat} is not available"
            )));
        }

        if self
            .move_repo
            .find_pending_for_member_on(&txn, member_id)
            .await?
            .is_some()
        {
            return Err(AppError::State(format!(
                "Member {member_id} already has a pending move request"
            )));
        }

        let model = seat_move_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            member_id: Set(member_id.to_string()),
            current_seat: Set(current.label.clone()),
            requested_seat: Set(target.label.clone()),
            reason: Set(reason.to_string()),
            status: Set(MoveStatus::Pending),
            requested_on: Set(self.clock.today()),
            decided_on: Set(None),
        };

        let request = self.move_repo.create(&txn, model).await?;
        lifecycle::commit(txn).await?;

        info!(
            member_id,
            request_id = %request.id,
            from = %current.label,
            to = %target.label,
            "Seat move requested"
        );
        Ok(request)
    }

    /// Approve a pending request and move the member.
    ///
    /// In one transaction: the requested seat is claimed if still available,
    /// the current seat is released, the member is repointed and the request
    /// is marked approved.
    pub async fn approve_move(&self, request_id: &str) -> AppResult<seat_move_request::Model> {
        let today = self.clock.today();
        let txn = lifecycle::begin(&self.db).await?;
        let request = self.pending_request(&txn, request_id).await?;
        let member = self.member_repo.get_by_id_on(&txn, &request.member_id).await?;

        if member.status == MemberStatus::Alumni {
            return Err(AppError::State(format!(
                "Member {} has left",
                member.id
            )));
        }
        let current_id = member.assigned_seat_id.as_deref().ok_or_else(|| {
            AppError::State(format!("Member {} no longer holds a seat", member.id))
        })?;

        let target = self
            .seat_repo
            .find_by_label_on(&txn, &request.requested_seat)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Seat {}", request.requested_seat)))?;

        let held = SeatStatus::held_with_mercy(member.mercy_days);
        if !self.seat_repo.claim(&txn, &target.id, held).await? {
            warn!(request_id, seat = %target.label, "Requested seat taken before approval");
            return Err(AppError::ResourceUnavailable(format!(
                "Seat {} is not available",
                target.label
            )));
        }

        if !self.seat_repo.release(&txn, current_id).await? {
            return Err(AppError::Internal(format!(
                "Seat {current_id} is referenced by {} but not held",
                member.id
            )));
        }

        if !self
            .member_repo
            .relink_seat(&txn, &member.id, current_id, &target.id)
            .await?
        {
            return Err(AppError::State(format!(
                "Member {} changed during the move",
                member.id
            )));
        }

        if !self
            .move_repo
            .decide(&txn, request_id, MoveStatus::Approved, today)
            .await?
        {
            return Err(AppError::State(format!(
                "Move request {request_id} was decided concurrently"
            )));
        }

        self.notifications
            .emit(
                &txn,
                &member.id,
                &format!("Seat move approved: {} to {}.", request.current_seat, target.label),
                today,
            )
            .await?;

        let decided = self.find_request(&txn, request_id).await?;
        lifecycle::commit(txn).await?;

        info!(request_id, member_id = %member.id, to = %target.label, "Seat move approved");
        Ok(decided)
    }

    /// Reject a pending request. No seat changes.
    pub async fn reject_move(&self, request_id: &str) -> AppResult<seat_move_request::Model> {
        let today = self.clock.today();
        let txn = lifecycle::begin(&self.db).await?;
        let request = self.pending_request(&txn, request_id).await?;

        if !self
            .move_repo
            .decide(&txn, request_id, MoveStatus::Rejected, today)
            .await?
        {
            return Err(AppError::State(format!(
                "Move request {request_id} was decided concurrently"
            )));
        }

        self.notifications
            .emit(
                &txn,
                &request.member_id,
                &format!("Seat move to {} was declined.", request.requested_seat),
                today,
            )
            .await?;

        let decided = self.find_request(&txn, request_id).await?;
        lifecycle::commit(txn).await?;

        info!(request_id, member_id = %request.member_id, "Seat move rejected");
        Ok(decided)
    }

    /// Undecided requests, oldest first.
    pub async fn pending_requests(&self) -> AppResult<Vec<seat_move_request::Model>> {
        self.move_repo.find_pending().await
    }

    /// Every request a member has filed, newest first.
    pub async fn requests_for(&self, member_id: &str) -> AppResult<Vec<seat_move_request::Model>> {
        self.move_repo.find_by_member(member_id).await
    }

    async fn pending_request(
        &self,
        txn: &DatabaseTransaction,
        request_id: &str,
    ) -> AppResult<seat_move_request::Model> {
        let request = self.find_request(txn, request_id).await?;
        if request.status != MoveStatus::Pending {
            return Err(AppError::State(format!(
                "Move request {request_id} is already {:?}",
                request.status
            )));
        }
        Ok(request)
    }

    async fn find_request(
        &self,
        txn: &DatabaseTransaction,
        request_id: &str,
    ) -> AppResult<seat_move_request::Model> {
        self.move_repo
            .find_by_id_on(txn, request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Move request {request_id}")))
    }
}
