//! Seat move request repository.

use std::sync::Arc;

use chrono::NaiveDate;
use crate::entities::{
    SeatMoveRequest,
    seat_move_request::{self, MoveStatus},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use studyhall_common::{AppError, AppResult};

/// Seat move request repository for database operations.
#[derive(Clone)]
pub struct SeatMoveRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl SeatMoveRequestRepository {
    /// Create a new seat move request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a request by ID on the given connection.
    pub async fn find_by_id_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<seat_move_request::Model>> {
        SeatMoveRequest::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new request.
    ///
    /// A second pending request for the same member trips the partial
    /// unique index and comes back as `AppError::State`.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: seat_move_request::ActiveModel,
    ) -> AppResult<seat_move_request::Model> {
        model.insert(conn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::State("Member already has a pending move request".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Undecided requests, oldest first.
    pub async fn find_pending(&self) -> AppResult<Vec<seat_move_request::Model>> {
        SeatMoveRequest::find()
            .filter(seat_move_request::Column::Status.eq(MoveStatus::Pending))
            .order_by_asc(seat_move_request::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The member's undecided request, if any, on the given connection.
    pub async fn find_pending_for_member_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
    ) -> AppResult<Option<seat_move_request::Model>> {
        SeatMoveRequest::find()
            .filter(seat_move_request::Column::MemberId.eq(member_id))
            .filter(seat_move_request::Column::Status.eq(MoveStatus::Pending))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All requests filed by a member, newest first.
    pub async fn find_by_member(&self, member_id: &str) -> AppResult<Vec<seat_move_request::Model>> {
        SeatMoveRequest::find()
            .filter(seat_move_request::Column::MemberId.eq(member_id))
            .order_by_desc(seat_move_request::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a decision on a still-pending request. Returns whether it was pending.
    pub async fn decide<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        decision: MoveStatus,
        decided_on: NaiveDate,
    ) -> AppResult<bool> {
        debug_assert!(decision != MoveStatus::Pending);

        let result = SeatMoveRequest::update_many()
            .set(seat_move_request::ActiveModel {
                status: Set(decision),
                decided_on: Set(Some(decided_on)),
                ..Default::default()
            })
            .filter(seat_move_request::Column::Id.eq(id))
            .filter(seat_move_request::Column::Status.eq(MoveStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Reject every pending request of a member. Returns how many were rejected.
    pub async fn reject_pending_for_member<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
        decided_on: NaiveDate,
    ) -> AppResult<u64> {
        let result = SeatMoveRequest::update_many()
            .set(seat_move_request::ActiveModel {
                status: Set(MoveStatus::Rejected),
                decided_on: Set(Some(decided_on)),
                ..Default::default()
            })
            .filter(seat_move_request::Column::MemberId.eq(member_id))
            .filter(seat_move_request::Column::Status.eq(MoveStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
