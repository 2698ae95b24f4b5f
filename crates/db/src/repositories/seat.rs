//! Seat repository.

use std::sync::Arc;

use crate::entities::{
    Seat,
    seat::{self, SeatStatus},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use studyhall_common::{AppError, AppResult};

/// Seat repository for database operations.
#[derive(Clone)]
pub struct SeatRepository {
    db: Arc<DatabaseConnection>,
}

impl SeatRepository {
    /// Create a new seat repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a seat by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<seat::Model>> {
        Seat::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a seat by ID on the given connection.
    pub async fn find_by_id_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<seat::Model>> {
        Seat::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a seat by its label on the given connection.
    pub async fn find_by_label_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        label: &str,
    ) -> AppResult<Option<seat::Model>> {
        Seat::find()
            .filter(seat::Column::Label.eq(label))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a seat by its label on the given connection, returning an error if not found.
    pub async fn get_by_label_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        label: &str,
    ) -> AppResult<seat::Model> {
        self.find_by_label_on(conn, label)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Seat {label}")))
    }

    /// All seats in floor-plan order.
    pub async fn find_all(&self) -> AppResult<Vec<seat::Model>> {
        Seat::find()
            .order_by_asc(seat::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Seats nobody holds, in floor-plan order.
    pub async fn find_available(&self) -> AppResult<Vec<seat::Model>> {
        Seat::find()
            .filter(seat::Column::Status.eq(SeatStatus::Available))
            .order_by_asc(seat::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all seats on the given connection.
    pub async fn count<C: ConnectionTrait>(&self, conn: &C) -> AppResult<u64> {
        Seat::find()
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a batch of seats.
    ///
    /// Returns `false` when a seat with one of the labels already exists.
    pub async fn insert_many<C: ConnectionTrait>(
        &self,
        conn: &C,
        seats: Vec<seat::ActiveModel>,
    ) -> AppResult<bool> {
        if seats.is_empty() {
            return Ok(true);
        }

        match Seat::insert_many(seats).exec(conn).await {
            Ok(_) => Ok(true),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(false),
                _ => Err(AppError::Database(e.to_string())),
            },
        }
    }

    /// Take a seat if and only if it is currently available.
    ///
    /// Single conditional UPDATE: of two racing claims exactly one sees a
    /// changed row. Returns whether this call took the seat.
    pub async fn claim<C: ConnectionTrait>(
        &self,
        conn: &C,
        seat_id: &str,
        status: SeatStatus,
    ) -> AppResult<bool> {
        debug_assert!(status.is_taken());

        let result = Seat::update_many()
            .set(seat::ActiveModel {
                status: Set(status),
                ..Default::default()
            })
            .filter(seat::Column::Id.eq(seat_id))
            .filter(seat::Column::Status.eq(SeatStatus::Available))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Mark a held seat available again. Returns whether it was held.
    pub async fn release<C: ConnectionTrait>(&self, conn: &C, seat_id: &str) -> AppResult<bool> {
        let result = Seat::update_many()
            .set(seat::ActiveModel {
                status: Set(SeatStatus::Available),
                ..Default::default()
            })
            .filter(seat::Column::Id.eq(seat_id))
            .filter(seat::Column::Status.ne(SeatStatus::Available))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Switch a held seat between `Occupied` and `Mercy`.
    ///
    /// Never touches an available seat. Returns whether a row matched.
    pub async fn set_held_status<C: ConnectionTrait>(
        &self,
        conn: &C,
        seat_id: &str,
        status: SeatStatus,
    ) -> AppResult<bool> {
        debug_assert!(status.is_taken());

        let result = Seat::update_many()
            .set(seat::ActiveModel {
                status: Set(status),
                ..Default::default()
            })
            .filter(seat::Column::Id.eq(seat_id))
            .filter(seat::Column::Status.ne(SeatStatus::Available))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_seat(id: &str, label: &str, status: SeatStatus) -> seat::Model {
        seat::Model {
            id: id.to_string(),
            label: label.to_string(),
            position: 1,
            has_locker: false,
            status,
        }
    }

    #[tokio::test]
    async fn test_find_by_label_returns_seat() {
        let seat = create_test_seat("s1", "A-7", SeatStatus::Available);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[seat.clone()]])
                .into_connection(),
        );

        let repo = SeatRepository::new(db.clone());
        let result = repo.find_by_label_on(db.as_ref(), "A-7").await.unwrap();

        assert_eq!(result, Some(seat));
    }

    #[tokio::test]
    async fn test_get_by_label_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<seat::Model>::new()])
                .into_connection(),
        );

        let repo = SeatRepository::new(db.clone());
        let result = repo.get_by_label_on(db.as_ref(), "Z-99").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_claim_reports_whether_row_changed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = SeatRepository::new(db.clone());
        assert!(repo.claim(db.as_ref(), "s1", SeatStatus::Occupied).await.unwrap());
        assert!(!repo.claim(db.as_ref(), "s1", SeatStatus::Occupied).await.unwrap());
    }

    #[test]
    fn test_held_with_mercy() {
        assert_eq!(SeatStatus::held_with_mercy(0), SeatStatus::Occupied);
        assert_eq!(SeatStatus::held_with_mercy(3), SeatStatus::Mercy);
        assert!(SeatStatus::Mercy.is_taken());
        assert!(!SeatStatus::Available.is_taken());
    }
}
