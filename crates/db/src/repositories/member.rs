//! Member repository.

use std::sync::Arc;

use crate::entities::{
    Member,
    member::{self, MemberStatus},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, sea_query::SimpleExpr,
};
use studyhall_common::{AppError, AppResult};

/// Member repository for database operations.
///
/// Every state-changing method is a single conditional UPDATE guarded on the
/// state the caller observed, and reports whether a row matched. A `false`
/// means another session changed the member first.
#[derive(Clone)]
pub struct MemberRepository {
    db: Arc<DatabaseConnection>,
}

impl MemberRepository {
    /// Create a new member repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a member by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<member::Model>> {
        self.find_by_id_on(self.db.as_ref(), id).await
    }

    /// Find a member by ID on the given connection.
    pub async fn find_by_id_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<member::Model>> {
        Member::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a member by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<member::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {id}")))
    }

    /// Find a member by ID on the given connection, returning an error if not found.
    pub async fn get_by_id_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<member::Model> {
        self.find_by_id_on(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {id}")))
    }

    /// Find a member by phone number.
    pub async fn find_by_phone(&self, phone: &str) -> AppResult<Option<member::Model>> {
        Member::find()
            .filter(member::Column::Phone.eq(phone))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new member.
    ///
    /// A phone collision surfaces as [`AppError::DuplicatePhone`].
    pub async fn create(&self, model: member::ActiveModel) -> AppResult<member::Model> {
        let phone = model.phone.clone().take().unwrap_or_default();

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_error(&e, &phone))
    }

    /// Members waiting for profile approval (gate 1), oldest first.
    pub async fn find_pending_profiles(&self) -> AppResult<Vec<member::Model>> {
        Member::find()
            .filter(member::Column::ProfileApproved.eq(false))
            .filter(member::Column::Status.eq(MemberStatus::Pending))
            .order_by_asc(member::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approved members waiting for a seat (gate 2), oldest first.
    pub async fn find_awaiting_seat(&self) -> AppResult<Vec<member::Model>> {
        Member::find()
            .filter(member::Column::ProfileApproved.eq(true))
            .filter(member::Column::SeatApproved.eq(false))
            .filter(member::Column::Status.ne(MemberStatus::Alumni))
            .order_by_asc(member::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Members in the given lifecycle state.
    pub async fn find_by_status(&self, status: MemberStatus) -> AppResult<Vec<member::Model>> {
        Member::find()
            .filter(member::Column::Status.eq(status))
            .order_by_asc(member::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Members whose back-reference points at some seat.
    pub async fn find_seat_holders(&self) -> AppResult<Vec<member::Model>> {
        Member::find()
            .filter(member::Column::AssignedSeatId.is_not_null())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Gate 1: `Pending` → `Active` with the first due date.
    pub async fn approve_profile<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        due_date: String,
    ) -> AppResult<bool> {
        let result = Member::update_many()
            .set(member::ActiveModel {
                profile_approved: Set(true),
                status: Set(MemberStatus::Active),
                due_date: Set(Some(due_date)),
                ..Default::default()
            })
            .filter(member::Column::Id.eq(id))
            .filter(member::Column::Status.eq(MemberStatus::Pending))
            .filter(member::Column::ProfileApproved.eq(false))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Gate 2: link a seat to an approved member who has none yet.
    pub async fn link_seat<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        seat_id: &str,
    ) -> AppResult<bool> {
        let result = Member::update_many()
            .set(member::ActiveModel {
                assigned_seat_id: Set(Some(seat_id.to_string())),
                seat_approved: Set(true),
                ..Default::default()
            })
            .filter(member::Column::Id.eq(id))
            .filter(member::Column::ProfileApproved.eq(true))
            .filter(member::Column::SeatApproved.eq(false))
            .filter(member::Column::Status.ne(MemberStatus::Alumni))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Repoint the back-reference from one seat to another.
    pub async fn relink_seat<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        from_seat_id: &str,
        to_seat_id: &str,
    ) -> AppResult<bool> {
        let result = Member::update_many()
            .set(member::ActiveModel {
                assigned_seat_id: Set(Some(to_seat_id.to_string())),
                ..Default::default()
            })
            .filter(member::Column::Id.eq(id))
            .filter(member::Column::AssignedSeatId.eq(from_seat_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// `Active` → `Locked`, only if billing fields still match what was evaluated.
    pub async fn lock<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        seen_due_date: Option<&str>,
        seen_mercy_days: i32,
    ) -> AppResult<bool> {
        let due_filter: SimpleExpr = match seen_due_date {
            Some(due) => member::Column::DueDate.eq(due),
            None => member::Column::DueDate.is_null(),
        };

        let result = Member::update_many()
            .set(member::ActiveModel {
                status: Set(MemberStatus::Locked),
                ..Default::default()
            })
            .filter(member::Column::Id.eq(id))
            .filter(member::Column::Status.eq(MemberStatus::Active))
            .filter(due_filter)
            .filter(member::Column::MercyDays.eq(seen_mercy_days))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Advance the due date and reactivate.
    pub async fn renew<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        seen_status: MemberStatus,
        seen_due_date: &str,
        new_due_date: String,
    ) -> AppResult<bool> {
        let result = Member::update_many()
            .set(member::ActiveModel {
                status: Set(MemberStatus::Active),
                due_date: Set(Some(new_due_date)),
                ..Default::default()
            })
            .filter(member::Column::Id.eq(id))
            .filter(member::Column::Status.eq(seen_status))
            .filter(member::Column::DueDate.eq(seen_due_date))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Move to `Alumni` and drop the seat back-reference.
    pub async fn terminate<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        seen_status: MemberStatus,
        seen_seat_id: Option<&str>,
    ) -> AppResult<bool> {
        let result = Member::update_many()
            .set(member::ActiveModel {
                status: Set(MemberStatus::Alumni),
                assigned_seat_id: Set(None),
                ..Default::default()
            })
            .filter(member::Column::Id.eq(id))
            .filter(member::Column::Status.eq(seen_status))
            .filter(seat_filter(seen_seat_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Overwrite the granted mercy days while the member still holds `seen_seat_id`.
    pub async fn set_mercy_days<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        mercy_days: i32,
        seen_seat_id: Option<&str>,
    ) -> AppResult<bool> {
        let result = Member::update_many()
            .set(member::ActiveModel {
                mercy_days: Set(mercy_days),
                ..Default::default()
            })
            .filter(member::Column::Id.eq(id))
            .filter(member::Column::Status.ne(MemberStatus::Alumni))
            .filter(seat_filter(seen_seat_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Rewrite the member's status onto itself while it and the seat still
    /// match what was read.
    ///
    /// Changes nothing, but takes the row's write lock for the rest of the
    /// transaction, so a concurrent termination either committed first (no
    /// row matches) or waits until this transaction ends.
    pub async fn pin<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        seen_status: MemberStatus,
        seen_seat_id: Option<&str>,
    ) -> AppResult<bool> {
        let result = Member::update_many()
            .set(member::ActiveModel {
                status: Set(seen_status),
                ..Default::default()
            })
            .filter(member::Column::Id.eq(id))
            .filter(member::Column::Status.eq(seen_status))
            .filter(seat_filter(seen_seat_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }
}

fn seat_filter(seen_seat_id: Option<&str>) -> SimpleExpr {
    match seen_seat_id {
        Some(seat_id) => member::Column::AssignedSeatId.eq(seat_id),
        None => member::Column::AssignedSeatId.is_null(),
    }
}

fn map_insert_error(err: &DbErr, phone: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("phone") => {
            AppError::DuplicatePhone(phone.to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_member(id: &str, status: MemberStatus) -> member::Model {
        member::Model {
            id: id.to_string(),
            name: "Asha".to_string(),
            phone: "9876543210".to_string(),
            credential_hash: "$argon2id$stub".to_string(),
            exam_goal: "UPSC".to_string(),
            profile_approved: status != MemberStatus::Pending,
            seat_approved: false,
            assigned_seat_id: None,
            joining_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: None,
            mercy_days: 0,
            status,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_returns_member() {
        let member = create_test_member("m1", MemberStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member.clone()]])
                .into_connection(),
        );

        let repo = MemberRepository::new(db);
        let found = repo.get_by_id("m1").await.unwrap();

        assert_eq!(found.id, "m1");
        assert_eq!(found.status, MemberStatus::Pending);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<member::Model>::new()])
                .into_connection(),
        );

        let repo = MemberRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_pending_profiles() {
        let a = create_test_member("m1", MemberStatus::Pending);
        let b = create_test_member("m2", MemberStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a, b]])
                .into_connection(),
        );

        let repo = MemberRepository::new(db);
        let pending = repo.find_pending_profiles().await.unwrap();

        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|m| !m.profile_approved));
    }

    #[tokio::test]
    async fn test_lock_reports_lost_race() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = MemberRepository::new(db.clone());
        let locked = repo
            .lock(db.as_ref(), "m1", Some("2024-01-01"), 0)
            .await
            .unwrap();

        assert!(!locked);
    }

    #[test]
    fn test_non_constraint_error_maps_to_database() {
        let err = DbErr::Custom("boom".to_string());
        assert!(matches!(
            map_insert_error(&err, "9876543210"),
            AppError::Database(_)
        ));
    }
}
