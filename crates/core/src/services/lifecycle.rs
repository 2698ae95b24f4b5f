//! Shared helpers for lifecycle operations.

use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use studyhall_common::{AppError, AppResult};
use studyhall_db::entities::member::{self, MemberStatus, Transition};

/// Status a member moves to under `transition`, or a state error.
pub fn next_status(member: &member::Model, transition: Transition) -> AppResult<MemberStatus> {
    member.status.apply(transition).ok_or_else(|| {
        AppError::State(format!(
            "cannot {} member {} while {}",
            transition.verb(),
            member.id,
            member.status.as_str()
        ))
    })
}

/// The member's due date; missing or malformed values are rejected.
pub fn require_due_date(member: &member::Model) -> AppResult<NaiveDate> {
    match member.due_date.as_deref() {
        None => Err(AppError::Validation(format!(
            "Member {} has no due date",
            member.id
        ))),
        Some(raw) => member.parsed_due_date().ok_or_else(|| {
            AppError::Validation(format!("Member {} has malformed due date {raw:?}", member.id))
        }),
    }
}

/// Open a transaction on the shared pool.
pub async fn begin(db: &DatabaseConnection) -> AppResult<DatabaseTransaction> {
    db.begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Commit a transaction.
pub async fn commit(txn: DatabaseTransaction) -> AppResult<()> {
    txn.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
