//! Income ledger repository.

use std::sync::Arc;

use crate::entities::{Income, income};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, SqlErr,
};
use studyhall_common::{AppError, AppResult};

/// Income ledger repository for database operations.
#[derive(Clone)]
pub struct IncomeRepository {
    db: Arc<DatabaseConnection>,
}

impl IncomeRepository {
    /// Create a new income repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record a ledger entry.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: income::ActiveModel,
    ) -> AppResult<income::Model> {
        model.insert(conn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Validation("Duplicate transaction id".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Ledger entries of a member, oldest first.
    pub async fn find_by_member(&self, member_id: &str) -> AppResult<Vec<income::Model>> {
        Income::find()
            .filter(income::Column::MemberId.eq(member_id))
            .order_by_asc(income::Column::Date)
            .order_by_asc(income::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an entry by its transaction reference.
    pub async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> AppResult<Option<income::Model>> {
        Income::find()
            .filter(income::Column::TransactionId.eq(transaction_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_by_transaction_id() {
        let entry = income::Model {
            id: "i1".to_string(),
            member_id: "m1".to_string(),
            amount: 150_000,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            remarks: Some("Fee renewal".to_string()),
            transaction_id: "TXN-1".to_string(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry.clone()]])
                .into_connection(),
        );

        let repo = IncomeRepository::new(db);
        let found = repo.find_by_transaction_id("TXN-1").await.unwrap();

        assert_eq!(found, Some(entry));
    }
}
