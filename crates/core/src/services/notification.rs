//! Notification service.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use studyhall_common::{AppError, AppResult, IdGenerator, config::NotificationConfig};
use studyhall_db::{entities::notification, repositories::NotificationRepository};
use tracing::debug;

/// Records outbound messages for members. Delivery is someone else's job.
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<DatabaseConnection>,
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
    deduplicate: bool,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        notification_repo: NotificationRepository,
        config: NotificationConfig,
    ) -> Self {
        Self {
            db,
            notification_repo,
            id_gen: IdGenerator::new(),
            deduplicate: config.deduplicate,
        }
    }

    /// Record a message for a member on its own.
    ///
    /// Returns `None` when an identical message for the same member and date
    /// already exists and deduplication is on.
    pub async fn emit_notification(
        &self,
        member_id: &str,
        message: &str,
        date: NaiveDate,
    ) -> AppResult<Option<notification::Model>> {
        self.emit(self.db.as_ref(), member_id, message, date).await
    }

    /// Record a message on the caller's connection, usually an open transaction.
    pub async fn emit<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
        message: &str,
        date: NaiveDate,
    ) -> AppResult<Option<notification::Model>> {
        if self.deduplicate
            && self
                .notification_repo
                .exists_for_day(conn, member_id, message, date)
                .await?
        {
            debug!(member_id, %date, "Skipping duplicate notification");
            return Ok(None);
        }

        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            member_id: Set(member_id.to_string()),
            message: Set(message.to_string()),
            date: Set(date),
            is_read: Set(false),
        };

        let notification = self.notification_repo.create(conn, model).await?;
        debug!(member_id, notification_id = %notification.id, "Notification recorded");

        Ok(Some(notification))
    }

    /// Get notifications for a member, newest first.
    pub async fn list(
        &self,
        member_id: &str,
        limit: u64,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_member(member_id, limit, unread_only)
            .await
    }

    /// Mark one of the member's notifications as read.
    ///
    /// An unknown ID, or one belonging to another member, is `NotFound`.
    pub async fn mark_read(&self, member_id: &str, notification_id: &str) -> AppResult<()> {
        if !self
            .notification_repo
            .mark_as_read(member_id, notification_id)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "Notification {notification_id}"
            )));
        }
        Ok(())
    }

    /// Mark all notifications as read for a member.
    pub async fn mark_all_read(&self, member_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(member_id).await
    }

    /// Count unread notifications for a member.
    pub async fn count_unread(&self, member_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(member_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: DatabaseConnection, deduplicate: bool) -> NotificationService {
        let db = Arc::new(db);
        NotificationService::new(
            Arc::clone(&db),
            NotificationRepository::new(db),
            NotificationConfig { deduplicate },
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()
    }

    #[tokio::test]
    async fn test_emit_skips_duplicate_when_enabled() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(1)),
            }]])
            .into_connection();

        let service = service(db, true);
        let result = service
            .emit_notification("m1", "Membership locked", date())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_emit_inserts_without_dedup_check_when_disabled() {
        let stored = notification::Model {
            id: "n1".to_string(),
            member_id: "m1".to_string(),
            message: "Membership locked".to_string(),
            date: date(),
            is_read: false,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[stored.clone()]])
            .into_connection();

        let service = service(db, false);
        let result = service
            .emit_notification("m1", "Membership locked", date())
            .await
            .unwrap();

        assert_eq!(result, Some(stored));
    }

    #[tokio::test]
    async fn test_mark_read_of_unknown_or_foreign_notification_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = service(db, true).mark_read("m1", "n-of-m2").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_read_owned_notification() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        service(db, true).mark_read("m1", "n1").await.unwrap();
    }
}
