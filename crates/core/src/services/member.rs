//! Member service: registration intake, login and admin edits.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{DatabaseConnection, Set};
use serde::Deserialize;
use studyhall_common::{AppError, AppResult, IdGenerator, SharedClock};
use studyhall_db::{
    entities::{
        member::{self, MemberStatus},
        seat::SeatStatus,
    },
    repositories::{MemberRepository, SeatRepository},
};
use tracing::{info, warn};
use validator::Validate;

use super::lifecycle;

/// Length of a phone number.
pub const PHONE_LEN: usize = 10;

/// Largest mercy grant an admin may set.
pub const MAX_MERCY_DAYS: i32 = 365;

/// Input for registering a new member.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMemberInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[validate(length(equal = 10))]
    pub phone: String,

    #[validate(length(min = 1, max = 128))]
    pub credential: String,

    #[validate(length(min = 1, max = 64))]
    pub exam_goal: String,
}

/// Member service for business logic.
#[derive(Clone)]
pub struct MemberService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    seat_repo: SeatRepository,
    id_gen: IdGenerator,
    clock: SharedClock,
}

impl MemberService {
    /// Create a new member service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        member_repo: MemberRepository,
        seat_repo: SeatRepository,
        clock: SharedClock,
    ) -> Self {
        Self {
            db,
            member_repo,
            seat_repo,
            id_gen: IdGenerator::new(),
            clock,
        }
    }

    /// Register a member. The new record waits in `Pending` for profile approval.
    pub async fn create_member(&self, input: CreateMemberInput) -> AppResult<member::Model> {
        input.validate()?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name must not be blank".to_string()));
        }
        if input.phone.len() != PHONE_LEN || !input.phone.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::Validation(format!(
                "Phone must be {PHONE_LEN} digits"
            )));
        }

        let credential_hash = hash_credential(&input.credential)?;

        let model = member::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            phone: Set(input.phone),
            credential_hash: Set(credential_hash),
            exam_goal: Set(input.exam_goal),
            profile_approved: Set(false),
            seat_approved: Set(false),
            assigned_seat_id: Set(None),
            joining_date: Set(self.clock.today()),
            due_date: Set(None),
            mercy_days: Set(0),
            status: Set(MemberStatus::Pending),
        };

        let member = self.member_repo.create(model).await?;
        info!(member_id = %member.id, "Member registered");

        Ok(member)
    }

    /// Get a member by ID.
    pub async fn get(&self, member_id: &str) -> AppResult<member::Model> {
        self.member_repo.get_by_id(member_id).await
    }

    /// Log a member in by phone and credential.
    ///
    /// Members whose profile is still awaiting approval are turned away with
    /// a state error once their credential checks out.
    pub async fn authenticate(&self, phone: &str, credential: &str) -> AppResult<member::Model> {
        let member = self
            .member_repo
            .find_by_phone(phone)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_credential(credential, &member.credential_hash)? {
            return Err(AppError::Unauthorized);
        }

        if !member.profile_approved {
            return Err(AppError::State("Profile awaiting approval".to_string()));
        }

        Ok(member)
    }

    /// Admin action: overwrite the member's mercy days.
    ///
    /// The held seat, if any, flips between `Occupied` and `Mercy` in the
    /// same transaction.
    pub async fn set_mercy_days(&self, member_id: &str, days: i32) -> AppResult<member::Model> {
        if !(0..=MAX_MERCY_DAYS).contains(&days) {
            return Err(AppError::Validation(format!(
                "Mercy days must be between 0 and {MAX_MERCY_DAYS}"
            )));
        }

        let txn = lifecycle::begin(&self.db).await?;
        let member = self.member_repo.get_by_id_on(&txn, member_id).await?;

        if member.status == MemberStatus::Alumni {
            return Err(AppError::State(format!(
                "Member {member_id} has left; mercy days are frozen"
            )));
        }

        let seat_id = member.assigned_seat_id.as_deref();
        if !self
            .member_repo
            .set_mercy_days(&txn, member_id, days, seat_id)
            .await?
        {
            warn!(member_id, "Member changed while granting mercy days");
            return Err(AppError::State(format!(
                "Member {member_id} changed concurrently"
            )));
        }

        if let Some(seat_id) = seat_id
            && !self
                .seat_repo
                .set_held_status(&txn, seat_id, SeatStatus::held_with_mercy(days))
                .await?
        {
            return Err(AppError::Internal(format!(
                "Seat {seat_id} is referenced by {member_id} but not held"
            )));
        }

        let updated = self.member_repo.get_by_id_on(&txn, member_id).await?;
        lifecycle::commit(txn).await?;

        info!(member_id, mercy_days = days, "Mercy days updated");
        Ok(updated)
    }
}

/// Hash a credential using Argon2.
fn hash_credential(credential: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(credential.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash credential: {e}")))
}

/// Verify a credential against a stored hash.
fn verify_credential(credential: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(credential.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use studyhall_common::FixedClock;

    fn service(db: DatabaseConnection) -> MemberService {
        let db = Arc::new(db);
        MemberService::new(
            Arc::clone(&db),
            MemberRepository::new(Arc::clone(&db)),
            SeatRepository::new(db),
            Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())),
        )
    }

    fn input(phone: &str) -> CreateMemberInput {
        CreateMemberInput {
            name: "Meera".to_string(),
            phone: phone.to_string(),
            credential: "s3cret".to_string(),
            exam_goal: "NEET".to_string(),
        }
    }

    #[test]
    fn test_hash_credential() {
        let hash = hash_credential("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_credential("s3cret", &hash).unwrap());
        assert!(!verify_credential("wrong", &hash).unwrap());
    }

    #[test]
    fn test_verify_credential_invalid_hash() {
        assert!(verify_credential("s3cret", "plaintext").is_err());
    }

    #[tokio::test]
    async fn test_create_member_rejects_short_phone() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let result = service.create_member(input("98765")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_member_rejects_non_digit_phone() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let result = service.create_member(input("98765abcde")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_member_rejects_blank_name() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let mut input = input("9876543210");
        input.name = "   ".to_string();

        let result = service.create_member(input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_set_mercy_days_out_of_range() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        assert!(matches!(
            service.set_mercy_days("m1", -1).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.set_mercy_days("m1", MAX_MERCY_DAYS + 1).await,
            Err(AppError::Validation(_))
        ));
    }
}
