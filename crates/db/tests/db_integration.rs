//! Database integration tests against an in-memory SQLite database.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use sea_orm::{EntityTrait, Set, TransactionTrait};
use studyhall_common::AppError;
use studyhall_db::{
    entities::{
        Member, Seat,
        member::{self, MemberStatus},
        seat::{self, SeatStatus},
        seat_move_request::{self, MoveStatus},
    },
    repositories::{MemberRepository, SeatMoveRequestRepository, SeatRepository},
    test_utils::TestDatabase,
};

fn new_member(id: &str, phone: &str) -> member::ActiveModel {
    member::ActiveModel {
        id: Set(id.to_string()),
        name: Set("Asha".to_string()),
        phone: Set(phone.to_string()),
        credential_hash: Set("hash".to_string()),
        exam_goal: Set("NEET".to_string()),
        profile_approved: Set(false),
        seat_approved: Set(false),
        assigned_seat_id: Set(None),
        joining_date: Set(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        due_date: Set(None),
        mercy_days: Set(0),
        status: Set(MemberStatus::Pending),
    }
}

fn new_seat(id: &str, label: &str, position: i32) -> seat::ActiveModel {
    seat::ActiveModel {
        id: Set(id.to_string()),
        label: Set(label.to_string()),
        position: Set(position),
        has_locker: Set(false),
        status: Set(SeatStatus::Available),
    }
}

#[tokio::test]
async fn test_migrations_create_empty_schema() {
    let db = TestDatabase::new().await.unwrap();
    let conn = db.connection();

    assert!(Seat::find().all(conn.as_ref()).await.unwrap().is_empty());
    assert!(Member::find().all(conn.as_ref()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_phone_is_rejected() {
    let db = TestDatabase::new().await.unwrap();
    let repo = MemberRepository::new(db.connection());

    repo.create(new_member("m1", "9876543210")).await.unwrap();
    let result = repo.create(new_member("m2", "9876543210")).await;

    assert!(matches!(result, Err(AppError::DuplicatePhone(phone)) if phone == "9876543210"));
}

#[tokio::test]
async fn test_claim_only_succeeds_once() {
    let db = TestDatabase::new().await.unwrap();
    let conn = db.connection();
    let repo = SeatRepository::new(conn.clone());

    assert!(
        repo.insert_many(conn.as_ref(), vec![new_seat("s1", "A-1", 1)])
            .await
            .unwrap()
    );

    assert!(repo.claim(conn.as_ref(), "s1", SeatStatus::Occupied).await.unwrap());
    assert!(!repo.claim(conn.as_ref(), "s1", SeatStatus::Occupied).await.unwrap());

    assert!(repo.release(conn.as_ref(), "s1").await.unwrap());
    assert!(!repo.release(conn.as_ref(), "s1").await.unwrap());
}

#[tokio::test]
async fn test_rolled_back_claim_leaves_seat_available() {
    let db = TestDatabase::new().await.unwrap();
    let conn = db.connection();
    let repo = SeatRepository::new(conn.clone());

    assert!(
        repo.insert_many(conn.as_ref(), vec![new_seat("s1", "A-1", 1)])
            .await
            .unwrap()
    );

    let txn = conn.begin().await.unwrap();
    assert!(repo.claim(&txn, "s1", SeatStatus::Occupied).await.unwrap());
    txn.rollback().await.unwrap();

    let seat = repo.find_by_id("s1").await.unwrap().unwrap();
    assert_eq!(seat.status, SeatStatus::Available);
}

#[tokio::test]
async fn test_lock_requires_matching_billing_fields() {
    let db = TestDatabase::new().await.unwrap();
    let conn = db.connection();
    let repo = MemberRepository::new(conn.clone());

    repo.create(new_member("m1", "9876543210")).await.unwrap();
    assert!(repo
        .approve_profile(conn.as_ref(), "m1", "2024-01-01".to_string())
        .await
        .unwrap());

    // Stale view of the due date: no write.
    assert!(!repo.lock(conn.as_ref(), "m1", Some("2023-12-01"), 0).await.unwrap());
    assert!(repo.lock(conn.as_ref(), "m1", Some("2024-01-01"), 0).await.unwrap());

    let member = repo.get_by_id("m1").await.unwrap();
    assert_eq!(member.status, MemberStatus::Locked);
}

#[tokio::test]
async fn test_second_holder_for_same_seat_is_rejected_by_schema() {
    let db = TestDatabase::new().await.unwrap();
    let conn = db.connection();
    let repo = MemberRepository::new(conn.clone());

    let mut a = new_member("m1", "9000000001");
    a.assigned_seat_id = Set(Some("s1".to_string()));
    let mut b = new_member("m2", "9000000002");
    b.assigned_seat_id = Set(Some("s1".to_string()));

    repo.create(a).await.unwrap();
    assert!(matches!(repo.create(b).await, Err(AppError::Database(_))));
}

fn new_request(id: &str, member_id: &str) -> seat_move_request::ActiveModel {
    seat_move_request::ActiveModel {
        id: Set(id.to_string()),
        member_id: Set(member_id.to_string()),
        current_seat: Set("A-1".to_string()),
        requested_seat: Set("A-2".to_string()),
        reason: Set("Window".to_string()),
        status: Set(MoveStatus::Pending),
        requested_on: Set(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
        decided_on: Set(None),
    }
}

#[tokio::test]
async fn test_seat_label_collision_reports_existing_map() {
    let db = TestDatabase::new().await.unwrap();
    let conn = db.connection();
    let repo = SeatRepository::new(conn.clone());

    assert!(
        repo.insert_many(conn.as_ref(), vec![new_seat("s1", "A-1", 1)])
            .await
            .unwrap()
    );
    assert!(
        !repo
            .insert_many(conn.as_ref(), vec![new_seat("s2", "A-1", 1)])
            .await
            .unwrap()
    );
    assert_eq!(repo.count(conn.as_ref()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_one_pending_move_request_per_member() {
    let db = TestDatabase::new().await.unwrap();
    let conn = db.connection();
    MemberRepository::new(conn.clone())
        .create(new_member("m1", "9000000001"))
        .await
        .unwrap();
    let repo = SeatMoveRequestRepository::new(conn.clone());

    repo.create(conn.as_ref(), new_request("r1", "m1")).await.unwrap();
    assert!(matches!(
        repo.create(conn.as_ref(), new_request("r2", "m1")).await,
        Err(AppError::State(_))
    ));

    let decided_on = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
    assert!(repo.decide(conn.as_ref(), "r1", MoveStatus::Rejected, decided_on).await.unwrap());
    repo.create(conn.as_ref(), new_request("r2", "m1")).await.unwrap();
}

#[tokio::test]
async fn test_pin_fails_once_member_changed() {
    let db = TestDatabase::new().await.unwrap();
    let conn = db.connection();
    let repo = MemberRepository::new(conn.clone());

    let mut holder = new_member("m1", "9000000001");
    holder.status = Set(MemberStatus::Active);
    holder.assigned_seat_id = Set(Some("s1".to_string()));
    repo.create(holder).await.unwrap();

    assert!(repo.pin(conn.as_ref(), "m1", MemberStatus::Active, Some("s1")).await.unwrap());
    assert!(repo
        .terminate(conn.as_ref(), "m1", MemberStatus::Active, Some("s1"))
        .await
        .unwrap());
    assert!(!repo.pin(conn.as_ref(), "m1", MemberStatus::Active, Some("s1")).await.unwrap());
}
