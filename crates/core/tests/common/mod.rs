//! Shared fixtures for service integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use chrono::NaiveDate;
use studyhall_common::{FixedClock, MembershipConfig, SeatLayoutConfig, config::NotificationConfig};
use studyhall_core::{CreateMemberInput, MembershipEngine};
use studyhall_db::{
    entities::{member, seat},
    test_utils::TestDatabase,
};

/// Credential every fixture member registers with.
pub const CREDENTIAL: &str = "library-pass";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Migrated database with seats `A-1` through `A-{seats}`.
pub async fn setup(seats: u32) -> TestDatabase {
    let db = TestDatabase::new().await.unwrap();
    let layout = SeatLayoutConfig {
        prefix: "A".to_string(),
        count: seats,
        locker_every: 5,
    };
    engine_on(&db, date(2024, 1, 1))
        .seats
        .seed_if_empty(&layout)
        .await
        .unwrap();
    db
}

/// Engine whose clock reads `today`.
pub fn engine_on(db: &TestDatabase, today: NaiveDate) -> MembershipEngine {
    MembershipEngine::with_policy(
        db.connection(),
        MembershipConfig::default(),
        NotificationConfig::default(),
        Arc::new(FixedClock(today)),
    )
}

pub async fn register(engine: &MembershipEngine, phone: &str) -> member::Model {
    engine
        .members
        .create_member(CreateMemberInput {
            name: format!("Member {phone}"),
            phone: phone.to_string(),
            credential: CREDENTIAL.to_string(),
            exam_goal: "UPSC".to_string(),
        })
        .await
        .unwrap()
}

/// Registered and profile-approved on `approved_on`, so the first fee is due 30 days later.
pub async fn approved_member(db: &TestDatabase, phone: &str, approved_on: NaiveDate) -> member::Model {
    let engine = engine_on(db, approved_on);
    let member = register(&engine, phone).await;
    engine.approvals.approve_profile(&member.id).await.unwrap()
}

/// Approved member sitting at `seat_label`.
pub async fn seated_member(
    db: &TestDatabase,
    phone: &str,
    seat_label: &str,
    approved_on: NaiveDate,
) -> member::Model {
    let member = approved_member(db, phone, approved_on).await;
    engine_on(db, approved_on)
        .approvals
        .assign_seat(&member.id, seat_label)
        .await
        .unwrap()
}

pub async fn seat_by_label(engine: &MembershipEngine, label: &str) -> seat::Model {
    engine
        .seats
        .list()
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.label == label)
        .unwrap()
}

/// Panics with the violations if the seat/member invariant is broken.
pub async fn assert_consistent(engine: &MembershipEngine) {
    let violations = engine.seats.audit().await.unwrap();
    assert!(violations.is_empty(), "invariant violated: {violations:?}");
}
