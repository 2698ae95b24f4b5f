//! Lockout calculator.
//!
//! [`compute_access`] and [`evaluate`] are pure: they look at a member record
//! and a date and say what access the member should have. Persisting the
//! `Active` → `Locked` flip is [`AccessService`]'s job.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use studyhall_common::{AppError, AppResult, MembershipConfig, SharedClock};
use studyhall_db::{
    entities::member::{self, MemberStatus, Transition},
    repositories::MemberRepository,
};
use tracing::{debug, info, warn};

use super::{lifecycle, notification::NotificationService};

/// How many times a lock is retried after the member changed underneath it.
pub const MAX_LOCK_ATTEMPTS: usize = 3;

/// Access level of a member on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessState {
    Ok,
    Warning,
    Locked,
}

/// Outcome of the lockout calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub state: AccessState,
    /// Days left before lockout; set only for [`AccessState::Warning`].
    pub days_remaining: Option<i64>,
    /// The member is `Active` but past the lockout date and must be locked.
    pub lock_required: bool,
}

impl AccessDecision {
    const fn ok() -> Self {
        Self {
            state: AccessState::Ok,
            days_remaining: None,
            lock_required: false,
        }
    }

    const fn locked(lock_required: bool) -> Self {
        Self {
            state: AccessState::Locked,
            days_remaining: None,
            lock_required,
        }
    }
}

/// Shift a date by a signed number of days, saturating at the calendar ends.
#[must_use]
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let step = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(step).unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_days(step).unwrap_or(NaiveDate::MIN)
    }
}

/// Last day of access: `due_date + grace_days + mercy_days`.
#[must_use]
pub fn lockout_date(due_date: NaiveDate, mercy_days: i32, policy: &MembershipConfig) -> NaiveDate {
    add_days(due_date, policy.grace_days + i64::from(mercy_days.max(0)))
}

/// Access decision under the default policy (5 grace days).
#[must_use]
pub fn compute_access(member: &member::Model, today: NaiveDate) -> AccessDecision {
    evaluate(member, today, &MembershipConfig::default())
}

/// Access decision under `policy`.
///
/// A missing or unreadable due date counts as due today, so such members are
/// never locked out by this function.
#[must_use]
pub fn evaluate(
    member: &member::Model,
    today: NaiveDate,
    policy: &MembershipConfig,
) -> AccessDecision {
    match member.status {
        MemberStatus::Locked => return AccessDecision::locked(false),
        MemberStatus::Active => {}
        MemberStatus::Pending | MemberStatus::Alumni => return AccessDecision::ok(),
    }

    let due_date = member.parsed_due_date().unwrap_or(today);
    let lockout = lockout_date(due_date, member.mercy_days, policy);

    if today > lockout {
        AccessDecision::locked(true)
    } else if today > due_date {
        AccessDecision {
            state: AccessState::Warning,
            days_remaining: Some((lockout - today).num_days()),
            lock_required: false,
        }
    } else {
        AccessDecision::ok()
    }
}

/// Totals of one lockout sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Active members evaluated.
    pub checked: usize,
    /// Members moved to `Locked`.
    pub locked: usize,
    /// Members inside their grace window.
    pub warned: usize,
    /// Locks skipped because the member changed after evaluation.
    pub skipped: usize,
}

/// Applies lockout decisions to the store.
#[derive(Clone)]
pub struct AccessService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    notifications: NotificationService,
    clock: SharedClock,
    policy: MembershipConfig,
}

impl AccessService {
    /// Create a new access service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        member_repo: MemberRepository,
        notifications: NotificationService,
        clock: SharedClock,
        policy: MembershipConfig,
    ) -> Self {
        Self {
            db,
            member_repo,
            notifications,
            clock,
            policy,
        }
    }

    /// Evaluate a member for today and persist a required lock.
    ///
    /// Side effect: an `Active` member past the lockout date is moved to
    /// `Locked` and notified. The flip only applies if status, due date and
    /// mercy days still match what was evaluated; otherwise the member is
    /// read and evaluated again. Calling this again on a locked member
    /// changes nothing.
    pub async fn check_access(&self, member_id: &str) -> AppResult<AccessDecision> {
        let today = self.clock.today();

        for attempt in 1..=MAX_LOCK_ATTEMPTS {
            let member = self.member_repo.get_by_id(member_id).await?;
            let decision = evaluate(&member, today, &self.policy);
            debug!(member_id, ?decision, "Access evaluated");

            if !decision.lock_required || self.lock(&member, today).await? {
                return Ok(decision);
            }

            warn!(member_id, attempt, "Member changed before lock; re-evaluating");
        }

        Err(AppError::State(format!(
            "Member {member_id} kept changing during access check"
        )))
    }

    /// Evaluate every active member and lock the overdue ones.
    pub async fn sweep(&self) -> AppResult<SweepReport> {
        let today = self.clock.today();
        let members = self.member_repo.find_by_status(MemberStatus::Active).await?;
        let mut report = SweepReport::default();

        for member in &members {
            report.checked += 1;
            let decision = evaluate(member, today, &self.policy);

            match decision.state {
                AccessState::Warning => report.warned += 1,
                AccessState::Locked if decision.lock_required => {
                    if self.lock(member, today).await? {
                        report.locked += 1;
                    } else {
                        report.skipped += 1;
                    }
                }
                AccessState::Ok | AccessState::Locked => {}
            }
        }

        info!(
            checked = report.checked,
            locked = report.locked,
            warned = report.warned,
            skipped = report.skipped,
            "Lockout sweep finished"
        );
        Ok(report)
    }

    /// Lock `member` if it is unchanged since it was read. Returns whether it was.
    async fn lock(&self, member: &member::Model, today: NaiveDate) -> AppResult<bool> {
        lifecycle::next_status(member, Transition::Lock)?;

        let txn = lifecycle::begin(&self.db).await?;
        if !self
            .member_repo
            .lock(
                &txn,
                &member.id,
                member.due_date.as_deref(),
                member.mercy_days,
            )
            .await?
        {
            return Ok(false);
        }

        self.notifications
            .emit(
                &txn,
                &member.id,
                "Membership locked: fee overdue past the grace period.",
                today,
            )
            .await?;
        lifecycle::commit(txn).await?;

        info!(member_id = %member.id, due_date = ?member.due_date, "Member locked");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(status: MemberStatus, due_date: Option<&str>, mercy_days: i32) -> member::Model {
        member::Model {
            id: "m1".to_string(),
            name: "Kiran".to_string(),
            phone: "9000000002".to_string(),
            credential_hash: String::new(),
            exam_goal: "UPSC".to_string(),
            profile_approved: true,
            seat_approved: true,
            assigned_seat_id: Some("s1".to_string()),
            joining_date: date(2023, 12, 1),
            due_date: due_date.map(String::from),
            mercy_days,
            status,
        }
    }

    #[test]
    fn test_scenario_a_warning_then_locked() {
        let m = member(MemberStatus::Active, Some("2024-01-01"), 0);

        let warning = compute_access(&m, date(2024, 1, 5));
        assert_eq!(warning.state, AccessState::Warning);
        assert_eq!(warning.days_remaining, Some(1));
        assert!(!warning.lock_required);

        let locked = compute_access(&m, date(2024, 1, 7));
        assert_eq!(locked.state, AccessState::Locked);
        assert!(locked.lock_required);
    }

    #[test]
    fn test_scenario_b_mercy_extends_window() {
        let m = member(MemberStatus::Active, Some("2024-01-01"), 10);

        let decision = compute_access(&m, date(2024, 1, 10));
        assert_eq!(decision.state, AccessState::Warning);
        assert_eq!(decision.days_remaining, Some(6));

        assert_eq!(compute_access(&m, date(2024, 1, 16)).state, AccessState::Warning);
        assert_eq!(compute_access(&m, date(2024, 1, 17)).state, AccessState::Locked);
    }

    #[test]
    fn test_lockout_boundary() {
        let m = member(MemberStatus::Active, Some("2024-01-01"), 0);

        assert_eq!(compute_access(&m, date(2024, 1, 1)).state, AccessState::Ok);
        let last_day = compute_access(&m, date(2024, 1, 6));
        assert_eq!(last_day.state, AccessState::Warning);
        assert_eq!(last_day.days_remaining, Some(0));
    }

    #[test]
    fn test_locked_member_stays_locked_without_new_lock() {
        let m = member(MemberStatus::Locked, Some("2024-01-01"), 0);
        let decision = compute_access(&m, date(2024, 3, 1));

        assert_eq!(decision.state, AccessState::Locked);
        assert!(!decision.lock_required);
    }

    #[test]
    fn test_pending_and_alumni_are_ok() {
        for status in [MemberStatus::Pending, MemberStatus::Alumni] {
            let m = member(status, Some("2020-01-01"), 0);
            assert_eq!(compute_access(&m, date(2024, 1, 1)), AccessDecision::ok());
        }
    }

    #[test]
    fn test_unparseable_due_date_fails_open() {
        let today = date(2024, 6, 1);
        for due in [None, Some("not-a-date"), Some("")] {
            let m = member(MemberStatus::Active, due, 0);
            assert_eq!(compute_access(&m, today).state, AccessState::Ok);
        }
    }

    #[test]
    fn test_policy_grace_days() {
        let policy = MembershipConfig {
            billing_cycle_days: 30,
            grace_days: 0,
        };
        let m = member(MemberStatus::Active, Some("2024-01-01"), 0);

        assert!(evaluate(&m, date(2024, 1, 2), &policy).lock_required);
    }

    #[test]
    fn test_add_days_saturates() {
        assert_eq!(add_days(date(2024, 1, 31), 30), date(2024, 3, 1));
        assert_eq!(add_days(date(2024, 1, 31), -31), date(2023, 12, 31));
        assert_eq!(add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
        assert_eq!(add_days(NaiveDate::MIN, -1), NaiveDate::MIN);
    }
}
