//! Service wiring.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use studyhall_common::{Config, MembershipConfig, SharedClock, config::NotificationConfig};
use studyhall_db::repositories::{
    IncomeRepository, MemberRepository, NotificationRepository, SeatMoveRequestRepository,
    SeatRepository,
};

use crate::services::{
    AccessService, ApprovalService, BillingService, MemberService, NotificationService,
    SeatMoveService, SeatService, TerminationService,
};

/// Every membership service built over one connection pool and one clock.
#[derive(Clone)]
pub struct MembershipEngine {
    /// Registration, login and mercy grants.
    pub members: MemberService,
    /// Seat inventory.
    pub seats: SeatService,
    /// Profile approval and seat assignment.
    pub approvals: ApprovalService,
    /// Lockout calculator.
    pub access: AccessService,
    /// Renewal and ledger.
    pub billing: BillingService,
    /// Termination.
    pub termination: TerminationService,
    /// Seat-move requests.
    pub moves: SeatMoveService,
    /// Notification emitter.
    pub notifications: NotificationService,
}

impl MembershipEngine {
    /// Build the services from loaded configuration.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config, clock: SharedClock) -> Self {
        Self::with_policy(db, config.membership, config.notifications, clock)
    }

    /// Build the services from explicit policy settings.
    #[must_use]
    pub fn with_policy(
        db: Arc<DatabaseConnection>,
        policy: MembershipConfig,
        notification_config: NotificationConfig,
        clock: SharedClock,
    ) -> Self {
        let member_repo = MemberRepository::new(Arc::clone(&db));
        let seat_repo = SeatRepository::new(Arc::clone(&db));
        let move_repo = SeatMoveRequestRepository::new(Arc::clone(&db));
        let income_repo = IncomeRepository::new(Arc::clone(&db));
        let notification_repo = NotificationRepository::new(Arc::clone(&db));

        let notifications =
            NotificationService::new(Arc::clone(&db), notification_repo, notification_config);

        Self {
            members: MemberService::new(
                Arc::clone(&db),
                member_repo.clone(),
                seat_repo.clone(),
                Arc::clone(&clock),
            ),
            seats: SeatService::new(Arc::clone(&db), seat_repo.clone(), member_repo.clone()),
            approvals: ApprovalService::new(
                Arc::clone(&db),
                member_repo.clone(),
                seat_repo.clone(),
                notifications.clone(),
                Arc::clone(&clock),
                policy,
            ),
            access: AccessService::new(
                Arc::clone(&db),
                member_repo.clone(),
                notifications.clone(),
                Arc::clone(&clock),
                policy,
            ),
            billing: BillingService::new(
                Arc::clone(&db),
                member_repo.clone(),
                income_repo,
                notifications.clone(),
                Arc::clone(&clock),
                policy,
            ),
            termination: TerminationService::new(
                Arc::clone(&db),
                member_repo.clone(),
                seat_repo.clone(),
                move_repo.clone(),
                notifications.clone(),
                Arc::clone(&clock),
            ),
            moves: SeatMoveService::new(
                db,
                member_repo,
                seat_repo,
                move_repo,
                notifications.clone(),
                clock,
            ),
            notifications,
        }
    }
}
