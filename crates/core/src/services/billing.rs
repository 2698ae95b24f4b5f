//! Fee renewal and the manual income ledger.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use serde::Serialize;
use studyhall_common::{AppError, AppResult, IdGenerator, MembershipConfig, SharedClock};
use studyhall_db::{
    entities::{
        income,
        member::{self, Transition, format_due_date},
    },
    repositories::{IncomeRepository, MemberRepository},
};
use tracing::{info, warn};

use super::{access::add_days, lifecycle, notification::NotificationService};

/// Remarks stored on a renewal's ledger entry when none are given.
pub const DEFAULT_RENEWAL_REMARKS: &str = "Fee renewal";

/// Result of a successful renewal.
#[derive(Debug, Clone, Serialize)]
pub struct RenewalReceipt {
    pub member: member::Model,
    pub income: income::Model,
    pub previous_due: NaiveDate,
    pub new_due: NaiveDate,
}

/// Billing service.
#[derive(Clone)]
pub struct BillingService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    income_repo: IncomeRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
    clock: SharedClock,
    policy: MembershipConfig,
}

impl BillingService {
    /// Create a new billing service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        member_repo: MemberRepository,
        income_repo: IncomeRepository,
        notifications: NotificationService,
        clock: SharedClock,
        policy: MembershipConfig,
    ) -> Self {
        Self {
            db,
            member_repo,
            income_repo,
            notifications,
            id_gen: IdGenerator::new(),
            clock,
            policy,
        }
    }

    /// Renew a membership for one billing cycle.
    ///
    /// The new due date counts from the previous due date, not from today, so
    /// a late payer does not gain days. Reactivates a locked member. The
    /// ledger entry commits with the member update.
    pub async fn renew(
        &self,
        member_id: &str,
        amount: i64,
        remarks: Option<&str>,
    ) -> AppResult<RenewalReceipt> {
        if amount <= 0 {
            return Err(AppError::Validation(
                "Renewal amount must be positive".to_string(),
            ));
        }

        let today = self.clock.today();
        let txn = lifecycle::begin(&self.db).await?;
        let member = self.member_repo.get_by_id_on(&txn, member_id).await?;

        lifecycle::next_status(&member, Transition::Renew)?;
        let previous_due = lifecycle::require_due_date(&member)?;
        let seen_due = member.due_date.as_deref().unwrap_or_default();
        let new_due = add_days(previous_due, self.policy.billing_cycle_days);

        if !self
            .member_repo
            .renew(&txn, member_id, member.status, seen_due, format_due_date(new_due))
            .await?
        {
            warn!(member_id, "Member changed during renewal");
            return Err(AppError::State(format!(
                "Member {member_id} changed concurrently; retry the renewal"
            )));
        }

        let remarks = remarks
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_RENEWAL_REMARKS);
        let transaction_id = self.id_gen.generate_transaction_id();
        let income = self
            .insert_income(&txn, member_id, amount, today, Some(remarks), &transaction_id)
            .await?;

        self.notifications
            .emit(
                &txn,
                member_id,
                &format!("Fee received. Membership renewed until {new_due}."),
                today,
            )
            .await?;

        let member = self.member_repo.get_by_id_on(&txn, member_id).await?;
        lifecycle::commit(txn).await?;

        info!(member_id, %previous_due, %new_due, amount, %transaction_id, "Membership renewed");
        Ok(RenewalReceipt {
            member,
            income,
            previous_due,
            new_due,
        })
    }

    /// Record a ledger entry on its own.
    pub async fn record_income(
        &self,
        member_id: &str,
        amount: i64,
        date: NaiveDate,
        remarks: Option<&str>,
        transaction_id: &str,
    ) -> AppResult<income::Model> {
        if amount <= 0 {
            return Err(AppError::Validation("Amount must be positive".to_string()));
        }
        if transaction_id.trim().is_empty() {
            return Err(AppError::Validation(
                "Transaction id must not be empty".to_string(),
            ));
        }

        self.member_repo.get_by_id(member_id).await?;
        let income = self
            .insert_income(
                self.db.as_ref(),
                member_id,
                amount,
                date,
                remarks,
                transaction_id,
            )
            .await?;

        info!(member_id, amount, transaction_id, "Income recorded");
        Ok(income)
    }

    /// Ledger entries of a member, oldest first.
    pub async fn ledger(&self, member_id: &str) -> AppResult<Vec<income::Model>> {
        self.income_repo.find_by_member(member_id).await
    }

    async fn insert_income<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
        amount: i64,
        date: NaiveDate,
        remarks: Option<&str>,
        transaction_id: &str,
    ) -> AppResult<income::Model> {
        let model = income::ActiveModel {
            id: Set(self.id_gen.generate()),
            member_id: Set(member_id.to_string()),
            amount: Set(amount),
            date: Set(date),
            remarks: Set(remarks.map(String::from)),
            transaction_id: Set(transaction_id.to_string()),
        };

        self.income_repo.create(conn, model).await
    }
}
