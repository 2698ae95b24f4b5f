//! Seat inventory: initial layout, floor plan and consistency audit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sea_orm::{DatabaseConnection, Set};
use serde::Serialize;
use studyhall_common::{AppError, AppResult, IdGenerator, SeatLayoutConfig};
use studyhall_db::{
    entities::{
        member,
        seat::{self, SeatStatus},
    },
    repositories::{MemberRepository, SeatRepository},
};
use tracing::{info, warn};

use super::lifecycle;

/// A seat together with whoever holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FloorPlanEntry {
    pub seat: seat::Model,
    pub holder_id: Option<String>,
}

/// A breach of the seat/member occupancy invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    /// Seat is marked taken but no member references it.
    OrphanedSeat { seat_label: String },
    /// A member references a seat that is marked available.
    HolderOfAvailableSeat { seat_label: String, member_id: String },
    /// A member references a seat id that does not exist.
    DanglingReference { member_id: String, seat_id: String },
    /// A held seat's `Occupied`/`Mercy` flag disagrees with its holder's mercy days.
    MercyMismatch {
        seat_label: String,
        member_id: String,
        expected: SeatStatus,
        found: SeatStatus,
    },
}

/// Seat inventory service.
#[derive(Clone)]
pub struct SeatService {
    db: Arc<DatabaseConnection>,
    seat_repo: SeatRepository,
    member_repo: MemberRepository,
    id_gen: IdGenerator,
}

impl SeatService {
    /// Create a new seat service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        seat_repo: SeatRepository,
        member_repo: MemberRepository,
    ) -> Self {
        Self {
            db,
            seat_repo,
            member_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create the configured seat map if there are no seats yet.
    ///
    /// Returns the number of seats created. When another process seeds the
    /// same labels first, this one backs off and reports zero.
    pub async fn seed_if_empty(&self, layout: &SeatLayoutConfig) -> AppResult<u64> {
        let prefix = layout.prefix.trim();
        if prefix.is_empty() {
            return Err(AppError::Config("Seat prefix must not be empty".to_string()));
        }
        let count = i32::try_from(layout.count)
            .map_err(|_| AppError::Config(format!("Seat count {} is too large", layout.count)))?;

        let txn = lifecycle::begin(&self.db).await?;
        if self.seat_repo.count(&txn).await? > 0 {
            return Ok(0);
        }

        let seats = (1..=count)
            .map(|n| {
                let has_locker =
                    layout.locker_every > 0 && n.unsigned_abs() % layout.locker_every == 0;
                seat::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    label: Set(format!("{prefix}-{n}")),
                    position: Set(n),
                    has_locker: Set(has_locker),
                    status: Set(SeatStatus::Available),
                }
            })
            .collect::<Vec<_>>();

        if !self.seat_repo.insert_many(&txn, seats).await? {
            info!(prefix, "Seat map was created concurrently");
            return Ok(0);
        }
        lifecycle::commit(txn).await?;
        info!(prefix, count, "Seat map created");

        Ok(u64::from(layout.count))
    }

    /// All seats in floor-plan order.
    pub async fn list(&self) -> AppResult<Vec<seat::Model>> {
        self.seat_repo.find_all().await
    }

    /// Seats nobody holds.
    pub async fn available(&self) -> AppResult<Vec<seat::Model>> {
        self.seat_repo.find_available().await
    }

    /// Every seat with the id of its holder.
    pub async fn floor_plan(&self) -> AppResult<Vec<FloorPlanEntry>> {
        let seats = self.seat_repo.find_all().await?;
        let holders = self.holders_by_seat().await?;

        Ok(seats
            .into_iter()
            .map(|seat| {
                let holder_id = holders.get(&seat.id).map(|m| m.id.clone());
                FloorPlanEntry { seat, holder_id }
            })
            .collect())
    }

    /// Every violation of the occupancy invariant; empty when consistent.
    pub async fn audit(&self) -> AppResult<Vec<InvariantViolation>> {
        let seats = self.seat_repo.find_all().await?;
        let holders = self.holders_by_seat().await?;
        let seat_ids: HashSet<&str> = seats.iter().map(|s| s.id.as_str()).collect();
        let mut violations = Vec::new();

        for seat in &seats {
            match (seat.status.is_taken(), holders.get(&seat.id)) {
                (true, None) => violations.push(InvariantViolation::OrphanedSeat {
                    seat_label: seat.label.clone(),
                }),
                (false, Some(holder)) => {
                    violations.push(InvariantViolation::HolderOfAvailableSeat {
                        seat_label: seat.label.clone(),
                        member_id: holder.id.clone(),
                    });
                }
                (true, Some(holder)) => {
                    let expected = SeatStatus::held_with_mercy(holder.mercy_days);
                    if seat.status != expected {
                        violations.push(InvariantViolation::MercyMismatch {
                            seat_label: seat.label.clone(),
                            member_id: holder.id.clone(),
                            expected,
                            found: seat.status,
                        });
                    }
                }
                (false, None) => {}
            }
        }

        for (seat_id, holder) in &holders {
            if !seat_ids.contains(seat_id.as_str()) {
                violations.push(InvariantViolation::DanglingReference {
                    member_id: holder.id.clone(),
                    seat_id: seat_id.clone(),
                });
            }
        }

        if !violations.is_empty() {
            warn!(count = violations.len(), "Seat map is inconsistent");
        }
        Ok(violations)
    }

    async fn holders_by_seat(&self) -> AppResult<HashMap<String, member::Model>> {
        Ok(self
            .member_repo
            .find_seat_holders()
            .await?
            .into_iter()
            .filter_map(|m| m.assigned_seat_id.clone().map(|seat_id| (seat_id, m)))
            .collect())
    }
}
