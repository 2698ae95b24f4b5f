//! Common utilities and shared types for studyhall.
//!
//! This crate provides foundational components used across all studyhall crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Clock**: Injectable calendar source via [`Clock`]
//!
//! # Example
//!
//! ```no_run
//! use studyhall_common::{AppResult, Clock, Config, IdGenerator, SystemClock};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID {} on {}", id, SystemClock.today());
//!     println!("Billing cycle: {} days", config.membership.billing_cycle_days);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod id;

pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use config::{Config, MembershipConfig, SeatLayoutConfig};
pub use error::{AppError, AppResult, ErrorKind};
pub use id::IdGenerator;
