//! Core business logic for studyhall.
//!
//! Services operate on an explicit shared [`sea_orm::DatabaseConnection`];
//! every mutating operation runs in one transaction. [`MembershipEngine`]
//! wires them together from a [`studyhall_common::Config`].

pub mod engine;
pub mod services;

pub use engine::MembershipEngine;
pub use services::*;
