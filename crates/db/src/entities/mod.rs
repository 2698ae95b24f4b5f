//! Database entities.

#![allow(missing_docs)]

pub mod income;
pub mod member;
pub mod notification;
pub mod seat;
pub mod seat_move_request;

pub use income::Entity as Income;
pub use member::Entity as Member;
pub use notification::Entity as Notification;
pub use seat::Entity as Seat;
pub use seat_move_request::Entity as SeatMoveRequest;
