//! Data access repositories.

pub mod income;
pub mod member;
pub mod notification;
pub mod seat;
pub mod seat_move_request;

pub use income::IncomeRepository;
pub use member::MemberRepository;
pub use notification::NotificationRepository;
pub use seat::SeatRepository;
pub use seat_move_request::SeatMoveRequestRepository;
