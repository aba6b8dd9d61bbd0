pub mod seat;
pub mod hold;
pub mod combo;

pub use seat::{Pairing, Seat, SeatId, SeatKey, SeatRecord, SeatStatus, SeatType};
pub use hold::HoldSession;
pub use combo::Combo;
