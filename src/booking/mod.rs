//! Процесс бронирования: выбор мест, комбо и жизненный цикл временной брони.

pub mod flow;
pub mod registry;

pub use flow::{
    BookingError, BookingFlow, BookingRules, ComboLine, FlowNotice, FlowStep, SelectionChange,
    DEFAULT_MAX_OCCUPANTS,
};
pub use registry::FlowRegistry;
