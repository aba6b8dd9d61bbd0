//! Временная бронь мест: машина состояний отсчета и таймер, который ее двигает.

pub mod countdown;
pub mod timer;

pub use countdown::{HoldCountdown, HoldStatus, TickOutcome};
pub use timer::{
    start_hold_countdown, start_hold_countdown_with_period, stop_hold_countdown, ScheduledTask,
    TimerHandle, DEFAULT_TICK_PERIOD,
};
