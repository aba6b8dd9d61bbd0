use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::hold::countdown::{HoldCountdown, HoldStatus, TickOutcome};
use crate::models::SeatId;

/// Временная бронь мест на один сеанс.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldSession {
    pub id: Uuid,
    pub showtime_id: i64,
    pub seat_ids: Vec<SeatId>,
    pub acquired_at: DateTime<Utc>,
    #[serde(flatten)]
    countdown: HoldCountdown,
}

impl HoldSession {
    pub fn start(showtime_id: i64, seat_ids: Vec<SeatId>, ttl_seconds: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            showtime_id,
            seat_ids,
            acquired_at: Utc::now(),
            countdown: HoldCountdown::start(ttl_seconds),
        }
    }

    pub fn status(&self) -> HoldStatus {
        self.countdown.status()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.countdown.remaining_seconds()
    }

    pub fn is_active(&self) -> bool {
        self.countdown.is_active()
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.countdown.tick()
    }

    pub fn release(&mut self) -> bool {
        self.countdown.release()
    }
}
