//! countdown.rs
//!
//! Чистая машина состояний обратного отсчета для временной брони мест.
//! Никаких таймеров внутри: каждый тик вызывается снаружи (см. `hold::timer`),
//! поэтому переходы проверяются без реального времени.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldStatus {
    /// Бронь еще не запрошена.
    Idle,
    /// Бронь получена, отсчет идет.
    Active,
    /// Отсчет дошел до нуля.
    Expired,
    /// Бронь снята явно: оплата прошла или пользователь ушел.
    Released,
}

/// Результат одного тика.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Counting { remaining_seconds: u32 },
    Expired,
    /// Отсчет не активен, тик проигнорирован.
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldCountdown {
    status: HoldStatus,
    remaining_seconds: u32,
    ticks: u32,
}

impl Default for HoldCountdown {
    fn default() -> Self {
        Self::new()
    }
}

impl HoldCountdown {
    pub fn new() -> Self {
        Self {
            status: HoldStatus::Idle,
            remaining_seconds: 0,
            ticks: 0,
        }
    }

    /// Idle -> Active. Начальное значение приходит от сервиса бронирования (TTL).
    /// Значение <= 0 истечет на первом же тике.
    pub fn start(initial_seconds: i64) -> Self {
        let remaining_seconds = u32::try_from(initial_seconds.max(0)).unwrap_or(u32::MAX);
        Self {
            status: HoldStatus::Active,
            remaining_seconds,
            ticks: 0,
        }
    }

    pub fn status(&self) -> HoldStatus {
        self.status
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Сколько декрементов было сделано с момента старта.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn is_active(&self) -> bool {
        self.status == HoldStatus::Active
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.status != HoldStatus::Active {
            return TickOutcome::Inactive;
        }

        self.ticks += 1;
        if self.remaining_seconds > 1 {
            self.remaining_seconds -= 1;
            TickOutcome::Counting {
                remaining_seconds: self.remaining_seconds,
            }
        } else {
            self.remaining_seconds = 0;
            self.status = HoldStatus::Expired;
            TickOutcome::Expired
        }
    }

    /// Active -> Released. Возвращает `true`, если бронь действительно была активна.
    pub fn release(&mut self) -> bool {
        if self.status == HoldStatus::Active {
            self.status = HoldStatus::Released;
            true
        } else {
            false
        }
    }
}
