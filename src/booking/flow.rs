//! flow.rs
//!
//! Состояние одного процесса бронирования (касса или покупатель):
//! выбор мест, комбо, временная бронь и ее истечение.
//!
//! Все переходы явные и синхронные. Таймер живет снаружи (`FlowRegistry`)
//! и только вызывает `tick_hold()` раз в секунду.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::hold::TickOutcome;
use crate::models::{Combo, HoldSession, SeatId};
use crate::seating::{occupants_for_selection, price_for_selection, selectable_unit, SeatGrid};

/// Максимум зрителей в одном бронировании по умолчанию.
pub const DEFAULT_MAX_OCCUPANTS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingRules {
    pub max_occupants: u32,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            max_occupants: DEFAULT_MAX_OCCUPANTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    SeatSelection,
    Concessions,
    Checkout,
    Completed,
}

/// Уведомления, которые нужно показать пользователю.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowNotice {
    HoldExpired {
        showtime_id: i64,
        seat_ids: Vec<SeatId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Selected(SeatId),
    Deselected(SeatId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error("Seat {0} is not part of this seat map")]
    UnknownSeat(SeatId),
    #[error("Seat {0} is not available")]
    SeatUnavailable(SeatId),
    #[error("Selection would seat {requested} people, at most {limit} are allowed per booking")]
    CapacityExceeded { limit: u32, requested: u32 },
    #[error("No seats selected")]
    EmptySelection,
    #[error("Seats can only be changed during seat selection")]
    SelectionLocked,
    #[error("Seat selection changed while the hold was being placed")]
    SelectionChanged,
    #[error("Combo {0} is not on the menu")]
    UnknownCombo(i64),
    #[error("There is no active seat hold")]
    NoActiveHold,
    #[error("Booking is already completed")]
    AlreadyCompleted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComboLine {
    pub combo_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl ComboLine {
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingFlow {
    id: Uuid,
    showtime_id: i64,
    step: FlowStep,
    // id первых мест выбранных единиц, в порядке выбора
    selected: Vec<SeatId>,
    combos: BTreeMap<i64, ComboLine>,
    hold: Option<HoldSession>,
    notices: Vec<FlowNotice>,
    #[serde(skip)]
    rules: BookingRules,
    created_at: DateTime<Utc>,
}

impl BookingFlow {
    pub fn new(showtime_id: i64, rules: BookingRules) -> Self {
        Self {
            id: Uuid::new_v4(),
            showtime_id,
            step: FlowStep::SeatSelection,
            selected: Vec::new(),
            combos: BTreeMap::new(),
            hold: None,
            notices: Vec::new(),
            rules,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn showtime_id(&self) -> i64 {
        self.showtime_id
    }

    pub fn step(&self) -> FlowStep {
        self.step
    }

    pub fn selected_seat_ids(&self) -> &[SeatId] {
        &self.selected
    }

    pub fn combo_lines(&self) -> impl Iterator<Item = &ComboLine> {
        self.combos.values()
    }

    pub fn hold(&self) -> Option<&HoldSession> {
        self.hold.as_ref()
    }

    pub fn notices(&self) -> &[FlowNotice] {
        &self.notices
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn rules(&self) -> BookingRules {
        self.rules
    }

    /// Выбирает или снимает единицу по id любого из ее мест.
    /// При ошибке состояние не меняется.
    pub fn toggle_seat(
        &mut self,
        grid: &SeatGrid,
        seat_id: SeatId,
    ) -> Result<SelectionChange, BookingError> {
        self.ensure_not_completed()?;
        if self.step != FlowStep::SeatSelection {
            return Err(BookingError::SelectionLocked);
        }

        let unit = selectable_unit(grid, seat_id).ok_or(BookingError::UnknownSeat(seat_id))?;
        let primary_id = unit.primary.id;

        if let Some(pos) = self.selected.iter().position(|id| *id == primary_id) {
            self.selected.remove(pos);
            debug!("Flow {}: seat {} deselected", self.id, unit.label());
            return Ok(SelectionChange::Deselected(primary_id));
        }

        if !unit.status().is_selectable() {
            return Err(BookingError::SeatUnavailable(primary_id));
        }

        let current = occupants_for_selection(&self.selected, grid);
        let requested = current + unit.occupants();
        if requested > self.rules.max_occupants {
            return Err(BookingError::CapacityExceeded {
                limit: self.rules.max_occupants,
                requested,
            });
        }

        self.selected.push(primary_id);
        self.notices.clear();
        debug!("Flow {}: seat {} selected ({} occupants)", self.id, unit.label(), requested);
        Ok(SelectionChange::Selected(primary_id))
    }

    /// Переход к выбору еды и напитков.
    pub fn proceed_to_concessions(&mut self) -> Result<(), BookingError> {
        self.ensure_not_completed()?;
        if self.selected.is_empty() {
            return Err(BookingError::EmptySelection);
        }
        if self.step == FlowStep::SeatSelection {
            self.step = FlowStep::Concessions;
        }
        Ok(())
    }

    /// Возврат к выбору мест. Активная бронь при этом снимается.
    pub fn back_to_seat_selection(&mut self) -> Result<Option<HoldSession>, BookingError> {
        self.ensure_not_completed()?;
        let released = self.release_hold();
        self.step = FlowStep::SeatSelection;
        Ok(released)
    }

    /// Количество 0 убирает позицию.
    pub fn set_combo_quantity(&mut self, combo: &Combo, quantity: u32) -> Result<(), BookingError> {
        self.ensure_not_completed()?;
        if quantity == 0 {
            self.combos.remove(&combo.id);
        } else {
            self.combos.insert(
                combo.id,
                ComboLine {
                    combo_id: combo.id,
                    name: combo.name.clone(),
                    unit_price: combo.price,
                    quantity,
                },
            );
        }
        Ok(())
    }

    /// Все id мест под бронь, включая партнеров парных мест.
    pub fn seat_ids_to_hold(&self, grid: &SeatGrid) -> Vec<SeatId> {
        self.selected
            .iter()
            .filter_map(|id| selectable_unit(grid, *id))
            .flat_map(|unit| unit.seat_ids())
            .collect()
    }

    /// Прикрепляет новую бронь и переводит процесс к оплате.
    /// Предыдущая бронь, если была, снимается и возвращается.
    ///
    /// `held_selection` это выбор, по которому бронь ставилась у инвентаря.
    /// Если с тех пор выбор изменился, бронь не прикрепляется.
    pub fn attach_hold(
        &mut self,
        session: HoldSession,
        held_selection: &[SeatId],
    ) -> Result<Option<HoldSession>, BookingError> {
        self.ensure_not_completed()?;
        if self.selected.is_empty() {
            return Err(BookingError::EmptySelection);
        }
        if self.selected != held_selection {
            return Err(BookingError::SelectionChanged);
        }

        let previous = self.release_hold();
        info!(
            "Flow {}: hold {} attached for {} seats, ttl={}s",
            self.id,
            session.id,
            session.seat_ids.len(),
            session.remaining_seconds()
        );
        self.hold = Some(session);
        self.notices.clear();
        self.step = FlowStep::Checkout;
        Ok(previous)
    }

    /// Один тик отсчета брони. При истечении выбор сбрасывается и процесс
    /// возвращается к выбору мест.
    pub fn tick_hold(&mut self) -> TickOutcome {
        let outcome = match self.hold.as_mut() {
            Some(hold) => hold.tick(),
            None => TickOutcome::Inactive,
        };

        if outcome == TickOutcome::Expired {
            self.expire_hold();
        }
        outcome
    }

    fn expire_hold(&mut self) {
        let Some(hold) = self.hold.as_ref() else {
            return;
        };

        info!("Flow {}: hold {} expired, returning to seat selection", self.id, hold.id);
        self.notices.push(FlowNotice::HoldExpired {
            showtime_id: hold.showtime_id,
            seat_ids: hold.seat_ids.clone(),
        });
        self.selected.clear();
        self.combos.clear();
        self.step = FlowStep::SeatSelection;
    }

    /// Оплата прошла: бронь снимается, процесс завершен.
    pub fn complete(&mut self) -> Result<HoldSession, BookingError> {
        self.ensure_not_completed()?;
        let released = self.release_hold().ok_or(BookingError::NoActiveHold)?;
        self.step = FlowStep::Completed;
        info!("Flow {}: completed with hold {}", self.id, released.id);
        Ok(released)
    }

    /// Пользователь ушел: активная бронь снимается.
    pub fn abandon(&mut self) -> Option<HoldSession> {
        let released = self.release_hold();
        if let Some(hold) = &released {
            info!("Flow {}: abandoned, hold {} released", self.id, hold.id);
        }
        released
    }

    // Возвращает копию брони, только если она была активна
    fn release_hold(&mut self) -> Option<HoldSession> {
        let hold = self.hold.as_mut()?;
        if hold.release() {
            Some(hold.clone())
        } else {
            None
        }
    }

    pub fn has_active_hold(&self) -> bool {
        self.hold.as_ref().is_some_and(HoldSession::is_active)
    }

    pub fn occupants(&self, grid: &SeatGrid) -> u32 {
        occupants_for_selection(&self.selected, grid)
    }

    pub fn seat_total(&self, grid: &SeatGrid) -> Decimal {
        price_for_selection(&self.selected, grid)
    }

    pub fn combo_total(&self) -> Decimal {
        self.combos.values().map(ComboLine::total).sum()
    }

    pub fn total(&self, grid: &SeatGrid) -> Decimal {
        self.seat_total(grid) + self.combo_total()
    }

    fn ensure_not_completed(&self) -> Result<(), BookingError> {
        if self.step == FlowStep::Completed {
            Err(BookingError::AlreadyCompleted)
        } else {
            Ok(())
        }
    }
}
