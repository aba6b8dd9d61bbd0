//! pairing.rs
//!
//! Разбор парных ("couple") мест.
//!
//! В парном ряду адресуемы только нечетные колонки (1, 3, 5, ...). Место в
//! следующей четной колонке считается "молчаливым" партнером: оно не
//! рисуется и не выбирается отдельно, а цена пары учитывается один раз.
//!
//! Ключ пары канонический: `(id места в нечетной колонке, id места в четной)`,
//! независимо от того, какая половина попала в выбор и в каком порядке.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

use crate::models::{Pairing, Seat, SeatId, SeatStatus};
use crate::seating::SeatGrid;

/// Единица отображения и выбора: одно обычное место или пара.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatUnit {
    pub pairing: Pairing,
    pub primary: Seat,
    pub partner: Option<Seat>,
}

impl SeatUnit {
    fn single(seat: &Seat) -> Self {
        Self {
            pairing: Pairing::Single,
            primary: seat.clone(),
            partner: None,
        }
    }

    fn paired(primary: &Seat, partner: Option<&Seat>) -> Self {
        Self {
            pairing: Pairing::Paired,
            primary: primary.clone(),
            partner: partner.cloned(),
        }
    }

    /// Подпись для отображения и выбора, всегда по первому месту: "B3".
    pub fn label(&self) -> String {
        self.primary.key().to_string()
    }

    /// Сколько обычных колонок занимает единица.
    pub fn span(&self) -> u32 {
        match self.pairing {
            Pairing::Single => 1,
            Pairing::Paired => 2,
        }
    }

    pub fn occupants(&self) -> u32 {
        self.pairing.occupants()
    }

    pub fn seat_ids(&self) -> Vec<SeatId> {
        std::iter::once(self.primary.id)
            .chain(self.partner.as_ref().map(|p| p.id))
            .collect()
    }

    pub fn price(&self) -> Decimal {
        self.primary.price
    }

    fn counted_key(&self) -> (SeatId, Option<SeatId>) {
        (self.primary.id, self.partner.as_ref().map(|p| p.id))
    }

    /// Статус пары определяется худшей из двух половин.
    pub fn status(&self) -> SeatStatus {
        let statuses = std::iter::once(self.primary.status)
            .chain(self.partner.as_ref().map(|p| p.status));

        statuses.fold(SeatStatus::Empty, |acc, s| match (acc, s) {
            (SeatStatus::Disabled, _) | (_, SeatStatus::Disabled) => SeatStatus::Disabled,
            (SeatStatus::Reserved, _) | (_, SeatStatus::Reserved) => SeatStatus::Reserved,
            _ => SeatStatus::Empty,
        })
    }
}

/// Единицы ряда слева направо.
pub fn units_for_row(grid: &SeatGrid, row_label: char) -> Vec<SeatUnit> {
    if grid.is_couple_row(row_label) {
        (0..grid.couple_row_width())
            .filter_map(|unit| {
                let column = unit * 2 + 1;
                grid.seat_at(row_label, column)
                    .map(|primary| SeatUnit::paired(primary, grid.seat_at(row_label, column + 1)))
            })
            .collect()
    } else {
        (1..=grid.column_count())
            .filter_map(|column| grid.seat_at(row_label, column))
            .map(SeatUnit::single)
            .collect()
    }
}

/// Находит единицу, которую можно выбрать по id любого из ее мест.
///
/// Id партнера ведет к его паре. `None`, если место неизвестно или его
/// единица не попадает на схему (нет первого места пары, колонка за пределами ширины).
pub fn selectable_unit(grid: &SeatGrid, seat_id: SeatId) -> Option<SeatUnit> {
    let seat = grid.seat_by_id(seat_id)?;

    if grid.is_couple_row(seat.row_label) {
        let first_column = pair_first_column(seat.column_number);
        if first_column > grid.couple_row_width() * 2 {
            return None;
        }
        let primary = grid.seat_at(seat.row_label, first_column)?;
        Some(SeatUnit::paired(primary, grid.seat_at(seat.row_label, first_column + 1)))
    } else if seat.column_number <= grid.column_count() {
        Some(SeatUnit::single(seat))
    } else {
        None
    }
}

/// Сумма выбора. Пара учитывается ровно один раз, даже если в выборе
/// оказались обе ее половины.
pub fn price_for_selection(selected_seat_ids: &[SeatId], grid: &SeatGrid) -> Decimal {
    resolve_selection(selected_seat_ids, grid)
        .map(|unit| unit.price())
        .sum()
}

/// Количество зрителей в выборе: пара = 2, обычное место = 1.
pub fn occupants_for_selection(selected_seat_ids: &[SeatId], grid: &SeatGrid) -> u32 {
    resolve_selection(selected_seat_ids, grid)
        .map(|unit| unit.occupants())
        .sum()
}

/// Единицы выбора без повторов. Учитывается только то, что можно выбрать
/// на схеме: партнер без первого места пары и пары за шириной зала
/// не стоят ничего.
fn resolve_selection<'a>(
    selected_seat_ids: &'a [SeatId],
    grid: &'a SeatGrid,
) -> impl Iterator<Item = SeatUnit> + 'a {
    let mut counted: HashSet<(SeatId, Option<SeatId>)> = HashSet::new();

    selected_seat_ids
        .iter()
        .filter_map(move |id| selectable_unit(grid, *id))
        .filter(move |unit| counted.insert(unit.counted_key()))
}

fn pair_first_column(column: u32) -> u32 {
    if column % 2 == 0 {
        column.saturating_sub(1)
    } else {
        column
    }
}
