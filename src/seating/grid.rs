//! grid.rs
//!
//! Построение схемы зала из плоского списка мест.
//!
//! Схема (`SeatGrid`) всегда строится целиком заново при каждом изменении
//! списка мест и никогда не патчится по частям.

use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::models::{Seat, SeatId, SeatKey};

/// Производное представление зала: ряды, ширина, индекс мест и парные ряды.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeatGrid {
    row_count: usize,
    column_count: u32,
    seat_index: HashMap<SeatKey, Seat>,
    id_index: HashMap<SeatId, SeatKey>,
    couple_rows: BTreeSet<usize>,
}

impl SeatGrid {
    /// Количество различных рядов.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Ширина зала в обычных местах. Парные ряды в расчете не участвуют.
    pub fn column_count(&self) -> u32 {
        self.column_count
    }

    /// Сколько парных единиц помещается в парном ряду.
    pub fn couple_row_width(&self) -> u32 {
        self.column_count / 2
    }

    pub fn couple_rows(&self) -> &BTreeSet<usize> {
        &self.couple_rows
    }

    pub fn is_couple_row(&self, row_label: char) -> bool {
        crate::models::seat::row_index(row_label)
            .map(|idx| self.couple_rows.contains(&idx))
            .unwrap_or(false)
    }

    pub fn seat_at(&self, row_label: char, column_number: u32) -> Option<&Seat> {
        self.seat_index.get(&SeatKey::new(row_label, column_number))
    }

    pub fn seat_by_id(&self, seat_id: SeatId) -> Option<&Seat> {
        self.id_index
            .get(&seat_id)
            .and_then(|key| self.seat_index.get(key))
    }

    pub fn len(&self) -> usize {
        self.seat_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seat_index.is_empty()
    }

    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.seat_index.values()
    }

    /// Буквы рядов в порядке отображения.
    pub fn row_labels(&self) -> Vec<char> {
        let labels: BTreeSet<char> = self.seat_index.keys().map(|k| k.row).collect();
        labels.into_iter().collect()
    }
}

pub fn build_grid(seats: &[Seat]) -> SeatGrid {
    if seats.is_empty() {
        return SeatGrid::default();
    }

    // 1. Уникальные ряды
    let row_labels: BTreeSet<char> = seats.iter().map(|s| s.row_label).collect();

    // 2. Парные ряды
    let couple_rows: BTreeSet<usize> = seats
        .iter()
        .filter(|s| s.is_paired())
        .filter_map(|s| s.row_index())
        .collect();

    // 3. Ширина зала считается только по обычным рядам
    let column_count = seats
        .iter()
        .filter(|s| s.row_index().map_or(true, |idx| !couple_rows.contains(&idx)))
        .map(|s| s.column_number)
        .max()
        .unwrap_or(0);

    if column_count == 0 && !couple_rows.is_empty() {
        warn!(
            "Seat grid has {} couple rows but no ordinary row to size them; couple rows will be empty",
            couple_rows.len()
        );
    }

    // 4. Индекс мест
    let mut seat_index = HashMap::with_capacity(seats.len());
    let mut id_index = HashMap::with_capacity(seats.len());
    for seat in seats {
        let key = seat.key();
        if seat_index.contains_key(&key) {
            warn!("Duplicate seat {} (id={}) ignored", key, seat.id);
            continue;
        }
        id_index.insert(seat.id, key);
        seat_index.insert(key, seat.clone());
    }

    debug!(
        "Built seat grid: rows={}, columns={}, seats={}, couple_rows={:?}",
        row_labels.len(),
        column_count,
        seat_index.len(),
        couple_rows
    );

    SeatGrid {
        row_count: row_labels.len(),
        column_count,
        seat_index,
        id_index,
        couple_rows,
    }
}
