//! Схема зала: построение сетки мест, парные места и подсчет цены выбора.

pub mod grid;
pub mod ingest;
pub mod pairing;

pub use grid::{build_grid, SeatGrid};
pub use ingest::ingest_seats;
pub use pairing::{
    occupants_for_selection, price_for_selection, selectable_unit, units_for_row, SeatUnit,
};
