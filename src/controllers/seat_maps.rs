use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Pairing, SeatId, SeatStatus};
use crate::seating::{units_for_row, SeatGrid, SeatUnit};
use crate::services::inventory::SeatScope;
use crate::services::seat_map::load_grid;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/showtimes/{id}/seat-map", get(showtime_seat_map))
        .route("/rooms/{id}/seat-map", get(room_seat_map))
}

/// Статус единицы на схеме. `Selected` есть только в представлении.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisplayStatus {
    Empty,
    Reserved,
    Disabled,
    Selected,
}

impl From<SeatStatus> for DisplayStatus {
    fn from(status: SeatStatus) -> Self {
        match status {
            SeatStatus::Empty => DisplayStatus::Empty,
            SeatStatus::Reserved => DisplayStatus::Reserved,
            SeatStatus::Disabled => DisplayStatus::Disabled,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnitView {
    pub label: String,
    pub column: u32,
    pub span: u32,
    pub pairing: Pairing,
    pub seat_ids: Vec<SeatId>,
    pub seat_type: String,
    pub price: Decimal,
    pub status: DisplayStatus,
}

#[derive(Debug, Serialize)]
pub struct RowView {
    pub label: char,
    pub couple: bool,
    pub units: Vec<UnitView>,
}

#[derive(Debug, Serialize)]
pub struct SeatMapView {
    pub row_count: usize,
    pub column_count: u32,
    pub couple_row_width: u32,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Deserialize)]
pub struct SeatMapQuery {
    pub flow_id: Option<Uuid>,
}

fn unit_view(unit: &SeatUnit, selected: &HashSet<SeatId>) -> UnitView {
    let status = if selected.contains(&unit.primary.id) {
        DisplayStatus::Selected
    } else {
        unit.status().into()
    };

    UnitView {
        label: unit.label(),
        column: unit.primary.column_number,
        span: unit.span(),
        pairing: unit.pairing,
        seat_ids: unit.seat_ids(),
        seat_type: unit.primary.seat_type.name.clone(),
        price: unit.price(),
        status,
    }
}

/// Схема для отрисовки: ряды сверху вниз, единицы слева направо.
/// `selected` содержит id мест, которые отмечаются как выбранные.
pub fn seat_map_view(grid: &SeatGrid, selected: &[SeatId]) -> SeatMapView {
    let selected: HashSet<SeatId> = selected.iter().copied().collect();

    let rows = grid
        .row_labels()
        .into_iter()
        .map(|label| RowView {
            label,
            couple: grid.is_couple_row(label),
            units: units_for_row(grid, label)
                .iter()
                .map(|unit| unit_view(unit, &selected))
                .collect(),
        })
        .collect();

    SeatMapView {
        row_count: grid.row_count(),
        column_count: grid.column_count(),
        couple_row_width: grid.couple_row_width(),
        rows,
    }
}

// GET /api/showtimes/{id}/seat-map
pub async fn showtime_seat_map(
    State(state): State<Arc<AppState>>,
    Path(showtime_id): Path<i64>,
    Query(params): Query<SeatMapQuery>,
) -> Result<Json<SeatMapView>, AppError> {
    let selected = match params.flow_id {
        Some(flow_id) => {
            let flow = state
                .flows
                .snapshot(flow_id)
                .ok_or_else(|| AppError::flow_not_found(flow_id))?;
            if flow.showtime_id() != showtime_id {
                return Err(AppError::BadRequest(format!(
                    "Booking flow {} belongs to showtime {}",
                    flow_id,
                    flow.showtime_id()
                )));
            }
            Some(flow)
        }
        None => None,
    };

    let grid = load_grid(&state, SeatScope::Showtime(showtime_id)).await?;
    let selected_ids = selected
        .map(|flow| flow.seat_ids_to_hold(&grid))
        .unwrap_or_default();

    Ok(Json(seat_map_view(&grid, &selected_ids)))
}

// GET /api/rooms/{id}/seat-map
pub async fn room_seat_map(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
) -> Result<Json<SeatMapView>, AppError> {
    let grid = load_grid(&state, SeatScope::Room(room_id)).await?;
    Ok(Json(seat_map_view(&grid, &[])))
}
