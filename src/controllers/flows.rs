use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::booking::{BookingError, BookingFlow, ComboLine, FlowNotice, FlowStep};
use crate::error::AppError;
use crate::hold::HoldStatus;
use crate::models::{HoldSession, SeatId};
use crate::seating::{selectable_unit, SeatGrid};
use crate::services::inventory::SeatScope;
use crate::services::seat_map::load_grid;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/flows", post(create_flow))
        .route("/flows/{id}", get(get_flow).delete(delete_flow))
        .route("/flows/{id}/seats", patch(toggle_seat))
        .route("/flows/{id}/concessions", post(proceed_to_concessions))
        .route("/flows/{id}/seat-selection", post(back_to_seat_selection))
        .route("/flows/{id}/combos", put(set_combo))
        .route("/flows/{id}/hold", post(hold_seats))
        .route("/flows/{id}/complete", post(complete_flow))
}

/* ---------- DTO ---------- */

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFlowRequest {
    #[validate(range(min = 1))]
    pub showtime_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ToggleSeatRequest {
    #[validate(range(min = 1))]
    pub seat_id: SeatId,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetComboRequest {
    #[validate(range(min = 1))]
    pub combo_id: i64,
    #[validate(range(max = 50))]
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct HoldView {
    pub id: Uuid,
    pub seat_ids: Vec<SeatId>,
    pub status: HoldStatus,
    pub remaining_seconds: u32,
    pub acquired_at: DateTime<Utc>,
}

impl From<&HoldSession> for HoldView {
    fn from(hold: &HoldSession) -> Self {
        Self {
            id: hold.id,
            seat_ids: hold.seat_ids.clone(),
            status: hold.status(),
            remaining_seconds: hold.remaining_seconds(),
            acquired_at: hold.acquired_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FlowView {
    pub id: Uuid,
    pub showtime_id: i64,
    pub step: FlowStep,
    pub selected_seat_ids: Vec<SeatId>,
    pub seat_labels: Vec<String>,
    pub occupants: u32,
    pub max_occupants: u32,
    pub seat_total: Decimal,
    pub combos: Vec<ComboLine>,
    pub combo_total: Decimal,
    pub total: Decimal,
    pub hold: Option<HoldView>,
    pub notices: Vec<FlowNotice>,
    pub created_at: DateTime<Utc>,
}

/// Снимок процесса с ценами по текущей схеме зала.
pub fn flow_view(flow: &BookingFlow, grid: &SeatGrid) -> FlowView {
    let seat_labels = flow
        .selected_seat_ids()
        .iter()
        .filter_map(|id| selectable_unit(grid, *id))
        .map(|unit| unit.label())
        .collect();

    FlowView {
        id: flow.id(),
        showtime_id: flow.showtime_id(),
        step: flow.step(),
        selected_seat_ids: flow.selected_seat_ids().to_vec(),
        seat_labels,
        occupants: flow.occupants(grid),
        max_occupants: flow.rules().max_occupants,
        seat_total: flow.seat_total(grid),
        combos: flow.combo_lines().cloned().collect(),
        combo_total: flow.combo_total(),
        total: flow.total(grid),
        hold: flow.hold().map(HoldView::from),
        notices: flow.notices().to_vec(),
        created_at: flow.created_at(),
    }
}

/* ---------- helpers ---------- */

fn snapshot(state: &AppState, id: Uuid) -> Result<BookingFlow, AppError> {
    state.flows.snapshot(id).ok_or_else(|| AppError::flow_not_found(id))
}

async fn render(state: &AppState, flow: &BookingFlow) -> Result<Json<FlowView>, AppError> {
    let grid = load_grid(state, SeatScope::Showtime(flow.showtime_id())).await?;
    Ok(Json(flow_view(flow, &grid)))
}

/// Применяет шаг к процессу и отдает свежий снимок.
fn apply<F>(state: &AppState, id: Uuid, grid: &SeatGrid, step: F) -> Result<FlowView, AppError>
where
    F: FnOnce(&mut BookingFlow) -> Result<(), BookingError>,
{
    let flow = state
        .flows
        .update(id, |flow| step(&mut *flow).map(|()| flow.clone()))
        .ok_or_else(|| AppError::flow_not_found(id))??;
    Ok(flow_view(&flow, grid))
}

/* ---------- FLOWS ---------- */

// POST /api/flows
pub async fn create_flow(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFlowRequest>,
) -> Result<(StatusCode, Json<FlowView>), AppError> {
    req.validate()?;

    // сеанс должен существовать у сервиса бронирования
    let grid = load_grid(&state, SeatScope::Showtime(req.showtime_id)).await?;
    let flow = state.flows.create(req.showtime_id, state.booking_rules());

    Ok((StatusCode::CREATED, Json(flow_view(&flow, &grid))))
}

// GET /api/flows/{id}
pub async fn get_flow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlowView>, AppError> {
    let flow = snapshot(&state, id)?;
    render(&state, &flow).await
}

// PATCH /api/flows/{id}/seats
pub async fn toggle_seat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleSeatRequest>,
) -> Result<Json<FlowView>, AppError> {
    req.validate()?;

    let showtime_id = snapshot(&state, id)?.showtime_id();
    let grid = load_grid(&state, SeatScope::Showtime(showtime_id)).await?;

    let view = apply(&state, id, &grid, |flow| {
        flow.toggle_seat(&grid, req.seat_id).map(|_| ())
    })?;
    Ok(Json(view))
}

// POST /api/flows/{id}/concessions
pub async fn proceed_to_concessions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlowView>, AppError> {
    let showtime_id = snapshot(&state, id)?.showtime_id();
    let grid = load_grid(&state, SeatScope::Showtime(showtime_id)).await?;

    let view = apply(&state, id, &grid, BookingFlow::proceed_to_concessions)?;
    Ok(Json(view))
}

// POST /api/flows/{id}/seat-selection
pub async fn back_to_seat_selection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlowView>, AppError> {
    let showtime_id = snapshot(&state, id)?.showtime_id();
    let grid = load_grid(&state, SeatScope::Showtime(showtime_id)).await?;

    let view = apply(&state, id, &grid, |flow| {
        flow.back_to_seat_selection().map(|_| ())
    })?;
    Ok(Json(view))
}

// PUT /api/flows/{id}/combos
pub async fn set_combo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetComboRequest>,
) -> Result<Json<FlowView>, AppError> {
    req.validate()?;

    let showtime_id = snapshot(&state, id)?.showtime_id();
    let combo = state
        .inventory
        .fetch_combos()
        .await?
        .into_iter()
        .find(|combo| combo.id == req.combo_id)
        .ok_or(BookingError::UnknownCombo(req.combo_id))?;
    let grid = load_grid(&state, SeatScope::Showtime(showtime_id)).await?;

    let view = apply(&state, id, &grid, |flow| {
        flow.set_combo_quantity(&combo, req.quantity)
    })?;
    Ok(Json(view))
}

// POST /api/flows/{id}/hold
pub async fn hold_seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlowView>, AppError> {
    let flow = snapshot(&state, id)?;
    if flow.step() == FlowStep::Completed {
        return Err(BookingError::AlreadyCompleted.into());
    }

    let showtime_id = flow.showtime_id();
    let scope = SeatScope::Showtime(showtime_id);
    let grid = load_grid(&state, scope).await?;

    let seat_ids = flow.seat_ids_to_hold(&grid);
    let Some(&first_seat) = seat_ids.first() else {
        return Err(BookingError::EmptySelection.into());
    };

    state.inventory.hold_seats(showtime_id, &seat_ids).await?;
    let ttl = state.inventory.hold_ttl(showtime_id, first_seat).await?;

    let session = HoldSession::start(showtime_id, seat_ids, ttl);
    let attached = state
        .flows
        .attach_hold(id, session, flow.selected_seat_ids())
        .ok_or_else(|| AppError::flow_not_found(id))?;

    // статусы мест изменились у сервиса бронирования
    state.cache.invalidate_seats(scope).await;

    let flow = attached.inspect_err(|e| {
        if *e == BookingError::SelectionChanged {
            // бронь у инвентаря снимется сама по истечении ttl
            warn!("Flow {}: selection changed during hold, {}s upstream hold left to expire", id, ttl);
        }
    })?;

    Ok(Json(flow_view(&flow, &grid)))
}

// POST /api/flows/{id}/complete
pub async fn complete_flow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlowView>, AppError> {
    let flow = state
        .flows
        .complete(id)
        .ok_or_else(|| AppError::flow_not_found(id))??;

    info!("Flow {} checked out for showtime {}", id, flow.showtime_id());
    render(&state, &flow).await
}

// DELETE /api/flows/{id}
pub async fn delete_flow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .flows
        .remove(id)
        .ok_or_else(|| AppError::flow_not_found(id))?;
    Ok(StatusCode::NO_CONTENT)
}
