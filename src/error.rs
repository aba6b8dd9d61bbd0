//! Ошибки HTTP-слоя и их отображение в ответы.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::booking::BookingError;
use crate::services::inventory::InventoryError;

/// Тело ответа с ошибкой.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Код для программной обработки
    pub code: String,
    pub message: String,
    /// Есть ли смысл повторить запрос
    pub retryable: bool,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl AppError {
    pub fn flow_not_found(id: uuid::Uuid) -> Self {
        AppError::NotFound(format!("Booking flow {} not found", id))
    }

    fn parts(&self) -> (StatusCode, &'static str, bool) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", false),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", false),
            AppError::Booking(e) => match e {
                BookingError::CapacityExceeded { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "CAPACITY_EXCEEDED", false)
                }
                BookingError::UnknownSeat(_) => (StatusCode::NOT_FOUND, "UNKNOWN_SEAT", false),
                BookingError::UnknownCombo(_) => (StatusCode::NOT_FOUND, "UNKNOWN_COMBO", false),
                BookingError::SeatUnavailable(_) => (StatusCode::CONFLICT, "SEAT_UNAVAILABLE", false),
                BookingError::EmptySelection => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_SELECTION", false)
                }
                // бронь можно поставить заново по новому выбору
                BookingError::SelectionChanged => (StatusCode::CONFLICT, "SELECTION_CHANGED", true),
                BookingError::SelectionLocked
                | BookingError::NoActiveHold
                | BookingError::AlreadyCompleted => (StatusCode::CONFLICT, "INVALID_STATE", false),
            },
            AppError::Inventory(e) => match e {
                InventoryError::CircuitOpen => {
                    (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE", true)
                }
                InventoryError::Status { status: 409, .. } => {
                    (StatusCode::CONFLICT, "HOLD_REJECTED", false)
                }
                InventoryError::Status { status: 404, .. } => {
                    (StatusCode::NOT_FOUND, "UPSTREAM_NOT_FOUND", false)
                }
                _ => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", true),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, retryable) = self.parts();

        if status.is_server_error() {
            tracing::error!("{}: {}", code, self);
        } else {
            tracing::debug!("{}: {}", code, self);
        }

        let body = ApiError {
            code: code.to_string(),
            message: self.to_string(),
            retryable,
        };
        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
