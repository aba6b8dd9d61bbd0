//! inventory.rs
//!
//! Клиент внешнего сервиса бронирования (залы, места, временные брони, комбо).
//!
//! Все сетевые вызовы проходят через `CircuitBreaker`. Повторов здесь нет:
//! решение о повторе принимает вызывающая сторона.

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{CircuitBreakerConfig, InventoryConfig};
use crate::models::{Combo, SeatId, SeatRecord};
use crate::services::circuit_breaker::{CircuitBreaker, CircuitState};

/// Для чего запрашивается список мест.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeatScope {
    Showtime(i64),
    Room(i64),
}

impl SeatScope {
    fn path(self) -> String {
        match self {
            SeatScope::Showtime(id) => format!("showtimes/{}/seats", id),
            SeatScope::Room(id) => format!("rooms/{}/seats", id),
        }
    }
}

impl std::fmt::Display for SeatScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeatScope::Showtime(id) => write!(f, "showtime:{}", id),
            SeatScope::Room(id) => write!(f, "room:{}", id),
        }
    }
}

#[derive(Debug, Error)]
pub enum InventoryError {
    /// Выключатель разомкнут, запрос не отправлялся.
    #[error("Booking service is temporarily unavailable")]
    CircuitOpen,
    #[error("Booking service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Booking service answered {status} for {endpoint}: {body}")]
    Status {
        status: u16,
        endpoint: String,
        body: String,
    },
}

impl InventoryError {
    /// Сбой самого сервиса (а не отказ по бизнес-причине), учитывается выключателем.
    pub fn is_service_failure(&self) -> bool {
        match self {
            InventoryError::CircuitOpen => false,
            InventoryError::Transport(_) => true,
            InventoryError::Status { status, .. } => *status >= 500,
        }
    }
}

#[derive(Debug, Serialize)]
struct HoldSeatsRequest<'a> {
    seat_ids: &'a [SeatId],
}

#[derive(Debug, Deserialize)]
struct HoldTtlResponse {
    ttl: i64,
}

#[derive(Clone)]
pub struct InventoryClient {
    base_url: String,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl InventoryClient {
    pub fn from_config(
        config: &InventoryConfig,
        breaker: &CircuitBreakerConfig,
    ) -> Result<Self, InventoryError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(
                breaker.failure_threshold,
                breaker.timeout_seconds,
            )),
        })
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Места сеанса (со статусами и ценами) или зала (конфигурация).
    pub async fn fetch_seats(&self, scope: SeatScope) -> Result<Vec<SeatRecord>, InventoryError> {
        let seats: Vec<SeatRecord> = self.get_json(&scope.path()).await?;
        info!("Fetched {} seats for {}", seats.len(), scope);
        Ok(seats)
    }

    /// Просит сервис временно удержать места за этим процессом.
    pub async fn hold_seats(&self, showtime_id: i64, seat_ids: &[SeatId]) -> Result<(), InventoryError> {
        let endpoint = format!("showtimes/{}/holds", showtime_id);
        let url = self.url(&endpoint);
        let body = HoldSeatsRequest { seat_ids };

        info!("Holding {} seats for showtime {}", seat_ids.len(), showtime_id);

        self.execute_with_circuit_breaker(async {
            let response = self.http_client.post(&url).json(&body).send().await?;
            Self::ensure_success(response, &endpoint).await?;
            Ok::<_, InventoryError>(())
        })
        .await
    }

    /// Сколько секунд осталось у брони места. Единственный вход для отсчета.
    pub async fn hold_ttl(&self, showtime_id: i64, seat_id: SeatId) -> Result<i64, InventoryError> {
        let response: HoldTtlResponse = self
            .get_json(&format!("showtimes/{}/seats/{}/ttl", showtime_id, seat_id))
            .await?;
        Ok(response.ttl)
    }

    pub async fn fetch_combos(&self) -> Result<Vec<Combo>, InventoryError> {
        self.get_json("combos").await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, InventoryError> {
        let url = self.url(endpoint);
        self.execute_with_circuit_breaker(async {
            let response = self.http_client.get(&url).send().await?;
            let response = Self::ensure_success(response, endpoint).await?;
            Ok::<T, InventoryError>(response.json::<T>().await?)
        })
        .await
    }

    /// Выполняет операцию, пропуская её через Circuit Breaker.
    async fn execute_with_circuit_breaker<F, T>(&self, operation: F) -> Result<T, InventoryError>
    where
        F: std::future::Future<Output = Result<T, InventoryError>>,
    {
        if !self.circuit_breaker.can_execute() {
            warn!("Circuit breaker is OPEN - blocking booking service request");
            return Err(InventoryError::CircuitOpen);
        }

        match operation.await {
            Ok(result) => {
                self.circuit_breaker.record_success();
                Ok(result)
            }
            Err(e) if e.is_service_failure() => {
                error!("Booking service request failed: {}", e);
                self.circuit_breaker.record_failure();
                Err(e)
            }
            Err(e) => {
                // отказ по бизнес-причине: сервис жив
                warn!("Booking service rejected request: {}", e);
                self.circuit_breaker.record_success();
                Err(e)
            }
        }
    }

    async fn ensure_success(response: Response, endpoint: &str) -> Result<Response, InventoryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(InventoryError::Status {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
            body,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }
}
