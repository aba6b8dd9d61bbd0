use tracing::debug;

use crate::seating::{build_grid, ingest_seats, SeatGrid};
use crate::services::inventory::{InventoryError, SeatScope};
use crate::AppState;

/// Загружает места (кеш, затем сервис бронирования) и строит схему заново.
pub async fn load_grid(state: &AppState, scope: SeatScope) -> Result<SeatGrid, InventoryError> {
    let records = match state.cache.get_seats(scope).await {
        Some(records) => {
            debug!("Seat cache hit for {}", scope);
            records
        }
        None => {
            let records = state.inventory.fetch_seats(scope).await?;
            state.cache.save_seats(scope, &records).await;
            records
        }
    };

    let seats = ingest_seats(&records, &state.config.booking.couple_markers);
    Ok(build_grid(&seats))
}
