use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::models::SeatRecord;
use crate::services::inventory::SeatScope;

pub fn key(scope: SeatScope) -> String {
    format!("seats:{}", scope)
}

pub async fn load(
    mut conn: MultiplexedConnection,
    scope: SeatScope,
) -> Result<Option<Vec<SeatRecord>>, redis::RedisError> {
    let data: Option<String> = conn.get(key(scope)).await?;
    let Some(data) = data else {
        return Ok(None);
    };

    let seats: Vec<SeatRecord> = serde_json::from_str(&data).map_err(|_| {
        redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
    })?;
    Ok(Some(seats))
}

pub async fn store(
    mut conn: MultiplexedConnection,
    scope: SeatScope,
    seats: &[SeatRecord],
    ttl_seconds: u64,
) -> Result<(), redis::RedisError> {
    let data = serde_json::to_string(seats).map_err(|_| {
        redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
    })?;
    conn.set_ex(key(scope), data, ttl_seconds.max(1)).await
}
