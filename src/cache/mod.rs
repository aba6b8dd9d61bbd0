use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tracing::{debug, info, warn};

use crate::models::SeatRecord;
use crate::services::inventory::SeatScope;

pub mod seats;

/// Кеш списков мест в Redis. Без подключения все операции - промахи.
#[derive(Clone)]
pub struct CacheService {
    conn: Option<MultiplexedConnection>,
    seat_ttl_seconds: u64,
}

impl CacheService {
    pub async fn connect(redis_url: &str, seat_ttl_seconds: u64) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_tokio_connection().await?;
        info!("Redis connected");
        Ok(Self {
            conn: Some(conn),
            seat_ttl_seconds,
        })
    }

    pub fn disabled() -> Self {
        debug!("Seat cache disabled");
        Self {
            conn: None,
            seat_ttl_seconds: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    // Получить места из кеша; ошибки Redis не критичны
    pub async fn get_seats(&self, scope: SeatScope) -> Option<Vec<SeatRecord>> {
        let conn = self.conn.clone()?;
        match seats::load(conn, scope).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Seat cache read failed for {}: {:?}", scope, e);
                None
            }
        }
    }

    pub async fn save_seats(&self, scope: SeatScope, records: &[SeatRecord]) {
        let Some(conn) = self.conn.clone() else {
            return;
        };
        if let Err(e) = seats::store(conn, scope, records, self.seat_ttl_seconds).await {
            warn!("Seat cache write failed for {}: {:?}", scope, e);
        }
    }

    // Инвалидировать кеш мест
    pub async fn invalidate_seats(&self, scope: SeatScope) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let result: Result<(), _> = conn.del(seats::key(scope)).await;
        match result {
            Ok(()) => info!("Invalidated seats cache for {}", scope),
            Err(e) => warn!("Failed to invalidate seats cache for {}: {:?}", scope, e),
        }
    }
}
