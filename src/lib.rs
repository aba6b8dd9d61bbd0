pub mod booking;
pub mod cache;
pub mod config;
pub mod controllers;
pub mod error;
pub mod hold;
pub mod models;
pub mod seating;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use booking::{BookingRules, FlowRegistry};
use cache::CacheService;
use config::Config;
use services::cleanup::CleanupService;
use services::inventory::InventoryClient;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub inventory: InventoryClient,
    pub cache: CacheService,
    pub flows: Arc<FlowRegistry>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let inventory = InventoryClient::from_config(&config.inventory, &config.circuit_breaker)?;

        let cache = match config.redis.url.as_deref() {
            Some(url) => CacheService::connect(url, config.redis.seat_cache_ttl_seconds).await?,
            None => {
                info!("REDIS_URL not set, seat cache disabled");
                CacheService::disabled()
            }
        };

        let state = Self::with_parts(config, inventory, cache);
        CleanupService::new(&state.flows, &state.config.booking).spawn();
        Ok(state)
    }

    /// Состояние из готовых частей, без сетевых подключений и фоновой очистки.
    pub fn with_parts(config: Config, inventory: InventoryClient, cache: CacheService) -> Arc<Self> {
        let flows = FlowRegistry::new(config.booking.hold_tick_period());
        Arc::new(Self {
            config,
            inventory,
            cache,
            flows,
        })
    }

    pub fn booking_rules(&self) -> BookingRules {
        BookingRules {
            max_occupants: self.config.booking.max_occupants,
        }
    }
}

/// Полный роутер приложения.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Cinema Seating API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // схему зала открывает веб-касса с другого origin
        .layer(CorsLayer::permissive())
}
