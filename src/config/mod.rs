use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::booking::DEFAULT_MAX_OCCUPANTS;
use crate::models::seat::DEFAULT_COUPLE_MARKERS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub redis: RedisConfig,
    pub inventory: InventoryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub booking: BookingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

// Настройки Redis. Без URL кеш схем залов выключен
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub seat_cache_ttl_seconds: u64,
}

// Внешний сервис бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

// Правила бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub max_occupants: u32,
    pub couple_markers: Vec<String>,
    pub hold_tick_millis: u64,
    /// Сколько процесс без активной брони хранится после последнего действия.
    pub flow_idle_seconds: u64,
    pub flow_cleanup_interval_seconds: u64,
}

impl BookingConfig {
    pub fn hold_tick_period(&self) -> Duration {
        Duration::from_millis(self.hold_tick_millis)
    }

    pub fn flow_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.flow_idle_seconds)
    }

    pub fn flow_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.flow_cleanup_interval_seconds.max(1))
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Собирает конфигурацию из произвольного источника переменных.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        Ok(Config {
            app: AppConfig {
                host: vars.string_or("HOST", "0.0.0.0"),
                port: vars.parse_or("PORT", 8000)?,
                environment: vars.string_or("ENVIRONMENT", "development"),
                rust_log: vars.string_or("RUST_LOG", "cinema_seating=debug,tower_http=debug"),
                log_format: vars.parse_or("LOG_FORMAT", LogFormat::Pretty)?,
            },
            redis: RedisConfig {
                url: vars.get("REDIS_URL"),
                seat_cache_ttl_seconds: vars.parse_or("SEAT_CACHE_TTL_SECONDS", 15)?,
            },
            inventory: InventoryConfig {
                base_url: vars.required("INVENTORY_BASE_URL")?,
                timeout_seconds: vars.parse_or("INVENTORY_TIMEOUT_SECONDS", 10)?,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: vars.parse_or("CIRCUIT_BREAKER_FAILURE_THRESHOLD", 5)?,
                timeout_seconds: vars.parse_or("CIRCUIT_BREAKER_TIMEOUT_SECONDS", 60)?,
            },
            booking: BookingConfig {
                max_occupants: vars.parse_or("MAX_OCCUPANTS", DEFAULT_MAX_OCCUPANTS)?,
                couple_markers: vars
                    .get("COUPLE_MARKERS")
                    .map(|raw| {
                        raw.split(',')
                            .map(str::trim)
                            .filter(|m| !m.is_empty())
                            .map(String::from)
                            .collect::<Vec<_>>()
                    })
                    // пустой список выключил бы все парные ряды
                    .filter(|markers| !markers.is_empty())
                    .unwrap_or_else(|| {
                        DEFAULT_COUPLE_MARKERS.iter().map(|m| m.to_string()).collect()
                    }),
                hold_tick_millis: vars.parse_or("HOLD_TICK_MILLIS", 1000)?,
                flow_idle_seconds: vars.parse_or("FLOW_IDLE_SECONDS", 900)?,
                flow_cleanup_interval_seconds: vars.parse_or("FLOW_CLEANUP_INTERVAL_SECONDS", 300)?,
            },
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value }),
            None => Ok(default),
        }
    }
}
