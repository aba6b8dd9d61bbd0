//! cleanup.rs
//!
//! Фоновая очистка реестра процессов бронирования.

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::booking::FlowRegistry;
use crate::config::BookingConfig;

pub struct CleanupService {
    flows: Weak<FlowRegistry>,
    idle_for: Duration,
    interval: Duration,
}

impl CleanupService {
    pub fn new(flows: &Arc<FlowRegistry>, config: &BookingConfig) -> Self {
        Self {
            flows: Arc::downgrade(flows),
            idle_for: config.flow_idle_timeout(),
            interval: config.flow_cleanup_interval(),
        }
    }

    /// Один проход очистки. `None`, если реестра уже нет.
    pub fn run_cleanup(&self) -> Option<usize> {
        let flows = self.flows.upgrade()?;
        let evicted = flows.evict_idle(self.idle_for);
        if evicted > 0 {
            info!("Evicted {} idle booking flows, {} left", evicted, flows.len());
        } else {
            debug!("No idle booking flows to evict");
        }
        Some(evicted)
    }

    /// Запускает очистку раз в `interval`. Цикл завершается вместе с реестром.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            "Flow cleanup every {}s, idle timeout {}s",
            self.interval.as_secs(),
            self.idle_for.as_secs()
        );
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(self.interval).await;
                if self.run_cleanup().is_none() {
                    break;
                }
            }
        })
    }
}
