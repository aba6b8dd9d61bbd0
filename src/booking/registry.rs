//! registry.rs
//!
//! Хранилище активных процессов бронирования вместе с их таймерами брони.
//!
//! Таймер каждого процесса останавливается синхронно на любом выходе из
//! активной брони: оплата, уход пользователя, новая бронь, удаление процесса
//! или истечение времени.
//!
//! Процессы без активной брони, которые долго не трогали, удаляются
//! через `evict_idle` (см. `services::cleanup`).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::booking::flow::{BookingError, BookingFlow, BookingRules};
use crate::hold::{ScheduledTask, TickOutcome, DEFAULT_TICK_PERIOD};
use crate::models::{HoldSession, SeatId};

struct FlowEntry {
    flow: BookingFlow,
    clock: Option<ScheduledTask>,
    last_activity: Instant,
}

impl FlowEntry {
    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Процесс можно удалить: брони нет, и его не трогали `idle_for`.
    fn is_idle(&self, idle_for: Duration) -> bool {
        !self.flow.has_active_hold() && self.last_activity.elapsed() >= idle_for
    }
}

pub struct FlowRegistry {
    flows: Mutex<HashMap<Uuid, FlowEntry>>,
    tick_period: Duration,
}

impl FlowRegistry {
    pub fn new(tick_period: Duration) -> Arc<Self> {
        Arc::new(Self {
            flows: Mutex::new(HashMap::new()),
            tick_period,
        })
    }

    pub fn with_default_period() -> Arc<Self> {
        Self::new(DEFAULT_TICK_PERIOD)
    }

    pub fn create(&self, showtime_id: i64, rules: BookingRules) -> BookingFlow {
        let flow = BookingFlow::new(showtime_id, rules);
        info!("Flow {} created for showtime {}", flow.id(), showtime_id);
        self.flows.lock().insert(
            flow.id(),
            FlowEntry {
                flow: flow.clone(),
                clock: None,
                last_activity: Instant::now(),
            },
        );
        flow
    }

    pub fn snapshot(&self, id: Uuid) -> Option<BookingFlow> {
        self.flows.lock().get(&id).map(|entry| entry.flow.clone())
    }

    /// Выполняет `f` над процессом под блокировкой. `None`, если процесса нет.
    pub fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut BookingFlow) -> R) -> Option<R> {
        let mut flows = self.flows.lock();
        let entry = flows.get_mut(&id)?;
        let result = f(&mut entry.flow);
        entry.touch();
        // шаг мог снять бронь (например, возврат к выбору мест)
        if !entry.flow.has_active_hold() {
            entry.clock = None;
        }
        Some(result)
    }

    /// Прикрепляет бронь и запускает ее отсчет. Старый таймер останавливается.
    ///
    /// `held_selection` это выбор, с которого снималась бронь у инвентаря.
    /// Если он успел измениться, возвращается `SelectionChanged`.
    pub fn attach_hold(
        self: &Arc<Self>,
        id: Uuid,
        session: HoldSession,
        held_selection: &[SeatId],
    ) -> Option<Result<BookingFlow, BookingError>> {
        let mut flows = self.flows.lock();
        let entry = flows.get_mut(&id)?;

        let hold_id = session.id;
        if let Err(e) = entry.flow.attach_hold(session, held_selection) {
            return Some(Err(e));
        }

        // drop старого ScheduledTask останавливает его
        entry.clock = Some(self.spawn_clock(id, hold_id));
        entry.touch();
        Some(Ok(entry.flow.clone()))
    }

    /// Оплата прошла: бронь снимается, таймер останавливается.
    pub fn complete(&self, id: Uuid) -> Option<Result<BookingFlow, BookingError>> {
        let mut flows = self.flows.lock();
        let entry = flows.get_mut(&id)?;
        let result = entry.flow.complete().map(|_| entry.flow.clone());
        if result.is_ok() {
            entry.clock = None;
            entry.touch();
        }
        Some(result)
    }

    /// Удаляет процесс, снимая бронь и останавливая таймер.
    pub fn remove(&self, id: Uuid) -> Option<BookingFlow> {
        let mut entry = self.flows.lock().remove(&id)?;
        entry.flow.abandon();
        if let Some(clock) = entry.clock.take() {
            clock.stop();
        }
        info!("Flow {} removed", id);
        Some(entry.flow)
    }

    /// Удаляет процессы без активной брони, простоявшие `idle_for`:
    /// оплаченные, с истекшей или снятой бронью и брошенные на выборе мест.
    /// Возвращает количество удаленных.
    pub fn evict_idle(&self, idle_for: Duration) -> usize {
        let mut flows = self.flows.lock();
        let before = flows.len();
        flows.retain(|id, entry| {
            if !entry.is_idle(idle_for) {
                return true;
            }
            debug!("Flow {} evicted at step {:?}", id, entry.flow.step());
            false
        });
        before - flows.len()
    }

    pub fn len(&self) -> usize {
        self.flows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.lock().is_empty()
    }

    /// Количество запущенных таймеров брони.
    pub fn running_clocks(&self) -> usize {
        self.flows
            .lock()
            .values()
            .filter(|entry| entry.clock.as_ref().is_some_and(|c| !c.is_stopped()))
            .count()
    }

    fn spawn_clock(self: &Arc<Self>, id: Uuid, hold_id: Uuid) -> ScheduledTask {
        let registry: Weak<Self> = Arc::downgrade(self);
        ScheduledTask::spawn(self.tick_period, move || match registry.upgrade() {
            Some(registry) => registry.tick(id, hold_id),
            None => ControlFlow::Break(()),
        })
    }

    fn tick(&self, id: Uuid, hold_id: Uuid) -> ControlFlow<()> {
        let mut flows = self.flows.lock();
        let Some(entry) = flows.get_mut(&id) else {
            return ControlFlow::Break(());
        };
        // тик старого таймера, который успел начаться до замены брони
        if entry.flow.hold().map(|h| h.id) != Some(hold_id) {
            return ControlFlow::Break(());
        }

        match entry.flow.tick_hold() {
            TickOutcome::Counting { remaining_seconds } => {
                debug!("Flow {}: hold has {}s left", id, remaining_seconds);
                ControlFlow::Continue(())
            }
            TickOutcome::Expired | TickOutcome::Inactive => {
                // простой считается с момента истечения
                entry.touch();
                entry.clock = None;
                ControlFlow::Break(())
            }
        }
    }
}

impl std::fmt::Debug for FlowRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowRegistry")
            .field("flows", &self.len())
            .field("tick_period", &self.tick_period)
            .finish()
    }
}
