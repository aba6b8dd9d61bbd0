//! timer.rs
//!
//! Повторяющаяся задача с явной отменой и поверх нее обратный отсчет брони.
//!
//! Каждый тик выполняется до конца, прежде чем будет запланирован следующий.
//! `stop()` идемпотентен и вызывается также при `Drop`, поэтому потерянный
//! хэндл не оставляет живой таймер, который продолжает менять состояние.

use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::hold::countdown::{HoldCountdown, HoldStatus, TickOutcome};

/// Период тика обратного отсчета.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Отменяемая задача, которая вызывает `tick` раз в `period`.
///
/// Требует запущенного tokio runtime.
pub struct ScheduledTask {
    stopped: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ScheduledTask {
    /// Первый вызов `tick` происходит через `period` после запуска.
    /// Задача останавливается сама, когда `tick` вернет `ControlFlow::Break`.
    pub fn spawn<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        // interval паникует на нулевом периоде
        let period = period.max(Duration::from_millis(1));
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = stopped.clone();

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                if tick().is_break() {
                    flag.store(true, Ordering::Release);
                    break;
                }
            }
        });

        Self {
            stopped,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Хэндл запущенного обратного отсчета брони.
#[derive(Debug)]
pub struct TimerHandle {
    countdown: Arc<Mutex<HoldCountdown>>,
    task: ScheduledTask,
}

impl TimerHandle {
    pub fn remaining_seconds(&self) -> u32 {
        self.countdown.lock().remaining_seconds()
    }

    pub fn status(&self) -> HoldStatus {
        self.countdown.lock().status()
    }

    /// Сколько декрементов уже произошло.
    pub fn ticks(&self) -> u32 {
        self.countdown.lock().ticks()
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_stopped()
    }

    /// Останавливает отсчет. Повторный вызов и вызов после истечения ничего не делают.
    pub fn stop(&self) {
        if self.countdown.lock().release() {
            debug!("Hold countdown released");
        }
        self.task.stop();
    }
}

/// Запускает отсчет с тиком в одну секунду. `on_expire` вызывается ровно один
/// раз, когда отсчет дойдет до нуля, после чего таймер останавливается.
pub fn start_hold_countdown<F>(initial_seconds: i64, on_expire: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    start_hold_countdown_with_period(initial_seconds, DEFAULT_TICK_PERIOD, on_expire)
}

pub fn start_hold_countdown_with_period<F>(
    initial_seconds: i64,
    period: Duration,
    on_expire: F,
) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    let countdown = Arc::new(Mutex::new(HoldCountdown::start(initial_seconds)));
    let shared = countdown.clone();
    let mut on_expire = Some(on_expire);

    let task = ScheduledTask::spawn(period, move || {
        // блокировка отпускается до вызова колбэка
        let outcome = shared.lock().tick();
        match outcome {
            TickOutcome::Counting { .. } => ControlFlow::Continue(()),
            TickOutcome::Expired => {
                if let Some(callback) = on_expire.take() {
                    callback();
                }
                ControlFlow::Break(())
            }
            TickOutcome::Inactive => ControlFlow::Break(()),
        }
    });

    TimerHandle { countdown, task }
}

pub fn stop_hold_countdown(handle: &TimerHandle) {
    handle.stop();
}
