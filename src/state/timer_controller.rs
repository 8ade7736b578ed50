//! Durable countdown timer for a single booking
//!
//! The controller keeps the countdown in memory and writes a record holding
//! the absolute start time whenever the timer starts. After a restart the
//! remaining time is derived from that record rather than from a tick count,
//! so time spent while the process was gone is accounted for.
//!
//! Persistence is best effort: store failures are logged and the in-memory
//! countdown keeps working for the current process.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::TimerState;
use crate::{
    clock::Clock,
    store::{timer_key, KeyValueStore, PersistedTimerRecord},
};

/// Result of a single one-second tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was not running; nothing changed
    Idle,
    /// One second elapsed and time remains
    Ticked { remaining_seconds: u64 },
    /// The countdown just reached zero
    Completed,
}

/// Owns the countdown state for one booking
pub struct TimerController {
    booking_id: String,
    key: String,
    budget_seconds: u64,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    state_tx: watch::Sender<TimerState>,
    // Serializes start/stop/tick/rehydrate so ticks never interleave with each other
    op_lock: Mutex<()>,
}

impl TimerController {
    /// Create a controller in the ready state; call [`rehydrate`](Self::rehydrate) to restore a prior run
    pub fn new(
        booking_id: impl Into<String>,
        budget_seconds: u64,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let booking_id = booking_id.into();
        let (state_tx, _) = watch::channel(TimerState::ready(budget_seconds));

        Self {
            key: timer_key(&booking_id),
            booking_id,
            budget_seconds,
            store,
            clock,
            state_tx,
            op_lock: Mutex::new(()),
        }
    }

    pub fn booking_id(&self) -> &str {
        &self.booking_id
    }

    pub fn budget_seconds(&self) -> u64 {
        self.budget_seconds
    }

    /// Current state snapshot
    pub fn state(&self) -> TimerState {
        *self.state_tx.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state_tx.subscribe()
    }

    /// Start (or restart) the countdown from the full budget.
    ///
    /// Eligibility of the booking is checked by the caller. Starting while
    /// already running resets the start time.
    pub async fn start(&self) {
        let _guard = self.op_lock.lock().await;

        if self.budget_seconds == 0 {
            warn!("Refusing to start timer for booking {} with no duration", self.booking_id);
            return;
        }

        let record = PersistedTimerRecord::running(self.clock.now_millis(), self.budget_seconds);
        self.state_tx
            .send_replace(TimerState::running(self.budget_seconds, self.budget_seconds));
        self.persist(&record).await;

        info!(
            "Timer started for booking {} ({}s)",
            self.booking_id, self.budget_seconds
        );
    }

    /// Stop the countdown, keeping the remaining time for display
    pub async fn stop(&self) {
        let _guard = self.op_lock.lock().await;

        let was_running = self.state_tx.send_if_modified(|state| {
            let was_running = state.is_running;
            state.is_running = false;
            was_running
        });
        self.forget().await;

        if was_running {
            info!(
                "Timer stopped for booking {} with {}s remaining",
                self.booking_id,
                self.state().remaining_seconds
            );
        } else {
            debug!("Stop requested for idle timer of booking {}", self.booking_id);
        }
    }

    /// Advance the countdown by one second
    pub async fn tick(&self) -> TickOutcome {
        let _guard = self.op_lock.lock().await;

        let current = self.state();
        if !current.is_running {
            return TickOutcome::Idle;
        }

        let remaining = current.remaining_seconds.saturating_sub(1);
        if remaining > 0 {
            self.state_tx
                .send_replace(TimerState::running(remaining, current.total_seconds));
            return TickOutcome::Ticked {
                remaining_seconds: remaining,
            };
        }

        self.state_tx
            .send_replace(TimerState::expired(current.total_seconds));
        self.forget().await;
        info!("Timer completed for booking {}", self.booking_id);
        TickOutcome::Completed
    }

    /// Rebuild the in-memory state from the persisted record, if any
    pub async fn rehydrate(&self) -> TimerState {
        let _guard = self.op_lock.lock().await;

        let restored = match self.load().await {
            None => TimerState::ready(self.budget_seconds),
            Some(record) if !record.is_running => TimerState::ready(record.total_seconds),
            Some(record) => {
                let remaining = record.remaining_at(self.clock.now_millis());
                if remaining == 0 {
                    info!(
                        "Timer for booking {} expired while the process was down",
                        self.booking_id
                    );
                    self.forget().await;
                    TimerState::expired(record.total_seconds)
                } else {
                    info!(
                        "Restored running timer for booking {} with {}s remaining",
                        self.booking_id, remaining
                    );
                    TimerState::running(remaining, record.total_seconds)
                }
            }
        };

        self.state_tx.send_replace(restored);
        restored
    }

    async fn load(&self) -> Option<PersistedTimerRecord> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read timer record {}: {}", self.key, e);
                return None;
            }
        };

        match PersistedTimerRecord::decode(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Ignoring malformed timer record {}: {}", self.key, e);
                None
            }
        }
    }

    async fn persist(&self, record: &PersistedTimerRecord) {
        let encoded = match record.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Failed to encode timer record {}: {}", self.key, e);
                return;
            }
        };

        if let Err(e) = self.store.set(&self.key, encoded).await {
            warn!("Failed to persist timer record {}: {}", self.key, e);
        }
    }

    async fn forget(&self) {
        if let Err(e) = self.store.remove(&self.key).await {
            warn!("Failed to remove timer record {}: {}", self.key, e);
        }
    }
}

impl std::fmt::Debug for TimerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerController")
            .field("booking_id", &self.booking_id)
            .field("budget_seconds", &self.budget_seconds)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, error::StoreError, state::TimerPhase, store::MemoryStore};
    use async_trait::async_trait;

    const T0: i64 = 1_700_000_000_000;

    fn controller(store: &MemoryStore, clock: &ManualClock, budget: u64) -> TimerController {
        TimerController::new("B1", budget, Arc::new(store.clone()), Arc::new(clock.clone()))
    }

    struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Poisoned("unavailable".to_string()))
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Poisoned("unavailable".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Poisoned("unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn start_persists_record_with_start_time() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let timer = controller(&store, &clock, 5400);

        timer.start().await;

        assert_eq!(timer.state(), TimerState::running(5400, 5400));
        let raw = store.get("timer_booking_B1").await.unwrap().unwrap();
        assert_eq!(
            PersistedTimerRecord::decode(&raw).unwrap(),
            PersistedTimerRecord::running(T0, 5400)
        );
    }

    #[tokio::test]
    async fn counts_down_to_single_completion() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let timer = controller(&store, &clock, 5);
        timer.start().await;

        let mut completions = 0;
        for _ in 0..5 {
            if timer.tick().await == TickOutcome::Completed {
                completions += 1;
            }
        }
        for _ in 0..3 {
            assert_eq!(timer.tick().await, TickOutcome::Idle);
        }

        assert_eq!(completions, 1);
        assert_eq!(timer.state(), TimerState::expired(5));
        assert_eq!(timer.state().phase(), TimerPhase::Expired);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn rehydrate_after_restart_accounts_for_downtime() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        controller(&store, &clock, 100).start().await;

        clock.advance_secs(40);
        let restarted = controller(&store, &clock, 100);
        let state = restarted.rehydrate().await;

        assert_eq!(state, TimerState::running(60, 100));
        assert!(restarted.is_running());
    }

    #[tokio::test]
    async fn rehydrate_after_expiry_deletes_record() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        controller(&store, &clock, 10).start().await;

        clock.advance_secs(15);
        let restarted = controller(&store, &clock, 10);
        assert_eq!(restarted.rehydrate().await, TimerState::expired(10));
        assert!(store.is_empty());

        let again = controller(&store, &clock, 10);
        assert_eq!(again.rehydrate().await.phase(), TimerPhase::NotStarted);
    }

    #[tokio::test]
    async fn stop_clears_persistence() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let timer = controller(&store, &clock, 100);
        timer.start().await;
        timer.tick().await;
        timer.stop().await;

        assert_eq!(timer.state().remaining_seconds, 99);
        assert_eq!(timer.state().phase(), TimerPhase::Stopped);

        let restarted = controller(&store, &clock, 100);
        assert_eq!(restarted.rehydrate().await, TimerState::ready(100));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let timer = controller(&store, &clock, 100);

        timer.stop().await;
        timer.stop().await;
        assert_eq!(timer.state(), TimerState::ready(100));
    }

    #[tokio::test]
    async fn restart_while_running_resets_start_time() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let timer = controller(&store, &clock, 100);
        timer.start().await;
        timer.tick().await;

        clock.advance_secs(30);
        timer.start().await;

        assert_eq!(timer.state().remaining_seconds, 100);
        let raw = store.get("timer_booking_B1").await.unwrap().unwrap();
        assert_eq!(PersistedTimerRecord::decode(&raw).unwrap().start_time, T0 + 30_000);
    }

    #[tokio::test]
    async fn stopped_record_restores_full_budget() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        store
            .set(
                "timer_booking_B1",
                r#"{"startTime":0,"totalSeconds":90,"isRunning":false}"#.to_string(),
            )
            .await
            .unwrap();

        let timer = controller(&store, &clock, 90);
        assert_eq!(timer.rehydrate().await, TimerState::ready(90));
    }

    #[tokio::test]
    async fn malformed_record_falls_back_to_not_started() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        store.set("timer_booking_B1", "{oops".to_string()).await.unwrap();

        let timer = controller(&store, &clock, 60);
        assert_eq!(timer.rehydrate().await, TimerState::ready(60));
    }

    #[tokio::test]
    async fn zero_budget_never_runs() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let timer = controller(&store, &clock, 0);

        timer.start().await;
        assert!(!timer.is_running());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn store_failures_do_not_break_the_countdown() {
        let clock = ManualClock::new(T0);
        let timer = TimerController::new("B1", 3, Arc::new(FailingStore), Arc::new(clock));

        assert_eq!(timer.rehydrate().await, TimerState::ready(3));
        timer.start().await;
        assert_eq!(timer.tick().await, TickOutcome::Ticked { remaining_seconds: 2 });
        timer.stop().await;
        assert_eq!(timer.state().remaining_seconds, 2);
    }

    #[tokio::test]
    async fn subscribers_see_ticks() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let timer = controller(&store, &clock, 10);
        let mut rx = timer.subscribe();

        timer.start().await;
        timer.tick().await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().remaining_seconds, 9);
    }
}
