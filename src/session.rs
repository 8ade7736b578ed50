//! Per-booking session: a timer controller plus its two background loops
//!
//! A session corresponds to one booking being held in view. It owns the
//! countdown tick loop and the status reconciliation loop and must be
//! closed on teardown so neither loop outlives it.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    clock::Clock,
    error::SessionError,
    services::BookingStatusSource,
    state::{BookingStatus, Reconciler, TimerController, TimerState},
    store::KeyValueStore,
    tasks::{countdown_task, reconcile_once, status_poll_task, TimerEvent},
};

/// How often the countdown ticks and the booking is polled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIntervals {
    pub tick: Duration,
    pub poll: Duration,
}

impl SessionIntervals {
    /// Order-summary cadence: 1 s ticks, 15 s status polls
    pub fn summary() -> Self {
        Self {
            tick: Duration::from_secs(1),
            poll: Duration::from_secs(15),
        }
    }

    /// Booking-search cadence: 1 s ticks, 5 s status polls
    pub fn search() -> Self {
        Self {
            tick: Duration::from_secs(1),
            poll: Duration::from_secs(5),
        }
    }
}

impl Default for SessionIntervals {
    fn default() -> Self {
        Self::summary()
    }
}

/// Collaborators shared by every session
#[derive(Clone)]
pub struct SessionDeps {
    pub source: Arc<dyn BookingStatusSource>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub intervals: SessionIntervals,
}

pub struct BookingSession {
    booking_id: String,
    variant: Option<String>,
    timer: Option<Arc<TimerController>>,
    status_rx: watch::Receiver<BookingStatus>,
    events_tx: broadcast::Sender<TimerEvent>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    opened_at: DateTime<Utc>,
}

impl BookingSession {
    /// Fetch the booking, restore any persisted timer and start both loops
    pub async fn open(booking_id: &str, deps: &SessionDeps) -> Result<Self, SessionError> {
        let booking = deps.source.fetch_booking(booking_id).await?;
        let budget = booking.duration_seconds();
        info!(
            "Opening session for booking {} (status {}, timer {}s)",
            booking_id, booking.status, budget
        );

        let timer = if budget > 0 {
            let timer = Arc::new(TimerController::new(
                booking_id,
                budget,
                Arc::clone(&deps.store),
                Arc::clone(&deps.clock),
            ));
            timer.rehydrate().await;
            Some(timer)
        } else {
            info!("No timer applies to booking {}", booking_id);
            None
        };

        // A booking that finished while nobody was watching must not keep a running timer
        let (status_tx, status_rx) = watch::channel(booking.status.clone());
        let mut reconciler = Reconciler::new(None);
        reconcile_once(&mut reconciler, booking.status, timer.as_deref(), &status_tx).await;

        let (events_tx, _) = broadcast::channel(16);
        let cancel = CancellationToken::new();
        let mut tasks = Vec::with_capacity(2);

        if let Some(timer) = &timer {
            tasks.push(tokio::spawn(countdown_task(
                Arc::clone(timer),
                deps.intervals.tick,
                events_tx.clone(),
                cancel.child_token(),
            )));
        }
        tasks.push(tokio::spawn(status_poll_task(
            booking_id.to_string(),
            Arc::clone(&deps.source),
            timer.clone(),
            reconciler,
            status_tx,
            deps.intervals.poll,
            cancel.child_token(),
        )));

        Ok(Self {
            booking_id: booking_id.to_string(),
            variant: booking.variant,
            timer,
            status_rx,
            events_tx,
            cancel,
            tasks: Mutex::new(tasks),
            opened_at: Utc::now(),
        })
    }

    pub fn booking_id(&self) -> &str {
        &self.booking_id
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Last known booking status
    pub fn status(&self) -> BookingStatus {
        self.status_rx.borrow().clone()
    }

    /// Timer snapshot, `None` when no timer applies to this booking
    pub fn timer_state(&self) -> Option<TimerState> {
        self.timer.as_ref().map(|timer| timer.state())
    }

    /// Receive completion notifications
    pub fn events(&self) -> broadcast::Receiver<TimerEvent> {
        self.events_tx.subscribe()
    }

    fn timer(&self) -> Result<&TimerController, SessionError> {
        self.timer.as_deref().ok_or_else(|| SessionError::NoTimer {
            booking_id: self.booking_id.clone(),
        })
    }

    /// Start the timer if the booking is in progress and the timer is not already running
    pub async fn start_timer(&self) -> Result<TimerState, SessionError> {
        let timer = self.timer()?;

        let status = self.status();
        if !status.permits_timer() {
            warn!(
                "Rejected timer start for booking {} in status {}",
                self.booking_id, status
            );
            return Err(SessionError::StartRejected { status });
        }
        if timer.is_running() {
            return Err(SessionError::AlreadyRunning {
                booking_id: self.booking_id.clone(),
            });
        }

        timer.start().await;

        // The poll may have published a finished booking while the timer was starting
        let status = self.status();
        if !status.permits_timer() {
            warn!(
                "Booking {} left progress during timer start ({}), rolling back",
                self.booking_id, status
            );
            timer.stop().await;
            return Err(SessionError::StartRejected { status });
        }

        Ok(timer.state())
    }

    pub async fn stop_timer(&self) -> Result<TimerState, SessionError> {
        let timer = self.timer()?;
        timer.stop().await;
        Ok(timer.state())
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel both loops and wait for them to finish
    pub async fn close(&self) {
        self.cancel.cancel();

        let tasks = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(e) => {
                warn!("Session task list poisoned for booking {}: {}", self.booking_id, e);
                return;
            }
        };

        for task in tasks {
            if let Err(e) = task.await {
                warn!("Session task for booking {} failed: {}", self.booking_id, e);
            }
        }
        info!("Closed session for booking {}", self.booking_id);
    }
}

impl Drop for BookingSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        error::SourceError,
        state::TimerPhase,
        store::{timer_key, MemoryStore, PersistedTimerRecord},
        testing::FakeSource,
    };

    const T0: i64 = 1_700_000_000_000;

    fn deps(source: Arc<FakeSource>, store: &MemoryStore, clock: &ManualClock) -> SessionDeps {
        SessionDeps {
            source,
            store: Arc::new(store.clone()),
            clock: Arc::new(clock.clone()),
            intervals: SessionIntervals::summary(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pending_booking_refuses_start() {
        let source = FakeSource::with("B1", BookingStatus::Pending, Some("90 Menit"));
        let store = MemoryStore::new();
        let session = BookingSession::open("B1", &deps(source, &store, &ManualClock::new(T0)))
            .await
            .unwrap();

        let result = session.start_timer().await;
        assert!(matches!(
            result,
            Err(SessionError::StartRejected { status: BookingStatus::Pending })
        ));
        assert!(store.is_empty());
        session.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn in_progress_booking_starts_and_refuses_double_start() {
        let source = FakeSource::with("B1", BookingStatus::OnProgress, Some("60 menit"));
        let store = MemoryStore::new();
        let session = BookingSession::open("B1", &deps(source, &store, &ManualClock::new(T0)))
            .await
            .unwrap();

        let state = session.start_timer().await.unwrap();
        assert_eq!(state, TimerState::running(3600, 3600));
        assert!(matches!(
            session.start_timer().await,
            Err(SessionError::AlreadyRunning { .. })
        ));

        let state = session.stop_timer().await.unwrap();
        assert_eq!(state.phase(), TimerPhase::NotStarted);
        assert!(store.is_empty());
        session.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn variant_without_duration_has_no_timer() {
        let source = FakeSource::with("B1", BookingStatus::OnProgress, Some("durasi fleksibel"));
        let store = MemoryStore::new();
        let session = BookingSession::open("B1", &deps(source, &store, &ManualClock::new(T0)))
            .await
            .unwrap();

        assert_eq!(session.timer_state(), None);
        assert!(matches!(
            session.start_timer().await,
            Err(SessionError::NoTimer { .. })
        ));
        session.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reopening_restores_running_timer() {
        let source = FakeSource::with("B1", BookingStatus::OnProgress, Some("100 menit"));
        let store = MemoryStore::new();
        let clock = ManualClock::new(T0);
        let session = BookingSession::open("B1", &deps(source.clone(), &store, &clock))
            .await
            .unwrap();
        session.start_timer().await.unwrap();
        session.close().await;
        drop(session);

        clock.advance_secs(40);
        let session = BookingSession::open("B1", &deps(source, &store, &clock))
            .await
            .unwrap();
        assert_eq!(session.timer_state(), Some(TimerState::running(5960, 6000)));
        session.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn booking_completed_while_away_releases_timer_on_open() {
        let source = FakeSource::with("B1", BookingStatus::Completed, Some("90 Menit"));
        let store = MemoryStore::new();
        store
            .set(
                &timer_key("B1"),
                PersistedTimerRecord::running(T0, 5400).encode().unwrap(),
            )
            .await
            .unwrap();

        let session = BookingSession::open("B1", &deps(source, &store, &ManualClock::new(T0)))
            .await
            .unwrap();

        assert!(!session.timer_state().unwrap().is_running);
        assert!(store.is_empty());
        session.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn poll_detects_completion_and_stops_timer() {
        let source = FakeSource::with("B1", BookingStatus::OnProgress, Some("90 Menit"));
        let store = MemoryStore::new();
        let session = BookingSession::open("B1", &deps(source.clone(), &store, &ManualClock::new(T0)))
            .await
            .unwrap();
        session.start_timer().await.unwrap();

        source.set("B1", BookingStatus::Completed, Some("90 Menit"));
        tokio::time::sleep(Duration::from_secs(16)).await;

        assert_eq!(session.status(), BookingStatus::Completed);
        let state = session.timer_state().unwrap();
        assert!(!state.is_running);
        assert_eq!(state.phase(), TimerPhase::Stopped);
        assert!(store.is_empty());
        session.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn close_stops_the_countdown() {
        let source = FakeSource::with("B1", BookingStatus::OnProgress, Some("90 Menit"));
        let store = MemoryStore::new();
        let session = BookingSession::open("B1", &deps(source, &store, &ManualClock::new(T0)))
            .await
            .unwrap();
        session.start_timer().await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        session.close().await;
        assert!(session.is_closed());
        let frozen = session.timer_state().unwrap().remaining_seconds;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(session.timer_state().unwrap().remaining_seconds, frozen);
    }

    #[tokio::test]
    async fn unknown_booking_fails_to_open() {
        let source = Arc::new(FakeSource::default());
        let store = MemoryStore::new();
        let result = BookingSession::open("missing", &deps(source, &store, &ManualClock::new(T0))).await;
        assert!(matches!(
            result,
            Err(SessionError::Source(SourceError::NotFound { .. }))
        ));
    }
}
