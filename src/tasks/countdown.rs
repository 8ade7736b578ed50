//! Countdown tick background task

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::broadcast,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::state::{TickOutcome, TimerController};

/// Notifications raised by a running countdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    Completed {
        booking_id: String,
        at: DateTime<Utc>,
    },
}

/// Background task that ticks the timer once per `tick_interval` while it runs
pub async fn countdown_task(
    timer: Arc<TimerController>,
    tick_interval: Duration,
    events: broadcast::Sender<TimerEvent>,
    cancel: CancellationToken,
) {
    info!("Starting countdown task for booking {}", timer.booking_id());

    let mut state_rx = timer.subscribe();

    loop {
        // Idle until the timer is started
        let running = state_rx.borrow_and_update().is_running;
        if !running {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }
        }

        debug!("Countdown running for booking {}", timer.booking_id());
        let mut interval = interval_at(Instant::now() + tick_interval, tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Countdown task for booking {} cancelled", timer.booking_id());
                    return;
                }
                _ = interval.tick() => {
                    match timer.tick().await {
                        TickOutcome::Idle => break,
                        TickOutcome::Ticked { remaining_seconds } => {
                            debug!("Booking {}: {}s remaining", timer.booking_id(), remaining_seconds);
                        }
                        TickOutcome::Completed => {
                            let event = TimerEvent::Completed {
                                booking_id: timer.booking_id().to_string(),
                                at: Utc::now(),
                            };
                            if events.send(event).is_err() {
                                warn!("No listeners for completion of booking {}", timer.booking_id());
                            }
                            break;
                        }
                    }
                }
            }
        }
    }

    info!("Countdown task for booking {} stopped", timer.booking_id());
}
