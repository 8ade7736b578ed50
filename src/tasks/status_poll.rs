//! Booking status reconciliation background task

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    services::BookingStatusSource,
    state::{BookingStatus, Reconciler, TimerController},
};

/// Apply one observed status: publish changes and release a running timer on completion.
///
/// The status is published before the timer is inspected; a concurrent
/// start checks the status again after starting, so one side always sees
/// the other.
pub async fn reconcile_once(
    reconciler: &mut Reconciler,
    status: BookingStatus,
    timer: Option<&TimerController>,
    status_tx: &watch::Sender<BookingStatus>,
) {
    if reconciler.record(&status) {
        status_tx.send_replace(status.clone());
    }

    let Some(timer) = timer else {
        return;
    };
    if Reconciler::should_stop(&status, timer.is_running()) {
        info!(
            "Booking {} finished ({}), stopping its timer",
            timer.booking_id(),
            status
        );
        timer.stop().await;
    }
}

/// Background task that polls the booking every `poll_interval` and reconciles its status
pub async fn status_poll_task(
    booking_id: String,
    source: Arc<dyn BookingStatusSource>,
    timer: Option<Arc<TimerController>>,
    mut reconciler: Reconciler,
    status_tx: watch::Sender<BookingStatus>,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    info!(
        "Starting status poll for booking {} every {:?}",
        booking_id, poll_interval
    );

    let mut interval = interval_at(Instant::now() + poll_interval, poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                match source.fetch_booking(&booking_id).await {
                    Ok(booking) => {
                        debug!("Polled booking {}: {}", booking_id, booking.status);
                        reconcile_once(&mut reconciler, booking.status, timer.as_deref(), &status_tx).await;
                    }
                    Err(e) => {
                        warn!("Failed to poll booking {}: {}", booking_id, e);
                    }
                }
            }
        }
    }

    info!("Status poll for booking {} stopped", booking_id);
}
