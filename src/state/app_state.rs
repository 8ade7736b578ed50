//! Main application state management

use std::{collections::HashMap, sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    error::SessionError,
    session::{BookingSession, SessionDeps},
};

/// Application state: collaborators plus the sessions currently held open
pub struct AppState {
    deps: SessionDeps,
    /// One session per booking id; a booking is never driven by two sessions
    sessions: Mutex<HashMap<String, Arc<BookingSession>>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(deps: SessionDeps, port: u16, host: String) -> Self {
        Self {
            deps,
            sessions: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
            port,
            host,
            started_at: Utc::now(),
        }
    }

    /// Open a session for the booking, or return the one already open
    pub async fn open_session(&self, booking_id: &str) -> Result<Arc<BookingSession>, SessionError> {
        if let Some(session) = self.sessions.lock().await.get(booking_id) {
            return Ok(Arc::clone(session));
        }

        // Opening fetches the booking upstream; the registry stays unlocked meanwhile
        let session = Arc::new(BookingSession::open(booking_id, &self.deps).await?);

        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.get(booking_id).cloned() {
            drop(sessions);
            debug!("Session for booking {} opened concurrently, keeping the first", booking_id);
            session.close().await;
            return Ok(existing);
        }

        sessions.insert(booking_id.to_string(), Arc::clone(&session));
        info!("{} session(s) open", sessions.len());
        Ok(session)
    }

    pub async fn session(&self, booking_id: &str) -> Result<Arc<BookingSession>, SessionError> {
        self.sessions
            .lock()
            .await
            .get(booking_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound {
                booking_id: booking_id.to_string(),
            })
    }

    /// Tear down a session and cancel its loops
    pub async fn close_session(&self, booking_id: &str) -> Result<(), SessionError> {
        let session = self
            .sessions
            .lock()
            .await
            .remove(booking_id)
            .ok_or_else(|| SessionError::NotFound {
                booking_id: booking_id.to_string(),
            })?;

        session.close().await;
        Ok(())
    }

    pub async fn close_all(&self) {
        let sessions: Vec<_> = self.sessions.lock().await.drain().map(|(_, s)| s).collect();
        for session in sessions {
            session.close().await;
        }
    }

    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.sessions.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
