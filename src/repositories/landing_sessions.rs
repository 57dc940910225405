use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::flows::landing_session::LandingSession;
use crate::flows::view_orchestrator::ViewDelays;
use crate::models::landing_models::Coordinate;

pub type SharedSession = Arc<Mutex<LandingSession>>;

/// Live landing sessions, one per visitor.
pub struct LandingSessions {
    sessions: DashMap<Uuid, SharedSession>,
    delays: ViewDelays,
    default_center: Coordinate,
}

impl LandingSessions {
    pub fn new(delays: ViewDelays, default_center: Coordinate) -> Self {
        Self {
            sessions: DashMap::new(),
            delays,
            default_center,
        }
    }

    pub fn create(&self) -> SharedSession {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(LandingSession::start(
            id,
            self.delays,
            self.default_center,
        )));
        self.sessions.insert(id, session.clone());
        tracing::info!("Started landing session {}", id);
        session
    }

    pub fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Removes a session and cancels its pending timed transitions.
    pub async fn remove(&self, id: Uuid) -> bool {
        let Some((_, session)) = self.sessions.remove(&id) else {
            return false;
        };
        session.lock().await.teardown();
        tracing::info!("Closed landing session {}", id);
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops sessions untouched for longer than `ttl`. Sessions busy with a
    /// request are skipped this round.
    pub fn sweep_idle(&self, ttl: Duration) -> usize {
        let mut expired = Vec::new();
        for entry in self.sessions.iter() {
            if let Ok(session) = entry.value().try_lock() {
                if session.idle_for() > ttl {
                    expired.push(*entry.key());
                }
            }
        }

        let mut removed = 0;
        for id in expired {
            if let Some((_, session)) = self.sessions.remove(&id) {
                if let Ok(session) = session.try_lock() {
                    session.teardown();
                }
                removed += 1;
                tracing::debug!("Expired idle landing session {}", id);
            }
        }
        removed
    }
}
