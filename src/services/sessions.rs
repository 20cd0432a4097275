use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::business_logic::breakout::BreakoutTracker;
use crate::errors::AppError;

/// A tracker confined to one session; callers take the lock per operation
pub type SharedTracker = Arc<Mutex<BreakoutTracker>>;

/// Tracker sessions keyed by id
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<u64, SharedTracker>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, tracker: BreakoutTracker) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!("Opened session {} for {}", id, tracker.symbol());

        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(tracker)));
        id
    }

    pub async fn get(&self, id: u64) -> Result<SharedTracker, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| unknown_session(id))
    }

    pub async fn remove(&self, id: u64) -> Result<(), AppError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                tracing::info!("Closed session {}", id);
                Ok(())
            }
            None => Err(unknown_session(id)),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn unknown_session(id: u64) -> AppError {
    AppError::NotFound(format!("session {id} does not exist"))
}
