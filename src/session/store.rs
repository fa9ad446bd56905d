use std::time::Duration;

use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use uuid::Uuid;

use super::controller::SessionState;

/// In-memory sessions, evicted after a period without access.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<Uuid, SessionState>,
}

impl SessionStore {
    pub fn new(max_capacity: u64, time_to_idle: Duration) -> Self {
        let cache = Cache::builder()
            .time_to_idle(time_to_idle)
            .max_capacity(max_capacity)
            .build();
        Self { cache }
    }

    /// Start a new session with a zero counter and no sample.
    pub async fn create(&self) -> (Uuid, SessionState) {
        let id = Uuid::new_v4();
        let state = SessionState::default();
        self.cache.insert(id, state.clone()).await;
        log::info!("Created session {}", id);
        (id, state)
    }

    pub async fn get(&self, id: &Uuid) -> Option<SessionState> {
        self.cache.get(id).await
    }

    /// Apply `transition` to the state currently stored under `id`.
    ///
    /// The read and the write happen under the entry lock, so concurrent
    /// transitions of one session are applied one after the other. Returns the
    /// new state, or `None` when the session is unknown or expired.
    pub async fn update<F>(&self, id: Uuid, transition: F) -> Option<SessionState>
    where
        F: FnOnce(SessionState) -> SessionState,
    {
        let result = self
            .cache
            .entry(id)
            .and_compute_with(|entry| {
                let op = match entry {
                    Some(entry) => Op::Put(transition(entry.into_value())),
                    None => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;

        match result {
            CompResult::ReplacedWith(entry) | CompResult::Inserted(entry) => {
                Some(entry.into_value())
            }
            _ => None,
        }
    }

    /// The session behind `id`, or a fresh one when it is unknown or expired.
    pub async fn get_or_create(&self, id: &Uuid) -> (Uuid, SessionState) {
        match self.get(id).await {
            Some(state) => (*id, state),
            None => self.create().await,
        }
    }
}
