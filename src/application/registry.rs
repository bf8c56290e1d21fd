//! Session registry with a defined create/get/update/remove lifecycle.
//!
//! Sessions are process-lifetime only: nothing here persists across a
//! restart. The registry itself is a plain map guarded by an async mutex;
//! per-user serialization of whole events is the engine's job (it holds a
//! per-user guard across each dispatch), so short map locks are enough
//! here.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::foundation::UserId;
use crate::domain::session::Session;

/// Owns every in-flight session, keyed by user identity.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<UserId, Session>>,
    // Retained across session removal on purpose: pruning an entry while a
    // dispatch still holds its Arc would let a later event for the same
    // user mint a second guard and run concurrently with the first. The
    // map is bounded by the set of user identities ever seen.
    guards: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a session, overwriting (and discarding) any prior session
    /// for the same user.
    pub async fn create(&self, session: Session) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session.user_id().clone(), session);
    }

    /// Returns a clone of the user's session, if one exists.
    pub async fn get(&self, user_id: &UserId) -> Option<Session> {
        self.sessions.lock().await.get(user_id).cloned()
    }

    /// Writes back a mutated session.
    pub async fn update(&self, session: Session) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session.user_id().clone(), session);
    }

    /// Removes and returns the user's session.
    pub async fn remove(&self, user_id: &UserId) -> Option<Session> {
        self.sessions.lock().await.remove(user_id)
    }

    /// Whether the user currently has a session.
    pub async fn contains(&self, user_id: &UserId) -> bool {
        self.sessions.lock().await.contains_key(user_id)
    }

    /// Per-user serialization guard.
    ///
    /// The engine locks this for the full duration of one dispatch so two
    /// in-flight events from the same user cannot interleave session
    /// reads/writes, while distinct users proceed concurrently.
    pub async fn user_guard(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().await;
        guards
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
