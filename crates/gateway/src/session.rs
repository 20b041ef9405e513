//! Per-session conversation histories.
//!
//! Each session's history sits behind its own async mutex. A request holds
//! that mutex for its whole turn, so turns within a session are applied in
//! order while different sessions run in parallel.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use folio_agent::ConversationHistory;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Session used when a request names none.
pub const DEFAULT_SESSION: &str = "default";

pub type SessionHandle = Arc<Mutex<ConversationHistory>>;

#[derive(Default)]
struct Sessions {
    histories: HashMap<String, SessionHandle>,
    /// Creation order, oldest first.
    created: VecDeque<String>,
}

/// A bounded map of session id to history.
///
/// When full, the oldest-created session is dropped to make room.
pub struct SessionStore {
    inner: RwLock<Sessions>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            inner: RwLock::new(Sessions::default()),
            max_sessions: max_sessions.max(1),
        }
    }

    /// The handle for `id`, creating the session with `make` if needed.
    pub async fn get_or_create(
        &self,
        id: &str,
        make: impl FnOnce() -> ConversationHistory,
    ) -> SessionHandle {
        if let Some(handle) = self.inner.read().await.histories.get(id) {
            return handle.clone();
        }

        let mut sessions = self.inner.write().await;
        // Another request may have created it between the two locks.
        if let Some(handle) = sessions.histories.get(id) {
            return handle.clone();
        }

        while sessions.histories.len() >= self.max_sessions {
            let Some(oldest) = sessions.created.pop_front() else {
                break;
            };
            sessions.histories.remove(&oldest);
            debug!(session = %oldest, "Session evicted");
        }

        let handle = Arc::new(Mutex::new(make()));
        sessions.histories.insert(id.to_string(), handle.clone());
        sessions.created.push_back(id.to_string());
        debug!(session = %id, total = sessions.histories.len(), "Session created");
        handle
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.inner.read().await.histories.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.histories.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_id_returns_same_history() {
        let store = SessionStore::new(10);
        let a = store.get_or_create("alice", ConversationHistory::new).await;
        a.lock().await.append_turn("q", "a");

        let again = store.get_or_create("alice", ConversationHistory::new).await;
        assert_eq!(again.lock().await.len(), 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new(10);
        store
            .get_or_create("alice", ConversationHistory::new)
            .await
            .lock()
            .await
            .append_turn("q", "a");

        let bob = store.get_or_create("bob", ConversationHistory::new).await;
        assert!(bob.lock().await.is_empty());
    }

    #[tokio::test]
    async fn oldest_session_is_evicted_when_full() {
        let store = SessionStore::new(2);
        store.get_or_create("s1", ConversationHistory::new).await;
        store.get_or_create("s2", ConversationHistory::new).await;
        store.get_or_create("s3", ConversationHistory::new).await;

        assert_eq!(store.len().await, 2);
        assert!(!store.contains("s1").await);
        assert!(store.contains("s2").await);
        assert!(store.contains("s3").await);
    }

    #[tokio::test]
    async fn concurrent_turns_in_one_session_are_serialized() {
        let store = Arc::new(SessionStore::new(10));
        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let handle = store
                    .get_or_create(DEFAULT_SESSION, || ConversationHistory::with_capacity(100))
                    .await;
                let mut history = handle.lock().await;
                let before = history.len();
                tokio::task::yield_now().await;
                history.append_turn(&format!("q{i}"), &format!("a{i}"));
                assert_eq!(history.len(), before + 2);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let handle = store.get_or_create(DEFAULT_SESSION, ConversationHistory::new).await;
        let history = handle.lock().await;
        assert_eq!(history.len(), 16);
        // Every stored pair stays adjacent.
        let contents: Vec<&str> = history.messages().map(|m| m.content()).collect();
        for pair in contents.chunks(2) {
            assert_eq!(&pair[0][1..], &pair[1][1..]);
        }
    }
}
