//! Per-caller session state.
//!
//! Sessions are purely in-memory: created lazily on a caller's first message,
//! cleared flag-by-flag as flows complete or cancel, and lost on restart
//! (in-flight multi-step flows are abandoned — an accepted non-goal). There
//! is no expiry; an abandoned flow costs a small constant amount of memory
//! per caller until cancelled.

use ordbok_core::reply::CallerId;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Which index-addressed operation a pending number list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOp {
    /// Promote the selected suggestions into the dictionary.
    Promote,
    /// Delete the selected suggestions.
    Delete,
}

/// The multi-step flow a caller is in the middle of, if any.
///
/// At most one flow is active per caller; the dispatcher transitions between
/// variants in response to commands and well-formed continuations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flow {
    #[default]
    Idle,
    /// Waiting for a five-field record from any caller (suggest-word).
    AwaitingSuggestion,
    /// Waiting for up to 100 five-field lines from the privileged caller.
    AwaitingBulkAdd,
    /// Waiting for a comma-separated index list.
    AwaitingIndices(IndexOp),
    /// Edit, phase one: waiting for the target row number.
    AwaitingEditTarget,
    /// Edit, phase two: waiting for the replacement record for this 0-based
    /// row.
    AwaitingEditPayload(usize),
}

/// Which list view the caller last opened. `Suggestions` may coexist with an
/// index sub-flow as its parent context; leaving it clears both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Suggestions,
    Contacts,
}

/// Everything the dispatcher remembers about one caller between messages.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub flow: Flow,
    pub menu: Option<Menu>,
    /// Key of the first hit of the caller's last successful search. Cached
    /// for future use; nothing caller-visible consumes it yet.
    pub last_searched_infinitive: Option<String>,
}

/// In-memory keyed store of sessions. Naturally partitioned per caller — no
/// cross-caller coordination is needed beyond the map lock itself.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<CallerId, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a caller (a fresh default if they are new).
    pub async fn get(&self, caller: &CallerId) -> SessionState {
        self.sessions
            .lock()
            .await
            .get(caller)
            .cloned()
            .unwrap_or_default()
    }

    /// Apply a mutation to a caller's session, creating it if absent.
    pub async fn update(&self, caller: &CallerId, apply: impl FnOnce(&mut SessionState)) {
        let mut sessions = self.sessions.lock().await;
        apply(sessions.entry(caller.clone()).or_default());
    }

    /// Drop any pending flow for a caller, keeping the rest of the session.
    pub async fn reset_flow(&self, caller: &CallerId) {
        self.update(caller, |s| s.flow = Flow::Idle).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_created_lazily() {
        let store = SessionStore::new();
        let caller = CallerId::new("u1");
        let state = store.get(&caller).await;
        assert_eq!(state.flow, Flow::Idle);
        assert!(state.menu.is_none());
    }

    #[tokio::test]
    async fn update_persists_between_reads() {
        let store = SessionStore::new();
        let caller = CallerId::new("u1");
        store
            .update(&caller, |s| s.flow = Flow::AwaitingSuggestion)
            .await;
        assert_eq!(store.get(&caller).await.flow, Flow::AwaitingSuggestion);

        store.reset_flow(&caller).await;
        assert_eq!(store.get(&caller).await.flow, Flow::Idle);
    }

    #[tokio::test]
    async fn callers_are_isolated() {
        let store = SessionStore::new();
        let a = CallerId::new("a");
        let b = CallerId::new("b");
        store.update(&a, |s| s.flow = Flow::AwaitingBulkAdd).await;
        store
            .update(&b, |s| s.flow = Flow::AwaitingIndices(IndexOp::Delete))
            .await;

        store.reset_flow(&a).await;
        assert_eq!(store.get(&a).await.flow, Flow::Idle);
        assert_eq!(
            store.get(&b).await.flow,
            Flow::AwaitingIndices(IndexOp::Delete)
        );
    }
}
