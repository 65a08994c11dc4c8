//! Per-user conversation state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use votebox_contract::ContractBackend;
use votebox_session::{Session, VotingBuilder};
use votebox_types::{Address, Candidate, UserId};

/// What a user is currently doing.
pub enum UserState<B> {
    Drafting(VotingBuilder<B>),
    Active(Session<B>),
}

/// A copy of a user's state that can be used without holding the store lock.
pub enum UserView<B> {
    Drafting { candidates: usize },
    Active(Session<B>),
}

struct Entry<B> {
    state: UserState<B>,
    touched: Instant,
}

/// Conversation state keyed by user.
///
/// Entries are only removed explicitly or by [`UserStateStore::expire_idle`];
/// the lock is never held across a remote call.
pub struct UserStateStore<B> {
    entries: Mutex<HashMap<UserId, Entry<B>>>,
}

impl<B> Default for UserStateStore<B> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<B: ContractBackend> UserStateStore<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever state `user` had.
    pub async fn insert(&self, user: UserId, state: UserState<B>) {
        let entry = Entry {
            state,
            touched: Instant::now(),
        };
        self.entries.lock().await.insert(user, entry);
    }

    /// Look up `user` and mark the entry as used.
    pub async fn get(&self, user: UserId) -> Option<UserView<B>> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(&user)?;
        entry.touched = Instant::now();
        Some(match &entry.state {
            UserState::Drafting(builder) => UserView::Drafting {
                candidates: builder.len(),
            },
            UserState::Active(session) => UserView::Active(session.clone()),
        })
    }

    /// Run `f` against the user's draft, if they have one.
    pub async fn with_draft<R>(
        &self,
        user: UserId,
        f: impl FnOnce(&mut VotingBuilder<B>) -> R,
    ) -> Option<R> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(&user)?;
        let UserState::Drafting(builder) = &mut entry.state else {
            return None;
        };
        entry.touched = Instant::now();
        Some(f(builder))
    }

    /// Swap the user's draft for `state`, but only while the draft still
    /// lists exactly `candidates`. Returns `false` and changes nothing if the
    /// user started over, edited, or dropped the draft.
    pub async fn replace_draft(
        &self,
        user: UserId,
        candidates: &[Candidate],
        state: UserState<B>,
    ) -> bool {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get_mut(&user) else {
            return false;
        };
        match &entry.state {
            UserState::Drafting(builder) if builder.candidates() == candidates => {
                entry.state = state;
                entry.touched = Instant::now();
                true
            }
            _ => false,
        }
    }

    /// Drop the user's state if they are still attached to `address`.
    pub async fn remove_session(&self, user: UserId, address: Address) -> bool {
        let mut entries = self.entries.lock().await;
        let attached = matches!(
            entries.get(&user),
            Some(Entry { state: UserState::Active(session), .. }) if session.address() == address
        );
        if attached {
            entries.remove(&user);
        }
        attached
    }

    pub async fn remove(&self, user: UserId) -> Option<UserState<B>> {
        self.entries
            .lock()
            .await
            .remove(&user)
            .map(|entry| entry.state)
    }

    /// Drop every entry untouched for at least `max_idle`. Returns how many
    /// were dropped.
    pub async fn expire_idle(&self, max_idle: Duration) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.touched.elapsed() < max_idle);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use votebox_contract::ConfirmationPolicy;
    use votebox_nullables::NullChain;
    use votebox_session::{RestorePolicy, SessionManager};

    fn draft(owner: u64) -> UserState<NullChain> {
        let manager = SessionManager::new(
            Arc::new(NullChain::new()),
            ConfirmationPolicy::default(),
            RestorePolicy::Registered,
        );
        UserState::Drafting(VotingBuilder::new(UserId::new(owner), manager))
    }

    #[tokio::test]
    async fn insert_get_remove() {
        let store = UserStateStore::new();
        let user = UserId::new(5);
        assert!(store.get(user).await.is_none());

        store.insert(user, draft(5)).await;
        assert!(matches!(
            store.get(user).await,
            Some(UserView::Drafting { candidates: 0 })
        ));

        assert!(store.remove(user).await.is_some());
        assert!(store.remove(user).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn drafts_are_edited_in_place() {
        let store = UserStateStore::new();
        let user = UserId::new(1);
        store.insert(user, draft(1)).await;

        let added = store
            .with_draft(user, |builder| builder.add_candidate("Alice"))
            .await;
        assert_eq!(added, Some(Ok(true)));
        assert!(matches!(
            store.get(user).await,
            Some(UserView::Drafting { candidates: 1 })
        ));
        assert!(store.with_draft(UserId::new(2), |b| b.len()).await.is_none());
    }

    #[tokio::test]
    async fn replace_draft_only_swaps_an_unchanged_draft() {
        let store = UserStateStore::new();
        let user = UserId::new(1);
        store.insert(user, draft(1)).await;
        store.with_draft(user, |b| b.add_candidate("A")).await;
        let snapshot: Vec<Candidate> = store
            .with_draft(user, |b| b.candidates().to_vec())
            .await
            .unwrap();

        // the user starts over before the swap
        store.insert(user, draft(1)).await;
        assert!(!store.replace_draft(user, &snapshot, draft(1)).await);
        assert!(matches!(
            store.get(user).await,
            Some(UserView::Drafting { candidates: 0 })
        ));

        store.with_draft(user, |b| b.add_candidate("A")).await;
        let mut replacement = draft(1);
        if let UserState::Drafting(b) = &mut replacement {
            b.add_candidate("A").unwrap();
            b.add_candidate("B").unwrap();
        }
        assert!(store.replace_draft(user, &snapshot, replacement).await);
        assert!(matches!(
            store.get(user).await,
            Some(UserView::Drafting { candidates: 2 })
        ));
        assert!(!store.replace_draft(UserId::new(9), &snapshot, draft(9)).await);
    }

    #[tokio::test]
    async fn remove_session_ignores_drafts() {
        let store = UserStateStore::new();
        let user = UserId::new(1);
        store.insert(user, draft(1)).await;

        assert!(!store.remove_session(user, Address::with_last_byte(1)).await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn expire_idle_drops_only_stale_entries() {
        let store = UserStateStore::new();
        store.insert(UserId::new(1), draft(1)).await;
        store.insert(UserId::new(2), draft(2)).await;

        assert_eq!(store.expire_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.len().await, 2);

        assert_eq!(store.expire_idle(Duration::ZERO).await, 2);
        assert!(store.is_empty().await);
    }
}
