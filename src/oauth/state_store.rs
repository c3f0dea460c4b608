// src/oauth/state_store.rs
//! Short-lived server-side records of anti-CSRF `state` values.

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::{debug, warn};

const STATE_LENGTH: usize = 43;

/// Upper bound on outstanding authorizations; the oldest is evicted first.
pub const MAX_PENDING: usize = 10_000;

#[derive(Debug, Clone)]
struct PendingAuthorization {
    provider: String,
    expires_at: DateTime<Utc>,
}

/// Records keyed by state plus their issue order. `order` may still hold
/// states that were already consumed; evicting those is a no-op.
#[derive(Debug, Default)]
struct Pending {
    by_state: HashMap<String, PendingAuthorization>,
    order: VecDeque<(String, DateTime<Utc>)>,
}

impl Pending {
    /// Drops records from the front of the issue order while they are expired.
    fn prune_expired(&mut self, now: DateTime<Utc>) {
        while let Some((state, expires_at)) = self.order.front() {
            if *expires_at > now {
                break;
            }
            self.by_state.remove(state);
            self.order.pop_front();
        }
    }

    /// Makes room for one more record under `limit`. The issue order is
    /// bounded too, so consumed states cannot pile up in it.
    fn evict_to(&mut self, limit: usize) -> usize {
        let mut evicted = 0;
        while self.by_state.len() >= limit || self.order.len() >= limit.saturating_mul(2) {
            let Some((state, _)) = self.order.pop_front() else {
                break;
            };
            if self.by_state.remove(&state).is_some() {
                evicted += 1;
            }
        }
        evicted
    }
}

/// Every authorize redirect gets its own state value, bound to the provider
/// and usable exactly once before it expires.
#[derive(Debug)]
pub struct StateStore {
    ttl: Duration,
    limit: usize,
    pending: RwLock<Pending>,
}

impl StateStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_limit(ttl, MAX_PENDING)
    }

    pub fn with_limit(ttl: Duration, limit: usize) -> Self {
        Self {
            ttl,
            limit: limit.max(1),
            pending: RwLock::new(Pending::default()),
        }
    }

    pub async fn issue(&self, provider: &str) -> String {
        self.issue_at(provider, Utc::now()).await
    }

    pub async fn issue_at(&self, provider: &str, now: DateTime<Utc>) -> String {
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_LENGTH)
            .map(char::from)
            .collect();
        let expires_at = now + self.ttl;

        let mut guard = self.pending.write().await;
        guard.prune_expired(now);
        let evicted = guard.evict_to(self.limit);
        if evicted > 0 {
            warn!(evicted = evicted, limit = self.limit, "OAuth state store full; oldest evicted");
        }
        guard.by_state.insert(
            state.clone(),
            PendingAuthorization {
                provider: provider.to_string(),
                expires_at,
            },
        );
        guard.order.push_back((state.clone(), expires_at));
        debug!(provider = %provider, pending = guard.by_state.len(), "OAuth state issued");
        state
    }

    /// Removes the record and reports whether it was live and issued for
    /// `provider`.
    pub async fn consume(&self, state: &str, provider: &str) -> bool {
        self.consume_at(state, provider, Utc::now()).await
    }

    pub async fn consume_at(&self, state: &str, provider: &str, now: DateTime<Utc>) -> bool {
        let mut guard = self.pending.write().await;
        guard.prune_expired(now);
        match guard.by_state.remove(state) {
            Some(record) => record.expires_at > now && record.provider == provider,
            None => false,
        }
    }

    #[cfg(test)]
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.by_state.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_is_single_use() {
        let store = StateStore::new(Duration::minutes(10));
        let state = store.issue("google").await;
        assert_eq!(state.len(), STATE_LENGTH);

        assert!(store.consume(&state, "google").await);
        assert!(!store.consume(&state, "google").await);
    }

    #[tokio::test]
    async fn test_states_are_fresh_per_request() {
        let store = StateStore::new(Duration::minutes(10));
        let a = store.issue("github").await;
        let b = store.issue("github").await;
        assert_ne!(a, b);
        assert_eq!(store.pending_count().await, 2);
    }

    #[tokio::test]
    async fn test_state_bound_to_provider() {
        let store = StateStore::new(Duration::minutes(10));
        let state = store.issue("google").await;
        assert!(!store.consume(&state, "mailru").await);
        // A mismatched attempt still burns the record
        assert!(!store.consume(&state, "google").await);
    }

    #[tokio::test]
    async fn test_expired_state_rejected_and_pruned() {
        let store = StateStore::new(Duration::minutes(10));
        let now = Utc::now();
        let state = store.issue_at("google", now).await;

        assert!(!store
            .consume_at(&state, "google", now + Duration::minutes(11))
            .await);
        assert_eq!(store.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_state_rejected() {
        let store = StateStore::new(Duration::minutes(10));
        store.issue("google").await;
        assert!(!store.consume("forged-state", "google").await);
    }

    #[tokio::test]
    async fn test_pending_records_are_capped() {
        let store = StateStore::with_limit(Duration::minutes(10), 16);
        let first = store.issue("google").await;
        for _ in 0..100 {
            store.issue("google").await;
        }
        assert_eq!(store.pending_count().await, 16);
        // Oldest record was evicted to make room
        assert!(!store.consume(&first, "google").await);

        let latest = store.issue("github").await;
        assert!(store.pending_count().await <= 16);
        assert!(store.consume(&latest, "github").await);
    }

    #[tokio::test]
    async fn test_default_cap_holds_under_flood() {
        let store = StateStore::new(Duration::minutes(10));
        for _ in 0..(MAX_PENDING + 500) {
            store.issue("google").await;
        }
        assert!(store.pending_count().await <= MAX_PENDING);
    }

    #[tokio::test]
    async fn test_consumed_states_do_not_count_toward_cap() {
        let store = StateStore::with_limit(Duration::minutes(10), 4);
        for _ in 0..10 {
            let state = store.issue("mailru").await;
            assert!(store.consume(&state, "mailru").await);
        }
        let keep = store.issue("mailru").await;
        assert_eq!(store.pending_count().await, 1);
        assert!(store.consume(&keep, "mailru").await);
    }
}
