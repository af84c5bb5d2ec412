//! Temporarily blocked accounts.
//!
//! # Lifecycle
//!
//! When a connection exhausts its password attempts, login calls
//! [`BlockedSet::block`] and receives a [`LockoutGuard`].  The username stays
//! blocked for as long as that guard is alive.  The connection supervisor
//! closes the socket first and then calls [`LockoutGuard::expire_after`],
//! which sleeps for the lockout duration and drops the guard.
//!
//! A username is present from the moment [`BlockedSet::block`] returns until
//! the last of its guards is dropped.  That window covers the rest of the
//! login exchange and the socket close as well as the timer itself, so the
//! account is refused before its lockout countdown has even started.
//!
//! Entries are reference-counted: if two connections block the same account
//! around the same time, the account stays blocked until the later guard is
//! dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::info;

/// Process-wide registry of blocked usernames.  Cheap to clone; clones share
/// the same registry.
#[derive(Debug, Clone, Default)]
pub struct BlockedSet {
    // Short, non-async critical sections only.
    pending: Arc<Mutex<HashMap<String, usize>>>,
}

impl BlockedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while any [`LockoutGuard`] for `username` is alive.
    pub fn contains(&self, username: &str) -> bool {
        self.entries().contains_key(username)
    }

    /// Number of distinct usernames currently blocked.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Blocks `username` until the returned guard is dropped.
    #[must_use = "the account is unblocked as soon as the guard is dropped"]
    pub fn block(&self, username: &str) -> LockoutGuard {
        *self.entries().entry(username.to_string()).or_insert(0) += 1;
        info!(username, "account blocked");
        LockoutGuard {
            set: self.clone(),
            username: username.to_string(),
        }
    }

    fn release(&self, username: &str) {
        let mut entries = self.entries();
        if let Some(count) = entries.get_mut(username) {
            *count -= 1;
            if *count == 0 {
                entries.remove(username);
                info!(username, "account unblocked");
            }
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, usize>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps one username blocked while alive.
#[derive(Debug)]
pub struct LockoutGuard {
    set: BlockedSet,
    username: String,
}

impl LockoutGuard {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Holds the block for `duration`, then releases it.
    pub async fn expire_after(self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

impl Drop for LockoutGuard {
    fn drop(&mut self) {
        self.set.release(&self.username);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_controls_membership() {
        let set = BlockedSet::new();
        let guard = set.block("alice");
        assert!(set.contains("alice"));
        assert!(!set.contains("bob"));

        drop(guard);

        assert!(!set.contains("alice"));
        assert!(set.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_before_countdown_starts() {
        let set = BlockedSet::new();
        let guard = set.block("alice");

        // No timer yet: the guard alone keeps the account blocked.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(set.contains("alice"));

        guard.expire_after(Duration::from_secs(10)).await;
        assert!(!set.contains("alice"));
    }

    #[test]
    fn test_overlapping_blocks_keep_the_later_one() {
        let set = BlockedSet::new();
        let first = set.block("alice");
        let second = set.block("alice");
        assert_eq!(set.len(), 1);

        drop(first);
        assert!(set.contains("alice"));

        drop(second);
        assert!(!set.contains("alice"));
    }

    #[test]
    fn test_clones_share_the_registry() {
        let set = BlockedSet::new();
        let other = set.clone();
        let _guard = set.block("alice");
        assert!(other.contains("alice"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_after_releases_when_timer_fires() {
        // Arrange
        let set = BlockedSet::new();
        let guard = set.block("alice");
        let timer = tokio::spawn(guard.expire_after(Duration::from_secs(10)));

        // Act / Assert – still blocked just before the deadline.
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(set.contains("alice"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        timer.await.unwrap();
        assert!(!set.contains("alice"));
    }
}
