//! Attempt ledger storage
//!
//! The guard owns its store and serializes access to it within a process.
//! Every guard operation is bracketed by [`PinAttemptStore::begin`] and
//! [`PinAttemptStore::commit`] (or [`PinAttemptStore::rollback`] on error),
//! which shared stores use to exclude other processes and reload state.
//! Every write replaces a whole per-user record.

use std::collections::{BTreeSet, HashMap};

use crate::lockout::{PinAttempt, PinLockout};
use crate::Result;

/// Per-user storage for attempts and lockouts
pub trait PinAttemptStore: Send {
    /// Start an operation: take any cross-process lock and refresh state
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    /// Finish an operation: persist changes and release the lock
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Abandon an operation after an error, discarding unsaved changes
    fn rollback(&mut self) {}

    /// Attempts for a user, oldest first (empty if none)
    fn attempts(&self, user_id: &str) -> Result<Vec<PinAttempt>>;

    /// Replace the attempts for a user
    fn put_attempts(&mut self, user_id: &str, attempts: Vec<PinAttempt>) -> Result<()>;

    fn delete_attempts(&mut self, user_id: &str) -> Result<()>;

    fn lockout(&self, user_id: &str) -> Result<Option<PinLockout>>;

    fn put_lockout(&mut self, lockout: PinLockout) -> Result<()>;

    fn delete_lockout(&mut self, user_id: &str) -> Result<()>;

    /// Every user with attempts or a lockout on record
    fn users(&self) -> Result<Vec<String>>;

    /// Remove everything held for a user
    fn clear_user(&mut self, user_id: &str) -> Result<()> {
        self.delete_attempts(user_id)?;
        self.delete_lockout(user_id)
    }
}

/// Volatile in-memory store
///
/// State lives as long as the store; dropping it is the teardown.
#[derive(Debug, Default)]
pub struct MemoryStore {
    attempts: HashMap<String, Vec<PinAttempt>>,
    lockouts: HashMap<String, PinLockout>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PinAttemptStore for MemoryStore {
    fn attempts(&self, user_id: &str) -> Result<Vec<PinAttempt>> {
        Ok(self.attempts.get(user_id).cloned().unwrap_or_default())
    }

    fn put_attempts(&mut self, user_id: &str, attempts: Vec<PinAttempt>) -> Result<()> {
        if attempts.is_empty() {
            self.attempts.remove(user_id);
        } else {
            self.attempts.insert(user_id.to_string(), attempts);
        }
        Ok(())
    }

    fn delete_attempts(&mut self, user_id: &str) -> Result<()> {
        self.attempts.remove(user_id);
        Ok(())
    }

    fn lockout(&self, user_id: &str) -> Result<Option<PinLockout>> {
        Ok(self.lockouts.get(user_id).cloned())
    }

    fn put_lockout(&mut self, lockout: PinLockout) -> Result<()> {
        self.lockouts.insert(lockout.user_id.clone(), lockout);
        Ok(())
    }

    fn delete_lockout(&mut self, user_id: &str) -> Result<()> {
        self.lockouts.remove(user_id);
        Ok(())
    }

    fn users(&self) -> Result<Vec<String>> {
        let users: BTreeSet<&String> = self.attempts.keys().chain(self.lockouts.keys()).collect();
        Ok(users.into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_attempts() {
        let mut store = MemoryStore::new();
        assert!(store.attempts("alice").unwrap().is_empty());

        let attempts = vec![PinAttempt::new("alice", 1, false)];
        store.put_attempts("alice", attempts.clone()).unwrap();
        assert_eq!(store.attempts("alice").unwrap(), attempts);

        store.delete_attempts("alice").unwrap();
        assert!(store.attempts("alice").unwrap().is_empty());
    }

    #[test]
    fn test_empty_put_removes_user() {
        let mut store = MemoryStore::new();
        store
            .put_attempts("alice", vec![PinAttempt::new("alice", 1, true)])
            .unwrap();
        store.put_attempts("alice", Vec::new()).unwrap();
        assert!(store.users().unwrap().is_empty());
    }

    #[test]
    fn test_users_and_clear() {
        let mut store = MemoryStore::new();
        store
            .put_attempts("bob", vec![PinAttempt::new("bob", 1, false)])
            .unwrap();
        store
            .put_lockout(PinLockout {
                user_id: "alice".into(),
                locked_until: 10,
                attempts: 3,
            })
            .unwrap();
        store
            .put_attempts("alice", vec![PinAttempt::new("alice", 1, false)])
            .unwrap();

        assert_eq!(store.users().unwrap(), vec!["alice".to_string(), "bob".to_string()]);

        store.clear_user("alice").unwrap();
        assert!(store.lockout("alice").unwrap().is_none());
        assert_eq!(store.users().unwrap(), vec!["bob".to_string()]);
    }
}
