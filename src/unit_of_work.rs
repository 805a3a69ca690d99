//! Unit-of-work context: pending-write cache plus deferred-write registry.
//!
//! One [`UnitOfWork`] spans one host request. Users created during the
//! request are indexed in [`PendingUsers`] so lookups inside the same
//! request observe them before the remote directory does, and every adapter
//! mutation enlists its deferred write here exactly once. The context is
//! passed explicitly through the call chain and dies with the request; no
//! state survives it.

use crate::adapter::UserAdapter;
use crate::write::RemoteWrite;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// One host-managed transactional scope, typically one external request.
#[derive(Debug)]
pub struct UnitOfWork {
    id: String,
    pending: PendingUsers,
    writes: Vec<Weak<RemoteWrite>>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            pending: PendingUsers::default(),
            writes: Vec::new(),
        }
    }

    /// Correlation id for logging.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Users created in this unit of work but not yet written remotely.
    pub fn pending(&self) -> &PendingUsers {
        &self.pending
    }

    pub(crate) fn pending_mut(&mut self) -> &mut PendingUsers {
        &mut self.pending
    }

    /// Whether any deferred write is waiting for commit.
    pub fn has_deferred_writes(&self) -> bool {
        self.writes.iter().any(|write| write.strong_count() > 0)
    }

    // Registered weakly: the write unit is owned by its adapter and must
    // not outlive the unit of work through this registry.
    pub(crate) fn enlist(&mut self, write: &Arc<RemoteWrite>) {
        debug!("uow {}: deferred write enlisted", self.id);
        self.writes.push(Arc::downgrade(write));
    }

    pub(crate) fn take_writes(&mut self) -> Vec<Arc<RemoteWrite>> {
        self.writes
            .drain(..)
            .filter_map(|write| write.upgrade())
            .collect()
    }
}

impl Default for UnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}

/// Request-scoped index of users that exist only in memory so far.
///
/// Each adapter is indexed under every non-blank key it has at insertion
/// time; a later username or email change is not re-indexed.
#[derive(Debug, Default)]
pub struct PendingUsers {
    by_username: HashMap<String, UserAdapter>,
    by_email: HashMap<String, UserAdapter>,
    by_id: HashMap<String, UserAdapter>,
}

fn is_not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

impl PendingUsers {
    pub(crate) fn put(&mut self, adapter: &UserAdapter) {
        if let Some(username) = adapter.username().filter(|v| is_not_blank(v)) {
            self.by_username.insert(username, adapter.clone());
        }
        if let Some(email) = adapter.email().filter(|v| is_not_blank(v)) {
            self.by_email.insert(email, adapter.clone());
        }
        if let Some(id) = adapter.id().filter(|v| is_not_blank(v)) {
            self.by_id.insert(id, adapter.clone());
        }
    }

    pub(crate) fn remove(&mut self, adapter: &UserAdapter) {
        if let Some(username) = adapter.username() {
            self.by_username.remove(&username);
        }
        if let Some(email) = adapter.email() {
            self.by_email.remove(&email);
        }
        if let Some(id) = adapter.id() {
            self.by_id.remove(&id);
        }
    }

    pub fn by_username(&self, username: &str) -> Option<UserAdapter> {
        self.by_username.get(username).cloned()
    }

    pub fn by_email(&self, email: &str) -> Option<UserAdapter> {
        self.by_email.get(email).cloned()
    }

    pub fn by_id(&self, id: &str) -> Option<UserAdapter> {
        self.by_id.get(id).cloned()
    }

    /// Whether this exact adapter is indexed under any of its current keys.
    pub fn contains(&self, adapter: &UserAdapter) -> bool {
        let hit = |entry: Option<UserAdapter>| {
            entry
                .map(|found| found.shares_state_with(adapter))
                .unwrap_or(false)
        };
        hit(adapter.id().and_then(|id| self.by_id(&id)))
            || hit(adapter.username().and_then(|name| self.by_username(&name)))
            || hit(adapter.email().and_then(|mail| self.by_email(&mail)))
    }

    pub fn is_empty(&self) -> bool {
        self.by_username.is_empty() && self.by_email.is_empty() && self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::UserAdapter;
    use crate::model::UserEntity;

    fn persisted_adapter(id: &str, username: &str, email: &str) -> UserAdapter {
        let mut entity = UserEntity::with_id(id);
        entity.set_username(Some(username.to_string()));
        entity.set_email(Some(email.to_string()));
        UserAdapter::for_existing("p1", "realm-a", entity)
    }

    #[test]
    fn indexes_under_all_non_blank_keys() {
        let mut pending = PendingUsers::default();
        let adapter = persisted_adapter("ext-1", "alice", "alice@example.com");
        pending.put(&adapter);

        assert!(pending.by_username("alice").is_some());
        assert!(pending.by_email("alice@example.com").is_some());
        assert!(pending.by_id("f:p1:ext-1").is_some());
        assert!(pending.contains(&adapter));
    }

    #[test]
    fn skips_absent_keys() {
        let mut pending = PendingUsers::default();
        let adapter = UserAdapter::for_new("p1", "realm-a");
        pending.put(&adapter);

        // no username, email or id yet
        assert!(pending.is_empty());
        assert!(!pending.contains(&adapter));
    }

    #[test]
    fn remove_deindexes_every_key() {
        let mut pending = PendingUsers::default();
        let adapter = persisted_adapter("ext-1", "alice", "alice@example.com");
        pending.put(&adapter);
        pending.remove(&adapter);

        assert!(pending.is_empty());
    }

    #[test]
    fn distinguishes_adapters_with_equal_keys() {
        let mut pending = PendingUsers::default();
        let indexed = persisted_adapter("ext-1", "alice", "alice@example.com");
        let imposter = persisted_adapter("ext-1", "alice", "alice@example.com");
        pending.put(&indexed);

        assert!(pending.contains(&indexed));
        assert!(!pending.contains(&imposter));
    }

    #[test]
    fn take_writes_drops_dead_registrations() {
        let mut uow = UnitOfWork::new();
        {
            let adapter = UserAdapter::for_new("p1", "realm-a");
            adapter.set_username(&mut uow, Some("ghost"));
            assert!(uow.has_deferred_writes());
        }
        // adapter (and its write unit) dropped before commit
        assert!(uow.take_writes().is_empty());
    }
}
