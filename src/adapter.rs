//! Adapter binding one user entity to a realm and a deferred-write unit.
//!
//! Every mutating setter applies the change to the in-memory entity and
//! enlists the adapter's write unit into the current unit of work, so the
//! remote directory sees one consolidated write at commit. Setters
//! short-circuit when the value is unchanged.

use crate::model::{GroupView, RoleView, UserEntity};
use crate::storage_id;
use crate::unit_of_work::UnitOfWork;
use crate::write::{RemoteWrite, WriteState};
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Locks are only ever held for field access within one unit of work's
// single thread of execution; a poisoned lock carries no broken invariant.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub(crate) struct AdapterInner {
    pub(crate) entity: UserEntity,
    pub(crate) persisted: bool,
}

/// Shared handle to one directory principal within a host request.
///
/// Clones share the same entity state and the same deferred-write unit;
/// the pending-write cache and the host both hold such clones.
#[derive(Debug, Clone)]
pub struct UserAdapter {
    realm: String,
    provider_id: String,
    inner: Arc<Mutex<AdapterInner>>,
    write: Arc<RemoteWrite>,
}

impl UserAdapter {
    /// Wrap an entity fetched from the remote directory.
    pub(crate) fn for_existing(provider_id: &str, realm: &str, entity: UserEntity) -> Self {
        Self::build(provider_id, realm, entity, true)
    }

    /// Start a principal that does not exist remotely yet.
    pub(crate) fn for_new(provider_id: &str, realm: &str) -> Self {
        Self::build(provider_id, realm, UserEntity::new(), false)
    }

    fn build(provider_id: &str, realm: &str, entity: UserEntity, persisted: bool) -> Self {
        let inner = Arc::new(Mutex::new(AdapterInner { entity, persisted }));
        let write = Arc::new(RemoteWrite::new(realm.to_string(), Arc::clone(&inner)));
        Self {
            realm: realm.to_string(),
            provider_id: provider_id.to_string(),
            inner,
            write,
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Whether the entity has been durably written to the remote directory.
    pub fn is_persisted(&self) -> bool {
        lock(&self.inner).persisted
    }

    pub fn write_state(&self) -> WriteState {
        self.write.state()
    }

    /// The id assigned by the remote directory, without storage scoping.
    pub fn external_id(&self) -> Option<String> {
        lock(&self.inner).entity.id().map(str::to_string)
    }

    /// The host-visible id, scoped to this provider. Absent until the
    /// remote directory has assigned an id.
    pub fn id(&self) -> Option<String> {
        self.external_id()
            .map(|external| storage_id::local_id(&self.provider_id, &external))
    }

    /// Snapshot of the underlying entity.
    pub fn entity(&self) -> UserEntity {
        lock(&self.inner).entity.clone()
    }

    pub(crate) fn shares_state_with(&self, other: &UserAdapter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // First mutation per cycle registers the write unit with the unit of
    // work; everything after that is a no-op until the next flush.
    fn ensure_enlisted(&self, uow: &mut UnitOfWork) {
        if self.write.try_enlist() {
            uow.enlist(&self.write);
        }
    }

    // ── Identity fields ──────────────────────────────────────────────

    pub fn username(&self) -> Option<String> {
        lock(&self.inner).entity.username().map(str::to_string)
    }

    pub fn set_username(&self, uow: &mut UnitOfWork, username: Option<&str>) {
        debug!("set_username({username:?})");
        {
            let mut state = lock(&self.inner);
            if state.entity.username() == username {
                return;
            }
            state.entity.set_username(username.map(str::to_string));
        }
        self.ensure_enlisted(uow);
    }

    pub fn email(&self) -> Option<String> {
        lock(&self.inner).entity.email().map(str::to_string)
    }

    pub fn set_email(&self, uow: &mut UnitOfWork, email: Option<&str>) {
        debug!("set_email({email:?})");
        {
            let mut state = lock(&self.inner);
            if state.entity.email() == email {
                return;
            }
            state.entity.set_email(email.map(str::to_string));
        }
        self.ensure_enlisted(uow);
    }

    pub fn first_name(&self) -> Option<String> {
        lock(&self.inner).entity.first_name().map(str::to_string)
    }

    pub fn set_first_name(&self, uow: &mut UnitOfWork, first_name: Option<&str>) {
        debug!("set_first_name({first_name:?})");
        {
            let mut state = lock(&self.inner);
            if state.entity.first_name() == first_name {
                return;
            }
            state.entity.set_first_name(first_name.map(str::to_string));
        }
        self.ensure_enlisted(uow);
    }

    pub fn last_name(&self) -> Option<String> {
        lock(&self.inner).entity.last_name().map(str::to_string)
    }

    pub fn set_last_name(&self, uow: &mut UnitOfWork, last_name: Option<&str>) {
        debug!("set_last_name({last_name:?})");
        {
            let mut state = lock(&self.inner);
            if state.entity.last_name() == last_name {
                return;
            }
            state.entity.set_last_name(last_name.map(str::to_string));
        }
        self.ensure_enlisted(uow);
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.inner).entity.is_enabled()
    }

    pub fn set_enabled(&self, uow: &mut UnitOfWork, enabled: bool) {
        debug!("set_enabled({enabled})");
        {
            let mut state = lock(&self.inner);
            if state.entity.is_enabled() == enabled {
                return;
            }
            state.entity.set_enabled(enabled);
        }
        self.ensure_enlisted(uow);
    }

    pub fn is_email_verified(&self) -> bool {
        lock(&self.inner).entity.is_email_verified()
    }

    pub fn set_email_verified(&self, uow: &mut UnitOfWork, verified: bool) {
        debug!("set_email_verified({verified})");
        {
            let mut state = lock(&self.inner);
            if state.entity.is_email_verified() == verified {
                return;
            }
            state.entity.set_email_verified(verified);
        }
        self.ensure_enlisted(uow);
    }

    pub fn created_timestamp(&self) -> Option<i64> {
        lock(&self.inner).entity.created_timestamp()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        lock(&self.inner).entity.created_at()
    }

    pub fn set_created_timestamp(&self, uow: &mut UnitOfWork, timestamp: Option<i64>) {
        debug!("set_created_timestamp({timestamp:?})");
        {
            let mut state = lock(&self.inner);
            if state.entity.created_timestamp() == timestamp {
                return;
            }
            state.entity.set_created_timestamp(timestamp);
        }
        self.ensure_enlisted(uow);
    }

    /// Buffer a new password; the remote update happens at commit.
    pub fn set_password(&self, uow: &mut UnitOfWork, password: &str) {
        debug!("set_password(<redacted>)");
        lock(&self.inner)
            .entity
            .set_password(Some(password.to_string()));
        self.ensure_enlisted(uow);
    }

    // ── Custom attributes ────────────────────────────────────────────

    pub fn attributes(&self) -> HashMap<String, Vec<String>> {
        lock(&self.inner).entity.attributes().clone()
    }

    pub fn attribute(&self, name: &str) -> Vec<String> {
        lock(&self.inner).entity.attribute(name).to_vec()
    }

    pub fn first_attribute(&self, name: &str) -> Option<String> {
        lock(&self.inner)
            .entity
            .first_attribute(name)
            .map(str::to_string)
    }

    pub fn set_single_attribute(&self, uow: &mut UnitOfWork, name: &str, value: &str) {
        debug!("set_single_attribute({name}, {value})");
        {
            let mut state = lock(&self.inner);
            if state.entity.first_attribute(name) == Some(value) {
                return;
            }
            state.entity.set_single_attribute(name, value);
        }
        self.ensure_enlisted(uow);
    }

    pub fn set_attribute(&self, uow: &mut UnitOfWork, name: &str, values: Vec<String>) {
        debug!("set_attribute({name}, {values:?})");
        {
            let mut state = lock(&self.inner);
            if state.entity.attribute(name) == values.as_slice() {
                return;
            }
            state.entity.set_attribute(name, values);
        }
        self.ensure_enlisted(uow);
    }

    pub fn remove_attribute(&self, uow: &mut UnitOfWork, name: &str) {
        debug!("remove_attribute({name})");
        lock(&self.inner).entity.remove_attribute(name);
        self.ensure_enlisted(uow);
    }

    // ── Groups and roles (read-only views) ───────────────────────────

    pub fn groups(&self) -> Vec<GroupView> {
        lock(&self.inner).entity.groups(&self.realm)
    }

    pub fn role_mappings(&self) -> Vec<RoleView> {
        lock(&self.inner).entity.role_mappings(&self.realm)
    }

    pub fn is_member_of(&self, group: &GroupView) -> bool {
        lock(&self.inner).entity.is_member_of(group)
    }

    pub fn has_role(&self, role: &RoleView) -> bool {
        lock(&self.inner).entity.has_role(role)
    }
}
