//! The host-facing directory facade.
//!
//! Composes the pending-write cache with the remote directory client:
//! lookups consult the cache first and fall back to the remote service,
//! queries always go remote, and mutations are buffered until the unit of
//! work commits.

use crate::adapter::UserAdapter;
use crate::client::RemoteDirectory;
use crate::credential::{CredentialInput, CredentialType};
use crate::error::{DirectoryError, DirectoryResult};
use crate::model::UserEntity;
use crate::storage_id;
use crate::unit_of_work::UnitOfWork;
use log::debug;
use std::collections::BTreeMap;

/// Offset/limit pair requesting the full batch while pagination is off.
const FULL_BATCH: (usize, usize) = (0, usize::MAX);

/// Federates the remote directory into the host's user storage contracts.
///
/// `provider_id` scopes the ids handed to the host so they cannot collide
/// with ids of other directories configured alongside this one.
#[derive(Debug, Clone)]
pub struct DirectoryProvider<C> {
    provider_id: String,
    client: C,
}

impl<C: RemoteDirectory> DirectoryProvider<C> {
    pub fn new(provider_id: impl Into<String>, client: C) -> Self {
        Self {
            provider_id: provider_id.into(),
            client,
        }
    }

    fn wrap_existing(&self, realm: &str, entity: UserEntity) -> UserAdapter {
        UserAdapter::for_existing(&self.provider_id, realm, entity)
    }

    // ── Lookups (cache first, then remote) ───────────────────────────

    /// Look up a user by username; `None` when neither the pending-write
    /// cache nor the remote directory knows the name.
    pub async fn get_user_by_username(
        &self,
        uow: &UnitOfWork,
        realm: &str,
        username: &str,
    ) -> DirectoryResult<Option<UserAdapter>> {
        debug!("get_user_by_username('{username}')");
        if let Some(cached) = uow.pending().by_username(username) {
            return Ok(Some(cached));
        }
        Ok(self
            .client
            .find_by_username(realm, username)
            .await?
            .map(|user| self.wrap_existing(realm, user)))
    }

    /// Look up a user by the host-visible id.
    ///
    /// The pending-write cache is consulted with the id as given; for the
    /// remote call the storage-scoped prefix is stripped. Unlike the other
    /// lookups a remote miss here is a hard error: the host only asks for
    /// ids it has previously been handed.
    pub async fn get_user_by_id(
        &self,
        uow: &UnitOfWork,
        realm: &str,
        id: &str,
    ) -> DirectoryResult<UserAdapter> {
        debug!("get_user_by_id('{id}')");
        if let Some(cached) = uow.pending().by_id(id) {
            return Ok(cached);
        }
        let external_id = storage_id::external_id(id);
        self.client
            .find_by_external_id(realm, external_id)
            .await?
            .map(|user| self.wrap_existing(realm, user))
            .ok_or_else(|| DirectoryError::user_not_found(external_id))
    }

    /// Look up a user by email; `None` on a miss.
    pub async fn get_user_by_email(
        &self,
        uow: &UnitOfWork,
        realm: &str,
        email: &str,
    ) -> DirectoryResult<Option<UserAdapter>> {
        debug!("get_user_by_email('{email}')");
        if let Some(cached) = uow.pending().by_email(email) {
            return Ok(Some(cached));
        }
        Ok(self
            .client
            .find_by_email(realm, email)
            .await?
            .map(|user| self.wrap_existing(realm, user)))
    }

    // ── Queries (always remote; pending users are not listed) ────────

    pub async fn users_count(&self, realm: &str) -> DirectoryResult<usize> {
        debug!("users_count()");
        self.client.count_users(realm).await
    }

    pub async fn get_users(
        &self,
        realm: &str,
        offset: usize,
        limit: usize,
    ) -> DirectoryResult<Vec<UserAdapter>> {
        debug!("get_users({offset}, {limit})");
        let users = self.client.list_users(realm, offset, limit).await?;
        Ok(self.wrap_all(realm, users))
    }

    pub async fn get_all_users(&self, realm: &str) -> DirectoryResult<Vec<UserAdapter>> {
        let (offset, limit) = FULL_BATCH;
        self.get_users(realm, offset, limit).await
    }

    pub async fn search_for_user(
        &self,
        realm: &str,
        search: &str,
        offset: usize,
        limit: usize,
    ) -> DirectoryResult<Vec<UserAdapter>> {
        debug!("search_for_user('{search}', {offset}, {limit})");
        let users = self.client.search_users(realm, search, offset, limit).await?;
        Ok(self.wrap_all(realm, users))
    }

    pub async fn search_all_for_user(
        &self,
        realm: &str,
        search: &str,
    ) -> DirectoryResult<Vec<UserAdapter>> {
        let (offset, limit) = FULL_BATCH;
        self.search_for_user(realm, search, offset, limit).await
    }

    pub async fn search_for_user_by_params(
        &self,
        realm: &str,
        params: &BTreeMap<String, String>,
        offset: usize,
        limit: usize,
    ) -> DirectoryResult<Vec<UserAdapter>> {
        debug!("search_for_user_by_params({params:?}, {offset}, {limit})");
        let users = self
            .client
            .search_users_by_params(realm, params, offset, limit)
            .await?;
        Ok(self.wrap_all(realm, users))
    }

    pub async fn search_all_for_user_by_params(
        &self,
        realm: &str,
        params: &BTreeMap<String, String>,
    ) -> DirectoryResult<Vec<UserAdapter>> {
        let (offset, limit) = FULL_BATCH;
        self.search_for_user_by_params(realm, params, offset, limit)
            .await
    }

    pub async fn search_for_user_by_attribute(
        &self,
        realm: &str,
        name: &str,
        value: &str,
    ) -> DirectoryResult<Vec<UserAdapter>> {
        debug!("search_for_user_by_attribute({name}, {value})");
        let params = BTreeMap::from([(name.to_string(), value.to_string())]);
        self.search_all_for_user_by_params(realm, &params).await
    }

    /// Members of a group, resolved through the `group` search parameter.
    pub async fn get_group_members(
        &self,
        realm: &str,
        group_name: &str,
        offset: usize,
        limit: usize,
    ) -> DirectoryResult<Vec<UserAdapter>> {
        debug!("get_group_members('{group_name}', {offset}, {limit})");
        let params = BTreeMap::from([("group".to_string(), group_name.to_string())]);
        self.search_for_user_by_params(realm, &params, offset, limit)
            .await
    }

    pub async fn get_all_group_members(
        &self,
        realm: &str,
        group_name: &str,
    ) -> DirectoryResult<Vec<UserAdapter>> {
        let (offset, limit) = FULL_BATCH;
        self.get_group_members(realm, group_name, offset, limit)
            .await
    }

    fn wrap_all(&self, realm: &str, users: Vec<UserEntity>) -> Vec<UserAdapter> {
        users
            .into_iter()
            .map(|user| self.wrap_existing(realm, user))
            .collect()
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Create a principal in memory and make it visible to lookups within
    /// this unit of work. The remote create happens at commit.
    pub fn add_user(&self, uow: &mut UnitOfWork, realm: &str, username: &str) -> UserAdapter {
        debug!("add_user({realm}, '{username}')");
        let adapter = UserAdapter::for_new(&self.provider_id, realm);
        adapter.set_username(uow, Some(username));
        uow.pending_mut().put(&adapter);
        adapter
    }

    /// Delete is not supported by the remote directory; always `false`.
    pub async fn remove_user(&self, user: &UserAdapter) -> bool {
        debug!("remove_user({:?})", user.username());
        match user.external_id() {
            Some(external_id) => self.client.remove_user(user.realm(), &external_id).await,
            None => false,
        }
    }

    // ── Credentials ──────────────────────────────────────────────────

    pub fn supports_credential_type(&self, credential_type: CredentialType) -> bool {
        matches!(credential_type, CredentialType::Password)
    }

    pub async fn is_configured_for(
        &self,
        user: &UserAdapter,
        credential_type: CredentialType,
    ) -> DirectoryResult<bool> {
        if !self.supports_credential_type(credential_type) {
            return Ok(false);
        }
        let Some(external_id) = user.external_id() else {
            return Ok(false);
        };
        self.client
            .is_password_configured(user.realm(), &external_id)
            .await
    }

    /// Validate a credential against the remote directory.
    ///
    /// A user that only exists in the pending-write cache has no remote
    /// record yet, so validating it is a consistency violation, not a
    /// failed login.
    pub async fn is_valid(
        &self,
        uow: &UnitOfWork,
        user: &UserAdapter,
        input: &CredentialInput,
    ) -> DirectoryResult<bool> {
        debug!("is_valid(username={:?})", user.username());
        match input {
            CredentialInput::Password(raw) => {
                if uow.pending().contains(user) {
                    return Err(DirectoryError::credentials_unavailable(
                        user.username().unwrap_or_default(),
                    ));
                }
                let Some(external_id) = user.external_id() else {
                    return Err(DirectoryError::credentials_unavailable(
                        user.username().unwrap_or_default(),
                    ));
                };
                Ok(self
                    .client
                    .verify_password(user.realm(), &external_id, Some(raw))
                    .await)
            }
        }
    }

    /// Install a new credential in memory and defer the remote write to
    /// commit time. Returns whether the credential kind was accepted.
    pub fn update_credential(
        &self,
        uow: &mut UnitOfWork,
        user: &UserAdapter,
        input: &CredentialInput,
    ) -> bool {
        debug!("update_credential(username={:?})", user.username());
        match input {
            CredentialInput::Password(raw) => {
                user.set_password(uow, raw);
                true
            }
        }
    }

    /// Disabling credentials is not supported by the remote directory.
    pub fn disable_credential_type(
        &self,
        _user: &UserAdapter,
        _credential_type: CredentialType,
    ) -> DirectoryResult<()> {
        Err(DirectoryError::unsupported("disable-credential"))
    }

    pub fn disableable_credential_types(&self) -> Vec<CredentialType> {
        Vec::new()
    }

    // ── Unit-of-work completion ──────────────────────────────────────

    /// Flush every deferred write enlisted in this unit of work, each
    /// exactly once, in enlistment order. The first failure aborts the
    /// commit and propagates untouched.
    pub async fn commit(&self, uow: &mut UnitOfWork) -> DirectoryResult<()> {
        let writes = uow.take_writes();
        debug!("commit(uow={}): {} deferred write(s)", uow.id(), writes.len());
        for write in writes {
            write.apply(&self.client).await?;
        }
        Ok(())
    }

    /// Abandon every deferred write without remote action. The in-memory
    /// entities keep their uncommitted mutations.
    pub fn rollback(&self, uow: &mut UnitOfWork) {
        let discarded = uow.take_writes().len();
        debug!("rollback(uow={}): discarded {discarded} deferred write(s)", uow.id());
    }
}
