//! Access to the remote directory service.
//!
//! [`RemoteDirectory`] is the seam between the consistency layer and the
//! wire: the facade and the write coordinator only ever talk to this trait.
//! [`HttpDirectoryClient`] is the production implementation; tests substitute
//! scripted in-memory directories.

pub mod http;

pub use http::HttpDirectoryClient;

use crate::error::DirectoryResult;
use crate::model::UserEntity;
use std::collections::BTreeMap;
use std::future::Future;

/// Request/response contract of the externalized user management service.
///
/// All operations are realm-scoped and stateless; implementations hold no
/// per-user state. Lookup misses are `None`, listing failures other than a
/// malformed query degrade to empty results, and password verification
/// never raises.
pub trait RemoteDirectory: Send + Sync {
    /// Look up one user by the id the remote directory assigned.
    ///
    /// `Some` requires an HTTP 200 with a body; any other status is a miss.
    fn find_by_external_id(
        &self,
        realm: &str,
        external_id: &str,
    ) -> impl Future<Output = DirectoryResult<Option<UserEntity>>> + Send;

    /// Look up one user by username. Same success contract as
    /// [`find_by_external_id`](Self::find_by_external_id).
    fn find_by_username(
        &self,
        realm: &str,
        username: &str,
    ) -> impl Future<Output = DirectoryResult<Option<UserEntity>>> + Send;

    /// Look up one user by email address. Same success contract as
    /// [`find_by_external_id`](Self::find_by_external_id).
    fn find_by_email(
        &self,
        realm: &str,
        email: &str,
    ) -> impl Future<Output = DirectoryResult<Option<UserEntity>>> + Send;

    /// Page through all users.
    fn list_users(
        &self,
        realm: &str,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = DirectoryResult<Vec<UserEntity>>> + Send;

    /// Free-text search over users.
    fn search_users(
        &self,
        realm: &str,
        search: &str,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = DirectoryResult<Vec<UserEntity>>> + Send;

    /// Search users by attribute name/value pairs (including the `group`
    /// membership filter).
    fn search_users_by_params(
        &self,
        realm: &str,
        params: &BTreeMap<String, String>,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = DirectoryResult<Vec<UserEntity>>> + Send;

    /// Total number of users.
    ///
    /// The remote service has no count endpoint, so implementations derive
    /// this from a bounded list probe; the result is not authoritative above
    /// the probe size.
    fn count_users(&self, realm: &str) -> impl Future<Output = DirectoryResult<usize>> + Send;

    /// Verify a password against the remote directory.
    ///
    /// A `None` password short-circuits to `false` without a remote call,
    /// and every transport failure is swallowed into `false`: authentication
    /// fails closed and never raises.
    fn verify_password(
        &self,
        realm: &str,
        external_id: &str,
        password: Option<&str>,
    ) -> impl Future<Output = bool> + Send;

    /// Whether a password is configured for the user.
    fn is_password_configured(
        &self,
        realm: &str,
        external_id: &str,
    ) -> impl Future<Output = DirectoryResult<bool>> + Send;

    /// Create a user in the remote directory, returning the stored entity.
    fn create_user(
        &self,
        realm: &str,
        user: &UserEntity,
    ) -> impl Future<Output = DirectoryResult<UserEntity>> + Send;

    /// Push the current state of an already-persisted user.
    fn update_user(
        &self,
        realm: &str,
        user: &UserEntity,
    ) -> impl Future<Output = DirectoryResult<()>> + Send;

    /// Delete a user; `true` when the user was removed.
    fn remove_user(&self, realm: &str, external_id: &str) -> impl Future<Output = bool> + Send;
}
