//! Federation of an HTTP-backed user management service into a host
//! identity runtime.
//!
//! The remote service is the system of record but is slow, read-mostly and
//! reachable only over a lookup/validate API. This crate supplies the
//! consistency layer the host expects of a local user directory:
//!
//! - [`DirectoryProvider`] — lookup, query and credential contracts,
//!   composing the pending-write cache with the remote client
//! - [`UnitOfWork`] — request-scoped context making freshly created users
//!   visible to same-request lookups and buffering writes until commit
//! - [`RemoteDirectory`] / [`HttpDirectoryClient`] — the wire seam and its
//!   reqwest implementation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use http_user_directory::{DirectoryConfig, DirectoryProvider, HttpDirectoryClient, UnitOfWork};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DirectoryConfig::new("https://users.example.com/api", "svc", "s3cret")?;
//! let client = HttpDirectoryClient::new(config)?;
//! let provider = DirectoryProvider::new("directory-main", client);
//!
//! let uow = UnitOfWork::new();
//! if let Some(user) = provider.get_user_by_username(&uow, "realm-a", "alice").await? {
//!     println!("found {:?}", user.username());
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod model;
pub mod provider;
pub mod storage_id;
pub mod unit_of_work;
pub mod write;

// Re-export commonly used types for convenience
pub use adapter::UserAdapter;
pub use client::{HttpDirectoryClient, RemoteDirectory};
pub use config::DirectoryConfig;
pub use credential::{CredentialInput, CredentialType};
pub use error::{DirectoryError, DirectoryResult};
pub use model::{GroupView, RoleView, UserEntity};
pub use provider::DirectoryProvider;
pub use unit_of_work::{PendingUsers, UnitOfWork};
pub use write::WriteState;
