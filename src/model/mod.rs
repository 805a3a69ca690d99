//! In-memory representation of remote directory principals.
//!
//! [`UserEntity`] mirrors the JSON schema the remote directory speaks;
//! [`GroupView`] and [`RoleView`] are materialized on demand from the
//! combined groups-and-roles mapping carried on each user.

pub mod group;
pub mod user;

pub use group::{GroupView, RoleView};
pub use user::UserEntity;
