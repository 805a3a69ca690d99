//! Deferred remote writes, flushed once per unit of work.

use crate::adapter::{AdapterInner, lock};
use crate::client::RemoteDirectory;
use crate::error::DirectoryResult;
use log::debug;
use std::sync::{Arc, Mutex};

/// Lifecycle of a deferred write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    /// Not registered with any unit of work.
    Idle,
    /// Registered, waiting for commit.
    Enlisted,
    /// Flush attempted; terminal for this mutation cycle.
    Applied,
}

/// One-shot write-through unit owned by a single adapter.
///
/// The first mutation after construction (or after the previous flush)
/// enlists the unit into the current unit of work; further mutations in the
/// same unit of work are no-ops. At commit the unit applies exactly one
/// remote write: `create` for a never-persisted entity, `update` otherwise.
#[derive(Debug)]
pub struct RemoteWrite {
    realm: String,
    state: Mutex<WriteState>,
    subject: Arc<Mutex<AdapterInner>>,
}

impl RemoteWrite {
    pub(crate) fn new(realm: String, subject: Arc<Mutex<AdapterInner>>) -> Self {
        Self {
            realm,
            state: Mutex::new(WriteState::Idle),
            subject,
        }
    }

    pub fn state(&self) -> WriteState {
        *lock(&self.state)
    }

    /// Move to enlisted; `true` when the caller must register this unit
    /// with the unit of work, `false` when it already is enlisted.
    pub(crate) fn try_enlist(&self) -> bool {
        let mut state = lock(&self.state);
        if *state == WriteState::Enlisted {
            return false;
        }
        *state = WriteState::Enlisted;
        true
    }

    /// Flush the buffered mutation set to the remote directory.
    ///
    /// Idempotent: only an enlisted unit issues a remote call. The state
    /// moves to [`WriteState::Applied`] before the call so a failing flush
    /// is never retried; the error reaches the commit path untouched.
    pub(crate) async fn apply<C: RemoteDirectory>(&self, client: &C) -> DirectoryResult<()> {
        {
            let mut state = lock(&self.state);
            if *state != WriteState::Enlisted {
                debug!("deferred write not enlisted, nothing to flush");
                return Ok(());
            }
            *state = WriteState::Applied;
        }

        let (user, persisted) = {
            let inner = lock(&self.subject);
            (inner.entity.clone(), inner.persisted)
        };

        if persisted {
            debug!("flushing update for {:?}", user.username());
            client.update_user(&self.realm, &user).await
        } else {
            debug!("flushing create for {:?}", user.username());
            let stored = client.create_user(&self.realm, &user).await?;
            let mut inner = lock(&self.subject);
            if let Some(id) = stored.id() {
                inner.entity.assign_id(id);
            }
            inner.persisted = true;
            Ok(())
        }
    }
}
