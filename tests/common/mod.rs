//! Shared test harness: a scripted in-memory remote directory that records
//! every call the consistency layer makes.
#![allow(dead_code)]

use http_user_directory::{DirectoryError, DirectoryResult, RemoteDirectory, UserEntity};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One remote interaction, as observed at the client seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    FindByExternalId {
        realm: String,
        external_id: String,
    },
    FindByUsername {
        realm: String,
        username: String,
    },
    FindByEmail {
        realm: String,
        email: String,
    },
    List {
        realm: String,
        offset: usize,
        limit: usize,
    },
    Search {
        realm: String,
        search: String,
        offset: usize,
        limit: usize,
    },
    SearchByParams {
        realm: String,
        params: Vec<(String, String)>,
        offset: usize,
        limit: usize,
    },
    Count {
        realm: String,
    },
    VerifyPassword {
        realm: String,
        external_id: String,
        password: Option<String>,
    },
    PasswordConfigured {
        realm: String,
        external_id: String,
    },
    Create {
        realm: String,
        username: Option<String>,
    },
    Update {
        realm: String,
        external_id: Option<String>,
    },
    Remove {
        realm: String,
        external_id: String,
    },
}

#[derive(Debug, Default)]
struct State {
    users: Vec<UserEntity>,
    calls: Vec<RemoteCall>,
    deny_creates: bool,
    verify_result: bool,
    next_id: u32,
}

/// In-memory stand-in for the remote directory.
///
/// Unlike the production deployment profile it accepts creates (unless told
/// otherwise), so commit flows can be exercised end to end.
#[derive(Debug, Clone, Default)]
pub struct RecordingDirectory {
    state: Arc<Mutex<State>>,
}

impl RecordingDirectory {
    pub fn new() -> Self {
        let directory = Self::default();
        directory.state.lock().unwrap().verify_result = true;
        directory
    }

    pub fn seed_user(&self, user: UserEntity) {
        self.state.lock().unwrap().users.push(user);
    }

    /// Make creates fail like the production read-only profile does.
    pub fn deny_creates(&self) {
        self.state.lock().unwrap().deny_creates = true;
    }

    pub fn set_verify_result(&self, result: bool) {
        self.state.lock().unwrap().verify_result = result;
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&RemoteCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    pub fn stored_user(&self, username: &str) -> Option<UserEntity> {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|user| user.username() == Some(username))
            .cloned()
    }
}

/// Clone a user, stamping the id the remote side would assign.
fn with_assigned_id(user: &UserEntity, id: String) -> UserEntity {
    let mut value = serde_json::to_value(user).expect("user serializes");
    value["id"] = serde_json::Value::String(id);
    serde_json::from_value(value).expect("user deserializes")
}

impl RemoteDirectory for RecordingDirectory {
    async fn find_by_external_id(
        &self,
        realm: &str,
        external_id: &str,
    ) -> DirectoryResult<Option<UserEntity>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::FindByExternalId {
            realm: realm.to_string(),
            external_id: external_id.to_string(),
        });
        Ok(state
            .users
            .iter()
            .find(|user| user.id() == Some(external_id))
            .cloned())
    }

    async fn find_by_username(
        &self,
        realm: &str,
        username: &str,
    ) -> DirectoryResult<Option<UserEntity>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::FindByUsername {
            realm: realm.to_string(),
            username: username.to_string(),
        });
        Ok(state
            .users
            .iter()
            .find(|user| user.username() == Some(username))
            .cloned())
    }

    async fn find_by_email(&self, realm: &str, email: &str) -> DirectoryResult<Option<UserEntity>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::FindByEmail {
            realm: realm.to_string(),
            email: email.to_string(),
        });
        Ok(state
            .users
            .iter()
            .find(|user| user.email() == Some(email))
            .cloned())
    }

    async fn list_users(
        &self,
        realm: &str,
        offset: usize,
        limit: usize,
    ) -> DirectoryResult<Vec<UserEntity>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::List {
            realm: realm.to_string(),
            offset,
            limit,
        });
        Ok(state.users.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn search_users(
        &self,
        realm: &str,
        search: &str,
        offset: usize,
        limit: usize,
    ) -> DirectoryResult<Vec<UserEntity>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::Search {
            realm: realm.to_string(),
            search: search.to_string(),
            offset,
            limit,
        });
        Ok(state
            .users
            .iter()
            .filter(|user| {
                user.username().is_some_and(|name| name.contains(search))
                    || user.email().is_some_and(|mail| mail.contains(search))
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search_users_by_params(
        &self,
        realm: &str,
        params: &BTreeMap<String, String>,
        offset: usize,
        limit: usize,
    ) -> DirectoryResult<Vec<UserEntity>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::SearchByParams {
            realm: realm.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            offset,
            limit,
        });
        Ok(state
            .users
            .iter()
            .filter(|user| {
                params.iter().all(|(key, value)| {
                    if key == "group" {
                        user.groups_and_roles().contains_key(value)
                    } else {
                        user.attribute(key).contains(value)
                    }
                })
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_users(&self, realm: &str) -> DirectoryResult<usize> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::Count {
            realm: realm.to_string(),
        });
        Ok(state.users.len())
    }

    async fn verify_password(
        &self,
        realm: &str,
        external_id: &str,
        password: Option<&str>,
    ) -> bool {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::VerifyPassword {
            realm: realm.to_string(),
            external_id: external_id.to_string(),
            password: password.map(str::to_string),
        });
        password.is_some() && state.verify_result
    }

    async fn is_password_configured(&self, realm: &str, external_id: &str) -> DirectoryResult<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::PasswordConfigured {
            realm: realm.to_string(),
            external_id: external_id.to_string(),
        });
        Ok(true)
    }

    async fn create_user(&self, realm: &str, user: &UserEntity) -> DirectoryResult<UserEntity> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::Create {
            realm: realm.to_string(),
            username: user.username().map(str::to_string),
        });
        if state.deny_creates {
            return Err(DirectoryError::unsupported("create"));
        }
        let stored = match user.id() {
            Some(_) => user.clone(),
            None => {
                state.next_id += 1;
                with_assigned_id(user, format!("gen-{}", state.next_id))
            }
        };
        state.users.push(stored.clone());
        Ok(stored)
    }

    async fn update_user(&self, realm: &str, user: &UserEntity) -> DirectoryResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::Update {
            realm: realm.to_string(),
            external_id: user.id().map(str::to_string),
        });
        if let Some(stored) = state
            .users
            .iter_mut()
            .find(|candidate| candidate.id() == user.id())
        {
            *stored = user.clone();
        }
        Ok(())
    }

    async fn remove_user(&self, realm: &str, external_id: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RemoteCall::Remove {
            realm: realm.to_string(),
            external_id: external_id.to_string(),
        });
        false
    }
}

/// A persisted user as the remote directory would return it.
pub fn remote_user(id: &str, username: &str, email: &str) -> UserEntity {
    let mut user = UserEntity::with_id(id);
    user.set_username(Some(username.to_string()));
    user.set_email(Some(email.to_string()));
    user.set_enabled(true);
    user
}
