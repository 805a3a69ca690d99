//! Reqwest-based implementation of [`RemoteDirectory`].
//!
//! The connector expects the following endpoints on the backend:
//!
//! - `GET /user` — list of users (`offset`, `limit`, `search`, `group` and
//!   free attribute query parameters)
//! - `GET /user/{username}` — user with the given username or external id
//! - `GET /user/mail/{mail}` — user with the given mail address
//! - `POST /user/validate/{username}` — 200 OK when the body password is valid
//!
//! Writing and deleting are not supported by the backend.

use crate::client::RemoteDirectory;
use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::model::UserEntity;
use log::{debug, error, warn};
use reqwest::header;
use reqwest::{Client, StatusCode, Url};
use std::collections::BTreeMap;

/// Stateless HTTP connector for the externalized user management service.
///
/// Authenticates every request with HTTP Basic credentials taken from the
/// [`DirectoryConfig`].
#[derive(Debug, Clone)]
pub struct HttpDirectoryClient {
    config: DirectoryConfig,
    http: Client,
    users_url: Url,
}

impl HttpDirectoryClient {
    /// Build a connector with a default HTTP client.
    pub fn new(config: DirectoryConfig) -> DirectoryResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("http-user-directory/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                DirectoryError::invalid_configuration(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self::with_http_client(config, http))
    }

    /// Build a connector around a pre-configured [`reqwest::Client`].
    pub fn with_http_client(config: DirectoryConfig, http: Client) -> Self {
        let users_url = join(config.url().clone(), &["user"]);
        Self {
            config,
            http,
            users_url,
        }
    }

    fn user_by_name_url(&self, username: &str) -> Url {
        join(self.users_url.clone(), &[username])
    }

    fn user_by_mail_url(&self, mail: &str) -> Url {
        join(self.users_url.clone(), &["mail", mail])
    }

    fn validate_url(&self, username: &str) -> Url {
        join(self.users_url.clone(), &["validate", username])
    }

    fn users_query_url(&self, offset: usize, limit: usize, extra: &[(&str, &str)]) -> Url {
        let mut url = self.users_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("offset", &offset.to_string());
            query.append_pair("limit", &limit.to_string());
            for (key, value) in extra {
                query.append_pair(key, value);
            }
        }
        url
    }

    async fn fetch(&self, url: Url) -> DirectoryResult<(StatusCode, String)> {
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .basic_auth(self.config.username(), Some(self.config.password()))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

/// Extend a URL path by literal segments, percent-encoding as needed.
fn join(mut url: Url, segments: &[&str]) -> Url {
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    url
}

/// Single-user responses: 200 with a body is a hit, everything else a miss.
fn decode_user(status: StatusCode, body: &str) -> DirectoryResult<Option<UserEntity>> {
    if status == StatusCode::OK && !body.is_empty() {
        Ok(Some(serde_json::from_str(body)?))
    } else {
        Ok(None)
    }
}

/// List responses: 200 with a body parses, 400 carries a remote error to the
/// caller, anything else degrades to an empty page.
fn decode_user_list(status: StatusCode, body: &str) -> DirectoryResult<Vec<UserEntity>> {
    if status == StatusCode::OK && !body.is_empty() {
        Ok(serde_json::from_str(body)?)
    } else if status == StatusCode::BAD_REQUEST {
        Err(DirectoryError::query_rejected(body))
    } else {
        warn!("user listing answered {status}, treating as empty");
        Ok(Vec::new())
    }
}

impl RemoteDirectory for HttpDirectoryClient {
    async fn find_by_external_id(
        &self,
        realm: &str,
        external_id: &str,
    ) -> DirectoryResult<Option<UserEntity>> {
        debug!("find_by_external_id({realm}, {external_id})");
        let (status, body) = self.fetch(self.user_by_name_url(external_id)).await?;
        decode_user(status, &body)
    }

    async fn find_by_username(
        &self,
        realm: &str,
        username: &str,
    ) -> DirectoryResult<Option<UserEntity>> {
        debug!("find_by_username({realm}, {username})");
        let (status, body) = self.fetch(self.user_by_name_url(username)).await?;
        decode_user(status, &body)
    }

    async fn find_by_email(&self, realm: &str, email: &str) -> DirectoryResult<Option<UserEntity>> {
        debug!("find_by_email({realm}, {email})");
        let (status, body) = self.fetch(self.user_by_mail_url(email)).await?;
        decode_user(status, &body)
    }

    async fn list_users(
        &self,
        realm: &str,
        offset: usize,
        limit: usize,
    ) -> DirectoryResult<Vec<UserEntity>> {
        debug!("list_users({realm}, {offset}, {limit})");
        let url = self.users_query_url(offset, limit, &[]);
        let (status, body) = self.fetch(url).await?;
        decode_user_list(status, &body)
    }

    async fn search_users(
        &self,
        realm: &str,
        search: &str,
        offset: usize,
        limit: usize,
    ) -> DirectoryResult<Vec<UserEntity>> {
        debug!("search_users({realm}, '{search}', {offset}, {limit})");
        let url = self.users_query_url(offset, limit, &[("search", search)]);
        let (status, body) = self.fetch(url).await?;
        decode_user_list(status, &body)
    }

    async fn search_users_by_params(
        &self,
        realm: &str,
        params: &BTreeMap<String, String>,
        offset: usize,
        limit: usize,
    ) -> DirectoryResult<Vec<UserEntity>> {
        debug!("search_users_by_params({realm}, {params:?}, {offset}, {limit})");
        let extra: Vec<(&str, &str)> = params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        let url = self.users_query_url(offset, limit, &extra);
        let (status, body) = self.fetch(url).await?;
        decode_user_list(status, &body)
    }

    /// Derived from a bounded list probe; the backend has no count endpoint,
    /// so anything at or above the probe size is reported as the probe size.
    async fn count_users(&self, realm: &str) -> DirectoryResult<usize> {
        debug!("count_users({realm})");
        let probe = self.config.sync_batch_size();
        Ok(self.list_users(realm, 0, probe).await?.len())
    }

    async fn verify_password(
        &self,
        realm: &str,
        external_id: &str,
        password: Option<&str>,
    ) -> bool {
        let Some(password) = password else {
            debug!("verify_password({realm}, {external_id}, None) = false");
            return false;
        };

        let url = self.validate_url(external_id);
        debug!("POST {url}");
        let result = self
            .http
            .post(url)
            .basic_auth(self.config.username(), Some(self.config.password()))
            .header(header::CONTENT_TYPE, "application/json")
            .body(password.to_string())
            .send()
            .await;
        match result {
            Ok(response) => {
                debug!("verify_password({realm}, {external_id}) = {}", response.status());
                response.status() == StatusCode::OK
            }
            Err(err) => {
                error!("could not validate password: {err}");
                false
            }
        }
    }

    // The backend does not expose credential metadata yet; answered
    // affirmatively until it does.
    async fn is_password_configured(&self, realm: &str, external_id: &str) -> DirectoryResult<bool> {
        debug!("is_password_configured({realm}, {external_id})");
        Ok(true)
    }

    async fn create_user(&self, realm: &str, user: &UserEntity) -> DirectoryResult<UserEntity> {
        debug!("create_user({realm}, {:?})", user.username());
        Err(DirectoryError::unsupported("create"))
    }

    // The backend exposes no update endpoint; the write is accepted and
    // dropped, which is all the best-effort contract promises.
    async fn update_user(&self, realm: &str, user: &UserEntity) -> DirectoryResult<()> {
        debug!("update_user({realm}, {:?})", user.username());
        Ok(())
    }

    async fn remove_user(&self, realm: &str, external_id: &str) -> bool {
        debug!("remove_user({realm}, {external_id}) = false");
        false
    }
}
