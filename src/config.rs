//! Connection configuration for the remote directory.
//!
//! The configuration surface is deliberately small: a base URL plus HTTP
//! Basic credentials, validated once at construction. The password is never
//! exposed through `Debug` or `Display`.

use crate::error::{DirectoryError, DirectoryResult};
use reqwest::Url;
use std::fmt;

/// Batch size used when synchronizing users page by page.
///
/// Unused while pagination is disabled, but kept as the single place the
/// probe/batch width is defined.
pub const SYNC_BATCH_SIZE: usize = 100;

/// Validated connection settings for one remote directory deployment.
#[derive(Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    url: Url,
    username: String,
    password: String,
}

impl DirectoryConfig {
    /// Validate and build a configuration.
    ///
    /// The url must be an absolute hierarchical URL, and both credentials
    /// must be non-blank; anything else is an
    /// [`DirectoryError::InvalidConfiguration`].
    pub fn new(
        url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> DirectoryResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| DirectoryError::invalid_configuration(format!("url is not valid: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(DirectoryError::invalid_configuration(
                "url must be a hierarchical http(s) URL",
            ));
        }

        let username = username.into();
        if username.trim().is_empty() {
            return Err(DirectoryError::invalid_configuration("username is not set"));
        }
        let password = password.into();
        if password.trim().is_empty() {
            return Err(DirectoryError::invalid_configuration("password is not set"));
        }

        Ok(Self {
            url,
            username,
            password,
        })
    }

    /// Base URL of the remote directory service.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Basic-auth username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Basic-auth password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether paged synchronization is enabled.
    ///
    /// Fixed off in this revision; the remote endpoints accept offset/limit
    /// but the full batch is always requested.
    pub fn pagination_enabled(&self) -> bool {
        false
    }

    /// Page width for synchronization, meaningful once
    /// [`pagination_enabled`](Self::pagination_enabled) returns true.
    pub fn sync_batch_size(&self) -> usize {
        SYNC_BATCH_SIZE
    }
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (user {})", self.url, self.username)
    }
}
