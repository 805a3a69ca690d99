//! Error types for directory federation operations.
//!
//! A single crate-level error enum covers configuration validation, remote
//! transport failures, payload decoding, and the consistency rules enforced
//! by the facade. Expected lookup misses are modelled as `Option`/empty
//! results, never as errors.

/// Main error type for directory federation operations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Configuration rejected at validation time (url, username, password)
    #[error("Invalid directory configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The remote directory answered a list/search request with HTTP 400;
    /// the remote error body is preserved verbatim
    #[error("Remote directory rejected the query: {detail}")]
    QueryRejected { detail: String },

    /// Lookup by external id came back empty from the remote directory
    #[error("No user found for external id '{external_id}'")]
    UserNotFound { external_id: String },

    /// Operation the remote directory does not support in this deployment
    /// profile (create, delete, disable-credential)
    #[error("Operation '{operation}' is not supported by the remote directory")]
    Unsupported { operation: &'static str },

    /// Credential validation requested for a principal that only exists in
    /// the pending-write cache; there is no remote record to validate against
    #[error("Cannot validate credentials for '{username}': user is not persisted in the remote directory yet")]
    CredentialsUnavailable { username: String },

    /// Transport-level failure talking to the remote directory
    #[error("Remote directory request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote directory returned a 200 body that does not match the
    /// expected user schema
    #[error("Malformed remote directory payload: {0}")]
    Payload(#[from] serde_json::Error),
}

// Convenience constructors for the struct variants
impl DirectoryError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub fn query_rejected(detail: impl Into<String>) -> Self {
        Self::QueryRejected {
            detail: detail.into(),
        }
    }

    pub fn user_not_found(external_id: impl Into<String>) -> Self {
        Self::UserNotFound {
            external_id: external_id.into(),
        }
    }

    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    pub fn credentials_unavailable(username: impl Into<String>) -> Self {
        Self::CredentialsUnavailable {
            username: username.into(),
        }
    }
}

/// Result type alias used throughout the crate.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_rejected_preserves_remote_body() {
        let error = DirectoryError::query_rejected("bad filter");
        assert!(error.to_string().contains("bad filter"));
    }

    #[test]
    fn user_not_found_names_the_id() {
        let error = DirectoryError::user_not_found("ext-42");
        assert!(error.to_string().contains("ext-42"));
    }

    #[test]
    fn unsupported_names_the_operation() {
        let error = DirectoryError::unsupported("create");
        assert!(error.to_string().contains("'create'"));
    }
}
