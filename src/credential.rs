//! Credential kinds accepted by the directory facade.
//!
//! Credential kinds are a closed set so every call site handles them
//! exhaustively; the remote directory only knows how to validate passwords.

use std::fmt;

/// The credential kinds this provider can answer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialType {
    Password,
}

impl CredentialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::Password => "password",
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential value presented for validation or update.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialInput {
    /// A raw password challenge, exactly as entered by the subject.
    Password(String),
}

impl CredentialInput {
    pub fn credential_type(&self) -> CredentialType {
        match self {
            CredentialInput::Password(_) => CredentialType::Password,
        }
    }

    /// The secret carried by this input.
    pub fn secret(&self) -> &str {
        match self {
            CredentialInput::Password(raw) => raw,
        }
    }
}

impl fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialInput::Password(_) => f.debug_tuple("Password").field(&"<redacted>").finish(),
        }
    }
}
