//! Storage-scoped user identifiers.
//!
//! The host runtime may federate several directories at once, so the ids it
//! hands around carry a `f:<provider-id>:` prefix naming the owning
//! provider. The remote directory only ever sees the bare external id.

const FEDERATED_PREFIX: &str = "f:";

/// Compose the host-visible id for an external id owned by `provider_id`.
pub fn local_id(provider_id: &str, external_id: &str) -> String {
    format!("{FEDERATED_PREFIX}{provider_id}:{external_id}")
}

/// Strip the storage-scoped prefix from a host-visible id.
///
/// Ids without the prefix are returned unchanged, so callers can pass either
/// form. Colons inside the external id itself are preserved.
pub fn external_id(id: &str) -> &str {
    id.strip_prefix(FEDERATED_PREFIX)
        .and_then(|rest| rest.split_once(':'))
        .map(|(_, external)| external)
        .unwrap_or(id)
}
