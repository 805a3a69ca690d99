//! The user entity exchanged with the remote directory.

use crate::model::group::{GroupView, RoleView};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// A directory principal as stored by the remote service.
///
/// Field names map one-to-one onto the remote JSON schema (camelCase on the
/// wire); unknown keys in remote payloads are ignored. The id is assigned by
/// the remote directory and is absent on principals that have not been
/// persisted yet.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserEntity {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_timestamp: Option<i64>,
    enabled: bool,
    attributes: HashMap<String, Vec<String>>,
    required_actions: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    email_verified: bool,
    groups_and_roles: HashMap<String, Vec<String>>,
}

impl UserEntity {
    /// A principal that does not exist in the remote directory yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A principal already persisted under the given remote id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Adopt the remote-assigned id after the first successful write.
    ///
    /// The id is immutable once set; later calls are ignored.
    pub(crate) fn assign_id(&mut self, id: impl Into<String>) {
        if self.id.is_none() {
            self.id = Some(id.into());
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn set_username(&mut self, username: Option<String>) {
        self.username = username;
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn set_password(&mut self, password: Option<String>) {
        self.password = password;
    }

    pub fn created_timestamp(&self) -> Option<i64> {
        self.created_timestamp
    }

    pub fn set_created_timestamp(&mut self, timestamp: Option<i64>) {
        self.created_timestamp = timestamp;
    }

    /// Creation instant, interpreting the wire value as epoch milliseconds.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_timestamp
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn set_email(&mut self, email: Option<String>) {
        self.email = email;
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn set_first_name(&mut self, first_name: Option<String>) {
        self.first_name = first_name;
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn set_last_name(&mut self, last_name: Option<String>) {
        self.last_name = last_name;
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn set_email_verified(&mut self, verified: bool) {
        self.email_verified = verified;
    }

    // ── Custom attributes ────────────────────────────────────────────

    pub fn attributes(&self) -> &HashMap<String, Vec<String>> {
        &self.attributes
    }

    /// All values of one attribute, empty when the attribute is absent.
    pub fn attribute(&self, name: &str) -> &[String] {
        self.attributes.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value of one attribute.
    pub fn first_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn set_single_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), vec![value.into()]);
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.attributes.insert(name.into(), values);
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    // ── Required actions ─────────────────────────────────────────────

    pub fn required_actions(&self) -> &BTreeSet<String> {
        &self.required_actions
    }

    pub fn add_required_action(&mut self, action: impl Into<String>) {
        self.required_actions.insert(action.into());
    }

    pub fn remove_required_action(&mut self, action: &str) {
        self.required_actions.remove(action);
    }

    // ── Groups and roles ─────────────────────────────────────────────

    /// The combined group-to-roles mapping as stored remotely.
    pub fn groups_and_roles(&self) -> &HashMap<String, Vec<String>> {
        &self.groups_and_roles
    }

    pub fn set_groups_and_roles(&mut self, groups_and_roles: HashMap<String, Vec<String>>) {
        self.groups_and_roles = groups_and_roles;
    }

    /// Materialize one view per group this user belongs to.
    pub fn groups(&self, realm: &str) -> Vec<GroupView> {
        self.groups_and_roles
            .iter()
            .map(|(name, roles)| GroupView::new(name.clone(), roles.clone(), realm))
            .collect()
    }

    /// Materialize the distinct roles held across all groups.
    pub fn role_mappings(&self, realm: &str) -> Vec<RoleView> {
        let mut seen = HashSet::new();
        self.groups_and_roles
            .values()
            .flatten()
            .filter(|role| seen.insert(role.as_str()))
            .map(|role| RoleView::new(role.clone(), realm))
            .collect()
    }

    pub fn is_member_of(&self, group: &GroupView) -> bool {
        self.groups_and_roles.contains_key(group.name())
    }

    pub fn has_role(&self, role: &RoleView) -> bool {
        self.groups_and_roles
            .values()
            .flatten()
            .any(|name| name == role.name())
    }
}

impl fmt::Debug for UserEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // password deliberately omitted
        f.debug_struct("UserEntity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("email_verified", &self.email_verified)
            .field("created_timestamp", &self.created_timestamp)
            .field("enabled", &self.enabled)
            .field("groups_and_roles", &self.groups_and_roles)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_the_remote_schema_and_ignores_unknown_keys() {
        let payload = json!({
            "id": "ext-7",
            "username": "alice",
            "email": "alice@example.com",
            "firstName": "Alice",
            "lastName": "Archer",
            "enabled": true,
            "emailVerified": true,
            "createdTimestamp": 1_700_000_000_000_i64,
            "attributes": {"locale": ["de"]},
            "groupsAndRoles": {"admins": ["manage-users"]},
            "groupsCount": 1,
            "roleMappings": ["ignored"]
        });

        let user: UserEntity = serde_json::from_value(payload).unwrap();
        assert_eq!(user.id(), Some("ext-7"));
        assert_eq!(user.username(), Some("alice"));
        assert_eq!(user.first_name(), Some("Alice"));
        assert_eq!(user.last_name(), Some("Archer"));
        assert!(user.is_enabled());
        assert!(user.is_email_verified());
        assert_eq!(user.first_attribute("locale"), Some("de"));
        assert_eq!(user.groups_and_roles()["admins"], vec!["manage-users"]);
    }

    #[test]
    fn serializes_without_absent_fields() {
        let user = UserEntity::new();
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("username").is_none());
        assert!(value.get("password").is_none());
    }

    #[test]
    fn id_is_immutable_once_assigned() {
        let mut user = UserEntity::with_id("ext-1");
        user.assign_id("ext-2");
        assert_eq!(user.id(), Some("ext-1"));
    }

    #[test]
    fn attribute_operations() {
        let mut user = UserEntity::new();
        user.set_single_attribute("locale", "de");
        assert_eq!(user.first_attribute("locale"), Some("de"));

        user.set_attribute("mail-alias", vec!["a@x".into(), "b@x".into()]);
        assert_eq!(user.attribute("mail-alias").len(), 2);

        user.remove_attribute("locale");
        assert_eq!(user.first_attribute("locale"), None);
        assert!(user.attribute("locale").is_empty());
    }

    #[test]
    fn derives_groups_and_distinct_roles() {
        let mut user = UserEntity::new();
        user.set_groups_and_roles(HashMap::from([
            ("admins".to_string(), vec!["audit".to_string(), "ops".to_string()]),
            ("devs".to_string(), vec!["ops".to_string()]),
        ]));

        let mut groups: Vec<String> = user
            .groups("realm-a")
            .into_iter()
            .map(|g| g.name().to_string())
            .collect();
        groups.sort();
        assert_eq!(groups, vec!["admins", "devs"]);

        let mut roles: Vec<String> = user
            .role_mappings("realm-a")
            .into_iter()
            .map(|r| r.name().to_string())
            .collect();
        roles.sort();
        assert_eq!(roles, vec!["audit", "ops"]);

        assert!(user.is_member_of(&GroupView::new("admins", vec![], "realm-a")));
        assert!(user.has_role(&RoleView::new("ops", "realm-a")));
        assert!(!user.has_role(&RoleView::new("root", "realm-a")));
    }

    #[test]
    fn created_at_converts_epoch_millis() {
        let mut user = UserEntity::new();
        assert_eq!(user.created_at(), None);
        user.set_created_timestamp(Some(0));
        assert_eq!(user.created_at().unwrap().timestamp(), 0);
    }

    #[test]
    fn debug_never_reveals_password() {
        let mut user = UserEntity::new();
        user.set_password(Some("hunter2".into()));
        assert!(!format!("{user:?}").contains("hunter2"));
    }
}
