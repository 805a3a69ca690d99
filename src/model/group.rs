//! Group and role views derived from a user's groups-and-roles mapping.
//!
//! The remote directory models groups and roles as name-scoped labels
//! attached to a user, not as addressable entities. Views are therefore
//! materialized on demand and compare equal by name alone; two
//! materializations of the same name are interchangeable.

use log::warn;
use std::hash::{Hash, Hasher};

/// A group a user belongs to, with the role names granted through it.
#[derive(Debug, Clone)]
pub struct GroupView {
    name: String,
    roles: Vec<String>,
    realm: String,
}

impl GroupView {
    pub fn new(name: impl Into<String>, roles: Vec<String>, realm: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles,
            realm: realm.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn role_names(&self) -> &[String] {
        &self.roles
    }

    pub fn role_mappings(&self) -> Vec<RoleView> {
        self.roles
            .iter()
            .map(|role| RoleView::new(role.clone(), self.realm.clone()))
            .collect()
    }

    pub fn has_role(&self, role: &RoleView) -> bool {
        self.roles.iter().any(|name| name == role.name())
    }

    /// Grant a role on this materialized view.
    ///
    /// The change is local to this view; the remote directory does not
    /// support group/role writes.
    pub fn grant_role(&mut self, role: impl Into<String>) {
        let role = role.into();
        warn!(
            "grant_role({role}) on group '{}' is local-only and will not reach the remote directory",
            self.name
        );
        self.roles.push(role);
    }

    /// Remove a role from this materialized view. Local-only, like
    /// [`grant_role`](Self::grant_role).
    pub fn remove_role(&mut self, role: &str) {
        warn!(
            "remove_role({role}) on group '{}' is local-only and will not reach the remote directory",
            self.name
        );
        self.roles.retain(|name| name != role);
    }
}

// Name-scoped identity: the remote directory has no group ids.
impl PartialEq for GroupView {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for GroupView {}

impl Hash for GroupView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// A role granted to a user, identified by name within its realm.
#[derive(Debug, Clone)]
pub struct RoleView {
    name: String,
    realm: String,
}

impl RoleView {
    pub fn new(name: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            realm: realm.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// The remote schema carries no role description; the name stands in.
    pub fn description(&self) -> &str {
        &self.name
    }
}

impl PartialEq for RoleView {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RoleView {}

impl Hash for RoleView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_compare_by_name_only() {
        let a = GroupView::new("admins", vec!["audit".into()], "realm-a");
        let b = GroupView::new("admins", vec![], "realm-b");
        let c = GroupView::new("devs", vec!["audit".into()], "realm-a");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn roles_compare_by_name_only() {
        assert_eq!(RoleView::new("ops", "x"), RoleView::new("ops", "y"));
        assert_ne!(RoleView::new("ops", "x"), RoleView::new("audit", "x"));
    }

    #[test]
    fn role_description_falls_back_to_name() {
        assert_eq!(RoleView::new("ops", "x").description(), "ops");
    }

    #[test]
    fn role_grants_stay_local() {
        let mut group = GroupView::new("admins", vec!["audit".into()], "realm-a");
        group.grant_role("ops");
        assert!(group.has_role(&RoleView::new("ops", "realm-a")));
        group.remove_role("audit");
        assert!(!group.has_role(&RoleView::new("audit", "realm-a")));
    }
}
