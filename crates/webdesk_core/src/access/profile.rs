//! Subject access profiles: permission grants and leveled roles.

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Profile construction/mutation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    EmptySubject,
    EmptyPermission,
    EmptyRole,
}

impl Display for ProfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySubject => write!(f, "subject id must not be empty"),
            Self::EmptyPermission => write!(f, "permission id must not be empty"),
            Self::EmptyRole => write!(f, "role name must not be empty"),
        }
    }
}

impl Error for ProfileError {}

/// Normalizes a permission or role identifier.
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// One subject's local access state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessProfile {
    subject: String,
    permissions: BTreeSet<String>,
    /// Role name to privilege level; higher levels carry more privilege.
    roles: BTreeMap<String, u32>,
}

impl AccessProfile {
    pub fn new(subject: &str) -> Result<Self, ProfileError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(ProfileError::EmptySubject);
        }
        Ok(Self {
            subject: subject.to_string(),
            permissions: BTreeSet::new(),
            roles: BTreeMap::new(),
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn grant_permission(&mut self, permission: &str) -> Result<(), ProfileError> {
        let normalized = normalize(permission);
        if normalized.is_empty() {
            return Err(ProfileError::EmptyPermission);
        }
        self.permissions.insert(normalized);
        Ok(())
    }

    pub fn revoke_permission(&mut self, permission: &str) {
        self.permissions.remove(&normalize(permission));
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(&normalize(permission))
    }

    /// Sorted granted permission ids.
    pub fn permissions(&self) -> Vec<String> {
        self.permissions.iter().cloned().collect()
    }

    pub fn assign_role(&mut self, role: &str, level: u32) -> Result<(), ProfileError> {
        let normalized = normalize(role);
        if normalized.is_empty() {
            return Err(ProfileError::EmptyRole);
        }
        self.roles.insert(normalized, level);
        Ok(())
    }

    pub fn remove_role(&mut self, role: &str) {
        self.roles.remove(&normalize(role));
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains_key(&normalize(role))
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    pub fn has_all_roles(&self, roles: &[&str]) -> bool {
        roles.iter().all(|role| self.has_role(role))
    }

    /// Highest privilege level across assigned roles; 0 when none.
    pub fn max_role_level(&self) -> u32 {
        self.roles.values().copied().max().unwrap_or(0)
    }

    pub fn has_level_at_least(&self, level: u32) -> bool {
        self.max_role_level() >= level
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessProfile, ProfileError};

    #[test]
    fn rejects_empty_subject() {
        assert_eq!(AccessProfile::new("  "), Err(ProfileError::EmptySubject));
    }

    #[test]
    fn permissions_are_normalized() {
        let mut profile = AccessProfile::new("user-1").expect("profile");
        profile
            .grant_permission("  Files.Write ")
            .expect("grant permission");
        assert!(profile.has_permission("files.write"));
        assert!(profile.has_permission("FILES.WRITE"));
        assert!(!profile.has_permission("files.read"));

        profile.revoke_permission("files.write");
        assert!(!profile.has_permission("files.write"));
    }

    #[test]
    fn rejects_blank_permission_and_role() {
        let mut profile = AccessProfile::new("user-1").expect("profile");
        assert_eq!(
            profile.grant_permission("   "),
            Err(ProfileError::EmptyPermission)
        );
        assert_eq!(profile.assign_role(" ", 1), Err(ProfileError::EmptyRole));
    }

    #[test]
    fn role_levels_and_combinators() {
        let mut profile = AccessProfile::new("user-1").expect("profile");
        profile.assign_role("Viewer", 10).expect("assign viewer");
        profile.assign_role("editor", 50).expect("assign editor");

        assert!(profile.has_role("viewer"));
        assert!(profile.has_any_role(&["admin", "editor"]));
        assert!(profile.has_all_roles(&["viewer", "editor"]));
        assert!(!profile.has_all_roles(&["viewer", "admin"]));
        assert_eq!(profile.max_role_level(), 50);
        assert!(profile.has_level_at_least(50));
        assert!(!profile.has_level_at_least(51));

        profile.remove_role("editor");
        assert_eq!(profile.max_role_level(), 10);
    }
}
