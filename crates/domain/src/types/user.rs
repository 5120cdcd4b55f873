//! Authenticated user types
//!
//! The user record kept in the server-side session after a successful OIDC
//! login.

use serde::{Deserialize, Serialize};

use super::Permission;

/// User established by a completed login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl AuthenticatedUser {
    /// Check whether the user holds `permission`
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_permission_checks_granted_set() {
        let user = AuthenticatedUser {
            name: "Test User".to_string(),
            email: "test@localhost".to_string(),
            roles: vec!["S3-Editor".to_string()],
            permissions: vec![Permission::View, Permission::Write],
        };

        assert!(user.has_permission(Permission::Write));
        assert!(!user.has_permission(Permission::Delete));
    }

    #[test]
    fn missing_roles_and_permissions_default_to_empty() {
        let user: AuthenticatedUser =
            serde_json::from_str(r#"{"name":"n","email":"e@x"}"#).unwrap();
        assert!(user.roles.is_empty());
        assert!(user.permissions.is_empty());
    }
}
