//! Role → permission policy

use std::collections::{BTreeMap, BTreeSet};

use s3manager_domain::{Permission, RoleConfig};

/// Maps provider roles onto console permissions
#[derive(Debug, Clone)]
pub struct RolePolicy {
    role_permissions: BTreeMap<String, Vec<Permission>>,
    default_role: String,
}

impl RolePolicy {
    pub fn new(config: &RoleConfig) -> Self {
        Self {
            role_permissions: config.role_permissions.clone(),
            default_role: config.default_role.clone(),
        }
    }

    /// Union of the permissions granted by `roles`
    ///
    /// When no role is known to the policy, the default role's permissions
    /// apply. The result is sorted and free of duplicates.
    pub fn permissions_for<S: AsRef<str>>(&self, roles: &[S]) -> Vec<Permission> {
        let mut granted: BTreeSet<Permission> = roles
            .iter()
            .filter_map(|role| self.role_permissions.get(role.as_ref()))
            .flatten()
            .copied()
            .collect();

        if granted.is_empty() {
            if let Some(defaults) = self.role_permissions.get(&self.default_role) {
                granted.extend(defaults.iter().copied());
            }
        }

        granted.into_iter().collect()
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::new(&RoleConfig::default())
    }
}
