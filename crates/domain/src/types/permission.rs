//! Object-storage permissions granted through role membership

use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;

/// Permission on the storage console
///
/// Roles reported by the identity provider are mapped onto this closed set;
/// the storage API routes check it before touching buckets or objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    View,
    Write,
    Delete,
}

impl_domain_enum_conversions!(Permission {
    View => "view",
    Write => "write",
    Delete => "delete",
});

impl Permission {
    /// Every permission, in ascending order of privilege
    pub const ALL: [Self; 3] = [Self::View, Self::Write, Self::Delete];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&vec![Permission::View, Permission::Delete]).unwrap();
        assert_eq!(json, r#"["view","delete"]"#);

        let parsed: Permission = serde_json::from_str(r#""write""#).unwrap();
        assert_eq!(parsed, Permission::Write);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("VIEW".parse::<Permission>().unwrap(), Permission::View);
        assert!("admin".parse::<Permission>().is_err());
    }
}
