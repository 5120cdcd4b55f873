//! Macro for implementing Display and FromStr for simple domain enums
//!
//! Generates both conversions from a single variant/string table so the
//! wire spelling of an enum lives in one place. Parsing is case-insensitive.
//!
//! # Example
//!
//! ```rust
//! use s3manager_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Access {
//!     Read,
//!     Write,
//! }
//!
//! impl_domain_enum_conversions!(Access {
//!     Read => "read",
//!     Write => "write",
//! });
//!
//! assert_eq!(Access::Read.to_string(), "read");
//! assert_eq!("WRITE".parse::<Access>().unwrap(), Access::Write);
//! ```

/// Implements Display and FromStr traits for fieldless domain enums
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestKind {
        Alpha,
        Beta,
    }

    impl_domain_enum_conversions!(TestKind {
        Alpha => "alpha",
        Beta => "beta",
    });

    #[test]
    fn test_display_conversion() {
        assert_eq!(TestKind::Alpha.to_string(), "alpha");
        assert_eq!(TestKind::Beta.to_string(), "beta");
    }

    #[test]
    fn test_fromstr_mixed_case() {
        assert_eq!(TestKind::from_str("ALPHA").unwrap(), TestKind::Alpha);
        assert_eq!(TestKind::from_str(" Beta ").unwrap(), TestKind::Beta);
    }

    #[test]
    fn test_fromstr_invalid() {
        let err = TestKind::from_str("gamma").unwrap_err();
        assert!(err.contains("TestKind"));
        assert!(err.contains("gamma"));
    }
}
