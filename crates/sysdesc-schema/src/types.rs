//! Newtype wrappers for string identifiers used across the description model.
//!
//! All newtypes serialize/deserialize as plain strings, so they can be used as
//! JSON object keys in the description document.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Discriminates the element schema of a scope, e.g. `services` or `repositories`.
    ScopeKind
);

string_newtype!(
    /// Name of a stored system description (its directory name in the store).
    DescriptionName
);

impl ScopeKind {
    pub const PACKAGES: &'static str = "packages";
    pub const PATTERNS: &'static str = "patterns";
    pub const REPOSITORIES: &'static str = "repositories";
    pub const SERVICES: &'static str = "services";
    pub const USERS: &'static str = "users";
    pub const GROUPS: &'static str = "groups";
    pub const CONFIG_FILES: &'static str = "config_files";
    pub const CHANGED_MANAGED_FILES: &'static str = "changed_managed_files";
    pub const UNMANAGED_FILES: &'static str = "unmanaged_files";

    /// Scopes whose raw file content can be extracted next to the metadata.
    pub const FILE_SCOPES: [&'static str; 3] = [
        Self::CONFIG_FILES,
        Self::CHANGED_MANAGED_FILES,
        Self::UNMANAGED_FILES,
    ];

    pub fn is_file_scope(&self) -> bool {
        Self::FILE_SCOPES.iter().any(|k| *k == self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_kind_display_and_as_ref() {
        let kind = ScopeKind::new(ScopeKind::SERVICES);
        assert_eq!(kind.to_string(), "services");
        assert_eq!(kind.as_str(), "services");
        assert_eq!(AsRef::<str>::as_ref(&kind), "services");
    }

    #[test]
    fn scope_kind_serde_roundtrip() {
        let kind = ScopeKind::from("repositories");
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"repositories\"");
        let back: ScopeKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn file_scopes_are_recognized() {
        assert!(ScopeKind::from("config_files").is_file_scope());
        assert!(ScopeKind::from("unmanaged_files").is_file_scope());
        assert!(!ScopeKind::from("services").is_file_scope());
        assert!(!ScopeKind::from("custom").is_file_scope());
    }

    #[test]
    fn description_name_compares_with_str() {
        let name = DescriptionName::new("web01");
        assert_eq!(name, "web01");
        assert_eq!(name.into_inner(), "web01");
    }
}
