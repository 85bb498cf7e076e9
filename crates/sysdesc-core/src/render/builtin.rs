use super::Renderer;
use sysdesc_schema::{Element, ScopeKind, Value};

fn text(element: &Element, key: &str) -> String {
    element.get(key).map(ToString::to_string).unwrap_or_default()
}

pub struct ServicesRenderer;

impl Renderer for ServicesRenderer {
    fn kind(&self) -> &str {
        ScopeKind::SERVICES
    }

    fn display_name(&self) -> &str {
        "Services"
    }

    fn item(&self, element: &Element) -> String {
        format!("{}: {}", element.name(), text(element, "state"))
    }
}

pub struct PackagesRenderer;

impl Renderer for PackagesRenderer {
    fn kind(&self) -> &str {
        ScopeKind::PACKAGES
    }

    fn display_name(&self) -> &str {
        "Packages"
    }

    /// `name-version-release.arch`, leaving out the parts that are not set.
    fn item(&self, element: &Element) -> String {
        let mut out = element.name().to_owned();
        for key in ["version", "release"] {
            if let Some(v) = element.get(key) {
                out.push('-');
                out.push_str(&v.to_string());
            }
        }
        if let Some(arch) = element.get("arch") {
            out.push('.');
            out.push_str(&arch.to_string());
        }
        out
    }
}

pub struct PatternsRenderer;

impl Renderer for PatternsRenderer {
    fn kind(&self) -> &str {
        ScopeKind::PATTERNS
    }

    fn display_name(&self) -> &str {
        "Patterns"
    }

    fn item(&self, element: &Element) -> String {
        match element.get("version") {
            Some(version) => format!("{} ({version})", element.name()),
            None => element.name().to_owned(),
        }
    }
}

pub struct RepositoriesRenderer;

impl Renderer for RepositoriesRenderer {
    fn kind(&self) -> &str {
        ScopeKind::REPOSITORIES
    }

    fn display_name(&self) -> &str {
        "Repositories"
    }

    fn item(&self, element: &Element) -> String {
        let state = match element.get("enabled").and_then(Value::as_bool) {
            Some(false) => "disabled",
            _ => "enabled",
        };
        format!("{} ({}, {state})", element.name(), text(element, "url"))
    }
}

pub struct UsersRenderer;

impl Renderer for UsersRenderer {
    fn kind(&self) -> &str {
        ScopeKind::USERS
    }

    fn display_name(&self) -> &str {
        "Users"
    }

    fn item(&self, element: &Element) -> String {
        let comment = text(element, "comment");
        let details = format!(
            "uid: {}, gid: {}, shell: {}",
            text(element, "uid"),
            text(element, "gid"),
            text(element, "shell")
        );
        if comment.is_empty() {
            format!("{} ({details})", element.name())
        } else {
            format!("{} ({comment}, {details})", element.name())
        }
    }
}

pub struct GroupsRenderer;

impl Renderer for GroupsRenderer {
    fn kind(&self) -> &str {
        ScopeKind::GROUPS
    }

    fn display_name(&self) -> &str {
        "Groups"
    }

    fn item(&self, element: &Element) -> String {
        let users = element
            .get("users")
            .and_then(Value::as_list)
            .map(|users| {
                users
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();
        format!(
            "{} (gid: {}, users: {users})",
            element.name(),
            text(element, "gid")
        )
    }
}

/// Renderer for scopes listing files that differ from their packaged
/// version (`config_files`, `changed_managed_files`).
pub struct FileChangesRenderer {
    kind: &'static str,
    display_name: &'static str,
}

impl FileChangesRenderer {
    pub fn config_files() -> Self {
        Self {
            kind: ScopeKind::CONFIG_FILES,
            display_name: "Configuration Files",
        }
    }

    pub fn changed_managed_files() -> Self {
        Self {
            kind: ScopeKind::CHANGED_MANAGED_FILES,
            display_name: "Changed Managed Files",
        }
    }
}

impl Renderer for FileChangesRenderer {
    fn kind(&self) -> &str {
        self.kind
    }

    fn display_name(&self) -> &str {
        self.display_name
    }

    fn item(&self, element: &Element) -> String {
        match element.get("changes").and_then(Value::as_list) {
            Some(changes) if !changes.is_empty() => {
                let changes: Vec<String> = changes.iter().map(ToString::to_string).collect();
                format!("{} (changes: {})", element.name(), changes.join(", "))
            }
            _ => element.name().to_owned(),
        }
    }
}

pub struct UnmanagedFilesRenderer;

impl Renderer for UnmanagedFilesRenderer {
    fn kind(&self) -> &str {
        ScopeKind::UNMANAGED_FILES
    }

    fn display_name(&self) -> &str {
        "Unmanaged Files"
    }

    fn item(&self, element: &Element) -> String {
        match element.get_str("type") {
            Some(kind) => format!("{} ({kind})", element.name()),
            None => element.name().to_owned(),
        }
    }
}

/// Fallback for scope kinds without a dedicated renderer: lists names only.
pub struct GenericRenderer {
    kind: String,
    display_name: String,
}

impl GenericRenderer {
    pub fn new(kind: &str) -> Self {
        let spaced = kind.replace('_', " ");
        let mut chars = spaced.chars();
        let display_name = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Self {
            kind: kind.to_owned(),
            display_name,
        }
    }
}

impl Renderer for GenericRenderer {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn item(&self, element: &Element) -> String {
        element.name().to_owned()
    }
}
