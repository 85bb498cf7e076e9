use crate::scope::{Scope, ScopeDocument};
use crate::types::{DescriptionName, ScopeKind};
use crate::SchemaError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Current description document format. Incremented on incompatible changes.
pub const FORMAT_VERSION: u32 = 1;

/// File name of the description document inside a description directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Provenance of one scope: when and where it was inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeMeta {
    pub modified: DateTime<Utc>,
    pub hostname: String,
}

/// Serialized form of a [`Description`] (`manifest.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionDocument {
    pub format_version: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<ScopeKind, ScopeMeta>,
    #[serde(default)]
    pub scopes: BTreeMap<ScopeKind, ScopeDocument>,
}

/// A point-in-time system snapshot: scopes keyed by kind, plus provenance.
///
/// Treated as immutable after load. `path` is set when the description was
/// loaded from (or saved to) a directory; extracted file trees live next to
/// `manifest.json` in `<path>/<kind>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    name: DescriptionName,
    path: Option<PathBuf>,
    meta: BTreeMap<ScopeKind, ScopeMeta>,
    scopes: BTreeMap<ScopeKind, Scope>,
}

pub fn validate_description_name(name: &str) -> Result<(), SchemaError> {
    if name.is_empty() || name.len() > 64 {
        return Err(SchemaError::InvalidName(
            "description name must be 1-64 characters".to_owned(),
        ));
    }
    if name.starts_with('.')
        || !name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
    {
        return Err(SchemaError::InvalidName(format!(
            "'{name}' must match [a-zA-Z0-9_.-] and not start with '.'"
        )));
    }
    Ok(())
}

impl Description {
    pub fn new(name: impl Into<DescriptionName>) -> Self {
        Self {
            name: name.into(),
            path: None,
            meta: BTreeMap::new(),
            scopes: BTreeMap::new(),
        }
    }

    /// Add or replace the scope of the same kind.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scopes.insert(scope.kind().clone(), scope);
        self
    }

    #[must_use]
    pub fn with_meta(mut self, kind: impl Into<ScopeKind>, meta: ScopeMeta) -> Self {
        self.meta.insert(kind.into(), meta);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn from_document(
        name: impl Into<DescriptionName>,
        doc: DescriptionDocument,
    ) -> Result<Self, SchemaError> {
        if doc.format_version != FORMAT_VERSION {
            return Err(SchemaError::UnsupportedVersion(doc.format_version));
        }
        let mut scopes = BTreeMap::new();
        for (kind, scope_doc) in doc.scopes {
            let scope = Scope::from_document(kind.clone(), scope_doc)?;
            scopes.insert(kind, scope);
        }
        Ok(Self {
            name: name.into(),
            path: None,
            meta: doc.meta,
            scopes,
        })
    }

    pub fn from_json(name: impl Into<DescriptionName>, input: &str) -> Result<Self, SchemaError> {
        let doc: DescriptionDocument = serde_json::from_str(input)
            .map_err(|e| SchemaError::MalformedDocument(e.to_string()))?;
        Self::from_document(name, doc)
    }

    pub fn to_document(&self) -> DescriptionDocument {
        DescriptionDocument {
            format_version: FORMAT_VERSION,
            meta: self.meta.clone(),
            scopes: self
                .scopes
                .iter()
                .map(|(kind, scope)| (kind.clone(), scope.to_document()))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    /// Load `<dir>/manifest.json`. The description is named after `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let dir = dir.as_ref();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        validate_description_name(&name)?;
        let content = fs::read_to_string(dir.join(MANIFEST_FILE))?;
        let description = Self::from_json(name, &content)?;
        tracing::debug!(
            "loaded description '{}' with {} scopes",
            description.name,
            description.scopes.len()
        );
        Ok(description.with_path(dir))
    }

    /// Atomically write `<dir>/manifest.json`, creating `dir` if needed.
    pub fn save(&mut self, dir: impl AsRef<Path>) -> Result<(), SchemaError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let content = self.to_json()?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(dir.join(MANIFEST_FILE))
            .map_err(|e| SchemaError::Io(e.error))?;
        self.path = Some(dir.to_path_buf());
        Ok(())
    }

    pub fn name(&self) -> &DescriptionName {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn scope(&self, kind: &str) -> Option<&Scope> {
        self.scopes.get(kind)
    }

    pub fn require_scope(&self, kind: &str) -> Result<&Scope, SchemaError> {
        self.scope(kind)
            .ok_or_else(|| SchemaError::ScopeNotFound(kind.to_owned()))
    }

    /// Scopes in kind order.
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> + '_ {
        self.scopes.values()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ScopeKind> + '_ {
        self.scopes.keys()
    }

    pub fn meta(&self, kind: &str) -> Option<&ScopeMeta> {
        self.meta.get(kind)
    }

    /// Directory holding the extracted files of `kind`, if this description
    /// lives on disk.
    pub fn scope_files_dir(&self, kind: &str) -> Option<PathBuf> {
        self.path.as_ref().map(|p| p.join(kind))
    }
}
