//! Data model for system descriptions.
//!
//! A [`Description`] is one point-in-time snapshot of a machine. It holds
//! [`Scope`]s keyed by [`ScopeKind`] (services, packages, repositories, ...),
//! each scope being an ordered, name-keyed list of [`Element`]s whose
//! attributes are generic [`Value`]s. This crate owns the JSON document form
//! (`manifest.json`) and its load/save helpers; comparison and export live in
//! `sysdesc-core` and `sysdesc-export`.

pub mod description;
pub mod element;
pub mod scope;
pub mod types;
pub mod value;

pub use description::{
    validate_description_name, Description, DescriptionDocument, ScopeMeta, FORMAT_VERSION,
    MANIFEST_FILE,
};
pub use element::Element;
pub use scope::{Scope, ScopeDocument};
pub use types::{DescriptionName, ScopeKind};
pub use value::{AttributeMap, Value};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("element '{name}' not found in scope '{kind}'")]
    ElementNotFound { kind: String, name: String },
    #[error("scope not found: {0}")]
    ScopeNotFound(String),
    #[error("unsupported format_version: {0}, expected {expected}", expected = FORMAT_VERSION)]
    UnsupportedVersion(u32),
    #[error("invalid description name: {0}")]
    InvalidName(String),
    #[error("description I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
