use crate::element::Element;
use crate::types::ScopeKind;
use crate::value::{AttributeMap, Value};
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Serialized form of a [`Scope`], as stored under `scopes.<kind>` in a
/// description document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeDocument {
    pub kind: ScopeKind,
    #[serde(default)]
    pub extracted: bool,
    #[serde(default, skip_serializing_if = "AttributeMap::is_empty")]
    pub attributes: AttributeMap,
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// An ordered, name-keyed collection of elements of one kind.
///
/// Element order is discovery order and survives a document round-trip.
/// Element names are unique; construction rejects duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    kind: ScopeKind,
    extracted: bool,
    attributes: AttributeMap,
    elements: Vec<Element>,
}

impl Scope {
    pub fn new(kind: impl Into<ScopeKind>, elements: Vec<Element>) -> Result<Self, SchemaError> {
        let kind = kind.into();
        check_unique_names(&kind, &elements)?;
        Ok(Self {
            kind,
            extracted: false,
            attributes: AttributeMap::new(),
            elements,
        })
    }

    #[must_use]
    pub fn with_extracted(mut self, extracted: bool) -> Self {
        self.extracted = extracted;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Build a scope from its document form, checking that the document
    /// declares the kind the caller asked for.
    pub fn from_document(
        kind: impl Into<ScopeKind>,
        doc: ScopeDocument,
    ) -> Result<Self, SchemaError> {
        let kind = kind.into();
        if doc.kind != kind {
            return Err(SchemaError::MalformedDocument(format!(
                "expected scope '{kind}', document declares '{}'",
                doc.kind
            )));
        }
        if let Some(e) = doc.elements.iter().find(|e| e.name().is_empty()) {
            return Err(SchemaError::MalformedDocument(format!(
                "element in scope '{kind}' has an empty name (attributes: {:?})",
                e.attributes().keys().collect::<Vec<_>>()
            )));
        }
        let scope = Self::new(kind, doc.elements)?;
        Ok(Self {
            extracted: doc.extracted,
            attributes: doc.attributes,
            ..scope
        })
    }

    /// Parse a scope from raw JSON.
    pub fn from_json(kind: impl Into<ScopeKind>, input: &str) -> Result<Self, SchemaError> {
        let doc: ScopeDocument = serde_json::from_str(input)
            .map_err(|e| SchemaError::MalformedDocument(e.to_string()))?;
        Self::from_document(kind, doc)
    }

    pub fn to_document(&self) -> ScopeDocument {
        ScopeDocument {
            kind: self.kind.clone(),
            extracted: self.extracted,
            attributes: self.attributes.clone(),
            elements: self.elements.clone(),
        }
    }

    pub fn kind(&self) -> &ScopeKind {
        &self.kind
    }

    pub fn is_extracted(&self) -> bool {
        self.extracted
    }

    /// Scope-level attributes, e.g. `init_system` for services.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Elements in stored order. Each call starts a fresh iteration.
    pub fn elements(&self) -> impl ExactSizeIterator<Item = &Element> + Clone + '_ {
        self.elements.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn find_by_name(&self, name: &str) -> Result<&Element, SchemaError> {
        self.elements
            .iter()
            .find(|e| e.name() == name)
            .ok_or_else(|| SchemaError::ElementNotFound {
                kind: self.kind.to_string(),
                name: name.to_owned(),
            })
    }
}

fn check_unique_names(kind: &ScopeKind, elements: &[Element]) -> Result<(), SchemaError> {
    let mut seen = HashSet::with_capacity(elements.len());
    for e in elements {
        if !seen.insert(e.name()) {
            return Err(SchemaError::MalformedDocument(format!(
                "duplicate element '{}' in scope '{kind}'",
                e.name()
            )));
        }
    }
    Ok(())
}
