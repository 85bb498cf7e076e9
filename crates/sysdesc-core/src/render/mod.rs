//! Text rendering of scopes and comparison results.
//!
//! Each scope kind has a [`Renderer`] that knows how to summarize one of its
//! elements on a single line. The shared list, empty-scope and diff-line
//! formats are provided by the trait's default methods, so a renderer for a
//! new kind usually only implements [`Renderer::item`].

mod builtin;
mod report;

pub use builtin::{
    FileChangesRenderer, GenericRenderer, GroupsRenderer, PackagesRenderer, PatternsRenderer,
    RepositoriesRenderer, ServicesRenderer, UnmanagedFilesRenderer, UsersRenderer,
};
pub use report::{render_comparison, render_show};

use crate::compare::ChangedPair;
use std::collections::BTreeMap;
use sysdesc_schema::{Element, Scope, Value};

pub trait Renderer: Send + Sync {
    /// Scope kind this renderer handles.
    fn kind(&self) -> &str;

    /// Heading used for this scope, e.g. `Services`.
    fn display_name(&self) -> &str;

    /// One-line summary of an element.
    fn item(&self, element: &Element) -> String;

    fn content(&self, scope: &Scope) -> String {
        if scope.is_empty() {
            return format!("There are no {}.\n", self.display_name().to_lowercase());
        }
        list(scope.elements().map(|e| self.item(e)))
    }

    fn compare_content_only_in(&self, elements: &[&Element]) -> String {
        list(elements.iter().map(|e| self.item(e)))
    }

    fn compare_content_changed(&self, changed: &[ChangedPair<'_>]) -> String {
        list(changed.iter().map(|(one, two)| change_line(one, two)))
    }
}

/// Format items as an indented bullet list, one line each.
pub fn list(items: impl IntoIterator<Item = String>) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str("  * ");
        out.push_str(&item);
        out.push('\n');
    }
    out
}

/// `name (attr: a <> b, ...)` for a changed pair.
///
/// Only the attribute keys of `one` are inspected: an attribute that exists
/// on `two` alone is not listed. A missing or null value renders empty, and
/// the two count as equal.
pub fn change_line(one: &Element, two: &Element) -> String {
    fn present(value: Option<&Value>) -> Option<&Value> {
        value.filter(|v| !v.is_null())
    }
    fn shown(value: Option<&Value>) -> String {
        present(value).map(ToString::to_string).unwrap_or_default()
    }

    let changes: Vec<String> = one
        .attributes()
        .iter()
        .filter(|(attr, value)| present(Some(*value)) != present(two.get(attr)))
        .map(|(attr, value)| {
            let other = two.get(attr);
            format!("{attr}: {} <> {}", shown(Some(value)), shown(other))
        })
        .collect();
    format!("{} ({})", one.name(), changes.join(", "))
}

/// Kind → renderer lookup, built once at startup.
#[derive(Default)]
pub struct RendererRegistry {
    renderers: BTreeMap<String, Box<dyn Renderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a renderer for every well-known scope kind.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PackagesRenderer));
        registry.register(Box::new(PatternsRenderer));
        registry.register(Box::new(RepositoriesRenderer));
        registry.register(Box::new(ServicesRenderer));
        registry.register(Box::new(UsersRenderer));
        registry.register(Box::new(GroupsRenderer));
        registry.register(Box::new(FileChangesRenderer::config_files()));
        registry.register(Box::new(FileChangesRenderer::changed_managed_files()));
        registry.register(Box::new(UnmanagedFilesRenderer));
        registry
    }

    /// Add a renderer, returning the one it replaced for the same kind.
    pub fn register(&mut self, renderer: Box<dyn Renderer>) -> Option<Box<dyn Renderer>> {
        self.renderers.insert(renderer.kind().to_owned(), renderer)
    }

    pub fn get(&self, kind: &str) -> Option<&dyn Renderer> {
        self.renderers.get(kind).map(Box::as_ref)
    }

    /// Run `f` with the renderer for `kind`, or a [`GenericRenderer`] when
    /// none is registered.
    pub fn with_renderer<R>(&self, kind: &str, f: impl FnOnce(&dyn Renderer) -> R) -> R {
        match self.get(kind) {
            Some(renderer) => f(renderer),
            None => f(&GenericRenderer::new(kind)),
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> + '_ {
        self.renderers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.renderers.keys()).finish()
    }
}
