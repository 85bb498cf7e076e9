//! Comparison and presentation of system descriptions.
//!
//! [`compare`] classifies the elements of two same-kind scopes into
//! only-in-A, only-in-B, changed and equal; [`compare_descriptions`] does so
//! for every scope two descriptions share. The [`render`] module turns scopes
//! and comparison results into text, through one [`Renderer`] per scope kind
//! looked up in a [`RendererRegistry`].

pub mod compare;
pub mod render;

pub use compare::{
    compare, compare_descriptions, differing_attributes, ChangedPair, DescriptionComparison,
    ScopeComparison,
};
pub use render::{render_comparison, render_show, Renderer, RendererRegistry};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cannot compare scope '{a}' with scope '{b}'")]
    KindMismatch { a: String, b: String },
    #[error("description error: {0}")]
    Schema(#[from] sysdesc_schema::SchemaError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
