//! Export of system descriptions as installation profile bundles.
//!
//! [`AutoyastExporter`] turns a [`Description`] into an AutoYaST
//! `autoinst.xml` and writes it, together with a copy of the description,
//! the extracted file trees, an exclusion list and a README, into a target
//! directory. Writes are best effort: every step runs, and failures are
//! reported together as one [`ExportError::ExportFailed`].

pub mod autoyast;
pub mod bundle;
pub mod profile;

pub use autoyast::{AutoyastExporter, EXCLUDES_FILE, PROFILE_FILE, README_FILE};
pub use bundle::DEFAULT_EXCLUDES;
pub use profile::ProfileBuilder;

use serde::Serialize;
use std::path::{Path, PathBuf};
use sysdesc_schema::{Description, ScopeKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export target '{}' is not writable: {source}", path.display())]
    TargetUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("export to '{}' failed: {}", path.display(), failures.join("; "))]
    ExportFailed { path: PathBuf, failures: Vec<String> },
    #[error("profile generation failed: {0}")]
    Xml(String),
    #[error("description error: {0}")]
    Schema(#[from] sysdesc_schema::SchemaError),
}

/// Knobs for the generated bundle.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Pre-filled answer for the "Enter URL to system description" prompt.
    pub description_url: Option<String>,
    /// Paths excluded from file copies in addition to [`DEFAULT_EXCLUDES`].
    pub extra_excludes: Vec<String>,
}

impl ExportOptions {
    /// Default exclusions followed by the configured extras, without duplicates.
    pub fn excludes(&self) -> Vec<String> {
        let mut all: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| (*s).to_owned()).collect();
        for extra in &self.extra_excludes {
            let extra = extra.trim_end_matches('/');
            if !extra.is_empty() && !all.iter().any(|e| e == extra) {
                all.push(extra.to_owned());
            }
        }
        all
    }
}

/// What an export wrote.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub target: PathBuf,
    pub profile: PathBuf,
    pub extracted_scopes: Vec<ScopeKind>,
    pub copied_files: usize,
    /// Paths found in extracted trees but left out because they are excluded.
    pub skipped: Vec<String>,
}

pub trait Exporter {
    /// Default name of the bundle directory, e.g. `web01-autoyast`.
    fn export_name(&self) -> String;

    fn write(&self, target_dir: &Path) -> Result<ExportReport, ExportError>;
}

/// Export `description` as an AutoYaST bundle into `target_dir` with default
/// options.
pub fn export(description: &Description, target_dir: &Path) -> Result<ExportReport, ExportError> {
    AutoyastExporter::new(description).write(target_dir)
}
