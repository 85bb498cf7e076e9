use crate::bundle::{self, CopyStats};
use crate::profile::ProfileBuilder;
use crate::{ExportError, ExportOptions, ExportReport, Exporter};
use std::path::Path;
use sysdesc_schema::{Description, Scope, MANIFEST_FILE};

pub const PROFILE_FILE: &str = "autoinst.xml";
pub const EXCLUDES_FILE: &str = "unmanaged_files_build_excludes";
pub const README_FILE: &str = "README.md";

/// Exports a description as an AutoYaST bundle.
pub struct AutoyastExporter<'a> {
    description: &'a Description,
    options: ExportOptions,
}

impl<'a> AutoyastExporter<'a> {
    pub fn new(description: &'a Description) -> Self {
        Self {
            description,
            options: ExportOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// The `autoinst.xml` content.
    pub fn profile(&self) -> Result<String, ExportError> {
        ProfileBuilder::new(self.description, &self.options).build()
    }

    fn write_excludes(&self, target: &Path, excludes: &[String]) -> Result<(), String> {
        let mut content = excludes.join("\n");
        content.push('\n');
        bundle::write_atomic(&target.join(EXCLUDES_FILE), content.as_bytes())
            .map_err(|e| format!("{EXCLUDES_FILE}: {e}"))
    }
}

impl Exporter for AutoyastExporter<'_> {
    fn export_name(&self) -> String {
        format!("{}-autoyast", self.description.name())
    }

    fn write(&self, target_dir: &Path) -> Result<ExportReport, ExportError> {
        bundle::ensure_writable(target_dir)?;
        tracing::info!(
            "exporting '{}' to {}",
            self.description.name(),
            target_dir.display()
        );

        let mut failures: Vec<String> = Vec::new();
        let mut record = |step: Result<(), String>| {
            if let Err(e) = step {
                tracing::warn!("export step failed: {e}");
                failures.push(e);
            }
        };

        record(
            self.description
                .to_json()
                .map_err(|e| e.to_string())
                .and_then(|json| {
                    bundle::write_atomic(&target_dir.join(MANIFEST_FILE), json.as_bytes())
                        .map_err(|e| e.to_string())
                })
                .map_err(|e| format!("{MANIFEST_FILE}: {e}")),
        );

        record(
            self.profile()
                .map_err(|e| e.to_string())
                .and_then(|xml| {
                    bundle::write_atomic(&target_dir.join(PROFILE_FILE), xml.as_bytes())
                        .map_err(|e| e.to_string())
                })
                .map_err(|e| format!("{PROFILE_FILE}: {e}")),
        );

        // Trees of every extracted scope ship with the bundle; only file
        // scopes are restored by the profile itself.
        let extracted: Vec<&Scope> = self
            .description
            .scopes()
            .filter(|s| s.is_extracted())
            .collect();
        let mut stats = CopyStats::default();
        if !extracted.is_empty() {
            let excludes = self.options.excludes();
            for scope in &extracted {
                let Some(src) = bundle::extracted_tree(self.description, scope) else {
                    continue;
                };
                let dst = target_dir.join(scope.kind().as_str());
                tracing::debug!("copying {} to {}", src.display(), dst.display());
                record(
                    bundle::copy_tree(&src, &dst, &excludes, &mut stats)
                        .map_err(|e| format!("{}: {e}", scope.kind())),
                );
            }
            record(self.write_excludes(target_dir, &excludes));
        }

        record(
            bundle::write_atomic(
                &target_dir.join(README_FILE),
                bundle::readme(self.description, &extracted).as_bytes(),
            )
            .map_err(|e| format!("{README_FILE}: {e}")),
        );

        if !failures.is_empty() {
            return Err(ExportError::ExportFailed {
                path: target_dir.to_path_buf(),
                failures,
            });
        }

        tracing::info!(
            "exported '{}': {} files copied, {} excluded",
            self.description.name(),
            stats.copied,
            stats.skipped.len()
        );
        Ok(ExportReport {
            target: target_dir.to_path_buf(),
            profile: target_dir.join(PROFILE_FILE),
            extracted_scopes: extracted.iter().map(|s| s.kind().clone()).collect(),
            copied_files: stats.copied,
            skipped: stats.skipped,
        })
    }
}
