use super::{highlight, json_pretty, load_description, success, EXIT_SUCCESS};
use std::path::Path;
use sysdesc_export::{AutoyastExporter, ExportOptions, Exporter};

pub fn run(
    store: &Path,
    name: &str,
    exporter_dir: &Path,
    force: bool,
    options: ExportOptions,
    json: bool,
) -> Result<u8, String> {
    let description = load_description(store, name)?;
    let exporter = AutoyastExporter::new(&description).with_options(options);
    let target = exporter_dir.join(exporter.export_name());

    if target.exists() {
        if !force {
            return Err(format!(
                "export error: {} already exists, use --force to overwrite it",
                target.display()
            ));
        }
        tracing::info!("removing previous export {}", target.display());
        std::fs::remove_dir_all(&target)
            .map_err(|e| format!("export error: failed to remove {}: {e}", target.display()))?;
    }

    let report = exporter
        .write(&target)
        .map_err(|e| format!("export error: {e}"))?;

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        println!(
            "{} '{}' to {}",
            success("exported"),
            highlight(name),
            report.target.display()
        );
        if !report.extracted_scopes.is_empty() {
            println!(
                "copied {} files, {} excluded",
                report.copied_files,
                report.skipped.len()
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
