pub mod compare;
pub mod completions;
pub mod export;
pub mod show;

use std::path::Path;
use sysdesc_schema::{validate_description_name, Description, MANIFEST_FILE};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_DESCRIPTION_ERROR: u8 = 2;
pub const EXIT_EXPORT_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Load `<store>/<name>/manifest.json`.
pub fn load_description(store: &Path, name: &str) -> Result<Description, String> {
    validate_description_name(name).map_err(|e| format!("description error: {e}"))?;
    let dir = store.join(name);
    if !dir.join(MANIFEST_FILE).is_file() {
        return Err(format!(
            "description error: no description '{name}' in {}",
            store.display()
        ));
    }
    Description::load(&dir).map_err(|e| format!("description error: {name}: {e}"))
}

pub fn highlight(text: &str) -> String {
    console::Style::new().bold().apply_to(text).to_string()
}

pub fn success(text: &str) -> String {
    console::Style::new().green().apply_to(text).to_string()
}
