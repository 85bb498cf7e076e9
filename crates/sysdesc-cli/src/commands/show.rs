use super::{json_pretty, load_description, EXIT_SUCCESS};
use std::path::Path;
use sysdesc_core::{render_show, RendererRegistry};

pub fn run(
    registry: &RendererRegistry,
    store: &Path,
    name: &str,
    scopes: &[String],
    json: bool,
) -> Result<u8, String> {
    let description = load_description(store, name)?;
    for kind in scopes {
        description
            .require_scope(kind)
            .map_err(|e| format!("description error: {name}: {e}"))?;
    }

    if json {
        let mut document = description.to_document();
        if !scopes.is_empty() {
            document.scopes.retain(|kind, _| scopes.iter().any(|s| kind == s.as_str()));
            document.meta.retain(|kind, _| scopes.iter().any(|s| kind == s.as_str()));
        }
        println!("{}", json_pretty(&document)?);
    } else {
        let mut out = std::io::stdout().lock();
        render_show(registry, &description, scopes, &mut out).map_err(|e| e.to_string())?;
    }
    Ok(EXIT_SUCCESS)
}
