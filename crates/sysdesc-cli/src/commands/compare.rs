use super::{json_pretty, load_description, EXIT_SUCCESS};
use std::path::Path;
use sysdesc_core::{compare_descriptions, render_comparison, RendererRegistry};

pub fn run(
    registry: &RendererRegistry,
    store: &Path,
    name_a: &str,
    name_b: &str,
    scopes: &[String],
    json: bool,
) -> Result<u8, String> {
    let a = load_description(store, name_a)?;
    let b = load_description(store, name_b)?;
    for kind in scopes {
        if a.scope(kind).is_none() && b.scope(kind).is_none() {
            return Err(format!(
                "description error: neither '{name_a}' nor '{name_b}' contains scope '{kind}'"
            ));
        }
    }

    let comparison = compare_descriptions(&a, &b, scopes).map_err(|e| e.to_string())?;
    tracing::debug!(
        "compared {} scopes of '{name_a}' and '{name_b}'",
        comparison.scopes.len()
    );

    if json {
        println!("{}", json_pretty(&comparison)?);
    } else {
        let mut out = std::io::stdout().lock();
        render_comparison(registry, &comparison, &mut out).map_err(|e| e.to_string())?;
    }
    Ok(EXIT_SUCCESS)
}
