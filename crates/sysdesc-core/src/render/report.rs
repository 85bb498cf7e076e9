use super::{Renderer, RendererRegistry};
use crate::compare::{DescriptionComparison, ScopeComparison};
use crate::CoreError;
use std::io::Write;
use sysdesc_schema::{Description, ScopeKind, ScopeMeta};

fn heading(renderer: &dyn Renderer, meta: Option<&ScopeMeta>) -> String {
    match meta {
        Some(meta) => format!(
            "# {} [{}] ({})\n\n",
            renderer.display_name(),
            meta.hostname,
            meta.modified.format("%Y-%m-%d %H:%M:%S")
        ),
        None => format!("# {}\n\n", renderer.display_name()),
    }
}

/// Write every scope of `description` as a titled list.
///
/// `kinds` restricts output to the named scopes; empty means all.
pub fn render_show(
    registry: &RendererRegistry,
    description: &Description,
    kinds: &[String],
    out: &mut impl Write,
) -> Result<(), CoreError> {
    let mut shown = 0;
    for scope in description
        .scopes()
        .filter(|s| kinds.is_empty() || kinds.iter().any(|k| s.kind() == k.as_str()))
    {
        let text = registry.with_renderer(scope.kind(), |r| {
            let mut text = heading(r, description.meta(scope.kind()));
            text.push_str(&r.content(scope));
            text
        });
        writeln!(out, "{text}")?;
        shown += 1;
    }
    if shown == 0 {
        writeln!(
            out,
            "Description '{}' contains no matching scopes.",
            description.name()
        )?;
    }
    Ok(())
}

fn render_scope_comparison(
    renderer: &dyn Renderer,
    cmp: &ScopeComparison<'_>,
    name_a: &str,
    name_b: &str,
) -> String {
    let mut text = heading(renderer, None);
    if !cmp.only_in_a.is_empty() {
        text.push_str(&format!("Only in '{name_a}':\n"));
        text.push_str(&renderer.compare_content_only_in(&cmp.only_in_a));
        text.push('\n');
    }
    if !cmp.only_in_b.is_empty() {
        text.push_str(&format!("Only in '{name_b}':\n"));
        text.push_str(&renderer.compare_content_only_in(&cmp.only_in_b));
        text.push('\n');
    }
    if !cmp.changed.is_empty() {
        text.push_str(&format!(
            "In both with different attributes ('{name_a}' <> '{name_b}'):\n"
        ));
        text.push_str(&renderer.compare_content_changed(&cmp.changed));
        text.push('\n');
    }
    text
}

fn join_kinds(kinds: &[&ScopeKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Write the differences of a description comparison, scope by scope.
///
/// Scopes without differences are summarized on one trailing line.
pub fn render_comparison(
    registry: &RendererRegistry,
    comparison: &DescriptionComparison<'_>,
    out: &mut impl Write,
) -> Result<(), CoreError> {
    let name_a = comparison.name_a.as_str();
    let name_b = comparison.name_b.as_str();

    for cmp in comparison.scopes.iter().filter(|c| !c.is_identical()) {
        let text = registry.with_renderer(cmp.kind, |r| {
            render_scope_comparison(r, cmp, name_a, name_b)
        });
        write!(out, "{text}")?;
    }

    if !comparison.only_in_a_scopes.is_empty() {
        writeln!(
            out,
            "Following scopes are only part of '{name_a}': {}",
            join_kinds(&comparison.only_in_a_scopes)
        )?;
    }
    if !comparison.only_in_b_scopes.is_empty() {
        writeln!(
            out,
            "Following scopes are only part of '{name_b}': {}",
            join_kinds(&comparison.only_in_b_scopes)
        )?;
    }

    if comparison.is_identical() {
        writeln!(out, "Compared descriptions are identical.")?;
    } else {
        let identical: Vec<&ScopeKind> = comparison
            .scopes
            .iter()
            .filter(|c| c.is_identical())
            .map(|c| c.kind)
            .collect();
        if !identical.is_empty() {
            writeln!(
                out,
                "Compared descriptions are identical in: {}",
                join_kinds(&identical)
            )?;
        }
    }
    Ok(())
}
