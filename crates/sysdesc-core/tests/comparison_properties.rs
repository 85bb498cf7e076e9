//! Partition properties of the scope comparator, checked over a set of
//! hand-built scope pairs covering disjoint, overlapping, identical and empty
//! inputs.

use sysdesc_core::{compare, ScopeComparison};
use sysdesc_schema::{Element, Scope};

fn scope(elements: &[(&str, &str)]) -> Scope {
    Scope::new(
        "services",
        elements
            .iter()
            .map(|(name, state)| Element::new(*name).with_attribute("state", *state))
            .collect(),
    )
    .unwrap()
}

fn fixtures() -> Vec<Scope> {
    vec![
        scope(&[]),
        scope(&[("sshd", "running")]),
        scope(&[("sshd", "stopped"), ("cron", "running")]),
        scope(&[("cron", "running"), ("sshd", "running"), ("nfs", "stopped")]),
        scope(&[("apache2", "running"), ("postfix", "running")]),
        Scope::from_json(
            "services",
            r#"{"kind": "services", "elements": [
                {"name": "sshd", "state": "running", "ports": [22]},
                {"name": "cron"}
            ]}"#,
        )
        .unwrap(),
    ]
}

fn names<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Vec<&'a str> {
    elements.into_iter().map(Element::name).collect()
}

fn a_side<'a>(cmp: &ScopeComparison<'a>) -> Vec<&'a str> {
    let mut all = names(cmp.only_in_a.iter().copied());
    all.extend(names(cmp.changed.iter().map(|(a, _)| *a)));
    all.extend(names(cmp.equal.iter().copied()));
    all.sort_unstable();
    all
}

fn b_side<'a>(cmp: &ScopeComparison<'a>) -> Vec<&'a str> {
    let mut all = names(cmp.only_in_b.iter().copied());
    all.extend(names(cmp.changed.iter().map(|(_, b)| *b)));
    all.extend(names(cmp.equal.iter().copied()));
    all.sort_unstable();
    all
}

fn sorted_names(scope: &Scope) -> Vec<&str> {
    let mut all = names(scope.elements());
    all.sort_unstable();
    all
}

#[test]
fn every_element_lands_in_exactly_one_bucket() {
    let fixtures = fixtures();
    for a in &fixtures {
        for b in &fixtures {
            let cmp = compare(a, b).unwrap();
            assert_eq!(a_side(&cmp), sorted_names(a), "a side of {a:?} vs {b:?}");
            assert_eq!(b_side(&cmp), sorted_names(b), "b side of {a:?} vs {b:?}");
        }
    }
}

#[test]
fn partition_is_symmetric() {
    let fixtures = fixtures();
    for a in &fixtures {
        for b in &fixtures {
            let ab = compare(a, b).unwrap();
            let ba = compare(b, a).unwrap();
            assert_eq!(ab.only_in_a, ba.only_in_b);
            assert_eq!(ab.only_in_b, ba.only_in_a);
            assert_eq!(ab.changed.len(), ba.changed.len());
            assert_eq!(ab.equal.len(), ba.equal.len());
        }
    }
}

#[test]
fn comparing_with_itself_is_all_equal() {
    for s in &fixtures() {
        let cmp = compare(s, s).unwrap();
        assert!(cmp.only_in_a.is_empty());
        assert!(cmp.only_in_b.is_empty());
        assert!(cmp.changed.is_empty());
        assert_eq!(names(cmp.equal.iter().copied()), names(s.elements()));
        assert!(cmp.is_identical());
    }
}

#[test]
fn buckets_keep_source_order() {
    let a = scope(&[("z", "1"), ("y", "1"), ("x", "1"), ("w", "1")]);
    let b = scope(&[("d", "1"), ("x", "2"), ("c", "1"), ("z", "2")]);
    let cmp = compare(&a, &b).unwrap();
    assert_eq!(names(cmp.only_in_a.iter().copied()), ["y", "w"]);
    assert_eq!(names(cmp.only_in_b.iter().copied()), ["d", "c"]);
    assert_eq!(names(cmp.changed.iter().map(|(a, _)| *a)), ["z", "x"]);
}

#[test]
fn documented_sshd_cron_scenario() {
    let a = scope(&[("sshd", "running")]);
    let b = scope(&[("sshd", "stopped"), ("cron", "running")]);
    let cmp = compare(&a, &b).unwrap();

    assert!(cmp.only_in_a.is_empty());
    assert!(cmp.equal.is_empty());
    assert_eq!(names(cmp.only_in_b.iter().copied()), ["cron"]);
    assert_eq!(cmp.changed.len(), 1);
    let (one, two) = cmp.changed[0];
    assert_eq!(one.get_str("state"), Some("running"));
    assert_eq!(two.get_str("state"), Some("stopped"));

    let registry = sysdesc_core::RendererRegistry::builtin();
    let text = registry
        .get("services")
        .unwrap()
        .compare_content_changed(&cmp.changed);
    assert!(text.lines().any(|l| l.trim_start_matches("  * ") == "sshd (state: running <> stopped)"));
}
