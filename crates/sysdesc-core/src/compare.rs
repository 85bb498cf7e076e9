use crate::CoreError;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use sysdesc_schema::{Description, DescriptionName, Element, Scope, ScopeKind};

/// Two elements with the same name whose attributes differ, `(a, b)`.
pub type ChangedPair<'a> = (&'a Element, &'a Element);

/// Classification of the elements of two same-kind scopes.
///
/// Every element of either input lands in exactly one bucket. `only_in_a`,
/// `changed` and `equal` follow the order of scope A; `only_in_b` follows
/// the order of scope B.
#[derive(Debug, Serialize)]
pub struct ScopeComparison<'a> {
    pub kind: &'a ScopeKind,
    pub only_in_a: Vec<&'a Element>,
    pub only_in_b: Vec<&'a Element>,
    pub changed: Vec<ChangedPair<'a>>,
    pub equal: Vec<&'a Element>,
}

impl ScopeComparison<'_> {
    pub fn is_identical(&self) -> bool {
        self.only_in_a.is_empty() && self.only_in_b.is_empty() && self.changed.is_empty()
    }
}

/// Result of comparing every scope two descriptions have in common.
#[derive(Debug, Serialize)]
pub struct DescriptionComparison<'a> {
    pub name_a: &'a DescriptionName,
    pub name_b: &'a DescriptionName,
    pub scopes: Vec<ScopeComparison<'a>>,
    pub only_in_a_scopes: Vec<&'a ScopeKind>,
    pub only_in_b_scopes: Vec<&'a ScopeKind>,
}

impl DescriptionComparison<'_> {
    pub fn is_identical(&self) -> bool {
        self.only_in_a_scopes.is_empty()
            && self.only_in_b_scopes.is_empty()
            && self.scopes.iter().all(ScopeComparison::is_identical)
    }
}

/// Attribute keys whose values differ between `a` and `b`, over the union of
/// the keys of both. A key present on one side only counts as a difference.
pub fn differing_attributes<'a>(a: &'a Element, b: &'a Element) -> Vec<&'a str> {
    let keys: BTreeSet<&str> = a
        .attributes()
        .keys()
        .chain(b.attributes().keys())
        .map(String::as_str)
        .collect();
    keys.into_iter().filter(|k| a.get(k) != b.get(k)).collect()
}

/// Compare two scopes of the same kind element by element, matching by name.
pub fn compare<'a>(a: &'a Scope, b: &'a Scope) -> Result<ScopeComparison<'a>, CoreError> {
    if a.kind() != b.kind() {
        return Err(CoreError::KindMismatch {
            a: a.kind().to_string(),
            b: b.kind().to_string(),
        });
    }

    let b_elements: Vec<&Element> = b.elements().collect();
    let index: HashMap<&str, usize> = b_elements
        .iter()
        .enumerate()
        .map(|(i, e)| (e.name(), i))
        .collect();
    let mut consumed = vec![false; b_elements.len()];

    let mut only_in_a = Vec::new();
    let mut changed = Vec::new();
    let mut equal = Vec::new();

    for e in a.elements() {
        match index.get(e.name()) {
            None => only_in_a.push(e),
            Some(&i) => {
                consumed[i] = true;
                let f = b_elements[i];
                if differing_attributes(e, f).is_empty() {
                    equal.push(e);
                } else {
                    changed.push((e, f));
                }
            }
        }
    }

    let only_in_b: Vec<&Element> = b_elements
        .iter()
        .zip(&consumed)
        .filter(|(_, used)| !**used)
        .map(|(e, _)| *e)
        .collect();

    tracing::debug!(
        "compared scope '{}': {} only in a, {} only in b, {} changed, {} equal",
        a.kind(),
        only_in_a.len(),
        only_in_b.len(),
        changed.len(),
        equal.len()
    );

    Ok(ScopeComparison {
        kind: a.kind(),
        only_in_a,
        only_in_b,
        changed,
        equal,
    })
}

/// Compare all scopes present in both descriptions, in kind order.
///
/// `kinds` restricts the comparison to the named scopes; empty means all.
pub fn compare_descriptions<'a>(
    a: &'a Description,
    b: &'a Description,
    kinds: &[String],
) -> Result<DescriptionComparison<'a>, CoreError> {
    let wanted = |kind: &ScopeKind| kinds.is_empty() || kinds.iter().any(|k| kind == k.as_str());

    let mut scopes = Vec::new();
    let mut only_in_a_scopes = Vec::new();
    for scope_a in a.scopes().filter(|s| wanted(s.kind())) {
        match b.scope(scope_a.kind()) {
            Some(scope_b) => scopes.push(compare(scope_a, scope_b)?),
            None => only_in_a_scopes.push(scope_a.kind()),
        }
    }
    let only_in_b_scopes = b
        .scopes()
        .filter(|s| wanted(s.kind()) && a.scope(s.kind()).is_none())
        .map(Scope::kind)
        .collect();

    Ok(DescriptionComparison {
        name_a: a.name(),
        name_b: b.name(),
        scopes,
        only_in_a_scopes,
        only_in_b_scopes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, state: &str) -> Element {
        Element::new(name).with_attribute("state", state)
    }

    fn services(elements: Vec<Element>) -> Scope {
        Scope::new("services", elements).unwrap()
    }

    #[test]
    fn sshd_changed_cron_only_in_b() {
        let a = services(vec![service("sshd", "running")]);
        let b = services(vec![service("sshd", "stopped"), service("cron", "running")]);

        let result = compare(&a, &b).unwrap();
        assert!(result.only_in_a.is_empty());
        assert!(result.equal.is_empty());
        assert_eq!(result.changed.len(), 1);
        assert_eq!(result.changed[0].0.get_str("state"), Some("running"));
        assert_eq!(result.changed[0].1.get_str("state"), Some("stopped"));
        assert_eq!(result.only_in_b.len(), 1);
        assert_eq!(result.only_in_b[0].name(), "cron");
        assert!(!result.is_identical());
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let a = services(Vec::new());
        let b = Scope::new("packages", Vec::new()).unwrap();
        let err = compare(&a, &b).unwrap_err();
        assert!(matches!(err, CoreError::KindMismatch { .. }));
    }

    #[test]
    fn missing_attribute_counts_as_difference() {
        let a = services(vec![service("sshd", "running")]);
        let b = services(vec![Element::new("sshd")]);
        let result = compare(&a, &b).unwrap();
        assert_eq!(result.changed.len(), 1);

        // And the other way round: the key only exists on b.
        let result = compare(&b, &a).unwrap();
        assert_eq!(result.changed.len(), 1);
    }

    #[test]
    fn differing_attributes_uses_key_union() {
        let a = Element::new("x")
            .with_attribute("state", "on")
            .with_attribute("same", 1_i64);
        let b = Element::new("x")
            .with_attribute("same", 1_i64)
            .with_attribute("extra", true);
        assert_eq!(differing_attributes(&a, &b), ["extra", "state"]);
    }

    #[test]
    fn nested_values_compare_structurally() {
        let a: Scope = Scope::from_json(
            "users",
            r#"{"kind": "users", "elements": [{"name": "root", "groups": ["a", "b"], "extra": {"x": 1, "y": 2}}]}"#,
        )
        .unwrap();
        let b: Scope = Scope::from_json(
            "users",
            r#"{"kind": "users", "elements": [{"name": "root", "extra": {"y": 2, "x": 1}, "groups": ["a", "b"]}]}"#,
        )
        .unwrap();
        let result = compare(&a, &b).unwrap();
        assert_eq!(result.equal.len(), 1);

        let c: Scope = Scope::from_json(
            "users",
            r#"{"kind": "users", "elements": [{"name": "root", "groups": ["b", "a"], "extra": {"x": 1, "y": 2}}]}"#,
        )
        .unwrap();
        assert_eq!(compare(&a, &c).unwrap().changed.len(), 1);
    }

    #[test]
    fn comparison_serializes_to_json() {
        let a = services(vec![service("sshd", "running")]);
        let b = services(vec![service("sshd", "stopped")]);
        let result = compare(&a, &b).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "services");
        assert_eq!(json["changed"][0][1]["state"], "stopped");
    }

    #[test]
    fn descriptions_report_one_sided_scopes() {
        let a = Description::new("a")
            .with_scope(services(vec![service("sshd", "running")]))
            .with_scope(Scope::new("packages", Vec::new()).unwrap());
        let b = Description::new("b")
            .with_scope(services(vec![service("sshd", "running")]))
            .with_scope(Scope::new("users", Vec::new()).unwrap());

        let result = compare_descriptions(&a, &b, &[]).unwrap();
        assert_eq!(result.scopes.len(), 1);
        assert_eq!(result.only_in_a_scopes, [&ScopeKind::from("packages")]);
        assert_eq!(result.only_in_b_scopes, [&ScopeKind::from("users")]);
        assert!(!result.is_identical());
    }

    #[test]
    fn descriptions_filtered_by_kind() {
        let a = Description::new("a")
            .with_scope(services(vec![service("sshd", "running")]))
            .with_scope(Scope::new("packages", Vec::new()).unwrap());
        let b = Description::new("b").with_scope(services(vec![service("sshd", "running")]));

        let result = compare_descriptions(&a, &b, &["services".to_owned()]).unwrap();
        assert!(result.only_in_a_scopes.is_empty());
        assert!(result.is_identical());
    }
}
