//! Deterministic topological ordering for dependent objects
//!
//! Views (and functions) must be created after everything they reference.
//! Dependencies are discovered by scanning definition text for sibling
//! object names; PostgreSQL does not expose body-level references through
//! `pg_depend`, so name scanning is the portable approximation.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Whether `text` references `name` as a standalone identifier.
///
/// Matches bare and quoted occurrences, rejecting cases where the name is
/// part of a longer identifier.
pub fn references(text: &str, name: &str) -> bool {
    if text.contains(&format!("\"{}\"", name)) {
        return true;
    }
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(pos) = text[from..].find(name) {
        let start = from + pos;
        let end = start + name.len();
        let before_ok = start == 0 || !is_ident_char(bytes[start - 1]);
        let after_ok = end == bytes.len() || !is_ident_char(bytes[end]);
        if before_ok && after_ok {
            return true;
        }
        from = end;
    }
    false
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Order `nodes` so that every node comes after its in-set dependencies.
///
/// `deps` maps each node to the set of sibling nodes it references. Ties
/// break lexicographically (Kahn's algorithm over sorted sets). A cycle is
/// an error naming its members.
pub fn sort(deps: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>> {
    let mut remaining: BTreeMap<&str, BTreeSet<&str>> = deps
        .iter()
        .map(|(node, d)| {
            let in_set = d
                .iter()
                .filter(|dep| deps.contains_key(*dep) && *dep != node)
                .map(|s| s.as_str())
                .collect();
            (node.as_str(), in_set)
        })
        .collect();

    let mut ordered = Vec::with_capacity(remaining.len());
    while !remaining.is_empty() {
        let next = remaining
            .iter()
            .find(|(_, d)| d.is_empty())
            .map(|(node, _)| *node);
        let Some(node) = next else {
            let members: Vec<&str> = remaining.keys().copied().collect();
            return Err(Error::ViewCycle(members.join(", ")));
        };
        remaining.remove(node);
        for d in remaining.values_mut() {
            d.remove(node);
        }
        ordered.push(node.to_string());
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps_of(pairs: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
        pairs
            .iter()
            .map(|(node, d)| {
                (
                    node.to_string(),
                    d.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_sort_respects_dependencies() {
        let deps = deps_of(&[
            ("a_top", &["m_mid"]),
            ("m_mid", &["z_base"]),
            ("z_base", &[]),
        ]);
        assert_eq!(sort(&deps).unwrap(), ["z_base", "m_mid", "a_top"]);
    }

    #[test]
    fn test_sort_breaks_ties_alphabetically() {
        let deps = deps_of(&[("b", &[]), ("a", &[]), ("c", &["a"])]);
        assert_eq!(sort(&deps).unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn test_cycle_is_an_error() {
        let deps = deps_of(&[("a", &["b"]), ("b", &["a"])]);
        let err = sort(&deps).unwrap_err();
        assert!(err.to_string().contains("a, b"));
    }

    #[test]
    fn test_references_word_boundaries() {
        assert!(references("SELECT * FROM orders", "orders"));
        assert!(references("SELECT * FROM \"orders\"", "orders"));
        assert!(!references("SELECT * FROM orders_archive", "orders"));
        assert!(!references("SELECT reordersum FROM t", "orders"));
    }

    #[test]
    fn test_out_of_set_dependencies_are_ignored() {
        let deps = deps_of(&[("v", &["some_table"])]);
        assert_eq!(sort(&deps).unwrap(), ["v"]);
    }
}
