//! K-anonymity generalization and suppression.
//!
//! Quasi-identifier fields are generalized (specific languages collapse
//! into categories), then any quasi-identifier combination backed by fewer
//! than k records is suppressed entirely. Sensitive fields can additionally
//! be suppressed at a configured probability.

use rand::Rng;
use std::collections::BTreeMap;

/// Language -> category generalization table.
const LANGUAGE_CATEGORIES: &[(&str, &str)] = &[
    ("rust", "systems"),
    ("c", "systems"),
    ("cpp", "systems"),
    ("zig", "systems"),
    ("go", "systems"),
    ("python", "scripting"),
    ("ruby", "scripting"),
    ("php", "scripting"),
    ("lua", "scripting"),
    ("shell", "scripting"),
    ("javascript", "web"),
    ("typescript", "web"),
    ("java", "managed"),
    ("kotlin", "managed"),
    ("csharp", "managed"),
    ("swift", "mobile"),
    ("haskell", "functional"),
    ("ocaml", "functional"),
    ("erlang", "functional"),
    ("elixir", "functional"),
    ("scala", "functional"),
    ("clojure", "functional"),
    ("r", "data"),
    ("julia", "data"),
    ("sql", "data"),
    ("solidity", "blockchain"),
];

/// Generalize a specific language into its quasi-identifier category.
pub fn generalize_language(language: &str) -> &'static str {
    LANGUAGE_CATEGORIES
        .iter()
        .find(|(l, _)| *l == language)
        .map(|(_, c)| *c)
        .unwrap_or("other")
}

/// A record with its quasi-identifier combination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuasiRecord<T> {
    pub quasi: Vec<String>,
    pub payload: T,
}

/// Enforce k-anonymity by suppression: every surviving quasi-identifier
/// combination is backed by at least `k` input records; smaller groups are
/// dropped entirely, never released.
pub fn k_anonymize<T: Clone>(records: &[QuasiRecord<T>], k: usize) -> Vec<QuasiRecord<T>> {
    let mut groups: BTreeMap<&[String], usize> = BTreeMap::new();
    for r in records {
        *groups.entry(r.quasi.as_slice()).or_insert(0) += 1;
    }

    records
        .iter()
        .filter(|r| groups[r.quasi.as_slice()] >= k)
        .cloned()
        .collect()
}

/// Probabilistically suppress a sensitive value at `rate` (0.0–1.0).
pub fn suppress<T>(rng: &mut impl Rng, value: T, rate: f64) -> Option<T> {
    if rng.r#gen::<f64>() < rate {
        None
    } else {
        Some(value)
    }
}
