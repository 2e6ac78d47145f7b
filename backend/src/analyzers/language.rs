//! Language detection and proficiency scoring.
//!
//! Pure functions over immutable commit records. File extensions map to
//! languages through a static table; proficiency blends usage volume,
//! commit count, file diversity, experience duration and a fixed complexity
//! bonus; the Shannon index measures how evenly lines spread across
//! languages.

use crate::models::{LanguageReport, LanguageUsageMetric, RawCommit};
use std::collections::{BTreeMap, BTreeSet};
use zk_credentials::constants::{poseidon_config, DOMAIN_LANGUAGE};
use zk_credentials::gadgets::hash::fingerprint_from_str;

/// Extension -> language. Extend here, not in control flow.
const EXTENSION_TABLE: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("go", "go"),
    ("py", "python"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("swift", "swift"),
    ("c", "c"),
    ("h", "c"),
    ("cc", "cpp"),
    ("cpp", "cpp"),
    ("hpp", "cpp"),
    ("cs", "csharp"),
    ("rb", "ruby"),
    ("php", "php"),
    ("scala", "scala"),
    ("hs", "haskell"),
    ("erl", "erlang"),
    ("ex", "elixir"),
    ("exs", "elixir"),
    ("ml", "ocaml"),
    ("clj", "clojure"),
    ("lua", "lua"),
    ("r", "r"),
    ("jl", "julia"),
    ("sol", "solidity"),
    ("zig", "zig"),
    ("sh", "shell"),
    ("sql", "sql"),
];

/// Languages that earn the fixed complexity bonus.
const COMPLEX_LANGUAGES: &[&str] = &[
    "rust", "c", "cpp", "haskell", "erlang", "ocaml", "scala", "zig", "solidity",
];

/// Proficiency blend weights, percent; sum to 100.
const WEIGHT_LINES: u64 = 40;
const WEIGHT_COMMITS: u64 = 25;
const WEIGHT_FILES: u64 = 15;
const WEIGHT_DURATION: u64 = 10;
const WEIGHT_COMPLEXITY: u64 = 10;

pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lowered = ext.to_lowercase();
    EXTENSION_TABLE
        .iter()
        .find(|(e, _)| *e == lowered)
        .map(|(_, lang)| *lang)
}

fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() { None } else { Some(ext) }
}

#[derive(Default)]
struct Accumulator {
    lines: u64,
    commits: u64,
    files: BTreeSet<String>,
}

/// Detect languages across a repository's commit history.
pub fn analyze_languages(commits: &[RawCommit]) -> LanguageReport {
    let cfg = poseidon_config();

    let mut acc: BTreeMap<&'static str, Accumulator> = BTreeMap::new();
    for commit in commits {
        let mut touched: BTreeMap<&'static str, bool> = BTreeMap::new();
        for file in &commit.files {
            let Some(lang) = extension(&file.path).and_then(language_for_extension) else {
                continue;
            };
            let entry = acc.entry(lang).or_default();
            entry.lines += file.additions + file.deletions;
            entry.files.insert(file.path.clone());
            touched.insert(lang, true);
        }
        for lang in touched.keys() {
            acc.get_mut(*lang).expect("touched implies present").commits += 1;
        }
    }

    let span_days = activity_span_days(commits);

    let mut usages: Vec<LanguageUsageMetric> = acc
        .into_iter()
        .filter(|(_, a)| a.lines > 0)
        .map(|(language, a)| LanguageUsageMetric {
            fingerprint: fingerprint_from_str(&cfg, DOMAIN_LANGUAGE, language),
            proficiency: proficiency(
                language,
                a.lines,
                a.commits,
                a.files.len() as u64,
                span_days,
            ),
            language: language.to_string(),
            lines: a.lines,
            commit_count: a.commits,
            file_count: a.files.len() as u64,
        })
        .collect();
    usages.sort_by(|a, b| b.lines.cmp(&a.lines));

    LanguageReport {
        shannon_diversity_milli: shannon_index_milli(&usages),
        usages,
    }
}

fn activity_span_days(commits: &[RawCommit]) -> u64 {
    let (mut first, mut last) = (i64::MAX, i64::MIN);
    for c in commits {
        first = first.min(c.timestamp);
        last = last.max(c.timestamp);
    }
    if first > last {
        return 0;
    }
    ((last - first) as u64) / 86_400
}

/// Proficiency 0–100: weighted blend of normalized sub-scores.
pub fn proficiency(language: &str, lines: u64, commits: u64, files: u64, span_days: u64) -> u64 {
    let lines_score = (lines / 50).min(100);
    let commit_score = (commits * 2).min(100);
    let file_score = (files * 10).min(100);
    let duration_score = (span_days / 7).min(100);
    let complexity_bonus = if COMPLEX_LANGUAGES.contains(&language) { 100 } else { 0 };

    (WEIGHT_LINES * lines_score
        + WEIGHT_COMMITS * commit_score
        + WEIGHT_FILES * file_score
        + WEIGHT_DURATION * duration_score
        + WEIGHT_COMPLEXITY * complexity_bonus)
        / 100
}

/// Shannon diversity index over per-language line shares, milli fixed-point.
///
/// H = -sum(p_i * ln(p_i)); 0 for a single language.
pub fn shannon_index_milli(usages: &[LanguageUsageMetric]) -> u64 {
    let total: u64 = usages.iter().map(|u| u.lines).sum();
    if total == 0 {
        return 0;
    }
    let h: f64 = usages
        .iter()
        .filter(|u| u.lines > 0)
        .map(|u| {
            let p = u.lines as f64 / total as f64;
            -p * p.ln()
        })
        .sum();
    (h * 1000.0).round() as u64
}
