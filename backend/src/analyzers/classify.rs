//! Data-driven keyword classifier.
//!
//! Every heuristic that maps free text (commit messages, file paths,
//! repository names) to a category goes through an explicit rule table, so
//! the tables can be tested and extended without touching control flow.

use crate::models::LeadershipSignal;
use std::collections::BTreeSet;

/// A category -> pattern-set table. Matching is case-insensitive substring
/// containment.
pub struct Classifier<C: Copy + Ord + 'static> {
    rules: &'static [(C, &'static [&'static str])],
}

impl<C: Copy + Ord + 'static> Classifier<C> {
    pub const fn new(rules: &'static [(C, &'static [&'static str])]) -> Self {
        Self { rules }
    }

    /// All categories whose pattern set matches `text`.
    pub fn classify(&self, text: &str) -> BTreeSet<C> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .filter(|(_, patterns)| patterns.iter().any(|p| lowered.contains(p)))
            .map(|(category, _)| *category)
            .collect()
    }
}

/// Leadership signals in commit messages and file paths.
pub const LEADERSHIP_RULES: &[(LeadershipSignal, &[&str])] = &[
    (
        LeadershipSignal::Architecture,
        &["architect", "redesign", "refactor", "rfc", "adr", "design doc", "migration plan"],
    ),
    (
        LeadershipSignal::Mentorship,
        &["mentor", "onboard", "pair with", "teach", "walkthrough", "good first issue"],
    ),
    (
        LeadershipSignal::Process,
        &["ci/cd", "pipeline", "workflow", "pre-commit", "lint rule", "release process"],
    ),
    (
        LeadershipSignal::Documentation,
        &["readme", "docs/", "documentation", "changelog", "guide", "tutorial"],
    ),
    (
        LeadershipSignal::Review,
        &["review", "feedback", "address comments", "requested changes", "lgtm"],
    ),
    (
        LeadershipSignal::ProjectManagement,
        &["milestone", "roadmap", "triage", "sprint", "backlog", "release plan"],
    ),
    (
        LeadershipSignal::Innovation,
        &["prototype", "proof of concept", "poc", "experiment", "spike", "novel"],
    ),
    (
        LeadershipSignal::TeamBuilding,
        &["contributing.md", "code of conduct", "team", "community call", "welcome"],
    ),
];

/// Problem domains detected from repository text.
pub const DOMAIN_RULES: &[(&str, &[&str])] = &[
    ("web", &["http", "server", "frontend", "backend", "website", "api"]),
    ("data", &["etl", "pipeline", "analytics", "warehouse", "dataset"]),
    ("ml", &["model", "training", "neural", "inference", "ml", "llm"]),
    ("systems", &["kernel", "driver", "embedded", "allocator", "runtime"]),
    ("crypto", &["cryptograph", "zero-knowledge", "zkp", "signature", "hash", "proof"]),
    ("devops", &["docker", "kubernetes", "terraform", "deploy", "infra"]),
    ("mobile", &["android", "ios", "mobile", "app store"]),
    ("games", &["game", "engine", "shader", "sprite"]),
];

/// Frameworks and major technologies.
pub const FRAMEWORK_RULES: &[(&str, &[&str])] = &[
    ("react", &["react", "jsx", "next.js"]),
    ("axum", &["axum", "tower"]),
    ("django", &["django"]),
    ("rails", &["rails", "activerecord"]),
    ("spring", &["spring boot", "springframework"]),
    ("tokio", &["tokio", "async runtime"]),
    ("pytorch", &["pytorch", "torch"]),
    ("tensorflow", &["tensorflow", "keras"]),
    ("postgres", &["postgres", "postgresql"]),
    ("sqlite", &["sqlite"]),
    ("kafka", &["kafka"]),
    ("redis", &["redis"]),
];

/// Project types.
pub const PROJECT_TYPE_RULES: &[(&str, &[&str])] = &[
    ("library", &["library", "crate", "sdk", "package"]),
    ("service", &["service", "daemon", "server", "api"]),
    ("cli", &["cli", "command line", "terminal"]),
    ("application", &["app", "dashboard", "ui"]),
    ("tooling", &["tool", "plugin", "extension", "formatter", "linter"]),
];

pub const LEADERSHIP_CLASSIFIER: Classifier<LeadershipSignal> = Classifier::new(LEADERSHIP_RULES);
pub const DOMAIN_CLASSIFIER: Classifier<&'static str> = Classifier::new(DOMAIN_RULES);
pub const FRAMEWORK_CLASSIFIER: Classifier<&'static str> = Classifier::new(FRAMEWORK_RULES);
pub const PROJECT_TYPE_CLASSIFIER: Classifier<&'static str> = Classifier::new(PROJECT_TYPE_RULES);
