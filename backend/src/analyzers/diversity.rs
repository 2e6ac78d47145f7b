//! Technology and domain diversity analysis.
//!
//! Detects domains, frameworks and project types by matching repository
//! text against the static classifier tables, applies fixed cross-domain
//! combination bonuses, and rolls per-repository results up into portfolio
//! breadth/depth/innovation metrics.

use crate::analyzers::classify::{
    DOMAIN_CLASSIFIER, FRAMEWORK_CLASSIFIER, PROJECT_TYPE_CLASSIFIER,
};
use crate::models::{DiversityReport, RawRepository};
use std::collections::BTreeSet;

/// Cross-domain pairs that earn an innovation bonus, with the bonus size.
/// Working across these boundaries is rarer than depth within one.
const COMBINATION_BONUSES: &[((&str, &str), u64)] = &[
    (("crypto", "web"), 10),
    (("ml", "systems"), 10),
    (("ml", "web"), 5),
    (("data", "ml"), 5),
    (("systems", "crypto"), 15),
    (("devops", "systems"), 5),
];

/// Every searchable text surface of a repository, concatenated.
fn repository_text(repo: &RawRepository) -> String {
    let mut text = repo.full_name.clone();
    for commit in &repo.commits {
        text.push('\n');
        text.push_str(&commit.message);
        for file in &commit.files {
            text.push('\n');
            text.push_str(&file.path);
        }
    }
    text
}

/// Analyze one repository's diversity surfaces.
pub fn analyze_diversity(repo: &RawRepository) -> DiversityReport {
    let text = repository_text(repo);

    let domains: BTreeSet<&str> = DOMAIN_CLASSIFIER.classify(&text);
    let frameworks: BTreeSet<&str> = FRAMEWORK_CLASSIFIER.classify(&text);
    let project_types: BTreeSet<&str> = PROJECT_TYPE_CLASSIFIER.classify(&text);

    let breadth = ((domains.len() + frameworks.len() + project_types.len()) as u64 * 10).min(100);

    // Depth: how much signal volume backs each detected category.
    let commits = repo.commits.len() as u64;
    let categories = (domains.len() + frameworks.len() + project_types.len()).max(1) as u64;
    let depth = (commits * 5 / categories).min(100);

    let innovation = combination_bonus(&domains).min(100);

    DiversityReport {
        domains: domains.iter().map(|d| d.to_string()).collect(),
        frameworks: frameworks.iter().map(|f| f.to_string()).collect(),
        project_types: project_types.iter().map(|p| p.to_string()).collect(),
        breadth,
        depth,
        innovation,
    }
}

/// Sum of the fixed bonuses for every detected cross-domain pair.
pub fn combination_bonus(domains: &BTreeSet<&str>) -> u64 {
    COMBINATION_BONUSES
        .iter()
        .filter(|((a, b), _)| domains.contains(a) && domains.contains(b))
        .map(|(_, bonus)| *bonus)
        .sum()
}

/// Portfolio rollup over per-repository reports.
pub fn portfolio_diversity(reports: &[DiversityReport]) -> DiversityReport {
    let mut domains = BTreeSet::new();
    let mut frameworks = BTreeSet::new();
    let mut project_types = BTreeSet::new();
    for r in reports {
        domains.extend(r.domains.iter().cloned());
        frameworks.extend(r.frameworks.iter().cloned());
        project_types.extend(r.project_types.iter().cloned());
    }

    let breadth = ((domains.len() + frameworks.len() + project_types.len()) as u64 * 5).min(100);
    let depth = if reports.is_empty() {
        0
    } else {
        reports.iter().map(|r| r.depth).sum::<u64>() / reports.len() as u64
    };
    let innovation = {
        let refs: BTreeSet<&str> = domains.iter().map(|s| s.as_str()).collect();
        let cross = combination_bonus(&refs);
        let per_repo_max = reports.iter().map(|r| r.innovation).max().unwrap_or(0);
        (cross + per_repo_max).min(100)
    };

    DiversityReport {
        domains: domains.into_iter().collect(),
        frameworks: frameworks.into_iter().collect(),
        project_types: project_types.into_iter().collect(),
        breadth,
        depth,
        innovation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawCommit, RawFileChange};

    fn repo(name: &str, messages: &[&str]) -> RawRepository {
        RawRepository {
            full_name: name.to_string(),
            owner_login: "org".to_string(),
            is_owner: false,
            commits: messages
                .iter()
                .enumerate()
                .map(|(i, m)| RawCommit {
                    sha: format!("sha-{i}"),
                    author: "dev".to_string(),
                    timestamp: 1_700_000_000 + i as i64,
                    message: m.to_string(),
                    files: vec![RawFileChange {
                        path: "src/lib.rs".to_string(),
                        additions: 5,
                        deletions: 1,
                    }],
                })
                .collect(),
            collaborators: vec![],
        }
    }

    #[test]
    fn detects_domains_from_text() {
        let report = analyze_diversity(&repo(
            "org/zk-prover",
            &["add zero-knowledge proof circuit", "http api server for proofs"],
        ));
        assert!(report.domains.contains(&"crypto".to_string()));
        assert!(report.domains.contains(&"web".to_string()));
    }

    #[test]
    fn cross_domain_pairs_earn_bonus() {
        let mut domains = BTreeSet::new();
        domains.insert("crypto");
        domains.insert("web");
        assert_eq!(combination_bonus(&domains), 10);

        domains.insert("systems");
        // crypto+web (10) + systems+crypto (15).
        assert_eq!(combination_bonus(&domains), 25);
    }

    #[test]
    fn no_signal_is_a_zero_report() {
        let report = analyze_diversity(&repo("org/thing", &["tweak", "adjust"]));
        assert!(report.domains.is_empty());
        assert_eq!(report.innovation, 0);
    }

    #[test]
    fn portfolio_union_over_repositories() {
        let a = analyze_diversity(&repo("org/ml-models", &["train neural model"]));
        let b = analyze_diversity(&repo("org/kernel-driver", &["fix embedded driver"]));
        let portfolio = portfolio_diversity(&[a, b]);
        assert!(portfolio.domains.contains(&"ml".to_string()));
        assert!(portfolio.domains.contains(&"systems".to_string()));
        // The ml+systems pair only appears at the portfolio level.
        assert!(portfolio.innovation >= 10);
    }
}
