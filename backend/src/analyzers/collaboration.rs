//! Collaboration analysis.
//!
//! Contribution distribution across collaborators, a Gini-coefficient-based
//! team-diversity score, leadership indicators from the keyword classifier,
//! and a decision-making-style classification from contribution
//! concentration.

use crate::analyzers::classify::LEADERSHIP_CLASSIFIER;
use crate::errors::PipelineError;
use crate::models::{
    CollaborationReport, DecisionStyle, LeadershipSignal, RawCommit, RawRepository,
};
use std::collections::BTreeMap;

/// A repository needs at least this many collaborators (the analyzed user
/// included) before collaboration claims mean anything.
pub const MIN_CONTRIBUTORS: usize = 2;

/// Contribution concentration thresholds for the decision style, percent.
const CENTRALIZED_SHARE: u64 = 60;
const CONSENSUS_SHARE: u64 = 35;

/// Gini coefficient over contribution counts, milli fixed-point.
///
/// 0 = perfectly even, 1000 = fully concentrated.
pub fn gini_milli(counts: &[u64]) -> u64 {
    let n = counts.len();
    if n == 0 {
        return 0;
    }
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0;
    }

    let mut sorted = counts.to_vec();
    sorted.sort_unstable();

    // G = (2 * sum(i * x_i) / (n * sum(x))) - (n + 1) / n, 1-based ranks.
    let weighted: u128 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (i as u128 + 1) * *x as u128)
        .sum();
    let n = n as u128;
    let total = total as u128;

    let term1 = 2_000 * weighted / (n * total);
    let term2 = 1_000 * (n + 1) / n;
    term1.saturating_sub(term2) as u64
}

/// Classify the decision-making style from the top contributor's share.
pub fn decision_style(top_share_pct: u64) -> DecisionStyle {
    if top_share_pct >= CENTRALIZED_SHARE {
        DecisionStyle::Centralized
    } else if top_share_pct <= CONSENSUS_SHARE {
        DecisionStyle::Consensus
    } else {
        DecisionStyle::Distributed
    }
}

/// Count leadership signals across commit messages and file paths.
pub fn leadership_indicators(commits: &[RawCommit]) -> BTreeMap<LeadershipSignal, u64> {
    let mut indicators = BTreeMap::new();
    for commit in commits {
        let mut text = commit.message.clone();
        for file in &commit.files {
            text.push('\n');
            text.push_str(&file.path);
        }
        for signal in LEADERSHIP_CLASSIFIER.classify(&text) {
            *indicators.entry(signal).or_insert(0) += 1;
        }
    }
    indicators
}

/// Analyze collaboration for one repository from `user`'s perspective.
pub fn analyze_collaboration(
    repo: &RawRepository,
    user: &str,
) -> Result<CollaborationReport, PipelineError> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for c in &repo.collaborators {
        counts.insert(c.login.as_str(), c.commits);
    }
    // The commit log is authoritative for the analyzed user.
    let user_commits = repo.commits.iter().filter(|c| c.author == user).count() as u64;
    if user_commits > 0 {
        counts.insert(user, user_commits);
    }

    if counts.len() < MIN_CONTRIBUTORS {
        return Err(PipelineError::InsufficientData {
            needed: MIN_CONTRIBUTORS,
            got: counts.len(),
        });
    }

    let total: u64 = counts.values().sum();
    if total == 0 {
        return Err(PipelineError::Analysis(
            "repository has contributors but no commits".to_string(),
        ));
    }

    let contribution_pct = user_commits * 100 / total;
    let top_share = counts.values().max().copied().unwrap_or(0) * 100 / total;

    let all_counts: Vec<u64> = counts.values().copied().collect();
    let gini = gini_milli(&all_counts);
    // Even teams score high, concentrated teams low.
    let team_diversity = (1000 - gini.min(1000)) / 10;

    Ok(CollaborationReport {
        // Collaborators other than the analyzed user.
        collaborator_count: (counts.len() - 1) as u64,
        contribution_pct,
        gini_milli: gini,
        team_diversity,
        indicators: leadership_indicators(&repo.commits),
        decision_style: decision_style(top_share),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawCollaborator, RawFileChange};

    fn commit(author: &str, message: &str) -> RawCommit {
        RawCommit {
            sha: format!("sha-{message}"),
            author: author.to_string(),
            timestamp: 1_700_000_000,
            message: message.to_string(),
            files: vec![RawFileChange {
                path: "src/lib.rs".to_string(),
                additions: 10,
                deletions: 2,
            }],
        }
    }

    fn repo(user_commits: usize, collaborators: Vec<(&str, u64)>) -> RawRepository {
        RawRepository {
            full_name: "org/repo".to_string(),
            owner_login: "org".to_string(),
            is_owner: false,
            commits: (0..user_commits)
                .map(|i| commit("dev", &format!("change {i}")))
                .collect(),
            collaborators: collaborators
                .into_iter()
                .map(|(login, commits)| RawCollaborator {
                    login: login.to_string(),
                    commits,
                })
                .collect(),
        }
    }

    #[test]
    fn even_distribution_has_low_gini() {
        assert_eq!(gini_milli(&[10, 10, 10, 10]), 0);
    }

    #[test]
    fn concentration_raises_gini() {
        let even = gini_milli(&[10, 10, 10]);
        let skewed = gini_milli(&[1, 1, 100]);
        assert!(skewed > even);
        assert!(skewed > 500);
    }

    #[test]
    fn decision_style_thresholds() {
        assert_eq!(decision_style(75), DecisionStyle::Centralized);
        assert_eq!(decision_style(60), DecisionStyle::Centralized);
        assert_eq!(decision_style(45), DecisionStyle::Distributed);
        assert_eq!(decision_style(30), DecisionStyle::Consensus);
    }

    #[test]
    fn sole_contributor_is_insufficient_data() {
        let err = analyze_collaboration(&repo(5, vec![]), "dev").unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { needed: 2, got: 1 }));
    }

    #[test]
    fn contribution_percentage_from_commit_log() {
        let report =
            analyze_collaboration(&repo(10, vec![("alice", 20), ("bob", 10)]), "dev").unwrap();
        assert_eq!(report.collaborator_count, 2);
        assert_eq!(report.contribution_pct, 25); // 10 of 40
        assert_eq!(report.decision_style, DecisionStyle::Distributed); // top 50%
    }

    #[test]
    fn indicators_counted_from_messages() {
        let mut r = repo(0, vec![("alice", 1), ("bob", 1)]);
        r.commits = vec![
            commit("dev", "refactor storage architecture"),
            commit("dev", "add onboarding walkthrough for new mentees"),
            commit("dev", "fix typo"),
        ];
        let report = analyze_collaboration(&r, "dev").unwrap();
        assert_eq!(report.indicators[&LeadershipSignal::Architecture], 1);
        assert_eq!(report.indicators[&LeadershipSignal::Mentorship], 1);
        assert!(!report.indicators.contains_key(&LeadershipSignal::Innovation));
    }
}
