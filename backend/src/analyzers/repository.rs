//! Repository record assembly.
//!
//! Runs every per-repository analyzer over the raw collector output and
//! produces the immutable `RepositoryRecord` the privacy pipeline and
//! packer consume. Identities (repository, owner, collaborators) are
//! salted Poseidon hashes; raw names never leave this module.

use crate::analyzers::{collaboration, diversity, language, temporal};
use crate::errors::PipelineError;
use crate::models::{CollaboratorMetric, RawRepository, RepositoryRecord};
use zk_credentials::constants::{
    poseidon_config, DOMAIN_COLLABORATOR, DOMAIN_REPOSITORY,
};
use zk_credentials::gadgets::hash::hash_str;
use zk_credentials::types::FrHex;

/// Minimum commits before a repository is analyzable at all.
pub const MIN_COMMITS: usize = 3;

/// Salted identity hash for a repository or account name.
///
/// The salt is deployment-wide; it keeps identical names from producing
/// linkable hashes across deployments.
pub fn salted_identity(domain: u64, name: &str, salt: &str) -> FrHex {
    let cfg = poseidon_config();
    FrHex::from_fr(&hash_str(&cfg, domain, &format!("{salt}:{name}")))
}

/// Analyze one repository into its immutable record.
pub fn analyze_repository(
    repo: &RawRepository,
    user: &str,
    salt: &str,
) -> Result<RepositoryRecord, PipelineError> {
    if repo.commits.len() < MIN_COMMITS {
        return Err(PipelineError::InsufficientData {
            needed: MIN_COMMITS,
            got: repo.commits.len(),
        });
    }

    let languages = language::analyze_languages(&repo.commits);
    let collaboration = collaboration::analyze_collaboration(repo, user)?;
    let temporal = temporal::analyze_temporal(&repo.commits)?;
    let diversity = diversity::analyze_diversity(repo);

    let total_commits: u64 = repo
        .collaborators
        .iter()
        .map(|c| c.commits)
        .sum::<u64>()
        .max(repo.commits.len() as u64);

    let collaborators: Vec<CollaboratorMetric> = repo
        .collaborators
        .iter()
        .filter(|c| c.login != user)
        .map(|c| {
            let contribution_pct = if total_commits == 0 {
                0
            } else {
                c.commits * 100 / total_commits
            };
            CollaboratorMetric {
                identity_hex: salted_identity(DOMAIN_COLLABORATOR, &c.login, salt).hex,
                contribution_pct,
                // Balance of the team seen from this collaborator.
                score: (100 - contribution_pct.min(100)).min(100),
            }
        })
        .collect();

    let first_activity = repo.commits.iter().map(|c| c.timestamp).min().unwrap_or(0);
    let last_activity = repo.commits.iter().map(|c| c.timestamp).max().unwrap_or(0);
    let lines_changed: u64 = repo.commits.iter().map(|c| c.lines_changed()).sum();

    Ok(RepositoryRecord {
        repo_hash_hex: salted_identity(DOMAIN_REPOSITORY, &repo.full_name, salt).hex,
        owner_hash_hex: owner_hash(&repo.owner_login, salt).hex,
        is_owner: repo.is_owner,
        commit_count: repo.commits.len() as u64,
        lines_changed,
        first_activity,
        last_activity,
        languages,
        collaborators,
        collaboration,
        temporal,
        diversity,
    })
}

/// The owner hash the non-ownership sub-claim compares against: the hash
/// of the owner's *address hash*, matching the circuit's
/// `hash(user_address)` on the prover side.
pub fn owner_hash(owner_login: &str, salt: &str) -> FrHex {
    let cfg = poseidon_config();
    let owner_address = hash_str(&cfg, zk_credentials::constants::DOMAIN_ADDRESS, &format!("{salt}:{owner_login}"));
    FrHex::from_fr(&zk_credentials::gadgets::hash::hash_elems(
        &cfg,
        zk_credentials::constants::DOMAIN_ADDRESS,
        &[owner_address],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawCollaborator, RawCommit, RawFileChange};

    fn repo() -> RawRepository {
        RawRepository {
            full_name: "org/widget".to_string(),
            owner_login: "org".to_string(),
            is_owner: false,
            commits: (0..10)
                .map(|i| RawCommit {
                    sha: format!("sha-{i}"),
                    author: "dev".to_string(),
                    timestamp: 1_700_000_000 + i * 86_400,
                    message: format!("change {i}"),
                    files: vec![RawFileChange {
                        path: "src/lib.rs".to_string(),
                        additions: 10,
                        deletions: 5,
                    }],
                })
                .collect(),
            collaborators: vec![
                RawCollaborator { login: "alice".to_string(), commits: 20 },
                RawCollaborator { login: "bob".to_string(), commits: 10 },
            ],
        }
    }

    #[test]
    fn record_carries_aggregates() {
        let record = analyze_repository(&repo(), "dev", "salt").unwrap();
        assert_eq!(record.commit_count, 10);
        assert_eq!(record.lines_changed, 150);
        assert_eq!(record.span_days(), 9);
        assert_eq!(record.collaborators.len(), 2);
        assert!(!record.languages.usages.is_empty());
    }

    #[test]
    fn too_few_commits_rejected() {
        let mut r = repo();
        r.commits.truncate(2);
        let err = analyze_repository(&r, "dev", "salt").unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { .. }));
    }

    #[test]
    fn identity_hashes_are_salted() {
        let a = salted_identity(DOMAIN_REPOSITORY, "org/widget", "salt-a");
        let b = salted_identity(DOMAIN_REPOSITORY, "org/widget", "salt-b");
        assert_ne!(a.hex, b.hex);
    }

    #[test]
    fn collaborator_logins_never_appear_in_the_record() {
        let record = analyze_repository(&repo(), "dev", "salt").unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("alice"));
        assert!(!json.contains("bob"));
    }
}
