//! Privacy pipeline: differential privacy, k-anonymity, value blinding,
//! and the per-user epsilon budget.
//!
//! The pipeline never mutates analyzer output in place; it produces new,
//! noised copies. Values that feed constraint witnesses (commit counts,
//! line totals, collaborator counts) stay exact, because the proofs
//! disclose them only through public ranges; noise is applied to the
//! derived metrics that leave the system as plain numbers.

pub mod anonymity;
pub mod blinding;
pub mod budget;
pub mod noise;

use crate::errors::PipelineError;
use crate::models::{PrivacyLevel, RepositoryRecord};
use anonymity::generalize_language;
use budget::{BudgetCategory, BudgetLedger};
use noise::{Bounds, Mechanism};
use rand::Rng;
use std::collections::BTreeMap;

/// Pipeline configuration; deployment-level, not per-request.
#[derive(Clone, Copy, Debug)]
pub struct PrivacyConfig {
    /// Epsilon charged per privatized repository record, milli-units.
    pub epsilon_milli_per_record: u64,
    /// k-anonymity floor for language-category groups.
    pub k: usize,
    /// Probability of suppressing a sensitive derived score outright.
    pub suppression_rate: f64,
    pub mechanism: Mechanism,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            epsilon_milli_per_record: 500,
            k: 2,
            suppression_rate: 0.05,
            mechanism: Mechanism::Laplace,
        }
    }
}

const SCORE_BOUNDS: Bounds = Bounds { min: 0.0, max: 100.0 };

/// Privatize a whole portfolio of records.
///
/// Reserves budget first (atomic check-then-reserve); on rejection nothing
/// is transformed and nothing is charged beyond prior operations.
pub fn privatize_portfolio(
    ledger: &BudgetLedger,
    user: &str,
    records: &[RepositoryRecord],
    config: &PrivacyConfig,
    level: PrivacyLevel,
    rng: &mut impl Rng,
) -> Result<Vec<RepositoryRecord>, PipelineError> {
    let total_epsilon = config.epsilon_milli_per_record * records.len() as u64;
    ledger.reserve(user, BudgetCategory::Analysis, total_epsilon)?;

    let epsilon = config.epsilon_milli_per_record as f64 / 1000.0;

    // Language-category group sizes across the portfolio drive the
    // k-anonymity suppression below.
    let mut category_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for record in records {
        for usage in &record.languages.usages {
            *category_counts
                .entry(generalize_language(&usage.language))
                .or_insert(0) += 1;
        }
    }

    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let mut copy = record.clone();

        // Generalize quasi-identifiers, suppress under-populated groups.
        copy.languages.usages.retain(|usage| {
            category_counts[generalize_language(&usage.language)] >= config.k
        });
        for usage in &mut copy.languages.usages {
            usage.language = generalize_language(&usage.language).to_string();
        }

        // Noise the derived scores; each is clamped to its declared domain.
        for usage in &mut copy.languages.usages {
            usage.proficiency = noise::noised_u64(
                rng,
                config.mechanism,
                usage.proficiency,
                1.0,
                epsilon,
                SCORE_BOUNDS,
            );
        }
        copy.collaboration.team_diversity = noise::noised_u64(
            rng,
            config.mechanism,
            copy.collaboration.team_diversity,
            1.0,
            epsilon,
            SCORE_BOUNDS,
        );
        copy.temporal.consistency_score = noise::noised_u64(
            rng,
            config.mechanism,
            copy.temporal.consistency_score,
            1.0,
            epsilon,
            SCORE_BOUNDS,
        );
        copy.temporal.burnout_risk = noise::noised_u64(
            rng,
            config.mechanism,
            copy.temporal.burnout_risk,
            1.0,
            epsilon,
            SCORE_BOUNDS,
        );
        copy.diversity.breadth = noise::noised_u64(
            rng,
            config.mechanism,
            copy.diversity.breadth,
            1.0,
            epsilon,
            SCORE_BOUNDS,
        );
        copy.diversity.depth = noise::noised_u64(
            rng,
            config.mechanism,
            copy.diversity.depth,
            1.0,
            epsilon,
            SCORE_BOUNDS,
        );

        // Sensitive one-off suppression: burnout risk is the most
        // disclosive single number in the report.
        if anonymity::suppress(rng, (), config.suppression_rate).is_none() {
            copy.temporal.burnout_risk = 0;
        }

        // Maximum privacy additionally blinds collaborator identities with
        // the per-user salt before they become circuit inputs, and drops
        // the raw temporal counts.
        if level == PrivacyLevel::Maximum {
            let salt = blinding::blinding_salt(user, "portfolio");
            for collaborator in &mut copy.collaborators {
                let identity = zk_credentials::types::FrHex {
                    hex: collaborator.identity_hex.clone(),
                }
                .to_fr();
                if let Ok(identity) = identity {
                    collaborator.identity_hex =
                        blinding::blind_fr(identity, salt).hex;
                }
            }
            copy.temporal.longest_streak_days = 0;
            copy.temporal.active_days = 0;
        }

        out.push(copy);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::repository::analyze_repository;
    use crate::models::{RawCollaborator, RawCommit, RawFileChange, RawRepository};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn sample_record(lang_file: &str) -> RepositoryRecord {
        let repo = RawRepository {
            full_name: "org/widget".to_string(),
            owner_login: "org".to_string(),
            is_owner: false,
            commits: (0..5)
                .map(|i| RawCommit {
                    sha: format!("sha-{i}"),
                    author: "dev".to_string(),
                    timestamp: 1_700_000_000 + i * 86_400,
                    message: format!("change {i}"),
                    files: vec![RawFileChange {
                        path: lang_file.to_string(),
                        additions: 100,
                        deletions: 10,
                    }],
                })
                .collect(),
            collaborators: vec![
                RawCollaborator { login: "alice".to_string(), commits: 10 },
                RawCollaborator { login: "bob".to_string(), commits: 5 },
            ],
        };
        analyze_repository(&repo, "dev", "salt").unwrap()
    }

    #[test]
    fn raw_records_are_not_mutated() {
        let ledger = BudgetLedger::new(100_000);
        let records = vec![sample_record("src/main.rs"), sample_record("src/lib.rs")];
        let before = serde_json::to_string(&records).unwrap();

        let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
        let _ = privatize_portfolio(
            &ledger,
            "dev",
            &records,
            &PrivacyConfig::default(),
            PrivacyLevel::Standard,
            &mut rng,
        )
        .unwrap();

        assert_eq!(serde_json::to_string(&records).unwrap(), before);
    }

    #[test]
    fn languages_are_generalized_to_categories() {
        let ledger = BudgetLedger::new(100_000);
        let records = vec![sample_record("src/main.rs"), sample_record("src/lib.rs")];

        let mut rng = ChaCha20Rng::from_seed([2u8; 32]);
        let out = privatize_portfolio(
            &ledger,
            "dev",
            &records,
            &PrivacyConfig::default(),
            PrivacyLevel::Standard,
            &mut rng,
        )
        .unwrap();

        for record in &out {
            for usage in &record.languages.usages {
                assert_eq!(usage.language, "systems"); // rust -> systems
            }
        }
    }

    #[test]
    fn under_populated_categories_are_suppressed() {
        let ledger = BudgetLedger::new(100_000);
        // One rust record, one python record: with k=2 both categories
        // have only one member and get suppressed.
        let records = vec![sample_record("src/main.rs"), sample_record("tool.py")];

        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
        let out = privatize_portfolio(
            &ledger,
            "dev",
            &records,
            &PrivacyConfig::default(),
            PrivacyLevel::Standard,
            &mut rng,
        )
        .unwrap();

        for record in &out {
            assert!(record.languages.usages.is_empty());
        }
    }

    #[test]
    fn budget_exhaustion_blocks_the_whole_operation() {
        let ledger = BudgetLedger::new(600);
        let records = vec![sample_record("src/main.rs"), sample_record("src/lib.rs")];

        let mut rng = ChaCha20Rng::from_seed([4u8; 32]);
        // 2 records * 500 milli = 1000 > 600.
        let err = privatize_portfolio(
            &ledger,
            "dev",
            &records,
            &PrivacyConfig::default(),
            PrivacyLevel::Standard,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::PrivacyBudgetExceeded { .. }));
        // Nothing was charged by the failed reserve.
        assert_eq!(ledger.snapshot("dev").consumed_milli, 0);
    }

    #[test]
    fn maximum_privacy_blinds_raw_temporal_counts() {
        let ledger = BudgetLedger::new(100_000);
        let records = vec![sample_record("src/main.rs"), sample_record("src/lib.rs")];

        let mut rng = ChaCha20Rng::from_seed([5u8; 32]);
        let out = privatize_portfolio(
            &ledger,
            "dev",
            &records,
            &PrivacyConfig::default(),
            PrivacyLevel::Maximum,
            &mut rng,
        )
        .unwrap();
        assert!(out.iter().all(|r| r.temporal.longest_streak_days == 0));
    }
}
