//! Circuit-input packer and validator.
//!
//! Turns analyzer records into the fixed-capacity, zero-padded slot arrays
//! the circuits consume. Validation is fail-fast: capacity overflow and
//! claim-range violations are rejected here, before any proving time is
//! spent. Nothing is ever truncated; dropping entries silently would drop
//! claims.

use crate::errors::PipelineError;
use crate::models::{RawRepository, RepositoryRecord};
use ark_bn254::Fr;
use zk_credentials::constants::{
    poseidon_config, DOMAIN_ADDRESS, DOMAIN_COMMIT_LEAF, K_ANONYMITY_FLOOR, MAX_COLLABORATORS,
    MAX_COMMITS, MAX_LANGUAGES, MAX_REPOSITORIES, MAX_STAT_VALUES, MERKLE_DEPTH,
};
use zk_credentials::credentials::collaboration::CollaborationCredentialCircuit;
use zk_credentials::credentials::language::LanguageCredentialCircuit;
use zk_credentials::error::CircuitError;
use zk_credentials::gadgets::hash::{hash_elems, hash_str};
use zk_credentials::gadgets::signature::derive_address;
use zk_credentials::groth16::{
    DefaultAggregatorCircuit, DefaultRepositoryCircuit, DefaultStatsCircuit,
};
use zk_credentials::types::{
    ClaimRange, CollaboratorSlot, CommitSlot, LanguageSlot, RepositorySlot,
};

/// Widen an actual value into a privacy range aligned to `bucket`.
///
/// The range, not the value, becomes public; every value in the same
/// bucket produces the same range.
pub fn privacy_range(value: u64, bucket: u64) -> ClaimRange {
    let bucket = bucket.max(1);
    let lo = value / bucket * bucket;
    ClaimRange {
        lo,
        hi: lo + bucket - 1,
    }
}

/// Pack one repository's commit history into commit slots.
pub fn pack_commits(raw: &RawRepository, salt: &str) -> Result<Vec<CommitSlot>, PipelineError> {
    if raw.commits.len() > MAX_COMMITS {
        return Err(CircuitError::CapacityExceeded {
            capacity: MAX_COMMITS,
            got: raw.commits.len(),
        }
        .into());
    }
    let cfg = poseidon_config();

    let mut slots: Vec<CommitSlot> = raw
        .commits
        .iter()
        .map(|c| CommitSlot {
            commit_id: hash_str(&cfg, DOMAIN_COMMIT_LEAF, &format!("{salt}:{}", c.sha)),
            additions: c.additions(),
            deletions: c.deletions(),
            active: true,
        })
        .collect();
    slots.resize(MAX_COMMITS, CommitSlot::empty());
    Ok(slots)
}

/// Pack a record's language usages into canonical language slots.
pub fn pack_languages(record: &RepositoryRecord) -> Result<Vec<LanguageSlot>, PipelineError> {
    let slots: Vec<LanguageSlot> = record
        .languages
        .usages
        .iter()
        .map(|u| LanguageSlot {
            fingerprint: u.fingerprint,
            lines: u.lines,
            proficiency: u.proficiency,
            active: true,
        })
        .collect();
    Ok(LanguageCredentialCircuit::<MAX_LANGUAGES>::canonical_slots(slots)?)
}

/// Pack a record's collaborators into collaborator slots.
pub fn pack_collaborators(
    record: &RepositoryRecord,
) -> Result<Vec<CollaboratorSlot>, PipelineError> {
    let slots: Vec<CollaboratorSlot> = record
        .collaborators
        .iter()
        .map(|c| {
            let identity = zk_credentials::types::FrHex {
                hex: c.identity_hex.clone(),
            }
            .to_fr()
            .map_err(|e| PipelineError::Analysis(format!("bad collaborator hash: {e}")))?;
            Ok(CollaboratorSlot {
                identity,
                contribution_pct: c.contribution_pct,
                active: true,
            })
        })
        .collect::<Result<_, PipelineError>>()?;
    Ok(CollaborationCredentialCircuit::<MAX_COLLABORATORS>::pad_collaborators(slots)?)
}

/// Claim configuration for one repository credential.
#[derive(Clone, Copy, Debug)]
pub struct RepositoryClaims {
    /// Privacy bucket for the commit-count range.
    pub commit_bucket: u64,
    /// Privacy bucket for the lines-of-code range.
    pub loc_bucket: u64,
    /// Minimum attributed lines per claimed language.
    pub usage_threshold: u64,
}

impl Default for RepositoryClaims {
    fn default() -> Self {
        Self {
            commit_bucket: 100,
            loc_bucket: 5_000,
            usage_threshold: 50,
        }
    }
}

/// Build a fully-validated repository credential circuit.
pub fn build_repository_circuit(
    raw: &RawRepository,
    record: &RepositoryRecord,
    secret_key: Fr,
    salt: &str,
    claims: &RepositoryClaims,
    timestamp: u64,
) -> Result<DefaultRepositoryCircuit, PipelineError> {
    let cfg = poseidon_config();

    let commits = pack_commits(raw, salt)?;
    let languages = pack_languages(record)?;
    let collaborators = pack_collaborators(record)?;

    let repo_hash = zk_credentials::types::FrHex {
        hex: record.repo_hash_hex.clone(),
    }
    .to_fr()
    .map_err(PipelineError::Analysis)?;

    // An owned repository cannot carry a non-ownership claim: bind the
    // owner hash to the prover's own address so witness construction
    // fails fast instead of wasting proving time.
    let owner_hash = if raw.is_owner {
        let address = derive_address(&cfg, secret_key);
        hash_elems(&cfg, DOMAIN_ADDRESS, &[address])
    } else {
        zk_credentials::types::FrHex {
            hex: record.owner_hash_hex.clone(),
        }
        .to_fr()
        .map_err(PipelineError::Analysis)?
    };

    let circuit = DefaultRepositoryCircuit::new(
        &cfg,
        commits,
        languages,
        collaborators,
        record.collaboration.contribution_pct,
        secret_key,
        repo_hash,
        owner_hash,
        privacy_range(record.commit_count, claims.commit_bucket),
        privacy_range(record.lines_changed, claims.loc_bucket),
        claims.usage_threshold,
        privacy_range(record.collaboration.collaborator_count, 10),
        timestamp,
        MERKLE_DEPTH,
    )?;
    Ok(circuit)
}

/// Pack a portfolio into aggregator repository slots.
pub fn pack_portfolio(records: &[RepositoryRecord]) -> Result<Vec<RepositorySlot>, PipelineError> {
    let slots: Vec<RepositorySlot> = records
        .iter()
        .map(|r| {
            let repo_hash = zk_credentials::types::FrHex {
                hex: r.repo_hash_hex.clone(),
            }
            .to_fr()
            .map_err(PipelineError::Analysis)?;
            Ok(RepositorySlot {
                repo_hash,
                commits: r.commit_count,
                lines_changed: r.lines_changed,
                collaborator_count: r.collaboration.collaborator_count,
                is_owner: r.is_owner,
                span_days: r.span_days().max(1),
                active: true,
            })
        })
        .collect::<Result<_, PipelineError>>()?;
    Ok(DefaultAggregatorCircuit::pad_slots(slots)?)
}

/// Build the portfolio aggregation circuit.
pub fn build_aggregator_circuit(
    records: &[RepositoryRecord],
    user_address: Fr,
    min_commits: u64,
    timestamp: u64,
) -> Result<DefaultAggregatorCircuit, PipelineError> {
    let cfg = poseidon_config();
    let slots = pack_portfolio(records)?;

    let total_commits: u64 = records
        .iter()
        .filter(|r| r.commit_count >= min_commits)
        .map(|r| r.commit_count)
        .sum();
    let total_loc: u64 = records
        .iter()
        .filter(|r| r.commit_count >= min_commits)
        .map(|r| r.lines_changed)
        .sum();

    let circuit = DefaultAggregatorCircuit::new(
        &cfg,
        slots,
        user_address,
        min_commits,
        privacy_range(total_commits, 500),
        privacy_range(total_loc, 20_000),
        K_ANONYMITY_FLOOR,
        timestamp,
    )?;
    Ok(circuit)
}

/// Build the statistics aggregation circuit over per-repository LOC totals.
pub fn build_stats_circuit(
    records: &[RepositoryRecord],
    user_address: Fr,
    epsilon_milli: u64,
    timestamp: u64,
) -> Result<DefaultStatsCircuit, PipelineError> {
    let cfg = poseidon_config();

    if records.len() > MAX_STAT_VALUES {
        return Err(CircuitError::CapacityExceeded {
            capacity: MAX_STAT_VALUES,
            got: records.len(),
        }
        .into());
    }
    let values = DefaultStatsCircuit::pad_values(
        records
            .iter()
            .map(|r| zk_credentials::aggregation::statistics::StatValue {
                value: r.lines_changed,
                weight: 1,
                active: true,
            })
            .collect(),
    )?;

    let max_loc = records.iter().map(|r| r.lines_changed).max().unwrap_or(0);
    let domain = (0, max_loc.max(1) * 2);

    // Outlier threshold: three standard-deviation-equivalents over the
    // scaled deviations, estimated from the spread of the input domain.
    let threshold_scaled = domain.1 * 100 / 4 * 3;

    // Sensitivity of the LOC sum: removing one repository moves it by at
    // most the largest repository in the portfolio.
    let circuit = DefaultStatsCircuit::new(
        &cfg,
        values,
        user_address,
        domain,
        threshold_scaled,
        epsilon_milli,
        max_loc.max(1),
        timestamp,
    )?;
    Ok(circuit)
}

/// Capacity guard for the whole portfolio.
pub fn validate_portfolio_size(records: usize) -> Result<(), PipelineError> {
    if records > MAX_REPOSITORIES {
        return Err(CircuitError::CapacityExceeded {
            capacity: MAX_REPOSITORIES,
            got: records,
        }
        .into());
    }
    Ok(())
}
