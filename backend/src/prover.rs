//! Credential issuance orchestration.
//!
//! Background job per request: analyze every repository, run the privacy
//! pipeline, then prove. Per-repository proofs are independent and run on
//! blocking worker threads in parallel; the portfolio aggregation proofs
//! run only after every per-repository computation has joined. Every proof
//! is verified before it is stored (fail closed).

use crate::analyzers::repository::analyze_repository;
use crate::db;
use crate::errors::{ApiError, PipelineError};
use crate::models::{
    CredentialRequest, LeadershipSignal, RepositoryRecord, RequestStatus,
};
use crate::packer;
use crate::privacy::budget::BudgetCategory;
use crate::privacy::{self, PrivacyConfig};
use crate::state::{AppState, ZkKeys};
use ark_bn254::Fr;
use chrono::Utc;
use rand::rngs::OsRng;
use tracing::info;
use uuid::Uuid;
use zk_credentials::constants::{
    poseidon_config, NUM_DIVERSITY_DIMENSIONS, NUM_LEADERSHIP_DIMENSIONS,
    NUM_MATURITY_INDICATORS,
};
use zk_credentials::credentials::diversity::{DiversityCredentialCircuit, DiversityDimension};
use zk_credentials::credentials::leadership::{
    LeadershipCredentialCircuit, LeadershipDimension,
};
use zk_credentials::gadgets::signature::derive_address;
use zk_credentials::groth16::{make_artifact, prove, verify};
use zk_credentials::types::{CircuitId, FrHex, ProofArtifact};

/// Epsilon charged for the differentially-private statistics disclosure.
const STATS_EPSILON_MILLI: u64 = 1_000;

/// Activity threshold for the portfolio aggregator.
const AGGREGATE_MIN_COMMITS: u64 = 5;

/// Fixed points credited per detected leadership activity (0–10 scale).
const POINTS_PER_ACTIVITY: u64 = 7;

/// A contribution share at or above this marks a repository as "led".
const LED_CONTRIBUTION_PCT: u64 = 40;

/// Entry point spawned by the API; failures land in the request row.
pub async fn issue_credentials(state: AppState, request_id: Uuid, request: CredentialRequest) {
    let res = issue_credentials_inner(state.clone(), request_id, request).await;
    if let Err(e) = res {
        let _ = db::set_request_failed(&state.db, request_id, &format!("{e}")).await;
    }
}

async fn issue_credentials_inner(
    state: AppState,
    request_id: Uuid,
    request: CredentialRequest,
) -> Result<(), ApiError> {
    let cfg = poseidon_config();

    packer::validate_portfolio_size(request.repositories.len()).map_err(ApiError::from)?;

    let secret_key = FrHex {
        hex: request.secret_key_hex.clone(),
    }
    .to_fr()
    .map_err(|e| ApiError::BadRequest(format!("invalid secret key: {e}")))?;
    let user_address = derive_address(&cfg, secret_key);
    let timestamp = Utc::now().timestamp() as u64;

    info!(%request_id, user = %request.user, repos = request.repositories.len(), "starting analysis");

    // --- Analyzer stage: pure and per-repository ---
    let mut records = Vec::with_capacity(request.repositories.len());
    for repo in &request.repositories {
        let record = analyze_repository(repo, &request.user, &state.salt)
            .map_err(ApiError::from)?;
        records.push(record);
    }

    // --- Privacy stage: budget-gated noised copies ---
    let privatized = privacy::privatize_portfolio(
        &state.ledger,
        &request.user,
        &records,
        &PrivacyConfig::default(),
        request.privacy_level,
        &mut OsRng,
    )
    .map_err(ApiError::from)?;
    db::save_budget(&state.db, &request.user, &state.ledger.snapshot(&request.user)).await?;

    db::set_request_status(&state.db, request_id, RequestStatus::Proving).await?;

    let mut artifacts: Vec<ProofArtifact> = Vec::new();

    // --- Per-repository proofs: embarrassingly parallel ---
    if request.circuits.contains(&CircuitId::RepositoryCredential) {
        let keys = state.keys.ensure(CircuitId::RepositoryCredential).await?;

        let mut handles = Vec::new();
        for (raw, record) in request.repositories.iter().zip(&privatized) {
            let raw = raw.clone();
            let record = record.clone();
            let salt = state.salt.clone();
            let keys = keys.clone();

            handles.push(tokio::task::spawn_blocking(move || {
                prove_repository(&raw, &record, secret_key, &salt, timestamp, &keys)
            }));
        }
        for handle in handles {
            let artifact = handle.await.map_err(|_| ApiError::Internal)??;
            artifacts.push(artifact);
        }
        info!(%request_id, count = artifacts.len(), "repository proofs done");
    }

    // Standalone per-repository sub-credentials, same parallel shape.
    if request.circuits.contains(&CircuitId::LanguageCredential) {
        let keys = state.keys.ensure(CircuitId::LanguageCredential).await?;
        let mut handles = Vec::new();
        for record in &privatized {
            let record = record.clone();
            let keys = keys.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                prove_language(&record, user_address, timestamp, &keys)
            }));
        }
        for handle in handles {
            artifacts.push(handle.await.map_err(|_| ApiError::Internal)??);
        }
    }

    if request.circuits.contains(&CircuitId::CollaborationCredential) {
        let keys = state.keys.ensure(CircuitId::CollaborationCredential).await?;
        let mut handles = Vec::new();
        for record in &privatized {
            let record = record.clone();
            let keys = keys.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                prove_collaboration(&record, user_address, timestamp, &keys)
            }));
        }
        for handle in handles {
            artifacts.push(handle.await.map_err(|_| ApiError::Internal)??);
        }
    }

    // --- Portfolio proofs: strictly after the per-repository join ---
    if request.circuits.contains(&CircuitId::RepositoryAggregate) {
        let keys = state.keys.ensure(CircuitId::RepositoryAggregate).await?;
        let records = privatized.clone();
        let artifact = tokio::task::spawn_blocking(move || {
            let circuit = packer::build_aggregator_circuit(
                &records,
                user_address,
                AGGREGATE_MIN_COMMITS,
                timestamp,
            )
            .map_err(ApiError::from)?;
            let public_inputs = circuit.public_inputs();
            let credential_hash = circuit.credential_hash;
            let proof = prove(circuit, keys.pk.as_ref(), &mut OsRng)
                .map_err(|_| ApiError::Internal)?;
            verify(keys.vk.as_ref(), &proof, &public_inputs).map_err(|_| ApiError::Internal)?;
            make_artifact(
                CircuitId::RepositoryAggregate,
                &public_inputs,
                &proof,
                credential_hash,
            )
            .map_err(|_| ApiError::Internal)
        })
        .await
        .map_err(|_| ApiError::Internal)??;
        artifacts.push(artifact);
    }

    if request.circuits.contains(&CircuitId::StatsAggregate) {
        // The statistics disclosure spends its own epsilon.
        state
            .ledger
            .reserve(&request.user, BudgetCategory::Statistics, STATS_EPSILON_MILLI)
            .map_err(ApiError::from)?;
        db::save_budget(&state.db, &request.user, &state.ledger.snapshot(&request.user)).await?;

        let keys = state.keys.ensure(CircuitId::StatsAggregate).await?;
        let records = privatized.clone();
        let artifact = tokio::task::spawn_blocking(move || {
            let circuit = packer::build_stats_circuit(
                &records,
                user_address,
                STATS_EPSILON_MILLI,
                timestamp,
            )
            .map_err(ApiError::from)?;
            let public_inputs = circuit.public_inputs();
            let credential_hash = circuit.credential_hash;
            let proof = prove(circuit, keys.pk.as_ref(), &mut OsRng)
                .map_err(|_| ApiError::Internal)?;
            verify(keys.vk.as_ref(), &proof, &public_inputs).map_err(|_| ApiError::Internal)?;
            make_artifact(
                CircuitId::StatsAggregate,
                &public_inputs,
                &proof,
                credential_hash,
            )
            .map_err(|_| ApiError::Internal)
        })
        .await
        .map_err(|_| ApiError::Internal)??;
        artifacts.push(artifact);
    }

    if request.circuits.contains(&CircuitId::LeadershipCredential) {
        let keys = state.keys.ensure(CircuitId::LeadershipCredential).await?;
        let records = privatized.clone();
        let artifact = tokio::task::spawn_blocking(move || {
            prove_leadership(&records, user_address, timestamp, &keys)
        })
        .await
        .map_err(|_| ApiError::Internal)??;
        artifacts.push(artifact);
    }

    if request.circuits.contains(&CircuitId::DiversityCredential) {
        let keys = state.keys.ensure(CircuitId::DiversityCredential).await?;
        let records = privatized.clone();
        let artifact = tokio::task::spawn_blocking(move || {
            prove_diversity(&records, user_address, timestamp, &keys)
        })
        .await
        .map_err(|_| ApiError::Internal)??;
        artifacts.push(artifact);
    }

    for artifact in &artifacts {
        db::insert_artifact(&state.db, request_id, &request.user, artifact).await?;
    }
    db::set_request_status(&state.db, request_id, RequestStatus::Ready).await?;

    info!(%request_id, artifacts = artifacts.len(), "request ready");
    Ok(())
}

fn prove_repository(
    raw: &crate::models::RawRepository,
    record: &RepositoryRecord,
    secret_key: Fr,
    salt: &str,
    timestamp: u64,
    keys: &ZkKeys,
) -> Result<ProofArtifact, ApiError> {
    let circuit = packer::build_repository_circuit(
        raw,
        record,
        secret_key,
        salt,
        &packer::RepositoryClaims::default(),
        timestamp,
    )
    .map_err(ApiError::from)?;

    let public_inputs = circuit.public_inputs();
    let credential_hash = circuit.credential_hash;
    let proof = prove(circuit, keys.pk.as_ref(), &mut OsRng).map_err(|_| ApiError::Internal)?;

    // Fail closed if the proof doesn't verify.
    verify(keys.vk.as_ref(), &proof, &public_inputs).map_err(|_| ApiError::Internal)?;

    make_artifact(
        CircuitId::RepositoryCredential,
        &public_inputs,
        &proof,
        credential_hash,
    )
    .map_err(|_| ApiError::Internal)
}

fn prove_language(
    record: &RepositoryRecord,
    user_address: Fr,
    timestamp: u64,
    keys: &ZkKeys,
) -> Result<ProofArtifact, ApiError> {
    let cfg = poseidon_config();
    let slots = packer::pack_languages(record).map_err(ApiError::from)?;
    let claims = packer::RepositoryClaims::default();

    let circuit = zk_credentials::groth16::DefaultLanguageCircuit::new(
        &cfg,
        slots,
        user_address,
        claims.usage_threshold,
        timestamp,
    )
    .map_err(|e| ApiError::from(PipelineError::Circuit(e)))?;

    let public_inputs = circuit.public_inputs();
    let credential_hash = circuit.credential_hash;
    let proof = prove(circuit, keys.pk.as_ref(), &mut OsRng).map_err(|_| ApiError::Internal)?;
    verify(keys.vk.as_ref(), &proof, &public_inputs).map_err(|_| ApiError::Internal)?;

    make_artifact(
        CircuitId::LanguageCredential,
        &public_inputs,
        &proof,
        credential_hash,
    )
    .map_err(|_| ApiError::Internal)
}

fn prove_collaboration(
    record: &RepositoryRecord,
    user_address: Fr,
    timestamp: u64,
    keys: &ZkKeys,
) -> Result<ProofArtifact, ApiError> {
    let cfg = poseidon_config();
    let slots = packer::pack_collaborators(record).map_err(ApiError::from)?;

    let circuit = zk_credentials::groth16::DefaultCollaborationCircuit::new(
        &cfg,
        slots,
        record.collaboration.contribution_pct,
        user_address,
        packer::privacy_range(record.collaboration.collaborator_count, 10),
        timestamp,
    )
    .map_err(|e| ApiError::from(PipelineError::Circuit(e)))?;

    let public_inputs = circuit.public_inputs();
    let credential_hash = circuit.credential_hash;
    let proof = prove(circuit, keys.pk.as_ref(), &mut OsRng).map_err(|_| ApiError::Internal)?;
    verify(keys.vk.as_ref(), &proof, &public_inputs).map_err(|_| ApiError::Internal)?;

    make_artifact(
        CircuitId::CollaborationCredential,
        &public_inputs,
        &proof,
        credential_hash,
    )
    .map_err(|_| ApiError::Internal)
}

/// Map portfolio records onto the seven leadership dimensions.
pub fn leadership_dimensions(
    records: &[RepositoryRecord],
) -> [LeadershipDimension; NUM_LEADERSHIP_DIMENSIONS] {
    let signal_total = |signal: LeadershipSignal| -> u64 {
        records
            .iter()
            .map(|r| r.collaboration.indicators.get(&signal).copied().unwrap_or(0))
            .sum()
    };
    let dim = |activities: u64| LeadershipDimension {
        activities,
        points: (activities * POINTS_PER_ACTIVITY).min(activities * 10),
    };

    let led = records
        .iter()
        .filter(|r| r.collaboration.contribution_pct >= LED_CONTRIBUTION_PCT)
        .count() as u64;

    [
        dim(signal_total(LeadershipSignal::Mentorship)),
        dim(signal_total(LeadershipSignal::Architecture)),
        dim(signal_total(LeadershipSignal::Review)),
        dim(led),
        dim(signal_total(LeadershipSignal::TeamBuilding)
            + signal_total(LeadershipSignal::Process)),
        dim(signal_total(LeadershipSignal::Innovation)),
        dim(signal_total(LeadershipSignal::Documentation)
            + signal_total(LeadershipSignal::ProjectManagement)),
    ]
}

/// Whole-portfolio tenure in years.
pub fn tenure_years(records: &[RepositoryRecord]) -> u64 {
    let first = records.iter().map(|r| r.first_activity).min().unwrap_or(0);
    let last = records.iter().map(|r| r.last_activity).max().unwrap_or(0);
    ((last - first).max(0) as u64) / (365 * 86_400)
}

fn prove_leadership(
    records: &[RepositoryRecord],
    user_address: Fr,
    timestamp: u64,
    keys: &ZkKeys,
) -> Result<ProofArtifact, ApiError> {
    let cfg = poseidon_config();
    let dimensions = leadership_dimensions(records);
    let tenure = tenure_years(records);

    let maturity: [bool; NUM_MATURITY_INDICATORS] = [
        dimensions[0].activities > 0, // mentors others
        dimensions[1].activities > 0, // shapes architecture
        tenure >= 5,
        records.len() >= 3,
        dimensions[5].activities > 0, // innovates
    ];

    let circuit = LeadershipCredentialCircuit::new(
        &cfg, dimensions, tenure, maturity, user_address, 0, 0, 0, timestamp,
    )
    .map_err(|e| ApiError::from(PipelineError::Circuit(e)))?;

    let public_inputs = circuit.public_inputs();
    let credential_hash = circuit.credential_hash;
    let proof = prove(circuit, keys.pk.as_ref(), &mut OsRng).map_err(|_| ApiError::Internal)?;
    verify(keys.vk.as_ref(), &proof, &public_inputs).map_err(|_| ApiError::Internal)?;

    make_artifact(
        CircuitId::LeadershipCredential,
        &public_inputs,
        &proof,
        credential_hash,
    )
    .map_err(|_| ApiError::Internal)
}

/// Map portfolio records onto the seven diversity dimensions.
pub fn diversity_dimensions(
    records: &[RepositoryRecord],
) -> [DiversityDimension; NUM_DIVERSITY_DIMENSIONS] {
    use std::collections::BTreeSet;

    let languages: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.languages.usages.iter().map(|u| u.language.as_str()))
        .collect();
    let avg_proficiency = {
        let all: Vec<u64> = records
            .iter()
            .flat_map(|r| r.languages.usages.iter().map(|u| u.proficiency))
            .collect();
        if all.is_empty() {
            0
        } else {
            all.iter().sum::<u64>() / all.len() as u64
        }
    };

    let frameworks: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.diversity.frameworks.iter().map(|f| f.as_str()))
        .collect();
    let project_types: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.diversity.project_types.iter().map(|p| p.as_str()))
        .collect();
    let domains: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.diversity.domains.iter().map(|d| d.as_str()))
        .collect();
    let contribution_types: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.collaboration.indicators.keys())
        .map(|s| match s {
            LeadershipSignal::Architecture => "architecture",
            LeadershipSignal::Mentorship => "mentorship",
            LeadershipSignal::Process => "process",
            LeadershipSignal::Documentation => "documentation",
            LeadershipSignal::Review => "review",
            LeadershipSignal::ProjectManagement => "project_management",
            LeadershipSignal::Innovation => "innovation",
            LeadershipSignal::TeamBuilding => "team_building",
        })
        .collect();
    // Architectural patterns piggyback on the architecture-heavy repos.
    let patterns = records
        .iter()
        .filter(|r| {
            r.collaboration
                .indicators
                .contains_key(&LeadershipSignal::Architecture)
        })
        .count() as u64;
    // Team-size variety: distinct collaborator-count buckets of 5.
    let team_sizes: BTreeSet<u64> = records
        .iter()
        .map(|r| r.collaboration.collaborator_count / 5)
        .collect();

    let dim = |categories: u64, score: u64| DiversityDimension {
        categories,
        score_sum: categories * score.min(100),
    };

    [
        dim(languages.len() as u64, avg_proficiency),
        dim(frameworks.len() as u64, 60),
        dim(project_types.len() as u64, 60),
        dim(domains.len() as u64, 60),
        dim(contribution_types.len() as u64, 50),
        dim(patterns, 50),
        dim(team_sizes.len() as u64, 40),
    ]
}

fn prove_diversity(
    records: &[RepositoryRecord],
    user_address: Fr,
    timestamp: u64,
    keys: &ZkKeys,
) -> Result<ProofArtifact, ApiError> {
    let cfg = poseidon_config();
    let dimensions = diversity_dimensions(records);

    let circuit =
        DiversityCredentialCircuit::new(&cfg, dimensions, user_address, 0, 0, 0, timestamp)
            .map_err(|e| ApiError::from(PipelineError::Circuit(e)))?;

    let public_inputs = circuit.public_inputs();
    let credential_hash = circuit.credential_hash;
    let proof = prove(circuit, keys.pk.as_ref(), &mut OsRng).map_err(|_| ApiError::Internal)?;
    verify(keys.vk.as_ref(), &proof, &public_inputs).map_err(|_| ApiError::Internal)?;

    make_artifact(
        CircuitId::DiversityCredential,
        &public_inputs,
        &proof,
        credential_hash,
    )
    .map_err(|_| ApiError::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::repository::analyze_repository;
    use crate::models::{RawCollaborator, RawCommit, RawFileChange, RawRepository};

    fn record_with_signals() -> RepositoryRecord {
        let repo = RawRepository {
            full_name: "org/widget".to_string(),
            owner_login: "org".to_string(),
            is_owner: false,
            commits: vec![
                commit("refactor storage architecture"),
                commit("mentor onboarding walkthrough"),
                commit("address review feedback"),
                commit("prototype novel cache spike"),
            ],
            collaborators: vec![
                RawCollaborator { login: "alice".to_string(), commits: 2 },
                RawCollaborator { login: "bob".to_string(), commits: 2 },
            ],
        };
        analyze_repository(&repo, "dev", "salt").unwrap()
    }

    fn commit(message: &str) -> RawCommit {
        RawCommit {
            sha: format!("sha-{message}"),
            author: "dev".to_string(),
            timestamp: 1_700_000_000,
            message: message.to_string(),
            files: vec![RawFileChange {
                path: "src/lib.rs".to_string(),
                additions: 10,
                deletions: 2,
            }],
        }
    }

    #[test]
    fn leadership_dimensions_map_signals() {
        let records = vec![record_with_signals()];
        let dims = leadership_dimensions(&records);
        assert_eq!(dims[0].activities, 1); // mentorship
        assert_eq!(dims[1].activities, 1); // architecture
        assert_eq!(dims[2].activities, 1); // review
        assert_eq!(dims[5].activities, 1); // innovation
        // dev authored 4 of 8 commits: led at the 40% threshold.
        assert_eq!(dims[3].activities, 1);
        // Points respect the 10-per-activity circuit cap.
        for d in dims {
            assert!(d.points <= 10 * d.activities);
        }
    }

    #[test]
    fn diversity_dimensions_respect_score_caps() {
        let records = vec![record_with_signals()];
        for d in diversity_dimensions(&records) {
            assert!(d.score_sum <= 100 * d.categories);
        }
    }

    #[test]
    fn tenure_spans_the_whole_portfolio() {
        let mut a = record_with_signals();
        let mut b = record_with_signals();
        a.first_activity = 0;
        a.last_activity = 6 * 365 * 86_400;
        b.first_activity = 2 * 365 * 86_400;
        b.last_activity = 3 * 365 * 86_400;
        assert_eq!(tenure_years(&[a, b]), 6);
    }
}
