//! Data model: raw collector records, analyzer reports, and API DTOs.
//!
//! Raw records arrive from the external GitHub-data collector and are never
//! mutated; analyzers own the derived records they produce, and the privacy
//! pipeline only ever produces new, noised copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use zk_credentials::types::{CircuitId, ProofArtifact};

// --- Raw collector records -------------------------------------------------

/// Per-file change inside one commit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawFileChange {
    pub path: String,
    pub additions: u64,
    pub deletions: u64,
}

/// One commit as collected upstream. Owned by its repository; never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    pub author: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub message: String,
    pub files: Vec<RawFileChange>,
}

impl RawCommit {
    pub fn lines_changed(&self) -> u64 {
        self.files.iter().map(|f| f.additions + f.deletions).sum()
    }

    pub fn additions(&self) -> u64 {
        self.files.iter().map(|f| f.additions).sum()
    }

    pub fn deletions(&self) -> u64 {
        self.files.iter().map(|f| f.deletions).sum()
    }
}

/// One collaborator as collected upstream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawCollaborator {
    pub login: String,
    pub commits: u64,
}

/// One repository as collected upstream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawRepository {
    pub full_name: String,
    pub owner_login: String,
    pub is_owner: bool,
    pub commits: Vec<RawCommit>,
    pub collaborators: Vec<RawCollaborator>,
}

// --- Analyzer reports ------------------------------------------------------

/// Per-language usage metrics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LanguageUsageMetric {
    pub language: String,
    /// Truncated fingerprint; nonzero, 64-bit.
    pub fingerprint: u64,
    pub lines: u64,
    pub commit_count: u64,
    pub file_count: u64,
    /// 0–100.
    pub proficiency: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LanguageReport {
    /// Sorted by lines, descending.
    pub usages: Vec<LanguageUsageMetric>,
    /// Shannon diversity index over line shares, milli fixed-point.
    pub shannon_diversity_milli: u64,
}

/// Leadership signals detected from commit messages and file paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadershipSignal {
    Architecture,
    Mentorship,
    Process,
    Documentation,
    Review,
    ProjectManagement,
    Innovation,
    TeamBuilding,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStyle {
    Centralized,
    Distributed,
    Consensus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollaborationReport {
    pub collaborator_count: u64,
    /// The analyzed user's own share of commits, percent 0–100.
    pub contribution_pct: u64,
    /// Gini coefficient over collaborator commit counts, milli fixed-point.
    pub gini_milli: u64,
    /// Team diversity score 0–100 (inverse concentration).
    pub team_diversity: u64,
    /// Signal -> number of matching commits.
    pub indicators: BTreeMap<LeadershipSignal, u64>,
    pub decision_style: DecisionStyle,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemporalReport {
    /// 0–100, from the coefficient of variation of commit intervals.
    pub consistency_score: u64,
    pub longest_streak_days: u64,
    pub active_days: u64,
    /// 0–100 weighted burnout risk.
    pub burnout_risk: u64,
    /// Seasonality index, milli fixed-point.
    pub seasonality_milli: u64,
    /// Whole activity span in days.
    pub span_days: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiversityReport {
    pub domains: Vec<String>,
    pub frameworks: Vec<String>,
    pub project_types: Vec<String>,
    /// 0–100.
    pub breadth: u64,
    /// 0–100.
    pub depth: u64,
    /// 0–100, includes cross-domain combination bonuses.
    pub innovation: u64,
}

/// Per-collaborator derived record with an anonymized identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollaboratorMetric {
    /// Hex field element, salted hash of the login.
    pub identity_hex: String,
    pub contribution_pct: u64,
    /// Derived collaboration/leadership score 0–100.
    pub score: u64,
}

/// The per-repository record every downstream stage consumes.
///
/// Immutable once extracted; produced once per analysis run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Salted repository identity hash, hex field element.
    pub repo_hash_hex: String,
    /// Salted owner identity hash, hex field element.
    pub owner_hash_hex: String,
    pub is_owner: bool,
    pub commit_count: u64,
    pub lines_changed: u64,
    pub first_activity: i64,
    pub last_activity: i64,
    pub languages: LanguageReport,
    pub collaborators: Vec<CollaboratorMetric>,
    pub collaboration: CollaborationReport,
    pub temporal: TemporalReport,
    pub diversity: DiversityReport,
}

impl RepositoryRecord {
    pub fn span_days(&self) -> u64 {
        ((self.last_activity - self.first_activity).max(0) as u64) / 86_400
    }
}

// --- API DTOs ---------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Analyzing,
    Proving,
    Ready,
    Failed,
}

/// How aggressively the privacy pipeline transforms analyzer output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyLevel {
    /// Noise + k-anonymity generalization.
    Standard,
    /// Standard plus value blinding before circuit input.
    Maximum,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialRequest {
    /// Stable identity the credentials are issued for.
    pub user: String,
    /// Secret key opening the user's address, hex field element.
    pub secret_key_hex: String,
    pub privacy_level: PrivacyLevel,
    /// Which credential circuits to run.
    pub circuits: Vec<CircuitId>,
    /// Raw collector output, one entry per repository.
    pub repositories: Vec<RawRepository>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialRequestResponse {
    pub request_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialStatusResponse {
    pub request_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: RequestStatus,
    pub artifacts: Vec<ProofArtifact>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub vk_b64: String,
    pub artifact: ProofArtifact,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BudgetResponse {
    pub user: String,
    pub total_milli: u64,
    pub consumed_milli: u64,
    pub remaining_milli: u64,
    /// Consumed epsilon per operation category.
    pub by_category: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ZkVkResponse {
    pub curve: String,
    pub proof_system: String,
    pub circuit_id: CircuitId,
    pub vk_b64: String,
}
