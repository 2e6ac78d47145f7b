//! Types shared between the circuits and the host-side prover/verifier.

use crate::constants::FINGERPRINT_BITS;
use ark_bn254::Fr;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};

/// A public claim range with the private actual value it covers.
///
/// Invariant: `lo <= actual <= hi` must hold for every satisfiable circuit.
/// The range is public; the actual value never leaves the witness.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ClaimRange {
    pub lo: u64,
    pub hi: u64,
}

impl ClaimRange {
    pub fn contains(&self, v: u64) -> bool {
        self.lo <= v && v <= self.hi
    }
}

/// One commit leaf of the repository Merkle tree.
///
/// The leaf hash binds the commit identity to its line deltas, so the
/// circuit's lines-of-code sum cannot drift from the committed history.
#[derive(Clone, Debug)]
pub struct CommitSlot {
    /// Field encoding of the commit identity (salted hash of the sha).
    pub commit_id: Fr,
    pub additions: u64,
    pub deletions: u64,
    pub active: bool,
}

impl CommitSlot {
    pub fn empty() -> Self {
        Self {
            commit_id: Fr::from(0u64),
            additions: 0,
            deletions: 0,
            active: false,
        }
    }
}

/// One language slot of the fixed-capacity circuit input.
///
/// Unused slots carry the zero fingerprint sentinel; zero is never a valid
/// fingerprint (the fingerprint derivation excludes it).
#[derive(Clone, Copy, Debug)]
pub struct LanguageSlot {
    /// Truncated language hash, < 2^[`FINGERPRINT_BITS`], nonzero when active.
    pub fingerprint: u64,
    pub lines: u64,
    /// Proficiency score 0–100.
    pub proficiency: u64,
    pub active: bool,
}

impl LanguageSlot {
    pub fn empty() -> Self {
        Self {
            fingerprint: 0,
            lines: 0,
            proficiency: 0,
            active: false,
        }
    }
}

/// One collaborator slot: anonymized identity plus derived shares.
#[derive(Clone, Debug)]
pub struct CollaboratorSlot {
    /// Anonymized identity hash (full field element).
    pub identity: Fr,
    /// Contribution percentage 0–100.
    pub contribution_pct: u64,
    pub active: bool,
}

impl CollaboratorSlot {
    pub fn empty() -> Self {
        Self {
            identity: Fr::from(0u64),
            contribution_pct: 0,
            active: false,
        }
    }
}

/// Per-repository summary consumed by the portfolio aggregator circuit.
#[derive(Clone, Debug)]
pub struct RepositorySlot {
    /// Salted repository identity hash.
    pub repo_hash: Fr,
    pub commits: u64,
    pub lines_changed: u64,
    pub collaborator_count: u64,
    pub is_owner: bool,
    /// Activity span in days.
    pub span_days: u64,
    pub active: bool,
}

impl RepositorySlot {
    pub fn empty() -> Self {
        Self {
            repo_hash: Fr::from(0u64),
            commits: 0,
            lines_changed: 0,
            collaborator_count: 0,
            is_owner: false,
            span_days: 0,
            active: false,
        }
    }
}

/// Identifies which circuit produced a proof. Verifier registries key on
/// this, which is also the extension point for aggregating proofs from other
/// proving schemes later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitId {
    RepositoryCredential,
    LanguageCredential,
    CollaborationCredential,
    LeadershipCredential,
    DiversityCredential,
    RepositoryAggregate,
    StatsAggregate,
}

impl CircuitId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitId::RepositoryCredential => "repository_credential_v1",
            CircuitId::LanguageCredential => "language_credential_v1",
            CircuitId::CollaborationCredential => "collaboration_credential_v1",
            CircuitId::LeadershipCredential => "leadership_credential_v1",
            CircuitId::DiversityCredential => "diversity_credential_v1",
            CircuitId::RepositoryAggregate => "repository_aggregate_v1",
            CircuitId::StatsAggregate => "stats_aggregate_v1",
        }
    }
}

/// JSON-friendly representation of a field element.
///
/// Fr values travel as hex of the canonical compressed encoding so every
/// component agrees on the byte layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrHex {
    pub hex: String,
}

impl FrHex {
    pub fn from_fr(x: &Fr) -> Self {
        let mut bytes = Vec::new();
        x.serialize_compressed(&mut bytes)
            .expect("in-memory serialization");
        Self {
            hex: hex::encode(bytes),
        }
    }

    pub fn to_fr(&self) -> Result<Fr, String> {
        let bytes = hex::decode(&self.hex).map_err(|e| format!("invalid hex: {e}"))?;
        Fr::deserialize_compressed(&bytes[..]).map_err(|e| format!("invalid field bytes: {e}"))
    }
}

/// The proof artifact handed to external verifiers and storage.
///
/// Shape is a contract: `{circuit_id, public_signals, proof, credential_hash}`.
/// The credential hash is a Poseidon commitment over (user, claim values,
/// timestamp) and doubles as an anti-replay/uniqueness key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub circuit_id: CircuitId,
    /// Ordered public-signal vector; ordering MUST match the circuit's
    /// `new_input` allocation order.
    pub public_signals: Vec<FrHex>,
    /// Compressed Groth16 proof bytes, base64.
    pub proof_b64: String,
    pub credential_hash: FrHex,
}

/// Reject fingerprints outside the declared domain.
///
/// A valid fingerprint is nonzero and fits in [`FINGERPRINT_BITS`].
pub fn valid_fingerprint(f: u64) -> bool {
    f != 0 && (FINGERPRINT_BITS >= 64 || f < (1u64 << FINGERPRINT_BITS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_range_bounds_are_inclusive() {
        let r = ClaimRange { lo: 100, hi: 200 };
        assert!(r.contains(100));
        assert!(r.contains(200));
        assert!(!r.contains(99));
        assert!(!r.contains(201));
    }

    #[test]
    fn fr_hex_round_trip() {
        let x = Fr::from(123456789u64);
        let h = FrHex::from_fr(&x);
        assert_eq!(h.to_fr().unwrap(), x);
    }

    #[test]
    fn zero_is_not_a_fingerprint() {
        assert!(!valid_fingerprint(0));
        assert!(valid_fingerprint(1));
    }
}
