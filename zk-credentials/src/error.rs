//! Error taxonomy for witness construction and proof orchestration.
//!
//! Everything here fires *before* proof construction. A violation inside a
//! circuit is not an error in this sense: it makes the constraint system
//! unsatisfiable, proving fails, and verifiers only ever see accept/reject.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CircuitError {
    /// An actual value lies outside its publicly claimed range. Rejected
    /// before proving; the circuit would be unsatisfiable anyway.
    #[error("{field}: value {value} outside claimed range [{lo}, {hi}]")]
    InputRangeViolation {
        field: &'static str,
        value: u64,
        lo: u64,
        hi: u64,
    },

    /// Two active set entries carry the same hash.
    #[error("duplicate claim: slots {index_a} and {index_b} share a fingerprint")]
    DuplicateClaim { index_a: usize, index_b: usize },

    /// A sibling path does not resolve to the claimed Merkle root.
    #[error("merkle proof does not resolve to the claimed root")]
    MerkleProofMismatch,

    /// More real entries than the fixed circuit capacity. Truncation would
    /// silently drop claims, so this is always a hard rejection.
    #[error("capacity exceeded: {got} entries for {capacity} slots")]
    CapacityExceeded { capacity: usize, got: usize },

    /// Witness data is internally inconsistent.
    #[error("invalid witness: {0}")]
    InvalidWitness(String),

    /// A credential requires activity the witness does not contain.
    #[error("insufficient witness data: {0}")]
    InsufficientWitness(&'static str),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("proof verification failed")]
    VerificationFailed,

    #[error("arkworks error: {0}")]
    Ark(String),
}
