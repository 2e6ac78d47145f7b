//! ZK layer for private GitHub contribution credentials.
//!
//! This crate contains:
//! - Reusable constraint primitives: Poseidon hashing, bounded-range proofs,
//!   Merkle membership, duplicate-free set membership, signature binding.
//! - Credential circuits proving claims about a single repository
//!   (contribution, language usage, collaboration, leadership, diversity).
//! - Aggregation circuits combining per-repository outputs across a
//!   portfolio, including differentially-private statistics.
//! - Prover + verifier orchestration and serialization helpers for
//!   transporting proofs and public inputs.

pub mod constants;
pub mod error;
pub mod types;

pub mod gadgets;
pub mod tree;

pub mod credentials;
pub mod aggregation;

pub mod groth16;
