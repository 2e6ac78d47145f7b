//! Claim-specific credential circuits.
//!
//! Each circuit takes public claim ranges plus private witness data and
//! binds a credential hash: a Poseidon commitment over (user, claim values,
//! timestamp) exposed as a public input and recomputed in-circuit. Validity
//! is the AND of every sub-claim and is *enforced*, so any single broken
//! sub-claim makes the whole constraint system unsatisfiable. There is no
//! partial credit.

pub mod collaboration;
pub mod diversity;
pub mod language;
pub mod leadership;
pub mod repository;

pub use collaboration::CollaborationCredentialCircuit;
pub use diversity::DiversityCredentialCircuit;
pub use language::LanguageCredentialCircuit;
pub use leadership::LeadershipCredentialCircuit;
pub use repository::RepositoryCredentialCircuit;
