//! Groth16 prover/verifier orchestration for the credential circuits.
//!
//! SECURITY NOTE (prototype): Groth16 requires a trusted setup that produces
//! a proving key (PK) and verifying key (VK) per circuit shape. This
//! prototype generates keys locally. In production, an MPC ceremony (or a
//! transparent system) should be used.

use crate::aggregation::{RepositoryAggregatorCircuit, StatsAggregatorCircuit};
use crate::constants::{
    MAX_COLLABORATORS, MAX_COMMITS, MAX_LANGUAGES, MAX_REPOSITORIES, MAX_STAT_VALUES,
};
use crate::credentials::{
    CollaborationCredentialCircuit, LanguageCredentialCircuit, RepositoryCredentialCircuit,
};
use crate::error::CircuitError;
use crate::types::{CircuitId, FrHex, ProofArtifact};
use ark_bn254::{Bn254, Fr};
use ark_groth16::{prepare_verifying_key, Groth16, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::ConstraintSynthesizer;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use base64::Engine;
use rand::RngCore;

/// Default-tier circuit shapes used by the backend build.
pub type DefaultRepositoryCircuit =
    RepositoryCredentialCircuit<MAX_COMMITS, MAX_LANGUAGES, MAX_COLLABORATORS>;
pub type DefaultLanguageCircuit = LanguageCredentialCircuit<MAX_LANGUAGES>;
pub type DefaultCollaborationCircuit = CollaborationCredentialCircuit<MAX_COLLABORATORS>;
pub type DefaultAggregatorCircuit = RepositoryAggregatorCircuit<MAX_REPOSITORIES>;
pub type DefaultStatsCircuit = StatsAggregatorCircuit<MAX_STAT_VALUES>;

/// Generate a Groth16 keypair for one circuit shape.
///
/// Must be run once per (circuit, capacity tier); callers pass the
/// circuit's `placeholder()` instance.
pub fn setup_keys<Ci: ConstraintSynthesizer<Fr>>(
    circuit: Ci,
    rng: &mut impl RngCore,
) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), CircuitError> {
    let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(circuit, rng)
        .map_err(|e| CircuitError::Ark(format!("{e}")))?;
    let vk = pk.vk.clone();
    Ok((pk, vk))
}

/// Prove a fully-assembled circuit instance.
pub fn prove<Ci: ConstraintSynthesizer<Fr>>(
    circuit: Ci,
    pk: &ProvingKey<Bn254>,
    rng: &mut impl RngCore,
) -> Result<Proof<Bn254>, CircuitError> {
    Groth16::<Bn254>::create_random_proof_with_reduction(circuit, pk, rng)
        .map_err(|e| CircuitError::Ark(format!("{e}")))
}

/// Verify a proof against an ordered public-input vector.
pub fn verify(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    public_inputs: &[Fr],
) -> Result<(), CircuitError> {
    let pvk = prepare_verifying_key(vk);
    let ok = Groth16::<Bn254>::verify_proof(&pvk, proof, public_inputs)
        .map_err(|e| CircuitError::Ark(format!("{e}")))?;
    if !ok {
        return Err(CircuitError::VerificationFailed);
    }
    Ok(())
}

/// Serialize a proving key to bytes.
pub fn serialize_pk(pk: &ProvingKey<Bn254>) -> Result<Vec<u8>, CircuitError> {
    let mut out = Vec::new();
    pk.serialize_compressed(&mut out)
        .map_err(|e| CircuitError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, CircuitError> {
    ProvingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| CircuitError::Serialization(format!("{e}")))
}

pub fn serialize_vk(vk: &VerifyingKey<Bn254>) -> Result<Vec<u8>, CircuitError> {
    let mut out = Vec::new();
    vk.serialize_compressed(&mut out)
        .map_err(|e| CircuitError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, CircuitError> {
    VerifyingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| CircuitError::Serialization(format!("{e}")))
}

pub fn serialize_proof(proof: &Proof<Bn254>) -> Result<Vec<u8>, CircuitError> {
    let mut out = Vec::new();
    proof
        .serialize_compressed(&mut out)
        .map_err(|e| CircuitError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, CircuitError> {
    Proof::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| CircuitError::Serialization(format!("{e}")))
}

/// Assemble the external artifact: `{circuit_id, public_signals, proof,
/// credential_hash}`.
///
/// The credential hash must be one of `public_signals` (the circuit binds
/// it), duplicated at the top level as the storage/anti-replay key.
pub fn make_artifact(
    circuit_id: CircuitId,
    public_signals: &[Fr],
    proof: &Proof<Bn254>,
    credential_hash: Fr,
) -> Result<ProofArtifact, CircuitError> {
    let proof_bytes = serialize_proof(proof)?;
    Ok(ProofArtifact {
        circuit_id,
        public_signals: public_signals.iter().map(FrHex::from_fr).collect(),
        proof_b64: base64::engine::general_purpose::STANDARD.encode(proof_bytes),
        credential_hash: FrHex::from_fr(&credential_hash),
    })
}

/// Verify a transported artifact against a verifying key.
pub fn verify_artifact(
    vk: &VerifyingKey<Bn254>,
    artifact: &ProofArtifact,
) -> Result<(), CircuitError> {
    let public_inputs: Vec<Fr> = artifact
        .public_signals
        .iter()
        .map(|h| h.to_fr().map_err(CircuitError::Serialization))
        .collect::<Result<_, _>>()?;

    let proof_bytes = base64::engine::general_purpose::STANDARD
        .decode(&artifact.proof_b64)
        .map_err(|e| CircuitError::Serialization(format!("{e}")))?;
    let proof = deserialize_proof(&proof_bytes)?;

    verify(vk, &proof, &public_inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::poseidon_config;
    use crate::credentials::LanguageCredentialCircuit;
    use crate::types::LanguageSlot;
    use rand::rngs::OsRng;

    type SmallLanguage = LanguageCredentialCircuit<5>;

    fn sample_circuit() -> SmallLanguage {
        let cfg = poseidon_config();
        let slots = SmallLanguage::canonical_slots(vec![
            LanguageSlot { fingerprint: 11, lines: 900, proficiency: 70, active: true },
            LanguageSlot { fingerprint: 22, lines: 450, proficiency: 40, active: true },
        ])
        .unwrap();
        SmallLanguage::new(&cfg, slots, Fr::from(7u64), 100, 1700000000).unwrap()
    }

    #[test]
    fn prove_verify_round_trip() {
        let mut rng = OsRng;
        let (pk, vk) = setup_keys(SmallLanguage::placeholder(&poseidon_config()), &mut rng).unwrap();

        let circuit = sample_circuit();
        let public_inputs = circuit.public_inputs();
        let credential_hash = circuit.credential_hash;

        let proof = prove(circuit, &pk, &mut rng).unwrap();
        verify(&vk, &proof, &public_inputs).unwrap();

        // Artifact round trip through serialization.
        let artifact = make_artifact(
            crate::types::CircuitId::LanguageCredential,
            &public_inputs,
            &proof,
            credential_hash,
        )
        .unwrap();
        verify_artifact(&vk, &artifact).unwrap();
    }

    #[test]
    fn wrong_public_inputs_rejected() {
        let mut rng = OsRng;
        let (pk, vk) = setup_keys(SmallLanguage::placeholder(&poseidon_config()), &mut rng).unwrap();

        let circuit = sample_circuit();
        let mut public_inputs = circuit.public_inputs();
        let proof = prove(circuit, &pk, &mut rng).unwrap();

        // Claim one more language than was proven.
        public_inputs[0] += Fr::from(1u64);
        assert!(matches!(
            verify(&vk, &proof, &public_inputs),
            Err(CircuitError::VerificationFailed)
        ));
    }

    #[test]
    fn key_serialization_round_trip() {
        use rand::SeedableRng;
        // Seeded rng keeps this test reproducible end to end.
        let mut rng = rand_chacha::ChaCha20Rng::from_seed([42u8; 32]);
        let (pk, vk) = setup_keys(SmallLanguage::placeholder(&poseidon_config()), &mut rng).unwrap();

        let pk2 = deserialize_pk(&serialize_pk(&pk).unwrap()).unwrap();
        let vk2 = deserialize_vk(&serialize_vk(&vk).unwrap()).unwrap();

        let circuit = sample_circuit();
        let public_inputs = circuit.public_inputs();
        let proof = prove(circuit, &pk2, &mut rng).unwrap();
        verify(&vk2, &proof, &public_inputs).unwrap();
    }
}
