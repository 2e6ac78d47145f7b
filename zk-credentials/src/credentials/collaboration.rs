//! Collaboration credential.
//!
//! Proves that the actual collaborator count lies within a public range,
//! that the user is not the sole contributor (contribution strictly below
//! 100%), and publishes a derived collaboration score computed from the
//! contribution balance and the anonymized collaborator set.

use crate::constants::{DOMAIN_COLLABORATOR, DOMAIN_CREDENTIAL, RANGE_BITS, SCALE};
use crate::error::CircuitError;
use crate::gadgets::compare::{constrain_bits, enforce_in_range, is_lt, min};
use crate::gadgets::hash::{hash_elems, hash_elems_var};
use crate::gadgets::set::{count_active, enforce_distinct_active};
use crate::types::{ClaimRange, CollaboratorSlot};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// Derived values shared with the repository credential.
pub(crate) struct CollaborationVars {
    pub count: FpVar<Fr>,
    pub score: FpVar<Fr>,
    pub set_hash: FpVar<Fr>,
}

/// Collaboration score contract: the balance left to others plus a small
/// per-collaborator bonus, capped at 100.
pub fn collaboration_score(collaborator_count: u64, contribution_pct: u64) -> u64 {
    ((SCALE - contribution_pct) + 2 * collaborator_count).min(SCALE)
}

/// Core collaboration constraints over already-allocated variables.
pub(crate) fn enforce_collaboration_claims(
    cs: ConstraintSystemRef<Fr>,
    cfg: &PoseidonConfig<Fr>,
    identities: &[FpVar<Fr>],
    active: &[Boolean<Fr>],
    contribution_pct: &FpVar<Fr>,
    count_lo: &FpVar<Fr>,
    count_hi: &FpVar<Fr>,
) -> Result<CollaborationVars, SynthesisError> {
    let zero = FpVar::<Fr>::constant(Fr::from(0u64));
    let one = FpVar::<Fr>::constant(Fr::from(1u64));
    let hundred = FpVar::<Fr>::constant(Fr::from(SCALE));

    for i in 0..identities.len() {
        let active_fp = active[i].select(&one, &zero)?;

        // Inactive slots are the zero sentinel; active identities are real.
        ((&one - &active_fp) * &identities[i]).enforce_equal(&zero)?;
        let is_zero = identities[i].is_eq(&zero)?;
        (&active[i] & &is_zero)
            .enforce_equal(&Boolean::constant(false))?;
    }

    // Anonymized identities must not repeat; a padded collaborator list
    // cannot inflate the count.
    enforce_distinct_active(identities, active)?;

    let count = count_active(active)?;
    enforce_in_range(&count, count_lo, count_hi, RANGE_BITS)?;

    // Not the sole contributor: strictly below 100%.
    constrain_bits(contribution_pct, RANGE_BITS)?;
    is_lt(contribution_pct, &hundred, RANGE_BITS)?
        .enforce_equal(&Boolean::constant(true))?;

    // score = min(100, (100 - pct) + 2 * count)
    let balance = &hundred - contribution_pct;
    let raw = balance + &count + &count;
    let score = min(&raw, &hundred, RANGE_BITS)?;

    let mut set_input = Vec::with_capacity(identities.len() + 1);
    set_input.push(count.clone());
    set_input.extend_from_slice(identities);
    let set_hash = hash_elems_var(cs, cfg, DOMAIN_COLLABORATOR, &set_input)?;

    Ok(CollaborationVars {
        count,
        score,
        set_hash,
    })
}

/// Circuit proving a collaboration claim over `K` collaborator slots.
#[derive(Clone, Debug)]
pub struct CollaborationCredentialCircuit<const K: usize> {
    /// Private collaborator slots (active prefix not required; order free).
    pub collaborators: Vec<CollaboratorSlot>,
    /// Private: user's own contribution percentage.
    pub contribution_pct: u64,
    pub user_address: Fr,
    pub timestamp: u64,

    /// Public claim: collaborator count range.
    pub count_range: ClaimRange,
    /// Public: derived collaboration score.
    pub collaboration_score: u64,
    /// Public: commitment binding user, claim values and timestamp.
    pub credential_hash: Fr,
}

impl<const K: usize> CollaborationCredentialCircuit<K> {
    /// Pad collaborators to capacity; overflow is rejected, never truncated.
    pub fn pad_collaborators(
        mut collaborators: Vec<CollaboratorSlot>,
    ) -> Result<Vec<CollaboratorSlot>, CircuitError> {
        if collaborators.len() > K {
            return Err(CircuitError::CapacityExceeded {
                capacity: K,
                got: collaborators.len(),
            });
        }
        for c in &mut collaborators {
            c.active = true;
        }
        collaborators.resize(K, CollaboratorSlot::empty());
        Ok(collaborators)
    }

    /// Anonymized set hash; MUST match the circuit.
    pub fn compute_set_hash(cfg: &PoseidonConfig<Fr>, collaborators: &[CollaboratorSlot]) -> Fr {
        let count = collaborators.iter().filter(|c| c.active).count() as u64;
        let mut input = Vec::with_capacity(collaborators.len() + 1);
        input.push(Fr::from(count));
        input.extend(collaborators.iter().map(|c| c.identity));
        hash_elems(cfg, DOMAIN_COLLABORATOR, &input)
    }

    /// Commitment binding; MUST match the circuit.
    pub fn compute_credential_hash(
        cfg: &PoseidonConfig<Fr>,
        user_address: Fr,
        count_range: ClaimRange,
        score: u64,
        set_hash: Fr,
        timestamp: u64,
    ) -> Fr {
        hash_elems(
            cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                Fr::from(count_range.lo),
                Fr::from(count_range.hi),
                Fr::from(score),
                set_hash,
                Fr::from(timestamp),
            ],
        )
    }

    /// Build a complete instance, fail-fast on a count outside the claimed
    /// range so no proving time is spent on an unsatisfiable witness.
    pub fn new(
        cfg: &PoseidonConfig<Fr>,
        collaborators: Vec<CollaboratorSlot>,
        contribution_pct: u64,
        user_address: Fr,
        count_range: ClaimRange,
        timestamp: u64,
    ) -> Result<Self, CircuitError> {
        if collaborators.len() != K {
            return Err(CircuitError::InvalidWitness(format!(
                "expected {K} slots, got {}",
                collaborators.len()
            )));
        }
        let count = collaborators.iter().filter(|c| c.active).count() as u64;
        if !count_range.contains(count) {
            return Err(CircuitError::InputRangeViolation {
                field: "collaborator_count",
                value: count,
                lo: count_range.lo,
                hi: count_range.hi,
            });
        }
        if contribution_pct >= SCALE {
            return Err(CircuitError::InputRangeViolation {
                field: "contribution_pct",
                value: contribution_pct,
                lo: 0,
                hi: SCALE - 1,
            });
        }

        let score = collaboration_score(count, contribution_pct);
        let set_hash = Self::compute_set_hash(cfg, &collaborators);
        let credential_hash = Self::compute_credential_hash(
            cfg,
            user_address,
            count_range,
            score,
            set_hash,
            timestamp,
        );
        Ok(Self {
            collaborators,
            contribution_pct,
            user_address,
            timestamp,
            count_range,
            collaboration_score: score,
            credential_hash,
        })
    }

    /// Satisfiable instance used for key generation.
    pub fn placeholder(cfg: &PoseidonConfig<Fr>) -> Self {
        let collaborators = Self::pad_collaborators(vec![CollaboratorSlot {
            identity: Fr::from(1u64),
            contribution_pct: 50,
            active: true,
        }])
        .expect("placeholder fits");
        Self::new(
            cfg,
            collaborators,
            50,
            Fr::from(1u64),
            ClaimRange { lo: 1, hi: 10 },
            0,
        )
        .expect("placeholder instance")
    }

    /// Public-input vector; ORDERING MUST MATCH the circuit's `new_input`
    /// allocation order.
    pub fn public_inputs(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.count_range.lo),
            Fr::from(self.count_range.hi),
            Fr::from(self.collaboration_score),
            self.credential_hash,
        ]
    }
}

impl<const K: usize> ConstraintSynthesizer<Fr> for CollaborationCredentialCircuit<K> {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        if self.collaborators.len() != K {
            return Err(SynthesisError::Unsatisfiable);
        }
        let cfg = crate::constants::poseidon_config();

        // --- Public inputs ---
        let count_lo = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.count_range.lo)))?;
        let count_hi = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.count_range.hi)))?;
        let claimed_score =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.collaboration_score)))?;
        let credential_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.credential_hash))?;

        // --- Witness ---
        let user_address = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.user_address))?;
        let timestamp = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(self.timestamp)))?;
        let contribution_pct =
            FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(self.contribution_pct)))?;

        let mut identities = Vec::with_capacity(K);
        let mut active = Vec::with_capacity(K);
        for c in &self.collaborators {
            identities.push(FpVar::<Fr>::new_witness(cs.clone(), || Ok(c.identity))?);
            active.push(Boolean::new_witness(cs.clone(), || Ok(c.active))?);
        }

        let vars = enforce_collaboration_claims(
            cs.clone(),
            &cfg,
            &identities,
            &active,
            &contribution_pct,
            &count_lo,
            &count_hi,
        )?;

        vars.score.enforce_equal(&claimed_score)?;

        let commitment = hash_elems_var(
            cs,
            &cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                count_lo,
                count_hi,
                claimed_score,
                vars.set_hash,
                timestamp,
            ],
        )?;
        commitment.enforce_equal(&credential_hash)?;

        Ok(())
    }
}
