//! Language-usage credential.
//!
//! Proves, for a fixed capacity of `N` language slots:
//! 1) Exactly `claimed_count` slots are active.
//! 2) Every active slot's attributed lines meet the public usage threshold
//!    (inactive slots are vacuously valid).
//! 3) No two active slots share a fingerprint.
//! 4) A canonical set fingerprint: active fingerprints occupy a strictly
//!    ascending prefix, inactive slots are the zero sentinel, and the public
//!    fingerprint is Poseidon over (count, all slots). Two provers claiming
//!    the same language set therefore publish the same fingerprint, so
//!    set equality is publicly checkable without revealing membership order.
//!
//! Capacity is a compile-time tier (5/10/20/50), not runtime-variable;
//! overflow is rejected off-circuit with `CapacityExceeded`.

use crate::constants::{DOMAIN_CREDENTIAL, DOMAIN_LANGUAGE_SET, FINGERPRINT_BITS, RANGE_BITS, SCALE};
use crate::error::CircuitError;
use crate::gadgets::compare::{constrain_bits, is_leq, is_lt};
use crate::gadgets::hash::{hash_elems, hash_elems_var};
use crate::gadgets::set::{count_active, enforce_distinct_active};
use crate::types::LanguageSlot;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use core::ops::Not;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// Allocated language slots plus the derived public values, for reuse by the
/// repository credential.
pub(crate) struct LanguageVars {
    pub count: FpVar<Fr>,
    pub set_fingerprint: FpVar<Fr>,
}

/// Core language constraints over already-allocated slot variables.
pub(crate) fn enforce_language_claims(
    cs: ConstraintSystemRef<Fr>,
    cfg: &PoseidonConfig<Fr>,
    fingerprints: &[FpVar<Fr>],
    lines: &[FpVar<Fr>],
    proficiency: &[FpVar<Fr>],
    active: &[Boolean<Fr>],
    usage_threshold: &FpVar<Fr>,
) -> Result<LanguageVars, SynthesisError> {
    let n = fingerprints.len();
    let zero = FpVar::<Fr>::constant(Fr::from(0u64));
    let one = FpVar::<Fr>::constant(Fr::from(1u64));
    let hundred = FpVar::<Fr>::constant(Fr::from(SCALE));

    for i in 0..n {
        constrain_bits(&fingerprints[i], FINGERPRINT_BITS)?;
        constrain_bits(&lines[i], RANGE_BITS)?;
        constrain_bits(&proficiency[i], RANGE_BITS)?;

        // Proficiency is a 0..=100 score.
        is_leq(&proficiency[i], &hundred, RANGE_BITS)?
            .enforce_equal(&Boolean::constant(true))?;

        let active_fp = active[i].select(&one, &zero)?;

        // Inactive slots carry the zero sentinel.
        ((&one - &active_fp) * &fingerprints[i]).enforce_equal(&zero)?;
        ((&one - &active_fp) * &lines[i]).enforce_equal(&zero)?;

        // Active slots carry a real (nonzero) fingerprint.
        let nonzero = is_leq(&one, &fingerprints[i], FINGERPRINT_BITS)?;
        (&active[i] & &nonzero.not())
            .enforce_equal(&Boolean::constant(false))?;

        // Active slots meet the usage threshold; inactive are vacuous.
        let meets = is_leq(usage_threshold, &lines[i], RANGE_BITS)?;
        (&active[i] & &meets.not())
            .enforce_equal(&Boolean::constant(false))?;
    }

    // Active slots form a prefix: active[i+1] implies active[i]. Together
    // with the ascending check below this pins one canonical slot layout
    // per language set.
    for i in 0..n.saturating_sub(1) {
        (&active[i + 1] & &active[i].clone().not())
            .enforce_equal(&Boolean::constant(false))?;

        let in_order = is_lt(&fingerprints[i], &fingerprints[i + 1], FINGERPRINT_BITS)?;
        (&active[i + 1] & &in_order.not())
            .enforce_equal(&Boolean::constant(false))?;
    }

    enforce_distinct_active(fingerprints, active)?;

    let count = count_active(active)?;

    let mut set_input = Vec::with_capacity(n + 1);
    set_input.push(count.clone());
    set_input.extend_from_slice(fingerprints);
    let set_fingerprint = hash_elems_var(cs, cfg, DOMAIN_LANGUAGE_SET, &set_input)?;

    Ok(LanguageVars {
        count,
        set_fingerprint,
    })
}

/// Circuit proving a language-usage claim over `N` slots.
#[derive(Clone, Debug)]
pub struct LanguageCredentialCircuit<const N: usize> {
    /// Private slots, canonical order (sorted active prefix).
    pub slots: Vec<LanguageSlot>,
    /// Private: bound into the credential commitment, never disclosed.
    pub user_address: Fr,
    pub timestamp: u64,

    /// Public claim: number of active languages.
    pub claimed_count: u64,
    /// Public claim: minimum attributed lines per active language.
    pub usage_threshold: u64,
    /// Public: canonical fingerprint of the claimed set.
    pub set_fingerprint: Fr,
    /// Public: commitment binding user, claim values and timestamp.
    pub credential_hash: Fr,
}

impl<const N: usize> LanguageCredentialCircuit<N> {
    /// Canonicalize analyzer output: sort active slots by fingerprint and
    /// pad with empty sentinels. Fails fast on overflow or duplicates so no
    /// proving time is wasted on an unsatisfiable witness.
    pub fn canonical_slots(mut active: Vec<LanguageSlot>) -> Result<Vec<LanguageSlot>, CircuitError> {
        if active.len() > N {
            return Err(CircuitError::CapacityExceeded {
                capacity: N,
                got: active.len(),
            });
        }
        for s in &active {
            if !crate::types::valid_fingerprint(s.fingerprint) {
                return Err(CircuitError::InvalidWitness(format!(
                    "fingerprint {} outside the fingerprint domain",
                    s.fingerprint
                )));
            }
        }
        active.sort_by_key(|s| s.fingerprint);
        for (i, w) in active.windows(2).enumerate() {
            if w[0].fingerprint == w[1].fingerprint {
                return Err(CircuitError::DuplicateClaim {
                    index_a: i,
                    index_b: i + 1,
                });
            }
        }
        for s in &mut active {
            s.active = true;
        }
        active.resize(N, LanguageSlot::empty());
        Ok(active)
    }

    /// Canonical fingerprint of the claimed set; MUST match the circuit.
    pub fn compute_set_fingerprint(cfg: &PoseidonConfig<Fr>, slots: &[LanguageSlot]) -> Fr {
        let count = slots.iter().filter(|s| s.active).count() as u64;
        let mut input = Vec::with_capacity(slots.len() + 1);
        input.push(Fr::from(count));
        input.extend(slots.iter().map(|s| Fr::from(s.fingerprint)));
        hash_elems(cfg, DOMAIN_LANGUAGE_SET, &input)
    }

    /// Commitment binding; MUST match the circuit.
    pub fn compute_credential_hash(
        cfg: &PoseidonConfig<Fr>,
        user_address: Fr,
        claimed_count: u64,
        usage_threshold: u64,
        set_fingerprint: Fr,
        timestamp: u64,
    ) -> Fr {
        hash_elems(
            cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                Fr::from(claimed_count),
                Fr::from(usage_threshold),
                set_fingerprint,
                Fr::from(timestamp),
            ],
        )
    }

    /// Build a complete circuit instance from canonical slots.
    pub fn new(
        cfg: &PoseidonConfig<Fr>,
        slots: Vec<LanguageSlot>,
        user_address: Fr,
        usage_threshold: u64,
        timestamp: u64,
    ) -> Result<Self, CircuitError> {
        if slots.len() != N {
            return Err(CircuitError::InvalidWitness(format!(
                "expected {N} slots, got {}",
                slots.len()
            )));
        }
        let claimed_count = slots.iter().filter(|s| s.active).count() as u64;
        let set_fingerprint = Self::compute_set_fingerprint(cfg, &slots);
        let credential_hash = Self::compute_credential_hash(
            cfg,
            user_address,
            claimed_count,
            usage_threshold,
            set_fingerprint,
            timestamp,
        );
        Ok(Self {
            slots,
            user_address,
            timestamp,
            claimed_count,
            usage_threshold,
            set_fingerprint,
            credential_hash,
        })
    }

    /// Satisfiable instance used for key generation.
    pub fn placeholder(cfg: &PoseidonConfig<Fr>) -> Self {
        let slots = Self::canonical_slots(vec![
            LanguageSlot {
                fingerprint: 1,
                lines: 1,
                proficiency: 1,
                active: true,
            },
        ])
        .expect("placeholder fits any tier");
        Self::new(cfg, slots, Fr::from(1u64), 1, 0).expect("placeholder instance")
    }

    /// Public-input vector; ORDERING MUST MATCH the circuit's `new_input`
    /// allocation order.
    pub fn public_inputs(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.claimed_count),
            Fr::from(self.usage_threshold),
            self.set_fingerprint,
            self.credential_hash,
        ]
    }
}

impl<const N: usize> ConstraintSynthesizer<Fr> for LanguageCredentialCircuit<N> {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        if self.slots.len() != N {
            return Err(SynthesisError::Unsatisfiable);
        }
        let cfg = crate::constants::poseidon_config();

        // --- Public inputs ---
        let claimed_count =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.claimed_count)))?;
        let usage_threshold =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.usage_threshold)))?;
        let set_fingerprint = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.set_fingerprint))?;
        let credential_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.credential_hash))?;

        // --- Witness ---
        let user_address = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.user_address))?;
        let timestamp = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(self.timestamp)))?;

        let mut fingerprints = Vec::with_capacity(N);
        let mut lines = Vec::with_capacity(N);
        let mut proficiency = Vec::with_capacity(N);
        let mut active = Vec::with_capacity(N);
        for slot in &self.slots {
            fingerprints
                .push(FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.fingerprint)))?);
            lines.push(FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.lines)))?);
            proficiency
                .push(FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.proficiency)))?);
            active.push(Boolean::new_witness(cs.clone(), || Ok(slot.active))?);
        }

        let vars = enforce_language_claims(
            cs.clone(),
            &cfg,
            &fingerprints,
            &lines,
            &proficiency,
            &active,
            &usage_threshold,
        )?;

        vars.count.enforce_equal(&claimed_count)?;
        vars.set_fingerprint.enforce_equal(&set_fingerprint)?;

        let commitment = hash_elems_var(
            cs,
            &cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                claimed_count,
                usage_threshold,
                set_fingerprint,
                timestamp,
            ],
        )?;
        commitment.enforce_equal(&credential_hash)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::poseidon_config;
    use ark_relations::r1cs::ConstraintSystem;

    fn slot(fingerprint: u64, lines: u64) -> LanguageSlot {
        LanguageSlot {
            fingerprint,
            lines,
            proficiency: 50,
            active: true,
        }
    }

    fn satisfied(circuit: LanguageCredentialCircuit<5>) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn valid_claim_satisfies() {
        let cfg = poseidon_config();
        let slots = LanguageCredentialCircuit::<5>::canonical_slots(vec![
            slot(30, 500),
            slot(10, 900),
            slot(20, 1200),
        ])
        .unwrap();
        let circuit =
            LanguageCredentialCircuit::<5>::new(&cfg, slots, Fr::from(7u64), 100, 1700000000)
                .unwrap();
        assert_eq!(circuit.claimed_count, 3);
        assert!(satisfied(circuit));
    }

    #[test]
    fn wrong_count_unsatisfiable() {
        let cfg = poseidon_config();
        let slots =
            LanguageCredentialCircuit::<5>::canonical_slots(vec![slot(10, 900), slot(20, 1200)])
                .unwrap();
        let mut circuit =
            LanguageCredentialCircuit::<5>::new(&cfg, slots, Fr::from(7u64), 100, 0).unwrap();
        circuit.claimed_count = 3;
        assert!(!satisfied(circuit));
    }

    #[test]
    fn below_usage_threshold_unsatisfiable() {
        let cfg = poseidon_config();
        let slots =
            LanguageCredentialCircuit::<5>::canonical_slots(vec![slot(10, 900), slot(20, 40)])
                .unwrap();
        let circuit =
            LanguageCredentialCircuit::<5>::new(&cfg, slots, Fr::from(7u64), 100, 0).unwrap();
        assert!(!satisfied(circuit));
    }

    #[test]
    fn duplicate_fingerprint_rejected_at_packing() {
        let err = LanguageCredentialCircuit::<5>::canonical_slots(vec![slot(10, 900), slot(10, 40)])
            .unwrap_err();
        assert!(matches!(err, CircuitError::DuplicateClaim { .. }));
    }

    #[test]
    fn duplicate_fingerprint_unsatisfiable_in_circuit() {
        let cfg = poseidon_config();
        // Bypass packing and hand the circuit a duplicated active pair.
        let mut slots = vec![slot(10, 900), slot(10, 1200)];
        slots.resize(5, LanguageSlot::empty());
        let circuit = LanguageCredentialCircuit::<5> {
            claimed_count: 2,
            usage_threshold: 100,
            set_fingerprint: LanguageCredentialCircuit::<5>::compute_set_fingerprint(&cfg, &slots),
            credential_hash: LanguageCredentialCircuit::<5>::compute_credential_hash(
                &cfg,
                Fr::from(7u64),
                2,
                100,
                LanguageCredentialCircuit::<5>::compute_set_fingerprint(&cfg, &slots),
                0,
            ),
            slots,
            user_address: Fr::from(7u64),
            timestamp: 0,
        };
        assert!(!satisfied(circuit));
    }

    #[test]
    fn set_fingerprint_is_order_independent() {
        let cfg = poseidon_config();
        let a = LanguageCredentialCircuit::<5>::canonical_slots(vec![
            slot(30, 500),
            slot(10, 900),
        ])
        .unwrap();
        let b = LanguageCredentialCircuit::<5>::canonical_slots(vec![
            slot(10, 900),
            slot(30, 500),
        ])
        .unwrap();
        assert_eq!(
            LanguageCredentialCircuit::<5>::compute_set_fingerprint(&cfg, &a),
            LanguageCredentialCircuit::<5>::compute_set_fingerprint(&cfg, &b),
        );
    }

    #[test]
    fn capacity_overflow_rejected() {
        let too_many: Vec<LanguageSlot> = (1..=6u64).map(|i| slot(i * 10, 500)).collect();
        let err = LanguageCredentialCircuit::<5>::canonical_slots(too_many).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::CapacityExceeded { capacity: 5, got: 6 }
        ));
    }
}
