//! Poseidon hashing, native and in-circuit.
//!
//! All commitments, Merkle nodes, fingerprints, and credential hashes go
//! through these two functions so both sides agree on the sponge layout.
//! Every call site passes a domain tag; the tags keep the input spaces
//! disjoint and make the zero-sentinel convention safe.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_crypto_primitives::sponge::poseidon::{PoseidonConfig, PoseidonSponge};
use ark_crypto_primitives::sponge::{constraints::CryptographicSpongeVar, CryptographicSponge};
use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Native Poseidon hash of `elems` under `domain`.
pub fn hash_elems(cfg: &PoseidonConfig<Fr>, domain: u64, elems: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::<Fr>::new(cfg);
    let mut input = Vec::with_capacity(elems.len() + 1);
    input.push(Fr::from(domain));
    input.extend_from_slice(elems);
    sponge.absorb(&input);
    sponge.squeeze_field_elements(1)[0]
}

/// In-circuit Poseidon hash of `elems` under `domain`.
///
/// MUST match [`hash_elems`] absorb-for-absorb.
pub fn hash_elems_var(
    cs: ConstraintSystemRef<Fr>,
    cfg: &PoseidonConfig<Fr>,
    domain: u64,
    elems: &[FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::<Fr>::new(cs, cfg);
    let mut input = Vec::with_capacity(elems.len() + 1);
    input.push(FpVar::constant(Fr::from(domain)));
    input.extend_from_slice(elems);
    sponge.absorb(&input)?;
    Ok(sponge.squeeze_field_elements(1)?[0].clone())
}

/// Hash an arbitrary string into the field.
pub fn hash_str(cfg: &PoseidonConfig<Fr>, domain: u64, s: &str) -> Fr {
    hash_elems(cfg, domain, &[Fr::from_le_bytes_mod_order(s.as_bytes())])
}

/// Derive a truncated fingerprint from a name.
///
/// The fingerprint domain is the nonzero 64-bit integers: zero is the
/// empty-slot sentinel, so the one-in-2^64 zero truncation maps to 1.
pub fn fingerprint_from_str(cfg: &PoseidonConfig<Fr>, domain: u64, s: &str) -> u64 {
    let h = hash_str(cfg, domain, s);
    let low = h.into_bigint().0[0];
    if low == 0 { 1 } else { low }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{poseidon_config, DOMAIN_LANGUAGE, DOMAIN_MERKLE_NODE};
    use ark_r1cs_std::alloc::AllocVar;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn native_and_var_agree() {
        let cfg = poseidon_config();
        let elems = [Fr::from(7u64), Fr::from(11u64)];
        let expected = hash_elems(&cfg, DOMAIN_MERKLE_NODE, &elems);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let vars: Vec<FpVar<Fr>> = elems
            .iter()
            .map(|e| FpVar::new_witness(cs.clone(), || Ok(*e)).unwrap())
            .collect();
        let out = hash_elems_var(cs.clone(), &cfg, DOMAIN_MERKLE_NODE, &vars).unwrap();

        assert_eq!(out.value().unwrap(), expected);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn domains_separate() {
        let cfg = poseidon_config();
        let elems = [Fr::from(1u64)];
        assert_ne!(
            hash_elems(&cfg, DOMAIN_MERKLE_NODE, &elems),
            hash_elems(&cfg, DOMAIN_LANGUAGE, &elems)
        );
    }

    #[test]
    fn fingerprints_are_nonzero_and_stable() {
        let cfg = poseidon_config();
        let a = fingerprint_from_str(&cfg, DOMAIN_LANGUAGE, "rust");
        let b = fingerprint_from_str(&cfg, DOMAIN_LANGUAGE, "rust");
        let c = fingerprint_from_str(&cfg, DOMAIN_LANGUAGE, "go");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, 0);
    }
}
