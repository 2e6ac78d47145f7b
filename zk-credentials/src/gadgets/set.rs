//! Duplicate-free set membership over (hash, active-flag) pairs.

use ark_bn254::Fr;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::SynthesisError;

/// Assert that no two *active* entries share a hash.
///
/// Pairwise equality checks gated by the AND of both active flags feed a
/// counter; the counter must stay zero. Inactive slots never collide with
/// anything, so slot order is irrelevant.
pub fn enforce_distinct_active(
    hashes: &[FpVar<Fr>],
    active: &[Boolean<Fr>],
) -> Result<(), SynthesisError> {
    debug_assert_eq!(hashes.len(), active.len());

    let zero = FpVar::<Fr>::constant(Fr::from(0u64));
    let one = FpVar::<Fr>::constant(Fr::from(1u64));

    let mut duplicates = zero.clone();
    for i in 0..hashes.len() {
        for j in (i + 1)..hashes.len() {
            let both_active = &active[i] & &active[j];
            let same_hash = hashes[i].is_eq(&hashes[j])?;
            let collision = &both_active & &same_hash;
            duplicates += collision.select(&one, &zero)?;
        }
    }

    duplicates.enforce_equal(&zero)
}

/// Sum of active flags as a field element.
pub fn count_active(active: &[Boolean<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    let zero = FpVar::<Fr>::constant(Fr::from(0u64));
    let one = FpVar::<Fr>::constant(Fr::from(1u64));

    let mut count = zero.clone();
    for a in active {
        count += a.select(&one, &zero)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};

    fn alloc(
        cs: &ConstraintSystemRef<Fr>,
        entries: &[(u64, bool)],
    ) -> (Vec<FpVar<Fr>>, Vec<Boolean<Fr>>) {
        let hashes = entries
            .iter()
            .map(|(h, _)| FpVar::new_witness(cs.clone(), || Ok(Fr::from(*h))).unwrap())
            .collect();
        let active = entries
            .iter()
            .map(|(_, a)| Boolean::new_witness(cs.clone(), || Ok(*a)).unwrap())
            .collect();
        (hashes, active)
    }

    #[test]
    fn distinct_active_accepts_any_order() {
        for entries in [
            vec![(5u64, true), (9, true), (2, true), (0, false)],
            vec![(2u64, true), (0, false), (9, true), (5, true)],
        ] {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let (hashes, active) = alloc(&cs, &entries);
            enforce_distinct_active(&hashes, &active).unwrap();
            assert!(cs.is_satisfied().unwrap());
        }
    }

    #[test]
    fn active_duplicate_rejects() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (hashes, active) = alloc(&cs, &[(5, true), (9, true), (5, true)]);
        enforce_distinct_active(&hashes, &active).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn inactive_duplicate_is_fine() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (hashes, active) = alloc(&cs, &[(5, true), (5, false), (5, false)]);
        enforce_distinct_active(&hashes, &active).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn active_count() {
        use ark_r1cs_std::R1CSVar;
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (_, active) = alloc(&cs, &[(1, true), (2, false), (3, true), (4, true)]);
        let count = count_active(&active).unwrap();
        assert_eq!(count.value().unwrap(), Fr::from(3u64));
    }
}
