//! In-circuit Merkle membership verification.

use crate::constants::DOMAIN_MERKLE_NODE;
use crate::gadgets::hash::hash_elems_var;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Recompute the root from `leaf` along the sibling path.
///
/// `is_right[level]` selects the hash order at each level: when set, the
/// running node is the right child and the sibling goes on the left. Any
/// altered sibling or direction bit yields a different root, so verification
/// against the claimed root fails.
pub fn compute_root_var(
    cs: ConstraintSystemRef<Fr>,
    cfg: &PoseidonConfig<Fr>,
    leaf: &FpVar<Fr>,
    siblings: &[FpVar<Fr>],
    is_right: &[Boolean<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    debug_assert_eq!(siblings.len(), is_right.len());

    let mut current = leaf.clone();
    for (sibling, right_child) in siblings.iter().zip(is_right) {
        // left = right_child ? sibling : current
        // right = right_child ? current : sibling
        let left = right_child.select(sibling, &current)?;
        let right = right_child.select(&current, sibling)?;
        current = hash_elems_var(cs.clone(), cfg, DOMAIN_MERKLE_NODE, &[left, right])?;
    }
    Ok(current)
}

/// Assert that `leaf` is a member of the tree with `root`.
pub fn enforce_membership(
    cs: ConstraintSystemRef<Fr>,
    cfg: &PoseidonConfig<Fr>,
    leaf: &FpVar<Fr>,
    root: &FpVar<Fr>,
    siblings: &[FpVar<Fr>],
    is_right: &[Boolean<Fr>],
) -> Result<(), SynthesisError> {
    let computed = compute_root_var(cs, cfg, leaf, siblings, is_right)?;
    computed.enforce_equal(root)
}

/// Assert membership only when `active` is set.
///
/// Inactive slots are vacuously valid: `active * (computed - root) == 0`.
pub fn enforce_membership_if(
    cs: ConstraintSystemRef<Fr>,
    cfg: &PoseidonConfig<Fr>,
    active: &Boolean<Fr>,
    leaf: &FpVar<Fr>,
    root: &FpVar<Fr>,
    siblings: &[FpVar<Fr>],
    is_right: &[Boolean<Fr>],
) -> Result<(), SynthesisError> {
    let computed = compute_root_var(cs, cfg, leaf, siblings, is_right)?;
    let active_fp = active.select(
        &FpVar::constant(Fr::from(1u64)),
        &FpVar::constant(Fr::from(0u64)),
    )?;
    (active_fp * (computed - root)).enforce_equal(&FpVar::constant(Fr::from(0u64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::poseidon_config;
    use crate::tree::MerkleTree;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_relations::r1cs::ConstraintSystem;

    fn alloc_path(
        cs: &ark_relations::r1cs::ConstraintSystemRef<Fr>,
        path: &crate::tree::MerklePath,
    ) -> (Vec<FpVar<Fr>>, Vec<Boolean<Fr>>) {
        let siblings = path
            .siblings
            .iter()
            .map(|s| FpVar::new_witness(cs.clone(), || Ok(*s)).unwrap())
            .collect();
        let is_right = path
            .is_right
            .iter()
            .map(|b| Boolean::new_witness(cs.clone(), || Ok(*b)).unwrap())
            .collect();
        (siblings, is_right)
    }

    #[test]
    fn valid_path_satisfies() {
        let cfg = poseidon_config();
        let leaves: Vec<Fr> = (1..=8u64).map(Fr::from).collect();
        let tree = MerkleTree::from_leaves(&cfg, &leaves, 3).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let leaf = FpVar::new_witness(cs.clone(), || Ok(leaves[5])).unwrap();
        let root = FpVar::new_input(cs.clone(), || Ok(tree.root())).unwrap();
        let (siblings, is_right) = alloc_path(&cs, &tree.path(5));

        enforce_membership(cs.clone(), &cfg, &leaf, &root, &siblings, &is_right).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn tampered_sibling_unsatisfiable() {
        let cfg = poseidon_config();
        let leaves: Vec<Fr> = (1..=8u64).map(Fr::from).collect();
        let tree = MerkleTree::from_leaves(&cfg, &leaves, 3).unwrap();

        let mut path = tree.path(5);
        path.siblings[0] += Fr::from(1u64);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let leaf = FpVar::new_witness(cs.clone(), || Ok(leaves[5])).unwrap();
        let root = FpVar::new_input(cs.clone(), || Ok(tree.root())).unwrap();
        let (siblings, is_right) = alloc_path(&cs, &path);

        enforce_membership(cs.clone(), &cfg, &leaf, &root, &siblings, &is_right).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn flipped_direction_unsatisfiable() {
        let cfg = poseidon_config();
        let leaves: Vec<Fr> = (1..=8u64).map(Fr::from).collect();
        let tree = MerkleTree::from_leaves(&cfg, &leaves, 3).unwrap();

        let mut path = tree.path(2);
        path.is_right[1] = !path.is_right[1];

        let cs = ConstraintSystem::<Fr>::new_ref();
        let leaf = FpVar::new_witness(cs.clone(), || Ok(leaves[2])).unwrap();
        let root = FpVar::new_input(cs.clone(), || Ok(tree.root())).unwrap();
        let (siblings, is_right) = alloc_path(&cs, &path);

        enforce_membership(cs.clone(), &cfg, &leaf, &root, &siblings, &is_right).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn inactive_slot_is_vacuous() {
        let cfg = poseidon_config();
        let leaves: Vec<Fr> = (1..=8u64).map(Fr::from).collect();
        let tree = MerkleTree::from_leaves(&cfg, &leaves, 3).unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let active = Boolean::new_witness(cs.clone(), || Ok(false)).unwrap();
        // Garbage leaf and empty path: fine while inactive.
        let leaf = FpVar::new_witness(cs.clone(), || Ok(Fr::from(999u64))).unwrap();
        let root = FpVar::new_input(cs.clone(), || Ok(tree.root())).unwrap();
        let (siblings, is_right) = alloc_path(&cs, &crate::tree::MerklePath::empty(3));

        enforce_membership_if(cs.clone(), &cfg, &active, &leaf, &root, &siblings, &is_right)
            .unwrap();
        assert!(cs.is_satisfied().unwrap());
    }
}
