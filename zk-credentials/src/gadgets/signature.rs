//! Poseidon key-binding signature.
//!
//! Circuit-friendly identity binding: the signer address is the Poseidon
//! image of a secret key, and a signature over a message is the Poseidon
//! image of (key, message). Proving knowledge of a key that opens both
//! binds the claim to the address without revealing the key. This is a MAC
//! under the prover's key, not an ECDSA gadget; the proof artifact's
//! circuit id keys any future scheme swap.

use crate::constants::{DOMAIN_ADDRESS, DOMAIN_SIGNATURE};
use crate::gadgets::hash::{hash_elems, hash_elems_var};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Derive the public address for a secret key.
pub fn derive_address(cfg: &PoseidonConfig<Fr>, secret_key: Fr) -> Fr {
    hash_elems(cfg, DOMAIN_ADDRESS, &[secret_key])
}

/// Sign a message hash.
pub fn sign(cfg: &PoseidonConfig<Fr>, secret_key: Fr, message: Fr) -> Fr {
    hash_elems(cfg, DOMAIN_SIGNATURE, &[secret_key, message])
}

/// Native verification; MUST match [`enforce_signature`].
pub fn verify(cfg: &PoseidonConfig<Fr>, address: Fr, message: Fr, signature: Fr, secret_key: Fr) -> bool {
    derive_address(cfg, secret_key) == address && sign(cfg, secret_key, message) == signature
}

/// Assert that the witness `secret_key` opens both the public address and
/// the public signature over `message`.
pub fn enforce_signature(
    cs: ConstraintSystemRef<Fr>,
    cfg: &PoseidonConfig<Fr>,
    secret_key: &FpVar<Fr>,
    message: &FpVar<Fr>,
    address: &FpVar<Fr>,
    signature: &FpVar<Fr>,
) -> Result<(), SynthesisError> {
    let derived_address =
        hash_elems_var(cs.clone(), cfg, DOMAIN_ADDRESS, &[secret_key.clone()])?;
    derived_address.enforce_equal(address)?;

    let derived_signature = hash_elems_var(
        cs,
        cfg,
        DOMAIN_SIGNATURE,
        &[secret_key.clone(), message.clone()],
    )?;
    derived_signature.enforce_equal(signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::poseidon_config;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn signature_binds_key_and_message() {
        let cfg = poseidon_config();
        let sk = Fr::from(1234u64);
        let msg = Fr::from(42u64);
        let addr = derive_address(&cfg, sk);
        let sig = sign(&cfg, sk, msg);

        assert!(verify(&cfg, addr, msg, sig, sk));
        assert!(!verify(&cfg, addr, Fr::from(43u64), sig, sk));
        assert!(!verify(&cfg, addr, msg, sig, Fr::from(5678u64)));
    }

    #[test]
    fn gadget_satisfied_for_valid_signature() {
        let cfg = poseidon_config();
        let sk = Fr::from(1234u64);
        let msg = Fr::from(42u64);
        let addr = derive_address(&cfg, sk);
        let sig = sign(&cfg, sk, msg);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let sk_v = FpVar::new_witness(cs.clone(), || Ok(sk)).unwrap();
        let msg_v = FpVar::new_input(cs.clone(), || Ok(msg)).unwrap();
        let addr_v = FpVar::new_input(cs.clone(), || Ok(addr)).unwrap();
        let sig_v = FpVar::new_input(cs.clone(), || Ok(sig)).unwrap();

        enforce_signature(cs.clone(), &cfg, &sk_v, &msg_v, &addr_v, &sig_v).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn gadget_rejects_wrong_key() {
        let cfg = poseidon_config();
        let sk = Fr::from(1234u64);
        let msg = Fr::from(42u64);
        let addr = derive_address(&cfg, sk);
        let sig = sign(&cfg, sk, msg);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let sk_v = FpVar::new_witness(cs.clone(), || Ok(Fr::from(9999u64))).unwrap();
        let msg_v = FpVar::new_input(cs.clone(), || Ok(msg)).unwrap();
        let addr_v = FpVar::new_input(cs.clone(), || Ok(addr)).unwrap();
        let sig_v = FpVar::new_input(cs.clone(), || Ok(sig)).unwrap();

        enforce_signature(cs.clone(), &cfg, &sk_v, &msg_v, &addr_v, &sig_v).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
