//! Bit-decomposition comparison and range gadgets.
//!
//! All comparisons here operate on values already constrained to a fixed bit
//! width, chosen per call site so intermediate sums cannot wrap the field.
//! Range violations are unsatisfiable, never a "soft" failure.

use ark_bn254::Fr;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::fields::fp::FpVar;
use core::ops::Not;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

/// Convert little-endian boolean bits into an FpVar.
pub fn bits_le_to_fp(bits_le: &[Boolean<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    let mut acc = FpVar::<Fr>::constant(Fr::from(0u64));
    let mut coeff = FpVar::<Fr>::constant(Fr::from(1u64));

    for b in bits_le {
        // b ? coeff : 0
        let term = b.select(&coeff, &FpVar::<Fr>::constant(Fr::from(0u64)))?;
        acc += term;
        coeff += coeff.clone();
    }

    Ok(acc)
}

/// Enforce that `v` fits in `n` bits and return its `n` little-endian bits.
pub fn constrain_bits(v: &FpVar<Fr>, n: usize) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
    let bits = v.to_bits_le()?;
    let bits_n = bits[..n].to_vec();
    let reconstructed = bits_le_to_fp(&bits_n)?;
    reconstructed.enforce_equal(v)?;
    Ok(bits_n)
}

/// Boolean gadget: `a <= b` over `n`-bit values.
///
/// Both operands must already be constrained to `n` bits. Computes
/// `d = b - a + 2^n`; bit `n` of `d` is set iff `a <= b`.
pub fn is_leq(a: &FpVar<Fr>, b: &FpVar<Fr>, n: usize) -> Result<Boolean<Fr>, SynthesisError> {
    let shift = FpVar::<Fr>::constant(Fr::from(1u128 << n));
    let d = b - a + shift;
    let bits = constrain_bits(&d, n + 1)?;
    Ok(bits[n].clone())
}

/// Boolean gadget: `a < b` over `n`-bit values.
pub fn is_lt(a: &FpVar<Fr>, b: &FpVar<Fr>, n: usize) -> Result<Boolean<Fr>, SynthesisError> {
    Ok(is_leq(b, a, n)?.not())
}

/// Assert `lo <= v <= hi` for variable bounds.
///
/// Sound when `v`, `lo`, `hi` are all `n`-bit values: both differences must
/// then decompose into `n` bits. Boundary values accept.
pub fn enforce_in_range(
    v: &FpVar<Fr>,
    lo: &FpVar<Fr>,
    hi: &FpVar<Fr>,
    n: usize,
) -> Result<(), SynthesisError> {
    constrain_bits(&(v - lo), n)?;
    constrain_bits(&(hi - v), n)?;
    Ok(())
}

/// Assert an exact Euclidean division: `num == quot * den + rem`, `rem < den`.
///
/// The prover supplies `quot` and `rem` as witnesses; this is how the
/// circuits express means and densities without field division.
pub fn enforce_div(
    num: &FpVar<Fr>,
    den: &FpVar<Fr>,
    quot: &FpVar<Fr>,
    rem: &FpVar<Fr>,
    n: usize,
) -> Result<(), SynthesisError> {
    constrain_bits(quot, n)?;
    constrain_bits(rem, n)?;
    (quot * den + rem).enforce_equal(num)?;
    is_lt(rem, den, n)?.enforce_equal(&Boolean::constant(true))?;
    Ok(())
}

/// `min(a, b)` over `n`-bit values.
pub fn min(a: &FpVar<Fr>, b: &FpVar<Fr>, n: usize) -> Result<FpVar<Fr>, SynthesisError> {
    let le = is_leq(a, b, n)?;
    le.select(a, b)
}
