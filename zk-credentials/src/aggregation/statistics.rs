//! Statistics aggregator.
//!
//! Proves weighted mean and variance over `N` values, flags outliers whose
//! absolute deviation exceeds a public threshold, recomputes a robust mean
//! without them, exposes a scaled third central moment (skew direction and
//! magnitude), an approximate confidence interval from the standard error
//! and a fixed z-multiplier, and a Laplace-style noised sum and count for
//! differential-privacy disclosure. The in-circuit noise term is the
//! deterministic sensitivity/epsilon bound; real sampled noise is applied
//! off-circuit by the privacy pipeline before values reach the packer.
//!
//! All quotients are witnessed and bound with exact Euclidean-division
//! constraints; nothing here divides in the field. Every disclosed output
//! is range-checked against the declared input domain.

use crate::constants::{DOMAIN_CREDENTIAL, EPSILON_SCALE, SCALE, Z95_SCALED};
use crate::error::CircuitError;
use crate::gadgets::compare::{constrain_bits, enforce_div, enforce_in_range, is_leq, is_lt};
use crate::gadgets::hash::{hash_elems, hash_elems_var};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_ff::PrimeField;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use core::ops::Not;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// Bit width for the wide intermediates (weighted cubes of scaled
/// deviations). 96 bits keeps every product far from the field modulus.
const STAT_BITS: usize = 96;

/// One input value with its weight.
#[derive(Clone, Copy, Debug)]
pub struct StatValue {
    pub value: u64,
    pub weight: u64,
    pub active: bool,
}

impl StatValue {
    pub fn empty() -> Self {
        Self {
            value: 0,
            weight: 0,
            active: false,
        }
    }
}

/// Native outputs; MUST match the circuit. All `*_scaled` fields carry two
/// fixed-point decimal places.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsOutputs {
    pub count: u64,
    pub weight_total: u64,
    pub weighted_sum: u64,
    pub mean_scaled: u64,
    pub variance_scaled: u64,
    pub outliers: Vec<bool>,
    pub outlier_count: u64,
    pub robust_mean_scaled: u64,
    pub skew_magnitude: u64,
    pub skew_negative: bool,
    pub ci_half_width: u64,
    pub noise_term: u64,
    pub count_noise_term: u64,
    pub noised_sum: u64,
    pub noised_count: u64,
}

/// Integer square root.
fn isqrt(v: u128) -> u128 {
    if v < 2 {
        return v;
    }
    let mut x = v;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + v / x) / 2;
    }
    x
}

/// Scaled absolute deviation of one value from the mean.
fn deviation_scaled(value: u64, mean_scaled: u64) -> (u64, bool) {
    let scaled = (value as i128) * (SCALE as i128);
    let diff = scaled - mean_scaled as i128;
    (diff.unsigned_abs() as u64, diff >= 0)
}

/// Compute every disclosed statistic natively.
///
/// Fail-fast validation happens here so no proving time is spent on an
/// unsatisfiable witness.
pub fn compute_stats(
    values: &[StatValue],
    value_range: (u64, u64),
    outlier_threshold_scaled: u64,
    epsilon_milli: u64,
    sensitivity: u64,
) -> Result<StatsOutputs, CircuitError> {
    if epsilon_milli == 0 {
        return Err(CircuitError::InvalidWitness(
            "epsilon must be positive".to_string(),
        ));
    }

    let active: Vec<&StatValue> = values.iter().filter(|v| v.active).collect();
    if active.is_empty() {
        return Err(CircuitError::InsufficientWitness("no values to aggregate"));
    }
    for v in &active {
        if v.weight == 0 {
            return Err(CircuitError::InvalidWitness(
                "active value with zero weight".to_string(),
            ));
        }
        if v.value < value_range.0 || v.value > value_range.1 {
            return Err(CircuitError::InputRangeViolation {
                field: "stat_value",
                value: v.value,
                lo: value_range.0,
                hi: value_range.1,
            });
        }
    }

    let count = active.len() as u64;
    let weight_total: u64 = active.iter().map(|v| v.weight).sum();
    let weighted_sum: u64 = active.iter().map(|v| v.weight * v.value).sum();
    let mean_scaled = weighted_sum * SCALE / weight_total;

    // Weighted second central moment of the scaled deviations.
    let var_num: u128 = active
        .iter()
        .map(|v| {
            let (d, _) = deviation_scaled(v.value, mean_scaled);
            (v.weight as u128) * (d as u128) * (d as u128)
        })
        .sum();
    let variance_scaled = (var_num / ((weight_total as u128) * (SCALE as u128))) as u64;

    let outliers: Vec<bool> = values
        .iter()
        .map(|v| {
            v.active && deviation_scaled(v.value, mean_scaled).0 > outlier_threshold_scaled
        })
        .collect();
    let outlier_count = outliers.iter().filter(|o| **o).count() as u64;

    let robust: Vec<&StatValue> = values
        .iter()
        .zip(&outliers)
        .filter(|(v, o)| v.active && !**o)
        .map(|(v, _)| v)
        .collect();
    if robust.is_empty() {
        return Err(CircuitError::InsufficientWitness(
            "every value flagged as an outlier",
        ));
    }
    let robust_weight: u64 = robust.iter().map(|v| v.weight).sum();
    let robust_sum: u64 = robust.iter().map(|v| v.weight * v.value).sum();
    let robust_mean_scaled = robust_sum * SCALE / robust_weight;

    // Signed weighted third central moment.
    let mut m3: i128 = 0;
    for v in &active {
        let (d, positive) = deviation_scaled(v.value, mean_scaled);
        let cube = (v.weight as i128) * (d as i128) * (d as i128) * (d as i128);
        m3 += if positive { cube } else { -cube };
    }
    let skew_den = (weight_total as u128) * (SCALE as u128) * (SCALE as u128);
    let skew_magnitude = (m3.unsigned_abs() / skew_den) as u64;
    let skew_negative = m3 < 0;

    // Standard error and the fixed-z confidence half width.
    let var_over_n = variance_scaled / count;
    let se = isqrt(var_over_n as u128) as u64;
    let ci_half_width = se * Z95_SCALED / SCALE;

    // Deterministic Laplace-scale terms: sensitivity / epsilon for the sum,
    // 1 / epsilon for the count.
    let noise_term = sensitivity * EPSILON_SCALE / epsilon_milli;
    let count_noise_term = EPSILON_SCALE / epsilon_milli;

    Ok(StatsOutputs {
        count,
        weight_total,
        weighted_sum,
        mean_scaled,
        variance_scaled,
        outliers,
        outlier_count,
        robust_mean_scaled,
        skew_magnitude,
        skew_negative,
        ci_half_width,
        noise_term,
        count_noise_term,
        noised_sum: weighted_sum + noise_term,
        noised_count: count + count_noise_term,
    })
}

/// Statistics aggregation circuit over `N` value slots.
#[derive(Clone, Debug)]
pub struct StatsAggregatorCircuit<const N: usize> {
    /// Private values with weights.
    pub values: Vec<StatValue>,
    pub user_address: Fr,
    pub timestamp: u64,

    /// Public declared input domain.
    pub value_range: (u64, u64),
    /// Public outlier threshold on the scaled absolute deviation.
    pub outlier_threshold_scaled: u64,
    /// Public privacy parameters.
    pub epsilon_milli: u64,
    pub sensitivity: u64,
    /// Public disclosed statistics.
    pub outputs: StatsOutputs,
    /// Public: commitment binding user, disclosed values and timestamp.
    pub credential_hash: Fr,
}

impl<const N: usize> StatsAggregatorCircuit<N> {
    /// Pad values to capacity; overflow is rejected, never truncated.
    pub fn pad_values(mut values: Vec<StatValue>) -> Result<Vec<StatValue>, CircuitError> {
        if values.len() > N {
            return Err(CircuitError::CapacityExceeded {
                capacity: N,
                got: values.len(),
            });
        }
        for v in &mut values {
            v.active = true;
        }
        values.resize(N, StatValue::empty());
        Ok(values)
    }

    /// Commitment binding; MUST match the circuit.
    pub fn compute_credential_hash(
        cfg: &PoseidonConfig<Fr>,
        user_address: Fr,
        outputs: &StatsOutputs,
        timestamp: u64,
    ) -> Fr {
        hash_elems(
            cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                Fr::from(outputs.mean_scaled),
                Fr::from(outputs.variance_scaled),
                Fr::from(outputs.robust_mean_scaled),
                Fr::from(outputs.noised_sum),
                Fr::from(outputs.noised_count),
                Fr::from(timestamp),
            ],
        )
    }

    pub fn new(
        cfg: &PoseidonConfig<Fr>,
        values: Vec<StatValue>,
        user_address: Fr,
        value_range: (u64, u64),
        outlier_threshold_scaled: u64,
        epsilon_milli: u64,
        sensitivity: u64,
        timestamp: u64,
    ) -> Result<Self, CircuitError> {
        if values.len() != N {
            return Err(CircuitError::InvalidWitness(format!(
                "expected {N} slots, got {}",
                values.len()
            )));
        }
        let outputs = compute_stats(
            &values,
            value_range,
            outlier_threshold_scaled,
            epsilon_milli,
            sensitivity,
        )?;
        let credential_hash =
            Self::compute_credential_hash(cfg, user_address, &outputs, timestamp);
        Ok(Self {
            values,
            user_address,
            timestamp,
            value_range,
            outlier_threshold_scaled,
            epsilon_milli,
            sensitivity,
            outputs,
            credential_hash,
        })
    }

    /// Satisfiable instance used for key generation.
    pub fn placeholder(cfg: &PoseidonConfig<Fr>) -> Self {
        let values = Self::pad_values(vec![
            StatValue { value: 10, weight: 1, active: true },
            StatValue { value: 12, weight: 1, active: true },
        ])
        .expect("placeholder fits");
        Self::new(cfg, values, Fr::from(1u64), (0, 100), 10_000, 1000, 1, 0)
            .expect("placeholder instance")
    }

    /// Public-input vector; ORDERING MUST MATCH the circuit's `new_input`
    /// allocation order.
    pub fn public_inputs(&self) -> Vec<Fr> {
        let o = &self.outputs;
        vec![
            Fr::from(o.count),
            Fr::from(self.value_range.0),
            Fr::from(self.value_range.1),
            Fr::from(o.mean_scaled),
            Fr::from(o.variance_scaled),
            Fr::from(self.outlier_threshold_scaled),
            Fr::from(o.outlier_count),
            Fr::from(o.robust_mean_scaled),
            Fr::from(o.skew_magnitude),
            Fr::from(o.skew_negative as u64),
            Fr::from(o.ci_half_width),
            Fr::from(self.epsilon_milli),
            Fr::from(self.sensitivity),
            Fr::from(o.noised_sum),
            Fr::from(o.noised_count),
            self.credential_hash,
        ]
    }
}

impl<const N: usize> ConstraintSynthesizer<Fr> for StatsAggregatorCircuit<N> {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        if self.values.len() != N {
            return Err(SynthesisError::Unsatisfiable);
        }
        let cfg = crate::constants::poseidon_config();
        let zero = FpVar::<Fr>::constant(Fr::from(0u64));
        let one = FpVar::<Fr>::constant(Fr::from(1u64));
        let scale = FpVar::<Fr>::constant(Fr::from(SCALE));
        let o = &self.outputs;

        // --- Public inputs ---
        let public_count = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(o.count)))?;
        let min_value = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.value_range.0)))?;
        let max_value = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.value_range.1)))?;
        let public_mean = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(o.mean_scaled)))?;
        let public_variance =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(o.variance_scaled)))?;
        let threshold =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.outlier_threshold_scaled)))?;
        let public_outliers =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(o.outlier_count)))?;
        let public_robust =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(o.robust_mean_scaled)))?;
        let public_skew_mag =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(o.skew_magnitude)))?;
        let public_skew_neg =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(o.skew_negative as u64)))?;
        let public_ci = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(o.ci_half_width)))?;
        let epsilon = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.epsilon_milli)))?;
        let sensitivity = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.sensitivity)))?;
        let public_noised_sum = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(o.noised_sum)))?;
        let public_noised_count =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(o.noised_count)))?;
        let credential_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.credential_hash))?;

        // --- Witness ---
        let user_address = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.user_address))?;
        let timestamp = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(self.timestamp)))?;

        let mut count_sum = zero.clone();
        let mut weight_sum = zero.clone();
        let mut value_sum = zero.clone();
        let mut var_num = zero.clone();
        let mut m3_signed = zero.clone();
        let mut outlier_sum = zero.clone();
        let mut robust_weight = zero.clone();
        let mut robust_sum = zero.clone();

        for v in &self.values {
            let value = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(v.value)))?;
            let weight = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(v.weight)))?;
            let active = Boolean::new_witness(cs.clone(), || Ok(v.active))?;

            constrain_bits(&value, STAT_BITS)?;
            constrain_bits(&weight, STAT_BITS)?;

            let active_fp = active.select(&one, &zero)?;
            let absent = &one - &active_fp;
            (&absent * &value).enforce_equal(&zero)?;
            (&absent * &weight).enforce_equal(&zero)?;

            // Active weights are positive; every active value sits in the
            // declared domain (inactive slots borrow the minimum so the
            // range check is vacuous for them).
            let w_ok = is_leq(&one, &weight, STAT_BITS)?;
            (&active & &w_ok.not()).enforce_equal(&Boolean::constant(false))?;
            let range_probe = active.select(&value, &min_value)?;
            enforce_in_range(&range_probe, &min_value, &max_value, STAT_BITS)?;

            count_sum += &active_fp;
            weight_sum += &active_fp * &weight;
            value_sum += &weight * &value; // inactive values are zeroed

            // Signed deviation of the scaled value from the mean, split
            // into witnessed magnitude and sign.
            let (dev_val, dev_pos) = if v.active {
                let scaled = (v.value as i128) * (SCALE as i128);
                let diff = scaled - o.mean_scaled as i128;
                (diff.unsigned_abs() as u64, diff >= 0)
            } else {
                (0, true)
            };
            let dev = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(dev_val)))?;
            let positive = Boolean::new_witness(cs.clone(), || Ok(dev_pos))?;
            constrain_bits(&dev, STAT_BITS)?;

            let diff = active.select(&(&value * &scale - &public_mean), &zero)?;
            let signed_dev = positive.select(&dev, &(zero.clone() - &dev))?;
            signed_dev.enforce_equal(&diff)?;

            var_num += &weight * &dev * &dev;

            let cube = &weight * &dev * &dev * &dev;
            let signed_cube = positive.select(&cube, &(zero.clone() - &cube))?;
            m3_signed += signed_cube;

            // Outlier: active and deviation strictly beyond the threshold.
            let beyond = is_lt(&threshold, &dev, STAT_BITS)?;
            let outlier = &active & &beyond;
            outlier_sum += outlier.select(&one, &zero)?;

            let keep = &active & &outlier.not();
            let keep_fp = keep.select(&one, &zero)?;
            robust_weight += &keep_fp * &weight;
            robust_sum += &keep_fp * &weight * &value;
        }

        count_sum.enforce_equal(&public_count)?;
        is_leq(&one, &public_count, STAT_BITS)?.enforce_equal(&Boolean::constant(true))?;
        outlier_sum.enforce_equal(&public_outliers)?;

        // Mean binding: weighted_sum * SCALE = mean * W + rem.
        let mean_rem = FpVar::<Fr>::new_witness(cs.clone(), || {
            Ok(Fr::from(o.weighted_sum * SCALE % o.weight_total))
        })?;
        enforce_div(
            &(&value_sum * &scale),
            &weight_sum,
            &public_mean,
            &mean_rem,
            STAT_BITS,
        )?;

        // Variance binding: var_num = variance * (W * SCALE) + rem.
        let var_den_native = (o.weight_total as u128) * (SCALE as u128);
        let var_num_native: u128 = self
            .values
            .iter()
            .filter(|v| v.active)
            .map(|v| {
                let (d, _) = deviation_scaled(v.value, o.mean_scaled);
                (v.weight as u128) * (d as u128) * (d as u128)
            })
            .sum();
        let var_rem = FpVar::<Fr>::new_witness(cs.clone(), || {
            Ok(Fr::from(var_num_native % var_den_native))
        })?;
        let var_den = &weight_sum * &scale;
        enforce_div(&var_num, &var_den, &public_variance, &var_rem, STAT_BITS)?;

        // Robust mean binding over the kept values.
        is_leq(&one, &robust_weight, STAT_BITS)?.enforce_equal(&Boolean::constant(true))?;
        let robust_sum_native: u64 = self
            .values
            .iter()
            .zip(&o.outliers)
            .filter(|(v, out)| v.active && !**out)
            .map(|(v, _)| v.weight * v.value)
            .sum();
        let robust_weight_native: u64 = self
            .values
            .iter()
            .zip(&o.outliers)
            .filter(|(v, out)| v.active && !**out)
            .map(|(v, _)| v.weight)
            .sum();
        let robust_rem = FpVar::<Fr>::new_witness(cs.clone(), || {
            Ok(Fr::from(robust_sum_native * SCALE % robust_weight_native))
        })?;
        enforce_div(
            &(&robust_sum * &scale),
            &robust_weight,
            &public_robust,
            &robust_rem,
            STAT_BITS,
        )?;

        // Skew binding: |m3| = skew_mag * (W * SCALE^2) + rem, sign split.
        let m3_native: i128 = self
            .values
            .iter()
            .filter(|v| v.active)
            .map(|v| {
                let (d, positive) = deviation_scaled(v.value, o.mean_scaled);
                let cube = (v.weight as i128) * (d as i128) * (d as i128) * (d as i128);
                if positive { cube } else { -cube }
            })
            .sum();
        let skew_den_native = (o.weight_total as u128) * (SCALE as u128) * (SCALE as u128);
        let m3_mag = FpVar::<Fr>::new_witness(cs.clone(), || {
            Ok(Fr::from_le_bytes_mod_order(&m3_native.unsigned_abs().to_le_bytes()))
        })?;
        constrain_bits(&m3_mag, STAT_BITS)?;
        let neg = Boolean::new_witness(cs.clone(), || Ok(m3_native < 0))?;
        let signed_m3 = neg.select(&(zero.clone() - &m3_mag), &m3_mag)?;
        signed_m3.enforce_equal(&m3_signed)?;
        // The public sign bit is boolean and matches the witness sign.
        (&public_skew_neg * (&public_skew_neg - &one)).enforce_equal(&zero)?;
        neg.select(&one, &zero)?.enforce_equal(&public_skew_neg)?;

        let skew_rem = FpVar::<Fr>::new_witness(cs.clone(), || {
            Ok(Fr::from_le_bytes_mod_order(
                &(m3_native.unsigned_abs() % skew_den_native).to_le_bytes(),
            ))
        })?;
        let skew_den = &weight_sum * &scale * &scale;
        enforce_div(&m3_mag, &skew_den, &public_skew_mag, &skew_rem, STAT_BITS)?;

        // Confidence interval: se = isqrt(variance / count), half width
        // se * z / 100.
        let von_val = o.variance_scaled / o.count;
        let var_over_n = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(von_val)))?;
        let von_rem =
            FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(o.variance_scaled % o.count)))?;
        enforce_div(&public_variance, &public_count, &var_over_n, &von_rem, STAT_BITS)?;

        let se_val = isqrt(von_val as u128) as u64;
        let se = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(se_val)))?;
        constrain_bits(&se, STAT_BITS)?;
        let se_sq = &se * &se;
        let next_sq = (&se + &one) * (&se + &one);
        is_leq(&se_sq, &var_over_n, STAT_BITS)?.enforce_equal(&Boolean::constant(true))?;
        is_lt(&var_over_n, &next_sq, STAT_BITS)?.enforce_equal(&Boolean::constant(true))?;

        let ci_rem =
            FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(se_val * Z95_SCALED % SCALE)))?;
        let z = FpVar::<Fr>::constant(Fr::from(Z95_SCALED));
        enforce_div(&(&se * &z), &scale, &public_ci, &ci_rem, STAT_BITS)?;

        // Deterministic DP terms: noise = sensitivity * 1000 / epsilon_milli,
        // count noise with sensitivity 1.
        is_leq(&one, &epsilon, STAT_BITS)?.enforce_equal(&Boolean::constant(true))?;
        let eps_unit = FpVar::<Fr>::constant(Fr::from(EPSILON_SCALE));
        let noise = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(o.noise_term)))?;
        let noise_rem = FpVar::<Fr>::new_witness(cs.clone(), || {
            Ok(Fr::from(self.sensitivity * EPSILON_SCALE % self.epsilon_milli))
        })?;
        enforce_div(&(&sensitivity * &eps_unit), &epsilon, &noise, &noise_rem, STAT_BITS)?;
        (&value_sum + &noise).enforce_equal(&public_noised_sum)?;

        let count_noise =
            FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(o.count_noise_term)))?;
        let count_noise_rem = FpVar::<Fr>::new_witness(cs.clone(), || {
            Ok(Fr::from(EPSILON_SCALE % self.epsilon_milli))
        })?;
        enforce_div(&eps_unit, &epsilon, &count_noise, &count_noise_rem, STAT_BITS)?;
        (&public_count + &count_noise).enforce_equal(&public_noised_count)?;

        // Disclosed outputs stay inside the declared input domain.
        let min_scaled = &min_value * &scale;
        let max_scaled = &max_value * &scale;
        enforce_in_range(&public_mean, &min_scaled, &max_scaled, STAT_BITS)?;
        enforce_in_range(&public_robust, &min_scaled, &max_scaled, STAT_BITS)?;
        let spread = &max_value - &min_value;
        let var_bound = &spread * &spread * &scale;
        is_leq(&public_variance, &var_bound, STAT_BITS)?
            .enforce_equal(&Boolean::constant(true))?;

        let commitment = hash_elems_var(
            cs,
            &cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                public_mean,
                public_variance,
                public_robust,
                public_noised_sum,
                public_noised_count,
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

    type TestCircuit = StatsAggregatorCircuit<16>;

    /// Scenario: ten LOC values, one of them 10x the others.
    fn skewed_values() -> Vec<StatValue> {
        let mut v: Vec<StatValue> = (0..9)
            .map(|_| StatValue { value: 100, weight: 1, active: true })
            .collect();
        v.push(StatValue { value: 1000, weight: 1, active: true });
        TestCircuit::pad_values(v).unwrap()
    }

    #[test]
    fn one_outlier_flagged_and_robust_mean_moves() {
        // mean = 190, deviations (scaled): 9000 for the nine, 81000 for the
        // spike; sd ~= 270 so a 3-sd-equivalent threshold sits at 81000.
        let out = compute_stats(&skewed_values(), (0, 2000), 80_000, 2_000, 10).unwrap();
        assert_eq!(out.mean_scaled, 19_000);
        assert_eq!(out.outlier_count, 1);
        assert_eq!(out.robust_mean_scaled, 10_000);
        // Robust mean differs from the unfiltered mean by well over 5%.
        let diff = out.mean_scaled - out.robust_mean_scaled;
        assert!(diff * 100 > out.mean_scaled * 5);
        // The spike pulls the third moment positive.
        assert!(!out.skew_negative);
        assert!(out.skew_magnitude > 0);
    }

    #[test]
    fn laplace_terms_follow_sensitivity_over_epsilon() {
        let out = compute_stats(&skewed_values(), (0, 2000), 80_000, 2_000, 10).unwrap();
        // sensitivity 10, epsilon 2.0: term = 10 * 1000 / 2000 = 5.
        assert_eq!(out.noise_term, 5);
        assert_eq!(out.noised_sum, out.weighted_sum + 5);
        assert_eq!(out.noised_count, out.count + 0);
    }

    #[test]
    fn circuit_satisfied_for_valid_stats() {
        let cfg = poseidon_config();
        let circuit = TestCircuit::new(
            &cfg,
            skewed_values(),
            Fr::from(7u64),
            (0, 2000),
            80_000,
            2_000,
            10,
            1700000000,
        )
        .unwrap();
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn tampered_mean_unsatisfiable() {
        let cfg = poseidon_config();
        let mut circuit = TestCircuit::new(
            &cfg,
            skewed_values(),
            Fr::from(7u64),
            (0, 2000),
            80_000,
            2_000,
            10,
            0,
        )
        .unwrap();
        circuit.outputs.mean_scaled += 1;
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn value_outside_domain_fails_fast() {
        let mut values = skewed_values();
        values[0].value = 5000;
        let err = compute_stats(&values, (0, 2000), 80_000, 2_000, 10).unwrap_err();
        assert!(matches!(err, CircuitError::InputRangeViolation { .. }));
    }

    #[test]
    fn zero_epsilon_rejected() {
        let err = compute_stats(&skewed_values(), (0, 2000), 80_000, 0, 10).unwrap_err();
        assert!(matches!(err, CircuitError::InvalidWitness(_)));
    }

    #[test]
    fn empty_input_rejected() {
        let err = compute_stats(&[StatValue::empty(); 4], (0, 2000), 80_000, 1_000, 1)
            .unwrap_err();
        assert!(matches!(err, CircuitError::InsufficientWitness(_)));
    }

    #[test]
    fn isqrt_brackets() {
        for v in [0u128, 1, 2, 3, 4, 15, 16, 17, 72_900] {
            let s = isqrt(v);
            assert!(s * s <= v);
            assert!((s + 1) * (s + 1) > v);
        }
    }
}
