//! Diversity credential.
//!
//! Seven dimensions (languages, technologies, project types, domains,
//! contribution types, architectural patterns, team-size variety). Breadth
//! is the category count normalized by a fixed per-dimension capacity;
//! depth is the average per-category score. Fixed weights combine the
//! per-dimension values into breadth/depth indices and the overall
//! diversity index. Validity requires at least two languages, at least two
//! technologies, and all three indices to clear their public thresholds.

use crate::constants::{
    DIVERSITY_BREADTH_WEIGHT, DIVERSITY_DEPTH_WEIGHT, DIVERSITY_DIMENSION_CAPACITY,
    DIVERSITY_DIMENSION_WEIGHTS, DOMAIN_CREDENTIAL, NUM_DIVERSITY_DIMENSIONS, RANGE_BITS, SCALE,
};
use crate::error::CircuitError;
use crate::gadgets::compare::{constrain_bits, enforce_div, is_leq, min};
use crate::gadgets::hash::{hash_elems, hash_elems_var};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

pub const DIM_LANGUAGES: usize = 0;
pub const DIM_TECHNOLOGIES: usize = 1;

/// One diversity dimension: distinct category count and summed 0–100
/// per-category scores.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiversityDimension {
    pub categories: u64,
    pub score_sum: u64,
}

/// Breadth of one dimension: count / capacity as a 0–100 score.
pub fn dimension_breadth(dim: &DiversityDimension) -> u64 {
    (dim.categories * (SCALE / DIVERSITY_DIMENSION_CAPACITY)).min(SCALE)
}

/// Depth of one dimension: average per-category score (0 when empty).
pub fn dimension_depth(dim: &DiversityDimension) -> u64 {
    if dim.categories == 0 {
        0
    } else {
        dim.score_sum / dim.categories
    }
}

/// Native index computation; MUST match the circuit.
pub fn diversity_indices(
    dims: &[DiversityDimension; NUM_DIVERSITY_DIMENSIONS],
) -> (u64, u64, u64) {
    let breadth_raw: u64 = dims
        .iter()
        .zip(DIVERSITY_DIMENSION_WEIGHTS)
        .map(|(d, w)| dimension_breadth(d) * w)
        .sum();
    let depth_raw: u64 = dims
        .iter()
        .zip(DIVERSITY_DIMENSION_WEIGHTS)
        .map(|(d, w)| dimension_depth(d) * w)
        .sum();
    let breadth = breadth_raw / SCALE;
    let depth = depth_raw / SCALE;
    let diversity = (DIVERSITY_BREADTH_WEIGHT * breadth + DIVERSITY_DEPTH_WEIGHT * depth) / SCALE;
    (breadth, depth, diversity)
}

#[derive(Clone, Debug)]
pub struct DiversityCredentialCircuit {
    /// Private dimensions in canonical order.
    pub dimensions: [DiversityDimension; NUM_DIVERSITY_DIMENSIONS],
    pub user_address: Fr,
    pub timestamp: u64,

    /// Public indices.
    pub breadth_index: u64,
    pub depth_index: u64,
    pub diversity_index: u64,
    /// Public thresholds.
    pub min_breadth: u64,
    pub min_depth: u64,
    pub min_diversity: u64,
    /// Public: commitment binding user, indices and timestamp.
    pub credential_hash: Fr,
}

impl DiversityCredentialCircuit {
    /// Commitment binding; MUST match the circuit.
    pub fn compute_credential_hash(
        cfg: &PoseidonConfig<Fr>,
        user_address: Fr,
        breadth: u64,
        depth: u64,
        diversity: u64,
        timestamp: u64,
    ) -> Fr {
        hash_elems(
            cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                Fr::from(breadth),
                Fr::from(depth),
                Fr::from(diversity),
                Fr::from(timestamp),
            ],
        )
    }

    pub fn new(
        cfg: &PoseidonConfig<Fr>,
        dimensions: [DiversityDimension; NUM_DIVERSITY_DIMENSIONS],
        user_address: Fr,
        min_breadth: u64,
        min_depth: u64,
        min_diversity: u64,
        timestamp: u64,
    ) -> Result<Self, CircuitError> {
        for (i, d) in dimensions.iter().enumerate() {
            if d.score_sum > SCALE * d.categories {
                return Err(CircuitError::InvalidWitness(format!(
                    "dimension {i}: score sum {} exceeds {} categories at 100 each",
                    d.score_sum, d.categories
                )));
            }
        }
        if dimensions[DIM_LANGUAGES].categories < 2 {
            return Err(CircuitError::InsufficientWitness("fewer than two languages"));
        }
        if dimensions[DIM_TECHNOLOGIES].categories < 2 {
            return Err(CircuitError::InsufficientWitness(
                "fewer than two technologies",
            ));
        }

        let (breadth, depth, diversity) = diversity_indices(&dimensions);
        for (name, value, floor) in [
            ("breadth_index", breadth, min_breadth),
            ("depth_index", depth, min_depth),
            ("diversity_index", diversity, min_diversity),
        ] {
            if value < floor {
                return Err(CircuitError::InputRangeViolation {
                    field: name,
                    value,
                    lo: floor,
                    hi: u64::MAX,
                });
            }
        }

        let credential_hash = Self::compute_credential_hash(
            cfg,
            user_address,
            breadth,
            depth,
            diversity,
            timestamp,
        );
        Ok(Self {
            dimensions,
            user_address,
            timestamp,
            breadth_index: breadth,
            depth_index: depth,
            diversity_index: diversity,
            min_breadth,
            min_depth,
            min_diversity,
            credential_hash,
        })
    }

    /// Satisfiable instance used for key generation.
    pub fn placeholder(cfg: &PoseidonConfig<Fr>) -> Self {
        let dim = DiversityDimension {
            categories: 2,
            score_sum: 100,
        };
        Self::new(
            cfg,
            [dim; NUM_DIVERSITY_DIMENSIONS],
            Fr::from(1u64),
            0,
            0,
            0,
            0,
        )
        .expect("placeholder instance")
    }

    /// Public-input vector; ORDERING MUST MATCH the circuit's `new_input`
    /// allocation order.
    pub fn public_inputs(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.breadth_index),
            Fr::from(self.depth_index),
            Fr::from(self.diversity_index),
            Fr::from(self.min_breadth),
            Fr::from(self.min_depth),
            Fr::from(self.min_diversity),
            self.credential_hash,
        ]
    }
}

impl ConstraintSynthesizer<Fr> for DiversityCredentialCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let cfg = crate::constants::poseidon_config();
        let zero = FpVar::<Fr>::constant(Fr::from(0u64));
        let one = FpVar::<Fr>::constant(Fr::from(1u64));
        let two = FpVar::<Fr>::constant(Fr::from(2u64));
        let hundred = FpVar::<Fr>::constant(Fr::from(SCALE));

        // --- Public inputs ---
        let public_breadth =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.breadth_index)))?;
        let public_depth = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.depth_index)))?;
        let public_diversity =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.diversity_index)))?;
        let min_breadth = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.min_breadth)))?;
        let min_depth = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.min_depth)))?;
        let min_diversity =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.min_diversity)))?;
        let credential_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.credential_hash))?;

        // --- Witness ---
        let user_address = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.user_address))?;
        let timestamp = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(self.timestamp)))?;

        let breadth_unit = FpVar::<Fr>::constant(Fr::from(SCALE / DIVERSITY_DIMENSION_CAPACITY));

        let mut breadth_sum = zero.clone();
        let mut depth_sum = zero.clone();
        let mut counts = Vec::with_capacity(NUM_DIVERSITY_DIMENSIONS);
        for (i, d) in self.dimensions.iter().enumerate() {
            let count = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(d.categories)))?;
            let score_sum = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(d.score_sum)))?;
            constrain_bits(&count, RANGE_BITS)?;
            constrain_bits(&score_sum, RANGE_BITS)?;

            // Per-category scores are 0–100, so the sum caps at 100*count.
            let cap = &count * &hundred;
            is_leq(&score_sum, &cap, RANGE_BITS)?.enforce_equal(&Boolean::constant(true))?;

            let breadth = min(&(&count * &breadth_unit), &hundred, RANGE_BITS)?;

            // depth = score_sum / count, vacuously zero for an empty
            // dimension (divide by 1 against a zeroed numerator).
            let empty = count.is_eq(&zero)?;
            let den = empty.select(&one, &count)?;
            let num = empty.select(&zero, &score_sum)?;
            let depth_val = dimension_depth(d);
            let depth = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(depth_val)))?;
            let rem = FpVar::<Fr>::new_witness(cs.clone(), || {
                Ok(Fr::from(if d.categories == 0 {
                    0
                } else {
                    d.score_sum % d.categories
                }))
            })?;
            enforce_div(&num, &den, &depth, &rem, RANGE_BITS)?;

            let weight = FpVar::<Fr>::constant(Fr::from(DIVERSITY_DIMENSION_WEIGHTS[i]));
            breadth_sum += &breadth * &weight;
            depth_sum += &depth * &weight;
            counts.push(count);
        }

        // Indices are the weighted sums scaled back down by 100.
        let (breadth_idx, depth_idx, _) = diversity_indices(&self.dimensions);
        let breadth_rem = FpVar::<Fr>::new_witness(cs.clone(), || {
            Ok(Fr::from(breadth_weighted_raw(&self.dimensions) % SCALE))
        })?;
        enforce_div(&breadth_sum, &hundred, &public_breadth, &breadth_rem, RANGE_BITS)?;

        let depth_rem = FpVar::<Fr>::new_witness(cs.clone(), || {
            Ok(Fr::from(depth_weighted_raw(&self.dimensions) % SCALE))
        })?;
        enforce_div(&depth_sum, &hundred, &public_depth, &depth_rem, RANGE_BITS)?;

        let combined = &public_breadth * FpVar::constant(Fr::from(DIVERSITY_BREADTH_WEIGHT))
            + &public_depth * FpVar::constant(Fr::from(DIVERSITY_DEPTH_WEIGHT));
        let combined_raw =
            DIVERSITY_BREADTH_WEIGHT * breadth_idx + DIVERSITY_DEPTH_WEIGHT * depth_idx;
        let combined_rem =
            FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(combined_raw % SCALE)))?;
        enforce_div(&combined, &hundred, &public_diversity, &combined_rem, RANGE_BITS)?;

        // Validity: two languages, two technologies, all indices clear
        // their thresholds.
        is_leq(&two, &counts[DIM_LANGUAGES], RANGE_BITS)?
            .enforce_equal(&Boolean::constant(true))?;
        is_leq(&two, &counts[DIM_TECHNOLOGIES], RANGE_BITS)?
            .enforce_equal(&Boolean::constant(true))?;
        is_leq(&min_breadth, &public_breadth, RANGE_BITS)?
            .enforce_equal(&Boolean::constant(true))?;
        is_leq(&min_depth, &public_depth, RANGE_BITS)?
            .enforce_equal(&Boolean::constant(true))?;
        is_leq(&min_diversity, &public_diversity, RANGE_BITS)?
            .enforce_equal(&Boolean::constant(true))?;

        let commitment = hash_elems_var(
            cs,
            &cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                public_breadth,
                public_depth,
                public_diversity,
                timestamp,
            ],
        )?;
        commitment.enforce_equal(&credential_hash)?;

        Ok(())
    }
}

fn breadth_weighted_raw(dims: &[DiversityDimension; NUM_DIVERSITY_DIMENSIONS]) -> u64 {
    dims.iter()
        .zip(DIVERSITY_DIMENSION_WEIGHTS)
        .map(|(d, w)| dimension_breadth(d) * w)
        .sum()
}

fn depth_weighted_raw(dims: &[DiversityDimension; NUM_DIVERSITY_DIMENSIONS]) -> u64 {
    dims.iter()
        .zip(DIVERSITY_DIMENSION_WEIGHTS)
        .map(|(d, w)| dimension_depth(d) * w)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::poseidon_config;
    use ark_relations::r1cs::ConstraintSystem;

    fn dims() -> [DiversityDimension; NUM_DIVERSITY_DIMENSIONS] {
        [
            DiversityDimension { categories: 4, score_sum: 280 }, // languages
            DiversityDimension { categories: 5, score_sum: 300 }, // technologies
            DiversityDimension { categories: 3, score_sum: 210 }, // project types
            DiversityDimension { categories: 2, score_sum: 160 }, // domains
            DiversityDimension { categories: 3, score_sum: 150 }, // contribution types
            DiversityDimension { categories: 2, score_sum: 120 }, // architecture
            DiversityDimension { categories: 1, score_sum: 60 },  // team sizes
        ]
    }

    fn satisfied(circuit: DiversityCredentialCircuit) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn valid_credential_satisfies() {
        let cfg = poseidon_config();
        let circuit =
            DiversityCredentialCircuit::new(&cfg, dims(), Fr::from(7u64), 10, 30, 20, 1700000000)
                .unwrap();
        assert!(satisfied(circuit));
    }

    #[test]
    fn single_language_fails_fast() {
        let cfg = poseidon_config();
        let mut d = dims();
        d[DIM_LANGUAGES].categories = 1;
        d[DIM_LANGUAGES].score_sum = 80;
        let err = DiversityCredentialCircuit::new(&cfg, d, Fr::from(7u64), 0, 0, 0, 0).unwrap_err();
        assert!(matches!(err, CircuitError::InsufficientWitness(_)));
    }

    #[test]
    fn single_language_unsatisfiable_in_circuit() {
        let cfg = poseidon_config();
        let mut circuit =
            DiversityCredentialCircuit::new(&cfg, dims(), Fr::from(7u64), 0, 0, 0, 0).unwrap();
        circuit.dimensions[DIM_LANGUAGES].categories = 1;
        circuit.dimensions[DIM_LANGUAGES].score_sum = 80;
        assert!(!satisfied(circuit));
    }

    #[test]
    fn empty_dimension_contributes_zero_depth() {
        let d = DiversityDimension::default();
        assert_eq!(dimension_depth(&d), 0);
        assert_eq!(dimension_breadth(&d), 0);
    }

    #[test]
    fn indices_match_hand_computation() {
        let (breadth, depth, diversity) = diversity_indices(&dims());
        // breadth: (40*20 + 50*18 + 30*15 + 20*13 + 30*12 + 20*12 + 10*10) / 100
        assert_eq!(breadth, (800 + 900 + 450 + 260 + 360 + 240 + 100) / 100);
        // depth: (70*20 + 60*18 + 70*15 + 80*13 + 50*12 + 60*12 + 60*10) / 100
        assert_eq!(depth, (1400 + 1080 + 1050 + 1040 + 600 + 720 + 600) / 100);
        assert_eq!(diversity, (60 * breadth + 40 * depth) / 100);
    }
}
