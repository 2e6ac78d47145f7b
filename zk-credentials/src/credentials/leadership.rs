//! Leadership credential.
//!
//! Seven weighted dimensions (mentoring, architecture decisions, code
//! review, projects led, team interactions, innovations, community
//! contributions). Each activity scores 0–10; per-dimension points cap at a
//! 0–100 score; the weighted index is scaled by a tenure multiplier with
//! flat bonus tiers at 5/10/15 years. The weights and tiers are behavioral
//! contracts carried over from the product definition.
//!
//! Validity requires the adjusted index, the impact score and the tenure to
//! clear their public thresholds, plus at least one led project and one
//! mentoring activity.

use crate::constants::{
    tenure_multiplier, DOMAIN_CREDENTIAL, LEADERSHIP_WEIGHTS, NUM_LEADERSHIP_DIMENSIONS,
    NUM_MATURITY_INDICATORS, RANGE_BITS, SCALE,
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

/// Dimension indices, fixed by [`LEADERSHIP_WEIGHTS`] order.
pub const DIM_MENTORING: usize = 0;
pub const DIM_PROJECTS_LED: usize = 3;
pub const DIM_INNOVATIONS: usize = 5;
pub const DIM_COMMUNITY: usize = 6;

/// One leadership dimension: activity count and summed 0–10 activity points.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeadershipDimension {
    pub activities: u64,
    pub points: u64,
}

/// Per-dimension score: summed points capped at 100.
pub fn dimension_score(dim: &LeadershipDimension) -> u64 {
    dim.points.min(SCALE)
}

/// Weighted index before the tenure multiplier.
pub fn weighted_index(scores: &[u64; NUM_LEADERSHIP_DIMENSIONS]) -> u64 {
    let raw: u64 = scores
        .iter()
        .zip(LEADERSHIP_WEIGHTS)
        .map(|(s, w)| s * w)
        .sum();
    raw / SCALE
}

/// Impact contract: led projects, innovations and community work, capped.
pub fn impact_score(dims: &[LeadershipDimension; NUM_LEADERSHIP_DIMENSIONS]) -> u64 {
    (10 * dims[DIM_PROJECTS_LED].activities
        + 15 * dims[DIM_INNOVATIONS].activities
        + 5 * dims[DIM_COMMUNITY].activities)
        .min(SCALE)
}

/// Maturity level 1–5 from the five boolean indicators.
pub fn maturity_level(indicators: &[bool; NUM_MATURITY_INDICATORS]) -> u64 {
    let count = indicators.iter().filter(|b| **b).count() as u64;
    count.max(1)
}

#[derive(Clone, Debug)]
pub struct LeadershipCredentialCircuit {
    /// Private: per-dimension activity counts and summed points.
    pub dimensions: [LeadershipDimension; NUM_LEADERSHIP_DIMENSIONS],
    /// Private: tenure in years.
    pub tenure_years: u64,
    /// Private: maturity indicators.
    pub maturity_indicators: [bool; NUM_MATURITY_INDICATORS],
    pub user_address: Fr,
    pub timestamp: u64,

    /// Public: per-dimension scores 0–100.
    pub dimension_scores: [u64; NUM_LEADERSHIP_DIMENSIONS],
    /// Public: tenure-adjusted weighted index.
    pub leadership_index: u64,
    /// Public: impact score 0–100.
    pub impact_score: u64,
    /// Public: maturity level 1–5.
    pub maturity_level: u64,
    /// Public thresholds the credential must clear.
    pub min_index: u64,
    pub min_impact: u64,
    pub min_tenure: u64,
    /// Public: commitment binding user, outputs and timestamp.
    pub credential_hash: Fr,
}

impl LeadershipCredentialCircuit {
    /// Commitment binding; MUST match the circuit.
    pub fn compute_credential_hash(
        cfg: &PoseidonConfig<Fr>,
        user_address: Fr,
        leadership_index: u64,
        impact: u64,
        maturity: u64,
        timestamp: u64,
    ) -> Fr {
        hash_elems(
            cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                Fr::from(leadership_index),
                Fr::from(impact),
                Fr::from(maturity),
                Fr::from(timestamp),
            ],
        )
    }

    /// Build a complete instance; fail-fast when a threshold cannot be met.
    pub fn new(
        cfg: &PoseidonConfig<Fr>,
        dimensions: [LeadershipDimension; NUM_LEADERSHIP_DIMENSIONS],
        tenure_years: u64,
        maturity_indicators: [bool; NUM_MATURITY_INDICATORS],
        user_address: Fr,
        min_index: u64,
        min_impact: u64,
        min_tenure: u64,
        timestamp: u64,
    ) -> Result<Self, CircuitError> {
        for (i, d) in dimensions.iter().enumerate() {
            // Each activity scores at most 10 points.
            if d.points > 10 * d.activities {
                return Err(CircuitError::InvalidWitness(format!(
                    "dimension {i}: {} points for {} activities",
                    d.points, d.activities
                )));
            }
        }
        if dimensions[DIM_PROJECTS_LED].activities == 0 {
            return Err(CircuitError::InsufficientWitness("no led projects"));
        }
        if dimensions[DIM_MENTORING].activities == 0 {
            return Err(CircuitError::InsufficientWitness("no mentoring activity"));
        }

        let mut scores = [0u64; NUM_LEADERSHIP_DIMENSIONS];
        for (s, d) in scores.iter_mut().zip(&dimensions) {
            *s = dimension_score(d);
        }
        let index = weighted_index(&scores) * tenure_multiplier(tenure_years) / SCALE;
        let impact = impact_score(&dimensions);
        let maturity = maturity_level(&maturity_indicators);

        if index < min_index {
            return Err(CircuitError::InputRangeViolation {
                field: "leadership_index",
                value: index,
                lo: min_index,
                hi: u64::MAX,
            });
        }
        if impact < min_impact {
            return Err(CircuitError::InputRangeViolation {
                field: "impact_score",
                value: impact,
                lo: min_impact,
                hi: u64::MAX,
            });
        }
        if tenure_years < min_tenure {
            return Err(CircuitError::InputRangeViolation {
                field: "tenure_years",
                value: tenure_years,
                lo: min_tenure,
                hi: u64::MAX,
            });
        }

        let credential_hash =
            Self::compute_credential_hash(cfg, user_address, index, impact, maturity, timestamp);
        Ok(Self {
            dimensions,
            tenure_years,
            maturity_indicators,
            user_address,
            timestamp,
            dimension_scores: scores,
            leadership_index: index,
            impact_score: impact,
            maturity_level: maturity,
            min_index,
            min_impact,
            min_tenure,
            credential_hash,
        })
    }

    /// Satisfiable instance used for key generation.
    pub fn placeholder(cfg: &PoseidonConfig<Fr>) -> Self {
        let dim = LeadershipDimension {
            activities: 1,
            points: 5,
        };
        Self::new(
            cfg,
            [dim; NUM_LEADERSHIP_DIMENSIONS],
            1,
            [false; NUM_MATURITY_INDICATORS],
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
        let mut v = Vec::with_capacity(NUM_LEADERSHIP_DIMENSIONS + 7);
        for s in self.dimension_scores {
            v.push(Fr::from(s));
        }
        v.push(Fr::from(self.leadership_index));
        v.push(Fr::from(self.impact_score));
        v.push(Fr::from(self.maturity_level));
        v.push(Fr::from(self.min_index));
        v.push(Fr::from(self.min_impact));
        v.push(Fr::from(self.min_tenure));
        v.push(self.credential_hash);
        v
    }
}

impl ConstraintSynthesizer<Fr> for LeadershipCredentialCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let cfg = crate::constants::poseidon_config();
        let one = FpVar::<Fr>::constant(Fr::from(1u64));
        let hundred = FpVar::<Fr>::constant(Fr::from(SCALE));

        // --- Public inputs ---
        let mut public_scores = Vec::with_capacity(NUM_LEADERSHIP_DIMENSIONS);
        for s in self.dimension_scores {
            public_scores.push(FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(s)))?);
        }
        let public_index =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.leadership_index)))?;
        let public_impact =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.impact_score)))?;
        let public_maturity =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.maturity_level)))?;
        let min_index = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.min_index)))?;
        let min_impact = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.min_impact)))?;
        let min_tenure = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.min_tenure)))?;
        let credential_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.credential_hash))?;

        // --- Witness ---
        let user_address = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.user_address))?;
        let timestamp = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(self.timestamp)))?;
        let tenure = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(self.tenure_years)))?;
        constrain_bits(&tenure, RANGE_BITS)?;

        let mut activities = Vec::with_capacity(NUM_LEADERSHIP_DIMENSIONS);
        let mut points = Vec::with_capacity(NUM_LEADERSHIP_DIMENSIONS);
        for d in &self.dimensions {
            let a = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(d.activities)))?;
            let p = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(d.points)))?;
            constrain_bits(&a, RANGE_BITS)?;
            constrain_bits(&p, RANGE_BITS)?;
            // Each activity contributes at most 10 points.
            let ten_a = &a * FpVar::constant(Fr::from(10u64));
            is_leq(&p, &ten_a, RANGE_BITS)?.enforce_equal(&Boolean::constant(true))?;
            activities.push(a);
            points.push(p);
        }

        // Per-dimension score: min(points, 100), bound to the public score.
        let mut weighted_sum = FpVar::<Fr>::constant(Fr::from(0u64));
        for i in 0..NUM_LEADERSHIP_DIMENSIONS {
            let score = min(&points[i], &hundred, RANGE_BITS)?;
            score.enforce_equal(&public_scores[i])?;
            weighted_sum += &score * FpVar::constant(Fr::from(LEADERSHIP_WEIGHTS[i]));
        }

        // base = weighted_sum / 100
        let base_q = weighted_sum_quotient(&self.dimension_scores);
        let base = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(base_q.0)))?;
        let base_r = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(base_q.1)))?;
        enforce_div(&weighted_sum, &hundred, &base, &base_r, RANGE_BITS)?;

        // Tenure multiplier: 100 plus 10 per cleared tier.
        let ten = FpVar::<Fr>::constant(Fr::from(10u64));
        let mut multiplier = hundred.clone();
        for floor in [5u64, 10, 15] {
            let cleared = is_leq(&FpVar::constant(Fr::from(floor)), &tenure, RANGE_BITS)?;
            multiplier += cleared.select(&ten, &FpVar::constant(Fr::from(0u64)))?;
        }

        // index = base * multiplier / 100, bound to the public index.
        let scaled = &base * &multiplier;
        let native_mult = tenure_multiplier(self.tenure_years);
        let idx_num = base_q.0 * native_mult;
        let idx_r = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(idx_num % SCALE)))?;
        enforce_div(&scaled, &hundred, &public_index, &idx_r, RANGE_BITS)?;

        // Impact: 10*led + 15*innovations + 5*community, capped at 100.
        let impact_raw = &activities[DIM_PROJECTS_LED] * FpVar::constant(Fr::from(10u64))
            + &activities[DIM_INNOVATIONS] * FpVar::constant(Fr::from(15u64))
            + &activities[DIM_COMMUNITY] * FpVar::constant(Fr::from(5u64));
        let impact = min(&impact_raw, &hundred, RANGE_BITS)?;
        impact.enforce_equal(&public_impact)?;

        // Maturity level: max(1, number of set indicators).
        let mut indicator_sum = FpVar::<Fr>::constant(Fr::from(0u64));
        for b in self.maturity_indicators {
            let ind = Boolean::new_witness(cs.clone(), || Ok(b))?;
            indicator_sum += ind.select(&one, &FpVar::constant(Fr::from(0u64)))?;
        }
        let none_set = indicator_sum.is_eq(&FpVar::constant(Fr::from(0u64)))?;
        let level = none_set.select(&one, &indicator_sum)?;
        level.enforce_equal(&public_maturity)?;

        // Validity: thresholds plus the two non-emptiness requirements.
        is_leq(&min_index, &public_index, RANGE_BITS)?
            .enforce_equal(&Boolean::constant(true))?;
        is_leq(&min_impact, &public_impact, RANGE_BITS)?
            .enforce_equal(&Boolean::constant(true))?;
        is_leq(&min_tenure, &tenure, RANGE_BITS)?.enforce_equal(&Boolean::constant(true))?;
        is_leq(&one, &activities[DIM_PROJECTS_LED], RANGE_BITS)?
            .enforce_equal(&Boolean::constant(true))?;
        is_leq(&one, &activities[DIM_MENTORING], RANGE_BITS)?
            .enforce_equal(&Boolean::constant(true))?;

        let commitment = hash_elems_var(
            cs,
            &cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                public_index,
                public_impact,
                public_maturity,
                timestamp,
            ],
        )?;
        commitment.enforce_equal(&credential_hash)?;

        Ok(())
    }
}

/// Native (quotient, remainder) of the weighted-score sum by 100.
fn weighted_sum_quotient(scores: &[u64; NUM_LEADERSHIP_DIMENSIONS]) -> (u64, u64) {
    let raw: u64 = scores
        .iter()
        .zip(LEADERSHIP_WEIGHTS)
        .map(|(s, w)| s * w)
        .sum();
    (raw / SCALE, raw % SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::poseidon_config;
    use ark_relations::r1cs::ConstraintSystem;

    fn dims() -> [LeadershipDimension; NUM_LEADERSHIP_DIMENSIONS] {
        [
            LeadershipDimension { activities: 4, points: 32 }, // mentoring
            LeadershipDimension { activities: 6, points: 54 }, // architecture
            LeadershipDimension { activities: 10, points: 80 }, // review
            LeadershipDimension { activities: 3, points: 27 }, // projects led
            LeadershipDimension { activities: 8, points: 56 }, // team interactions
            LeadershipDimension { activities: 2, points: 18 }, // innovations
            LeadershipDimension { activities: 5, points: 35 }, // community
        ]
    }

    fn satisfied(circuit: LeadershipCredentialCircuit) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn valid_credential_satisfies() {
        let cfg = poseidon_config();
        let circuit = LeadershipCredentialCircuit::new(
            &cfg,
            dims(),
            7,
            [true, true, false, true, false],
            Fr::from(7u64),
            30,
            40,
            5,
            1700000000,
        )
        .unwrap();
        assert_eq!(circuit.maturity_level, 3);
        // 7 years of tenure lands in the 5-year tier.
        let base = weighted_index(&circuit.dimension_scores);
        assert_eq!(circuit.leadership_index, base * 110 / 100);
        assert!(satisfied(circuit));
    }

    #[test]
    fn no_mentoring_fails_fast() {
        let cfg = poseidon_config();
        let mut d = dims();
        d[DIM_MENTORING] = LeadershipDimension::default();
        let err = LeadershipCredentialCircuit::new(
            &cfg,
            d,
            7,
            [true; 5],
            Fr::from(7u64),
            0,
            0,
            0,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, CircuitError::InsufficientWitness(_)));
    }

    #[test]
    fn threshold_miss_unsatisfiable() {
        let cfg = poseidon_config();
        let mut circuit = LeadershipCredentialCircuit::new(
            &cfg,
            dims(),
            7,
            [true; 5],
            Fr::from(7u64),
            30,
            40,
            5,
            0,
        )
        .unwrap();
        // Raise the public threshold past the actual index.
        circuit.min_index = circuit.leadership_index + 1;
        assert!(!satisfied(circuit));
    }

    #[test]
    fn overclaimed_points_unsatisfiable() {
        let cfg = poseidon_config();
        let mut circuit = LeadershipCredentialCircuit::new(
            &cfg,
            dims(),
            7,
            [true; 5],
            Fr::from(7u64),
            0,
            0,
            0,
            0,
        )
        .unwrap();
        // 1 activity cannot carry 90 points (max 10 each).
        circuit.dimensions[DIM_INNOVATIONS] = LeadershipDimension {
            activities: 1,
            points: 90,
        };
        assert!(!satisfied(circuit));
    }

    #[test]
    fn maturity_floor_is_one() {
        assert_eq!(maturity_level(&[false; 5]), 1);
        assert_eq!(maturity_level(&[true; 5]), 5);
    }
}
