//! Repository portfolio aggregator.
//!
//! Filters the portfolio to repositories meeting a minimum-commit activity
//! threshold, then proves over the active set only:
//! - commit and lines-of-code totals inside public privacy ranges (bounded
//!   disclosure, never exact),
//! - a diversity score from the count of distinct active repository hashes,
//! - a temporal-consistency score from activity spans and commit density,
//! - non-ownership: strictly fewer owned active repositories than active
//!   repositories overall,
//! - collaboration: at least one active repository whose collaborator count
//!   meets the k-anonymity floor.
//!
//! An empty active set is unsatisfiable.

use crate::constants::{DOMAIN_CREDENTIAL, RANGE_BITS, SCALE};
use crate::error::CircuitError;
use crate::gadgets::compare::{
    constrain_bits, enforce_div, enforce_in_range, is_leq, is_lt, min,
};
use crate::gadgets::hash::{hash_elems, hash_elems_var};
use crate::gadgets::set::{count_active, enforce_distinct_active};
use crate::types::{ClaimRange, RepositorySlot};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use core::ops::Not;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// Diversity contract: ten points per distinct active repository, capped.
pub fn diversity_score(active_count: u64) -> u64 {
    (active_count * 10).min(SCALE)
}

/// Per-repository temporal score: commit density (commits per day, scaled)
/// capped at 100. Active repositories must span at least one day.
pub fn repo_temporal_score(commits: u64, span_days: u64) -> u64 {
    if span_days == 0 {
        return 0;
    }
    (commits * SCALE / span_days).min(SCALE)
}

/// Native aggregate outputs; MUST match the circuit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateOutputs {
    pub total_commits: u64,
    pub total_loc: u64,
    pub active_count: u64,
    pub owned_active: u64,
    pub diversity_score: u64,
    pub temporal_score: u64,
}

/// Apply the activity filter and compute every aggregate natively.
pub fn compute_aggregates(slots: &[RepositorySlot], min_commits: u64) -> AggregateOutputs {
    let active: Vec<&RepositorySlot> = slots
        .iter()
        .filter(|s| s.active && s.commits >= min_commits)
        .collect();

    let active_count = active.len() as u64;
    let temporal_sum: u64 = active
        .iter()
        .map(|s| repo_temporal_score(s.commits, s.span_days))
        .sum();

    AggregateOutputs {
        total_commits: active.iter().map(|s| s.commits).sum(),
        total_loc: active.iter().map(|s| s.lines_changed).sum(),
        active_count,
        owned_active: active.iter().filter(|s| s.is_owner).count() as u64,
        diversity_score: diversity_score(active_count),
        temporal_score: if active_count == 0 {
            0
        } else {
            temporal_sum / active_count
        },
    }
}

/// Portfolio aggregation circuit over `R` repository slots.
#[derive(Clone, Debug)]
pub struct RepositoryAggregatorCircuit<const R: usize> {
    /// Private repository slots.
    pub slots: Vec<RepositorySlot>,
    pub user_address: Fr,
    pub timestamp: u64,

    /// Public activity threshold gating every sum.
    pub min_commits: u64,
    /// Public privacy ranges on the active sums.
    pub commit_sum_range: ClaimRange,
    pub loc_sum_range: ClaimRange,
    /// Public k-anonymity floor for the collaboration claim.
    pub k_floor: u64,
    /// Public derived scores.
    pub diversity_score: u64,
    pub temporal_score: u64,
    /// Public: commitment binding user, claim values and timestamp.
    pub credential_hash: Fr,
}

impl<const R: usize> RepositoryAggregatorCircuit<R> {
    /// Pad a portfolio to capacity; overflow is rejected, never truncated.
    pub fn pad_slots(mut slots: Vec<RepositorySlot>) -> Result<Vec<RepositorySlot>, CircuitError> {
        if slots.len() > R {
            return Err(CircuitError::CapacityExceeded {
                capacity: R,
                got: slots.len(),
            });
        }
        for s in &mut slots {
            s.active = true;
        }
        slots.resize(R, RepositorySlot::empty());
        Ok(slots)
    }

    /// Commitment binding; MUST match the circuit.
    pub fn compute_credential_hash(
        cfg: &PoseidonConfig<Fr>,
        user_address: Fr,
        commit_sum_range: ClaimRange,
        loc_sum_range: ClaimRange,
        diversity: u64,
        temporal: u64,
        timestamp: u64,
    ) -> Fr {
        hash_elems(
            cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                Fr::from(commit_sum_range.lo),
                Fr::from(commit_sum_range.hi),
                Fr::from(loc_sum_range.lo),
                Fr::from(loc_sum_range.hi),
                Fr::from(diversity),
                Fr::from(temporal),
                Fr::from(timestamp),
            ],
        )
    }

    /// Assemble a full witness, fail-fast on unsatisfiable claims.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cfg: &PoseidonConfig<Fr>,
        slots: Vec<RepositorySlot>,
        user_address: Fr,
        min_commits: u64,
        commit_sum_range: ClaimRange,
        loc_sum_range: ClaimRange,
        k_floor: u64,
        timestamp: u64,
    ) -> Result<Self, CircuitError> {
        if slots.len() != R {
            return Err(CircuitError::InvalidWitness(format!(
                "expected {R} slots, got {}",
                slots.len()
            )));
        }

        let agg = compute_aggregates(&slots, min_commits);
        if agg.active_count == 0 {
            return Err(CircuitError::InsufficientWitness(
                "no repository meets the activity threshold",
            ));
        }
        if !commit_sum_range.contains(agg.total_commits) {
            return Err(CircuitError::InputRangeViolation {
                field: "total_commits",
                value: agg.total_commits,
                lo: commit_sum_range.lo,
                hi: commit_sum_range.hi,
            });
        }
        if !loc_sum_range.contains(agg.total_loc) {
            return Err(CircuitError::InputRangeViolation {
                field: "total_lines_changed",
                value: agg.total_loc,
                lo: loc_sum_range.lo,
                hi: loc_sum_range.hi,
            });
        }
        if agg.owned_active >= agg.active_count {
            return Err(CircuitError::InvalidWitness(
                "every active repository is owned; non-ownership claim impossible".to_string(),
            ));
        }
        let k_met = slots
            .iter()
            .any(|s| s.active && s.commits >= min_commits && s.collaborator_count >= k_floor);
        if !k_met {
            return Err(CircuitError::InsufficientWitness(
                "no active repository meets the k-anonymity floor",
            ));
        }

        let credential_hash = Self::compute_credential_hash(
            cfg,
            user_address,
            commit_sum_range,
            loc_sum_range,
            agg.diversity_score,
            agg.temporal_score,
            timestamp,
        );
        Ok(Self {
            slots,
            user_address,
            timestamp,
            min_commits,
            commit_sum_range,
            loc_sum_range,
            k_floor,
            diversity_score: agg.diversity_score,
            temporal_score: agg.temporal_score,
            credential_hash,
        })
    }

    /// Satisfiable instance used for key generation.
    pub fn placeholder(cfg: &PoseidonConfig<Fr>) -> Self {
        let slots = Self::pad_slots(vec![
            RepositorySlot {
                repo_hash: Fr::from(1u64),
                commits: 10,
                lines_changed: 100,
                collaborator_count: 3,
                is_owner: false,
                span_days: 10,
                active: true,
            },
            RepositorySlot {
                repo_hash: Fr::from(2u64),
                commits: 5,
                lines_changed: 50,
                collaborator_count: 1,
                is_owner: true,
                span_days: 5,
                active: true,
            },
        ])
        .expect("placeholder fits");
        Self::new(
            cfg,
            slots,
            Fr::from(1u64),
            1,
            ClaimRange { lo: 1, hi: 1000 },
            ClaimRange { lo: 1, hi: 10000 },
            3,
            0,
        )
        .expect("placeholder instance")
    }

    /// Public-input vector; ORDERING MUST MATCH the circuit's `new_input`
    /// allocation order.
    pub fn public_inputs(&self) -> Vec<Fr> {
        vec![
            self.user_address,
            Fr::from(self.min_commits),
            Fr::from(self.commit_sum_range.lo),
            Fr::from(self.commit_sum_range.hi),
            Fr::from(self.loc_sum_range.lo),
            Fr::from(self.loc_sum_range.hi),
            Fr::from(self.k_floor),
            Fr::from(self.diversity_score),
            Fr::from(self.temporal_score),
            self.credential_hash,
        ]
    }
}

impl<const R: usize> ConstraintSynthesizer<Fr> for RepositoryAggregatorCircuit<R> {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        if self.slots.len() != R {
            return Err(SynthesisError::Unsatisfiable);
        }
        let cfg = crate::constants::poseidon_config();
        let zero = FpVar::<Fr>::constant(Fr::from(0u64));
        let one = FpVar::<Fr>::constant(Fr::from(1u64));
        let hundred = FpVar::<Fr>::constant(Fr::from(SCALE));

        // --- Public inputs ---
        let user_address = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.user_address))?;
        let min_commits = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.min_commits)))?;
        let commit_lo =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.commit_sum_range.lo)))?;
        let commit_hi =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.commit_sum_range.hi)))?;
        let loc_lo = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.loc_sum_range.lo)))?;
        let loc_hi = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.loc_sum_range.hi)))?;
        let k_floor = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.k_floor)))?;
        let public_diversity =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.diversity_score)))?;
        let public_temporal =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.temporal_score)))?;
        let credential_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.credential_hash))?;

        // --- Witness ---
        let timestamp = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(self.timestamp)))?;

        let mut repo_hashes = Vec::with_capacity(R);
        let mut actives = Vec::with_capacity(R);
        let mut commit_sum = zero.clone();
        let mut loc_sum = zero.clone();
        let mut owned_sum = zero.clone();
        let mut temporal_sum = zero.clone();
        let mut k_met_any = Boolean::constant(false);

        for slot in &self.slots {
            let repo_hash = FpVar::<Fr>::new_witness(cs.clone(), || Ok(slot.repo_hash))?;
            let commits = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.commits)))?;
            let loc = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.lines_changed)))?;
            let collab_count =
                FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.collaborator_count)))?;
            let span = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.span_days)))?;
            let is_owner = Boolean::new_witness(cs.clone(), || Ok(slot.is_owner))?;
            let present = Boolean::new_witness(cs.clone(), || Ok(slot.active))?;

            constrain_bits(&commits, RANGE_BITS)?;
            constrain_bits(&loc, RANGE_BITS)?;
            constrain_bits(&collab_count, RANGE_BITS)?;
            constrain_bits(&span, RANGE_BITS)?;

            // Padding slots are fully zeroed.
            let present_fp = present.select(&one, &zero)?;
            let absent = &one - &present_fp;
            (&absent * &repo_hash).enforce_equal(&zero)?;
            (&absent * &commits).enforce_equal(&zero)?;
            (&absent * &loc).enforce_equal(&zero)?;
            (&absent * &collab_count).enforce_equal(&zero)?;
            (&absent * &span).enforce_equal(&zero)?;

            // Activity filter: present and meeting the commit threshold.
            let meets_threshold = is_leq(&min_commits, &commits, RANGE_BITS)?;
            let active = &present & &meets_threshold;
            let active_fp = active.select(&one, &zero)?;

            // Sums run over active repositories only.
            commit_sum += &active_fp * &commits;
            loc_sum += &active_fp * &loc;
            owned_sum += (&active & &is_owner).select(&one, &zero)?;

            // Active repositories span at least one day; density is commits
            // per day (scaled), capped at 100.
            let span_ok = is_leq(&one, &span, RANGE_BITS)?;
            (&active & &span_ok.not())
                .enforce_equal(&Boolean::constant(false))?;

            let density_num = &commits * &hundred;
            let den = active.select(&span, &one)?;
            let num = active.select(&density_num, &zero)?;
            // Witness assignments mirror the in-circuit gating exactly.
            let filtered = slot.active && slot.commits >= self.min_commits && slot.span_days > 0;
            let density_val = if filtered {
                slot.commits * SCALE / slot.span_days
            } else {
                0
            };
            let density_rem_val = if filtered {
                slot.commits * SCALE % slot.span_days
            } else {
                0
            };
            let density = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(density_val)))?;
            let density_rem =
                FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(density_rem_val)))?;
            enforce_div(&num, &den, &density, &density_rem, RANGE_BITS)?;
            temporal_sum += min(&density, &hundred, RANGE_BITS)?;

            // Collaboration floor: at least one active repository must
            // clear it.
            let k_ok = is_leq(&k_floor, &collab_count, RANGE_BITS)?;
            k_met_any = &k_met_any | &(&active & &k_ok);

            repo_hashes.push(repo_hash);
            actives.push(active);
        }

        // Distinct active repositories; the diversity count cannot be
        // inflated by repeating one repository.
        enforce_distinct_active(&repo_hashes, &actives)?;

        let active_count = count_active(&actives)?;
        is_leq(&one, &active_count, RANGE_BITS)?.enforce_equal(&Boolean::constant(true))?;

        enforce_in_range(&commit_sum, &commit_lo, &commit_hi, RANGE_BITS)?;
        enforce_in_range(&loc_sum, &loc_lo, &loc_hi, RANGE_BITS)?;

        // Diversity: ten points per distinct active repository, capped.
        let diversity = min(
            &(&active_count * FpVar::constant(Fr::from(10u64))),
            &hundred,
            RANGE_BITS,
        )?;
        diversity.enforce_equal(&public_diversity)?;

        // Temporal consistency: mean per-repository density score.
        let agg = compute_aggregates(&self.slots, self.min_commits);
        let temporal_total: u64 = self
            .slots
            .iter()
            .filter(|s| s.active && s.commits >= self.min_commits)
            .map(|s| repo_temporal_score(s.commits, s.span_days))
            .sum();
        let temporal_rem_val = if agg.active_count == 0 {
            0
        } else {
            temporal_total % agg.active_count
        };
        let temporal_rem =
            FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(temporal_rem_val)))?;
        enforce_div(
            &temporal_sum,
            &active_count,
            &public_temporal,
            &temporal_rem,
            RANGE_BITS,
        )?;

        // Non-ownership: strictly fewer owned active repositories.
        is_lt(&owned_sum, &active_count, RANGE_BITS)?
            .enforce_equal(&Boolean::constant(true))?;

        // Collaboration validity.
        k_met_any.enforce_equal(&Boolean::constant(true))?;

        let commitment = hash_elems_var(
            cs,
            &cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                commit_lo,
                commit_hi,
                loc_lo,
                loc_hi,
                public_diversity,
                public_temporal,
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

    type TestCircuit = RepositoryAggregatorCircuit<8>;

    fn repo(hash: u64, commits: u64, loc: u64, collaborators: u64, owner: bool) -> RepositorySlot {
        RepositorySlot {
            repo_hash: Fr::from(hash),
            commits,
            lines_changed: loc,
            collaborator_count: collaborators,
            is_owner: owner,
            span_days: 30,
            active: true,
        }
    }

    fn build() -> TestCircuit {
        let cfg = poseidon_config();
        let slots = TestCircuit::pad_slots(vec![
            repo(1, 50, 2000, 4, false),
            repo(2, 30, 1500, 2, true),
            repo(3, 3, 90, 1, false), // below the activity threshold
            repo(4, 20, 800, 5, false),
        ])
        .unwrap();
        TestCircuit::new(
            &cfg,
            slots,
            Fr::from(7u64),
            5,
            ClaimRange { lo: 50, hi: 200 },
            ClaimRange { lo: 1000, hi: 10000 },
            3,
            1700000000,
        )
        .unwrap()
    }

    fn satisfied(circuit: TestCircuit) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn activity_filter_gates_sums() {
        let agg = compute_aggregates(&build().slots, 5);
        // Repo 3 (3 commits) is filtered out of every aggregate.
        assert_eq!(agg.total_commits, 100);
        assert_eq!(agg.total_loc, 4300);
        assert_eq!(agg.active_count, 3);
        assert_eq!(agg.owned_active, 1);
    }

    #[test]
    fn valid_portfolio_satisfies() {
        assert!(satisfied(build()));
    }

    #[test]
    fn empty_active_set_fails_fast() {
        let cfg = poseidon_config();
        let slots = TestCircuit::pad_slots(vec![repo(1, 2, 100, 4, false)]).unwrap();
        let err = TestCircuit::new(
            &cfg,
            slots,
            Fr::from(7u64),
            5,
            ClaimRange { lo: 0, hi: 200 },
            ClaimRange { lo: 0, hi: 10000 },
            3,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, CircuitError::InsufficientWitness(_)));
    }

    #[test]
    fn all_owned_fails_fast() {
        let cfg = poseidon_config();
        let slots =
            TestCircuit::pad_slots(vec![repo(1, 50, 2000, 4, true), repo(2, 30, 1500, 3, true)])
                .unwrap();
        let err = TestCircuit::new(
            &cfg,
            slots,
            Fr::from(7u64),
            5,
            ClaimRange { lo: 0, hi: 200 },
            ClaimRange { lo: 0, hi: 10000 },
            3,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, CircuitError::InvalidWitness(_)));
    }

    #[test]
    fn sum_outside_privacy_range_unsatisfiable() {
        let mut circuit = build();
        // Claim a tighter range than the actual total (100 commits).
        circuit.commit_sum_range = ClaimRange { lo: 150, hi: 200 };
        assert!(!satisfied(circuit));
    }

    #[test]
    fn below_k_floor_unsatisfiable() {
        let mut circuit = build();
        circuit.k_floor = 50;
        assert!(!satisfied(circuit));
    }

    #[test]
    fn duplicate_repo_hash_unsatisfiable() {
        let mut circuit = build();
        circuit.slots[1].repo_hash = circuit.slots[0].repo_hash;
        assert!(!satisfied(circuit));
    }
}
