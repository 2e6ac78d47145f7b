//! Crate-wide constants used by the credential circuits and host-side orchestration.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::PrimeField;

/// Commit slots per repository credential in the default build.
///
/// The commit Merkle tree has exactly this many leaves (zero-padded), so the
/// tree depth below is its base-2 log.
pub const MAX_COMMITS: usize = 128;

/// Depth of the per-repository commit Merkle tree.
pub const MERKLE_DEPTH: usize = 7;

/// Language slots in the default build.
///
/// Deployments choose one of [`LANGUAGE_TIERS`] at build time; there is no
/// runtime-variable capacity. Overflow is rejected by the packer, never
/// truncated.
pub const MAX_LANGUAGES: usize = 10;

/// Supported language-capacity tiers.
pub const LANGUAGE_TIERS: [usize; 4] = [5, 10, 20, 50];

/// Collaborator slots per repository credential.
pub const MAX_COLLABORATORS: usize = 16;

/// Repository slots in the portfolio aggregator.
pub const MAX_REPOSITORIES: usize = 32;

/// Value slots in the statistics aggregator.
pub const MAX_STAT_VALUES: usize = 32;

/// Bit width used to range-constrain counts and lines-of-code totals.
pub const RANGE_BITS: usize = 64;

/// Bit width used to range-constrain scores and other small values.
pub const SCORE_BITS: usize = 32;

/// Bit width of a language fingerprint.
///
/// Fingerprints are truncated hashes; zero is reserved as the empty-slot
/// sentinel and is never a real fingerprint.
pub const FINGERPRINT_BITS: usize = 64;

/// Fixed-point scale for percentages, scores, and statistics.
pub const SCALE: u64 = 100;

/// Fixed-point scale for the privacy parameter epsilon (milli-epsilon).
pub const EPSILON_SCALE: u64 = 1000;

/// z-multiplier for the 95% confidence interval, scaled by [`SCALE`] (1.96).
pub const Z95_SCALED: u64 = 196;

/// Number of leadership dimensions.
pub const NUM_LEADERSHIP_DIMENSIONS: usize = 7;

/// Percentage weight of each leadership dimension, in order:
/// mentoring, architecture decisions, code review, projects led,
/// team interactions, innovations, community contributions.
///
/// These weights are a behavioral contract carried over from the product
/// definition; they sum to 100.
pub const LEADERSHIP_WEIGHTS: [u64; NUM_LEADERSHIP_DIMENSIONS] = [20, 18, 15, 17, 10, 12, 8];

/// Tenure multiplier tiers: percent multiplier applied to the weighted
/// leadership index at 0 / 5 / 10 / 15 years of experience.
pub const TENURE_MULTIPLIERS: [(u64, u64); 4] = [(0, 100), (5, 110), (10, 120), (15, 130)];

/// Number of boolean maturity indicators feeding the 1–5 maturity level.
pub const NUM_MATURITY_INDICATORS: usize = 5;

/// Number of diversity dimensions, in order: languages, technologies,
/// project types, domains, contribution types, architectural patterns,
/// team-size variety.
pub const NUM_DIVERSITY_DIMENSIONS: usize = 7;

/// Percentage weight of each diversity dimension; sums to 100.
pub const DIVERSITY_DIMENSION_WEIGHTS: [u64; NUM_DIVERSITY_DIMENSIONS] =
    [20, 18, 15, 13, 12, 12, 10];

/// Per-dimension category capacity used to normalize breadth.
pub const DIVERSITY_DIMENSION_CAPACITY: u64 = 10;

/// Weights combining breadth and depth into the overall diversity index;
/// they sum to 100.
pub const DIVERSITY_BREADTH_WEIGHT: u64 = 60;
pub const DIVERSITY_DEPTH_WEIGHT: u64 = 40;

/// Minimum collaborator count a repository needs before its collaborator
/// set may back an aggregate collaboration claim (the k-anonymity floor).
pub const K_ANONYMITY_FLOOR: u64 = 3;

// Poseidon sponge configuration.
//
// Width-3 sponge (rate=2, capacity=1); round counts consistent with widely
// used Poseidon instantiations over BN254.
pub const POSEIDON_RATE: usize = 2;
pub const POSEIDON_CAPACITY: usize = 1;
pub const POSEIDON_FULL_ROUNDS: usize = 8;
pub const POSEIDON_PARTIAL_ROUNDS: usize = 57;

/// Poseidon S-box exponent (alpha).
pub const POSEIDON_ALPHA: u64 = 5;

// Domain tags keep the hash uses (Merkle nodes, commit leaves, fingerprints,
// signatures, credential commitments) in disjoint input spaces. No
// domain-tagged input hashes to zero, which is what makes the zero sentinel
// safe for unused slots.
pub const DOMAIN_MERKLE_NODE: u64 = 1;
pub const DOMAIN_COMMIT_LEAF: u64 = 2;
pub const DOMAIN_LANGUAGE: u64 = 3;
pub const DOMAIN_COLLABORATOR: u64 = 4;
pub const DOMAIN_REPOSITORY: u64 = 5;
pub const DOMAIN_ADDRESS: u64 = 6;
pub const DOMAIN_SIGNATURE: u64 = 7;
pub const DOMAIN_CREDENTIAL: u64 = 8;
pub const DOMAIN_LANGUAGE_SET: u64 = 9;
pub const DOMAIN_BLINDING: u64 = 10;

/// Deterministically derive Poseidon parameters for BN254::Fr.
///
/// Uses arkworks' parameter derivation helper (Ark + MDS) so the native
/// hasher and the in-circuit gadget agree on the same constants.
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    let prime_bits = Fr::MODULUS_BIT_SIZE as u64;

    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        prime_bits,
        POSEIDON_RATE,
        POSEIDON_FULL_ROUNDS as u64,
        POSEIDON_PARTIAL_ROUNDS as u64,
        0,
    );

    PoseidonConfig::new(
        POSEIDON_FULL_ROUNDS,
        POSEIDON_PARTIAL_ROUNDS,
        POSEIDON_ALPHA,
        mds,
        ark,
        POSEIDON_RATE,
        POSEIDON_CAPACITY,
    )
}

/// Percent multiplier for a given tenure in years.
pub fn tenure_multiplier(years: u64) -> u64 {
    let mut m = TENURE_MULTIPLIERS[0].1;
    for (floor, mult) in TENURE_MULTIPLIERS {
        if years >= floor {
            m = mult;
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leadership_weights_sum_to_hundred() {
        assert_eq!(LEADERSHIP_WEIGHTS.iter().sum::<u64>(), 100);
    }

    #[test]
    fn diversity_weights_sum_to_hundred() {
        assert_eq!(DIVERSITY_DIMENSION_WEIGHTS.iter().sum::<u64>(), 100);
        assert_eq!(DIVERSITY_BREADTH_WEIGHT + DIVERSITY_DEPTH_WEIGHT, 100);
    }

    #[test]
    fn tenure_tiers() {
        assert_eq!(tenure_multiplier(0), 100);
        assert_eq!(tenure_multiplier(4), 100);
        assert_eq!(tenure_multiplier(5), 110);
        assert_eq!(tenure_multiplier(12), 120);
        assert_eq!(tenure_multiplier(40), 130);
    }

    #[test]
    fn merkle_depth_matches_commit_capacity() {
        assert_eq!(1usize << MERKLE_DEPTH, MAX_COMMITS);
    }
}
