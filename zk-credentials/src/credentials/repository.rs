//! Repository-contribution credential.
//!
//! The composition circuit for a single repository. Six sub-claims, all
//! enforced, so any one failure makes the whole credential unsatisfiable:
//!
//! 1) Every committed-to leaf is a member of the repository's commit
//!    Merkle tree.
//! 2) Total lines-of-code is the exact sum of per-commit deltas and lies
//!    in the public LOC range.
//! 3) The language sub-claim holds (count, usage threshold, distinct
//!    fingerprints, canonical set fingerprint).
//! 4) The collaboration sub-claim holds (count range, not sole
//!    contributor, derived score).
//! 5) Non-ownership: the hash of the claimed user address differs from
//!    the repository owner hash.
//! 6) A signature binds the user to the repository hash.

use crate::constants::{
    DOMAIN_ADDRESS, DOMAIN_COMMIT_LEAF, DOMAIN_CREDENTIAL, RANGE_BITS,
};
use crate::credentials::collaboration::{
    collaboration_score, enforce_collaboration_claims, CollaborationCredentialCircuit,
};
use crate::credentials::language::{enforce_language_claims, LanguageCredentialCircuit};
use crate::error::CircuitError;
use crate::gadgets::compare::{constrain_bits, enforce_in_range};
use crate::gadgets::hash::{hash_elems, hash_elems_var};
use crate::gadgets::merkle::enforce_membership_if;
use crate::gadgets::set::{count_active, enforce_distinct_active};
use crate::gadgets::signature::{enforce_signature, sign};
use crate::tree::{MerklePath, MerkleTree};
use crate::types::{ClaimRange, CollaboratorSlot, CommitSlot, LanguageSlot};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// Commit leaf hash; MUST match the in-circuit leaf computation.
pub fn commit_leaf(cfg: &PoseidonConfig<Fr>, slot: &CommitSlot) -> Fr {
    hash_elems(
        cfg,
        DOMAIN_COMMIT_LEAF,
        &[
            slot.commit_id,
            Fr::from(slot.additions),
            Fr::from(slot.deletions),
        ],
    )
}

/// Build the repository commit tree and one sibling path per slot.
///
/// Inactive slots get empty paths; the circuit skips them.
pub fn build_commit_tree(
    cfg: &PoseidonConfig<Fr>,
    commits: &[CommitSlot],
    depth: usize,
) -> Result<(MerkleTree, Vec<MerklePath>), CircuitError> {
    let leaves: Vec<Fr> = commits
        .iter()
        .filter(|c| c.active)
        .map(|c| commit_leaf(cfg, c))
        .collect();
    let tree = MerkleTree::from_leaves(cfg, &leaves, depth)?;

    let mut paths = Vec::with_capacity(commits.len());
    let mut next_leaf = 0usize;
    for c in commits {
        if c.active {
            paths.push(tree.path(next_leaf));
            next_leaf += 1;
        } else {
            paths.push(MerklePath::empty(depth));
        }
    }
    Ok((tree, paths))
}

/// Circuit proving a repository contribution claim.
///
/// `C` commit slots, `L` language slots, `K` collaborator slots; all three
/// are compile-time tiers.
#[derive(Clone, Debug)]
pub struct RepositoryCredentialCircuit<const C: usize, const L: usize, const K: usize> {
    // --- Private witness ---
    pub commits: Vec<CommitSlot>,
    pub commit_paths: Vec<MerklePath>,
    pub languages: Vec<LanguageSlot>,
    pub collaborators: Vec<CollaboratorSlot>,
    pub contribution_pct: u64,
    pub secret_key: Fr,
    pub timestamp: u64,

    // --- Public inputs ---
    pub merkle_root: Fr,
    pub user_address: Fr,
    pub signature: Fr,
    pub repo_hash: Fr,
    pub repo_owner_hash: Fr,
    pub commit_range: ClaimRange,
    pub loc_range: ClaimRange,
    pub language_count: u64,
    pub usage_threshold: u64,
    pub language_set_fingerprint: Fr,
    pub collaborator_range: ClaimRange,
    pub collaboration_score: u64,
    pub credential_hash: Fr,
}

impl<const C: usize, const L: usize, const K: usize> RepositoryCredentialCircuit<C, L, K> {
    /// Commitment binding; MUST match the circuit.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_credential_hash(
        cfg: &PoseidonConfig<Fr>,
        user_address: Fr,
        repo_hash: Fr,
        commit_range: ClaimRange,
        loc_range: ClaimRange,
        language_set_fingerprint: Fr,
        score: u64,
        timestamp: u64,
    ) -> Fr {
        hash_elems(
            cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                repo_hash,
                Fr::from(commit_range.lo),
                Fr::from(commit_range.hi),
                Fr::from(loc_range.lo),
                Fr::from(loc_range.hi),
                language_set_fingerprint,
                Fr::from(score),
                Fr::from(timestamp),
            ],
        )
    }

    /// Assemble a full witness, fail-fast on anything that would make the
    /// circuit unsatisfiable. No proving time is spent on a witness that
    /// cannot verify.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cfg: &PoseidonConfig<Fr>,
        commits: Vec<CommitSlot>,
        languages: Vec<LanguageSlot>,
        collaborators: Vec<CollaboratorSlot>,
        contribution_pct: u64,
        secret_key: Fr,
        repo_hash: Fr,
        repo_owner_hash: Fr,
        commit_range: ClaimRange,
        loc_range: ClaimRange,
        usage_threshold: u64,
        collaborator_range: ClaimRange,
        timestamp: u64,
        merkle_depth: usize,
    ) -> Result<Self, CircuitError> {
        if commits.len() != C || languages.len() != L || collaborators.len() != K {
            return Err(CircuitError::InvalidWitness(
                "slot vectors do not match circuit capacities".to_string(),
            ));
        }

        let commit_count = commits.iter().filter(|c| c.active).count() as u64;
        if !commit_range.contains(commit_count) {
            return Err(CircuitError::InputRangeViolation {
                field: "commit_count",
                value: commit_count,
                lo: commit_range.lo,
                hi: commit_range.hi,
            });
        }

        let loc_total: u64 = commits.iter().map(|c| c.additions + c.deletions).sum();
        if !loc_range.contains(loc_total) {
            return Err(CircuitError::InputRangeViolation {
                field: "lines_of_code",
                value: loc_total,
                lo: loc_range.lo,
                hi: loc_range.hi,
            });
        }

        let collaborator_count = collaborators.iter().filter(|c| c.active).count() as u64;
        if !collaborator_range.contains(collaborator_count) {
            return Err(CircuitError::InputRangeViolation {
                field: "collaborator_count",
                value: collaborator_count,
                lo: collaborator_range.lo,
                hi: collaborator_range.hi,
            });
        }
        if contribution_pct >= 100 {
            return Err(CircuitError::InputRangeViolation {
                field: "contribution_pct",
                value: contribution_pct,
                lo: 0,
                hi: 99,
            });
        }

        let user_address = crate::gadgets::signature::derive_address(cfg, secret_key);
        let user_hash = hash_elems(cfg, DOMAIN_ADDRESS, &[user_address]);
        if user_hash == repo_owner_hash {
            return Err(CircuitError::InvalidWitness(
                "user owns this repository; non-ownership claim impossible".to_string(),
            ));
        }

        let (tree, commit_paths) = build_commit_tree(cfg, &commits, merkle_depth)?;
        for (slot, path) in commits.iter().zip(&commit_paths) {
            if slot.active && !crate::tree::verify_path(cfg, commit_leaf(cfg, slot), tree.root(), path)
            {
                return Err(CircuitError::MerkleProofMismatch);
            }
        }
        let signature = sign(cfg, secret_key, repo_hash);

        let language_count = languages.iter().filter(|s| s.active).count() as u64;
        let language_set_fingerprint =
            LanguageCredentialCircuit::<L>::compute_set_fingerprint(cfg, &languages);
        let score = collaboration_score(collaborator_count, contribution_pct);

        let credential_hash = Self::compute_credential_hash(
            cfg,
            user_address,
            repo_hash,
            commit_range,
            loc_range,
            language_set_fingerprint,
            score,
            timestamp,
        );

        Ok(Self {
            commits,
            commit_paths,
            languages,
            collaborators,
            contribution_pct,
            secret_key,
            timestamp,
            merkle_root: tree.root(),
            user_address,
            signature,
            repo_hash,
            repo_owner_hash,
            commit_range,
            loc_range,
            language_count,
            usage_threshold,
            language_set_fingerprint,
            collaborator_range,
            collaboration_score: score,
            credential_hash,
        })
    }

    /// Satisfiable instance used for key generation.
    pub fn placeholder(cfg: &PoseidonConfig<Fr>, merkle_depth: usize) -> Self {
        let mut commits = vec![CommitSlot::empty(); C];
        commits[0] = CommitSlot {
            commit_id: Fr::from(1u64),
            additions: 1,
            deletions: 0,
            active: true,
        };
        let languages = LanguageCredentialCircuit::<L>::canonical_slots(vec![LanguageSlot {
            fingerprint: 1,
            lines: 1,
            proficiency: 1,
            active: true,
        }])
        .expect("placeholder fits");
        let collaborators =
            CollaborationCredentialCircuit::<K>::pad_collaborators(vec![CollaboratorSlot {
                identity: Fr::from(1u64),
                contribution_pct: 50,
                active: true,
            }])
            .expect("placeholder fits");

        Self::new(
            cfg,
            commits,
            languages,
            collaborators,
            50,
            Fr::from(1u64),
            Fr::from(2u64),
            Fr::from(3u64),
            ClaimRange { lo: 1, hi: 10 },
            ClaimRange { lo: 0, hi: 100 },
            1,
            ClaimRange { lo: 1, hi: 10 },
            0,
            merkle_depth,
        )
        .expect("placeholder instance")
    }

    /// Public-input vector; ORDERING MUST MATCH the circuit's `new_input`
    /// allocation order.
    pub fn public_inputs(&self) -> Vec<Fr> {
        vec![
            self.merkle_root,
            self.user_address,
            self.signature,
            self.repo_hash,
            self.repo_owner_hash,
            Fr::from(self.commit_range.lo),
            Fr::from(self.commit_range.hi),
            Fr::from(self.loc_range.lo),
            Fr::from(self.loc_range.hi),
            Fr::from(self.language_count),
            Fr::from(self.usage_threshold),
            self.language_set_fingerprint,
            Fr::from(self.collaborator_range.lo),
            Fr::from(self.collaborator_range.hi),
            Fr::from(self.collaboration_score),
            self.credential_hash,
        ]
    }
}

impl<const C: usize, const L: usize, const K: usize> ConstraintSynthesizer<Fr>
    for RepositoryCredentialCircuit<C, L, K>
{
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        if self.commits.len() != C
            || self.commit_paths.len() != C
            || self.languages.len() != L
            || self.collaborators.len() != K
        {
            return Err(SynthesisError::Unsatisfiable);
        }
        let cfg = crate::constants::poseidon_config();
        let zero = FpVar::<Fr>::constant(Fr::from(0u64));
        let one = FpVar::<Fr>::constant(Fr::from(1u64));

        // --- Public inputs ---
        let merkle_root = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.merkle_root))?;
        let user_address = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.user_address))?;
        let signature = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.signature))?;
        let repo_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.repo_hash))?;
        let repo_owner_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.repo_owner_hash))?;
        let commit_lo = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.commit_range.lo)))?;
        let commit_hi = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.commit_range.hi)))?;
        let loc_lo = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.loc_range.lo)))?;
        let loc_hi = FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.loc_range.hi)))?;
        let language_count =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.language_count)))?;
        let usage_threshold =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.usage_threshold)))?;
        let language_set_fingerprint =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(self.language_set_fingerprint))?;
        let collab_lo =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.collaborator_range.lo)))?;
        let collab_hi =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.collaborator_range.hi)))?;
        let claimed_score =
            FpVar::<Fr>::new_input(cs.clone(), || Ok(Fr::from(self.collaboration_score)))?;
        let credential_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.credential_hash))?;

        // --- Witness: commits and Merkle paths ---
        let timestamp = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(self.timestamp)))?;
        let secret_key = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.secret_key))?;

        let mut commit_ids = Vec::with_capacity(C);
        let mut commit_active = Vec::with_capacity(C);
        let mut loc_sum = zero.clone();

        for (slot, path) in self.commits.iter().zip(&self.commit_paths) {
            let commit_id = FpVar::<Fr>::new_witness(cs.clone(), || Ok(slot.commit_id))?;
            let additions = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.additions)))?;
            let deletions = FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.deletions)))?;
            let active = Boolean::new_witness(cs.clone(), || Ok(slot.active))?;

            constrain_bits(&additions, RANGE_BITS)?;
            constrain_bits(&deletions, RANGE_BITS)?;

            let active_fp = active.select(&one, &zero)?;
            // Inactive slots contribute nothing to the LOC sum.
            ((&one - &active_fp) * &additions).enforce_equal(&zero)?;
            ((&one - &active_fp) * &deletions).enforce_equal(&zero)?;
            ((&one - &active_fp) * &commit_id).enforce_equal(&zero)?;

            // Leaf binds identity to deltas, so the LOC sum cannot drift
            // from the committed history.
            let leaf = hash_elems_var(
                cs.clone(),
                &cfg,
                DOMAIN_COMMIT_LEAF,
                &[commit_id.clone(), additions.clone(), deletions.clone()],
            )?;

            let siblings: Vec<FpVar<Fr>> = path
                .siblings
                .iter()
                .map(|s| FpVar::<Fr>::new_witness(cs.clone(), || Ok(*s)))
                .collect::<Result<_, _>>()?;
            let is_right: Vec<Boolean<Fr>> = path
                .is_right
                .iter()
                .map(|b| Boolean::new_witness(cs.clone(), || Ok(*b)))
                .collect::<Result<_, _>>()?;
            enforce_membership_if(
                cs.clone(),
                &cfg,
                &active,
                &leaf,
                &merkle_root,
                &siblings,
                &is_right,
            )?;

            loc_sum += &additions + &deletions;
            commit_ids.push(commit_id);
            commit_active.push(active);
        }

        // A commit cannot be claimed twice.
        enforce_distinct_active(&commit_ids, &commit_active)?;

        // Sub-claim 1+2: commit count and exact LOC sum in their ranges.
        let commit_count = count_active(&commit_active)?;
        enforce_in_range(&commit_count, &commit_lo, &commit_hi, RANGE_BITS)?;
        enforce_in_range(&loc_sum, &loc_lo, &loc_hi, RANGE_BITS)?;

        // Sub-claim 3: languages.
        let mut fingerprints = Vec::with_capacity(L);
        let mut lines = Vec::with_capacity(L);
        let mut proficiency = Vec::with_capacity(L);
        let mut lang_active = Vec::with_capacity(L);
        for slot in &self.languages {
            fingerprints
                .push(FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.fingerprint)))?);
            lines.push(FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.lines)))?);
            proficiency
                .push(FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(slot.proficiency)))?);
            lang_active.push(Boolean::new_witness(cs.clone(), || Ok(slot.active))?);
        }
        let lang = enforce_language_claims(
            cs.clone(),
            &cfg,
            &fingerprints,
            &lines,
            &proficiency,
            &lang_active,
            &usage_threshold,
        )?;
        lang.count.enforce_equal(&language_count)?;
        lang.set_fingerprint.enforce_equal(&language_set_fingerprint)?;

        // Sub-claim 4: collaboration.
        let contribution_pct =
            FpVar::<Fr>::new_witness(cs.clone(), || Ok(Fr::from(self.contribution_pct)))?;
        let mut identities = Vec::with_capacity(K);
        let mut collab_active = Vec::with_capacity(K);
        for c in &self.collaborators {
            identities.push(FpVar::<Fr>::new_witness(cs.clone(), || Ok(c.identity))?);
            collab_active.push(Boolean::new_witness(cs.clone(), || Ok(c.active))?);
        }
        let collab = enforce_collaboration_claims(
            cs.clone(),
            &cfg,
            &identities,
            &collab_active,
            &contribution_pct,
            &collab_lo,
            &collab_hi,
        )?;
        collab.score.enforce_equal(&claimed_score)?;

        // Sub-claim 5: non-ownership.
        let user_hash =
            hash_elems_var(cs.clone(), &cfg, DOMAIN_ADDRESS, &[user_address.clone()])?;
        user_hash.enforce_not_equal(&repo_owner_hash)?;

        // Sub-claim 6: signature binds the user to this repository.
        enforce_signature(
            cs.clone(),
            &cfg,
            &secret_key,
            &repo_hash,
            &user_address,
            &signature,
        )?;

        // Credential hash: commitment over user, claim values, timestamp.
        let commitment = hash_elems_var(
            cs,
            &cfg,
            DOMAIN_CREDENTIAL,
            &[
                user_address,
                repo_hash,
                commit_lo,
                commit_hi,
                loc_lo,
                loc_hi,
                language_set_fingerprint,
                claimed_score,
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

    const TEST_DEPTH: usize = 4;
    type TestCircuit = RepositoryCredentialCircuit<16, 5, 8>;

    fn commit(id: u64, additions: u64, deletions: u64) -> CommitSlot {
        CommitSlot {
            commit_id: Fr::from(id),
            additions,
            deletions,
            active: true,
        }
    }

    fn build(commit_count: u64, commit_range: ClaimRange) -> Result<TestCircuit, CircuitError> {
        let cfg = poseidon_config();

        let mut commits: Vec<CommitSlot> = (1..=commit_count)
            .map(|i| commit(i, 10, 5))
            .collect();
        commits.resize(16, CommitSlot::empty());

        let languages = LanguageCredentialCircuit::<5>::canonical_slots(vec![
            LanguageSlot { fingerprint: 11, lines: 500, proficiency: 70, active: true },
            LanguageSlot { fingerprint: 22, lines: 300, proficiency: 55, active: true },
            LanguageSlot { fingerprint: 33, lines: 250, proficiency: 40, active: true },
        ])?;

        let collaborators = CollaborationCredentialCircuit::<8>::pad_collaborators(vec![
            CollaboratorSlot { identity: Fr::from(101u64), contribution_pct: 30, active: true },
            CollaboratorSlot { identity: Fr::from(102u64), contribution_pct: 20, active: true },
            CollaboratorSlot { identity: Fr::from(103u64), contribution_pct: 10, active: true },
        ])?;

        let loc_total = commit_count * 15;
        TestCircuit::new(
            &cfg,
            commits,
            languages,
            collaborators,
            40,
            Fr::from(777u64),
            Fr::from(4242u64),
            // Owner hash of someone else entirely.
            Fr::from(9999u64),
            commit_range,
            ClaimRange { lo: loc_total.saturating_sub(50), hi: loc_total + 50 },
            100,
            ClaimRange { lo: 2, hi: 10 },
            1700000000,
            TEST_DEPTH,
        )
    }

    #[test]
    fn valid_credential_satisfies() {
        let circuit = build(12, ClaimRange { lo: 10, hi: 20 }).unwrap();
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn commit_count_outside_range_fails_fast() {
        // Claimed range [10, 20] with only 8 actual commits: witness
        // generation fails, no proof is produced.
        let err = build(8, ClaimRange { lo: 10, hi: 20 }).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::InputRangeViolation { field: "commit_count", .. }
        ));
    }

    #[test]
    fn credential_hash_is_deterministic() {
        let a = build(12, ClaimRange { lo: 10, hi: 20 }).unwrap();
        let b = build(12, ClaimRange { lo: 10, hi: 20 }).unwrap();
        assert_eq!(a.credential_hash, b.credential_hash);
    }

    #[test]
    fn tampered_merkle_root_unsatisfiable() {
        let mut circuit = build(12, ClaimRange { lo: 10, hi: 20 }).unwrap();
        circuit.merkle_root += Fr::from(1u64);
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn duplicated_commit_unsatisfiable() {
        let mut circuit = build(12, ClaimRange { lo: 10, hi: 20 }).unwrap();
        // Claim the same commit twice by copying a slot (paths included).
        circuit.commits[1] = circuit.commits[0].clone();
        circuit.commit_paths[1] = circuit.commit_paths[0].clone();
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn owner_cannot_claim_non_ownership() {
        let cfg = poseidon_config();
        let circuit = build(12, ClaimRange { lo: 10, hi: 20 }).unwrap();
        // Re-point the owner hash at the prover's own address hash.
        let user_hash = hash_elems(&cfg, DOMAIN_ADDRESS, &[circuit.user_address]);
        let mut circuit = circuit;
        circuit.repo_owner_hash = user_hash;
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn scenario_a_and_b_at_full_capacity() {
        // Scenario A: 120 commits in [100, 200], languages above threshold,
        // 3 collaborators in [2, 10], distinct owner: witness construction
        // succeeds and the credential hash is deterministic.
        let cfg = poseidon_config();
        let build_full = |count: u64| {
            let mut commits: Vec<CommitSlot> =
                (1..=count).map(|i| commit(i, 20, 10)).collect();
            commits.resize(crate::constants::MAX_COMMITS, CommitSlot::empty());
            let languages = LanguageCredentialCircuit::<10>::canonical_slots(
                (1..=5u64)
                    .map(|i| LanguageSlot {
                        fingerprint: i * 7,
                        lines: 400 + i * 10,
                        proficiency: 60,
                        active: true,
                    })
                    .collect(),
            )
            .unwrap();
            let collaborators = CollaborationCredentialCircuit::<16>::pad_collaborators(
                (1..=3u64)
                    .map(|i| CollaboratorSlot {
                        identity: Fr::from(1000 + i),
                        contribution_pct: 15,
                        active: true,
                    })
                    .collect(),
            )
            .unwrap();
            RepositoryCredentialCircuit::<{ crate::constants::MAX_COMMITS }, 10, 16>::new(
                &cfg,
                commits,
                languages,
                collaborators,
                55,
                Fr::from(777u64),
                Fr::from(4242u64),
                Fr::from(9999u64),
                ClaimRange { lo: 100, hi: 200 },
                ClaimRange { lo: 1000, hi: 10000 },
                100,
                ClaimRange { lo: 2, hi: 10 },
                1700000000,
                crate::constants::MERKLE_DEPTH,
            )
        };

        let a1 = build_full(120).unwrap();
        let a2 = build_full(120).unwrap();
        assert_eq!(a1.credential_hash, a2.credential_hash);

        // Scenario B: identical inputs with 80 actual commits fall outside
        // [100, 200]: witness generation fails, no proof is produced.
        let err = build_full(80).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::InputRangeViolation { field: "commit_count", .. }
        ));
    }
}
