use crate::types::block::{Address, Commit, CommitSig, Hash, Signature};
use crate::types::trust::TrustLevel;
use crate::types::validator::ValidatorSet;
use crate::verifier::domain::HashDomain;
use ed25519_dalek::{Verifier, VerifyingKey};
use thiserror::Error;

/// Why a commit failed a quorum check.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuorumError {
    #[error("not enough voting power signed: tallied {signed} of {total} total")]
    NotEnoughVotingPower { signed: u128, total: u128 },

    #[error("invalid commit signature at index {index}")]
    InvalidSignature { index: usize },

    #[error("malformed validator public key at index {index}")]
    InvalidPublicKey { index: usize },

    #[error("commit has {got} signature entries, validator set has {want}")]
    SignatureCountMismatch { got: usize, want: usize },

    #[error("commit is for height {commit}, expected {expected}")]
    HeightMismatch { expected: u64, commit: u64 },

    #[error(
        "commit is for block {}, expected {}",
        hex::encode(.commit),
        hex::encode(.expected)
    )]
    BlockHashMismatch { expected: Hash, commit: Hash },

    #[error("signature entry at index {index} names the wrong validator")]
    WrongValidatorAddress { index: usize },

    #[error("validator {} is counted twice in the commit", hex::encode(.address))]
    DuplicateVote { address: Address },
}

/// Full quorum check: signers controlling strictly more than 2/3 of
/// `validators`' total power must have validly signed `commit` for exactly
/// (`height`, `block_hash`) under `chain_id`.
///
/// Signature entries are aligned positionally with the validator set, so
/// the entry count must match the set exactly. Absent and nil votes
/// contribute no power but are not errors; a commit vote naming the wrong
/// validator or carrying a bad signature is. Returns as soon as the tally
/// crosses the threshold — the remaining signatures cannot change the
/// verdict and the set's size may be attacker-chosen.
pub fn verify_commit_full<D: HashDomain>(
    validators: &ValidatorSet,
    chain_id: &str,
    block_hash: &Hash,
    height: u64,
    commit: &Commit,
    domain: &D,
) -> Result<(), QuorumError> {
    if commit.height != height {
        return Err(QuorumError::HeightMismatch {
            expected: height,
            commit: commit.height,
        });
    }
    if &commit.block_hash != block_hash {
        return Err(QuorumError::BlockHashMismatch {
            expected: *block_hash,
            commit: commit.block_hash,
        });
    }
    if commit.signatures.len() != validators.len() {
        return Err(QuorumError::SignatureCountMismatch {
            got: commit.signatures.len(),
            want: validators.len(),
        });
    }

    let total = validators.total_power();
    let quorum = total * 2 / 3;
    let mut tallied: u128 = 0;

    for (index, (validator, sig)) in validators
        .validators()
        .iter()
        .zip(&commit.signatures)
        .enumerate()
    {
        let CommitSig::Commit {
            validator_address,
            timestamp,
            signature,
        } = sig
        else {
            continue;
        };

        if validator_address != &validator.address() {
            return Err(QuorumError::WrongValidatorAddress { index });
        }

        let msg = domain.vote_sign_bytes(chain_id, commit.height, &commit.block_hash, *timestamp);
        verify_vote_signature(&validator.pub_key, &msg, signature, index)?;

        tallied += u128::from(validator.power);
        if tallied > quorum {
            return Ok(());
        }
    }

    Err(QuorumError::NotEnoughVotingPower {
        signed: tallied,
        total,
    })
}

/// Trust-weighted quorum check: signers found in `validators` (a previously
/// trusted set) controlling more than `trust_level` of its total power must
/// have validly signed `commit` under `chain_id`.
///
/// Unlike the full check, the commit was produced by a *different* set, so
/// signers are matched by address rather than position. Signers the trusted
/// set no longer contains are skipped — rotation is exactly the situation
/// this check exists for — but a trusted signer counted twice is an error,
/// and a trusted signer's bad signature is an error.
pub fn verify_commit_trusting<D: HashDomain>(
    validators: &ValidatorSet,
    chain_id: &str,
    commit: &Commit,
    trust_level: TrustLevel,
    domain: &D,
) -> Result<(), QuorumError> {
    let total = validators.total_power();
    let needed = total * u128::from(trust_level.numerator) / u128::from(trust_level.denominator);

    let mut seen = vec![false; validators.len()];
    let mut tallied: u128 = 0;

    for (index, sig) in commit.signatures.iter().enumerate() {
        let CommitSig::Commit {
            validator_address,
            timestamp,
            signature,
        } = sig
        else {
            continue;
        };

        let Some(position) = validators.position(validator_address) else {
            continue;
        };
        if seen[position] {
            return Err(QuorumError::DuplicateVote {
                address: *validator_address,
            });
        }
        seen[position] = true;

        let validator = &validators.validators()[position];
        let msg = domain.vote_sign_bytes(chain_id, commit.height, &commit.block_hash, *timestamp);
        verify_vote_signature(&validator.pub_key, &msg, signature, index)?;

        tallied += u128::from(validator.power);
        if tallied > needed {
            return Ok(());
        }
    }

    Err(QuorumError::NotEnoughVotingPower {
        signed: tallied,
        total,
    })
}

fn verify_vote_signature(
    pub_key: &[u8; 32],
    msg: &[u8],
    signature: &Signature,
    index: usize,
) -> Result<(), QuorumError> {
    let key =
        VerifyingKey::from_bytes(pub_key).map_err(|_| QuorumError::InvalidPublicKey { index })?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    key.verify(msg, &sig)
        .map_err(|_| QuorumError::InvalidSignature { index })
}
