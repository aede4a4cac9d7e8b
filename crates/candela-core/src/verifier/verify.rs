use crate::types::block::{Header, HeaderError, SignedHeader};
use crate::types::time::Time;
use crate::types::trust::{Options, TrustLevel, TrustedState};
use crate::types::validator::ValidatorSet;
use crate::verifier::domain::{HashDomain, LegacyDomain, SeparatedDomain};
use crate::verifier::quorum::{self, QuorumError};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Outcome of a failed verification. Every variant is a decision the caller
/// can act on: re-bootstrap, bisect to a closer header, fix the call, or
/// discard the header. Nothing is retried in here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The supplied trust fraction lies outside [1/3, 1]. Not retryable
    /// without correcting the input.
    #[error("trust level must be within [1/3, 1], got {numerator}/{denominator}")]
    InvalidTrustLevel { numerator: u64, denominator: u64 },

    /// The trusted header's trusting period has lapsed; trust must be
    /// re-bootstrapped from a fresher source.
    #[error("trusted header expired at {expired_at} (now: {now})")]
    OldHeaderExpired { expired_at: Time, now: Time },

    /// The untrusted header failed a security check; the nested cause is the
    /// exact reason. Never retried.
    #[error("invalid header: {0}")]
    InvalidHeader(#[from] HeaderError),

    /// The trust-weighted quorum over the previously trusted validator set
    /// fell short. Distinct from `InvalidHeader` because the right reaction
    /// is often to try a closer (lower-height) header, not to give up.
    #[error("cannot trust new validator set: {0}")]
    NewValidatorSetCantBeTrusted(QuorumError),

    /// Adjacent continuity was broken: the set signing height X+1 is not
    /// the one height X announced.
    #[error(
        "expected old header next validators ({}) to match those from new header ({})",
        hex::encode(.expected),
        hex::encode(.got)
    )]
    NextValidatorsMismatch {
        expected: crate::types::block::Hash,
        got: crate::types::block::Hash,
    },

    /// The wrong verifier was invoked for this height relationship. A usage
    /// error in the caller's dispatch, not a security failure.
    #[error("wrong verifier for untrusted height {untrusted} against trusted height {trusted}")]
    HeightMismatch { trusted: u64, untrusted: u64 },
}

/// Checks that `level` is within the allowed range [1/3, 1]. 1/3 is the
/// minimum amount of trust that does not break the security model.
pub fn validate_trust_level(level: TrustLevel) -> Result<(), VerifyError> {
    if !level.in_range() {
        return Err(VerifyError::InvalidTrustLevel {
            numerator: level.numerator,
            denominator: level.denominator,
        });
    }
    Ok(())
}

/// Whether `header` has outlived `trusting_period` as of `now`. Expiry is
/// non-strict: a header whose period ends exactly now is already expired.
pub fn header_expired(header: &Header, trusting_period: Duration, now: Time) -> bool {
    let expires_at = header.time.saturating_add(trusting_period);
    expires_at <= now
}

/// The consistency gate shared by both forward verifiers: self-consistency
/// of the untrusted pair, monotonic height and time relative to the trusted
/// header, the clock-drift bound, and the header/validator-set binding.
fn verify_new_header_and_vals<D: HashDomain>(
    untrusted: &SignedHeader,
    untrusted_vals: &ValidatorSet,
    trusted: &SignedHeader,
    now: Time,
    max_clock_drift: Duration,
    domain: &D,
) -> Result<(), HeaderError> {
    untrusted.validate_basic(&trusted.header.chain_id, domain)?;

    if untrusted_vals.is_empty() {
        return Err(HeaderError::EmptyValidatorSet);
    }

    if untrusted.header.height <= trusted.header.height {
        return Err(HeaderError::NonMonotonicHeight {
            trusted: trusted.header.height,
            untrusted: untrusted.header.height,
        });
    }

    if untrusted.header.time <= trusted.header.time {
        return Err(HeaderError::NonMonotonicTime {
            trusted: trusted.header.time,
            untrusted: untrusted.header.time,
        });
    }

    // Strictly before now + drift: a header stamped exactly at the bound is
    // from the future.
    if untrusted.header.time >= now.saturating_add(max_clock_drift) {
        return Err(HeaderError::HeaderFromFuture {
            header_time: untrusted.header.time,
            now,
            max_clock_drift,
        });
    }

    let computed = domain.hash_validator_set(untrusted_vals);
    if untrusted.header.validators_hash != computed {
        return Err(HeaderError::ValidatorsHashMismatch {
            header: untrusted.header.validators_hash,
            computed,
        });
    }

    Ok(())
}

/// Verifies `untrusted` exactly one height above `trusted` via validator-set
/// continuity: the set signing height X+1 must be precisely the one height X
/// announced as its successor, and more than 2/3 of it must have signed.
pub fn verify_adjacent<D: HashDomain>(
    trusted: &SignedHeader,
    untrusted: &SignedHeader,
    untrusted_vals: &ValidatorSet,
    trusting_period: Duration,
    now: Time,
    max_clock_drift: Duration,
    domain: &D,
) -> Result<(), VerifyError> {
    if untrusted.header.height != trusted.header.height + 1 {
        return Err(VerifyError::HeightMismatch {
            trusted: trusted.header.height,
            untrusted: untrusted.header.height,
        });
    }

    if header_expired(&trusted.header, trusting_period, now) {
        return Err(VerifyError::OldHeaderExpired {
            expired_at: trusted.header.time.saturating_add(trusting_period),
            now,
        });
    }

    verify_new_header_and_vals(untrusted, untrusted_vals, trusted, now, max_clock_drift, domain)?;

    if untrusted.header.validators_hash != trusted.header.next_validators_hash {
        return Err(VerifyError::NextValidatorsMismatch {
            expected: trusted.header.next_validators_hash,
            got: untrusted.header.validators_hash,
        });
    }

    let block_hash = domain.hash_header(&untrusted.header);
    quorum::verify_commit_full(
        untrusted_vals,
        &trusted.header.chain_id,
        &block_hash,
        untrusted.header.height,
        &untrusted.commit,
        domain,
    )
    .map_err(|e| VerifyError::InvalidHeader(HeaderError::Quorum(e)))?;

    Ok(())
}

/// Verifies `untrusted` more than one height above `trusted`.
///
/// Continuity is unavailable without adjacency, so trust is established in
/// two steps: signers from the *trusted* set controlling more than
/// `trust_level` of its power must have signed the new commit (some
/// previously trusted validators vouch for it), and more than 2/3 of the
/// *untrusted* set must have signed its own header. The full check over the
/// untrusted set runs last: that set's size is attacker-controlled, and the
/// cheaper gates should reject first.
pub fn verify_non_adjacent<D: HashDomain>(
    trusted: &SignedHeader,
    trusted_vals: &ValidatorSet,
    untrusted: &SignedHeader,
    untrusted_vals: &ValidatorSet,
    trusting_period: Duration,
    now: Time,
    max_clock_drift: Duration,
    trust_level: TrustLevel,
    domain: &D,
) -> Result<(), VerifyError> {
    if untrusted.header.height == trusted.header.height + 1 {
        return Err(VerifyError::HeightMismatch {
            trusted: trusted.header.height,
            untrusted: untrusted.header.height,
        });
    }

    validate_trust_level(trust_level)?;

    if header_expired(&trusted.header, trusting_period, now) {
        return Err(VerifyError::OldHeaderExpired {
            expired_at: trusted.header.time.saturating_add(trusting_period),
            now,
        });
    }

    verify_new_header_and_vals(untrusted, untrusted_vals, trusted, now, max_clock_drift, domain)?;

    match quorum::verify_commit_trusting(
        trusted_vals,
        &trusted.header.chain_id,
        &untrusted.commit,
        trust_level,
        domain,
    ) {
        Ok(()) => {}
        Err(e @ QuorumError::NotEnoughVotingPower { .. }) => {
            return Err(VerifyError::NewValidatorSetCantBeTrusted(e));
        }
        Err(e) => return Err(VerifyError::InvalidHeader(HeaderError::Quorum(e))),
    }

    let block_hash = domain.hash_header(&untrusted.header);
    quorum::verify_commit_full(
        untrusted_vals,
        &trusted.header.chain_id,
        &block_hash,
        untrusted.header.height,
        &untrusted.commit,
        domain,
    )
    .map_err(|e| VerifyError::InvalidHeader(HeaderError::Quorum(e)))?;

    Ok(())
}

/// Verifies `untrusted` at a height *below* `trusted` by hash-chaining: the
/// trusted header already commits to its predecessor's content hash, so no
/// signatures need re-checking.
pub fn verify_backwards<D: HashDomain>(
    untrusted: &Header,
    trusted: &Header,
    domain: &D,
) -> Result<(), VerifyError> {
    untrusted
        .validate_basic()
        .map_err(VerifyError::InvalidHeader)?;

    if untrusted.chain_id != trusted.chain_id {
        return Err(VerifyError::InvalidHeader(HeaderError::ChainIdMismatch {
            expected: trusted.chain_id.clone(),
            got: untrusted.chain_id.clone(),
        }));
    }

    if untrusted.time >= trusted.time {
        return Err(VerifyError::InvalidHeader(HeaderError::NonMonotonicTime {
            trusted: trusted.time,
            untrusted: untrusted.time,
        }));
    }

    let computed = domain.hash_header(untrusted);
    if computed != trusted.last_block_hash {
        return Err(VerifyError::InvalidHeader(
            HeaderError::LastBlockHashMismatch {
                recorded: trusted.last_block_hash,
                computed,
            },
        ));
    }

    Ok(())
}

/// The dispatcher: validates the trust level, then routes by height delta —
/// adjacent verification for exactly one height above the trusted header,
/// skipping verification otherwise. Runs under the current hash domain
/// end-to-end.
#[allow(clippy::too_many_arguments)]
pub fn verify(
    trusted: &SignedHeader,
    trusted_vals: &ValidatorSet,
    untrusted: &SignedHeader,
    untrusted_vals: &ValidatorSet,
    trusting_period: Duration,
    now: Time,
    max_clock_drift: Duration,
    trust_level: TrustLevel,
) -> Result<(), VerifyError> {
    verify_in(
        trusted,
        trusted_vals,
        untrusted,
        untrusted_vals,
        trusting_period,
        now,
        max_clock_drift,
        trust_level,
        &SeparatedDomain,
    )
}

/// Identical dispatch to [`verify`], but under the legacy hash domain
/// end-to-end. Legacy and current sub-checks are never mixed: the domain is
/// selected here once and threaded through every gate.
#[allow(clippy::too_many_arguments)]
pub fn verify_legacy(
    trusted: &SignedHeader,
    trusted_vals: &ValidatorSet,
    untrusted: &SignedHeader,
    untrusted_vals: &ValidatorSet,
    trusting_period: Duration,
    now: Time,
    max_clock_drift: Duration,
    trust_level: TrustLevel,
) -> Result<(), VerifyError> {
    verify_in(
        trusted,
        trusted_vals,
        untrusted,
        untrusted_vals,
        trusting_period,
        now,
        max_clock_drift,
        trust_level,
        &LegacyDomain,
    )
}

/// Dispatch under a caller-selected hash domain.
#[allow(clippy::too_many_arguments)]
pub fn verify_in<D: HashDomain>(
    trusted: &SignedHeader,
    trusted_vals: &ValidatorSet,
    untrusted: &SignedHeader,
    untrusted_vals: &ValidatorSet,
    trusting_period: Duration,
    now: Time,
    max_clock_drift: Duration,
    trust_level: TrustLevel,
    domain: &D,
) -> Result<(), VerifyError> {
    validate_trust_level(trust_level)?;

    let adjacent = untrusted.header.height == trusted.header.height + 1;
    debug!(
        trusted_height = trusted.header.height,
        untrusted_height = untrusted.header.height,
        adjacent,
        "verifying untrusted header"
    );

    if adjacent {
        verify_adjacent(
            trusted,
            untrusted,
            untrusted_vals,
            trusting_period,
            now,
            max_clock_drift,
            domain,
        )
    } else {
        verify_non_adjacent(
            trusted,
            trusted_vals,
            untrusted,
            untrusted_vals,
            trusting_period,
            now,
            max_clock_drift,
            trust_level,
            domain,
        )
    }
}

/// [`verify`] against a caller-held [`TrustedState`], with the parameters
/// bundled in [`Options`]. On success the caller promotes the untrusted
/// pair to its new trusted state; this function never does.
pub fn verify_with_options(
    trusted: &TrustedState,
    untrusted: &SignedHeader,
    untrusted_vals: &ValidatorSet,
    options: &Options,
    now: Time,
) -> Result<(), VerifyError> {
    verify(
        trusted.signed_header(),
        trusted.validators(),
        untrusted,
        untrusted_vals,
        options.trusting_period,
        now,
        options.max_clock_drift,
        options.trust_level,
    )
}
