use crate::types::block::{HeaderError, SignedHeader};
use crate::types::validator::ValidatorSet;
use crate::verifier::domain::HashDomain;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A rational trust fraction in the closed range [1/3, 1]: the share of a
/// previously trusted validator set's power that must vouch for a new commit
/// during skipping verification.
///
/// 1/3 is the theoretical minimum under the assumption that at most 1/3 of
/// trusted voting power is Byzantine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustLevel {
    pub numerator: u64,
    pub denominator: u64,
}

/// Default trust level: a new header can be trusted if at least one correct
/// validator signed it.
pub const DEFAULT_TRUST_LEVEL: TrustLevel = TrustLevel::new(1, 3);

impl TrustLevel {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Whether this fraction lies within [1/3, 1]. Cross-multiplied in u128:
    /// no floating point, no overflow.
    pub fn in_range(&self) -> bool {
        let n = u128::from(self.numerator);
        let d = u128::from(self.denominator);
        d != 0 && n * 3 >= d && n <= d
    }
}

impl Default for TrustLevel {
    fn default() -> Self {
        DEFAULT_TRUST_LEVEL
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Caller-supplied verification parameters. There is no ambient
/// configuration anywhere in this crate: every verification call receives
/// its clock, drift bound, and trust level explicitly, and `Options` is just
/// the bundle callers thread through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// How long a trusted header's security guarantee lasts.
    pub trusting_period: Duration,
    /// Tolerance for a new header's timestamp being ahead of our clock.
    pub max_clock_drift: Duration,
    /// Fraction of trusted power required for skipping verification.
    pub trust_level: TrustLevel,
}

/// The caller-held (SignedHeader, ValidatorSet) pair considered trustworthy
/// as of now. Never mutated: a successful verification means the caller
/// builds a new `TrustedState` from the just-verified pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedState {
    signed_header: SignedHeader,
    validators: ValidatorSet,
}

impl TrustedState {
    /// Pair a signed header with its validator set, checking the binding
    /// `header.validators_hash == domain.hash_validator_set(validators)` so
    /// a mismatched pair can never become trusted state.
    pub fn new<D: HashDomain>(
        signed_header: SignedHeader,
        validators: ValidatorSet,
        domain: &D,
    ) -> Result<Self, HeaderError> {
        let computed = domain.hash_validator_set(&validators);
        if signed_header.header.validators_hash != computed {
            return Err(HeaderError::ValidatorsHashMismatch {
                header: signed_header.header.validators_hash,
                computed,
            });
        }
        Ok(Self {
            signed_header,
            validators,
        })
    }

    pub fn signed_header(&self) -> &SignedHeader {
        &self.signed_header
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    pub fn height(&self) -> u64 {
        self.signed_header.header.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::block::{Commit, Header};
    use crate::types::time::Time;
    use crate::types::validator::Validator;
    use crate::verifier::domain::SeparatedDomain;
    use proptest::prelude::*;

    #[test]
    fn test_trust_level_boundaries() {
        // The two closed endpoints are accepted.
        assert!(TrustLevel::new(1, 3).in_range());
        assert!(TrustLevel::new(1, 1).in_range());
        // Equivalent fractions at the endpoints too.
        assert!(TrustLevel::new(2, 6).in_range());
        assert!(TrustLevel::new(3, 3).in_range());
        // Just below 1/3 and anything above 1 are rejected.
        assert!(!TrustLevel::new(33, 100).in_range());
        assert!(!TrustLevel::new(4, 3).in_range());
        // Degenerate denominators are rejected.
        assert!(!TrustLevel::new(1, 0).in_range());
        assert!(!TrustLevel::new(0, 0).in_range());
    }

    #[test]
    fn test_trust_level_no_overflow_on_extreme_fractions() {
        assert!(TrustLevel::new(u64::MAX, u64::MAX).in_range());
        assert!(!TrustLevel::new(u64::MAX, 1).in_range());
    }

    #[test]
    fn test_trusted_state_enforces_binding() {
        let validators = ValidatorSet::new(vec![Validator::new([1; 32], 10)]);
        let domain = SeparatedDomain;

        let mut header = Header {
            chain_id: "test-chain".to_string(),
            height: 1,
            time: Time::from_unix_secs(1_700_000_000),
            validators_hash: domain.hash_validator_set(&validators),
            next_validators_hash: [0; 32],
            last_block_hash: [0; 32],
        };
        let commit = Commit {
            height: 1,
            block_hash: domain.hash_header(&header),
            signatures: vec![],
        };

        let good = TrustedState::new(
            SignedHeader {
                header: header.clone(),
                commit: commit.clone(),
            },
            validators.clone(),
            &domain,
        );
        assert!(good.is_ok());

        header.validators_hash = [0xEE; 32];
        let bad = TrustedState::new(SignedHeader { header, commit }, validators, &domain);
        assert!(matches!(
            bad,
            Err(HeaderError::ValidatorsHashMismatch { .. })
        ));
    }

    proptest! {
        /// The range check depends only on the fraction's value, not its
        /// representation: scaling both terms never changes the verdict.
        #[test]
        fn prop_in_range_is_scale_invariant(
            n in 0u64..1_000_000,
            d in 1u64..1_000_000,
            k in 1u64..1_000,
        ) {
            prop_assert_eq!(
                TrustLevel::new(n, d).in_range(),
                TrustLevel::new(n * k, d * k).in_range()
            );
        }
    }
}
