//! # Candela Core
//!
//! Pure Rust light-client header verification for BFT validator-set chains.
//!
//! This crate contains **no networking code** and performs **no I/O**. It is
//! the security core of Candela's bridging stack — given a header/validator
//! set pair you already trust, it decides whether a newer untrusted pair may
//! be trusted, without replaying block history. Every cross-chain state
//! proof ultimately rests on the decisions made here.
//!
//! ## Trust Model
//!
//! - **Adjacent verification**: a header exactly one height above the
//!   trusted one is accepted if the validator set signing it is precisely
//!   the set the trusted header announced as its successor, and more than
//!   2/3 of that set's voting power signed the commit.
//!
//! - **Skipping verification**: a header further ahead has no continuity to
//!   lean on, so two quorums are required — validators from the *trusted*
//!   set controlling more than the trust level (default 1/3) of its power
//!   must have signed the new commit, and more than 2/3 of the *untrusted*
//!   set must have signed its own header. Sound as long as at most 1/3 of
//!   trusted voting power is Byzantine within the trusting period.
//!
//! - **Backward verification**: headers below the trusted height are
//!   checked by hash-chaining alone; the trusted header already commits to
//!   its predecessor's content hash.
//!
//! Chains that migrated their commit-hashing scheme keep a legacy domain
//! alive; [`verify`] and [`verify_legacy`] run the same algorithm under the
//! two domains, which never cross-validate.
//!
//! ## Scope
//!
//! Fetching headers, choosing which height to request next (bisection),
//! persisting trusted state, and the connection-handshake machinery that
//! consumes these decisions all live in the layers above. Every function
//! here is total, side-effect-free, and safe to call concurrently; the
//! caller serializes updates to its own trusted state.
//!
//! ## Usage
//!
//! ```ignore
//! use candela_core::{verify, DEFAULT_TRUST_LEVEL};
//!
//! verify(
//!     trusted.signed_header(),
//!     trusted.validators(),
//!     &untrusted_header,
//!     &untrusted_vals,
//!     trusting_period,
//!     now,
//!     max_clock_drift,
//!     DEFAULT_TRUST_LEVEL,
//! )?;
//! // On Ok, promote (untrusted_header, untrusted_vals) to the new trusted state.
//! ```

pub mod types;
pub mod verifier;

// Re-export commonly used items for convenience
pub use types::{
    block::{Address, Commit, CommitSig, Hash, Header, HeaderError, SignedHeader, Signature},
    time::Time,
    trust::{Options, TrustLevel, TrustedState, DEFAULT_TRUST_LEVEL},
    validator::{Validator, ValidatorSet},
};
pub use verifier::{
    domain::{HashDomain, LegacyDomain, SeparatedDomain},
    quorum::{verify_commit_full, verify_commit_trusting, QuorumError},
    verify::{
        header_expired, validate_trust_level, verify, verify_adjacent, verify_backwards,
        verify_in, verify_legacy, verify_non_adjacent, verify_with_options, VerifyError,
    },
};
