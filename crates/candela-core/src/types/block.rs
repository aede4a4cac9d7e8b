use crate::types::time::Time;
use crate::verifier::domain::HashDomain;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 32-byte digest used for every hash in the protocol.
pub type Hash = [u8; 32];

/// 20-byte validator address (truncated SHA-256 of the public key).
pub type Address = [u8; 20];

/// Number of bytes in an Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// An Ed25519 signature over a vote (64 bytes).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LEN]);

impl Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != SIGNATURE_LEN {
            return Err("Invalid signature length");
        }
        let mut arr = [0u8; SIGNATURE_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// A block header, reduced to the fields light-client verification needs.
///
/// The content hash is deliberately not stored: it is a pure function of the
/// fields below, computed by a [`HashDomain`], so a header can never carry a
/// digest that disagrees with its contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Identifier of the chain this header belongs to.
    pub chain_id: String,
    /// Block height, strictly positive.
    pub height: u64,
    /// Consensus time at which the block was proposed.
    pub time: Time,
    /// Digest of the validator set that must have signed this header.
    pub validators_hash: Hash,
    /// Digest of the validator set expected to sign the next header.
    pub next_validators_hash: Hash,
    /// Content hash of the immediately preceding header.
    pub last_block_hash: Hash,
}

impl Header {
    /// Structural well-formedness of the header in isolation.
    pub fn validate_basic(&self) -> Result<(), HeaderError> {
        if self.chain_id.is_empty() {
            return Err(HeaderError::EmptyChainId);
        }
        if self.height == 0 {
            return Err(HeaderError::NonPositiveHeight);
        }
        Ok(())
    }
}

/// One validator's entry in a commit: absent, a commit vote for the block,
/// or a nil vote. Only commit votes contribute power to a quorum; the other
/// two states are recorded so a commit is always positionally complete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitSig {
    /// The validator did not vote in the commit round.
    Absent,
    /// The validator signed a commit vote for this block.
    Commit {
        validator_address: Address,
        timestamp: Time,
        signature: Signature,
    },
    /// The validator signed a vote for no block this round.
    Nil {
        validator_address: Address,
        timestamp: Time,
        signature: Signature,
    },
}

/// The quorum certificate for one block: per-validator signature entries,
/// positionally aligned with the validator set that produced them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Height this commit certifies.
    pub height: u64,
    /// Content hash of the header this commit certifies.
    pub block_hash: Hash,
    /// One entry per validator, in validator-set order.
    pub signatures: Vec<CommitSig>,
}

/// A header paired with the commit that certifies it at that exact height.
///
/// Constructed once by whatever fetched it off the network, then treated as
/// read-only by verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedHeader {
    pub header: Header,
    pub commit: Commit,
}

impl SignedHeader {
    /// Self-consistency of the pair against the expected chain id: the
    /// header must be well-formed and belong to `chain_id`, and the commit
    /// must reference exactly this header (same height, same content hash
    /// under `domain`).
    pub fn validate_basic<D: HashDomain>(
        &self,
        chain_id: &str,
        domain: &D,
    ) -> Result<(), HeaderError> {
        self.header.validate_basic()?;

        if self.header.chain_id != chain_id {
            return Err(HeaderError::ChainIdMismatch {
                expected: chain_id.to_string(),
                got: self.header.chain_id.clone(),
            });
        }

        if self.commit.height != self.header.height {
            return Err(HeaderError::CommitHeightMismatch {
                header: self.header.height,
                commit: self.commit.height,
            });
        }

        let header_hash = domain.hash_header(&self.header);
        if self.commit.block_hash != header_hash {
            return Err(HeaderError::CommitBlockHashMismatch {
                header: header_hash,
                commit: self.commit.block_hash,
            });
        }

        Ok(())
    }
}

/// Concrete reason a header was rejected. Nested inside
/// [`VerifyError::InvalidHeader`](crate::verifier::VerifyError) so callers
/// always see the exact failing check, never a generic "invalid".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header has an empty chain id")]
    EmptyChainId,

    #[error("header height must be positive")]
    NonPositiveHeight,

    #[error("header belongs to chain {got:?}, expected {expected:?}")]
    ChainIdMismatch { expected: String, got: String },

    #[error("commit is for height {commit}, header is at height {header}")]
    CommitHeightMismatch { header: u64, commit: u64 },

    #[error(
        "commit certifies block {} but the header hashes to {}",
        hex::encode(.commit),
        hex::encode(.header)
    )]
    CommitBlockHashMismatch { header: Hash, commit: Hash },

    #[error("validator set is empty")]
    EmptyValidatorSet,

    #[error("expected new header height {untrusted} to be greater than trusted height {trusted}")]
    NonMonotonicHeight { trusted: u64, untrusted: u64 },

    #[error("expected new header time {untrusted} to be after trusted header time {trusted}")]
    NonMonotonicTime { trusted: Time, untrusted: Time },

    #[error(
        "new header has a time from the future {header_time} (now: {now}, max clock drift: {max_clock_drift:?})"
    )]
    HeaderFromFuture {
        header_time: Time,
        now: Time,
        max_clock_drift: std::time::Duration,
    },

    #[error(
        "header claims validator set {} but the supplied set hashes to {}",
        hex::encode(.header),
        hex::encode(.computed)
    )]
    ValidatorsHashMismatch { header: Hash, computed: Hash },

    #[error(
        "older header hashes to {} but the trusted header records last block {}",
        hex::encode(.computed),
        hex::encode(.recorded)
    )]
    LastBlockHashMismatch { recorded: Hash, computed: Hash },

    #[error("invalid commit: {0}")]
    Quorum(#[from] crate::verifier::quorum::QuorumError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::domain::{HashDomain, SeparatedDomain};

    fn make_header() -> Header {
        Header {
            chain_id: "test-chain".to_string(),
            height: 7,
            time: Time::from_unix_secs(1_700_000_000),
            validators_hash: [0x11; 32],
            next_validators_hash: [0x22; 32],
            last_block_hash: [0x33; 32],
        }
    }

    fn make_signed_header() -> SignedHeader {
        let header = make_header();
        let block_hash = SeparatedDomain.hash_header(&header);
        SignedHeader {
            commit: Commit {
                height: header.height,
                block_hash,
                signatures: vec![CommitSig::Absent],
            },
            header,
        }
    }

    #[test]
    fn test_validate_basic_accepts_consistent_pair() {
        let sh = make_signed_header();
        assert!(sh.validate_basic("test-chain", &SeparatedDomain).is_ok());
    }

    #[test]
    fn test_validate_basic_rejects_wrong_chain() {
        let sh = make_signed_header();
        let result = sh.validate_basic("other-chain", &SeparatedDomain);
        assert!(matches!(result, Err(HeaderError::ChainIdMismatch { .. })));
    }

    #[test]
    fn test_validate_basic_rejects_zero_height() {
        let mut sh = make_signed_header();
        sh.header.height = 0;
        sh.commit.height = 0;
        assert_eq!(
            sh.validate_basic("test-chain", &SeparatedDomain),
            Err(HeaderError::NonPositiveHeight)
        );
    }

    #[test]
    fn test_validate_basic_rejects_commit_height_mismatch() {
        let mut sh = make_signed_header();
        sh.commit.height += 1;
        assert!(matches!(
            sh.validate_basic("test-chain", &SeparatedDomain),
            Err(HeaderError::CommitHeightMismatch { header: 7, commit: 8 })
        ));
    }

    #[test]
    fn test_validate_basic_rejects_commit_for_other_block() {
        let mut sh = make_signed_header();
        sh.commit.block_hash[0] ^= 0xFF;
        assert!(matches!(
            sh.validate_basic("test-chain", &SeparatedDomain),
            Err(HeaderError::CommitBlockHashMismatch { .. })
        ));
    }

    #[test]
    fn test_signature_serde_round_trips_as_hex() {
        let sig = Signature([0xAB; SIGNATURE_LEN]);
        let json = serde_json::to_string(&sig).unwrap();
        assert!(json.contains(&"ab".repeat(SIGNATURE_LEN)));
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn test_signed_header_from_wire_json() {
        // The shape the transport layer hands us after decoding.
        let json = r#"{
            "header": {
                "chain_id": "test-chain",
                "height": 3,
                "time": 1700000000000000000,
                "validators_hash": [17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17,17],
                "next_validators_hash": [34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34,34],
                "last_block_hash": [51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51,51]
            },
            "commit": {
                "height": 3,
                "block_hash": [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
                "signatures": ["Absent"]
            }
        }"#;

        let sh: SignedHeader = serde_json::from_str(json).unwrap();
        assert_eq!(sh.header.height, 3);
        assert_eq!(sh.header.chain_id, "test-chain");
        assert_eq!(sh.commit.signatures, vec![CommitSig::Absent]);
    }
}
