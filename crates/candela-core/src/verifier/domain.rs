use crate::types::block::{Hash, Header};
use crate::types::time::Time;
use crate::types::validator::ValidatorSet;
use sha2::{Digest, Sha256};

/// Hash-domain capability: how headers, validator sets, and vote sign-bytes
/// are digested.
///
/// Chains that migrated their commit-hashing scheme have two live domains,
/// and a verifier must never mix them — a header hashed under one domain
/// must not validate under the other. Every verification function in this
/// crate is generic over this trait, so the current and legacy code paths
/// are one algorithm selected once by the caller, not two copies that can
/// drift apart.
pub trait HashDomain {
    /// Content hash of a header: a pure function of all its fields.
    fn hash_header(&self, header: &Header) -> Hash;

    /// Digest binding a validator set's membership, order, and power
    /// distribution to a header's `validators_hash` field.
    fn hash_validator_set(&self, validators: &ValidatorSet) -> Hash;

    /// The exact bytes a validator signs for a commit vote.
    fn vote_sign_bytes(
        &self,
        chain_id: &str,
        height: u64,
        block_hash: &Hash,
        timestamp: Time,
    ) -> Vec<u8>;
}

/// The current hash domain: RFC 6962-style domain separation. Leaves and
/// inner nodes are hashed under distinct prefixes and vote sign-bytes carry
/// a context tag, so no digest from this domain collides with the legacy
/// one by construction.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeparatedDomain;

/// The older commit-hashing scheme: plain SHA-256 over concatenated bytes,
/// no prefixes, untagged sign-bytes. Kept for chains that still certify
/// commits the old way; selected end-to-end by `verify_legacy`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LegacyDomain;

const LEAF_PREFIX: u8 = 0x00;
const INNER_PREFIX: u8 = 0x01;
const VOTE_CONTEXT: &[u8] = b"candela/vote/v1";

impl HashDomain for SeparatedDomain {
    fn hash_header(&self, header: &Header) -> Hash {
        merkle_root(&header_leaves(header), prefixed_leaf, prefixed_inner)
    }

    fn hash_validator_set(&self, validators: &ValidatorSet) -> Hash {
        merkle_root(&validator_leaves(validators), prefixed_leaf, prefixed_inner)
    }

    fn vote_sign_bytes(
        &self,
        chain_id: &str,
        height: u64,
        block_hash: &Hash,
        timestamp: Time,
    ) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(VOTE_CONTEXT.len() + chain_id.len() + 56);
        bytes.extend_from_slice(VOTE_CONTEXT);
        push_vote_fields(&mut bytes, chain_id, height, block_hash, timestamp);
        bytes
    }
}

impl HashDomain for LegacyDomain {
    fn hash_header(&self, header: &Header) -> Hash {
        merkle_root(&header_leaves(header), plain_leaf, plain_inner)
    }

    fn hash_validator_set(&self, validators: &ValidatorSet) -> Hash {
        merkle_root(&validator_leaves(validators), plain_leaf, plain_inner)
    }

    fn vote_sign_bytes(
        &self,
        chain_id: &str,
        height: u64,
        block_hash: &Hash,
        timestamp: Time,
    ) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(chain_id.len() + 56);
        push_vote_fields(&mut bytes, chain_id, height, block_hash, timestamp);
        bytes
    }
}

fn push_vote_fields(
    bytes: &mut Vec<u8>,
    chain_id: &str,
    height: u64,
    block_hash: &Hash,
    timestamp: Time,
) {
    bytes.extend_from_slice(&(chain_id.len() as u64).to_be_bytes());
    bytes.extend_from_slice(chain_id.as_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(block_hash);
    bytes.extend_from_slice(&timestamp.unix_nanos().to_be_bytes());
}

fn header_leaves(header: &Header) -> Vec<Vec<u8>> {
    vec![
        header.chain_id.as_bytes().to_vec(),
        header.height.to_be_bytes().to_vec(),
        header.time.unix_nanos().to_be_bytes().to_vec(),
        header.validators_hash.to_vec(),
        header.next_validators_hash.to_vec(),
        header.last_block_hash.to_vec(),
    ]
}

fn validator_leaves(validators: &ValidatorSet) -> Vec<Vec<u8>> {
    validators
        .validators()
        .iter()
        .map(|v| {
            let mut leaf = Vec::with_capacity(40);
            leaf.extend_from_slice(&v.pub_key);
            leaf.extend_from_slice(&v.power.to_be_bytes());
            leaf
        })
        .collect()
}

fn prefixed_leaf(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(data);
    hasher.finalize().into()
}

fn prefixed_inner(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([INNER_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

fn plain_leaf(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

fn plain_inner(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Merkle root over `leaves`, splitting at the largest power of two smaller
/// than the leaf count. Both domains share this fold and differ only in the
/// leaf and inner hashers they supply.
fn merkle_root(
    leaves: &[Vec<u8>],
    leaf: fn(&[u8]) -> Hash,
    inner: fn(&Hash, &Hash) -> Hash,
) -> Hash {
    match leaves.len() {
        0 => leaf(&[]),
        1 => leaf(&leaves[0]),
        n => {
            let split = largest_power_of_two_below(n);
            let left = merkle_root(&leaves[..split], leaf, inner);
            let right = merkle_root(&leaves[split..], leaf, inner);
            inner(&left, &right)
        }
    }
}

fn largest_power_of_two_below(n: usize) -> usize {
    debug_assert!(n >= 2);
    let mut split = 1;
    while split * 2 < n {
        split *= 2;
    }
    split
}
