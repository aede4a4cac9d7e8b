use crate::types::block::Address;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of bytes in an Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// A single validator: an Ed25519 verifying key and its voting power.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Ed25519 public key bytes.
    pub pub_key: [u8; PUBLIC_KEY_LEN],
    /// Non-negative voting-power weight.
    pub power: u64,
}

impl Validator {
    pub fn new(pub_key: [u8; PUBLIC_KEY_LEN], power: u64) -> Self {
        Self { pub_key, power }
    }

    /// Validator address: the first 20 bytes of SHA-256 over the public key.
    /// Addresses identify validators across set rotations, independently of
    /// which hash domain the chain runs.
    pub fn address(&self) -> Address {
        let digest = Sha256::digest(self.pub_key);
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[..20]);
        address
    }
}

/// An ordered set of validators. Order is part of the set's identity: the
/// digest computed by a hash domain binds both membership and position, and
/// commits align their signature entries positionally with this order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
}

impl ValidatorSet {
    pub fn new(validators: Vec<Validator>) -> Self {
        Self { validators }
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Sum of all voting power. Computed in u128 so adversarially large
    /// per-validator powers cannot overflow a threshold comparison.
    pub fn total_power(&self) -> u128 {
        self.validators.iter().map(|v| u128::from(v.power)).sum()
    }

    /// Position of the validator with the given address, if present.
    pub fn position(&self, address: &Address) -> Option<usize> {
        self.validators.iter().position(|v| &v.address() == address)
    }
}
