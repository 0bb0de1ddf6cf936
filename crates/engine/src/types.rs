//! Identities, keys, and protocol constants.
//!
//! Identities and asset ids are opaque 32-byte public identifiers; equality
//! is exact byte-for-byte match and rendering is lowercase hex. The one
//! deliberate asymmetry in this module is `Signer` vs `Identity`: an
//! authorization check must always compare against a `Signer` (a caller the
//! host actually authenticated), never against an `Identity` that merely
//! names a party in the request payload.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EscrowError;

// =============================================================================
// Constants
// =============================================================================

/// Maximum length of a deposit seed, in raw bytes.
pub const MAX_SEED_LENGTH: usize = 32;

/// Minimum renewal timeout: 1 minute.
pub const MIN_TIMEOUT_SECONDS: u64 = 60;

/// Maximum renewal timeout: 10 years.
pub const MAX_TIMEOUT_SECONDS: u64 = 315_360_000;

/// Sanity floor for stored timestamps (~August 2020). A clock reading or a
/// persisted timestamp below this is treated as corrupted, never clamped.
pub const MIN_VALID_TIMESTAMP: i64 = 1_598_000_000;

/// Smallest-unit scale of the locked asset (9 decimals).
pub const ASSET_UNIT: u64 = 1_000_000_000;

/// Upper bound on a single deposit: 100,000,000 whole units.
pub const MAX_DEPOSIT_AMOUNT: u64 = 100_000_000 * ASSET_UNIT;

/// Exactly one whole fee token is burned per renewal.
pub const PROOF_FEE_AMOUNT: u64 = ASSET_UNIT;

// =============================================================================
// Identity / Signer
// =============================================================================

/// Opaque 32-byte public identifier of a party.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity([u8; 32]);

impl Identity {
    /// The null identity. Never a valid receiver.
    pub const ZERO: Identity = Identity([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Identity(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({}…)", &hex::encode(self.0)[..8])
    }
}

/// An authenticated caller.
///
/// Constructed only where the host has verified the caller's signature (or,
/// in tests, by the harness standing in for the host). Keeping this a
/// separate type from [`Identity`] means a check against a party that was
/// merely *named* in a request cannot typecheck as an authorization check.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Signer(Identity);

impl Signer {
    /// Attest that `identity` signed the current request.
    ///
    /// Callers must only invoke this after the host's own signature
    /// verification has succeeded.
    pub fn authenticated(identity: Identity) -> Self {
        Signer(identity)
    }

    pub fn identity(&self) -> Identity {
        self.0
    }
}

impl fmt::Display for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// AssetId
// =============================================================================

/// Opaque 32-byte identifier of a fungible asset (token mint).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId([u8; 32]);

impl AssetId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        AssetId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({}…)", &hex::encode(self.0)[..8])
    }
}

// =============================================================================
// Seed / DepositKey
// =============================================================================

/// Caller-supplied deposit seed, bounded by raw byte length.
///
/// Length is validated on the bytes as received, never on a decoded character
/// count, so multi-byte encodings cannot smuggle oversized seeds through.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Seed(Vec<u8>);

impl Seed {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, EscrowError> {
        let bytes = bytes.into();
        if bytes.is_empty() || bytes.len() > MAX_SEED_LENGTH {
            return Err(EscrowError::InvalidSeed { len: bytes.len() });
        }
        Ok(Seed(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({})", hex::encode(&self.0))
    }
}

/// Composite key of a deposit: who created it, under which seed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct DepositKey {
    pub depositor: Identity,
    pub seed: Seed,
}

impl DepositKey {
    pub fn new(depositor: Identity, seed: Seed) -> Self {
        DepositKey { depositor, seed }
    }
}

impl fmt::Display for DepositKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.depositor, self.seed)
    }
}

// =============================================================================
// Ledger-side designators
// =============================================================================

/// A balance holder on the underlying asset ledger.
///
/// Custody balances are held per deposit key so releases can only draw on
/// the exact deposit they belong to.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Holder {
    User(Identity),
    Custody(DepositKey),
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::User(id) => write!(f, "user:{id}"),
            Holder::Custody(key) => write!(f, "custody:{key}"),
        }
    }
}

/// Backend-attested description of a payout target, used to validate
/// destination ownership and asset type before any transfer is issued.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DestinationMeta {
    pub owner: Identity,
    pub asset: AssetId,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_equality_is_bytewise() {
        let a = Identity::new([7u8; 32]);
        let b = Identity::new([7u8; 32]);
        let mut bytes = [7u8; 32];
        bytes[31] = 8;
        let c = Identity::new(bytes);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_zero_identity() {
        assert!(Identity::ZERO.is_zero());
        assert!(!Identity::new([1u8; 32]).is_zero());
    }

    #[test]
    fn test_identity_displays_as_hex() {
        let id = Identity::new([0xabu8; 32]);
        assert_eq!(id.to_string(), "ab".repeat(32));
    }

    #[test]
    fn test_seed_rejects_empty_and_oversized() {
        assert!(matches!(
            Seed::new(Vec::new()),
            Err(EscrowError::InvalidSeed { len: 0 })
        ));
        assert!(matches!(
            Seed::new(vec![0u8; MAX_SEED_LENGTH + 1]),
            Err(EscrowError::InvalidSeed { len: 33 })
        ));
    }

    #[test]
    fn test_seed_length_counts_raw_bytes() {
        // 11 four-byte scalars: 11 "characters" but 44 bytes, over the limit.
        let s = "𝕏".repeat(11);
        assert_eq!(s.chars().count(), 11);
        assert!(Seed::new(s.into_bytes()).is_err());

        // Exactly at the byte bound is accepted.
        assert!(Seed::new(vec![b'x'; MAX_SEED_LENGTH]).is_ok());
    }

    #[test]
    fn test_deposit_key_hash_distinguishes_seed() {
        let depositor = Identity::new([1u8; 32]);
        let k1 = DepositKey::new(depositor, Seed::new(b"alpha".to_vec()).unwrap());
        let k2 = DepositKey::new(depositor, Seed::new(b"beta".to_vec()).unwrap());
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_serde_round_trip() {
        let key = DepositKey::new(
            Identity::new([3u8; 32]),
            Seed::new(b"seed-1".to_vec()).unwrap(),
        );
        let json = serde_json::to_string(&key).unwrap();
        let decoded: DepositKey = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, key);
    }
}
