//! The escrow deposit record.

use serde::{Deserialize, Serialize};

use crate::error::EscrowError;
use crate::types::{AssetId, Identity, MIN_VALID_TIMESTAMP};

/// A single escrowed custody record.
///
/// Created by `Create`, renewed by `ProofOfLife` (timestamp only), and
/// terminated by `Withdraw` or `Claim` setting `is_closed`. A closed record
/// only leaves storage through an explicit close-for-reclaim.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Deposit {
    /// Identity that created the deposit; sole authority to withdraw.
    pub depositor: Identity,
    /// Identity entitled to claim after expiry.
    pub receiver: Identity,
    /// Asset locked in custody; immutable after creation.
    pub asset: AssetId,
    /// Quantity locked. Released in full on withdraw/claim, never partially.
    pub amount: u64,
    /// Unix timestamp of the last renewal (or creation).
    pub last_proof_timestamp: i64,
    /// Expiry window in seconds; immutable after creation.
    pub timeout_seconds: u64,
    /// Terminal flag. Once set, only close-for-reclaim is valid.
    pub is_closed: bool,
    /// Creation-time snapshot of the registry's official fee asset. A later
    /// admin change never affects deposits created before it.
    pub official_fee_asset: Option<AssetId>,
}

impl Deposit {
    /// Unix timestamp at which the receiver's claim right begins.
    ///
    /// Read-only convenience for operational tooling; the state machine
    /// computes expiry from the clock reading, not from this value.
    pub fn expires_at(&self) -> i64 {
        self.last_proof_timestamp
            .saturating_add(self.timeout_seconds as i64)
    }

    /// Structural invariants every persisted record must satisfy.
    pub(crate) fn check_invariants(&self) -> Result<(), EscrowError> {
        if self.amount == 0 {
            return Err(EscrowError::InvalidAmount { amount: 0 });
        }
        if self.last_proof_timestamp < MIN_VALID_TIMESTAMP {
            return Err(EscrowError::ClockIntegrity {
                stored: self.last_proof_timestamp,
                now: self.last_proof_timestamp,
            });
        }
        Ok(())
    }
}
