//! Error taxonomy for the escrow engine.
//!
//! Every rejected call names the exact invariant that failed; clients and
//! audit tooling depend on being able to tell `NotExpired` from
//! `NotReceiver` from `AlreadyClosed`. Errors are grouped into coarse kinds
//! (validation / authorization / state / ledger / integrity) via
//! [`EscrowError::kind`], but the fine-grained variant is always preserved.

use crate::types::{AssetId, Holder};

/// Coarse classification of an [`EscrowError`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// Malformed or out-of-bounds input, rejected before any side effect.
    Validation,
    /// Wrong signer or identity, rejected before any side effect.
    Authorization,
    /// Wrong lifecycle state, rejected before any side effect.
    State,
    /// The asset ledger collaborator failed; the record is unchanged.
    Ledger,
    /// Clock or stored-timestamp sanity check failed; fatal to this call.
    Integrity,
}

/// A failure reported by the asset ledger backend.
///
/// A `LedgerError` always implies the persisted escrow record is unchanged:
/// the engine never marks a deposit closed or advances its timestamp unless
/// the corresponding ledger call succeeded.
#[derive(thiserror::Error, Clone, PartialEq, Eq, Debug)]
pub enum LedgerError {
    #[error("insufficient balance of {asset} held by {holder}")]
    InsufficientBalance { holder: Holder, asset: AssetId },
    #[error("no ledger account for the named destination")]
    UnknownAccount,
    #[error("no ledger balance entry for {0}")]
    UnknownHolder(Holder),
    #[error("ledger account asset does not match the requested asset")]
    AssetMismatch,
    #[error("balance arithmetic overflow")]
    BalanceOverflow,
}

/// Structured rejection from the escrow engine.
#[derive(thiserror::Error, Clone, PartialEq, Eq, Debug)]
pub enum EscrowError {
    // --- validation ---
    #[error("receiver must be a non-null identity")]
    InvalidReceiver,
    #[error("deposit amount {amount} out of bounds (must be 1..={max})", max = crate::types::MAX_DEPOSIT_AMOUNT)]
    InvalidAmount { amount: u64 },
    #[error(
        "timeout {timeout_seconds}s out of bounds (must be {min}..={max})",
        min = crate::types::MIN_TIMEOUT_SECONDS,
        max = crate::types::MAX_TIMEOUT_SECONDS
    )]
    InvalidTimeout { timeout_seconds: u64 },
    #[error("seed must be 1..={max} raw bytes, got {len}", max = crate::types::MAX_SEED_LENGTH)]
    InvalidSeed { len: usize },
    #[error("a deposit already exists under this key")]
    DuplicateKey,

    // --- authorization ---
    #[error("only the depositor may perform this operation")]
    NotDepositor,
    #[error("only the designated receiver may claim")]
    NotReceiver,
    #[error("request names the receiver but is not signed by the receiver")]
    UnauthorizedSigner,
    #[error("caller is not authorized for this operation")]
    Unauthorized,

    // --- state ---
    #[error("no deposit exists under this key")]
    DepositNotFound,
    #[error("deposit is already closed")]
    AlreadyClosed,
    #[error("deposit is still active; close it via withdraw or claim first")]
    NotClosed,
    #[error("proof of life has not expired: elapsed {elapsed}s of required {required}s")]
    NotExpired { elapsed: u64, required: u64 },
    #[error("official fee asset is not set")]
    OfficialAssetNotSet,
    #[error("deposit creation is paused")]
    SystemPaused,

    // --- destination checks ---
    #[error("destination account is not owned by the expected party")]
    DestinationOwnershipMismatch,
    #[error("destination account asset does not match the deposited asset")]
    AssetMismatch,

    // --- integrity ---
    #[error("timestamp integrity failure: stored {stored}, clock {now}")]
    ClockIntegrity { stored: i64, now: i64 },

    // --- ledger ---
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl EscrowError {
    pub fn kind(&self) -> ErrorKind {
        use EscrowError::*;
        match self {
            InvalidReceiver
            | InvalidAmount { .. }
            | InvalidTimeout { .. }
            | InvalidSeed { .. }
            | DuplicateKey => ErrorKind::Validation,
            NotDepositor | NotReceiver | UnauthorizedSigner | Unauthorized => {
                ErrorKind::Authorization
            }
            DepositNotFound
            | AlreadyClosed
            | NotClosed
            | NotExpired { .. }
            | OfficialAssetNotSet
            | SystemPaused => ErrorKind::State,
            DestinationOwnershipMismatch | AssetMismatch => ErrorKind::Validation,
            ClockIntegrity { .. } => ErrorKind::Integrity,
            Ledger(_) => ErrorKind::Ledger,
        }
    }
}
