//! The escrow state machine.
//!
//! `apply` is a pure function of `(current record, operation, now, registry
//! snapshot)` returning the new record plus the ledger calls the host must
//! execute. It performs every validation gate itself and moves no value:
//! which ledger executes the calls, and how, is the host's concern. Both
//! ledger backends must therefore produce bit-for-bit identical records for
//! identical inputs.
//!
//! Validation is staged: pause gate, then authorization, then lifecycle
//! state, then clock integrity, then destination checks. Nothing after a
//! failed gate runs, so a rejection never has side effects.

use crate::deposit::Deposit;
use crate::error::EscrowError;
use crate::registry::RegistrySnapshot;
use crate::types::{
    AssetId, DepositKey, DestinationMeta, Holder, Identity, Signer, MAX_DEPOSIT_AMOUNT,
    MAX_TIMEOUT_SECONDS, MIN_TIMEOUT_SECONDS, MIN_VALID_TIMESTAMP, PROOF_FEE_AMOUNT,
};

/// A state-changing request against one deposit key.
#[derive(Clone, Debug)]
pub enum Operation {
    Create {
        signer: Signer,
        receiver: Identity,
        asset: AssetId,
        amount: u64,
        timeout_seconds: u64,
    },
    ProofOfLife {
        signer: Signer,
    },
    Withdraw {
        signer: Signer,
        destination: DestinationMeta,
    },
    Claim {
        signer: Signer,
        /// The party the request *names* as receiver. Checked separately
        /// from the signer so a request naming the right receiver without
        /// the receiver's own authorization is rejected.
        receiver: Identity,
        destination: DestinationMeta,
    },
    CloseForReclaim {
        signer: Signer,
    },
}

/// Value movement the host ledger must execute for an accepted transition.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LedgerCall {
    Transfer {
        asset: AssetId,
        from: Holder,
        to: Holder,
        amount: u64,
    },
    Burn {
        asset: AssetId,
        from: Holder,
        amount: u64,
    },
}

/// Outcome of an accepted operation: the record to persist (`None` means
/// remove it from storage) and the ledger calls to execute, in order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transition {
    pub deposit: Option<Deposit>,
    pub calls: Vec<LedgerCall>,
}

/// Run one operation through the state machine.
///
/// `record` is the currently persisted deposit under `key`, if any; `now`
/// is the clock source's reading for this call. On success the caller must
/// execute every call in `Transition::calls` before persisting
/// `Transition::deposit` (close flags are written strictly after the
/// transfer they account for).
pub fn apply(
    record: Option<&Deposit>,
    key: &DepositKey,
    op: &Operation,
    now: i64,
    registry: &RegistrySnapshot,
) -> Result<Transition, EscrowError> {
    match op {
        Operation::Create {
            signer,
            receiver,
            asset,
            amount,
            timeout_seconds,
        } => create(
            record,
            key,
            signer,
            *receiver,
            *asset,
            *amount,
            *timeout_seconds,
            now,
            registry,
        ),
        Operation::ProofOfLife { signer } => proof_of_life(record, key, signer, now),
        Operation::Withdraw {
            signer,
            destination,
        } => withdraw(record, key, signer, destination),
        Operation::Claim {
            signer,
            receiver,
            destination,
        } => claim(record, key, signer, *receiver, destination, now),
        Operation::CloseForReclaim { signer } => close_for_reclaim(record, signer),
    }
}

#[allow(clippy::too_many_arguments)]
fn create(
    record: Option<&Deposit>,
    key: &DepositKey,
    signer: &Signer,
    receiver: Identity,
    asset: AssetId,
    amount: u64,
    timeout_seconds: u64,
    now: i64,
    registry: &RegistrySnapshot,
) -> Result<Transition, EscrowError> {
    // Operator pause gates creation only; exit paths stay open.
    if registry.paused {
        return Err(EscrowError::SystemPaused);
    }
    if signer.identity() != key.depositor {
        return Err(EscrowError::NotDepositor);
    }
    if receiver.is_zero() {
        return Err(EscrowError::InvalidReceiver);
    }
    if amount == 0 || amount > MAX_DEPOSIT_AMOUNT {
        return Err(EscrowError::InvalidAmount { amount });
    }
    if !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&timeout_seconds) {
        return Err(EscrowError::InvalidTimeout { timeout_seconds });
    }
    if record.is_some() {
        return Err(EscrowError::DuplicateKey);
    }
    if now < MIN_VALID_TIMESTAMP {
        return Err(EscrowError::ClockIntegrity { stored: now, now });
    }

    let deposit = Deposit {
        depositor: key.depositor,
        receiver,
        asset,
        amount,
        last_proof_timestamp: now,
        timeout_seconds,
        is_closed: false,
        official_fee_asset: registry.official_fee_asset,
    };
    Ok(Transition {
        deposit: Some(deposit),
        calls: vec![LedgerCall::Transfer {
            asset,
            from: Holder::User(key.depositor),
            to: Holder::Custody(key.clone()),
            amount,
        }],
    })
}

fn proof_of_life(
    record: Option<&Deposit>,
    key: &DepositKey,
    signer: &Signer,
    now: i64,
) -> Result<Transition, EscrowError> {
    let deposit = record.ok_or(EscrowError::DepositNotFound)?;
    if signer.identity() != deposit.depositor {
        return Err(EscrowError::NotDepositor);
    }
    if deposit.is_closed {
        return Err(EscrowError::AlreadyClosed);
    }
    let fee_asset = deposit
        .official_fee_asset
        .ok_or(EscrowError::OfficialAssetNotSet)?;
    check_timestamps(deposit.last_proof_timestamp, now)?;

    let mut renewed = deposit.clone();
    renewed.last_proof_timestamp = now;
    Ok(Transition {
        deposit: Some(renewed),
        calls: vec![LedgerCall::Burn {
            asset: fee_asset,
            from: Holder::User(key.depositor),
            amount: PROOF_FEE_AMOUNT,
        }],
    })
}

fn withdraw(
    record: Option<&Deposit>,
    key: &DepositKey,
    signer: &Signer,
    destination: &DestinationMeta,
) -> Result<Transition, EscrowError> {
    let deposit = record.ok_or(EscrowError::DepositNotFound)?;
    if signer.identity() != deposit.depositor {
        return Err(EscrowError::NotDepositor);
    }
    if deposit.is_closed {
        return Err(EscrowError::AlreadyClosed);
    }
    check_destination(destination, deposit.depositor, deposit.asset)?;

    release(deposit, key, Holder::User(deposit.depositor))
}

fn claim(
    record: Option<&Deposit>,
    key: &DepositKey,
    signer: &Signer,
    receiver: Identity,
    destination: &DestinationMeta,
    now: i64,
) -> Result<Transition, EscrowError> {
    let deposit = record.ok_or(EscrowError::DepositNotFound)?;
    if receiver != deposit.receiver {
        return Err(EscrowError::NotReceiver);
    }
    // Naming the receiver is not enough: the receiver must be the signer.
    if signer.identity() != receiver {
        return Err(EscrowError::UnauthorizedSigner);
    }
    if deposit.is_closed {
        return Err(EscrowError::AlreadyClosed);
    }
    check_timestamps(deposit.last_proof_timestamp, now)?;

    // Guarded above, so this can never go negative or wrap.
    let elapsed = (now - deposit.last_proof_timestamp) as u64;
    if elapsed < deposit.timeout_seconds {
        return Err(EscrowError::NotExpired {
            elapsed,
            required: deposit.timeout_seconds,
        });
    }
    check_destination(destination, deposit.receiver, deposit.asset)?;

    release(deposit, key, Holder::User(deposit.receiver))
}

fn close_for_reclaim(
    record: Option<&Deposit>,
    signer: &Signer,
) -> Result<Transition, EscrowError> {
    let deposit = record.ok_or(EscrowError::DepositNotFound)?;
    let caller = signer.identity();
    if caller != deposit.depositor && caller != deposit.receiver {
        return Err(EscrowError::Unauthorized);
    }
    if !deposit.is_closed {
        return Err(EscrowError::NotClosed);
    }
    // Pure storage reclaim; the custody balance was already released.
    Ok(Transition {
        deposit: None,
        calls: vec![],
    })
}

/// Release the full locked amount out of custody and close the record.
fn release(deposit: &Deposit, key: &DepositKey, to: Holder) -> Result<Transition, EscrowError> {
    let mut closed = deposit.clone();
    closed.is_closed = true;
    Ok(Transition {
        deposit: Some(closed),
        calls: vec![LedgerCall::Transfer {
            asset: deposit.asset,
            from: Holder::Custody(key.clone()),
            to,
            amount: deposit.amount,
        }],
    })
}

/// Reject corrupted timestamps instead of clamping: a stored timestamp in
/// the future or below the sanity floor would make any elapsed-time reading
/// meaningless, and clamping could mask a broken clock.
fn check_timestamps(stored: i64, now: i64) -> Result<(), EscrowError> {
    if stored > now || stored < MIN_VALID_TIMESTAMP {
        return Err(EscrowError::ClockIntegrity { stored, now });
    }
    Ok(())
}

fn check_destination(
    destination: &DestinationMeta,
    expected_owner: Identity,
    expected_asset: AssetId,
) -> Result<(), EscrowError> {
    if destination.owner != expected_owner {
        return Err(EscrowError::DestinationOwnershipMismatch);
    }
    if destination.asset != expected_asset {
        return Err(EscrowError::AssetMismatch);
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
