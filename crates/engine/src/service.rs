//! Service orchestration: ties the pure state machine to a ledger backend,
//! a clock source, the record store, and the admin registry.
//!
//! ## Ordering guarantee
//!
//! The in-memory backends cannot bundle "flag write + transfer" into one
//! atomic host transaction, so the service enforces the safe ordering
//! itself: ledger calls execute first, and the record (including the
//! `is_closed` flag) is persisted only after every call succeeded. A ledger
//! failure therefore always leaves the persisted state unchanged — funds can
//! never be stranded behind a closed flag with no transfer executed.
//!
//! Operations against one deposit key are expected to be linearized by the
//! caller, as a host transaction mechanism would; distinct keys are fully
//! independent.

use crate::clock::Clock;
use crate::deposit::Deposit;
use crate::engine::{self, LedgerCall, Operation};
use crate::error::{ErrorKind, EscrowError, LedgerError};
use crate::registry::AdminRegistry;
use crate::store::DepositStore;
use crate::types::{AssetId, DepositKey, DestinationMeta, Holder, Identity, Seed, Signer};

/// The only interface the engine requires from an asset ledger backend.
///
/// `Destination` is the backend's own way of naming a payout target (a
/// token-account reference on an account-model chain, a bare identity on a
/// balance-mapping chain). The backend attests what the destination is via
/// [`destination_meta`](LedgerHost::destination_meta); the engine decides
/// whether it is acceptable.
pub trait LedgerHost {
    type Destination;

    /// Describe a payout target. `expected_asset` is the asset the engine
    /// is about to release; backends whose destinations are not asset-typed
    /// use it to synthesize the meta.
    fn destination_meta(
        &self,
        dest: &Self::Destination,
        expected_asset: &AssetId,
    ) -> Result<DestinationMeta, LedgerError>;

    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &Holder,
        to: &Holder,
        amount: u64,
    ) -> Result<(), LedgerError>;

    fn burn(&mut self, asset: &AssetId, from: &Holder, amount: u64) -> Result<(), LedgerError>;
}

/// Escrow service over one ledger backend and one clock source.
pub struct EscrowService<H, C> {
    ledger: H,
    clock: C,
    store: DepositStore,
    registry: AdminRegistry,
}

impl<H: LedgerHost, C: Clock> EscrowService<H, C> {
    pub fn new(ledger: H, clock: C, admin: Identity) -> Self {
        EscrowService {
            ledger,
            clock,
            store: DepositStore::new(),
            registry: AdminRegistry::new(admin),
        }
    }

    pub fn ledger(&self) -> &H {
        &self.ledger
    }

    /// Mutable backend access for host-side setup (opening accounts,
    /// funding balances). Not part of the escrow contract.
    pub fn ledger_mut(&mut self) -> &mut H {
        &mut self.ledger
    }

    pub fn store(&self) -> &DepositStore {
        &self.store
    }

    pub fn registry(&self) -> &AdminRegistry {
        &self.registry
    }

    /// Lock `amount` of `asset` for `receiver` under `(signer, seed)`.
    pub fn create(
        &mut self,
        signer: &Signer,
        seed: Seed,
        receiver: Identity,
        asset: AssetId,
        amount: u64,
        timeout_seconds: u64,
    ) -> Result<Deposit, EscrowError> {
        let key = DepositKey::new(signer.identity(), seed);
        let op = Operation::Create {
            signer: *signer,
            receiver,
            asset,
            amount,
            timeout_seconds,
        };
        let deposit = self.execute(&key, &op)?.ok_or(EscrowError::DepositNotFound)?;
        tracing::info!(key = %key, amount, timeout_seconds, receiver = %receiver, "deposit created");
        Ok(deposit)
    }

    /// Renew the deposit under `key`, burning one fee unit.
    pub fn proof_of_life(
        &mut self,
        signer: &Signer,
        key: &DepositKey,
    ) -> Result<Deposit, EscrowError> {
        let op = Operation::ProofOfLife { signer: *signer };
        let deposit = self.execute(key, &op)?.ok_or(EscrowError::DepositNotFound)?;
        tracing::info!(
            key = %key,
            last_proof_timestamp = deposit.last_proof_timestamp,
            "proof of life recorded"
        );
        Ok(deposit)
    }

    /// Return the locked amount to the depositor's destination.
    pub fn withdraw(
        &mut self,
        signer: &Signer,
        key: &DepositKey,
        destination: &H::Destination,
    ) -> Result<Deposit, EscrowError> {
        let record = self.store.get(key).ok_or(EscrowError::DepositNotFound)?;
        let meta = self.ledger.destination_meta(destination, &record.asset)?;
        let op = Operation::Withdraw {
            signer: *signer,
            destination: meta,
        };
        let deposit = self.execute(key, &op)?.ok_or(EscrowError::DepositNotFound)?;
        tracing::info!(key = %key, amount = deposit.amount, "withdrawal completed");
        Ok(deposit)
    }

    /// Claim an expired deposit to the receiver's destination. `receiver`
    /// is the party the request names; the signer must be that party.
    pub fn claim(
        &mut self,
        signer: &Signer,
        key: &DepositKey,
        receiver: Identity,
        destination: &H::Destination,
    ) -> Result<Deposit, EscrowError> {
        let record = self.store.get(key).ok_or(EscrowError::DepositNotFound)?;
        let meta = self.ledger.destination_meta(destination, &record.asset)?;
        let op = Operation::Claim {
            signer: *signer,
            receiver,
            destination: meta,
        };
        let deposit = self.execute(key, &op)?.ok_or(EscrowError::DepositNotFound)?;
        tracing::info!(key = %key, amount = deposit.amount, receiver = %receiver, "claim completed");
        Ok(deposit)
    }

    /// Reclaim the storage of an already-closed deposit.
    pub fn close_for_reclaim(
        &mut self,
        signer: &Signer,
        key: &DepositKey,
    ) -> Result<(), EscrowError> {
        let op = Operation::CloseForReclaim { signer: *signer };
        let removed = self.execute(key, &op)?;
        debug_assert!(removed.is_none());
        tracing::info!(key = %key, "deposit record reclaimed");
        Ok(())
    }

    /// Run one operation: snapshot, apply, execute ledger calls, persist.
    fn execute(
        &mut self,
        key: &DepositKey,
        op: &Operation,
    ) -> Result<Option<Deposit>, EscrowError> {
        let registry = self.registry.snapshot();
        let now = self.clock.now();
        let record = self.store.get(key);

        let transition = engine::apply(record.as_ref(), key, op, now, &registry).map_err(
            |err| {
                if err.kind() == ErrorKind::Integrity {
                    tracing::warn!(key = %key, error = %err, "timestamp integrity failure");
                }
                err
            },
        )?;

        for call in &transition.calls {
            match call {
                LedgerCall::Transfer {
                    asset,
                    from,
                    to,
                    amount,
                } => self.ledger.transfer(asset, from, to, *amount)?,
                LedgerCall::Burn {
                    asset,
                    from,
                    amount,
                } => self.ledger.burn(asset, from, *amount)?,
            }
        }

        // Persist strictly after the ledger confirmed every call.
        match transition.deposit {
            Some(deposit) => {
                if record.is_some() {
                    self.store.update(key, deposit.clone())?;
                } else {
                    self.store.insert_new(key.clone(), deposit.clone())?;
                }
                Ok(Some(deposit))
            }
            None => {
                self.store.remove(key)?;
                Ok(None)
            }
        }
    }
}
