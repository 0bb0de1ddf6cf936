//! Account-model ledger backend.
//!
//! Models the addressing scheme of an account-model chain: value lives in
//! token accounts `{ owner, asset, balance }` named by an [`AccountRef`],
//! with at most one account per `(owner, asset)` pair (the associated-account
//! convention). Custody balances are held per deposit key, tagged with the
//! asset they were funded in.
//!
//! Destinations here are real account references, so a caller *can* name
//! somebody else's account or a wrong-asset account — the engine's
//! destination ownership and asset checks are load-bearing on this backend.

use std::collections::HashMap;

use vigil_engine::{
    AssetId, DepositKey, DestinationMeta, Holder, Identity, LedgerError, LedgerHost,
};

/// Reference to a token account on this ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AccountRef(u64);

#[derive(Clone, Debug)]
pub struct TokenAccount {
    pub owner: Identity,
    pub asset: AssetId,
    pub balance: u64,
}

#[derive(Default)]
pub struct AccountLedger {
    next_ref: u64,
    accounts: HashMap<AccountRef, TokenAccount>,
    by_owner_asset: HashMap<(Identity, AssetId), AccountRef>,
    custody: HashMap<DepositKey, (AssetId, u64)>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the token account for `(owner, asset)`, or return the existing
    /// one. One account per pair, so holder resolution is deterministic.
    pub fn open_account(&mut self, owner: Identity, asset: AssetId) -> AccountRef {
        if let Some(existing) = self.by_owner_asset.get(&(owner, asset)) {
            return *existing;
        }
        let account_ref = AccountRef(self.next_ref);
        self.next_ref += 1;
        self.accounts.insert(
            account_ref,
            TokenAccount {
                owner,
                asset,
                balance: 0,
            },
        );
        self.by_owner_asset.insert((owner, asset), account_ref);
        tracing::debug!(owner = %owner, asset = %asset, "token account opened");
        account_ref
    }

    /// Credit an account out of thin air. Host-side setup, not escrow.
    pub fn mint(&mut self, account: AccountRef, amount: u64) -> Result<(), LedgerError> {
        let entry = self
            .accounts
            .get_mut(&account)
            .ok_or(LedgerError::UnknownAccount)?;
        entry.balance = entry
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        Ok(())
    }

    pub fn balance(&self, account: AccountRef) -> Result<u64, LedgerError> {
        self.accounts
            .get(&account)
            .map(|acct| acct.balance)
            .ok_or(LedgerError::UnknownAccount)
    }

    pub fn account(&self, account: AccountRef) -> Option<&TokenAccount> {
        self.accounts.get(&account)
    }

    /// Balance currently held in custody for one deposit key.
    pub fn custody_balance(&self, key: &DepositKey) -> u64 {
        self.custody.get(key).map(|(_, balance)| *balance).unwrap_or(0)
    }

    fn resolve_user(
        &self,
        owner: &Identity,
        asset: &AssetId,
    ) -> Result<AccountRef, LedgerError> {
        self.by_owner_asset
            .get(&(*owner, *asset))
            .copied()
            .ok_or(LedgerError::UnknownAccount)
    }

    /// Validate the credit leg without mutating, so a failed transfer never
    /// leaves a half-applied debit behind.
    fn check_credit(&self, to: &Holder, asset: &AssetId, amount: u64) -> Result<(), LedgerError> {
        match to {
            Holder::User(owner) => {
                let account_ref = self.resolve_user(owner, asset)?;
                let account = self
                    .accounts
                    .get(&account_ref)
                    .ok_or(LedgerError::UnknownAccount)?;
                account
                    .balance
                    .checked_add(amount)
                    .ok_or(LedgerError::BalanceOverflow)?;
            }
            Holder::Custody(key) => {
                if let Some((held_asset, balance)) = self.custody.get(key) {
                    if held_asset != asset {
                        return Err(LedgerError::AssetMismatch);
                    }
                    balance
                        .checked_add(amount)
                        .ok_or(LedgerError::BalanceOverflow)?;
                }
            }
        }
        Ok(())
    }

    fn debit(&mut self, from: &Holder, asset: &AssetId, amount: u64) -> Result<(), LedgerError> {
        match from {
            Holder::User(owner) => {
                let account_ref = self.resolve_user(owner, asset)?;
                let account = self
                    .accounts
                    .get_mut(&account_ref)
                    .ok_or(LedgerError::UnknownAccount)?;
                account.balance = account.balance.checked_sub(amount).ok_or_else(|| {
                    LedgerError::InsufficientBalance {
                        holder: from.clone(),
                        asset: *asset,
                    }
                })?;
            }
            Holder::Custody(key) => {
                let (held_asset, balance) = self
                    .custody
                    .get_mut(key)
                    .ok_or_else(|| LedgerError::UnknownHolder(from.clone()))?;
                if held_asset != asset {
                    return Err(LedgerError::AssetMismatch);
                }
                *balance = balance.checked_sub(amount).ok_or_else(|| {
                    LedgerError::InsufficientBalance {
                        holder: from.clone(),
                        asset: *asset,
                    }
                })?;
            }
        }
        Ok(())
    }

    fn credit(&mut self, to: &Holder, asset: &AssetId, amount: u64) -> Result<(), LedgerError> {
        match to {
            Holder::User(owner) => {
                let account_ref = self.resolve_user(owner, asset)?;
                let account = self
                    .accounts
                    .get_mut(&account_ref)
                    .ok_or(LedgerError::UnknownAccount)?;
                account.balance = account
                    .balance
                    .checked_add(amount)
                    .ok_or(LedgerError::BalanceOverflow)?;
            }
            Holder::Custody(key) => {
                let (held_asset, balance) =
                    self.custody.entry(key.clone()).or_insert((*asset, 0));
                if held_asset != asset {
                    return Err(LedgerError::AssetMismatch);
                }
                *balance = balance
                    .checked_add(amount)
                    .ok_or(LedgerError::BalanceOverflow)?;
            }
        }
        Ok(())
    }
}

impl LedgerHost for AccountLedger {
    type Destination = AccountRef;

    fn destination_meta(
        &self,
        dest: &AccountRef,
        _expected_asset: &AssetId,
    ) -> Result<DestinationMeta, LedgerError> {
        let account = self.accounts.get(dest).ok_or(LedgerError::UnknownAccount)?;
        // Attest what the account actually is; the engine judges it.
        Ok(DestinationMeta {
            owner: account.owner,
            asset: account.asset,
        })
    }

    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &Holder,
        to: &Holder,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.check_credit(to, asset, amount)?;
        self.debit(from, asset, amount)?;
        self.credit(to, asset, amount)
    }

    fn burn(&mut self, asset: &AssetId, from: &Holder, amount: u64) -> Result<(), LedgerError> {
        self.debit(from, asset, amount)
    }
}
