//! Balance-mapping ledger backend.
//!
//! Models a chain whose token state is a bare `(asset, holder) -> balance`
//! map (Soroban/ERC-20 style): there are no token accounts to open, a
//! missing entry is a zero balance, and a payout destination is just an
//! identity. Because destinations carry no asset type of their own,
//! ownership/asset mismatches are structurally impossible here — the engine
//! still runs the same destination checks, which must then always pass.

use std::collections::HashMap;

use vigil_engine::{
    AssetId, DestinationMeta, Holder, Identity, LedgerError, LedgerHost,
};

#[derive(Default)]
pub struct BalanceLedger {
    balances: HashMap<(AssetId, Holder), u64>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a user balance out of thin air. Host-side setup, not escrow.
    pub fn mint(
        &mut self,
        asset: AssetId,
        owner: Identity,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.credit(&Holder::User(owner), &asset, amount)?;
        tracing::debug!(asset = %asset, owner = %owner, amount, "balance minted");
        Ok(())
    }

    /// Current balance; absent entries read as zero.
    pub fn balance_of(&self, asset: &AssetId, holder: &Holder) -> u64 {
        self.balances.get(&(*asset, holder.clone())).copied().unwrap_or(0)
    }

    fn debit(&mut self, from: &Holder, asset: &AssetId, amount: u64) -> Result<(), LedgerError> {
        let balance = self
            .balances
            .entry((*asset, from.clone()))
            .or_insert(0);
        *balance = balance.checked_sub(amount).ok_or_else(|| {
            LedgerError::InsufficientBalance {
                holder: from.clone(),
                asset: *asset,
            }
        })?;
        Ok(())
    }

    fn credit(&mut self, to: &Holder, asset: &AssetId, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balances.entry((*asset, to.clone())).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        Ok(())
    }
}

impl LedgerHost for BalanceLedger {
    type Destination = Identity;

    fn destination_meta(
        &self,
        dest: &Identity,
        expected_asset: &AssetId,
    ) -> Result<DestinationMeta, LedgerError> {
        // Balances are keyed by (asset, identity) directly, so the
        // destination is exactly the identity under the released asset.
        Ok(DestinationMeta {
            owner: *dest,
            asset: *expected_asset,
        })
    }

    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &Holder,
        to: &Holder,
        amount: u64,
    ) -> Result<(), LedgerError> {
        // Validate the credit leg before touching the debit side.
        self.balance_of(asset, to)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        self.debit(from, asset, amount)?;
        self.credit(to, asset, amount)
    }

    fn burn(&mut self, asset: &AssetId, from: &Holder, amount: u64) -> Result<(), LedgerError> {
        self.debit(from, asset, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_engine::{DepositKey, Seed};

    fn id(seed: u8) -> Identity {
        Identity::new([seed; 32])
    }

    fn asset(seed: u8) -> AssetId {
        AssetId::new([seed; 32])
    }

    #[test]
    fn test_missing_entry_reads_as_zero() {
        let ledger = BalanceLedger::new();
        assert_eq!(ledger.balance_of(&asset(1), &Holder::User(id(1))), 0);
    }

    #[test]
    fn test_mint_and_transfer() {
        let mut ledger = BalanceLedger::new();
        ledger.mint(asset(1), id(1), 1_000).unwrap();

        let custody = Holder::Custody(DepositKey::new(
            id(1),
            Seed::new(b"k".to_vec()).unwrap(),
        ));
        ledger
            .transfer(&asset(1), &Holder::User(id(1)), &custody, 250)
            .unwrap();
        assert_eq!(ledger.balance_of(&asset(1), &Holder::User(id(1))), 750);
        assert_eq!(ledger.balance_of(&asset(1), &custody), 250);
    }

    #[test]
    fn test_insufficient_balance_leaves_state_unchanged() {
        let mut ledger = BalanceLedger::new();
        ledger.mint(asset(1), id(1), 10).unwrap();
        let err = ledger
            .transfer(
                &asset(1),
                &Holder::User(id(1)),
                &Holder::User(id(2)),
                11,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance_of(&asset(1), &Holder::User(id(1))), 10);
        assert_eq!(ledger.balance_of(&asset(1), &Holder::User(id(2))), 0);
    }

    #[test]
    fn test_balances_are_asset_scoped() {
        let mut ledger = BalanceLedger::new();
        ledger.mint(asset(1), id(1), 100).unwrap();
        // Same identity, different asset: separate balance.
        assert_eq!(ledger.balance_of(&asset(2), &Holder::User(id(1))), 0);
        let err = ledger
            .burn(&asset(2), &Holder::User(id(1)), 1)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_burn_destroys_value() {
        let mut ledger = BalanceLedger::new();
        ledger.mint(asset(1), id(1), 100).unwrap();
        ledger.burn(&asset(1), &Holder::User(id(1)), 40).unwrap();
        assert_eq!(ledger.balance_of(&asset(1), &Holder::User(id(1))), 60);
    }

    #[test]
    fn test_destination_meta_is_synthesized() {
        let ledger = BalanceLedger::new();
        let meta = ledger.destination_meta(&id(5), &asset(3)).unwrap();
        assert_eq!(meta.owner, id(5));
        assert_eq!(meta.asset, asset(3));
    }
}
