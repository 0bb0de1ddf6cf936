//! Durable keyed storage of deposit records.
//!
//! Keyed by `(depositor, seed)`. Creation never overwrites: an existing key
//! is a hard `DuplicateKey` error, not an upsert. Different keys live on
//! independent map shards, so operations on distinct deposits never contend.
//! The enumeration and export methods are read-only operational tooling and
//! carry no correctness weight.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::deposit::Deposit;
use crate::error::EscrowError;
use crate::types::{DepositKey, Identity};

pub struct DepositStore {
    records: DashMap<DepositKey, Deposit>,
}

impl DepositStore {
    pub fn new() -> Self {
        DepositStore {
            records: DashMap::new(),
        }
    }

    /// Insert a record under a key that must not already exist.
    pub fn insert_new(&self, key: DepositKey, deposit: Deposit) -> Result<(), EscrowError> {
        deposit.check_invariants()?;
        match self.records.entry(key) {
            Entry::Occupied(_) => Err(EscrowError::DuplicateKey),
            Entry::Vacant(slot) => {
                slot.insert(deposit);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &DepositKey) -> Option<Deposit> {
        self.records.get(key).map(|entry| entry.clone())
    }

    /// Replace an existing record.
    pub fn update(&self, key: &DepositKey, deposit: Deposit) -> Result<(), EscrowError> {
        deposit.check_invariants()?;
        match self.records.get_mut(key) {
            Some(mut entry) => {
                *entry = deposit;
                Ok(())
            }
            None => Err(EscrowError::DepositNotFound),
        }
    }

    /// Remove a record, returning it.
    pub fn remove(&self, key: &DepositKey) -> Result<Deposit, EscrowError> {
        self.records
            .remove(key)
            .map(|(_, deposit)| deposit)
            .ok_or(EscrowError::DepositNotFound)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records created by `depositor`.
    pub fn by_depositor(&self, depositor: &Identity) -> Vec<(DepositKey, Deposit)> {
        self.filter(|deposit| deposit.depositor == *depositor)
    }

    /// All records naming `receiver` as the claimant.
    pub fn by_receiver(&self, receiver: &Identity) -> Vec<(DepositKey, Deposit)> {
        self.filter(|deposit| deposit.receiver == *receiver)
    }

    fn filter(&self, predicate: impl Fn(&Deposit) -> bool) -> Vec<(DepositKey, Deposit)> {
        let mut matched: Vec<(DepositKey, Deposit)> = self
            .records
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        matched.sort_by(|(a, _), (b, _)| a.cmp(b));
        matched
    }

    /// JSON snapshot of every record, keyed by display form, for tooling.
    pub fn export_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .records
            .iter()
            .map(|entry| {
                let value = serde_json::to_value(entry.value())
                    .unwrap_or(serde_json::Value::Null);
                (entry.key().to_string(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Default for DepositStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetId, Seed};

    fn key(depositor: u8, seed: &[u8]) -> DepositKey {
        DepositKey::new(
            Identity::new([depositor; 32]),
            Seed::new(seed.to_vec()).unwrap(),
        )
    }

    fn record(depositor: u8, receiver: u8) -> Deposit {
        Deposit {
            depositor: Identity::new([depositor; 32]),
            receiver: Identity::new([receiver; 32]),
            asset: AssetId::new([3u8; 32]),
            amount: 500,
            last_proof_timestamp: 1_700_000_000,
            timeout_seconds: 3_600,
            is_closed: false,
            official_fee_asset: None,
        }
    }

    #[test]
    fn test_insert_then_get() {
        let store = DepositStore::new();
        let k = key(1, b"s1");
        store.insert_new(k.clone(), record(1, 2)).unwrap();
        assert_eq!(store.get(&k).unwrap().amount, 500);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_existing_key_is_rejected_not_overwritten() {
        let store = DepositStore::new();
        let k = key(1, b"s1");
        store.insert_new(k.clone(), record(1, 2)).unwrap();

        let mut other = record(1, 7);
        other.amount = 9_999;
        assert_eq!(
            store.insert_new(k.clone(), other),
            Err(EscrowError::DuplicateKey)
        );
        // Original untouched.
        assert_eq!(store.get(&k).unwrap().amount, 500);
        assert_eq!(store.get(&k).unwrap().receiver, Identity::new([2u8; 32]));
    }

    #[test]
    fn test_same_seed_different_depositor_is_a_different_key() {
        let store = DepositStore::new();
        store.insert_new(key(1, b"seed"), record(1, 2)).unwrap();
        store.insert_new(key(2, b"seed"), record(2, 3)).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_update_missing_key() {
        let store = DepositStore::new();
        assert_eq!(
            store.update(&key(1, b"nope"), record(1, 2)),
            Err(EscrowError::DepositNotFound)
        );
    }

    #[test]
    fn test_remove() {
        let store = DepositStore::new();
        let k = key(1, b"s1");
        store.insert_new(k.clone(), record(1, 2)).unwrap();
        let removed = store.remove(&k).unwrap();
        assert_eq!(removed.amount, 500);
        assert!(store.get(&k).is_none());
        assert_eq!(store.remove(&k), Err(EscrowError::DepositNotFound));
    }

    #[test]
    fn test_insert_rejects_invalid_record() {
        let store = DepositStore::new();
        let mut bad = record(1, 2);
        bad.amount = 0;
        assert!(store.insert_new(key(1, b"s1"), bad).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_enumeration_by_party() {
        let store = DepositStore::new();
        store.insert_new(key(1, b"a"), record(1, 5)).unwrap();
        store.insert_new(key(1, b"b"), record(1, 6)).unwrap();
        store.insert_new(key(2, b"a"), record(2, 5)).unwrap();

        assert_eq!(store.by_depositor(&Identity::new([1u8; 32])).len(), 2);
        assert_eq!(store.by_depositor(&Identity::new([2u8; 32])).len(), 1);
        assert_eq!(store.by_receiver(&Identity::new([5u8; 32])).len(), 2);
        assert_eq!(store.by_receiver(&Identity::new([9u8; 32])).len(), 0);
    }

    #[test]
    fn test_export_json_contains_all_records() {
        let store = DepositStore::new();
        store.insert_new(key(1, b"a"), record(1, 5)).unwrap();
        store.insert_new(key(2, b"b"), record(2, 6)).unwrap();
        let snapshot = store.export_json();
        assert_eq!(snapshot.as_object().unwrap().len(), 2);
    }
}
