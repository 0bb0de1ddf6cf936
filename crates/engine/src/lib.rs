//! Vigil: a time-locked custody escrow with a proof-of-life renewal mechanic.
//!
//! A depositor locks a fungible asset for a receiver. While the deposit is
//! active the depositor must periodically renew it ("proof of life"),
//! burning one fee token each time; if renewal lapses past the configured
//! timeout, the receiver gains the right to claim the locked amount. The
//! depositor may withdraw at will before expiry.
//!
//! ## Architecture
//!
//! The state machine ([`engine::apply`]) is a pure function of
//! `(current record, operation, now, registry snapshot)` producing the new
//! record plus the ledger calls to execute. Ledger backends implement only
//! [`LedgerHost`] (transfer, burn, destination lookup); time comes from a
//! [`Clock`]; records live in the [`DepositStore`]; [`EscrowService`] wires
//! the pieces together and enforces the persist-after-transfer ordering.
//! The same engine runs unchanged over an account-model ledger and a
//! balance-mapping ledger and must produce identical state on both.

pub mod clock;
pub mod deposit;
pub mod engine;
pub mod error;
pub mod registry;
pub mod service;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use deposit::Deposit;
pub use engine::{apply, LedgerCall, Operation, Transition};
pub use error::{ErrorKind, EscrowError, LedgerError};
pub use registry::{AdminRegistry, RegistrySnapshot};
pub use service::{EscrowService, LedgerHost};
pub use store::DepositStore;
pub use types::{
    AssetId, DepositKey, DestinationMeta, Holder, Identity, Seed, Signer, ASSET_UNIT,
    MAX_DEPOSIT_AMOUNT, MAX_SEED_LENGTH, MAX_TIMEOUT_SECONDS, MIN_TIMEOUT_SECONDS,
    MIN_VALID_TIMESTAMP, PROOF_FEE_AMOUNT,
};
