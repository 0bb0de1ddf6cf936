//! Admin registry: the single piece of cross-deposit shared state.
//!
//! Holds the official fee asset, the admin identity, and the pause flag.
//! The engine never reads the registry directly; every operation receives an
//! immutable [`RegistrySnapshot`], so tests can inject arbitrary registry
//! states and a concurrent admin change can never be observed mid-operation.

use parking_lot::RwLock;

use crate::error::EscrowError;
use crate::types::{AssetId, Identity, Signer};

/// Point-in-time view of the registry, passed into the state machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RegistrySnapshot {
    /// Asset burned on each renewal. Deposits snapshot this at creation.
    pub official_fee_asset: Option<AssetId>,
    /// When set, `Create` is rejected; all exit paths keep working.
    pub paused: bool,
}

struct RegistryState {
    official_fee_asset: Option<AssetId>,
    admin: Identity,
    paused: bool,
}

/// Singleton registry. Mutations are admin-gated; reads are snapshots.
pub struct AdminRegistry {
    inner: RwLock<RegistryState>,
}

impl AdminRegistry {
    pub fn new(admin: Identity) -> Self {
        AdminRegistry {
            inner: RwLock::new(RegistryState {
                official_fee_asset: None,
                admin,
                paused: false,
            }),
        }
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.inner.read();
        RegistrySnapshot {
            official_fee_asset: state.official_fee_asset,
            paused: state.paused,
        }
    }

    pub fn admin(&self) -> Identity {
        self.inner.read().admin
    }

    fn require_admin(&self, signer: &Signer) -> Result<(), EscrowError> {
        if self.inner.read().admin != signer.identity() {
            return Err(EscrowError::Unauthorized);
        }
        Ok(())
    }

    /// Designate the asset burned on renewals. Future creates snapshot the
    /// new value; existing deposits keep the one they were created with.
    pub fn set_official_fee_asset(
        &self,
        signer: &Signer,
        asset: AssetId,
    ) -> Result<(), EscrowError> {
        self.require_admin(signer)?;
        self.inner.write().official_fee_asset = Some(asset);
        tracing::info!(asset = %asset, "official fee asset updated");
        Ok(())
    }

    /// Pause or resume deposit creation.
    pub fn set_paused(&self, signer: &Signer, paused: bool) -> Result<(), EscrowError> {
        self.require_admin(signer)?;
        self.inner.write().paused = paused;
        tracing::info!(paused, "pause flag updated");
        Ok(())
    }

    /// Hand the admin role to a new identity.
    pub fn set_admin(&self, signer: &Signer, new_admin: Identity) -> Result<(), EscrowError> {
        self.require_admin(signer)?;
        self.inner.write().admin = new_admin;
        tracing::info!(new_admin = %new_admin, "admin transferred");
        Ok(())
    }
}
