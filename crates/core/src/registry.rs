//! # Identity & Role-Address Registries
//!
//! External collaborators of the trust core, modeled at their interface:
//!
//! - [`IdentityRegistry`] resolves workers and buildings: whether a worker
//!   is active, whether a building is registered, and which wallet a
//!   building settles to.
//! - [`AddressRegistry`] resolves the "maintainer" and "treasury" logical
//!   roles to current settlement addresses.
//!
//! Both registries are mutable only by their owner, and every change is
//! logged.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::info;

use provenet_common::error::ErrorKind;
use provenet_common::types::short_id;
use provenet_common::{Address, SubjectId};

// ════════════════════════════════════════════════════════════════════════════════
// REGISTRY ERROR
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("caller {caller} is not the registry owner")]
    NotOwner { caller: Address },

    #[error("building id is all zeroes")]
    ZeroBuildingId,
}

impl RegistryError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOwner { .. } => ErrorKind::Authorization,
            Self::ZeroBuildingId => ErrorKind::Validation,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// IDENTITY REGISTRY
// ════════════════════════════════════════════════════════════════════════════════

/// Worker and building bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRegistry {
    owner: Address,
    active_workers: HashSet<Address>,
    buildings: HashMap<SubjectId, Address>,
}

impl IdentityRegistry {
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            active_workers: HashSet::new(),
            buildings: HashMap::new(),
        }
    }

    /// Whether `worker` is currently active.
    #[must_use]
    pub fn is_worker_active(&self, worker: &Address) -> bool {
        self.active_workers.contains(worker)
    }

    /// Whether `building` is registered.
    #[must_use]
    pub fn is_building_registered(&self, building: &SubjectId) -> bool {
        self.buildings.contains_key(building)
    }

    /// Settlement wallet of a registered building.
    #[must_use]
    pub fn building_wallet(&self, building: &SubjectId) -> Option<Address> {
        self.buildings.get(building).copied()
    }

    /// Marks a worker active. Owner only.
    pub fn register_worker(&mut self, caller: Address, worker: Address) -> Result<(), RegistryError> {
        if caller != self.owner {
            return Err(RegistryError::NotOwner { caller });
        }
        self.active_workers.insert(worker);
        info!(worker = %worker, "worker registered");
        Ok(())
    }

    /// Marks a worker inactive. Owner only.
    pub fn deactivate_worker(&mut self, caller: Address, worker: Address) -> Result<(), RegistryError> {
        if caller != self.owner {
            return Err(RegistryError::NotOwner { caller });
        }
        self.active_workers.remove(&worker);
        info!(worker = %worker, "worker deactivated");
        Ok(())
    }

    /// Registers a building and its settlement wallet. Owner only.
    /// Re-registering an id replaces the wallet.
    pub fn register_building(
        &mut self,
        caller: Address,
        building: SubjectId,
        wallet: Address,
    ) -> Result<(), RegistryError> {
        if caller != self.owner {
            return Err(RegistryError::NotOwner { caller });
        }
        if building == [0u8; 32] {
            return Err(RegistryError::ZeroBuildingId);
        }
        self.buildings.insert(building, wallet);
        info!(building = %short_id(&building), wallet = %wallet, "building registered");
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// ADDRESS REGISTRY
// ════════════════════════════════════════════════════════════════════════════════

/// Logical settlement role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Platform maintainer leg of the split.
    Maintainer,
    /// Treasury leg of the split.
    Treasury,
}

/// Resolves logical roles to current settlement addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRegistry {
    owner: Address,
    maintainer: Address,
    treasury: Address,
}

impl AddressRegistry {
    /// New registry with both roles initially resolving to the owner.
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            maintainer: owner,
            treasury: owner,
        }
    }

    #[must_use]
    pub fn resolve(&self, role: Role) -> Address {
        match role {
            Role::Maintainer => self.maintainer,
            Role::Treasury => self.treasury,
        }
    }

    /// Points `role` at a new settlement address. Owner only; logged.
    pub fn set_role(
        &mut self,
        caller: Address,
        role: Role,
        address: Address,
    ) -> Result<(), RegistryError> {
        if caller != self.owner {
            return Err(RegistryError::NotOwner { caller });
        }
        let previous = self.resolve(role);
        match role {
            Role::Maintainer => self.maintainer = address,
            Role::Treasury => self.treasury = address,
        }
        info!(?role, %previous, new = %address, "settlement role updated");
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// UNIT TESTS
// ════════════════════════════════════════════════════════════════════════════════
