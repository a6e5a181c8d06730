//! Registry-wide configuration: the id counter, capacity, creation fee and
//! the authority principal.

use serde::{Deserialize, Serialize};

use crate::types::{PetitionId, Principal};

/// Default capacity ceiling for a fresh registry.
pub const DEFAULT_MAX_PETITIONS: u64 = 10_000;

/// Default flat creation fee for a fresh registry.
pub const DEFAULT_CREATION_FEE: u64 = 500;

/// The singleton registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Next id to assign. Equals the number of petitions ever created.
    pub petition_counter: u64,
    /// Capacity ceiling for `petition_counter`.
    pub max_petitions: u64,
    /// Flat amount charged per creation.
    pub creation_fee: u64,
    /// The authority principal. Set at most once.
    pub authority: Option<Principal>,
}

impl RegistryConfig {
    /// A fresh configuration with the given capacity and fee and no authority.
    pub fn new(max_petitions: u64, creation_fee: u64) -> Self {
        Self {
            petition_counter: 0,
            max_petitions,
            creation_fee,
            authority: None,
        }
    }

    /// True if another petition may be created.
    pub fn has_capacity(&self) -> bool {
        self.petition_counter < self.max_petitions
    }

    /// The id the next creation will receive.
    pub fn peek_next_id(&self) -> PetitionId {
        PetitionId::new(self.petition_counter)
    }

    /// Return the next id and advance the counter.
    pub fn next_id(&mut self) -> PetitionId {
        let id = self.peek_next_id();
        self.petition_counter += 1;
        id
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PETITIONS, DEFAULT_CREATION_FEE)
    }
}
