//! Registry options.

use serde::{Deserialize, Serialize};

use petition_registry_core::{
    PetitionError, Principal, RegistryConfig, DEFAULT_CREATION_FEE, DEFAULT_MAX_PETITIONS,
};

use crate::error::Result;

/// Options for opening a registry.
///
/// `max_petitions` and `creation_fee` seed the configuration of a fresh
/// store only. Once a configuration is persisted it wins; change it with
/// [`Registry::set_creation_fee`](crate::Registry::set_creation_fee) and
/// [`Registry::set_max_petitions`](crate::Registry::set_max_petitions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    /// Initial capacity ceiling.
    pub max_petitions: u64,
    /// Initial flat creation fee.
    pub creation_fee: u64,
    /// Principal that may never become the authority.
    pub burn_principal: Principal,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            max_petitions: DEFAULT_MAX_PETITIONS,
            creation_fee: DEFAULT_CREATION_FEE,
            burn_principal: Principal::burn(),
        }
    }
}

impl RegistryOptions {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> std::result::Result<(), PetitionError> {
        if self.max_petitions == 0 {
            return Err(PetitionError::InvalidInput);
        }
        Ok(())
    }

    /// The configuration a fresh store starts with.
    pub fn initial_config(&self) -> RegistryConfig {
        RegistryConfig::new(self.max_petitions, self.creation_fee)
    }
}
