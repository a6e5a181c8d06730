//! The authority gate: who may change registry-wide parameters.
//!
//! The authority is set exactly once and never to the burn principal.
//! Fee and capacity changes require the caller to be that authority.
//! Every method here is a pure check returning the configuration that
//! would result; nothing is mutated until the caller applies it.

use crate::config::RegistryConfig;
use crate::error::{PetitionError, Result};
use crate::types::Principal;

impl RegistryConfig {
    /// Check that `caller` is the configured authority.
    pub fn authorize(&self, caller: &Principal) -> Result<&Principal> {
        match &self.authority {
            None => Err(PetitionError::AuthorityNotSet),
            Some(authority) if authority == caller => Ok(authority),
            Some(_) => Err(PetitionError::NotAuthorized),
        }
    }

    /// The configuration with `principal` installed as authority.
    pub fn with_authority(&self, principal: &Principal) -> Result<Self> {
        if principal.is_burn() {
            return Err(PetitionError::InvalidPrincipal);
        }
        if self.authority.is_some() {
            return Err(PetitionError::AuthorityAlreadySet);
        }

        let mut next = self.clone();
        next.authority = Some(principal.clone());
        Ok(next)
    }

    /// The configuration with a new creation fee.
    ///
    /// The fee is unsigned, so the non-negative rule holds by construction.
    pub fn with_creation_fee(&self, caller: &Principal, fee: u64) -> Result<Self> {
        self.authorize(caller)?;

        let mut next = self.clone();
        next.creation_fee = fee;
        Ok(next)
    }

    /// The configuration with a new capacity ceiling. Zero is rejected.
    pub fn with_max_petitions(&self, caller: &Principal, max_petitions: u64) -> Result<Self> {
        if max_petitions == 0 {
            return Err(PetitionError::InvalidInput);
        }
        self.authorize(caller)?;

        let mut next = self.clone();
        next.max_petitions = max_petitions;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority() -> Principal {
        Principal::from("ST2TEST")
    }

    #[test]
    fn test_set_authority_once() {
        let config = RegistryConfig::default();
        let config = config.with_authority(&authority()).unwrap();
        assert_eq!(config.authority, Some(authority()));

        let second = config.with_authority(&Principal::from("ST3OTHER"));
        assert_eq!(second, Err(PetitionError::AuthorityAlreadySet));

        let same = config.with_authority(&authority());
        assert_eq!(same, Err(PetitionError::AuthorityAlreadySet));
    }

    #[test]
    fn test_burn_principal_rejected() {
        let config = RegistryConfig::default();
        assert_eq!(
            config.with_authority(&Principal::burn()),
            Err(PetitionError::InvalidPrincipal)
        );

        let set = config.with_authority(&authority()).unwrap();
        assert_eq!(
            set.with_authority(&Principal::burn()),
            Err(PetitionError::InvalidPrincipal)
        );
    }

    #[test]
    fn test_fee_requires_authority() {
        let config = RegistryConfig::default();
        assert_eq!(
            config.with_creation_fee(&authority(), 10),
            Err(PetitionError::AuthorityNotSet)
        );

        let config = config.with_authority(&authority()).unwrap();
        assert_eq!(
            config.with_creation_fee(&Principal::from("ST1TEST"), 10),
            Err(PetitionError::NotAuthorized)
        );

        let updated = config.with_creation_fee(&authority(), 0).unwrap();
        assert_eq!(updated.creation_fee, 0);
        assert_eq!(config.creation_fee, 500);
    }

    #[test]
    fn test_max_petitions_rules() {
        let config = RegistryConfig::default()
            .with_authority(&authority())
            .unwrap();

        assert_eq!(
            config.with_max_petitions(&authority(), 0),
            Err(PetitionError::InvalidInput)
        );
        assert_eq!(
            config.with_max_petitions(&Principal::from("ST1TEST"), 5),
            Err(PetitionError::NotAuthorized)
        );
        assert_eq!(
            config.with_max_petitions(&authority(), 5).unwrap().max_petitions,
            5
        );
    }
}
