//! Error types for the registry.

use petition_registry_core::PetitionError;
use petition_registry_store::StoreError;
use thiserror::Error;

use crate::settlement::SettlementError;

/// Errors that can occur during registry operations.
///
/// [`RegistryError::Rejected`] is the recoverable case: the request broke a
/// rule, nothing changed, and the caller may correct it and retry. The other
/// variants come from collaborators and are surfaced as-is.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The operation was refused by a registry rule.
    #[error("rejected with code {code}: {0}", code = .0.code())]
    Rejected(#[from] PetitionError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The creation fee could not be settled.
    #[error("settlement error: {0}")]
    Settlement(#[from] SettlementError),

    /// Options could not be parsed.
    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),
}

impl RegistryError {
    /// The classified rejection, if this is one.
    pub fn rejection(&self) -> Option<PetitionError> {
        match self {
            RegistryError::Rejected(e) => Some(*e),
            _ => None,
        }
    }

    /// The stable wire code of a rejection.
    pub fn code(&self) -> Option<u32> {
        self.rejection().map(PetitionError::code)
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
