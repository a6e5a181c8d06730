//! Error types for the petition registry core.

use thiserror::Error;

use crate::types::PetitionId;

/// Classified rejection of a registry operation.
///
/// Every variant carries a stable numeric code (see [`PetitionError::code`]).
/// Callers branch on the kind, so the codes must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum PetitionError {
    #[error("caller is not authorized")]
    NotAuthorized,

    #[error("petition not found")]
    PetitionNotFound,

    #[error("petition is closed")]
    PetitionClosed,

    #[error("invalid input")]
    InvalidInput,

    #[error("title must be 1-100 characters")]
    InvalidTitle,

    #[error("description must be 1-500 characters")]
    InvalidDescription,

    #[error("target signatures must be positive")]
    InvalidTarget,

    #[error("deadline must be after the current height")]
    InvalidDeadline,

    #[error("a petition with this title already exists")]
    PetitionAlreadyExists,

    #[error("petition status is inconsistent")]
    InvalidStatus,

    #[error("update not allowed")]
    UpdateNotAllowed,

    #[error("invalid update parameter")]
    InvalidUpdateParam,

    #[error("maximum number of petitions reached")]
    MaxPetitionsExceeded,

    #[error("category must be policy, environment or social")]
    InvalidCategory,

    #[error("priority must be at most 10")]
    InvalidPriority,

    #[error("location must be at most 100 characters")]
    InvalidLocation,

    #[error("at most 10 tags are allowed")]
    InvalidTags,

    #[error("authority contract is not set")]
    AuthorityNotSet,

    #[error("clock moved backwards")]
    InvalidTimestamp,

    #[error("minimum signatures must be positive")]
    InvalidMinSignatures,

    #[error("max extension must be at most 30")]
    InvalidMaxExtension,

    #[error("authority contract is already set")]
    AuthorityAlreadySet,

    #[error("principal cannot be used as authority")]
    InvalidPrincipal,
}

impl PetitionError {
    /// Every error kind, in code order.
    pub const ALL: [PetitionError; 23] = [
        PetitionError::NotAuthorized,
        PetitionError::PetitionNotFound,
        PetitionError::PetitionClosed,
        PetitionError::InvalidInput,
        PetitionError::InvalidTitle,
        PetitionError::InvalidDescription,
        PetitionError::InvalidTarget,
        PetitionError::InvalidDeadline,
        PetitionError::PetitionAlreadyExists,
        PetitionError::InvalidStatus,
        PetitionError::UpdateNotAllowed,
        PetitionError::InvalidUpdateParam,
        PetitionError::MaxPetitionsExceeded,
        PetitionError::InvalidCategory,
        PetitionError::InvalidPriority,
        PetitionError::InvalidLocation,
        PetitionError::InvalidTags,
        PetitionError::AuthorityNotSet,
        PetitionError::InvalidTimestamp,
        PetitionError::InvalidMinSignatures,
        PetitionError::InvalidMaxExtension,
        PetitionError::AuthorityAlreadySet,
        PetitionError::InvalidPrincipal,
    ];

    /// The stable wire code for this error kind.
    pub fn code(self) -> u32 {
        match self {
            PetitionError::NotAuthorized => 100,
            PetitionError::PetitionNotFound => 101,
            PetitionError::PetitionClosed => 102,
            PetitionError::InvalidInput => 103,
            PetitionError::InvalidTitle => 104,
            PetitionError::InvalidDescription => 105,
            PetitionError::InvalidTarget => 106,
            PetitionError::InvalidDeadline => 107,
            PetitionError::PetitionAlreadyExists => 108,
            PetitionError::InvalidStatus => 109,
            PetitionError::UpdateNotAllowed => 110,
            PetitionError::InvalidUpdateParam => 111,
            PetitionError::MaxPetitionsExceeded => 112,
            PetitionError::InvalidCategory => 113,
            PetitionError::InvalidPriority => 114,
            PetitionError::InvalidLocation => 115,
            PetitionError::InvalidTags => 116,
            PetitionError::AuthorityNotSet => 117,
            PetitionError::InvalidTimestamp => 118,
            PetitionError::InvalidMinSignatures => 119,
            PetitionError::InvalidMaxExtension => 120,
            PetitionError::AuthorityAlreadySet => 121,
            PetitionError::InvalidPrincipal => 122,
        }
    }

    /// Look up an error kind by its wire code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }
}

/// Errors found when rebuilding registry state from stored parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("petition {id} is invalid: {source}")]
    InvalidPetition {
        id: PetitionId,
        #[source]
        source: PetitionError,
    },

    #[error("petition {id} is at or beyond the counter {counter}")]
    IdBeyondCounter { id: PetitionId, counter: u64 },

    #[error("update slot {0} has no petition")]
    OrphanUpdate(PetitionId),
}

/// Result type for core registry operations.
pub type Result<T> = std::result::Result<T, PetitionError>;
