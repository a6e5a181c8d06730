//! # Petition Registry Core
//!
//! Pure primitives for the petition registry: petition records, the
//! validation pipeline, the title index, the authority gate and the
//! registry state machine.
//!
//! This crate contains no I/O, no storage, no clock. Time and caller identity
//! are passed in by the caller.
//!
//! ## Key Types
//!
//! - [`Petition`] - A stored petition record
//! - [`PetitionUpdate`] - The most recent edit of a petition (one slot per id)
//! - [`RegistryConfig`] - Counter, capacity, creation fee and authority
//! - [`TitleIndex`] - Title → id mapping enforcing uniqueness
//! - [`RegistryState`] - All of the above, kept consistent
//! - [`Changeset`] - A validated set of writes, applied as a unit
//! - [`PetitionError`] - Classified rejection with a stable numeric code
//!
//! ## State transitions
//!
//! Every mutation is planned first (`RegistryState::plan_*`), which validates
//! and returns a [`Changeset`], and then installed with
//! [`RegistryState::apply`]. A rejected plan changes nothing.

pub mod authority;
pub mod config;
pub mod error;
pub mod index;
pub mod petition;
pub mod state;
pub mod types;
pub mod validation;

pub use config::{RegistryConfig, DEFAULT_CREATION_FEE, DEFAULT_MAX_PETITIONS};
pub use error::{PetitionError, StateError};
pub use index::TitleIndex;
pub use petition::{
    Category, NewPetition, Petition, PetitionEdit, PetitionStatus, PetitionUpdate,
    MAX_DESCRIPTION_LEN, MAX_EXTENSION_LIMIT, MAX_LOCATION_LEN, MAX_PRIORITY, MAX_TAGS,
    MAX_TITLE_LEN,
};
pub use state::{Changeset, CreatePlan, RegistryState};
pub use types::{BlockHeight, PetitionId, Principal, TransferIntent, BURN_PRINCIPAL};
pub use validation::{validate_edit, validate_increment, validate_new_petition};
