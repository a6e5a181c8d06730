//! # Petition Registry
//!
//! A registry of petitions: user-created records that collect signatures
//! toward a target, under a single authority that gates configuration and
//! collects a flat creation fee.
//!
//! ## Overview
//!
//! - **Petitions**: created open, edited by their creator, closed for good
//! - **Titles**: globally unique, including among closed petitions
//! - **Signatures**: accumulate monotonically and never pass the target
//! - **Authority**: set exactly once; the only principal that may change the
//!   fee and the capacity
//!
//! ## Usage
//!
//! ```rust,no_run
//! use petition_registry::{NewPetition, Principal, Registry, RegistryOptions};
//! use petition_registry::{RecordingSettlement, SystemClock};
//! use petition_registry::store::SqliteStore;
//!
//! async fn example() -> petition_registry::Result<()> {
//!     // Open storage
//!     let store = SqliteStore::open("registry.db")?;
//!
//!     // Open the registry
//!     let registry = Registry::open(
//!         store,
//!         SystemClock,
//!         RecordingSettlement::new(),
//!         RegistryOptions::default(),
//!     )
//!     .await?;
//!
//!     let authority = Principal::from("ST2TEST");
//!     registry.set_authority_contract(&authority, &authority).await?;
//!
//!     // Create a petition
//!     let creator = Principal::from("ST1TEST");
//!     let request = NewPetition::new("Plant more trees", "One per resident", 100, u64::MAX)
//!         .category("environment");
//!     let id = registry.create_petition(&creator, &request).await?;
//!
//!     // Sign it
//!     registry.increment_signatures(&creator, id, 1).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `petition_registry::core` - Records, validation and the state machine
//! - `petition_registry::store` - Storage abstraction and SQLite

pub mod clock;
pub mod error;
pub mod options;
pub mod registry;
pub mod settlement;

// Re-export component crates
pub use petition_registry_core as core;
pub use petition_registry_store as store;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RegistryError, Result};
pub use options::RegistryOptions;
pub use registry::Registry;
pub use settlement::{FeeSettlement, RecordingSettlement, SettlementError};

// Re-export commonly used core types
pub use petition_registry_core::{
    Category, NewPetition, Petition, PetitionEdit, PetitionError, PetitionId, PetitionStatus,
    PetitionUpdate, Principal, RegistryConfig, TransferIntent,
};
