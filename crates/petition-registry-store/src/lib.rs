//! # Petition Registry Store
//!
//! Storage abstraction for the petition registry. Provides a trait-based
//! interface for persisting registry state, with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The registry never writes rows directly. It hands the store a validated
//! [`Changeset`](petition_registry_core::Changeset) through [`Store::commit`],
//! and rebuilds its in-memory state on startup with [`StoreExt::load_state`].
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use petition_registry_store::{SqliteStore, StoreExt};
//!
//! async fn example() -> petition_registry_store::Result<()> {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("registry.db")?;
//!
//!     // A fresh database has no registry yet
//!     if let Some(state) = store.load_state().await? {
//!         println!("{} petitions", state.count());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic commits**: config, petition and update slot land together or not at all
//! - **Derived index**: titles are unique in storage, but the lookup index is rebuilt on load
//! - **Checked load**: stored rows are re-validated before the registry trusts them

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreExt};
