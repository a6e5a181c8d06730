//! Store trait: the abstract interface for registry persistence.
//!
//! This trait allows the registry to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::sync::Arc;

use async_trait::async_trait;
use petition_registry_core::{
    Changeset, Petition, PetitionId, PetitionUpdate, RegistryConfig, RegistryState,
};

use crate::error::Result;

/// The Store trait: async interface for registry persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic commits**: a [`Changeset`] is written entirely or not at all.
/// - **Derived index**: the title index is not stored; it is rebuilt from
///   petitions by [`StoreExt::load_state`].
/// - **No validation**: the store trusts the registry to commit only
///   validated changesets. Consistency is re-checked on load.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Load the registry configuration, or `None` for a fresh store.
    async fn load_config(&self) -> Result<Option<RegistryConfig>>;

    /// Load every petition, ordered by id.
    async fn load_petitions(&self) -> Result<Vec<(PetitionId, Petition)>>;

    /// Load every update slot, ordered by id.
    async fn load_updates(&self) -> Result<Vec<(PetitionId, PetitionUpdate)>>;

    /// Get one petition by id.
    async fn get_petition(&self, id: PetitionId) -> Result<Option<Petition>>;

    /// Get the update slot of one petition.
    async fn get_update(&self, id: PetitionId) -> Result<Option<PetitionUpdate>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a changeset atomically.
    async fn commit(&self, changeset: &Changeset) -> Result<()>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn load_config(&self) -> Result<Option<RegistryConfig>> {
        (**self).load_config().await
    }

    async fn load_petitions(&self) -> Result<Vec<(PetitionId, Petition)>> {
        (**self).load_petitions().await
    }

    async fn load_updates(&self) -> Result<Vec<(PetitionId, PetitionUpdate)>> {
        (**self).load_updates().await
    }

    async fn get_petition(&self, id: PetitionId) -> Result<Option<Petition>> {
        (**self).get_petition(id).await
    }

    async fn get_update(&self, id: PetitionId) -> Result<Option<PetitionUpdate>> {
        (**self).get_update(id).await
    }

    async fn commit(&self, changeset: &Changeset) -> Result<()> {
        (**self).commit(changeset).await
    }
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Rebuild the full registry state, re-deriving the title index.
    ///
    /// Returns `None` if no configuration has ever been committed.
    fn load_state(&self) -> impl std::future::Future<Output = Result<Option<RegistryState>>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn load_state(&self) -> Result<Option<RegistryState>> {
        let Some(config) = self.load_config().await? else {
            return Ok(None);
        };

        let petitions = self.load_petitions().await?;
        let updates = self.load_updates().await?;

        Ok(Some(RegistryState::from_parts(config, petitions, updates)?))
    }
}
