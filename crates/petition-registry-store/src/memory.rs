//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use petition_registry_core::{Changeset, Petition, PetitionId, PetitionUpdate, RegistryConfig};

use crate::error::{Result, StoreError};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
    /// When set, every commit is rejected without writing.
    reject_commits: AtomicBool,
}

#[derive(Default)]
struct MemoryStoreInner {
    config: Option<RegistryConfig>,
    petitions: BTreeMap<PetitionId, Petition>,
    updates: BTreeMap<PetitionId, PetitionUpdate>,
    commits: u64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
            reject_commits: AtomicBool::new(false),
        }
    }

    /// Make subsequent commits fail (or succeed again).
    pub fn set_reject_commits(&self, reject: bool) {
        self.reject_commits.store(reject, Ordering::SeqCst);
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> Result<u64> {
        Ok(self.read()?.commits)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_config(&self) -> Result<Option<RegistryConfig>> {
        Ok(self.read()?.config.clone())
    }

    async fn load_petitions(&self) -> Result<Vec<(PetitionId, Petition)>> {
        let inner = self.read()?;
        Ok(inner
            .petitions
            .iter()
            .map(|(id, p)| (*id, p.clone()))
            .collect())
    }

    async fn load_updates(&self) -> Result<Vec<(PetitionId, PetitionUpdate)>> {
        let inner = self.read()?;
        Ok(inner
            .updates
            .iter()
            .map(|(id, u)| (*id, u.clone()))
            .collect())
    }

    async fn get_petition(&self, id: PetitionId) -> Result<Option<Petition>> {
        Ok(self.read()?.petitions.get(&id).cloned())
    }

    async fn get_update(&self, id: PetitionId) -> Result<Option<PetitionUpdate>> {
        Ok(self.read()?.updates.get(&id).cloned())
    }

    async fn commit(&self, changeset: &Changeset) -> Result<()> {
        if self.reject_commits.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected("memory store is rejecting commits".into()));
        }

        let mut inner = self.write()?;

        if let Some(config) = &changeset.config {
            inner.config = Some(config.clone());
        }
        if let Some((id, petition)) = &changeset.petition {
            inner.petitions.insert(*id, petition.clone());
        }
        if let Some((id, update)) = &changeset.update {
            inner.updates.insert(*id, update.clone());
        }
        inner.commits += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;
    use petition_registry_core::{NewPetition, Principal, RegistryState};

    fn creator() -> Principal {
        Principal::from("ST1TEST")
    }

    /// Plan and apply a creation, returning the changesets to replay.
    fn history() -> (RegistryState, Vec<Changeset>) {
        let mut state = RegistryState::default();
        let mut changesets = Vec::new();

        let set_authority = state.plan_set_authority(&Principal::from("ST2TEST")).unwrap();
        state.apply(&set_authority).unwrap();
        changesets.push(set_authority);

        let request = NewPetition::new("Test Title", "Test Description", 100, 1000);
        let plan = state.plan_create(&creator(), &request, 0).unwrap();
        state.apply(&plan.changeset).unwrap();
        changesets.push(plan.changeset);

        (state, changesets)
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        assert!(store.load_state().await.unwrap().is_none());

        let (state, changesets) = history();
        for changeset in &changesets {
            store.commit(changeset).await.unwrap();
        }

        let petition = store.get_petition(PetitionId::new(0)).await.unwrap().unwrap();
        assert_eq!(petition.title, "Test Title");
        assert_eq!(store.commit_count().unwrap(), 2);

        let loaded = store.load_state().await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_when_asked() {
        let store = MemoryStore::new();
        let (_, changesets) = history();

        store.set_reject_commits(true);
        let result = store.commit(&changesets[0]).await;
        assert!(matches!(result, Err(StoreError::WriteRejected(_))));
        assert!(store.load_config().await.unwrap().is_none());

        store.set_reject_commits(false);
        store.commit(&changesets[0]).await.unwrap();
        assert!(store.load_config().await.unwrap().is_some());
    }
}
