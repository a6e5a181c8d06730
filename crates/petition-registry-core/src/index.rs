//! Title index: the one-to-one mapping from title to petition id.
//!
//! The index is derived from the petition map and can be rebuilt from it
//! at any time (see [`TitleIndex::rebuild`]).

use std::collections::HashMap;

use crate::error::{PetitionError, Result};
use crate::petition::Petition;
use crate::types::PetitionId;

/// Title → id mapping enforcing global title uniqueness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleIndex {
    by_title: HashMap<String, PetitionId>,
}

impl TitleIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from stored petitions.
    ///
    /// Fails with `PetitionAlreadyExists` if two petitions share a title.
    pub fn rebuild<'a, I>(petitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a PetitionId, &'a Petition)>,
    {
        let mut index = Self::new();
        for (id, petition) in petitions {
            index.insert(&petition.title, *id)?;
        }
        Ok(index)
    }

    /// Map `title` to `id`. Fails if the title is already mapped.
    pub fn insert(&mut self, title: &str, id: PetitionId) -> Result<()> {
        if self.by_title.contains_key(title) {
            return Err(PetitionError::PetitionAlreadyExists);
        }
        self.by_title.insert(title.to_string(), id);
        Ok(())
    }

    /// Drop the mapping for `title`, returning the id it pointed at.
    pub fn remove(&mut self, title: &str) -> Option<PetitionId> {
        self.by_title.remove(title)
    }

    /// Look up the id holding `title`.
    pub fn lookup(&self, title: &str) -> Option<PetitionId> {
        self.by_title.get(title).copied()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.by_title.contains_key(title)
    }

    /// True if `title` is held by a petition other than `id`.
    pub fn is_taken_by_other(&self, title: &str, id: PetitionId) -> bool {
        matches!(self.lookup(title), Some(holder) if holder != id)
    }

    /// Move `id` from `old_title` to `new_title` as one step.
    ///
    /// On collision with another id nothing changes: the old mapping stays
    /// and the new one is not inserted. Renaming to the same title is a no-op.
    pub fn rename(&mut self, old_title: &str, new_title: &str, id: PetitionId) -> Result<()> {
        if old_title == new_title {
            return Ok(());
        }
        if self.is_taken_by_other(new_title, id) {
            return Err(PetitionError::PetitionAlreadyExists);
        }
        if self.lookup(old_title) == Some(id) {
            self.by_title.remove(old_title);
        }
        self.by_title.insert(new_title.to_string(), id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut index = TitleIndex::new();
        index.insert("Save the Park", PetitionId::new(0)).unwrap();

        let result = index.insert("Save the Park", PetitionId::new(1));
        assert_eq!(result, Err(PetitionError::PetitionAlreadyExists));
        assert_eq!(index.lookup("Save the Park"), Some(PetitionId::new(0)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_and_lookup() {
        let mut index = TitleIndex::new();
        index.insert("A", PetitionId::new(3)).unwrap();

        assert_eq!(index.remove("A"), Some(PetitionId::new(3)));
        assert_eq!(index.lookup("A"), None);
        assert_eq!(index.remove("A"), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_rename_moves_mapping() {
        let mut index = TitleIndex::new();
        index.insert("Old", PetitionId::new(0)).unwrap();

        index.rename("Old", "New", PetitionId::new(0)).unwrap();
        assert!(!index.contains("Old"));
        assert_eq!(index.lookup("New"), Some(PetitionId::new(0)));
    }

    #[test]
    fn test_rename_collision_changes_nothing() {
        let mut index = TitleIndex::new();
        index.insert("First", PetitionId::new(0)).unwrap();
        index.insert("Second", PetitionId::new(1)).unwrap();
        let before = index.clone();

        let result = index.rename("Second", "First", PetitionId::new(1));
        assert_eq!(result, Err(PetitionError::PetitionAlreadyExists));
        assert_eq!(index, before);
    }

    #[test]
    fn test_rename_same_title_is_noop() {
        let mut index = TitleIndex::new();
        index.insert("Same", PetitionId::new(0)).unwrap();
        index.rename("Same", "Same", PetitionId::new(0)).unwrap();
        assert_eq!(index.lookup("Same"), Some(PetitionId::new(0)));
    }

    proptest! {
        #[test]
        fn test_renames_keep_index_injective(
            renames in prop::collection::vec((0u64..5, "[a-c]{1,2}"), 0..40),
        ) {
            let mut index = TitleIndex::new();
            let mut titles: Vec<String> = (0..5).map(|n| format!("seed{}", n)).collect();
            for (n, title) in titles.iter().enumerate() {
                index.insert(title, PetitionId::new(n as u64)).unwrap();
            }

            for (raw_id, new_title) in renames {
                let id = PetitionId::new(raw_id);
                let slot = raw_id as usize;
                let taken = index.is_taken_by_other(&new_title, id);

                match index.rename(&titles[slot], &new_title, id) {
                    Ok(()) => {
                        prop_assert!(!taken);
                        titles[slot] = new_title;
                    }
                    Err(e) => {
                        prop_assert!(taken);
                        prop_assert_eq!(e, PetitionError::PetitionAlreadyExists);
                    }
                }
            }

            prop_assert_eq!(index.len(), titles.len());
            for (n, title) in titles.iter().enumerate() {
                prop_assert_eq!(index.lookup(title), Some(PetitionId::new(n as u64)));
            }
        }
    }
}
