//! Registry state: the petition map, the update slots, the title index and
//! the configuration, kept consistent with each other.
//!
//! Mutations happen in two steps. A `plan_*` method validates against the
//! current state and returns a [`Changeset`] without touching anything.
//! [`RegistryState::apply`] then installs the changeset as one step. The
//! split lets a caller persist a changeset (or settle a fee) between the two,
//! and drop it on failure with the state untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::RegistryConfig;
use crate::error::{PetitionError, Result, StateError};
use crate::index::TitleIndex;
use crate::petition::{NewPetition, Petition, PetitionEdit, PetitionStatus, PetitionUpdate};
use crate::types::{BlockHeight, PetitionId, Principal, TransferIntent};
use crate::validation::{
    check_owned_open, validate_edit, validate_increment, validate_new_petition, validate_stored,
};

/// A validated set of writes, applied (and persisted) as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    /// Replacement configuration.
    pub config: Option<RegistryConfig>,
    /// Petition to insert or overwrite.
    pub petition: Option<(PetitionId, Petition)>,
    /// Update slot to overwrite.
    pub update: Option<(PetitionId, PetitionUpdate)>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.config.is_none() && self.petition.is_none() && self.update.is_none()
    }
}

/// The planned result of a creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePlan {
    /// The id the petition will receive.
    pub id: PetitionId,
    /// The fee to settle before the changeset is applied.
    pub fee: TransferIntent,
    pub changeset: Changeset,
}

/// In-memory registry state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryState {
    config: RegistryConfig,
    petitions: BTreeMap<PetitionId, Petition>,
    updates: BTreeMap<PetitionId, PetitionUpdate>,
    index: TitleIndex,
}

impl RegistryState {
    /// An empty registry with the given configuration.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            petitions: BTreeMap::new(),
            updates: BTreeMap::new(),
            index: TitleIndex::new(),
        }
    }

    /// Rebuild state from stored parts, re-deriving the title index.
    ///
    /// Checks that every id is below the counter, that every petition is
    /// internally consistent, that titles are unique, and that every update
    /// slot belongs to a petition.
    pub fn from_parts(
        config: RegistryConfig,
        petitions: impl IntoIterator<Item = (PetitionId, Petition)>,
        updates: impl IntoIterator<Item = (PetitionId, PetitionUpdate)>,
    ) -> std::result::Result<Self, StateError> {
        let mut state = Self::new(config);

        for (id, petition) in petitions {
            if id.get() >= state.config.petition_counter {
                return Err(StateError::IdBeyondCounter {
                    id,
                    counter: state.config.petition_counter,
                });
            }
            validate_stored(&petition)
                .and_then(|_| state.index.insert(&petition.title, id))
                .map_err(|source| StateError::InvalidPetition { id, source })?;
            state.petitions.insert(id, petition);
        }

        for (id, update) in updates {
            if !state.petitions.contains_key(&id) {
                return Err(StateError::OrphanUpdate(id));
            }
            state.updates.insert(id, update);
        }

        Ok(state)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn get(&self, id: PetitionId) -> Option<&Petition> {
        self.petitions.get(&id)
    }

    pub fn get_update(&self, id: PetitionId) -> Option<&PetitionUpdate> {
        self.updates.get(&id)
    }

    /// Number of petitions ever created.
    pub fn count(&self) -> u64 {
        self.config.petition_counter
    }

    /// True if some petition (open or closed) holds `title`.
    pub fn exists(&self, title: &str) -> bool {
        self.index.contains(title)
    }

    pub fn lookup_title(&self, title: &str) -> Option<PetitionId> {
        self.index.lookup(title)
    }

    pub fn index(&self) -> &TitleIndex {
        &self.index
    }

    /// All petitions in id order.
    pub fn petitions(&self) -> impl Iterator<Item = (&PetitionId, &Petition)> {
        self.petitions.iter()
    }

    /// All update slots in id order.
    pub fn updates(&self) -> impl Iterator<Item = (&PetitionId, &PetitionUpdate)> {
        self.updates.iter()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Planning
    // ─────────────────────────────────────────────────────────────────────────

    pub fn plan_set_authority(&self, principal: &Principal) -> Result<Changeset> {
        Ok(Changeset {
            config: Some(self.config.with_authority(principal)?),
            ..Changeset::default()
        })
    }

    pub fn plan_set_creation_fee(&self, caller: &Principal, fee: u64) -> Result<Changeset> {
        Ok(Changeset {
            config: Some(self.config.with_creation_fee(caller, fee)?),
            ..Changeset::default()
        })
    }

    pub fn plan_set_max_petitions(
        &self,
        caller: &Principal,
        max_petitions: u64,
    ) -> Result<Changeset> {
        Ok(Changeset {
            config: Some(self.config.with_max_petitions(caller, max_petitions)?),
            ..Changeset::default()
        })
    }

    /// Plan a creation by `caller` at height `now`.
    pub fn plan_create(
        &self,
        caller: &Principal,
        request: &NewPetition,
        now: BlockHeight,
    ) -> Result<CreatePlan> {
        let category = validate_new_petition(request, &self.config, &self.index, now)?;
        let payee = self
            .config
            .authority
            .clone()
            .ok_or(PetitionError::AuthorityNotSet)?;

        let mut config = self.config.clone();
        let id = config.next_id();

        let petition = Petition {
            creator: caller.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            target_signatures: request.target_signatures,
            current_signatures: 0,
            deadline: request.deadline,
            is_active: true,
            category,
            priority: request.priority,
            location: request.location.clone(),
            tags: request.tags.clone(),
            timestamp: now,
            status: PetitionStatus::Open,
            min_signatures: request.min_signatures,
            max_extension: request.max_extension,
        };

        Ok(CreatePlan {
            id,
            fee: TransferIntent {
                amount: self.config.creation_fee,
                payer: caller.clone(),
                payee,
            },
            changeset: Changeset {
                config: Some(config),
                petition: Some((id, petition)),
                update: None,
            },
        })
    }

    /// Plan an edit of `id` by `caller` at height `now`.
    pub fn plan_update(
        &self,
        caller: &Principal,
        id: PetitionId,
        edit: &PetitionEdit,
        now: BlockHeight,
    ) -> Result<Changeset> {
        let current = validate_edit(id, self.get(id), caller, edit, &self.index)?;

        let mut petition = current.clone();
        petition.title = edit.title.clone();
        petition.description = edit.description.clone();
        petition.target_signatures = edit.target_signatures;
        petition.timestamp = now;

        let update = PetitionUpdate {
            update_title: edit.title.clone(),
            update_description: edit.description.clone(),
            update_target: edit.target_signatures,
            update_timestamp: now,
            updater: caller.clone(),
        };

        Ok(Changeset {
            config: None,
            petition: Some((id, petition)),
            update: Some((id, update)),
        })
    }

    /// Plan closing `id`. Only the creator may close an open petition.
    pub fn plan_close(&self, caller: &Principal, id: PetitionId) -> Result<Changeset> {
        let mut petition = check_owned_open(self.get(id), caller)?.clone();
        petition.is_active = false;
        petition.status = PetitionStatus::Closed;

        Ok(Changeset {
            petition: Some((id, petition)),
            ..Changeset::default()
        })
    }

    /// Plan adding `amount` signatures to `id`.
    pub fn plan_increment(&self, id: PetitionId, amount: u64) -> Result<Changeset> {
        let current = self.get(id);
        let next = validate_increment(current, amount)?;
        let mut petition = current.cloned().ok_or(PetitionError::PetitionNotFound)?;
        petition.current_signatures = next;

        Ok(Changeset {
            petition: Some((id, petition)),
            ..Changeset::default()
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Application
    // ─────────────────────────────────────────────────────────────────────────

    /// Install a changeset.
    ///
    /// The index change is the only fallible step and runs first, so on
    /// error nothing has been modified.
    pub fn apply(&mut self, changeset: &Changeset) -> Result<()> {
        if let Some((id, petition)) = &changeset.petition {
            match self.petitions.get(id) {
                Some(existing) => self.index.rename(&existing.title, &petition.title, *id)?,
                None => self.index.insert(&petition.title, *id)?,
            }
            self.petitions.insert(*id, petition.clone());
        }
        if let Some((id, update)) = &changeset.update {
            self.updates.insert(*id, update.clone());
        }
        if let Some(config) = &changeset.config {
            self.config = config.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::petition::Category;

    fn creator() -> Principal {
        Principal::from("ST1TEST")
    }

    fn authority() -> Principal {
        Principal::from("ST2TEST")
    }

    fn configured_state() -> RegistryState {
        let mut state = RegistryState::default();
        let changeset = state.plan_set_authority(&authority()).unwrap();
        state.apply(&changeset).unwrap();
        state
    }

    fn request(title: &str) -> NewPetition {
        NewPetition::new(title, "Test Description", 100, 1000)
            .category("policy")
            .priority(5)
            .location("Test Location")
            .tags(["tag1", "tag2"])
            .min_signatures(10)
            .max_extension(15)
    }

    fn no_updates() -> Vec<(PetitionId, PetitionUpdate)> {
        Vec::new()
    }

    fn create(state: &mut RegistryState, title: &str) -> PetitionId {
        let plan = state.plan_create(&creator(), &request(title), 0).unwrap();
        state.apply(&plan.changeset).unwrap();
        plan.id
    }

    #[test]
    fn test_create_plan_does_not_mutate() {
        let state = configured_state();
        let before = state.clone();

        let plan = state.plan_create(&creator(), &request("Test Title"), 0).unwrap();
        assert_eq!(plan.id, PetitionId::new(0));
        assert_eq!(
            plan.fee,
            TransferIntent {
                amount: 500,
                payer: creator(),
                payee: authority(),
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_create_and_read_back() {
        let mut state = configured_state();
        let id = create(&mut state, "Test Title");

        let petition = state.get(id).unwrap();
        assert_eq!(petition.creator, creator());
        assert_eq!(petition.current_signatures, 0);
        assert!(petition.is_active);
        assert_eq!(petition.status, PetitionStatus::Open);
        assert_eq!(petition.category, Category::Policy);
        assert_eq!(state.count(), 1);
        assert!(state.exists("Test Title"));
        assert_eq!(state.lookup_title("Test Title"), Some(id));
    }

    #[test]
    fn test_ids_are_dense() {
        let mut state = configured_state();
        for n in 0..5u64 {
            let id = create(&mut state, &format!("Title {}", n));
            assert_eq!(id, PetitionId::new(n));
        }
        assert_eq!(state.count(), 5);
    }

    #[test]
    fn test_failed_create_consumes_nothing() {
        let mut state = configured_state();
        create(&mut state, "Test Title");
        let before = state.clone();

        let result = state.plan_create(&creator(), &request("Test Title"), 0);
        assert_eq!(result.err(), Some(PetitionError::PetitionAlreadyExists));
        assert_eq!(state, before);
        assert_eq!(state.config().peek_next_id(), PetitionId::new(1));
    }

    #[test]
    fn test_update_moves_title_and_fills_slot() {
        let mut state = configured_state();
        let id = create(&mut state, "Test Title");

        let edit = PetitionEdit::new("New Title", "New Description", 200);
        let changeset = state.plan_update(&creator(), id, &edit, 5).unwrap();
        state.apply(&changeset).unwrap();

        assert!(!state.exists("Test Title"));
        assert!(state.exists("New Title"));

        let petition = state.get(id).unwrap();
        assert_eq!(petition.title, "New Title");
        assert_eq!(petition.target_signatures, 200);
        assert_eq!(petition.timestamp, 5);

        let slot = state.get_update(id).unwrap();
        assert_eq!(slot.update_title, "New Title");
        assert_eq!(slot.update_target, 200);
        assert_eq!(slot.update_timestamp, 5);
        assert_eq!(slot.updater, creator());
    }

    #[test]
    fn test_update_slot_is_overwritten() {
        let mut state = configured_state();
        let id = create(&mut state, "Test Title");

        for (n, title) in ["Second", "Third"].iter().enumerate() {
            let edit = PetitionEdit::new(*title, "Desc", 100);
            let changeset = state.plan_update(&creator(), id, &edit, n as u64 + 1).unwrap();
            state.apply(&changeset).unwrap();
        }

        assert_eq!(state.updates().count(), 1);
        assert_eq!(state.get_update(id).unwrap().update_title, "Third");
    }

    #[test]
    fn test_update_collision_leaves_state_unchanged() {
        let mut state = configured_state();
        let first = create(&mut state, "First");
        create(&mut state, "Second");
        let before = state.clone();

        let edit = PetitionEdit::new("Second", "Desc", 100);
        let result = state.plan_update(&creator(), first, &edit, 1);
        assert_eq!(result, Err(PetitionError::PetitionAlreadyExists));
        assert_eq!(state, before);
    }

    #[test]
    fn test_apply_collision_is_atomic() {
        let mut state = configured_state();
        let first = create(&mut state, "First");
        create(&mut state, "Second");
        let before = state.clone();

        // A stale changeset that now collides must not half-apply.
        let mut petition = state.get(first).unwrap().clone();
        petition.title = "Second".into();
        let stale = Changeset {
            petition: Some((first, petition)),
            ..Changeset::default()
        };

        assert_eq!(state.apply(&stale), Err(PetitionError::PetitionAlreadyExists));
        assert_eq!(state, before);
    }

    #[test]
    fn test_closed_is_terminal() {
        let mut state = configured_state();
        let id = create(&mut state, "Test Title");

        let changeset = state.plan_close(&creator(), id).unwrap();
        state.apply(&changeset).unwrap();

        let petition = state.get(id).unwrap();
        assert!(!petition.is_active);
        assert_eq!(petition.status, PetitionStatus::Closed);

        let edit = PetitionEdit::new("Other", "Desc", 100);
        assert_eq!(
            state.plan_update(&creator(), id, &edit, 1),
            Err(PetitionError::PetitionClosed)
        );
        assert_eq!(state.plan_close(&creator(), id), Err(PetitionError::PetitionClosed));
        assert_eq!(state.plan_increment(id, 1), Err(PetitionError::PetitionClosed));

        // A closed petition keeps its title reserved.
        assert!(state.exists("Test Title"));
    }

    #[test]
    fn test_close_requires_creator() {
        let mut state = configured_state();
        let id = create(&mut state, "Test Title");

        assert_eq!(
            state.plan_close(&authority(), id),
            Err(PetitionError::NotAuthorized)
        );
        assert_eq!(
            state.plan_close(&creator(), PetitionId::new(9)),
            Err(PetitionError::PetitionNotFound)
        );
    }

    #[test]
    fn test_increment_by_anyone() {
        let mut state = configured_state();
        let id = create(&mut state, "Test Title");

        let changeset = state.plan_increment(id, 40).unwrap();
        state.apply(&changeset).unwrap();
        let changeset = state.plan_increment(id, 60).unwrap();
        state.apply(&changeset).unwrap();

        assert_eq!(state.get(id).unwrap().current_signatures, 100);
        assert_eq!(state.plan_increment(id, 1), Err(PetitionError::InvalidUpdateParam));
    }

    #[test]
    fn test_from_parts_rebuilds_index() {
        let mut state = configured_state();
        let id = create(&mut state, "Test Title");
        let edit = PetitionEdit::new("Renamed", "Desc", 100);
        let changeset = state.plan_update(&creator(), id, &edit, 1).unwrap();
        state.apply(&changeset).unwrap();

        let rebuilt = RegistryState::from_parts(
            state.config().clone(),
            state.petitions().map(|(id, p)| (*id, p.clone())),
            state.updates().map(|(id, u)| (*id, u.clone())),
        )
        .unwrap();

        assert_eq!(rebuilt, state);
        assert_eq!(rebuilt.lookup_title("Renamed"), Some(id));
    }

    #[test]
    fn test_from_parts_rejects_broken_parts() {
        let mut state = configured_state();
        let id = create(&mut state, "Test Title");
        let petition = state.get(id).unwrap().clone();

        let mut short_counter = state.config().clone();
        short_counter.petition_counter = 0;
        let result =
            RegistryState::from_parts(short_counter, [(id, petition.clone())], no_updates());
        assert!(matches!(result, Err(StateError::IdBeyondCounter { .. })));

        let mut config = state.config().clone();
        config.petition_counter = 2;
        let duplicate = vec![
            (PetitionId::new(0), petition.clone()),
            (PetitionId::new(1), petition.clone()),
        ];
        let result = RegistryState::from_parts(config.clone(), duplicate, no_updates());
        assert!(matches!(
            result,
            Err(StateError::InvalidPetition {
                source: PetitionError::PetitionAlreadyExists,
                ..
            })
        ));

        let mut inconsistent = petition;
        inconsistent.is_active = false;
        let result = RegistryState::from_parts(config.clone(), [(id, inconsistent)], no_updates());
        assert!(matches!(
            result,
            Err(StateError::InvalidPetition {
                source: PetitionError::InvalidStatus,
                ..
            })
        ));

        let orphan = PetitionUpdate {
            update_title: "x".into(),
            update_description: "y".into(),
            update_target: 1,
            update_timestamp: 0,
            updater: creator(),
        };
        let no_petitions: Vec<(PetitionId, Petition)> = Vec::new();
        let result =
            RegistryState::from_parts(config, no_petitions, [(PetitionId::new(1), orphan)]);
        assert_eq!(result, Err(StateError::OrphanUpdate(PetitionId::new(1))));
    }
}
