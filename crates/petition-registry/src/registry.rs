//! The Registry: lifecycle controller for petitions.
//!
//! The Registry brings together the in-memory state, the store, the clock
//! and fee settlement. Every mutation follows the same path:
//!
//! 1. plan against the current state (pure, may reject),
//! 2. settle the creation fee (create only),
//! 3. commit the changeset to the store,
//! 4. apply the changeset to the in-memory state.
//!
//! All four steps run under the write half of one lock, so mutations are
//! serialized and readers always see a state between two operations. A
//! failure at any step leaves the in-memory state untouched. A creation
//! whose commit fails after the fee was settled refunds that fee.

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use petition_registry_core::{
    BlockHeight, Changeset, NewPetition, Petition, PetitionEdit, PetitionError, PetitionId,
    PetitionUpdate, Principal, RegistryConfig, RegistryState, TransferIntent,
};
use petition_registry_store::{Store, StoreExt};

use crate::clock::Clock;
use crate::error::{RegistryError, Result};
use crate::options::RegistryOptions;
use crate::settlement::FeeSettlement;

/// State guarded by the registry lock.
struct Inner {
    state: RegistryState,
    /// Highest height any successful operation has used.
    last_height: BlockHeight,
}

/// The petition registry.
///
/// Provides a unified API for:
/// - Configuring the authority, creation fee and capacity
/// - Creating, updating and closing petitions
/// - Recording signatures
/// - Querying petitions by id or title
pub struct Registry<S: Store, C: Clock, F: FeeSettlement> {
    /// The storage backend.
    store: S,
    /// Source of block heights.
    clock: C,
    /// Where creation fees go.
    settlement: F,
    /// Options the registry was opened with.
    options: RegistryOptions,
    inner: RwLock<Inner>,
}

impl<S: Store, C: Clock, F: FeeSettlement> Registry<S, C, F> {
    /// Open a registry over `store`.
    ///
    /// Loads the persisted state, or seeds a fresh configuration from
    /// `options` when the store has none.
    pub async fn open(
        store: S,
        clock: C,
        settlement: F,
        options: RegistryOptions,
    ) -> Result<Self> {
        options.validate()?;

        let state = match store.load_state().await? {
            Some(state) => {
                debug!(
                    petitions = state.count(),
                    authority = ?state.config().authority,
                    "loaded registry state"
                );
                state
            }
            None => {
                let config = options.initial_config();
                store
                    .commit(&Changeset {
                        config: Some(config.clone()),
                        ..Changeset::default()
                    })
                    .await?;
                info!(
                    max_petitions = config.max_petitions,
                    creation_fee = config.creation_fee,
                    "seeded registry configuration"
                );
                RegistryState::new(config)
            }
        };

        let last_height = state
            .petitions()
            .map(|(_, petition)| petition.timestamp)
            .max()
            .unwrap_or_default();

        Ok(Self {
            store,
            clock,
            settlement,
            options,
            inner: RwLock::new(Inner { state, last_height }),
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the settlement reference.
    pub fn settlement(&self) -> &F {
        &self.settlement
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────────

    /// Register the authority. Succeeds once.
    pub async fn set_authority_contract(
        &self,
        caller: &Principal,
        principal: &Principal,
    ) -> Result<()> {
        const OP: &str = "set_authority_contract";
        let mut inner = self.inner.write().await;

        if *principal == self.options.burn_principal {
            return Err(rejected(OP, caller, PetitionError::InvalidPrincipal));
        }

        let changeset = inner
            .state
            .plan_set_authority(principal)
            .map_err(|e| rejected(OP, caller, e))?;
        self.persist(&mut inner, OP, &changeset).await?;

        info!(caller = %caller, authority = %principal, "authority set");
        Ok(())
    }

    /// Change the creation fee. Authority only.
    pub async fn set_creation_fee(&self, caller: &Principal, fee: u64) -> Result<()> {
        const OP: &str = "set_creation_fee";
        let mut inner = self.inner.write().await;

        let changeset = inner
            .state
            .plan_set_creation_fee(caller, fee)
            .map_err(|e| rejected(OP, caller, e))?;
        self.persist(&mut inner, OP, &changeset).await?;

        info!(caller = %caller, fee, "creation fee changed");
        Ok(())
    }

    /// Change the capacity ceiling. Authority only; must be positive.
    pub async fn set_max_petitions(&self, caller: &Principal, max_petitions: u64) -> Result<()> {
        const OP: &str = "set_max_petitions";
        let mut inner = self.inner.write().await;

        let changeset = inner
            .state
            .plan_set_max_petitions(caller, max_petitions)
            .map_err(|e| rejected(OP, caller, e))?;
        self.persist(&mut inner, OP, &changeset).await?;

        info!(caller = %caller, max_petitions, "capacity changed");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Petition Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a petition owned by `caller`.
    ///
    /// Runs the full validation pipeline, settles the creation fee from
    /// `caller` to the authority, then assigns the next id. Any failure
    /// consumes no id and charges nothing: a fee settled before a failed
    /// commit is refunded.
    pub async fn create_petition(
        &self,
        caller: &Principal,
        request: &NewPetition,
    ) -> Result<PetitionId> {
        const OP: &str = "create_petition";
        let mut inner = self.inner.write().await;
        let now = self.observe_height(&inner, OP, caller)?;

        let plan = inner
            .state
            .plan_create(caller, request, now)
            .map_err(|e| rejected(OP, caller, e))?;

        if let Err(e) = self.settlement.settle(&plan.fee).await {
            warn!(
                op = OP,
                caller = %caller,
                amount = plan.fee.amount,
                error = %e,
                "fee settlement failed"
            );
            return Err(e.into());
        }

        if let Err(e) = self.persist(&mut inner, OP, &plan.changeset).await {
            self.refund(OP, caller, &plan.fee).await;
            return Err(e);
        }
        inner.last_height = now;

        info!(
            id = %plan.id,
            creator = %caller,
            title = %request.title,
            fee = plan.fee.amount,
            "petition created"
        );
        Ok(plan.id)
    }

    /// Edit title, description and target. Creator only, open petitions only.
    pub async fn update_petition(
        &self,
        caller: &Principal,
        id: PetitionId,
        edit: &PetitionEdit,
    ) -> Result<()> {
        const OP: &str = "update_petition";
        let mut inner = self.inner.write().await;
        let now = self.observe_height(&inner, OP, caller)?;

        let changeset = inner
            .state
            .plan_update(caller, id, edit, now)
            .map_err(|e| rejected(OP, caller, e))?;
        self.persist(&mut inner, OP, &changeset).await?;
        inner.last_height = now;

        info!(id = %id, caller = %caller, title = %edit.title, "petition updated");
        Ok(())
    }

    /// Close a petition for good. Creator only.
    pub async fn close_petition(&self, caller: &Principal, id: PetitionId) -> Result<()> {
        const OP: &str = "close_petition";
        let mut inner = self.inner.write().await;

        let changeset = inner
            .state
            .plan_close(caller, id)
            .map_err(|e| rejected(OP, caller, e))?;
        self.persist(&mut inner, OP, &changeset).await?;

        info!(id = %id, caller = %caller, "petition closed");
        Ok(())
    }

    /// Add `amount` signatures. Open to any caller.
    pub async fn increment_signatures(
        &self,
        caller: &Principal,
        id: PetitionId,
        amount: u64,
    ) -> Result<()> {
        const OP: &str = "increment_signatures";
        let mut inner = self.inner.write().await;

        let changeset = inner
            .state
            .plan_increment(id, amount)
            .map_err(|e| rejected(OP, caller, e))?;
        self.persist(&mut inner, OP, &changeset).await?;

        debug!(
            id = %id,
            caller = %caller,
            amount,
            current = ?inner.state.get(id).map(|p| p.current_signatures),
            "signatures recorded"
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn get_petition(&self, id: PetitionId) -> Option<Petition> {
        self.inner.read().await.state.get(id).cloned()
    }

    /// The most recent edit of `id`, if it was ever updated.
    pub async fn get_petition_update(&self, id: PetitionId) -> Option<PetitionUpdate> {
        self.inner.read().await.state.get_update(id).cloned()
    }

    /// Look a petition up by its (exact) title.
    pub async fn get_petition_by_title(&self, title: &str) -> Option<(PetitionId, Petition)> {
        let inner = self.inner.read().await;
        let id = inner.state.lookup_title(title)?;
        inner.state.get(id).cloned().map(|petition| (id, petition))
    }

    /// Number of petitions ever created.
    pub async fn get_petition_count(&self) -> u64 {
        self.inner.read().await.state.count()
    }

    /// True if any petition, open or closed, holds `title`.
    pub async fn check_petition_existence(&self, title: &str) -> bool {
        self.inner.read().await.state.exists(title)
    }

    /// Snapshot of the current configuration.
    pub async fn config(&self) -> RegistryConfig {
        self.inner.read().await.state.config().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Read the clock, refusing a height below one already used.
    fn observe_height(
        &self,
        inner: &Inner,
        op: &'static str,
        caller: &Principal,
    ) -> Result<BlockHeight> {
        let now = self.clock.now();
        if now < inner.last_height {
            warn!(op, now, last = inner.last_height, "clock moved backwards");
            return Err(rejected(op, caller, PetitionError::InvalidTimestamp));
        }
        Ok(now)
    }

    /// Commit a changeset, then install it in memory.
    async fn persist(
        &self,
        inner: &mut Inner,
        op: &'static str,
        changeset: &Changeset,
    ) -> Result<()> {
        if let Err(e) = self.store.commit(changeset).await {
            warn!(op, error = %e, "failed to persist changeset");
            return Err(e.into());
        }
        inner.state.apply(changeset)?;
        Ok(())
    }

    /// Reverse a settled fee. The caller's error wins; a failed refund is
    /// only logged.
    async fn refund(&self, op: &'static str, caller: &Principal, fee: &TransferIntent) {
        match self.settlement.refund(fee).await {
            Ok(()) => info!(op, caller = %caller, amount = fee.amount, "fee refunded"),
            Err(e) => error!(
                op,
                caller = %caller,
                amount = fee.amount,
                payee = %fee.payee,
                error = %e,
                "fee refund failed, transfer left unreconciled"
            ),
        }
    }
}

/// Log a rule rejection and wrap it.
fn rejected(op: &'static str, caller: &Principal, error: PetitionError) -> RegistryError {
    warn!(op, caller = %caller, code = error.code(), error = %error, "operation rejected");
    RegistryError::Rejected(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::settlement::RecordingSettlement;
    use petition_registry_core::PetitionStatus;
    use petition_registry_store::MemoryStore;
    use std::sync::Arc;

    type TestRegistry = Registry<Arc<MemoryStore>, Arc<ManualClock>, Arc<RecordingSettlement>>;

    struct Harness {
        registry: TestRegistry,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        settlement: Arc<RecordingSettlement>,
    }

    fn creator() -> Principal {
        Principal::from("ST1TEST")
    }

    fn authority() -> Principal {
        Principal::from("ST2TEST")
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

    async fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(0));
        let settlement = Arc::new(RecordingSettlement::new());
        let registry = Registry::open(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&settlement),
            RegistryOptions::default(),
        )
        .await
        .unwrap();
        registry
            .set_authority_contract(&authority(), &authority())
            .await
            .unwrap();

        Harness {
            registry,
            store,
            clock,
            settlement,
        }
    }

    #[tokio::test]
    async fn test_open_seeds_config() {
        let store = Arc::new(MemoryStore::new());
        let registry = Registry::open(
            Arc::clone(&store),
            ManualClock::new(0),
            RecordingSettlement::new(),
            RegistryOptions::default(),
        )
        .await
        .unwrap();

        let config = registry.config().await;
        assert_eq!(config.max_petitions, 10_000);
        assert_eq!(config.creation_fee, 500);
        assert!(config.authority.is_none());
        assert_eq!(store.load_config().await.unwrap(), Some(config));
    }

    #[tokio::test]
    async fn test_create_emits_fee_and_persists() {
        let h = harness().await;

        let id = h.registry.create_petition(&creator(), &request("Test Title")).await.unwrap();
        assert_eq!(id, PetitionId::new(0));

        let petition = h.registry.get_petition(id).await.unwrap();
        assert_eq!(petition.current_signatures, 0);
        assert!(petition.is_active);
        assert_eq!(petition.status, PetitionStatus::Open);

        assert_eq!(
            h.settlement.intents(),
            vec![TransferIntent {
                amount: 500,
                payer: creator(),
                payee: authority(),
            }]
        );
        assert_eq!(h.store.get_petition(id).await.unwrap(), Some(petition));
    }

    #[tokio::test]
    async fn test_settlement_failure_consumes_nothing() {
        let h = harness().await;
        h.settlement.set_reject(true);

        let result = h.registry.create_petition(&creator(), &request("Test Title")).await;
        assert!(matches!(result, Err(RegistryError::Settlement(_))));
        assert_eq!(h.registry.get_petition_count().await, 0);
        assert!(!h.registry.check_petition_existence("Test Title").await);

        h.settlement.set_reject(false);
        let id = h.registry.create_petition(&creator(), &request("Test Title")).await.unwrap();
        assert_eq!(id, PetitionId::new(0));
    }

    #[tokio::test]
    async fn test_store_failure_leaves_memory_untouched() {
        let h = harness().await;
        let id = h.registry.create_petition(&creator(), &request("Test Title")).await.unwrap();

        h.store.set_reject_commits(true);
        let result = h.registry.increment_signatures(&creator(), id, 10).await;
        assert!(matches!(result, Err(RegistryError::Store(_))));
        assert_eq!(h.registry.get_petition(id).await.unwrap().current_signatures, 0);

        let edit = PetitionEdit::new("New Title", "New Description", 200);
        assert!(h.registry.update_petition(&creator(), id, &edit).await.is_err());
        assert!(h.registry.check_petition_existence("Test Title").await);
        assert!(h.registry.get_petition_update(id).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_create_commit_refunds_fee() {
        let h = harness().await;
        h.store.set_reject_commits(true);

        let result = h.registry.create_petition(&creator(), &request("Test Title")).await;
        assert!(matches!(result, Err(RegistryError::Store(_))));
        assert!(h.settlement.intents().is_empty());
        assert_eq!(h.settlement.total(), 0);
        assert_eq!(
            h.settlement.refunds(),
            vec![TransferIntent {
                amount: 500,
                payer: creator(),
                payee: authority(),
            }]
        );
        assert_eq!(h.registry.get_petition_count().await, 0);
        assert!(!h.registry.check_petition_existence("Test Title").await);

        h.store.set_reject_commits(false);
        let id = h.registry.create_petition(&creator(), &request("Test Title")).await.unwrap();
        assert_eq!(id, PetitionId::new(0));
        assert_eq!(h.settlement.total(), 500);
        assert_eq!(h.settlement.refunds().len(), 1);
    }

    #[tokio::test]
    async fn test_clock_moving_backwards_is_rejected() {
        let h = harness().await;
        h.clock.set(50);
        h.registry.create_petition(&creator(), &request("First")).await.unwrap();

        h.clock.set(10);
        let err = h
            .registry
            .create_petition(&creator(), &request("Second"))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(PetitionError::InvalidTimestamp));
        assert_eq!(h.registry.get_petition_count().await, 1);
        assert_eq!(h.settlement.intents().len(), 1);

        h.clock.set(50);
        h.registry.create_petition(&creator(), &request("Second")).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_stamps_height_and_slot() {
        let h = harness().await;
        let id = h.registry.create_petition(&creator(), &request("Test Title")).await.unwrap();

        h.clock.set(7);
        let edit = PetitionEdit::new("New Title", "New Description", 200);
        h.registry.update_petition(&creator(), id, &edit).await.unwrap();

        let petition = h.registry.get_petition(id).await.unwrap();
        assert_eq!(petition.timestamp, 7);
        assert_eq!(petition.target_signatures, 200);

        let slot = h.registry.get_petition_update(id).await.unwrap();
        assert_eq!(slot.update_timestamp, 7);
        assert_eq!(slot.updater, creator());

        let (found, _) = h.registry.get_petition_by_title("New Title").await.unwrap();
        assert_eq!(found, id);
        assert!(h.registry.get_petition_by_title("Test Title").await.is_none());
    }

    #[tokio::test]
    async fn test_configured_burn_principal_is_refused() {
        let store = MemoryStore::new();
        let options = RegistryOptions {
            burn_principal: Principal::from("ST000BURN"),
            ..RegistryOptions::default()
        };
        let registry = Registry::open(
            store,
            ManualClock::new(0),
            RecordingSettlement::new(),
            options,
        )
        .await
        .unwrap();

        let err = registry
            .set_authority_contract(&creator(), &Principal::from("ST000BURN"))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(PetitionError::InvalidPrincipal));

        // The well-known sentinel stays reserved as well.
        let err = registry
            .set_authority_contract(&creator(), &Principal::burn())
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(PetitionError::InvalidPrincipal));
        assert!(registry.config().await.authority.is_none());
    }

    #[tokio::test]
    async fn test_fee_change_applies_to_next_creation() {
        let h = harness().await;
        h.registry.set_creation_fee(&authority(), 0).await.unwrap();
        h.registry.create_petition(&creator(), &request("Free")).await.unwrap();

        assert_eq!(h.settlement.intents()[0].amount, 0);
        assert_eq!(h.store.load_config().await.unwrap().unwrap().creation_fee, 0);
    }
}
