//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use petition_registry::{ManualClock, RecordingSettlement, Registry, RegistryOptions, Result};
use petition_registry_core::{NewPetition, PetitionId, Principal};
use petition_registry_store::MemoryStore;

/// The registry type every fixture drives.
pub type FixtureRegistry = Registry<Arc<MemoryStore>, Arc<ManualClock>, Arc<RecordingSettlement>>;

/// A registry over a memory store, with handles to its collaborators.
pub struct RegistryFixture {
    pub registry: FixtureRegistry,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub settlement: Arc<RecordingSettlement>,
    /// `ST1TEST`, the default petition creator.
    pub creator: Principal,
    /// `ST2TEST`, the authority once configured.
    pub authority: Principal,
}

impl RegistryFixture {
    /// A fresh registry at height 0 with no authority.
    pub async fn new() -> Result<Self> {
        Self::with_options(RegistryOptions::default()).await
    }

    /// A fresh registry opened with `options`.
    pub async fn with_options(options: RegistryOptions) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(0));
        let settlement = Arc::new(RecordingSettlement::new());

        let registry = Registry::open(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&settlement),
            options,
        )
        .await?;

        Ok(Self {
            registry,
            store,
            clock,
            settlement,
            creator: Principal::from("ST1TEST"),
            authority: Principal::from("ST2TEST"),
        })
    }

    /// A fresh registry with `ST2TEST` already registered as authority.
    pub async fn configured() -> Result<Self> {
        let fixture = Self::new().await?;
        fixture
            .registry
            .set_authority_contract(&fixture.authority, &fixture.authority)
            .await?;
        Ok(fixture)
    }

    /// The canonical creation request, deadline 1000.
    pub fn sample_request(title: &str) -> NewPetition {
        NewPetition::new(title, "Test Description", 100, 1000)
            .category("policy")
            .priority(5)
            .location("Test Location")
            .tags(["tag1", "tag2"])
            .min_signatures(10)
            .max_extension(15)
    }

    /// Create [`sample_request`](Self::sample_request) as the creator.
    pub async fn create_sample(&self, title: &str) -> Result<PetitionId> {
        self.registry
            .create_petition(&self.creator, &Self::sample_request(title))
            .await
    }
}

/// Distinct principals `ST10TEST`, `ST11TEST`, ...
pub fn principals(count: usize) -> Vec<Principal> {
    (0..count)
        .map(|i| Principal::new(format!("ST{}TEST", 10 + i)))
        .collect()
}
