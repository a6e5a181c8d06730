//! Rejection vectors.
//!
//! Each vector takes the canonical creation request, breaks one thing about
//! it (or about the registry it is sent to), and names the stable error code
//! the registry must answer with. Clients branch on these codes, so the
//! vectors pin both the codes and the order in which rules are checked.

use anyhow::{bail, ensure, Context};

use petition_registry_core::{NewPetition, PetitionError};

use crate::fixtures::RegistryFixture;

/// Height the registry is at when a vector is sent.
pub const VECTOR_HEIGHT: u64 = 10;

/// Title of the petition created before each vector runs.
pub const TAKEN_TITLE: &str = "Taken";

/// Registry setup a vector runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorSetup {
    /// Authority set, one petition titled [`TAKEN_TITLE`].
    Configured,
    /// As `Configured`, with the capacity already used up.
    Full,
    /// No authority registered.
    NoAuthority,
}

/// A rejection vector.
#[derive(Debug, Clone)]
pub struct RejectionVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub setup: VectorSetup,
    /// The request to send.
    pub request: NewPetition,
    /// Expected wire code.
    pub expected_code: u32,
}

fn base() -> NewPetition {
    RegistryFixture::sample_request("Test Title")
}

fn vector(
    name: &'static str,
    setup: VectorSetup,
    request: NewPetition,
    expected: PetitionError,
) -> RejectionVector {
    RejectionVector {
        name,
        setup,
        request,
        expected_code: expected.code(),
    }
}

/// Get all rejection vectors.
pub fn all_vectors() -> Vec<RejectionVector> {
    use VectorSetup::*;

    let with = |f: fn(&mut NewPetition)| {
        let mut request = base();
        f(&mut request);
        request
    };

    vec![
        vector("registry full", Full, base(), PetitionError::MaxPetitionsExceeded),
        vector(
            "empty title",
            Configured,
            with(|r| r.title.clear()),
            PetitionError::InvalidTitle,
        ),
        vector(
            "title of 101 characters",
            Configured,
            with(|r| r.title = "t".repeat(101)),
            PetitionError::InvalidTitle,
        ),
        vector(
            "empty description",
            Configured,
            with(|r| r.description.clear()),
            PetitionError::InvalidDescription,
        ),
        vector(
            "description of 501 characters",
            Configured,
            with(|r| r.description = "d".repeat(501)),
            PetitionError::InvalidDescription,
        ),
        vector(
            "zero target",
            Configured,
            with(|r| r.target_signatures = 0),
            PetitionError::InvalidTarget,
        ),
        vector(
            "deadline at current height",
            Configured,
            with(|r| r.deadline = VECTOR_HEIGHT),
            PetitionError::InvalidDeadline,
        ),
        vector(
            "unknown category",
            Configured,
            with(|r| r.category = "sports".into()),
            PetitionError::InvalidCategory,
        ),
        vector(
            "priority 11",
            Configured,
            with(|r| r.priority = 11),
            PetitionError::InvalidPriority,
        ),
        vector(
            "location of 101 characters",
            Configured,
            with(|r| r.location = "l".repeat(101)),
            PetitionError::InvalidLocation,
        ),
        vector(
            "eleven tags",
            Configured,
            with(|r| r.tags = (0..11).map(|n| format!("tag{}", n)).collect()),
            PetitionError::InvalidTags,
        ),
        vector(
            "zero min signatures",
            Configured,
            with(|r| r.min_signatures = 0),
            PetitionError::InvalidMinSignatures,
        ),
        vector(
            "max extension 31",
            Configured,
            with(|r| r.max_extension = 31),
            PetitionError::InvalidMaxExtension,
        ),
        vector(
            "title already taken",
            Configured,
            with(|r| r.title = TAKEN_TITLE.into()),
            PetitionError::PetitionAlreadyExists,
        ),
        vector(
            "no authority",
            NoAuthority,
            base(),
            PetitionError::AuthorityNotSet,
        ),
        // Earlier rules win over later ones.
        vector(
            "bad title beats bad category",
            Configured,
            with(|r| {
                r.title.clear();
                r.category = "sports".into();
            }),
            PetitionError::InvalidTitle,
        ),
        vector(
            "bad max extension beats taken title",
            Configured,
            with(|r| {
                r.title = TAKEN_TITLE.into();
                r.max_extension = 31;
            }),
            PetitionError::InvalidMaxExtension,
        ),
    ]
}

async fn prepare(setup: VectorSetup) -> anyhow::Result<RegistryFixture> {
    let fixture = match setup {
        VectorSetup::NoAuthority => RegistryFixture::new().await?,
        VectorSetup::Configured | VectorSetup::Full => {
            let fixture = RegistryFixture::configured().await?;
            fixture.create_sample(TAKEN_TITLE).await?;
            if setup == VectorSetup::Full {
                fixture
                    .registry
                    .set_max_petitions(&fixture.authority, 1)
                    .await?;
            }
            fixture
        }
    };
    fixture.clock.set(VECTOR_HEIGHT);
    Ok(fixture)
}

/// Run one vector against a fresh registry.
///
/// Checks the code and that the rejection left no trace: the count, the
/// settled fees and the store are all unchanged.
pub async fn verify_vector(vector: &RejectionVector) -> anyhow::Result<()> {
    let fixture = prepare(vector.setup).await?;
    let count = fixture.registry.get_petition_count().await;
    let fees = fixture.settlement.intents().len();
    let commits = fixture.store.commit_count()?;

    let code = match fixture
        .registry
        .create_petition(&fixture.creator, &vector.request)
        .await
    {
        Ok(id) => bail!("accepted as {}", id),
        Err(e) => e.code().with_context(|| format!("not a rule rejection: {}", e))?,
    };

    ensure!(
        code == vector.expected_code,
        "expected code {}, got {}",
        vector.expected_code,
        code
    );
    ensure!(fixture.registry.get_petition_count().await == count, "count changed");
    ensure!(fixture.settlement.intents().len() == fees, "fee was settled");
    ensure!(fixture.store.commit_count()? == commits, "store was written");
    Ok(())
}

/// Verify every vector, naming the first one that fails.
pub async fn verify_all_vectors() -> anyhow::Result<()> {
    for vector in all_vectors() {
        verify_vector(&vector)
            .await
            .with_context(|| format!("vector '{}'", vector.name))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_vectors_hold() {
        verify_all_vectors().await.unwrap();
    }

    #[test]
    fn test_vector_names_are_unique() {
        let vectors = all_vectors();
        for (i, a) in vectors.iter().enumerate() {
            for b in &vectors[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[tokio::test]
    async fn test_base_request_is_accepted() {
        let fixture = prepare(VectorSetup::Configured).await.unwrap();
        let id = fixture
            .registry
            .create_petition(&fixture.creator, &base())
            .await
            .unwrap();
        assert_eq!(id.get(), 1);
    }

    #[tokio::test]
    async fn test_wrong_expectation_is_reported() {
        let mut vector = all_vectors().remove(1);
        vector.expected_code = 999;
        let err = verify_vector(&vector).await.unwrap_err();
        assert!(err.to_string().contains("999"));
    }
}
