//! # Petition Registry Testkit
//!
//! Testing utilities for the petition registry.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Rejection vectors**: broken creation requests paired with the error code
//!   the registry must return
//! - **Generators**: Proptest strategies producing valid requests and edits
//! - **Fixtures**: A memory-backed registry with a manual clock and recording settlement
//!
//! ## Rejection Vectors
//!
//! Rejection vectors pin the error codes and the order of the validation rules:
//!
//! ```rust
//! use petition_registry_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     println!("{}: {}", vector.name, vector.expected_code);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use petition_registry_testkit::generators::{request_from_params, PetitionParams};
//!
//! proptest! {
//!     #[test]
//!     fn deadline_is_in_the_future(params: PetitionParams, now in 0u64..1000) {
//!         let request = request_from_params(&params, now);
//!         prop_assert!(request.deadline > now);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust,ignore
//! use petition_registry_testkit::fixtures::RegistryFixture;
//!
//! let fixture = RegistryFixture::configured().await?;
//! let id = fixture.create_sample("Test Title").await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{principals, FixtureRegistry, RegistryFixture};
pub use generators::{request_from_params, PetitionParams};
pub use vectors::{all_vectors, verify_all_vectors, verify_vector, RejectionVector, VectorSetup};
