//! Strong type definitions for the petition registry.
//!
//! Identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The reserved burn/null principal. It can never become the authority.
pub const BURN_PRINCIPAL: &str = "SP000000000000000000002Q6VF78";

/// A block height (or other monotonic time index) supplied by the clock.
pub type BlockHeight = u64;

/// An opaque, comparable caller identity.
///
/// The registry never interprets the contents; it only compares principals
/// for equality (creator checks, authority checks).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Wrap a raw principal string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The reserved burn principal.
    pub fn burn() -> Self {
        Self(BURN_PRINCIPAL.to_string())
    }

    /// Borrow the raw principal string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this is the reserved burn principal.
    pub fn is_burn(&self) -> bool {
        self.0 == BURN_PRINCIPAL
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.0)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Principal {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A petition identifier: dense, assigned from 0, never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PetitionId(pub u64);

impl PetitionId {
    /// Create an id from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PetitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PetitionId({})", self.0)
    }
}

impl fmt::Display for PetitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PetitionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// A fee transfer the registry asks its settlement collaborator to execute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferIntent {
    pub amount: u64,
    pub payer: Principal,
    pub payee: Principal,
}
