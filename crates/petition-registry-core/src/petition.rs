//! Petition records: the stored petition, its update slot, and the
//! request shapes used to create and edit one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PetitionError;
use crate::types::{BlockHeight, Principal};

/// Maximum title length, in characters.
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum location length, in characters.
pub const MAX_LOCATION_LEN: usize = 100;

/// Maximum number of tags on a petition.
pub const MAX_TAGS: usize = 10;

/// Highest allowed priority.
pub const MAX_PRIORITY: u32 = 10;

/// Highest allowed `max_extension`.
pub const MAX_EXTENSION_LIMIT: u32 = 30;

/// Petition category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Policy,
    Environment,
    Social,
}

impl Category {
    /// The wire name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Policy => "policy",
            Category::Environment => "environment",
            Category::Social => "social",
        }
    }
}

impl FromStr for Category {
    type Err = PetitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "policy" => Ok(Category::Policy),
            "environment" => Ok(Category::Environment),
            "social" => Ok(Category::Social),
            _ => Err(PetitionError::InvalidCategory),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Petition status. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetitionStatus {
    Open,
    Closed,
}

impl PetitionStatus {
    /// The wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            PetitionStatus::Open => "open",
            PetitionStatus::Closed => "closed",
        }
    }
}

impl FromStr for PetitionStatus {
    type Err = PetitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(PetitionStatus::Open),
            "closed" => Ok(PetitionStatus::Closed),
            _ => Err(PetitionError::InvalidStatus),
        }
    }
}

impl fmt::Display for PetitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored petition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Petition {
    /// Who created the petition. Immutable.
    pub creator: Principal,
    pub title: String,
    pub description: String,
    pub target_signatures: u64,
    /// Never decreases and never exceeds `target_signatures`.
    pub current_signatures: u64,
    pub deadline: BlockHeight,
    /// `false` exactly when `status` is `Closed`.
    pub is_active: bool,
    pub category: Category,
    pub priority: u32,
    pub location: String,
    pub tags: Vec<String>,
    /// Height of creation or of the last update.
    pub timestamp: BlockHeight,
    pub status: PetitionStatus,
    /// Informational threshold, stored as given.
    pub min_signatures: u64,
    /// Informational cap on deadline extensions, stored as given.
    pub max_extension: u32,
}

impl Petition {
    /// True if the petition still accepts updates, signatures and closure.
    pub fn is_open(&self) -> bool {
        self.is_active && self.status == PetitionStatus::Open
    }

    /// Signatures still needed to reach the target.
    pub fn remaining_signatures(&self) -> u64 {
        self.target_signatures.saturating_sub(self.current_signatures)
    }
}

/// The most recent edit of a petition. One slot per id, overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetitionUpdate {
    pub update_title: String,
    pub update_description: String,
    pub update_target: u64,
    pub update_timestamp: BlockHeight,
    pub updater: Principal,
}

/// A request to create a petition.
///
/// `category` is kept as the caller supplied it so that an unknown value
/// surfaces as [`PetitionError::InvalidCategory`] at its place in the
/// validation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPetition {
    pub title: String,
    pub description: String,
    pub target_signatures: u64,
    pub deadline: BlockHeight,
    pub category: String,
    pub priority: u32,
    pub location: String,
    pub tags: Vec<String>,
    pub min_signatures: u64,
    pub max_extension: u32,
}

impl NewPetition {
    /// Start a creation request with the required fields.
    ///
    /// Optional fields default to category `policy`, priority 0, empty
    /// location, no tags, `min_signatures` 1 and `max_extension` 0.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        target_signatures: u64,
        deadline: BlockHeight,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            target_signatures,
            deadline,
            category: Category::Policy.as_str().to_string(),
            priority: 0,
            location: String::new(),
            tags: Vec::new(),
            min_signatures: 1,
            max_extension: 0,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Replace the tag list.
    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn min_signatures(mut self, min_signatures: u64) -> Self {
        self.min_signatures = min_signatures;
        self
    }

    pub fn max_extension(mut self, max_extension: u32) -> Self {
        self.max_extension = max_extension;
        self
    }
}

/// A request to edit the mutable text fields and target of a petition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetitionEdit {
    pub title: String,
    pub description: String,
    pub target_signatures: u64,
}

impl PetitionEdit {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        target_signatures: u64,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            target_signatures,
        }
    }
}
