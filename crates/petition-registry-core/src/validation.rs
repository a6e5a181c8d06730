//! Petition validation: the ordered creation pipeline and the reduced
//! checks for update, close and signature increments.
//!
//! Each rule maps to one error kind, and callers branch on that kind, so the
//! order in which rules are evaluated is part of the contract.

use crate::config::RegistryConfig;
use crate::error::{PetitionError, Result};
use crate::index::TitleIndex;
use crate::petition::{
    Category, NewPetition, Petition, PetitionEdit, PetitionStatus, MAX_DESCRIPTION_LEN,
    MAX_EXTENSION_LIMIT, MAX_LOCATION_LEN, MAX_PRIORITY, MAX_TAGS, MAX_TITLE_LEN,
};
use crate::types::{BlockHeight, PetitionId, Principal};

/// Title must be non-empty and at most 100 characters.
pub fn check_title(title: &str) -> Result<()> {
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(PetitionError::InvalidTitle);
    }
    Ok(())
}

/// Description must be non-empty and at most 500 characters.
pub fn check_description(description: &str) -> Result<()> {
    let len = description.chars().count();
    if len == 0 || len > MAX_DESCRIPTION_LEN {
        return Err(PetitionError::InvalidDescription);
    }
    Ok(())
}

pub fn check_target(target_signatures: u64) -> Result<()> {
    if target_signatures == 0 {
        return Err(PetitionError::InvalidTarget);
    }
    Ok(())
}

/// Validate a creation request.
///
/// Rules, first failure wins:
/// 1. registry below capacity
/// 2. title
/// 3. description
/// 4. target
/// 5. deadline strictly after `now`
/// 6. category
/// 7. priority
/// 8. location
/// 9. tag count
/// 10. min signatures
/// 11. max extension
/// 12. title not already indexed
/// 13. authority configured
///
/// Returns the parsed category on success.
pub fn validate_new_petition(
    request: &NewPetition,
    config: &RegistryConfig,
    index: &TitleIndex,
    now: BlockHeight,
) -> Result<Category> {
    if !config.has_capacity() {
        return Err(PetitionError::MaxPetitionsExceeded);
    }
    check_title(&request.title)?;
    check_description(&request.description)?;
    check_target(request.target_signatures)?;
    if request.deadline <= now {
        return Err(PetitionError::InvalidDeadline);
    }
    let category: Category = request.category.parse()?;
    if request.priority > MAX_PRIORITY {
        return Err(PetitionError::InvalidPriority);
    }
    if request.location.chars().count() > MAX_LOCATION_LEN {
        return Err(PetitionError::InvalidLocation);
    }
    if request.tags.len() > MAX_TAGS {
        return Err(PetitionError::InvalidTags);
    }
    if request.min_signatures == 0 {
        return Err(PetitionError::InvalidMinSignatures);
    }
    if request.max_extension > MAX_EXTENSION_LIMIT {
        return Err(PetitionError::InvalidMaxExtension);
    }
    if index.contains(&request.title) {
        return Err(PetitionError::PetitionAlreadyExists);
    }
    if config.authority.is_none() {
        return Err(PetitionError::AuthorityNotSet);
    }

    Ok(category)
}

/// Shared ownership gate for update and close: the petition exists, the
/// caller created it, and it is still open.
pub fn check_owned_open<'a>(
    petition: Option<&'a Petition>,
    caller: &Principal,
) -> Result<&'a Petition> {
    let petition = petition.ok_or(PetitionError::PetitionNotFound)?;
    if &petition.creator != caller {
        return Err(PetitionError::NotAuthorized);
    }
    if !petition.is_open() {
        return Err(PetitionError::PetitionClosed);
    }
    Ok(petition)
}

/// Validate an edit of petition `id`.
///
/// A new target below the signatures already collected is rejected with
/// `InvalidUpdateParam`, keeping `current <= target`.
pub fn validate_edit<'a>(
    id: PetitionId,
    petition: Option<&'a Petition>,
    caller: &Principal,
    edit: &PetitionEdit,
    index: &TitleIndex,
) -> Result<&'a Petition> {
    let petition = check_owned_open(petition, caller)?;
    check_title(&edit.title)?;
    check_description(&edit.description)?;
    check_target(edit.target_signatures)?;
    if edit.target_signatures < petition.current_signatures {
        return Err(PetitionError::InvalidUpdateParam);
    }
    if edit.title != petition.title && index.is_taken_by_other(&edit.title, id) {
        return Err(PetitionError::PetitionAlreadyExists);
    }
    Ok(petition)
}

/// Validate a signature increment and return the new signature count.
///
/// Any caller may increment; only existence, openness and the target bound
/// are checked.
pub fn validate_increment(petition: Option<&Petition>, amount: u64) -> Result<u64> {
    let petition = petition.ok_or(PetitionError::PetitionNotFound)?;
    if !petition.is_open() {
        return Err(PetitionError::PetitionClosed);
    }
    if amount == 0 {
        return Err(PetitionError::InvalidInput);
    }
    let next = petition
        .current_signatures
        .checked_add(amount)
        .ok_or(PetitionError::InvalidUpdateParam)?;
    if next > petition.target_signatures {
        return Err(PetitionError::InvalidUpdateParam);
    }
    Ok(next)
}

/// Validate a stored petition against the record invariants.
///
/// Used when state is rebuilt from persistence.
pub fn validate_stored(petition: &Petition) -> Result<()> {
    let closed = petition.status == PetitionStatus::Closed;
    if petition.is_active == closed {
        return Err(PetitionError::InvalidStatus);
    }
    if petition.current_signatures > petition.target_signatures {
        return Err(PetitionError::InvalidUpdateParam);
    }
    Ok(())
}
