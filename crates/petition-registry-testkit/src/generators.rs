//! Proptest generators for property-based testing.
//!
//! Every strategy here produces values that pass creation validation, so a
//! property can start from a valid request and break exactly one field.

use proptest::prelude::*;

use petition_registry_core::{
    BlockHeight, Category, NewPetition, PetitionEdit, Principal, MAX_EXTENSION_LIMIT,
    MAX_PRIORITY, MAX_TAGS,
};

/// Generate a valid title (1-100 characters).
pub fn title() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{0,99}".prop_map(String::from)
}

/// Generate a valid description (1-500 characters).
pub fn description() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .,]{1,500}".prop_map(String::from)
}

/// Generate a valid location (0-100 characters).
pub fn location() -> impl Strategy<Value = String> {
    "[A-Za-z ]{0,100}".prop_map(String::from)
}

pub fn category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Policy),
        Just(Category::Environment),
        Just(Category::Social),
    ]
}

/// Generate up to ten tags.
pub fn tags() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,12}", 0..=MAX_TAGS)
}

/// Generate a principal in the `ST...TEST` shape.
pub fn principal() -> impl Strategy<Value = Principal> {
    "ST[0-9A-Z]{1,8}TEST".prop_map(Principal::new)
}

/// Parameters for generating a valid creation request.
#[derive(Debug, Clone)]
pub struct PetitionParams {
    pub title: String,
    pub description: String,
    pub target_signatures: u64,
    /// Blocks between the current height and the deadline. Always positive.
    pub deadline_offset: u64,
    pub category: Category,
    pub priority: u32,
    pub location: String,
    pub tags: Vec<String>,
    pub min_signatures: u64,
    pub max_extension: u32,
}

impl Arbitrary for PetitionParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            (title(), description(), 1u64..=1_000_000, 1u64..=100_000),
            (
                category(),
                0..=MAX_PRIORITY,
                location(),
                tags(),
                1u64..=1_000,
                0..=MAX_EXTENSION_LIMIT,
            ),
        )
            .prop_map(
                |(
                    (title, description, target, offset),
                    (category, priority, location, tags, min_signatures, max_extension),
                )| PetitionParams {
                    title,
                    description,
                    target_signatures: target,
                    deadline_offset: offset,
                    category,
                    priority,
                    location,
                    tags,
                    min_signatures,
                    max_extension,
                },
            )
            .boxed()
    }
}

/// Build a creation request whose deadline lies after `now`.
pub fn request_from_params(params: &PetitionParams, now: BlockHeight) -> NewPetition {
    NewPetition::new(
        params.title.clone(),
        params.description.clone(),
        params.target_signatures,
        now.saturating_add(params.deadline_offset),
    )
    .category(params.category.as_str())
    .priority(params.priority)
    .location(params.location.clone())
    .tags(params.tags.clone())
    .min_signatures(params.min_signatures)
    .max_extension(params.max_extension)
}

/// Generate a valid edit.
pub fn edit() -> impl Strategy<Value = PetitionEdit> {
    (title(), description(), 1u64..=1_000_000)
        .prop_map(|(title, description, target)| PetitionEdit::new(title, description, target))
}
