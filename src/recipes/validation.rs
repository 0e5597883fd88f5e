//! Checks a recipe payload before anything is written.
//!
//! Every violation is collected into one field map so the client sees the
//! whole list at once.

use super::image::{decode_data_uri, DecodedImage};
use crate::constants::MAX_AMOUNT;
use crate::error::{merge_validation_errors, ApiError, FieldErrors};
use serde::Deserialize;
use std::collections::HashSet;
use validator::Validate;

const REQUIRED: &str = "This field is required.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Every field must be present.
    Create,
    /// Only `ingredients` and `tags` are required; they are replaced wholesale.
    Update,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i64,
}

/// Body of `POST /api/recipes/` and `PATCH /api/recipes/{id}/`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RecipeWrite {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<i32>>,
    pub image: Option<String>,
    #[validate(length(
        min = 1,
        max = 200,
        message = "Name must be between 1 and 200 characters."
    ))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Text must not be empty."))]
    pub text: Option<String>,
    #[validate(range(min = 1, message = "Cooking time must be at least 1 minute."))]
    pub cooking_time: Option<i32>,
}

/// A payload that passed every check. `None` fields are left untouched on update.
#[derive(Debug)]
pub struct ValidRecipe {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<DecodedImage>,
    /// (ingredient id, amount) in payload order.
    pub ingredients: Vec<(i32, i32)>,
    pub tags: Vec<i32>,
}

fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_owned())
        .or_default()
        .push(message.into());
}

impl RecipeWrite {
    /// Ingredient ids referenced by the payload, for looking up which exist.
    pub fn ingredient_ids(&self) -> Vec<i32> {
        self.ingredients
            .iter()
            .flatten()
            .map(|item| item.id)
            .collect()
    }

    pub fn tag_ids(&self) -> Vec<i32> {
        self.tags.iter().flatten().copied().collect()
    }

    /// Validates the payload against `mode` and the ids known to exist.
    pub fn into_valid(
        self,
        mode: Mode,
        known_ingredients: &HashSet<i32>,
        known_tags: &HashSet<i32>,
    ) -> Result<ValidRecipe, ApiError> {
        let mut errors = FieldErrors::new();

        if let Err(e) = self.validate() {
            merge_validation_errors(&mut errors, &e);
        }

        if mode == Mode::Create {
            if self.name.is_none() {
                push(&mut errors, "name", REQUIRED);
            }
            if self.text.is_none() {
                push(&mut errors, "text", REQUIRED);
            }
            if self.cooking_time.is_none() {
                push(&mut errors, "cooking_time", REQUIRED);
            }
            if self.image.is_none() {
                push(&mut errors, "image", REQUIRED);
            }
        }

        let image = match self.image.as_deref() {
            Some(uri) => match decode_data_uri(uri) {
                Ok(image) => Some(image),
                Err(message) => {
                    push(&mut errors, "image", message);
                    None
                }
            },
            None => None,
        };

        let ingredients =
            check_ingredients(self.ingredients.as_deref(), known_ingredients, &mut errors);
        let tags = check_tags(self.tags.as_deref(), known_tags, &mut errors);

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(ValidRecipe {
            name: self.name,
            text: self.text,
            cooking_time: self.cooking_time,
            image,
            ingredients,
            tags,
        })
    }
}

fn check_ingredients(
    items: Option<&[IngredientAmount]>,
    known: &HashSet<i32>,
    errors: &mut FieldErrors,
) -> Vec<(i32, i32)> {
    let items = match items {
        Some(items) if !items.is_empty() => items,
        _ => {
            push(errors, "ingredients_error", "A recipe needs at least one ingredient.");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut duplicated = false;
    let mut bad_amount = false;
    let mut checked = Vec::with_capacity(items.len());

    for item in items {
        if !seen.insert(item.id) {
            duplicated = true;
        }
        if !(1..=MAX_AMOUNT).contains(&item.amount) {
            bad_amount = true;
        }
        if !known.contains(&item.id) {
            push(errors, "ingredients", format!("Unknown ingredient id {}.", item.id));
        }
        checked.push((item.id, item.amount as i32));
    }

    if duplicated {
        push(errors, "ingredients_id_error", "Ingredients must not repeat.");
    }
    if bad_amount {
        push(
            errors,
            "amount_error",
            format!("Amount must be between 1 and {}.", MAX_AMOUNT),
        );
    }
    checked
}

fn check_tags(items: Option<&[i32]>, known: &HashSet<i32>, errors: &mut FieldErrors) -> Vec<i32> {
    let items = match items {
        None => {
            push(errors, "tags", REQUIRED);
            return Vec::new();
        }
        Some([]) => {
            push(errors, "tags", "At least one tag is required.");
            return Vec::new();
        }
        Some(items) => items,
    };

    let mut seen = HashSet::new();
    if items.iter().any(|id| !seen.insert(*id)) {
        push(errors, "tags", "Tags must not repeat.");
    }
    for id in items.iter().filter(|id| !known.contains(id)) {
        push(errors, "tags", format!("Unknown tag id {}.", id));
    }
    items.to_vec()
}
